use anyhow::Context;
use clap::Parser;
use crop_advisor::{
    config::Config,
    ml::{train, TrainingConfig},
    telemetry,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "crop-train")]
#[command(about = "Train the crop recommendation model", version, long_about = None)]
struct Cli {
    /// Labeled CSV dataset (overrides training.dataset_path)
    #[arg(short, long)]
    dataset: Option<PathBuf>,

    /// Where to write the model artifact (overrides model.artifact_path)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Seed for the split and the forest
    #[arg(short, long)]
    seed: Option<u64>,

    /// Fraction of rows held out for evaluation
    #[arg(long)]
    test_size: Option<f64>,

    /// Number of trees
    #[arg(short = 'n', long)]
    trees: Option<u16>,

    /// Print the full report as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::load_or_default();
    telemetry::init_tracing(&config.observability);

    let mut training = TrainingConfig::new(&config.training, config.model.artifact_path.clone());
    if let Some(dataset) = cli.dataset {
        training.dataset_path = dataset;
    }
    if let Some(output) = cli.output {
        training.artifact_path = output;
    }
    if let Some(seed) = cli.seed {
        training.seed = seed;
    }
    if let Some(test_size) = cli.test_size {
        training.test_size = test_size;
    }
    if let Some(trees) = cli.trees {
        training.n_estimators = trees;
    }

    let report = train(&training).with_context(|| {
        format!(
            "training on {} failed",
            training.dataset_path.display()
        )
    })?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Model Accuracy: {:.2}%", report.accuracy * 100.0);
        println!(
            "Train/test rows: {}/{}, classes: {}",
            report.n_train,
            report.n_test,
            report.labels.len()
        );
        println!("Model saved as '{}'", report.artifact_path.display());
    }

    Ok(())
}
