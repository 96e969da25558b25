//! Crop recommendation from soil and climate measurements.
//!
//! The `crop-train` binary fits a random forest on a labeled CSV dataset and
//! writes a model artifact; the `crop-advisor` binary loads that artifact and
//! serves `POST /predict`.

pub mod api;
pub mod config;
pub mod error;
pub mod ml;
pub mod telemetry;

pub use error::{AppError, Result};
