//! Shared types, errors, configuration and fixed-point helpers for the
//! Matrix stablecoin core.

pub mod config;
pub mod error;
pub mod fixed;
pub mod types;

pub use error::{MatrixError, Result};
