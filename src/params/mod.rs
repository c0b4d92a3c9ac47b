//! Parameter store for one MAPPINGS model.
//!
//! - `config`: the validated `ModelConfiguration`
//! - `dust`: the dust sub-configuration and its partial updates

pub mod config;
pub mod dust;

pub use config::*;
pub use dust::*;
