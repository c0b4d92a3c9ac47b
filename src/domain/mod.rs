//! Domain types shared by the parameter store and the script compiler.
//!
//! This module defines:
//!
//! - closed selector enums (`Geometry`, `GrainDistribution`)
//! - the canonical fixed-precision number (`Fixed`)

pub mod types;

pub use types::*;
