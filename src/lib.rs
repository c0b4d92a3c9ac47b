//! `mappings-lab` library crate.
//!
//! A parameter store for MAPPINGS V photoionization models and a compiler that
//! turns it into the control script the interactive executable reads on stdin.
//! The binary (`mlab`) is a thin wrapper so that everything here is testable
//! without spawning processes.

pub mod app;
pub mod cli;
pub mod domain;
pub mod error;
pub mod io;
pub mod logging;
pub mod params;
pub mod report;
pub mod results;
pub mod runner;
pub mod script;
