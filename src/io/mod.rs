//! Input/output helpers.
//!
//! - control-script files (`script`)
//! - JSON parameter files and settings export (`params`)

pub mod params;
pub mod script;

pub use params::*;
pub use script::*;
