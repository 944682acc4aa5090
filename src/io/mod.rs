//! Input/output helpers.
//!
//! - roster loading (`roster`)
//! - metrics exports (CSV/JSON) (`export`)

pub mod export;
pub mod roster;

pub use export::*;
pub use roster::*;
