//! Reporting utilities: formatted terminal output for `sd summary` and the
//! debug bundle.

pub mod format;

pub use format::*;
