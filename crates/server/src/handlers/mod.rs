//! HTTP request handlers.

pub mod case_sets;
pub mod common;
pub mod packages;

pub use case_sets::*;
pub use common::*;
pub use packages::*;
