//! Repository traits for metadata operations.

pub mod case_sets;
pub mod cases;
pub mod packages;

pub use case_sets::CaseSetRepo;
pub use cases::CaseRepo;
pub use packages::{PackageDedup, PackageRepo};
