//! CLI command implementations

pub mod baseline;
pub mod bench;
pub mod doctor;
pub mod run;
pub mod validate;

mod reporting;
