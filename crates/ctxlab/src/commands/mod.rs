//! CLI command implementations

pub mod cache;
pub mod doctor;
pub mod typeset;
