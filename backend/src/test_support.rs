//! Test utilities shared by unit tests across the crate.
//!
//! Only compiled for tests.

pub mod clock;
pub mod fixtures;
pub mod in_memory;
