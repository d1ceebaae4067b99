//! Integration tests for the blueprint engine and identification stage.
//!
//! Each module exercises one task or surface end to end. Tests construct
//! their own engine over a fresh temporary root so they can run in parallel.

pub mod apply;
pub mod cleanup;
pub mod discovery;
pub mod identification;
pub mod worker;
