//! Test support for the golf backend: quiet logging, unique ids and
//! problem-details assertions shared by unit and integration tests.

pub mod logging;
pub mod problem_details;
pub mod unique_helpers;
