//! BDD step definitions for icarus

pub mod credential_steps;
pub mod polling_steps;
