//! Background task plumbing and the simulated expander.

pub mod sim_expander;
pub mod task;
