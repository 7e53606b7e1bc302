pub mod precision;
pub mod queue;
