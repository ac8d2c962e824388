pub mod generation;
pub mod queue;
pub mod worker;
