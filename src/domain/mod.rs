pub mod delay;
pub mod inputs;
pub mod phase;
pub mod project;
