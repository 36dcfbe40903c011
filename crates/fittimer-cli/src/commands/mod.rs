pub mod config;
pub mod feedback;
pub mod sequence;
pub mod set;
pub mod stats;
pub mod timer;
