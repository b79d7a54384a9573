pub mod classifier;
pub mod client;
pub mod policy;
pub mod runner;
