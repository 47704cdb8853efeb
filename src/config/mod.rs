pub mod ai;
pub mod monitor;
