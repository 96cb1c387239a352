pub mod chart;
pub mod instant;
pub mod strategy;

pub use chart::*;
pub use instant::*;
pub use strategy::*;
