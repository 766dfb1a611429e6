#![forbid(unsafe_code)]

pub mod gating;
pub mod model;
pub mod quiz;
pub mod report;
pub mod time;

pub use time::Clock;
