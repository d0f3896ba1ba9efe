pub mod calibration;
pub mod config;
pub mod error;
pub mod physics;
pub mod pose;
pub mod report;
pub mod session;
pub mod tracker;
pub mod video;

#[cfg(test)]
mod testing;
