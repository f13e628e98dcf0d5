//! Test support: mock tracker and shared fixtures.

pub mod fixtures;
mod mock_tracker;

pub use mock_tracker::MockTracker;
