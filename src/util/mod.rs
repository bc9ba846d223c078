//! Shared utilities: id generation and telemetry bootstrap.

pub mod ids;
pub mod telemetry;

pub use ids::IdCounter;
