//! Latest heap telemetry of every member.

mod sample;
mod store;


pub use sample::MemoryStats;
pub use sample::TelemetrySample;
pub use store::TelemetryStore;
