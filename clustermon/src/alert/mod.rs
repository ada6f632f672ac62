//! Threshold based alerts on heap telemetry.

mod evaluator;
mod human_size;


pub use evaluator::AlertEvaluator;
pub use evaluator::HeapThresholds;
pub use human_size::human_data_size;
