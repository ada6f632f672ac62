//! Collection of implementations of usually used traits defined by clustermon

mod channel_sink;
mod log_sink;

pub use channel_sink::ChannelSink;
pub use log_sink::LogSink;
