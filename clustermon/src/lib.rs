#![doc = include_str!("lib_readme.md")]
#![cfg_attr(feature = "bt", feature(error_generic_member_access))]
#![allow(clippy::bool_assert_comparison)]
#![allow(clippy::bool_comparison)]
#![allow(clippy::result_large_err)]
#![allow(clippy::type_complexity)]
#![deny(unused_qualifications)]

macro_rules! func_name {
    () => {{
        fn f() {}
        fn type_name_of<T>(_: T) -> &'static str {
            std::any::type_name::<T>()
        }
        let name = type_name_of(f);
        let n = &name[..name.len() - 3];
        let nn = n.replace("::{{closure}}", "");
        nn
    }};
}

mod config;
mod core;

pub mod alert;
pub mod base;
pub mod errors;
pub mod event;
pub mod impls;
pub mod membership;
pub mod metrics;
pub mod monitor;
pub mod query;
pub mod reconcile;
pub mod subscription;
pub mod telemetry;
pub mod testing;

pub use anyerror;
pub use anyerror::AnyError;
pub use openraft_macros::add_async_trait;

pub use crate::alert::AlertEvaluator;
pub use crate::alert::HeapThresholds;
pub use crate::config::Config;
pub use crate::config::ConfigError;
pub use crate::event::Event;
pub use crate::event::EventKind;
pub use crate::event::EventSink;
pub use crate::event::Severity;
pub use crate::membership::Address;
pub use crate::membership::Member;
pub use crate::membership::MemberDescriptor;
pub use crate::membership::MemberId;
pub use crate::membership::MembershipSet;
pub use crate::membership::Role;
pub use crate::metrics::Metrics;
pub use crate::monitor::Monitor;
pub use crate::query::driver::Driver;
pub use crate::query::driver::DriverProvider;
pub use crate::query::MembershipQuery;
pub use crate::subscription::Feed;
pub use crate::subscription::FeedFactory;
pub use crate::subscription::FeedKind;
pub use crate::subscription::FeedSample;
pub use crate::subscription::FeedSender;
pub use crate::telemetry::MemoryStats;
pub use crate::telemetry::TelemetrySample;
