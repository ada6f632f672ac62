//! Long-lived polling feeds, one per member per [`FeedKind`].

mod feed;
mod manager;


pub use feed::Feed;
pub use feed::FeedFactory;
pub use feed::FeedKind;
pub use feed::FeedSample;
pub use feed::FeedSender;
pub use feed::FeedSpec;
pub use feed::PingSample;
pub use feed::SubscriptionId;
pub(crate) use manager::SubscriptionManager;
pub(crate) use manager::Waiter;
