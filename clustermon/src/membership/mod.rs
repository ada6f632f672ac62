//! Cluster members and the set of them being monitored.

mod descriptor;
mod member;
mod membership_set;
mod role;


pub use descriptor::MemberDescriptor;
pub use member::Liveness;
pub use member::Member;
pub use membership_set::MembershipSet;
pub use role::Role;

/// `MemberId` uniquely identifies a member within a cluster.
///
/// It is opaque to the monitor: it is only compared for equality.
pub type MemberId = String;

/// A network address of a member, e.g., `bolt://10.0.0.1:7687`.
pub type Address = String;

/// Pick the address used to talk to a member: the first `bolt://` address, or
/// the first address if none has the bolt scheme.
pub(crate) fn pick_bolt_address(addresses: &[Address]) -> &str {
    addresses
        .iter()
        .find(|a| a.starts_with("bolt://"))
        .or_else(|| addresses.first())
        .map(|a| a.as_str())
        .unwrap_or_default()
}
