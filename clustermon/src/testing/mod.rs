//! Helpers for building test fixtures.

use crate::membership::Address;
use crate::membership::MemberDescriptor;
use crate::membership::MemberId;
use crate::membership::Role;

/// The bolt address used for a test member, e.g. `bolt://a:7687`.
pub fn bolt(id: &str) -> Address {
    format!("bolt://{}:7687", id)
}

/// A follower listening on [`bolt`]`(id)`.
pub fn descriptor(id: &str) -> MemberDescriptor {
    MemberDescriptor::new(id, [bolt(id)], Role::Follower)
}

/// Build a [`MemberId`] from anything displayable.
pub fn mid(x: impl ToString) -> MemberId {
    x.to_string()
}
