use core::fmt;

use crate::membership::Member;
use crate::membership::MemberId;

/// The members currently monitored, in the order they entered.
///
/// Ids are unique. Members are looked up by id and updated in place, so the
/// state accumulated on a member is kept across refreshes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[derive(serde::Deserialize, serde::Serialize)]
pub struct MembershipSet {
    members: Vec<Member>,
}

impl fmt::Display for MembershipSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{",)?;

        for (i, m) in self.members.iter().enumerate() {
            if i > 0 {
                write!(f, ",",)?;
            }
            write!(f, "{}@{}", m.id(), m.bolt_address())?;
        }

        write!(f, "}}")?;
        Ok(())
    }
}

// Public APIs
impl MembershipSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns an Iterator of all members in entering order.
    pub fn iter(&self) -> impl Iterator<Item = &Member> {
        self.members.iter()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Member> {
        self.members.iter().find(|m| m.id() == id)
    }

    /// Get a member by its bolt address.
    pub fn by_address(&self, address: &str) -> Option<&Member> {
        self.members.iter().find(|m| m.bolt_address() == address)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Returns an Iterator of all member ids in entering order.
    pub fn ids(&self) -> impl Iterator<Item = &MemberId> {
        self.members.iter().map(|m| m.id())
    }
}

impl MembershipSet {
    pub(crate) fn get_mut(&mut self, id: &str) -> Option<&mut Member> {
        self.members.iter_mut().find(|m| m.id() == id)
    }

    pub(crate) fn by_address_mut(&mut self, address: &str) -> Option<&mut Member> {
        self.members.iter_mut().find(|m| m.bolt_address() == address)
    }

    /// Append a member. A member whose id is already present is rejected and
    /// `false` is returned.
    pub(crate) fn insert(&mut self, member: Member) -> bool {
        if self.contains(member.id()) {
            return false;
        }
        self.members.push(member);
        true
    }

    pub(crate) fn remove(&mut self, id: &str) -> Option<Member> {
        let idx = self.members.iter().position(|m| m.id() == id)?;
        Some(self.members.remove(idx))
    }
}
