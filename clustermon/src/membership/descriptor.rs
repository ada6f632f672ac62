use std::collections::BTreeMap;
use std::fmt;

use maplit::btreemap;

use crate::base::display_ext::DisplaySlice;
use crate::membership::pick_bolt_address;
use crate::membership::Address;
use crate::membership::MemberId;
use crate::membership::Role;

/// A member as reported by one fetch of the cluster overview.
///
/// Descriptors are plain observations. The monitor merges them into its
/// long-lived [`Member`](crate::Member)s and never keeps the descriptor itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[derive(serde::Deserialize, serde::Serialize)]
pub struct MemberDescriptor {
    pub id: MemberId,

    /// All the addresses the member listens on, in reported order.
    pub addresses: Vec<Address>,

    pub role: Role,

    /// The role of this member for every database it hosts.
    pub databases: BTreeMap<String, Role>,

    /// Server groups this member belongs to.
    pub groups: Vec<String>,
}

impl MemberDescriptor {
    pub fn new(
        id: impl ToString,
        addresses: impl IntoIterator<Item = impl ToString>,
        role: Role,
    ) -> Self {
        Self {
            id: id.to_string(),
            addresses: addresses.into_iter().map(|a| a.to_string()).collect(),
            role,
            databases: BTreeMap::new(),
            groups: vec![],
        }
    }

    /// Describe a non-clustered database as a cluster of one.
    ///
    /// The member gets a fresh random id: a standalone database does not
    /// report one.
    pub fn standalone(address: impl ToString) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            addresses: vec![address.to_string()],
            role: Role::Single,
            databases: btreemap! {"default".to_string() => Role::Single},
            groups: vec![],
        }
    }

    pub fn with_database(mut self, name: impl ToString, role: Role) -> Self {
        self.databases.insert(name.to_string(), role);
        self
    }

    pub fn with_group(mut self, group: impl ToString) -> Self {
        self.groups.push(group.to_string());
        self
    }

    pub fn bolt_address(&self) -> &str {
        pick_bolt_address(&self.addresses)
    }
}

impl fmt::Display for MemberDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@{}:{}",
            self.id,
            DisplaySlice(&self.addresses),
            self.role
        )
    }
}
