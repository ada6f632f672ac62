use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::fmt;

use chrono::DateTime;
use chrono::Utc;

use crate::base::display_ext::DisplayOptionExt;
use crate::base::display_ext::DisplaySlice;
use crate::membership::pick_bolt_address;
use crate::membership::Address;
use crate::membership::MemberDescriptor;
use crate::membership::MemberId;
use crate::membership::Role;
use crate::query::driver::Components;

/// Whether a member answered its feeds recently.
#[derive(Debug, Clone, Copy, Default)]
#[derive(PartialEq, Eq)]
#[derive(serde::Deserialize, serde::Serialize)]
pub enum Liveness {
    /// No feed has delivered anything yet.
    #[default]
    Unknown,
    Online,
    Offline,
}

/// A cluster member tracked by the monitor.
///
/// A `Member` lives as long as refreshes keep reporting its id. Observations
/// accumulated on it, such as liveness and components, survive every merge of
/// a fresh [`MemberDescriptor`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[derive(serde::Deserialize, serde::Serialize)]
pub struct Member {
    id: MemberId,
    addresses: Vec<Address>,
    role: Role,
    databases: BTreeMap<String, Role>,
    groups: Vec<String>,

    liveness: Liveness,

    /// The last time a feed of this member delivered a sample.
    last_healthy: Option<DateTime<Utc>>,

    /// Product information, available once setup of this member completes.
    components: Option<Components>,
}

impl From<MemberDescriptor> for Member {
    fn from(d: MemberDescriptor) -> Self {
        Self {
            id: d.id,
            addresses: d.addresses,
            role: d.role,
            databases: d.databases,
            groups: d.groups,
            liveness: Liveness::Unknown,
            last_healthy: None,
            components: None,
        }
    }
}

impl Member {
    pub fn id(&self) -> &MemberId {
        &self.id
    }

    pub fn addresses(&self) -> &[Address] {
        &self.addresses
    }

    /// The address feeds and drivers of this member are keyed by.
    pub fn bolt_address(&self) -> &str {
        pick_bolt_address(&self.addresses)
    }

    pub fn role(&self) -> &Role {
        &self.role
    }

    pub fn databases(&self) -> &BTreeMap<String, Role> {
        &self.databases
    }

    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    pub fn liveness(&self) -> Liveness {
        self.liveness
    }

    pub fn is_online(&self) -> bool {
        self.liveness == Liveness::Online
    }

    pub fn last_healthy(&self) -> Option<DateTime<Utc>> {
        self.last_healthy
    }

    pub fn components(&self) -> Option<&Components> {
        self.components.as_ref()
    }

    pub(crate) fn mark_online(&mut self, now: DateTime<Utc>) {
        self.liveness = Liveness::Online;
        self.last_healthy = Some(now);
    }

    pub(crate) fn mark_offline(&mut self) {
        self.liveness = Liveness::Offline;
    }

    pub(crate) fn set_components(&mut self, components: Components) {
        self.components = Some(components);
    }

    /// Merge the fields reported by a refresh into this member in place.
    ///
    /// Returns `true` if any field changed. Liveness, health timestamp and
    /// components are observations of the monitor and are left untouched.
    pub(crate) fn merge(&mut self, d: &MemberDescriptor) -> bool {
        debug_assert_eq!(self.id, d.id, "merge is only valid for the same id");

        let mut changed = false;

        // Addresses are a set: a reordering alone keeps the stored order, and
        // with it the bolt address.
        let curr = self.addresses.iter().collect::<BTreeSet<_>>();
        let observed = d.addresses.iter().collect::<BTreeSet<_>>();
        if curr != observed {
            self.addresses = d.addresses.clone();
            changed = true;
        }

        if self.role != d.role {
            self.role = d.role.clone();
            changed = true;
        }

        if self.databases != d.databases {
            self.databases = d.databases.clone();
            changed = true;
        }

        if self.groups != d.groups {
            self.groups = d.groups.clone();
            changed = true;
        }

        changed
    }
}

impl fmt::Display for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@{}:{}({:?}, last_healthy:{})",
            self.id,
            DisplaySlice(&self.addresses),
            self.role,
            self.liveness,
            self.last_healthy.display(),
        )
    }
}
