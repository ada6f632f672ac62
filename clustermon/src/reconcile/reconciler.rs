use std::collections::BTreeSet;
use std::fmt;

use tracing::debug;
use tracing::warn;

use crate::base::display_ext::DisplaySlice;
use crate::event::Event;
use crate::event::EventKind;
use crate::membership::Address;
use crate::membership::Member;
use crate::membership::MemberDescriptor;
use crate::membership::MembershipSet;

/// The outcome of one [`reconcile`] pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reconciliation {
    /// Topology events in emitting order: exits, then enters, then changes.
    pub events: Vec<Event>,

    /// Bolt addresses of the members that entered, to set up.
    pub entering: Vec<Address>,

    /// Last known bolt addresses of the members that exited, to tear down.
    pub exiting: Vec<Address>,

    /// `(old, new)` bolt addresses of persisting members whose bolt address
    /// changed. Their subscriptions must follow the new address.
    pub moved: Vec<(Address, Address)>,
}

impl Reconciliation {
    /// Whether the pass changed nothing.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
            && self.entering.is_empty()
            && self.exiting.is_empty()
            && self.moved.is_empty()
    }
}

impl fmt::Display for Reconciliation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "events: {}, entering: {}, exiting: {}, moved: {}",
            self.events.len(),
            DisplaySlice(&self.entering),
            DisplaySlice(&self.exiting),
            self.moved.len()
        )
    }
}

/// Apply an observed topology to `current` in place.
///
/// - A member in `current` but not in `observed` exits: it is removed.
/// - A member in `observed` but not in `current` enters: it is appended.
/// - A member in both is merged field-wise; a `change` event is raised only
///   if a field actually changed. Observations accumulated on it are kept.
///
/// Members are matched by id. If `observed` contains an id more than once,
/// the first occurrence is used.
///
/// All mutations are done before returning, and the returned events are
/// meant to be emitted after that. Reconciling against the same `observed`
/// twice produces no event the second time.
pub fn reconcile(
    current: &mut MembershipSet,
    observed: Vec<MemberDescriptor>,
) -> Reconciliation {
    let observed = dedup(observed);
    let observed_ids =
        observed.iter().map(|d| d.id.as_str()).collect::<BTreeSet<_>>();

    let mut res = Reconciliation::default();

    // Exits, in the order members entered.

    let exiting_ids = current
        .ids()
        .filter(|id| !observed_ids.contains(id.as_str()))
        .cloned()
        .collect::<Vec<_>>();

    for id in exiting_ids {
        let Some(member) = current.remove(&id) else {
            continue;
        };

        debug!("member exits: {}", member);

        res.events.push(Event::member(EventKind::Exit, &member));
        res.exiting.push(member.bolt_address().to_string());
    }

    // Changes of persisting members, in the order members entered.

    let mut changes = vec![];

    for d in observed.iter() {
        let Some(member) = current.get_mut(&d.id) else {
            continue;
        };

        let old_bolt = member.bolt_address().to_string();

        if !member.merge(d) {
            continue;
        }

        debug!("member changed: {}", member);

        let new_bolt = member.bolt_address().to_string();
        if new_bolt != old_bolt {
            res.moved.push((old_bolt, new_bolt));
        }

        changes.push(member.id().clone());
    }

    // Enters, in observed order.

    for d in observed {
        if current.contains(&d.id) {
            continue;
        }

        let member = Member::from(d);
        debug!("member enters: {}", member);

        res.events.push(Event::member(EventKind::Enter, &member));
        res.entering.push(member.bolt_address().to_string());

        current.insert(member);
    }

    for m in current.iter() {
        if changes.contains(m.id()) {
            res.events.push(Event::member(EventKind::Change, m));
        }
    }

    res
}

/// Remove descriptors whose id appeared earlier in `observed`.
fn dedup(observed: Vec<MemberDescriptor>) -> Vec<MemberDescriptor> {
    let mut seen = BTreeSet::new();
    let mut res = Vec::with_capacity(observed.len());

    for d in observed {
        if !seen.insert(d.id.clone()) {
            warn!("duplicate member id in observed topology, ignore: {}", d);
            continue;
        }
        res.push(d);
    }

    res
}
