//! Diff the observed cluster topology against the known members.

mod reconciler;


pub use reconciler::reconcile;
pub use reconciler::Reconciliation;
