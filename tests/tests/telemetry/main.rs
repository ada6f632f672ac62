#![cfg_attr(feature = "bt", feature(error_generic_member_access))]

#[path = "../fixtures/mod.rs"]
mod fixtures;

mod t21_memory_alert;
mod t30_released_waiter;
mod t40_components;
