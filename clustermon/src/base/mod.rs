//! Basic types and utilities shared by the other modules.

pub mod display_ext;
