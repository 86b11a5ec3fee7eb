// src/goals/mod.rs
// Goal records and name canonicalization

pub mod codec;
pub mod record;

pub use codec::{CanonicalKey, GoalName, canonicalize, display_from_stored};
pub use record::{GoalField, GoalRecord, GoalStatus, TIMESTAMP_FORMAT, format_elapsed};
