//! Dataset access layer
//!
//! Tag constants, value accessors, type-driven copy primitives and the
//! media file naming rules used by every record builder.

pub mod copy;
pub mod filename;
pub mod tags;
pub mod uids;

pub use copy::{AttributeCopier, AttributeType};
