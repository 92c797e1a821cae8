//! Handler registries.
//!
//! Writing dispatches on the runtime type of a value ([`WriteHandlers`]),
//! reading dispatches on the tag found on the wire ([`ReadHandlers`]).
//! Both registries share a process-wide default table until the first
//! custom registration.

mod read;
mod read_defaults;
mod type_key;
mod write;
mod write_defaults;

pub use read::{DefaultReadHandler, KeepTagged, ReadHandler, ReadHandlers};
pub use type_key::TypeKey;
pub use write::{FnWriteHandler, WriteHandler, WriteHandlers};
