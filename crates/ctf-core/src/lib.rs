#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! A writable Compact Type Format (CTF) container.
//!
//! [`Container`] holds a dynamic dictionary of types and named
//! variables (the `add_*` family in [`builders`]), can snapshot and
//! roll back to an earlier point ([`snapshot`]), can serialize itself
//! to the on-disk layout and immediately re-parse that buffer as its
//! own committed view ([`serialize`]), and can pull in a type (and
//! everything it transitively references) from another container
//! ([`copy`]).
//!
//! `ctf-format` owns the wire layout and the read-only parser;
//! everything here is the mutable side.

mod builders;
mod container;
mod copy;
mod error;
mod id;
mod layout;
mod model;
mod record;
mod serialize;
mod snapshot;
mod store;
mod strtab;

pub use container::Container;
pub use error::{CtfError, Result};
pub use id::TypeId;
pub use layout::TypeQuery;
pub use model::DataModel;
pub use record::{Encoding, EnumeratorRecord, MemberRecord, TypePayload, TypeRecord, VarRecord};
pub use snapshot::Snapshot;

pub use ctf_format::Kind;
