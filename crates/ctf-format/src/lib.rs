//! On-disk binary layout for the Compact Type Format, and the reader
//! that decodes a buffer back into an indexed, read-only view.
//!
//! This crate owns the wire shape only: the header, the type and
//! variable record encodings, the type-kind enum, and a buffer
//! decoder. It knows nothing about building types incrementally,
//! snapshots, or cross-container copy — that lives in `ctf-core`.

pub mod error;
pub mod header;
pub mod kind;
pub mod limits;
pub mod reader;
pub mod records;

pub use error::{FormatError, Result};
pub use header::Header;
pub use kind::Kind;
pub use reader::{ParsedMember, ParsedPayload, ParsedType, ParsedView};
