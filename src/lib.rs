#![no_std]

//! A compact encoder for Garmin's Flexible and Interoperable Data Transfer
//! protocol.
//!
//! Cassette writes FIT documents: a file header, a body of definition and data
//! records, and a trailing cyclic redundancy check. Message layouts are
//! described once as a [`schema::MessageSchema`], then encoded into records
//! and appended to a document by an encoder from the [`avec`] module, which
//! patches the header and appends the checksum when finished.
//!
//! Most users should begin with [`avec::buffer::Encoder`] (or
//! [`avec::writer::Encoder`] for files) and the schemas in [`profile`], or
//! derive their own with [`avec::ToRecord`]. The byte-level building blocks
//! live in the [`sans`] module, for applications that manage their own
//! output.
//!
//! ## Cargo Features
//!
//! The following crate feature flags are available:
//!
//! - `derive`: enable derive macros (default).
//! - `std`: enable writer-based encoder (default).

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod avec;
pub mod profile;
pub mod sans;
pub mod schema;
