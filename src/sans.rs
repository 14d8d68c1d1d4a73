//! Byte-level building blocks of a FIT document.
//!
//! Nothing in this module owns or touches an output sink. Each function
//! produces bytes (or appends them to a caller's buffer), leaving the
//! application free to decide where they go. See [`crate::avec`] for encoders
//! that manage a whole document.
//!
//! # Document structure
//!
//! A document is a 14-byte [`header`], followed by a body of records, followed
//! by a two-byte checksum computed with [`check`] over everything before it.
//!
//! Every record begins with a one-byte record header holding a local message
//! number (0 to 15). A [`definition`] record binds that local number to a
//! global message number and a list of fields (number, size, and base type).
//! A data record then carries field values, laid out as described by the most
//! recent definition for its local number. Values are encoded per base type
//! by [`data`].
//!
//! Re-defining a local number at any point is valid, and required before
//! writing data whose field sizes differ from the previous definition.
//! Tracking this is left to the application.

pub mod check;
pub mod data;
pub mod definition;
pub mod header;
