//! Output model for worksheet extraction.
//!
//! A worksheet is returned as a [`Table`] of [`Row`]s, each row an ordered
//! list of resolved cell values.

mod table;

pub use table::*;
