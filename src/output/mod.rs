//! Tabular output
//!
//! One CSV file per successfully fetched page, numbered from 1, plus one
//! concatenated per-campaign artifact rebuilt from the page files whenever a
//! run reaches a terminal status. Column order: id-like fields first, then
//! amount/value fields, then provenance.

mod csv;
mod store;

pub use csv::{rows_to_string, write_row};
pub use store::{PageStore, COLUMNS};
