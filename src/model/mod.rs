//! Core data entities for the harvest cycle
//!
//! # Components
//!
//! - `Cursor`: opaque continuation token for the donor-list stream
//! - `Donation`: one donor record as returned by the platform
//! - `CursorPage`: one fetched page of donor records plus its continuation
//! - `ScrapeRun`: per-invocation state of a pagination walk

mod cursor;
mod donation;
mod page;
mod run;

pub use cursor::Cursor;
pub use donation::{Donation, DonorUser};
pub use page::CursorPage;
pub use run::{RunStatus, ScrapeRun};
