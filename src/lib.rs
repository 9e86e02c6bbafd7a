//! Daily TT buying/selling rates scraped from the bank's forex card page,
//! stored in SQLite by date and served through a small viewer.

pub mod config;
pub mod document;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod ingest;
pub mod rate_record;
pub mod server;
pub mod store;
pub mod view;
