pub mod client;
pub mod dedup;
pub mod error;
pub mod extract;

pub use client::AdLibraryClient;
pub use dedup::{dedup_batch, MAX_TRACKED_ADS};
pub use error::ScraperError;
pub use extract::media_fingerprint;
