//! Domain models for the shortener.
//!
//! This module contains the stored link records, the outcomes backends report,
//! and the HTTP request/response contracts.

pub mod dto;
pub mod link;

pub use dto::{
    BatchRequestEntry, BatchResponseEntry, ShortenRequest, ShortenResponse, StatsResponse,
    UserUrl,
};
pub use link::{FileRecord, Resolved, ShortLink, ShortenOutcome, short_url};
