//! AI creative tagging for AdPulse.
//!
//! Classifies stored ad creatives along five fixed axes (asset type, visual
//! format, messaging angle, hook tactic, offer type) by calling an
//! OpenAI-compatible chat-completions endpoint in JSON mode. A tag set is
//! all-or-nothing: the provider response must contain all five fields or the
//! ad stays untagged.

pub mod client;
pub mod error;
pub mod prompt;

pub use client::TaggerClient;
pub use error::TaggerError;
pub use prompt::CreativeBrief;
