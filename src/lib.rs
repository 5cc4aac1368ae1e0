//! Link-extraction pipeline for AnimePahe: resolves an opaque episode
//! descriptor to playable stream URLs by bypassing the `pahe.win` ad gate
//! and decoding the scrambled `kwik` player payloads.

pub mod error;
pub mod extractors;
pub mod models;
pub mod session;
pub mod suppliers;
pub mod utils;

pub use error::ExtractError;
pub use models::{FailurePolicy, StreamCandidate};
pub use suppliers::animepahe::AnimePaheExtractor;
