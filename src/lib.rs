//! Character Keeper Library
//!
//! Thread-log and profile extraction for role-play forum characters.

pub mod age;
pub mod config;
pub mod dates;
pub mod engine;
pub mod error;
pub mod fetch;
pub mod models;
pub mod profile;
pub mod threads;
pub mod tracker;

pub use config::Config;
pub use engine::{character_id_from_url, ExtractionEngine};
pub use error::FetchError;
pub use fetch::{HtmlFetcher, HttpFetcher};
pub use models::{CharacterStats, ExtractionResult, Thread};
