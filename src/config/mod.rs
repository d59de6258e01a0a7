//! Configuration for the client adapter and the façades.
//!
//! # Module layout
//!
//! - **types**: Public, validated structs (`Config`, `LlmSettings`,
//!   `VisionSettings`, `QualityThresholds`).
//! - **raw**: Raw TOML deserialization types. These mirror the file shape
//!   and use serde defaults; kept private.
//! - **load**: `load_from` (file, with `[meta] base` inheritance) and
//!   `from_toml_str`.

mod load;
mod raw;
mod types;

pub use load::{from_toml_str, load_from};
pub use types::*;
