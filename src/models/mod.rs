//! Data models for the SaveSpace backend.
//!
//! Field names serialize in camelCase to match the web client's document shapes.

mod category;
mod file;
mod task;
mod user;

pub use category::*;
pub use file::*;
pub use task::*;
pub use user::*;

use serde::{Deserialize, Deserializer};

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`).
pub(crate) fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}
