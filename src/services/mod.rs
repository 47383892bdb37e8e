//! Domain services used by the HTTP routes.
//!
//! ARCHITECTURE
//! ============
//! Service modules own the in-memory stores and their rules so route
//! handlers stay focused on request validation and envelope shaping. The
//! compiler itself lives in [`crate::compiler`]; nothing here touches it.

pub mod chat;
pub mod document;
pub mod highlight;
pub mod template;

use serde::{Deserialize, Deserializer};

/// `deserialize_with` target for nullable patch fields of type `Option<Option<T>>`.
/// Paired with `#[serde(default)]`, an absent field stays `None` and an
/// explicit `null` becomes `Some(None)`.
pub(crate) fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
