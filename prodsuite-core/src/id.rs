//! Document identifiers.

use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Deserializer};
use uuid::Uuid;

use crate::error::{SuiteError, SuiteResult};

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Distinguishes an absent field (`None`) from an explicit `null`
/// (`Some(None)`). Use with `#[serde(default, deserialize_with = "nullable")]`.
pub fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Resolve a nullable folder reference from a partial update.
pub fn parse_nullable_id(
    raw: Option<&Option<String>>,
    entity: &'static str,
) -> SuiteResult<Option<Option<Uuid>>> {
    match raw {
        None => Ok(None),
        Some(inner) => parse_optional_id(inner.as_deref(), entity).map(Some),
    }
}

pub fn new_id() -> Uuid {
    Uuid::new_v4()
}

/// Short sortable id for embedded records: `"<unix millis>-<9 base36 chars>"`.
pub fn timestamped_id() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..9)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();
    format!("{}-{}", Utc::now().timestamp_millis(), suffix)
}

/// Parse a path or body id, naming the entity in the error (`"Invalid note ID"`).
pub fn parse_id(raw: &str, entity: &'static str) -> SuiteResult<Uuid> {
    Uuid::parse_str(raw.trim()).map_err(|_| SuiteError::InvalidId(entity))
}

/// Like [`parse_id`] but treats an empty string as "no id".
pub fn parse_optional_id(raw: Option<&str>, entity: &'static str) -> SuiteResult<Option<Uuid>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => parse_id(raw, entity).map(Some),
    }
}
