//! Serde helpers for loosely structured external JSON.

use serde::{Deserialize, Deserializer};

/// Treats an explicit `null` like a missing field.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Maps an unrecognized keyword to `None` instead of failing the whole document.
pub fn optional_keyword<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: TryFrom<String>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|value| match T::try_from(value.clone()) {
        Ok(keyword) => Some(keyword),
        Err(_) => {
            tracing::debug!(value = %value, "Ignoring unrecognized keyword");
            None
        }
    }))
}
