// SPDX-License-Identifier: MIT OR Apache-2.0
//! Serde helpers for representing [`std::time::Duration`] as milliseconds.

use serde::{Deserialize, Deserializer, Serializer};
use std::time::Duration;

/// Serialize a `Duration` as an integer millisecond count.
pub fn duration_millis<S>(d: &Duration, s: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    s.serialize_u64(d.as_millis() as u64)
}

/// Deserialize an integer millisecond count into a `Duration`.
pub fn duration_millis_de<'de, D>(d: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let millis = u64::deserialize(d)?;
    Ok(Duration::from_millis(millis))
}

/// Serde helpers for `Option<Duration>` represented as milliseconds.
pub mod option_duration_millis {
    use super::Duration;
    use serde::{Deserialize, Deserializer, Serializer};

    /// Serialize an `Option<Duration>` as `Option<u64>` milliseconds.
    pub fn serialize<S>(d: &Option<Duration>, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match d {
            Some(d) => s.serialize_some(&(d.as_millis() as u64)),
            None => s.serialize_none(),
        }
    }

    /// Deserialize `Option<u64>` milliseconds into `Option<Duration>`.
    pub fn deserialize<'de, D>(d: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = Option::<u64>::deserialize(d)?;
        Ok(millis.map(Duration::from_millis))
    }
}
