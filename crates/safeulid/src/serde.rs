use crate::Ulid;
use ::serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use core::fmt;

/// Serializes as the 26-character Crockford base32 string.
impl Serialize for Ulid {
    fn serialize<S>(&self, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        s.serialize_str(self.encode().as_str())
    }
}

impl<'de> Deserialize<'de> for Ulid {
    fn deserialize<D>(d: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct Base32Visitor;

        impl de::Visitor<'_> for Base32Visitor {
            type Value = Ulid;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("a Crockford base32 encoded ULID")
            }

            #[inline]
            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ulid::decode(v).map_err(de::Error::custom)
            }
        }

        d.deserialize_str(Base32Visitor)
    }
}

/// Serializes a [`Ulid`] as its native `u128` integer.
///
/// Use with `#[serde(with = "safeulid::as_raw_ulid")]`.
pub mod as_raw_ulid {
    use super::{Deserialize, Deserializer, Serialize, Serializer};
    use crate::Ulid;

    /// # Errors
    ///
    /// Returns an error if the underlying serializer fails.
    pub fn serialize<S>(id: &Ulid, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        id.to_raw().serialize(s)
    }

    /// # Errors
    ///
    /// Returns an error if the underlying deserializer fails. Every `u128` is
    /// a valid ULID.
    pub fn deserialize<'de, D>(d: D) -> Result<Ulid, D::Error>
    where
        D: Deserializer<'de>,
    {
        u128::deserialize(d).map(Ulid::from_raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Base32Error, PoolConfig};
    use serde_json::json;

    #[derive(PartialEq, Eq, Debug, Serialize, Deserialize)]
    struct Row {
        event_id: Ulid,
    }

    #[test]
    fn base32_roundtrip() {
        let row = Row {
            event_id: Ulid::from_parts(1_469_922_850_259, 1_012_768_647_078_601_740_696_923),
        };

        let json = serde_json::to_string(&row).expect("serialize");
        assert_eq!(json, r#"{"event_id":"01ARZ3NDEKTSV4RRFFQ69G5FAV"}"#);
        let back: Row = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, row);
    }

    #[test]
    fn base32_decode_overflow() {
        let json = json!({"event_id": "8ZZZZZZZZZZZZZZZZZZZZZZZZZ"});
        let err = serde_json::from_value::<Row>(json).expect_err("should fail");
        assert!(err.to_string().contains(&Base32Error::Overflow.to_string()));
    }

    #[test]
    fn raw_roundtrip() {
        #[derive(PartialEq, Eq, Debug, Serialize, Deserialize)]
        struct RawRow {
            #[serde(with = "as_raw_ulid")]
            event_id: Ulid,
        }
        let row = RawRow {
            event_id: Ulid::from_raw(42),
        };

        let json = serde_json::to_string(&row).expect("serialize");
        assert_eq!(json, r#"{"event_id":42}"#);
        let back: RawRow = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, row);
    }

    #[test]
    fn pool_config_fills_missing_fields() {
        let config: PoolConfig = serde_json::from_value(json!({"shards": 3})).expect("deserialize");
        assert_eq!(config.shards, 3);
        assert_eq!(config.idle_per_shard, PoolConfig::default().idle_per_shard);
    }
}
