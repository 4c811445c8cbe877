//! Dynamically-typed configuration values.
//!
//! Hand-authored YAML writes quantities such as `cpu` and `memory` as strings,
//! integers or floats, and `ssh_public_key` as either a string or a list.
//! `RawValue` captures whatever shape was written so that normalization can
//! happen later with a precise error, instead of failing inside the YAML
//! decoder.
//!
//! # Examples
//!
//! ```rust
//! use devenv_config::RawValue;
//!
//! let cpu: RawValue = serde_yaml::from_str("\"500m\"").unwrap();
//! assert_eq!(cpu, RawValue::Text("500m".to_string()));
//!
//! let memory: RawValue = serde_yaml::from_str("8").unwrap();
//! assert_eq!(memory, RawValue::Integer(8));
//! ```

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A configuration value whose type is only known after decoding.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RawValue {
    /// The key was missing or explicitly null.
    #[default]
    Absent,
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    List(Vec<RawValue>),
    /// A shape no field accepts (for example a mapping); holds its kind name.
    Unsupported(String),
}

impl RawValue {
    /// Returns `true` if no value was provided.
    pub fn is_absent(&self) -> bool {
        matches!(self, RawValue::Absent)
    }

    /// Short name of the value's shape, used in error messages.
    pub fn kind(&self) -> &str {
        match self {
            RawValue::Absent => "null",
            RawValue::Text(_) => "string",
            RawValue::Integer(_) => "integer",
            RawValue::Float(_) => "float",
            RawValue::Bool(_) => "boolean",
            RawValue::List(_) => "list",
            RawValue::Unsupported(kind) => kind.as_str(),
        }
    }

    /// Renders the value for diagnostics.
    pub fn describe(&self) -> String {
        match self {
            RawValue::Absent => String::new(),
            RawValue::Text(s) => s.clone(),
            RawValue::Integer(i) => i.to_string(),
            RawValue::Float(f) => f.to_string(),
            RawValue::Bool(b) => b.to_string(),
            RawValue::List(items) => format!(
                "[{}]",
                items
                    .iter()
                    .map(RawValue::describe)
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            RawValue::Unsupported(kind) => format!("<{}>", kind),
        }
    }

    /// Builds a list of text values.
    pub fn text_list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        RawValue::List(items.into_iter().map(|s| RawValue::Text(s.into())).collect())
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Text(value.to_string())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        RawValue::Text(value)
    }
}

impl From<i64> for RawValue {
    fn from(value: i64) -> Self {
        RawValue::Integer(value)
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        RawValue::Float(value)
    }
}

impl Serialize for RawValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            RawValue::Absent | RawValue::Unsupported(_) => serializer.serialize_none(),
            RawValue::Text(s) => serializer.serialize_str(s),
            RawValue::Integer(i) => serializer.serialize_i64(*i),
            RawValue::Float(f) => serializer.serialize_f64(*f),
            RawValue::Bool(b) => serializer.serialize_bool(*b),
            RawValue::List(items) => serializer.collect_seq(items),
        }
    }
}

// Accepts any YAML shape; rejection is left to the normalizers.
impl<'de> Deserialize<'de> for RawValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::{self, IgnoredAny, MapAccess, SeqAccess, Visitor};
        use std::fmt;

        struct RawValueVisitor;

        impl<'de> Visitor<'de> for RawValueVisitor {
            type Value = RawValue;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a string, number, boolean or list")
            }

            fn visit_bool<E>(self, v: bool) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(RawValue::Bool(v))
            }

            fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(RawValue::Integer(v))
            }

            fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                // Values beyond i64 keep their digits so the parser can report the overflow.
                Ok(i64::try_from(v)
                    .map(RawValue::Integer)
                    .unwrap_or_else(|_| RawValue::Text(v.to_string())))
            }

            fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(RawValue::Float(v))
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(RawValue::Text(v.to_string()))
            }

            fn visit_string<E>(self, v: String) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(RawValue::Text(v))
            }

            fn visit_none<E>(self) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(RawValue::Absent)
            }

            fn visit_unit<E>(self) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(RawValue::Absent)
            }

            fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
            where
                D: Deserializer<'de>,
            {
                RawValue::deserialize(deserializer)
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
                while let Some(item) = seq.next_element::<RawValue>()? {
                    items.push(item);
                }
                Ok(RawValue::List(items))
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                while map.next_entry::<IgnoredAny, IgnoredAny>()?.is_some() {}
                Ok(RawValue::Unsupported("mapping".to_string()))
            }
        }

        deserializer.deserialize_any(RawValueVisitor)
    }
}

#[cfg(test)]
#[path = "raw_value_tests.rs"]
mod tests;
