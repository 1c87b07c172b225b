// # Record Model
//
// The generic record every adapter speaks: a type, a name relative to the
// zone, a single value and a TTL, plus an optional provider-assigned ID.
//
// A provider record set holding several values (e.g. two TXT strings for the
// same name) maps to several `Record`s sharing name, type and TTL.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::name;

/// DNS record type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum RecordType {
    A,
    Aaaa,
    Caa,
    Cname,
    Mx,
    Naptr,
    Ns,
    Ptr,
    Soa,
    Spf,
    Srv,
    Txt,
    /// Any type without a dedicated variant, stored upper-case
    Other(String),
}

impl RecordType {
    /// Canonical upper-case mnemonic
    pub fn as_str(&self) -> &str {
        match self {
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
            RecordType::Caa => "CAA",
            RecordType::Cname => "CNAME",
            RecordType::Mx => "MX",
            RecordType::Naptr => "NAPTR",
            RecordType::Ns => "NS",
            RecordType::Ptr => "PTR",
            RecordType::Soa => "SOA",
            RecordType::Spf => "SPF",
            RecordType::Srv => "SRV",
            RecordType::Txt => "TXT",
            RecordType::Other(other) => other,
        }
    }

    /// Whether values of this type are quoted character-strings
    pub fn is_text(&self) -> bool {
        matches!(self, RecordType::Txt | RecordType::Spf)
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordType {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        if upper.is_empty() {
            return Err(crate::Error::invalid_input("record type cannot be empty"));
        }

        Ok(match upper.as_str() {
            "A" => RecordType::A,
            "AAAA" => RecordType::Aaaa,
            "CAA" => RecordType::Caa,
            "CNAME" => RecordType::Cname,
            "MX" => RecordType::Mx,
            "NAPTR" => RecordType::Naptr,
            "NS" => RecordType::Ns,
            "PTR" => RecordType::Ptr,
            "SOA" => RecordType::Soa,
            "SPF" => RecordType::Spf,
            "SRV" => RecordType::Srv,
            "TXT" => RecordType::Txt,
            _ => RecordType::Other(upper),
        })
    }
}

impl TryFrom<String> for RecordType {
    type Error = crate::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RecordType> for String {
    fn from(value: RecordType) -> Self {
        value.as_str().to_string()
    }
}

/// Provider-assigned record identifier
///
/// Carries the `(fully-qualified name, type)` identity of the record set a
/// record was read from. Two IDs are equal when both parts match; names are
/// stored normalized so case and trailing dots never matter.
///
/// Renders as the opaque string `<fqdn>:<TYPE>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RecordId {
    name: String,
    record_type: RecordType,
}

impl RecordId {
    /// Create an ID for the record set `fqdn`/`record_type`
    pub fn new(fqdn: &str, record_type: RecordType) -> Self {
        Self {
            name: name::normalize(fqdn),
            record_type,
        }
    }

    /// Normalized fully-qualified name (no trailing dot)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Record type part of the identity
    pub fn record_type(&self) -> &RecordType {
        &self.record_type
    }

    /// Whether this ID designates the record set `fqdn`/`record_type`
    pub fn matches(&self, fqdn: &str, record_type: &RecordType) -> bool {
        self.record_type == *record_type && name::names_equal(&self.name, fqdn)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.record_type)
    }
}

impl FromStr for RecordId {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, record_type) = s
            .rsplit_once(':')
            .ok_or_else(|| crate::Error::invalid_input(format!("malformed record ID: {s}")))?;
        if name.is_empty() {
            return Err(crate::Error::invalid_input(format!(
                "record ID has no name: {s}"
            )));
        }
        Ok(Self::new(name, record_type.parse()?))
    }
}

impl TryFrom<String> for RecordId {
    type Error = crate::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RecordId> for String {
    fn from(value: RecordId) -> Self {
        value.to_string()
    }
}

/// A single DNS record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Provider-assigned ID, absent for records the caller built
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,

    /// Record type
    #[serde(rename = "type")]
    pub record_type: RecordType,

    /// Name relative to the zone (`@` for the apex)
    pub name: String,

    /// Record value, unquoted
    pub value: String,

    /// Time-to-live
    #[serde(default, with = "ttl_secs")]
    pub ttl: Duration,
}

impl Record {
    /// Create a record without ID and with a zero TTL
    pub fn new(record_type: RecordType, name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            id: None,
            record_type,
            name: name.into(),
            value: value.into(),
            ttl: Duration::ZERO,
        }
    }

    /// Set the TTL
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Set the ID
    pub fn with_id(mut self, id: RecordId) -> Self {
        self.id = Some(id);
        self
    }
}

mod ttl_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(ttl: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(ttl.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}
