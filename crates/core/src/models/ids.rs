use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Raw identifier as it arrives on the wire. The backend hands out numeric
/// primary keys, but ids also travel through string-keyed maps and form
/// fields, so both shapes must be accepted.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Int(i64),
    Uint(u64),
    Float(f64),
    Text(String),
}

fn canonicalize<E: serde::de::Error>(raw: RawId) -> Result<String, E> {
    let text = match raw {
        RawId::Int(n) => n.to_string(),
        RawId::Uint(n) => n.to_string(),
        RawId::Float(f) if f.is_finite() && f.fract() == 0.0 => format!("{f:.0}"),
        RawId::Float(f) => return Err(E::custom(format!("identifier must be integral, got {f}"))),
        RawId::Text(s) => s.trim().to_string(),
    };
    if text.is_empty() {
        return Err(E::custom("identifier must not be empty"));
    }
    Ok(text)
}

/// Integral ids go back out as JSON numbers so the backend sees the same
/// shape it produced.
fn serialize_canonical<S: Serializer>(text: &str, serializer: S) -> Result<S::Ok, S::Error> {
    match text.parse::<i64>() {
        Ok(n) => serializer.serialize_i64(n),
        Err(_) => serializer.serialize_str(text),
    }
}

/// Canonical company identifier.
///
/// `10` and `"10"` compare equal: the value is normalized to its trimmed
/// string form once, when it enters the crate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CompanyId(String);

impl CompanyId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into().trim().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CompanyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<i64> for CompanyId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

impl From<i32> for CompanyId {
    fn from(id: i32) -> Self {
        Self(id.to_string())
    }
}

impl From<&str> for CompanyId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for CompanyId {
    fn from(id: String) -> Self {
        Self::new(id)
    }
}

impl Serialize for CompanyId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_canonical(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for CompanyId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawId::deserialize(deserializer)?;
        canonicalize(raw).map(Self)
    }
}

/// Canonical identifier of a single purchase lot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InvestmentId(String);

impl InvestmentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into().trim().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for InvestmentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<i64> for InvestmentId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

impl From<i32> for InvestmentId {
    fn from(id: i32) -> Self {
        Self(id.to_string())
    }
}

impl From<&str> for InvestmentId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl Serialize for InvestmentId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_canonical(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for InvestmentId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawId::deserialize(deserializer)?;
        canonicalize(raw).map(Self)
    }
}
