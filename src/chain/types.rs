use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Chains the service knows how to fetch and analyze.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Chain {
    Ethereum,
    Bitcoin,
    Bsc,
    Solana,
}

impl Chain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ethereum => "ethereum",
            Self::Bitcoin => "bitcoin",
            Self::Bsc => "bsc",
            Self::Solana => "solana",
        }
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Chain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ethereum" => Ok(Self::Ethereum),
            "bitcoin" => Ok(Self::Bitcoin),
            "bsc" => Ok(Self::Bsc),
            "solana" => Ok(Self::Solana),
            other => Err(format!("Unsupported blockchain: {}", other)),
        }
    }
}

/// A transaction in its chain-native JSON shape.
///
/// The analysis core only reads `hash`, `value`, `from` and `to`; every other
/// field is carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Transaction(Map<String, Value>);

impl Transaction {
    /// Wrap an arbitrary JSON value. Anything that is not an object becomes an
    /// empty transaction, which no rule will match.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(fields) => Self(fields),
            other => {
                tracing::warn!(value = %other, "Transaction is not a JSON object, treating as empty");
                Self::default()
            }
        }
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn hash(&self) -> Option<&str> {
        self.str_field("hash")
    }

    pub fn value(&self) -> Option<&Value> {
        self.field("value")
    }

    pub fn from_address(&self) -> Option<&str> {
        self.str_field("from")
    }

    pub fn to_address(&self) -> Option<&str> {
        self.str_field("to")
    }
}

impl From<Map<String, Value>> for Transaction {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}
