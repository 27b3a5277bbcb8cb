use serde::{Deserialize, Serialize};

use crate::IdError;

/// Stock keeping unit of a product variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Sku(String);

impl Sku {
    /// Parses a SKU, trimming surrounding whitespace. Blank values are rejected.
    pub fn parse(value: impl AsRef<str>) -> Result<Self, IdError> {
        let trimmed = value.as_ref().trim();
        if trimmed.is_empty() {
            return Err(IdError::Missing { kind: "sku" });
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Returns the SKU as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Sku {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Sku {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Sku {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<Sku> for String {
    fn from(sku: Sku) -> Self {
        sku.0
    }
}
