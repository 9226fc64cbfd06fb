//! Strongly-typed identifiers.

use serde::Serialize;
use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

use crate::error::{ReceiptError, Result};

/// A validated product identifier, e.g. `com.example.app.monthly`.
///
/// Never empty and never contains control characters. Borrows as `str`, so
/// maps keyed by `ProductId` can be queried with a plain string.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.is_empty() || id.chars().any(char::is_control) {
            return Err(ReceiptError::InvalidProductId(id));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Debug for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProductId({})", self.0)
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for ProductId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ProductId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for ProductId {
    type Err = ReceiptError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for ProductId {
    type Error = ReceiptError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_valid_product_id() {
        let id = ProductId::new("com.example.app.monthly").unwrap();
        assert_eq!(id.as_str(), "com.example.app.monthly");
        assert_eq!(id.to_string(), "com.example.app.monthly");
        assert_eq!(format!("{:?}", id), "ProductId(com.example.app.monthly)");
    }

    #[test]
    fn test_invalid_product_ids() {
        assert!(matches!(
            ProductId::new(""),
            Err(ReceiptError::InvalidProductId(_))
        ));
        assert!(ProductId::new("com.example\n").is_err());
        assert!(ProductId::new("com\u{0}example").is_err());
    }

    #[test]
    fn test_map_lookup_by_str() {
        let mut map = BTreeMap::new();
        map.insert(ProductId::new("b").unwrap(), 2);
        map.insert(ProductId::new("a").unwrap(), 1);

        assert_eq!(map.get("a"), Some(&1));
        let keys: Vec<&str> = map.keys().map(ProductId::as_str).collect();
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let id: ProductId = "com.example.pro".parse().unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), r#""com.example.pro""#);
    }
}
