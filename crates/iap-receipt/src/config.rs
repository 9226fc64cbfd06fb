//! Decoder configuration.

use iap_receipt_der::{DecoderLimits, DEFAULT_MAX_DEPTH};
use serde::{Deserialize, Serialize};

use crate::purchase::PurchaseRecord;

/// Default cap on the size of a receipt blob (4 MiB).
pub const DEFAULT_MAX_RECEIPT_SIZE: u64 = 4 * 1024 * 1024;

/// Which purchase records count toward a product's expiration date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpirationPolicy {
    /// Every record with an expiration date counts, cancelled or not.
    #[default]
    IncludeCancelled,
    /// Records carrying a cancellation date are ignored.
    ExcludeCancelled,
}

impl ExpirationPolicy {
    /// Whether `record` is considered under this policy.
    pub fn admits(self, record: &PurchaseRecord) -> bool {
        match self {
            Self::IncludeCancelled => true,
            Self::ExcludeCancelled => !record.is_cancelled(),
        }
    }
}

/// Configuration for receipt decoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReceiptConfig {
    /// Larger blobs are refused before decoding starts.
    pub max_receipt_size: u64,
    /// Maximum DER nesting depth.
    pub max_depth: usize,
    /// Default policy for [`AppReceipt::expiration_date_for_product`](crate::AppReceipt::expiration_date_for_product).
    pub expiration_policy: ExpirationPolicy,
}

impl Default for ReceiptConfig {
    fn default() -> Self {
        Self {
            max_receipt_size: DEFAULT_MAX_RECEIPT_SIZE,
            max_depth: DEFAULT_MAX_DEPTH,
            expiration_policy: ExpirationPolicy::default(),
        }
    }
}

impl ReceiptConfig {
    /// Limits handed to the DER decoder.
    pub fn decoder_limits(&self) -> DecoderLimits {
        DecoderLimits {
            max_depth: self.max_depth,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ReceiptConfig::default();
        assert_eq!(config.max_receipt_size, 4 * 1024 * 1024);
        assert_eq!(config.max_depth, 16);
        assert_eq!(config.expiration_policy, ExpirationPolicy::IncludeCancelled);
        assert_eq!(config.decoder_limits(), DecoderLimits::default());
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: ReceiptConfig =
            serde_json::from_str(r#"{"max_depth": 8, "expiration_policy": "exclude_cancelled"}"#)
                .unwrap();
        assert_eq!(config.max_depth, 8);
        assert_eq!(config.max_receipt_size, DEFAULT_MAX_RECEIPT_SIZE);
        assert_eq!(config.expiration_policy, ExpirationPolicy::ExcludeCancelled);
    }

    #[test]
    fn test_unknown_policy_rejected() {
        let result: Result<ReceiptConfig, _> =
            serde_json::from_str(r#"{"expiration_policy": "latest"}"#);
        assert!(result.is_err());
    }
}
