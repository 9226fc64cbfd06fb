//! The decoded app receipt.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use iap_receipt_der::{ByteRange, ByteSource, FileSource, MemorySource, SourceError};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

use crate::attribute::{optional, AttributeReader, ReceiptField};
use crate::config::{ExpirationPolicy, ReceiptConfig};
use crate::container::locate_payload;
use crate::crypto::{serialize_hex, ReceiptHash};
use crate::error::{ReceiptError, Result};
use crate::purchase::PurchaseRecord;
use crate::types::ProductId;

/// An app receipt, decoded once and immutable afterwards.
///
/// Purchases are grouped by product identifier, each group in the order
/// the receipt lists them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppReceipt {
    bundle_identifier: String,
    /// The DER UTF8String the bundle identifier was decoded from, as stored.
    #[serde(serialize_with = "serialize_hex")]
    bundle_identifier_data: Bytes,
    #[serde(serialize_with = "serialize_hex")]
    opaque_value: Bytes,
    receipt_hash: ReceiptHash,
    original_application_version: Option<String>,
    creation_date: Option<DateTime<Utc>>,
    expiration_date: Option<DateTime<Utc>>,
    purchases: BTreeMap<ProductId, Vec<PurchaseRecord>>,
    #[serde(skip)]
    expiration_policy: ExpirationPolicy,
}

impl AppReceipt {
    /// Decode a receipt held in memory.
    pub fn from_bytes(bytes: impl Into<Bytes>, config: &ReceiptConfig) -> Result<Self> {
        let source = MemorySource::new(bytes);
        Self::from_source(&source, config)
    }

    /// Decode the receipt file at `path`.
    ///
    /// The file is held open only for the duration of the call.
    pub fn from_path(path: impl AsRef<Path>, config: &ReceiptConfig) -> Result<Self> {
        let source = FileSource::open_with_limit(path, config.max_receipt_size)?;
        Self::from_source(&source, config)
    }

    /// Decode a PKCS#7 receipt or a bare attribute SET.
    pub fn from_source<S: ByteSource + ?Sized>(source: &S, config: &ReceiptConfig) -> Result<Self> {
        if source.len() > config.max_receipt_size {
            return Err(SourceError::TooLarge {
                size: source.len(),
                limit: config.max_receipt_size,
            }
            .into());
        }
        let payload = locate_payload(source, config.decoder_limits())?;
        Self::parse_payload(source, payload, config)
    }

    /// Decode the attribute SET whose encoding starts at `range.offset`.
    pub fn parse_payload<S: ByteSource + ?Sized>(
        source: &S,
        range: ByteRange,
        config: &ReceiptConfig,
    ) -> Result<Self> {
        let limits = config.decoder_limits();

        let mut bundle = None;
        let mut opaque_value = Bytes::new();
        let mut receipt_hash = None;
        let mut original_application_version = None;
        let mut creation_date = None;
        let mut expiration_date = None;
        let mut purchases: BTreeMap<ProductId, Vec<PurchaseRecord>> = BTreeMap::new();

        for attribute in AttributeReader::open(source, range, limits)? {
            let attribute = attribute?;
            let Some(field) = ReceiptField::from_code(attribute.type_code) else {
                debug!(
                    attribute_type = attribute.type_code,
                    version = attribute.version,
                    "skipping unknown receipt attribute"
                );
                continue;
            };
            let name = field.name();

            match field {
                ReceiptField::BundleIdentifier => {
                    let identifier = attribute.string(source)?;
                    bundle = Some((identifier, attribute.raw(source)?));
                }
                ReceiptField::OpaqueValue => {
                    opaque_value = attribute.raw(source)?;
                }
                ReceiptField::ReceiptHash => {
                    let raw = attribute.raw(source)?;
                    receipt_hash = Some(ReceiptHash::try_from(raw.as_ref())?);
                }
                ReceiptField::InAppPurchase => {
                    if let Some(record) = PurchaseRecord::parse(source, attribute.value, limits)? {
                        purchases
                            .entry(record.product_identifier().clone())
                            .or_default()
                            .push(record);
                    }
                }
                ReceiptField::OriginalApplicationVersion => {
                    original_application_version = optional(name, attribute.string(source))?;
                }
                ReceiptField::CreationDate => {
                    creation_date = optional(name, attribute.date(source))?;
                }
                ReceiptField::ExpirationDate => {
                    expiration_date = optional(name, attribute.date(source))?;
                }
            }
        }

        let (bundle_identifier, bundle_identifier_data) =
            bundle.ok_or(ReceiptError::MissingField(ReceiptField::BundleIdentifier.name()))?;
        let receipt_hash =
            receipt_hash.ok_or(ReceiptError::MissingField(ReceiptField::ReceiptHash.name()))?;

        Ok(Self {
            bundle_identifier,
            bundle_identifier_data,
            opaque_value,
            receipt_hash,
            original_application_version,
            creation_date,
            expiration_date,
            purchases,
            expiration_policy: config.expiration_policy,
        })
    }

    pub fn bundle_identifier(&self) -> &str {
        &self.bundle_identifier
    }

    /// Raw bytes of the bundle identifier attribute value. Input to the receipt hash.
    pub fn bundle_identifier_data(&self) -> &[u8] {
        &self.bundle_identifier_data
    }

    /// Empty when the receipt carries no opaque value.
    pub fn opaque_value(&self) -> &[u8] {
        &self.opaque_value
    }

    pub fn receipt_hash(&self) -> &ReceiptHash {
        &self.receipt_hash
    }

    pub fn original_application_version(&self) -> Option<&str> {
        self.original_application_version.as_deref()
    }

    pub fn creation_date(&self) -> Option<DateTime<Utc>> {
        self.creation_date
    }

    pub fn expiration_date(&self) -> Option<DateTime<Utc>> {
        self.expiration_date
    }

    pub fn purchases(&self) -> &BTreeMap<ProductId, Vec<PurchaseRecord>> {
        &self.purchases
    }

    /// Purchases of `product` in receipt order; empty if there are none.
    pub fn purchases_for(&self, product: &str) -> &[PurchaseRecord] {
        self.purchases.get(product).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Distinct products, in sorted order.
    pub fn product_identifiers(&self) -> impl Iterator<Item = &ProductId> {
        self.purchases.keys()
    }

    /// Total number of purchases across all products.
    pub fn purchase_count(&self) -> usize {
        self.purchases.values().map(Vec::len).sum()
    }

    /// Latest subscription expiration of `product` under the configured policy.
    pub fn expiration_date_for_product(&self, product: &str) -> Option<DateTime<Utc>> {
        self.expiration_date_for_product_with(product, self.expiration_policy)
    }

    /// Latest subscription expiration of `product` under `policy`.
    ///
    /// `None` if no admitted record has an expiration date.
    pub fn expiration_date_for_product_with(
        &self,
        product: &str,
        policy: ExpirationPolicy,
    ) -> Option<DateTime<Utc>> {
        self.purchases_for(product)
            .iter()
            .filter(|record| policy.admits(record))
            .filter_map(PurchaseRecord::subscription_expiration_date)
            .max()
    }
}
