//! Receipt fixtures.
//!
//! Builders that produce DER receipt payloads (and PKCS#7-wrapped receipts)
//! with a correct hash for a chosen device identifier. The attribute codes
//! are restated here so fixtures stay an independent encoding of the format.

use sha1::{Digest, Sha1};

use crate::writer::{
    attribute, explicit, ia5_string, integer, null, octet_string, oid, sequence, set, utf8_string,
};

/// Receipt-level attribute codes.
pub mod receipt_codes {
    pub const BUNDLE_IDENTIFIER: i64 = 3;
    pub const OPAQUE_VALUE: i64 = 4;
    pub const RECEIPT_HASH: i64 = 5;
    pub const CREATION_DATE: i64 = 12;
    pub const IN_APP_PURCHASE: i64 = 17;
    pub const ORIGINAL_APPLICATION_VERSION: i64 = 19;
    pub const EXPIRATION_DATE: i64 = 21;
}

/// Purchase-level attribute codes.
pub mod purchase_codes {
    pub const QUANTITY: i64 = 1701;
    pub const PRODUCT_IDENTIFIER: i64 = 1702;
    pub const TRANSACTION_IDENTIFIER: i64 = 1703;
    pub const PURCHASE_DATE: i64 = 1704;
    pub const ORIGINAL_TRANSACTION_IDENTIFIER: i64 = 1705;
    pub const ORIGINAL_PURCHASE_DATE: i64 = 1706;
    pub const SUBSCRIPTION_EXPIRATION_DATE: i64 = 1708;
    pub const WEB_ORDER_LINE_ITEM_ID: i64 = 1711;
    pub const CANCELLATION_DATE: i64 = 1712;
    pub const IS_TRIAL_PERIOD: i64 = 1713;
    pub const IS_IN_INTRO_OFFER_PERIOD: i64 = 1719;
}

/// `1.2.840.113549.1.7.2`
pub const SIGNED_DATA_OID: &[u8] = &[0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x07, 0x02];
/// `1.2.840.113549.1.7.1`
pub const DATA_OID: &[u8] = &[0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x07, 0x01];
/// `1.3.14.3.2.26`
pub const SHA1_OID: &[u8] = &[0x2b, 0x0e, 0x03, 0x02, 0x1a];

/// A fixed device identifier (UUID `E621E1F8-C36C-495A-93FC-0C247A3E6E5F`).
pub const DEVICE_IDENTIFIER: [u8; 16] = [
    0xe6, 0x21, 0xe1, 0xf8, 0xc3, 0x6c, 0x49, 0x5a, 0x93, 0xfc, 0x0c, 0x24, 0x7a, 0x3e, 0x6e, 0x5f,
];

/// One in-app purchase entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseFixture {
    pub product_identifier: Option<String>,
    pub transaction_id: Option<String>,
    pub original_transaction_id: Option<String>,
    pub purchase_date: Option<String>,
    pub subscription_expiration_date: Option<String>,
    pub cancellation_date: Option<String>,
    pub quantity: Option<i64>,
    pub is_trial_period: Option<bool>,
    /// Raw `(type, value)` attributes appended after the known ones.
    pub extra: Vec<(i64, Vec<u8>)>,
}

impl PurchaseFixture {
    /// A purchase with the three required fields.
    pub fn new(product_identifier: &str, transaction_id: &str, purchase_date: &str) -> Self {
        Self {
            product_identifier: Some(product_identifier.to_string()),
            transaction_id: Some(transaction_id.to_string()),
            original_transaction_id: None,
            purchase_date: Some(purchase_date.to_string()),
            subscription_expiration_date: None,
            cancellation_date: None,
            quantity: Some(1),
            is_trial_period: None,
            extra: Vec::new(),
        }
    }

    pub fn original_transaction_id(mut self, id: &str) -> Self {
        self.original_transaction_id = Some(id.to_string());
        self
    }

    pub fn expires(mut self, date: &str) -> Self {
        self.subscription_expiration_date = Some(date.to_string());
        self
    }

    pub fn cancelled(mut self, date: &str) -> Self {
        self.cancellation_date = Some(date.to_string());
        self
    }

    pub fn trial(mut self, is_trial: bool) -> Self {
        self.is_trial_period = Some(is_trial);
        self
    }

    pub fn without_product_identifier(mut self) -> Self {
        self.product_identifier = None;
        self
    }

    pub fn without_purchase_date(mut self) -> Self {
        self.purchase_date = None;
        self
    }

    /// Append an attribute with an arbitrary type code and raw value.
    pub fn extra_attribute(mut self, type_code: i64, value: Vec<u8>) -> Self {
        self.extra.push((type_code, value));
        self
    }

    /// Encode as the purchase's attribute SET.
    pub fn encode(&self) -> Vec<u8> {
        use purchase_codes::*;

        let mut attributes = Vec::new();
        if let Some(quantity) = self.quantity {
            attributes.push(attribute(QUANTITY, 1, &integer(quantity)));
        }
        if let Some(id) = &self.product_identifier {
            attributes.push(attribute(PRODUCT_IDENTIFIER, 1, &utf8_string(id)));
        }
        if let Some(id) = &self.transaction_id {
            attributes.push(attribute(TRANSACTION_IDENTIFIER, 1, &utf8_string(id)));
        }
        if let Some(date) = &self.purchase_date {
            attributes.push(attribute(PURCHASE_DATE, 1, &ia5_string(date)));
        }
        if let Some(id) = &self.original_transaction_id {
            attributes.push(attribute(ORIGINAL_TRANSACTION_IDENTIFIER, 1, &utf8_string(id)));
        }
        if let Some(date) = &self.subscription_expiration_date {
            attributes.push(attribute(SUBSCRIPTION_EXPIRATION_DATE, 1, &ia5_string(date)));
        }
        if let Some(date) = &self.cancellation_date {
            attributes.push(attribute(CANCELLATION_DATE, 1, &ia5_string(date)));
        }
        if let Some(trial) = self.is_trial_period {
            attributes.push(attribute(IS_TRIAL_PERIOD, 1, &integer(i64::from(trial))));
        }
        for (type_code, value) in &self.extra {
            attributes.push(attribute(*type_code, 1, value));
        }
        set(&attributes)
    }
}

/// A whole receipt payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptFixture {
    pub bundle_identifier: Option<String>,
    pub opaque_value: Vec<u8>,
    pub device_identifier: Vec<u8>,
    pub include_hash: bool,
    /// Stored hash bytes; `None` means "the correct hash".
    pub hash_override: Option<Vec<u8>>,
    pub creation_date: Option<String>,
    pub purchases: Vec<PurchaseFixture>,
    pub extra: Vec<(i64, Vec<u8>)>,
}

impl ReceiptFixture {
    pub fn new(bundle_identifier: &str) -> Self {
        Self {
            bundle_identifier: Some(bundle_identifier.to_string()),
            opaque_value: vec![0x10, 0x11, 0x12, 0x13, 0x14, 0x15, 0x16, 0x17],
            device_identifier: DEVICE_IDENTIFIER.to_vec(),
            include_hash: true,
            hash_override: None,
            creation_date: None,
            purchases: Vec::new(),
            extra: Vec::new(),
        }
    }

    pub fn opaque_value(mut self, value: &[u8]) -> Self {
        self.opaque_value = value.to_vec();
        self
    }

    pub fn device_identifier(mut self, id: &[u8]) -> Self {
        self.device_identifier = id.to_vec();
        self
    }

    pub fn creation_date(mut self, date: &str) -> Self {
        self.creation_date = Some(date.to_string());
        self
    }

    pub fn purchase(mut self, purchase: PurchaseFixture) -> Self {
        self.purchases.push(purchase);
        self
    }

    pub fn without_hash(mut self) -> Self {
        self.include_hash = false;
        self
    }

    pub fn without_bundle_identifier(mut self) -> Self {
        self.bundle_identifier = None;
        self
    }

    pub fn hash(mut self, stored: &[u8]) -> Self {
        self.hash_override = Some(stored.to_vec());
        self
    }

    pub fn extra_attribute(mut self, type_code: i64, value: Vec<u8>) -> Self {
        self.extra.push((type_code, value));
        self
    }

    /// The DER UTF8String that makes up the bundle identifier value.
    pub fn bundle_identifier_data(&self) -> Vec<u8> {
        self.bundle_identifier
            .as_deref()
            .map(utf8_string)
            .unwrap_or_default()
    }

    /// SHA-1 over device identifier, opaque value, and bundle identifier data.
    pub fn expected_hash(&self) -> [u8; 20] {
        let mut hasher = Sha1::new();
        hasher.update(&self.device_identifier);
        hasher.update(&self.opaque_value);
        hasher.update(self.bundle_identifier_data());
        hasher.finalize().into()
    }

    /// Encode the bare attribute SET.
    pub fn encode_payload(&self) -> Vec<u8> {
        use receipt_codes::*;

        let mut attributes = Vec::new();
        if self.bundle_identifier.is_some() {
            attributes.push(attribute(BUNDLE_IDENTIFIER, 1, &self.bundle_identifier_data()));
        }
        attributes.push(attribute(OPAQUE_VALUE, 1, &self.opaque_value));
        if self.include_hash {
            let stored = self
                .hash_override
                .clone()
                .unwrap_or_else(|| self.expected_hash().to_vec());
            attributes.push(attribute(RECEIPT_HASH, 1, &stored));
        }
        if let Some(date) = &self.creation_date {
            attributes.push(attribute(CREATION_DATE, 1, &ia5_string(date)));
        }
        for purchase in &self.purchases {
            attributes.push(attribute(IN_APP_PURCHASE, 1, &purchase.encode()));
        }
        for (type_code, value) in &self.extra {
            attributes.push(attribute(*type_code, 1, value));
        }
        set(&attributes)
    }

    /// Encode wrapped in a PKCS#7 `SignedData` envelope (no signer infos).
    pub fn encode_pkcs7(&self) -> Vec<u8> {
        wrap_pkcs7(&self.encode_payload())
    }
}

/// Wrap `payload` as `ContentInfo { signedData, [0] SignedData }`.
pub fn wrap_pkcs7(payload: &[u8]) -> Vec<u8> {
    let encap = sequence(&[oid(DATA_OID), explicit(0, &octet_string(payload))]);
    signed_data(encap)
}

/// A `SignedData` envelope whose content is detached.
pub fn detached_pkcs7() -> Vec<u8> {
    signed_data(sequence(&[oid(DATA_OID)]))
}

fn signed_data(encap: Vec<u8>) -> Vec<u8> {
    let digest_algorithms = set(&[sequence(&[oid(SHA1_OID), null()])]);
    let signer_infos = set(&[]);
    let body = sequence(&[integer(1), digest_algorithms, encap, signer_infos]);
    sequence(&[oid(SIGNED_DATA_OID), explicit(0, &body)])
}
