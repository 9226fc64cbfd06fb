//! # IAP Receipt
//!
//! Decoding and integrity checking of app-store purchase receipts.
//!
//! ## Overview
//!
//! A receipt is a DER attribute set, usually wrapped in a PKCS#7
//! `SignedData` envelope. This crate:
//!
//! - **Locates** the attribute set inside the envelope (structure only, no
//!   signature checks)
//! - **Decodes** the receipt's identity fields and its in-app purchases
//! - **Verifies** the receipt hash against the current device identifier
//! - **Answers** per-product queries such as the latest subscription expiration
//!
//! ## Usage
//!
//! ```rust,no_run
//! use iap_receipt::{AppReceipt, DeviceIdentifier, ReceiptConfig};
//!
//! fn check() -> iap_receipt::Result<()> {
//!     let receipt = AppReceipt::from_path("receipt", &ReceiptConfig::default())?;
//!     let device = DeviceIdentifier::parse_uuid("E621E1F8-C36C-495A-93FC-0C247A3E6E5F")?;
//!
//!     if receipt.verify_receipt_hash(&device) {
//!         let expires = receipt.expiration_date_for_product("com.example.app.monthly");
//!         println!("subscription active until {:?}", expires);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `iap_receipt::der` - The underlying DER decoder (sources, events, coercion)

pub mod attribute;
pub mod config;
pub mod container;
pub mod crypto;
pub mod error;
pub mod purchase;
pub mod receipt;
pub mod types;
pub mod verify;

pub use iap_receipt_der as der;

pub use attribute::{AttributeReader, PurchaseField, ReceiptAttribute, ReceiptField};
pub use config::{ExpirationPolicy, ReceiptConfig, DEFAULT_MAX_RECEIPT_SIZE};
pub use container::locate_payload;
pub use crypto::{DeviceIdentifier, ReceiptHash, DIGEST_LEN};
pub use error::{ReceiptError, Result};
pub use purchase::PurchaseRecord;
pub use receipt::AppReceipt;
pub use types::ProductId;
pub use verify::DeviceIdentifierProvider;
