//! Receipt hash verification.

use tracing::warn;

use crate::crypto::{DeviceIdentifier, ReceiptHash};
use crate::receipt::AppReceipt;

/// Supplies the identifier of the device the app is running on.
///
/// How that identifier is obtained is platform-specific and lives outside
/// this crate.
pub trait DeviceIdentifierProvider {
    /// `None` when the platform cannot report one.
    fn device_identifier(&self) -> Option<DeviceIdentifier>;
}

impl DeviceIdentifierProvider for DeviceIdentifier {
    fn device_identifier(&self) -> Option<DeviceIdentifier> {
        Some(self.clone())
    }
}

impl AppReceipt {
    /// The hash this receipt should carry if it was issued to `device`.
    pub fn expected_hash(&self, device: &DeviceIdentifier) -> ReceiptHash {
        ReceiptHash::compute(
            device.as_bytes(),
            self.opaque_value(),
            self.bundle_identifier_data(),
        )
    }

    /// True iff the stored hash matches the one recomputed for `device`.
    ///
    /// The comparison runs in constant time.
    pub fn verify_receipt_hash(&self, device: &DeviceIdentifier) -> bool {
        let matches = self.expected_hash(device).ct_eq(self.receipt_hash());
        if !matches {
            warn!(
                bundle_identifier = %self.bundle_identifier(),
                "receipt hash mismatch"
            );
        }
        matches
    }

    /// [`verify_receipt_hash`](Self::verify_receipt_hash) with an identifier
    /// taken from `provider`. Fails closed when none is available.
    pub fn verify_with<P: DeviceIdentifierProvider + ?Sized>(&self, provider: &P) -> bool {
        match provider.device_identifier() {
            Some(device) => self.verify_receipt_hash(&device),
            None => {
                warn!("no device identifier available; treating receipt as unverified");
                false
            }
        }
    }
}
