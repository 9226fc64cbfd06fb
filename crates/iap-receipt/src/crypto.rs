//! Receipt hash and device identifier.
//!
//! The stored receipt hash is SHA-1 over
//! `device_identifier || opaque_value || bundle_identifier_data`.

use bytes::Bytes;
use serde::{Serialize, Serializer};
use sha1::{Digest, Sha1};
use std::fmt;
use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::error::{ReceiptError, Result};

/// Length of a SHA-1 digest.
pub const DIGEST_LEN: usize = 20;

/// A 20-byte SHA-1 receipt hash.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReceiptHash([u8; DIGEST_LEN]);

impl ReceiptHash {
    /// Hash the three digest inputs in order.
    pub fn compute(
        device_identifier: &[u8],
        opaque_value: &[u8],
        bundle_identifier_data: &[u8],
    ) -> Self {
        let mut hasher = Sha1::new();
        hasher.update(device_identifier);
        hasher.update(opaque_value);
        hasher.update(bundle_identifier_data);
        Self(hasher.finalize().into())
    }

    pub const fn from_bytes(bytes: [u8; DIGEST_LEN]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Constant-time comparison.
    pub fn ct_eq(&self, other: &Self) -> bool {
        self.0[..].ct_eq(&other.0[..]).into()
    }
}

impl fmt::Debug for ReceiptHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sha1({})", &self.to_hex()[..16])
    }
}

impl AsRef<[u8]> for ReceiptHash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; DIGEST_LEN]> for ReceiptHash {
    fn from(bytes: [u8; DIGEST_LEN]) -> Self {
        Self(bytes)
    }
}

impl TryFrom<&[u8]> for ReceiptHash {
    type Error = ReceiptError;

    fn try_from(bytes: &[u8]) -> Result<Self> {
        let digest: [u8; DIGEST_LEN] = bytes
            .try_into()
            .map_err(|_| ReceiptError::InvalidHashLength(bytes.len()))?;
        Ok(Self(digest))
    }
}

impl Serialize for ReceiptHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

/// The identifier of the device a receipt was issued to.
///
/// Usually a 16-byte GUID, but any byte string is accepted since the hash
/// simply consumes whatever the platform reports.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct DeviceIdentifier(Bytes);

impl DeviceIdentifier {
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        Self(bytes.into())
    }

    /// The UUID's 16 raw bytes, in network order.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(Bytes::copy_from_slice(uuid.as_bytes()))
    }

    /// Parse a textual UUID such as `E621E1F8-C36C-495A-93FC-0C247A3E6E5F`.
    pub fn parse_uuid(text: &str) -> Result<Self> {
        Ok(Self::from_uuid(Uuid::parse_str(text)?))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for DeviceIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DeviceIdentifier({})", hex::encode(&self.0))
    }
}

impl From<Uuid> for DeviceIdentifier {
    fn from(uuid: Uuid) -> Self {
        Self::from_uuid(uuid)
    }
}

/// Serialize raw bytes as a lowercase hex string.
pub(crate) fn serialize_hex<S: Serializer>(
    bytes: &Bytes,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&hex::encode(bytes))
}
