//! Golden receipt vectors.
//!
//! Hand-assembled DER payloads with the values every decoder must recover.
//! The full receipt carries two renewals of one subscription, a
//! non-consumable, an attribute with type 2, and unknown attribute types
//! at both levels.

/// Bare payload: bundle identifier, opaque value, and a valid hash.
pub const MINIMAL_PAYLOAD_HEX: &str = concat!(
    "3153301902010302010104110c0f636f6d2e6578616d706c652e6170703018020104020101041010",
    "1112131415161718191a1b1c1d1e1f301c0201050201010414499f5c46d3e33fe2848ceb383eec20",
    "311c73d490",
);

/// Stored hash inside [`MINIMAL_PAYLOAD_HEX`].
pub const MINIMAL_HASH_HEX: &str = "499f5c46d3e33fe2848ceb383eec20311c73d490";

/// Bare payload with three purchases.
pub const FULL_PAYLOAD_HEX: &str = concat!(
    "3182025d301102010202010104090c0769676e6f726564301902010302010104110c0f636f6d2e65",
    "78616d706c652e70726f30100201040201010408a1b2c3d4e5f60718301c0201050201010414b833",
    "3da8ffc7bd6a2aa1fec60ca587a43d13db6e301e02010c02010104161614323032342d30322d3031",
    "5431303a30303a30305a3081a402011102010104819b318198300c020206a5020101040302010130",
    "22020206a602010104190c17636f6d2e6578616d706c652e70726f2e6d6f6e74686c793015020206",
    "a7020101040c0c0a31303030303030303031301f020206a802010104161614323032332d30312d30",
    "315430303a30303a30305a301f020206ac02010104161614323032342d30312d30315430303a3030",
    "3a30305a300b020206b0020101040216003081aa0201110201010481a131819e300c020206a50201",
    "0104030201013022020206a602010104190c17636f6d2e6578616d706c652e70726f2e6d6f6e7468",
    "6c793015020206a7020101040c0c0a31303030303030303032301f020206a8020101041616143230",
    "32342d30312d30315430303a30303a30305a301f020206ac02010104161614323032352d30312d30",
    "315430303a30303a30305a30110202270f02010104080c06667574757265307c0201110201010474",
    "3172300c020206a502010104030201013023020206a6020101041a0c18636f6d2e6578616d706c65",
    "2e70726f2e6c69666574696d653015020206a7020101040c0c0a3130303030303030303330260202",
    "06a8020101041d161b323032332d30332d31352030383a33303a3030204574632f474d54300b0202",
    "109202010704020001",
);

/// Stored hash inside [`FULL_PAYLOAD_HEX`].
pub const FULL_HASH_HEX: &str = "b8333da8ffc7bd6a2aa1fec60ca587a43d13db6e";

/// [`FULL_PAYLOAD_HEX`] inside a PKCS#7 `SignedData` envelope.
pub const FULL_PKCS7_HEX: &str = concat!(
    "3082029d06092a864886f70d010702a082028e3082028a020101310b300906052b0e03021a050030",
    "82027406092a864886f70d010701a0820265048202613182025d301102010202010104090c076967",
    "6e6f726564301902010302010104110c0f636f6d2e6578616d706c652e70726f3010020104020101",
    "0408a1b2c3d4e5f60718301c0201050201010414b8333da8ffc7bd6a2aa1fec60ca587a43d13db6e",
    "301e02010c02010104161614323032342d30322d30315431303a30303a30305a3081a40201110201",
    "0104819b318198300c020206a502010104030201013022020206a602010104190c17636f6d2e6578",
    "616d706c652e70726f2e6d6f6e74686c793015020206a7020101040c0c0a31303030303030303031",
    "301f020206a802010104161614323032332d30312d30315430303a30303a30305a301f020206ac02",
    "010104161614323032342d30312d30315430303a30303a30305a300b020206b00201010402160030",
    "81aa0201110201010481a131819e300c020206a502010104030201013022020206a602010104190c",
    "17636f6d2e6578616d706c652e70726f2e6d6f6e74686c793015020206a7020101040c0c0a313030",
    "30303030303032301f020206a802010104161614323032342d30312d30315430303a30303a30305a",
    "301f020206ac02010104161614323032352d30312d30315430303a30303a30305a30110202270f02",
    "010104080c06667574757265307c02011102010104743172300c020206a502010104030201013023",
    "020206a6020101041a0c18636f6d2e6578616d706c652e70726f2e6c69666574696d653015020206",
    "a7020101040c0c0a313030303030303030333026020206a8020101041d161b323032332d30332d31",
    "352030383a33303a3030204574632f474d54300b02021092020107040200013100",
);

/// Device identifier both hashes were computed with.
pub const DEVICE_IDENTIFIER_HEX: &str = "e621e1f8c36c495a93fc0c247a3e6e5f";

/// A golden vector and the values it must decode to.
#[derive(Debug, Clone)]
pub struct GoldenVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    /// DER bytes (hex).
    pub hex: &'static str,
    /// Expected bundle identifier.
    pub bundle_identifier: &'static str,
    /// Expected stored hash (hex).
    pub hash_hex: &'static str,
    /// Expected number of decoded purchases across all products.
    pub purchase_count: usize,
    /// Expected number of distinct products.
    pub product_count: usize,
}

impl GoldenVector {
    pub fn bytes(&self) -> Vec<u8> {
        hex::decode(self.hex).unwrap_or_default()
    }
}

/// Get all golden vectors.
pub fn all_vectors() -> Vec<GoldenVector> {
    vec![
        GoldenVector {
            name: "minimal bare payload",
            hex: MINIMAL_PAYLOAD_HEX,
            bundle_identifier: "com.example.app",
            hash_hex: MINIMAL_HASH_HEX,
            purchase_count: 0,
            product_count: 0,
        },
        GoldenVector {
            name: "full bare payload",
            hex: FULL_PAYLOAD_HEX,
            bundle_identifier: "com.example.pro",
            hash_hex: FULL_HASH_HEX,
            purchase_count: 3,
            product_count: 2,
        },
        GoldenVector {
            name: "full payload in PKCS#7 envelope",
            hex: FULL_PKCS7_HEX,
            bundle_identifier: "com.example.pro",
            hash_hex: FULL_HASH_HEX,
            purchase_count: 3,
            product_count: 2,
        },
    ]
}

/// The device identifier the golden hashes were computed with.
pub fn device_identifier() -> Vec<u8> {
    hex::decode(DEVICE_IDENTIFIER_HEX).unwrap_or_default()
}
