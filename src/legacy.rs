use std::io::Read;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use flate2::read::GzDecoder;
use log::trace;
use rsa::pkcs8::DecodePublicKey;
use rsa::{Pkcs1v15Sign, RsaPublicKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::LicenseError;
use crate::license::{LicenseKey, LicenseTier, RELEASE_DATE_SECS};

const LEGACY_PUBLIC_KEY_DER_HEX: &str = "30820122300d06092a864886f70d01010105000382010f003082010a0282010100de082fcd7dc8407641e5eb73b50c6cc0e1f35a8513eee8c095c149ec33590d13e8cd3b3be9903aa9a050e22ce72002338b190014776a1831513dec396b8e8c2e820db125b56e21eac1dfdf96b4a1639c46dafaa1932eecae4e1fa7f33ebdcfe82c1be1c7bd0d178460f9719281a914f4ea08a4acbfcc36ea600317ed3d351c8b406532696a03bc272a6e7ec135813b7408ad9104839aa2839813e746bfa655814e04edc035b7b403bc3b47125302ce6069a0636229f6aa2be4195a3d0af308c8f3c716bf0d6ad2c221d21a7678b29fa6b510daf70adc984e0c5985f7ca8c6822a945739852b76e4f5bfbe7b18e19b4e21dce9e2f4ff0aa09ad6ef7e673b1ca870203010001";

const LEGACY_CREATOR_NAME: &str = "Signlock Support";
const LEGACY_CREATOR_EMAIL: &str = "support@signlock.dev";

/// Older license record: the signature is detached, hex encoded, and
/// taken over the JSON serialization of the record with `Signature`
/// cleared.
#[derive(Serialize, Deserialize, Debug, Eq, PartialEq, Clone)]
#[serde(rename_all = "PascalCase")]
pub struct LegacyLicense {
    pub name: String,
    pub signature: String,
    pub expiration: i64,
    pub license_type: u8,
}

impl LegacyLicense {
    /// Accepted legacy records become full business-tier keys.
    fn into_license_key(self) -> LicenseKey {
        LicenseKey {
            license_id: "legacy-license".to_owned(),
            customer_id: "legacy-customer".to_owned(),
            customer_name: self.name,
            tier: LicenseTier::Business,
            created_at: Utc::now(),
            expires_at: DateTime::from_timestamp(self.expiration, 0)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
            creator_name: LEGACY_CREATOR_NAME.to_owned(),
            creator_email: LEGACY_CREATOR_EMAIL.to_owned(),
            office: true,
            pdf: true,
            trial: false,
        }
    }
}

/// Decoder for the legacy format: URL-safe unpadded base64 wrapping a
/// gzip stream of the JSON record.
pub struct LegacyKeyCodec {
    public_key: RsaPublicKey,
}

impl Default for LegacyKeyCodec {
    fn default() -> Self {
        let der = hex::decode(LEGACY_PUBLIC_KEY_DER_HEX).expect("embedded legacy key hex decodes");

        Self {
            public_key: RsaPublicKey::from_public_key_der(&der)
                .expect("embedded legacy public key parses"),
        }
    }
}

impl LegacyKeyCodec {
    /// Codec trusting the compiled-in legacy public key.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Codec trusting a caller supplied hex-encoded DER public key.
    ///
    /// # Errors
    /// Will return `Err` if the hex or the DER inside it is invalid.
    pub fn with_public_key_der_hex(der_hex: &str) -> Result<Self, LicenseError> {
        let der = hex::decode(der_hex)?;
        let public_key = RsaPublicKey::from_public_key_der(&der)
            .map_err(|e| LicenseError::KeyMaterial(e.to_string()))?;

        Ok(Self { public_key })
    }

    /// Decodes and verifies a legacy license blob, returning the
    /// converted key.
    ///
    /// # Errors
    /// Will return `Err` for malformed base64/gzip/JSON, a detached
    /// signature that does not verify, or an expiration before this
    /// build's release date.
    pub fn decode(&self, content: &str) -> Result<LicenseKey, LicenseError> {
        let stripped: String = content.chars().filter(|c| !c.is_whitespace()).collect();
        let compressed = URL_SAFE_NO_PAD.decode(stripped)?;

        let mut json = Vec::new();
        GzDecoder::new(compressed.as_slice()).read_to_end(&mut json)?;

        let license: LegacyLicense = serde_json::from_slice(&json)?;

        // the signature covers the record with its own signature cleared
        let mut unsigned = license.clone();
        unsigned.signature = String::new();
        let signed_bytes = serde_json::to_vec(&unsigned)?;

        let signature = hex::decode(&license.signature)?;
        let digest = Sha256::digest(&signed_bytes);
        if self
            .public_key
            .verify(Pkcs1v15Sign::new::<Sha256>(), digest.as_slice(), &signature)
            .is_err()
        {
            trace!("Legacy Signature Verify Failed");
            return Err(LicenseError::SignatureMismatch);
        }

        if license.expiration < RELEASE_DATE_SECS {
            trace!("Legacy License Expired");
            return Err(LicenseError::Expired);
        }

        trace!("Legacy License Decoded: {license:?}");
        Ok(license.into_license_key())
    }
}
