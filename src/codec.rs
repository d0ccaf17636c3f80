use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use log::trace;
use rsa::pkcs8::DecodePublicKey;
use rsa::{Pkcs1v15Sign, RsaPublicKey};
use sha2::{Digest, Sha512};

use crate::error::LicenseError;
use crate::license::LicenseKey;

pub const KEY_HEADER: &str = "-----BEGIN SIGNLOCK LICENSE KEY-----";
pub const KEY_FOOTER: &str = "-----END SIGNLOCK LICENSE KEY-----";

/// Separates the base64 payload from the base64 signature inside the
/// marker lines. The CRLF variant is accepted for keys that went through
/// Windows mailers or editors.
pub const KEY_SEPARATOR: &str = "\n+\n";
const KEY_SEPARATOR_CRLF: &str = "\r\n+\r\n";

const LICENSE_PUBLIC_KEY_PEM: &str = "-----BEGIN PUBLIC KEY-----
MIIBIjANBgkqhkiG9w0BAQEFAAOCAQ8AMIIBCgKCAQEApvm8cVJfFZZVkyY+yKie
xXhLupYYPv2XXfIuBKmQ5bG9SDLcWkoOnkFMXi60qCt2XqtsLiX8f0WJkzwZd5eq
LGF5c4LbDtsJ5rmjpNGTENAjqT2u4j8my5QU0wvZxJNTa47NyAVZKByJIsf2oEbv
cjupzRMNWeGSH4Tt/smaoKxi9vSaJOI1H86Bm+tox/DM20RaGuX4NABieP2tmdPn
j84z+oNF007ReEfTG2H+NHVR1edmDiIT1Dk+9L5jkUSgolewSOSJVrYFv/VFU+Dy
18DieJ3b1zUo71siRbs9/+SrI/1lMB01S86KcykMWz4alQsYzTP6K0bFPKt4m0p5
QQIDAQAB
-----END PUBLIC KEY-----
";

/// Decoder for the current license key format: a header/footer wrapped
/// blob of `base64(json payload)`, a `+` separator line, and
/// `base64(RSA-SHA512 signature)` over the raw payload bytes.
pub struct KeyCodec {
    public_key: RsaPublicKey,
}

impl Default for KeyCodec {
    fn default() -> Self {
        Self {
            public_key: RsaPublicKey::from_public_key_pem(LICENSE_PUBLIC_KEY_PEM)
                .expect("embedded public key parses"),
        }
    }
}

impl KeyCodec {
    /// Codec trusting the compiled-in public key.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Codec trusting a caller supplied SPKI PEM public key instead of the
    /// compiled-in one. Used by the key generator and by tests.
    ///
    /// # Errors
    /// Will return `Err` if the PEM is not a valid RSA public key.
    pub fn with_public_key_pem(pem: &str) -> Result<Self, LicenseError> {
        let public_key = RsaPublicKey::from_public_key_pem(pem)
            .map_err(|e| LicenseError::KeyMaterial(e.to_string()))?;

        Ok(Self { public_key })
    }

    /// Decodes and verifies a license key blob.
    ///
    /// # Errors
    /// Will return `Err` for missing markers or separator, empty or
    /// malformed segments, a signature that does not verify, or a payload
    /// that is not a license key.
    pub fn decode(&self, content: &str) -> Result<LicenseKey, LicenseError> {
        let Some(start) = content.find(KEY_HEADER) else {
            trace!("License Header Missing");
            return Err(LicenseError::MissingHeader);
        };
        let start = start + KEY_HEADER.len();

        let Some(end) = content[start..].find(KEY_FOOTER) else {
            trace!("License Footer Missing");
            return Err(LicenseError::MissingFooter);
        };
        let inner = &content[start..start + end];

        // CRLF first, otherwise the LF separator matches inside it
        let (payload_b64, signature_b64) = if let Some(parts) = inner.split_once(KEY_SEPARATOR_CRLF)
        {
            parts
        } else if let Some(parts) = inner.split_once(KEY_SEPARATOR) {
            parts
        } else {
            trace!("License Separator Missing");
            return Err(LicenseError::MissingSeparator);
        };

        let payload_b64 = strip_whitespace(payload_b64);
        if payload_b64.is_empty() {
            return Err(LicenseError::EmptySegment("payload"));
        }

        let signature_b64 = strip_whitespace(signature_b64);
        if signature_b64.is_empty() {
            return Err(LicenseError::EmptySegment("signature"));
        }

        let payload = STANDARD.decode(payload_b64)?;
        let signature = STANDARD.decode(signature_b64)?;

        let digest = Sha512::digest(&payload);
        if self
            .public_key
            .verify(Pkcs1v15Sign::new::<Sha512>(), digest.as_slice(), &signature)
            .is_err()
        {
            trace!("License Signature Verify Failed");
            return Err(LicenseError::SignatureMismatch);
        }

        let key: LicenseKey = serde_json::from_slice(&payload)?;

        trace!("License Decoded: {key:?}");
        Ok(key)
    }
}

fn strip_whitespace(s: &str) -> String {
    s.chars().filter(|c| !c.is_ascii_whitespace()).collect()
}
