//! Shared fixtures for unit tests: a lazily generated signing keypair and
//! helpers that produce blobs the codecs accept.

use std::io::Write;
use std::sync::OnceLock;

use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use flate2::Compression;
use flate2::write::GzEncoder;
use rsa::pkcs8::{EncodePublicKey, LineEnding};
use rsa::{Pkcs1v15Sign, RsaPrivateKey};
use sha2::{Digest, Sha256, Sha512};

use crate::codec::{KEY_FOOTER, KEY_HEADER};
use crate::legacy::LegacyLicense;
use crate::license::LicenseKey;

pub(crate) fn private_key() -> &'static RsaPrivateKey {
    static KEY: OnceLock<RsaPrivateKey> = OnceLock::new();
    KEY.get_or_init(|| RsaPrivateKey::new(&mut rand::thread_rng(), 2048).expect("test keygen"))
}

pub(crate) fn public_key_pem() -> String {
    private_key()
        .to_public_key()
        .to_public_key_pem(LineEnding::LF)
        .expect("pem encode")
}

pub(crate) fn public_key_der_hex() -> String {
    hex::encode(
        private_key()
            .to_public_key()
            .to_public_key_der()
            .expect("der encode")
            .as_bytes(),
    )
}

/// Current-format blob: marker lines around `base64(json)`, `+`,
/// `base64(rsa-sha512 signature)`.
pub(crate) fn sign_blob(key: &LicenseKey) -> String {
    let payload = serde_json::to_vec(key).expect("license serializes");
    let digest = Sha512::digest(&payload);
    let signature = private_key()
        .sign(Pkcs1v15Sign::new::<Sha512>(), digest.as_slice())
        .expect("sign");

    format!(
        "{KEY_HEADER}\n{}\n+\n{}\n{KEY_FOOTER}\n",
        STANDARD.encode(&payload),
        STANDARD.encode(&signature)
    )
}

/// Detached hex signature over the record with `Signature` cleared.
pub(crate) fn legacy_signature(license: &LegacyLicense) -> String {
    let mut unsigned = license.clone();
    unsigned.signature = String::new();
    let bytes = serde_json::to_vec(&unsigned).expect("legacy serializes");
    let digest = Sha256::digest(&bytes);

    hex::encode(
        private_key()
            .sign(Pkcs1v15Sign::new::<Sha256>(), digest.as_slice())
            .expect("sign"),
    )
}

/// gzip + URL-safe unpadded base64 wrapping, without re-signing.
pub(crate) fn legacy_wrap(license: &LegacyLicense) -> String {
    let json = serde_json::to_vec(license).expect("legacy serializes");

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&json).expect("gzip write");
    let compressed = encoder.finish().expect("gzip finish");

    URL_SAFE_NO_PAD.encode(compressed)
}

/// Fully signed and wrapped legacy blob.
pub(crate) fn legacy_blob(license: &LegacyLicense) -> String {
    let mut signed = license.clone();
    signed.signature = legacy_signature(license);
    legacy_wrap(&signed)
}
