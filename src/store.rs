use std::sync::{PoisonError, RwLock};

use log::trace;

use crate::codec::KeyCodec;
use crate::error::LicenseError;
use crate::legacy::LegacyKeyCodec;
use crate::license::LicenseKey;

/// Holds the single active license for the process.
///
/// Starts out with an unlicensed key; a key only replaces it after its
/// signature verifies and its fields validate, so a failed install leaves
/// the previous key in place. The active slot is guarded for concurrent
/// readers and installers.
pub struct LicenseStore {
    codec: KeyCodec,
    legacy: LegacyKeyCodec,
    active: RwLock<LicenseKey>,
}

impl Default for LicenseStore {
    fn default() -> Self {
        Self::with_codecs(KeyCodec::new(), LegacyKeyCodec::new())
    }
}

impl LicenseStore {
    /// Store trusting the compiled-in public keys.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store with caller supplied codecs. Used by the key generator and
    /// by tests that sign with their own keypair.
    #[must_use]
    pub fn with_codecs(codec: KeyCodec, legacy: LegacyKeyCodec) -> Self {
        Self {
            codec,
            legacy,
            active: RwLock::new(LicenseKey::unlicensed()),
        }
    }

    /// Verifies, validates, and installs a current-format license key.
    /// The customer name comparison is case-insensitive.
    ///
    /// # Errors
    /// Will return `Err` if decoding or verification fails, the key is
    /// issued to a different customer, or a field fails validation.
    pub fn set_license_key(
        &self,
        content: &str,
        customer_name: &str,
    ) -> Result<(), LicenseError> {
        let key = self.codec.decode(content)?;

        if key.customer_name.to_lowercase() != customer_name.to_lowercase() {
            trace!("License Customer Name Mismatch");
            return Err(LicenseError::NameMismatch {
                expected: customer_name.to_owned(),
                actual: key.customer_name,
            });
        }

        key.validate()?;

        self.install(key);
        Ok(())
    }

    /// Verifies and installs a legacy-format license key.
    ///
    /// # Errors
    /// Will return `Err` if decoding or verification fails or the key
    /// expired before this build's release date.
    pub fn set_legacy_license_key(&self, content: &str) -> Result<(), LicenseError> {
        let key = self.legacy.decode(content)?;

        self.install(key);
        Ok(())
    }

    /// Copy of the currently active key.
    #[must_use]
    pub fn license_key(&self) -> LicenseKey {
        self.active
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn install(&self, key: LicenseKey) {
        *self.active.write().unwrap_or_else(PoisonError::into_inner) = key;
    }
}
