use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::LicenseError;

/// Earliest creation instant any key may carry (2010-01-01T00:00:00Z).
/// Keys created exactly at the epoch are accepted.
pub const SANITY_EPOCH_SECS: i64 = 1_262_304_000;

/// Release date of this build (2026-06-15T00:00:00Z). Non-trial keys are
/// checked against this instant instead of the wall clock, so a key that
/// was valid when the release shipped stays valid on skewed clocks.
pub const RELEASE_DATE_SECS: i64 = 1_781_481_600;

const MIN_ID_LEN: usize = 10;

#[derive(Serialize, Deserialize, Default, Debug, Eq, PartialEq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum LicenseTier {
    #[default]
    Unlicensed,
    Community,
    Individual,
    Business,
}

#[allow(clippy::struct_excessive_bools)]
#[derive(Serialize, Deserialize, Debug, Eq, PartialEq, Clone)]
pub struct LicenseKey {
    pub license_id: String,

    pub customer_id: String,
    pub customer_name: String,

    pub tier: LicenseTier,

    #[serde(with = "chrono::serde::ts_seconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub expires_at: DateTime<Utc>,

    pub creator_name: String,
    pub creator_email: String,

    // product flags
    pub office: bool,
    pub pdf: bool,

    pub trial: bool,
}

impl LicenseKey {
    /// Default key installed at startup before any real key is set.
    #[must_use]
    pub fn unlicensed() -> Self {
        let now = Utc::now();

        Self {
            license_id: String::new(),
            customer_id: String::new(),
            customer_name: "Unlicensed".to_owned(),
            tier: LicenseTier::Unlicensed,
            created_at: now,
            expires_at: now,
            creator_name: String::new(),
            creator_email: String::new(),
            office: false,
            pdf: false,
            trial: false,
        }
    }

    /// Trial keys expire against the wall clock, everything else against
    /// the fixed release date.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        let reference = if self.trial {
            Utc::now().timestamp()
        } else {
            RELEASE_DATE_SECS
        };

        reference > self.expires_at.timestamp()
    }

    /// Checks the key fields in order and stops at the first failure.
    ///
    /// # Errors
    /// Will return `Err` naming the first field that fails its check.
    pub fn validate(&self) -> Result<(), LicenseError> {
        if self.license_id.len() < MIN_ID_LEN {
            return Err(LicenseError::FieldInvalid("license id too short"));
        }

        if self.customer_id.len() < MIN_ID_LEN {
            return Err(LicenseError::FieldInvalid("customer id too short"));
        }

        if self.customer_name.is_empty() {
            return Err(LicenseError::FieldInvalid("customer name is empty"));
        }

        if self.created_at.timestamp() < SANITY_EPOCH_SECS {
            return Err(LicenseError::FieldInvalid("created before sanity epoch"));
        }

        if self.created_at > self.expires_at {
            return Err(LicenseError::FieldInvalid("created after expiry"));
        }

        if self.is_expired() {
            return Err(LicenseError::Expired);
        }

        if self.creator_name.is_empty() {
            return Err(LicenseError::FieldInvalid("creator name is empty"));
        }

        if self.creator_email.is_empty() {
            return Err(LicenseError::FieldInvalid("creator email is empty"));
        }

        if !self.office {
            return Err(LicenseError::FieldInvalid("key does not cover this product"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn valid_key() -> LicenseKey {
        LicenseKey {
            license_id: "lic-0000000001".to_owned(),
            customer_id: "cust-00000001".to_owned(),
            customer_name: "Acme Corp".to_owned(),
            tier: LicenseTier::Business,
            created_at: Utc.timestamp_opt(SANITY_EPOCH_SECS + 1, 0).unwrap(),
            expires_at: Utc.timestamp_opt(RELEASE_DATE_SECS + 86_400, 0).unwrap(),
            creator_name: "Signlock Support".to_owned(),
            creator_email: "support@signlock.dev".to_owned(),
            office: true,
            pdf: false,
            trial: false,
        }
    }

    #[test]
    fn valid_key_passes() {
        assert!(valid_key().validate().is_ok());
    }

    #[test]
    fn created_at_exactly_on_epoch_is_accepted() {
        let mut key = valid_key();
        key.created_at = Utc.timestamp_opt(SANITY_EPOCH_SECS, 0).unwrap();
        assert!(key.validate().is_ok());
    }

    #[test]
    fn created_before_epoch_is_rejected() {
        let mut key = valid_key();
        key.created_at = Utc.timestamp_opt(SANITY_EPOCH_SECS - 1, 0).unwrap();
        assert!(matches!(
            key.validate(),
            Err(LicenseError::FieldInvalid("created before sanity epoch"))
        ));
    }

    #[test]
    fn created_after_expiry_is_rejected() {
        let mut key = valid_key();
        key.expires_at = key.created_at - chrono::Duration::seconds(1);
        assert!(matches!(key.validate(), Err(LicenseError::FieldInvalid(_))));
    }

    #[test]
    fn trial_expiry_uses_wall_clock() {
        let mut key = valid_key();
        key.trial = true;
        key.expires_at = Utc::now() - chrono::Duration::seconds(1);
        assert!(matches!(key.validate(), Err(LicenseError::Expired)));
    }

    #[test]
    fn non_trial_expiry_uses_release_date() {
        let mut key = valid_key();
        // one day past the release date, far in the past relative to any
        // realistic wall clock running this test
        key.expires_at = Utc.timestamp_opt(RELEASE_DATE_SECS + 86_400, 0).unwrap();
        assert!(key.validate().is_ok());

        key.expires_at = Utc.timestamp_opt(RELEASE_DATE_SECS - 1, 0).unwrap();
        assert!(matches!(key.validate(), Err(LicenseError::Expired)));
    }

    #[test]
    fn short_ids_are_rejected() {
        let mut key = valid_key();
        key.license_id = "short".to_owned();
        assert!(matches!(
            key.validate(),
            Err(LicenseError::FieldInvalid("license id too short"))
        ));

        let mut key = valid_key();
        key.customer_id = "short".to_owned();
        assert!(matches!(
            key.validate(),
            Err(LicenseError::FieldInvalid("customer id too short"))
        ));
    }

    #[test]
    fn key_must_cover_this_product() {
        let mut key = valid_key();
        key.office = false;
        key.pdf = true;
        assert!(matches!(key.validate(), Err(LicenseError::FieldInvalid(_))));
    }

    #[test]
    fn wire_form_uses_unix_seconds() {
        let key = valid_key();
        let json = serde_json::to_value(&key).unwrap();
        assert_eq!(json["created_at"], SANITY_EPOCH_SECS + 1);
        assert_eq!(json["tier"], "business");

        let back: LicenseKey = serde_json::from_value(json).unwrap();
        assert_eq!(back, key);
    }
}
