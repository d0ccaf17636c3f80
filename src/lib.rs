pub mod codec;
pub mod error;
pub mod legacy;
pub mod license;
pub mod store;

#[cfg(test)]
pub(crate) mod testkit;

pub use codec::KeyCodec;
pub use error::LicenseError;
pub use legacy::{LegacyKeyCodec, LegacyLicense};
pub use license::{LicenseKey, LicenseTier};
pub use store::LicenseStore;
