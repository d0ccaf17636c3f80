use thiserror::Error;

#[derive(Error, Debug)]
pub enum LicenseError {
    #[error("license key header not found")]
    MissingHeader,
    #[error("license key footer not found")]
    MissingFooter,
    #[error("payload/signature separator not found")]
    MissingSeparator,
    #[error("license key {0} segment is empty")]
    EmptySegment(&'static str),
    #[error("license key base64 decode failed: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("license signature hex decode failed: {0}")]
    Hex(#[from] hex::FromHexError),
    #[error("invalid public key material: {0}")]
    KeyMaterial(String),
    #[error("license signature verification failed")]
    SignatureMismatch,
    #[error("license payload decode failed: {0}")]
    Payload(#[from] serde_json::Error),
    #[error("license key decompress failed: {0}")]
    Gzip(#[from] std::io::Error),
    #[error("customer name mismatch: key is issued to `{actual}`, expected `{expected}`")]
    NameMismatch { expected: String, actual: String },
    #[error("invalid license: {0}")]
    FieldInvalid(&'static str),
    #[error("license key has expired")]
    Expired,
}
