use thiserror::Error;

#[derive(Error, Debug)]
pub enum IopsError {
    #[error("SKU {sku_name} in tier {tier} has no known IOPS profile")]
    UnknownSku { tier: String, sku_name: String },

    #[error(
        "Invalid IOPS profile for {tier}/{sku_name}: \
         free IOPS {free_iops} exceeds max IOPS {max_iops}"
    )]
    InvalidProfile {
        tier: String,
        sku_name: String,
        free_iops: u64,
        max_iops: u64,
    },

    #[error("Storage size must be a positive number of GB")]
    InvalidStorageSize,

    #[error("Storage size {size_gb} GB is outside the allowed range {min_gb}-{max_gb} GB")]
    StorageOutOfRange { size_gb: u64, min_gb: u64, max_gb: u64 },

    #[error("Storage size cannot be decreased from {current_gb} GB to {requested_gb} GB")]
    StorageShrink { current_gb: u64, requested_gb: u64 },

    #[error("No capability listing available for location {location}")]
    CapabilitiesUnavailable { location: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl IopsError {
    /// Whether retrying the failed operation may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, IopsError::IoError(_))
    }
}

pub type Result<T> = std::result::Result<T, IopsError>;
