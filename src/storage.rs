//! Storage sizes and per-tier storage limits

use crate::error::{IopsError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Provisioned storage in GB. Always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct StorageSizeGb(u64);

impl StorageSizeGb {
    pub fn new(gb: u64) -> Result<Self> {
        if gb == 0 {
            return Err(IopsError::InvalidStorageSize);
        }
        Ok(Self(gb))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl TryFrom<u64> for StorageSizeGb {
    type Error = IopsError;

    fn try_from(gb: u64) -> Result<Self> {
        Self::new(gb)
    }
}

impl fmt::Display for StorageSizeGb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} GB", self.0)
    }
}

/// Inclusive storage bounds of a tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageLimits {
    pub min_gb: u64,
    pub max_gb: u64,
}

impl StorageLimits {
    /// Capability listings report storage in MB. Only whole GB inside the
    /// MB range are allowed, so the minimum rounds up and the maximum down.
    pub fn from_mb(min_mb: u64, max_mb: u64) -> Self {
        Self {
            min_gb: min_mb.div_ceil(1024),
            max_gb: max_mb / 1024,
        }
    }

    /// True when no storage size satisfies the bounds.
    pub fn is_empty(&self) -> bool {
        self.min_gb > self.max_gb
    }

    pub fn contains(&self, size: StorageSizeGb) -> bool {
        (self.min_gb..=self.max_gb).contains(&size.get())
    }

    pub fn validate(&self, size: StorageSizeGb) -> Result<()> {
        if !self.contains(size) {
            return Err(IopsError::StorageOutOfRange {
                size_gb: size.get(),
                min_gb: self.min_gb,
                max_gb: self.max_gb,
            });
        }
        Ok(())
    }

    /// Narrow to the bounds both limits allow.
    pub fn intersect(&self, other: &StorageLimits) -> StorageLimits {
        StorageLimits {
            min_gb: self.min_gb.max(other.min_gb),
            max_gb: self.max_gb.min(other.max_gb),
        }
    }

    /// Widen to the bounds either limit allows.
    pub fn union(&self, other: &StorageLimits) -> StorageLimits {
        StorageLimits {
            min_gb: self.min_gb.min(other.min_gb),
            max_gb: self.max_gb.max(other.max_gb),
        }
    }
}

/// Storage can only grow on an existing server.
pub fn validate_storage_update(current: StorageSizeGb, requested: StorageSizeGb) -> Result<()> {
    if requested < current {
        return Err(IopsError::StorageShrink {
            current_gb: current.get(),
            requested_gb: requested.get(),
        });
    }
    Ok(())
}
