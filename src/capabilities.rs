//! Capability listing model
//!
//! The location capability listing describes, per zone, the server editions
//! (tiers) available, their storage bounds and the SKUs each server version
//! supports. Only the fields needed to size IOPS and validate storage are
//! modeled; everything else in the document is ignored.

use crate::catalog::SkuCatalog;
use crate::error::Result;
use crate::sku::{IopsInfo, IopsProfile, SkuKey};
use crate::storage::StorageLimits;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityListing {
    #[serde(default)]
    pub value: Vec<ZoneCapability>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneCapability {
    #[serde(default)]
    pub zone: Option<String>,
    #[serde(default)]
    pub supported_flexible_server_editions: Vec<ServerEdition>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerEdition {
    /// Tier name, e.g. "Burstable"
    pub name: String,
    #[serde(default)]
    pub supported_storage_editions: Vec<StorageEdition>,
    #[serde(default)]
    pub supported_server_versions: Vec<ServerVersion>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageEdition {
    pub name: String,
    /// MB
    pub min_storage_size: u64,
    /// MB
    pub max_storage_size: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerVersion {
    pub name: String,
    #[serde(default)]
    pub supported_skus: Vec<SkuCapability>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkuCapability {
    pub name: String,
    #[serde(default)]
    pub v_cores: Option<u32>,
    /// Maximum IOPS the SKU supports
    pub supported_iops: u64,
    #[serde(default)]
    pub free_iops: Option<u64>,
    #[serde(default, rename = "supportedMemoryPerVCoreMB")]
    pub supported_memory_per_vcore_mb: Option<u64>,
}

impl CapabilityListing {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Flatten the listing into a catalog.
    ///
    /// SKUs repeated across zones or server versions keep the largest
    /// `supportedIops`. A SKU without an explicit free allotment gets
    /// `default_free_iops`, capped at its maximum.
    pub fn into_catalog(self, default_free_iops: u64) -> Result<SkuCatalog> {
        let mut iops: BTreeMap<SkuKey, (u64, Option<u64>)> = BTreeMap::new();
        let mut storage: BTreeMap<String, StorageLimits> = BTreeMap::new();

        for zone in self.value {
            for edition in zone.supported_flexible_server_editions {
                if let Some(first) = edition.supported_storage_editions.first() {
                    let limits =
                        StorageLimits::from_mb(first.min_storage_size, first.max_storage_size);
                    merge_storage_limits(&mut storage, &edition.name, limits);
                }

                for version in &edition.supported_server_versions {
                    for sku in &version.supported_skus {
                        let key = SkuKey::new(edition.name.as_str(), sku.name.as_str());
                        let entry = iops.entry(key).or_insert((0, None));
                        entry.0 = entry.0.max(sku.supported_iops);
                        if sku.free_iops.is_some() {
                            entry.1 = entry.1.max(sku.free_iops);
                        }
                    }
                }
            }
        }

        let mut profiles = Vec::with_capacity(iops.len());
        for (key, (max_iops, free_iops)) in iops {
            let free_iops = match free_iops {
                Some(free) if free > max_iops => {
                    warn!("{} lists free IOPS {} above max {}, capping", key, free, max_iops);
                    max_iops
                }
                Some(free) => free,
                None => default_free_iops.min(max_iops),
            };
            let profile = IopsProfile::new(&key, free_iops, max_iops)?;
            profiles.push((key, profile));
        }

        let iops_info: IopsInfo = profiles.into_iter().collect();
        debug!("Built catalog with {} SKUs across {} tiers", iops_info.len(), storage.len());

        Ok(SkuCatalog::new(iops_info, storage))
    }
}

/// Zones narrow each other's bounds. Zones whose ranges do not overlap fall
/// back to the union, and a range holding no whole GB is ignored.
fn merge_storage_limits(
    storage: &mut BTreeMap<String, StorageLimits>,
    tier: &str,
    limits: StorageLimits,
) {
    if limits.is_empty() {
        warn!("{} storage range {:?} holds no whole GB, ignoring", tier, limits);
        return;
    }

    match storage.get_mut(tier) {
        Some(existing) => {
            let narrowed = existing.intersect(&limits);
            if narrowed.is_empty() {
                warn!(
                    "{} storage ranges {:?} and {:?} do not overlap, using their union",
                    tier, existing, limits
                );
                *existing = existing.union(&limits);
            } else {
                *existing = narrowed;
            }
        }
        None => {
            storage.insert(tier.to_string(), limits);
        }
    }
}
