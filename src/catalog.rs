//! SKU catalog: capability sources and per-location caching
//!
//! A catalog is the resolved capability table for one location. Catalogs are
//! loaded through a [`CapabilitySource`] and memoized per location by
//! [`CatalogCache`], so command handlers only pay for the listing once.

use crate::capabilities::CapabilityListing;
use crate::error::{IopsError, Result};
use crate::resolver::resolve_iops;
use crate::retry::{retry_if, RetryPolicy};
use crate::sku::IopsInfo;
use crate::storage::{StorageLimits, StorageSizeGb};
use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// IOPS profiles and storage bounds for one location
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SkuCatalog {
    iops_info: IopsInfo,
    storage_limits: BTreeMap<String, StorageLimits>,
}

impl SkuCatalog {
    pub fn new(iops_info: IopsInfo, storage_limits: BTreeMap<String, StorageLimits>) -> Self {
        Self {
            iops_info,
            storage_limits,
        }
    }

    pub fn iops_info(&self) -> &IopsInfo {
        &self.iops_info
    }

    pub fn storage_limits(&self, tier: &str) -> Option<StorageLimits> {
        self.storage_limits.get(tier).copied()
    }

    /// Resolve IOPS, first checking the storage size against the tier's
    /// bounds when the listing provided them.
    pub fn resolve(
        &self,
        storage_gb: StorageSizeGb,
        iops_input: Option<u64>,
        tier: &str,
        sku_name: &str,
    ) -> Result<u64> {
        if let Some(limits) = self.storage_limits(tier) {
            limits.validate(storage_gb)?;
        }
        resolve_iops(storage_gb, &self.iops_info, iops_input, tier, sku_name)
    }
}

impl From<IopsInfo> for SkuCatalog {
    fn from(iops_info: IopsInfo) -> Self {
        Self::new(iops_info, BTreeMap::new())
    }
}

/// Where capability listings come from
#[async_trait]
pub trait CapabilitySource: Send + Sync {
    async fn fetch(&self, location: &str) -> Result<CapabilityListing>;
}

/// Reads capability listings from disk
#[derive(Debug, Clone)]
pub enum FileCapabilitySource {
    /// One `<location>.json` per location
    Directory(PathBuf),
    /// The same listing for every location
    File(PathBuf),
}

impl FileCapabilitySource {
    /// Pick the variant from what is on disk.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if path.is_dir() {
            FileCapabilitySource::Directory(path.to_path_buf())
        } else {
            FileCapabilitySource::File(path.to_path_buf())
        }
    }

    fn listing_path(&self, location: &str) -> PathBuf {
        match self {
            FileCapabilitySource::Directory(dir) => dir.join(format!("{}.json", location)),
            FileCapabilitySource::File(file) => file.clone(),
        }
    }
}

#[async_trait]
impl CapabilitySource for FileCapabilitySource {
    async fn fetch(&self, location: &str) -> Result<CapabilityListing> {
        let path = self.listing_path(location);
        debug!("Reading capability listing {}", path.display());

        let json = match tokio::fs::read_to_string(&path).await {
            Ok(json) => json,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(IopsError::CapabilitiesUnavailable {
                    location: location.to_string(),
                });
            }
            Err(err) => return Err(err.into()),
        };

        CapabilityListing::from_json(&json)
    }
}

/// Per-location catalog cache over a capability source
pub struct CatalogCache<S> {
    source: S,
    catalogs: DashMap<String, Arc<SkuCatalog>>,
    retry: RetryPolicy,
    default_free_iops: u64,
}

impl<S: CapabilitySource> CatalogCache<S> {
    pub fn new(source: S, retry: RetryPolicy, default_free_iops: u64) -> Self {
        info!(
            "Initializing catalog cache: max_attempts={}, default_free_iops={}",
            retry.max_attempts, default_free_iops
        );
        Self {
            source,
            catalogs: DashMap::new(),
            retry,
            default_free_iops,
        }
    }

    /// Return the cached catalog for `location`, loading it on first use.
    /// Transient source failures are retried per the cache's policy.
    pub async fn get_or_load(&self, location: &str) -> Result<Arc<SkuCatalog>> {
        if let Some(catalog) = self.catalogs.get(location) {
            debug!("Catalog cache hit for {}", location);
            return Ok(Arc::clone(catalog.value()));
        }

        debug!("Catalog cache miss for {}", location);
        let source = &self.source;
        let listing =
            retry_if(&self.retry, IopsError::is_transient, || source.fetch(location)).await?;
        let catalog = Arc::new(listing.into_catalog(self.default_free_iops)?);

        info!("Loaded catalog for {}: {} SKUs", location, catalog.iops_info().len());

        let cached = self
            .catalogs
            .entry(location.to_string())
            .or_insert(catalog)
            .value()
            .clone();
        Ok(cached)
    }

    /// Drop the cached catalog so the next lookup reloads it.
    pub fn invalidate(&self, location: &str) -> bool {
        self.catalogs.remove(location).is_some()
    }

    pub fn cached_locations(&self) -> usize {
        self.catalogs.len()
    }
}
