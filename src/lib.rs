//! Flexible Server IOPS - storage IOPS sizing for flexible database servers
//!
//! Given a server's storage size, its SKU and an optional requested IOPS,
//! works out the IOPS to provision from the location's capability listing.
//!
//! Layout:
//! 1. Resolver: the pure sizing policy over an injected capability table
//! 2. Sku / Storage: typed capability table and storage bounds
//! 3. Capabilities: serde model of the location capability listing
//! 4. Catalog: capability sources with per-location caching and retries

pub mod capabilities;
pub mod catalog;
pub mod config;
pub mod error;
pub mod resolver;
pub mod retry;
pub mod sku;
pub mod storage;

pub use capabilities::CapabilityListing;
pub use catalog::{CapabilitySource, CatalogCache, FileCapabilitySource, SkuCatalog};
pub use config::Config;
pub use error::{IopsError, Result};
pub use resolver::resolve_iops;
pub use retry::{retry_if, RetryPolicy};
pub use sku::{IopsInfo, IopsProfile, SkuKey};
pub use storage::{validate_storage_update, StorageLimits, StorageSizeGb};
