//! SKU capability table
//!
//! Maps a (tier, SKU name) pair to the IOPS the SKU includes for free and
//! the most it can be provisioned with. Tables are built once and then only
//! read, so they can be shared freely between threads.

use crate::error::{IopsError, Result};
use serde::ser::{Serialize, SerializeStruct, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Composite lookup key. Both parts are compared verbatim (case-sensitive).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SkuKey {
    pub tier: String,
    pub sku_name: String,
}

impl SkuKey {
    pub fn new(tier: impl Into<String>, sku_name: impl Into<String>) -> Self {
        Self {
            tier: tier.into(),
            sku_name: sku_name.into(),
        }
    }
}

impl fmt::Display for SkuKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.tier, self.sku_name)
    }
}

/// IOPS capability of a single SKU
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IopsProfile {
    free_iops: u64,
    max_iops: u64,
}

impl IopsProfile {
    /// Free allotment above the ceiling would make the table inconsistent,
    /// so it is rejected here rather than at resolve time.
    pub fn new(key: &SkuKey, free_iops: u64, max_iops: u64) -> Result<Self> {
        if free_iops > max_iops {
            return Err(IopsError::InvalidProfile {
                tier: key.tier.clone(),
                sku_name: key.sku_name.clone(),
                free_iops,
                max_iops,
            });
        }
        Ok(Self { free_iops, max_iops })
    }

    pub fn free_iops(&self) -> u64 {
        self.free_iops
    }

    pub fn max_iops(&self) -> u64 {
        self.max_iops
    }
}

/// Immutable IOPS capability table keyed by [`SkuKey`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IopsInfo {
    profiles: BTreeMap<SkuKey, IopsProfile>,
}

impl IopsInfo {
    pub fn builder() -> IopsInfoBuilder {
        IopsInfoBuilder::default()
    }

    pub fn get(&self, key: &SkuKey) -> Option<&IopsProfile> {
        self.profiles.get(key)
    }

    /// Look up a profile, failing with `UnknownSku` when the pair is absent.
    pub fn profile(&self, tier: &str, sku_name: &str) -> Result<IopsProfile> {
        self.profiles
            .get(&SkuKey::new(tier, sku_name))
            .copied()
            .ok_or_else(|| IopsError::UnknownSku {
                tier: tier.to_string(),
                sku_name: sku_name.to_string(),
            })
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SkuKey, &IopsProfile)> {
        self.profiles.iter()
    }
}

impl FromIterator<(SkuKey, IopsProfile)> for IopsInfo {
    fn from_iter<I: IntoIterator<Item = (SkuKey, IopsProfile)>>(iter: I) -> Self {
        Self {
            profiles: iter.into_iter().collect(),
        }
    }
}

/// Builder that validates each profile as it is added
#[derive(Debug, Default)]
pub struct IopsInfoBuilder {
    profiles: BTreeMap<SkuKey, IopsProfile>,
}

impl IopsInfoBuilder {
    pub fn sku(
        mut self,
        tier: impl Into<String>,
        sku_name: impl Into<String>,
        free_iops: u64,
        max_iops: u64,
    ) -> Result<Self> {
        let key = SkuKey::new(tier, sku_name);
        let profile = IopsProfile::new(&key, free_iops, max_iops)?;
        self.profiles.insert(key, profile);
        Ok(self)
    }

    pub fn build(self) -> IopsInfo {
        IopsInfo {
            profiles: self.profiles,
        }
    }
}

struct Entry<'a>(&'a SkuKey, &'a IopsProfile);

impl Serialize for Entry<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("IopsEntry", 4)?;
        s.serialize_field("tier", &self.0.tier)?;
        s.serialize_field("skuName", &self.0.sku_name)?;
        s.serialize_field("freeIops", &self.1.free_iops)?;
        s.serialize_field("maxIops", &self.1.max_iops)?;
        s.end()
    }
}

impl Serialize for IopsInfo {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(self.profiles.iter().map(|(k, p)| Entry(k, p)))
    }
}
