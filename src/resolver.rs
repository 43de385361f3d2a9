//! IOPS Resolver
//!
//! Computes the IOPS to provision for a server from its storage size, the
//! SKU's capability profile and an optional user request. The baseline is
//! the larger of the SKU's free allotment and 3 IOPS per GB of storage; a
//! request can raise it but never lower it, and the SKU ceiling always wins.

use crate::error::Result;
use crate::sku::IopsInfo;
use crate::storage::StorageSizeGb;
use tracing::debug;

/// IOPS granted per GB of storage
pub const IOPS_PER_GB: u64 = 3;

pub fn resolve_iops(
    storage_gb: StorageSizeGb,
    iops_info: &IopsInfo,
    iops_input: Option<u64>,
    tier: &str,
    sku_name: &str,
) -> Result<u64> {
    let storage_based_default = storage_gb.get().saturating_mul(IOPS_PER_GB);
    let profile = iops_info.profile(tier, sku_name)?;

    let baseline = profile.free_iops().max(storage_based_default);
    let requested = match iops_input {
        Some(iops) => iops.max(baseline),
        None => baseline,
    };
    let resolved = requested.min(profile.max_iops());

    debug!(
        "Resolved IOPS for {}/{}: storage={} input={:?} baseline={} max={} -> {}",
        tier,
        sku_name,
        storage_gb,
        iops_input,
        baseline,
        profile.max_iops(),
        resolved
    );

    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IopsError;
    use proptest::prelude::*;

    fn gb(n: u64) -> StorageSizeGb {
        StorageSizeGb::new(n).unwrap()
    }

    fn burstable(b1s: (u64, u64), b1ms: (u64, u64)) -> IopsInfo {
        IopsInfo::builder()
            .sku("Burstable", "Standard_B1s", b1s.0, b1s.1)
            .unwrap()
            .sku("Burstable", "Standard_B1ms", b1ms.0, b1ms.1)
            .unwrap()
            .build()
    }

    fn resolve(info: &IopsInfo, storage: u64, input: Option<u64>, sku: &str) -> u64 {
        resolve_iops(gb(storage), info, input, "Burstable", sku).unwrap()
    }

    #[test]
    fn test_storage_default_clamped_to_max() {
        let info = burstable((400, 400), (300, 640));
        assert_eq!(resolve(&info, 200, Some(50), "Standard_B1s"), 400);
    }

    #[test]
    fn test_free_iops_floor_beats_small_inputs() {
        let info = burstable((390, 400), (300, 640));
        assert_eq!(resolve(&info, 30, Some(50), "Standard_B1s"), 390);
    }

    #[test]
    fn test_free_allotment_at_ceiling() {
        let info = burstable((400, 400), (300, 640));
        assert_eq!(resolve(&info, 40, Some(50), "Standard_B1s"), 400);
    }

    #[test]
    fn test_upgrade_clamps_to_sku_max() {
        let info = burstable((400, 400), (300, 640));
        assert_eq!(resolve(&info, 300, Some(500), "Standard_B1ms"), 640);
        assert_eq!(resolve(&info, 30, Some(700), "Standard_B1ms"), 640);
    }

    #[test]
    fn test_storage_default_beats_smaller_request() {
        // 200 GB gives a 600 baseline, above both the request and the free allotment
        let info = burstable((400, 400), (300, 640));
        assert_eq!(resolve(&info, 200, Some(400), "Standard_B1ms"), 600);

        let info = burstable((400, 400), (640, 640));
        assert_eq!(resolve(&info, 200, Some(400), "Standard_B1ms"), 640);
    }

    #[test]
    fn test_request_above_baseline_is_honored() {
        let info = burstable((400, 400), (300, 640));
        assert_eq!(resolve(&info, 20, Some(500), "Standard_B1ms"), 500);
    }

    #[test]
    fn test_absent_input_uses_baseline() {
        let info = burstable((400, 400), (300, 640));
        assert_eq!(resolve(&info, 150, None, "Standard_B1ms"), 450);
        assert_eq!(resolve(&info, 50, None, "Standard_B1ms"), 300);
    }

    #[test]
    fn test_exact_boundary_returns_max() {
        let info = burstable((400, 400), (300, 640));
        // 3 * 213 = 639, 3 * 214 = 642
        assert_eq!(resolve(&info, 213, None, "Standard_B1ms"), 639);

        let info = IopsInfo::builder()
            .sku("GeneralPurpose", "Standard_D2ds_v4", 300, 600)
            .unwrap()
            .build();
        let resolved =
            resolve_iops(gb(200), &info, None, "GeneralPurpose", "Standard_D2ds_v4").unwrap();
        assert_eq!(resolved, 600);
    }

    #[test]
    fn test_unknown_sku() {
        let err = resolve_iops(gb(100), &IopsInfo::default(), None, "Burstable", "Standard_B1s")
            .unwrap_err();
        assert!(matches!(
            err,
            IopsError::UnknownSku { ref tier, ref sku_name }
                if tier == "Burstable" && sku_name == "Standard_B1s"
        ));
    }

    #[test]
    fn test_huge_storage_saturates() {
        let info = burstable((400, 400), (300, 640));
        assert_eq!(resolve(&info, u64::MAX, None, "Standard_B1s"), 400);
    }

    fn profile() -> impl Strategy<Value = (u64, u64)> {
        (0u64..20_000).prop_flat_map(|free| (Just(free), free..80_000))
    }

    fn single(tier: &str, sku: &str, free: u64, max: u64) -> IopsInfo {
        IopsInfo::builder().sku(tier, sku, free, max).unwrap().build()
    }

    proptest! {
        #[test]
        fn prop_result_within_profile(
            (free, max) in profile(),
            storage in 1u64..100_000,
            input in proptest::option::of(0u64..100_000)
        ) {
            let info = single("MemoryOptimized", "Standard_E2ds_v4", free, max);
            let result =
                resolve_iops(gb(storage), &info, input, "MemoryOptimized", "Standard_E2ds_v4")
                    .unwrap();

            prop_assert!(result <= max);
            if storage * IOPS_PER_GB <= max {
                prop_assert!(result >= free);
                prop_assert!(result >= storage * IOPS_PER_GB);
            } else {
                prop_assert_eq!(result, max);
            }
        }

        #[test]
        fn prop_monotonic_in_storage(
            (free, max) in profile(),
            storage in 1u64..50_000,
            extra in 0u64..50_000,
            input in proptest::option::of(0u64..100_000)
        ) {
            let info = single("GeneralPurpose", "Standard_D4ds_v4", free, max);
            let smaller =
                resolve_iops(gb(storage), &info, input, "GeneralPurpose", "Standard_D4ds_v4")
                    .unwrap();
            let larger = resolve_iops(
                gb(storage + extra),
                &info,
                input,
                "GeneralPurpose",
                "Standard_D4ds_v4",
            )
            .unwrap();
            prop_assert!(larger >= smaller);
        }

        #[test]
        fn prop_idempotent(
            (free, max) in profile(),
            storage in 1u64..100_000,
            input in proptest::option::of(0u64..100_000)
        ) {
            let info = single("Burstable", "Standard_B2s", free, max);
            let first = resolve_iops(gb(storage), &info, input, "Burstable", "Standard_B2s");
            let second = resolve_iops(gb(storage), &info, input, "Burstable", "Standard_B2s");
            prop_assert_eq!(first.unwrap(), second.unwrap());
        }
    }
}
