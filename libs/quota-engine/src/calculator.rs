use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::units::{parse_magnitude, QuotaMagnitude};
use crate::{QuotaEngineError, Result};

/// Percentage reported once usage reaches the allocation.
pub const FULL_USAGE_PERCENT: f64 = 100.0;

/// Usage figures derived from a raw allocation/used pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    pub used_mb: f64,
    pub used_percent: f64,
}

/// Significant digits kept before rounding.
const ROUNDING_PRECISION: usize = 15;

/// Rounds half away from zero to two decimal places.
///
/// The scaled value is first reduced to 15 significant digits, which turns
/// `100.49999999999999` (from `1.005 * 100.0`) back into `100.5`.
pub fn round2(value: f64) -> f64 {
    let scaled = value * 100.0;
    let scaled = format!("{:.*e}", ROUNDING_PRECISION - 1, scaled)
        .parse::<f64>()
        .unwrap_or(scaled);
    scaled.round() / 100.0
}

/// Derives rounded usage and the saturating usage percentage.
///
/// `used_mb` is rounded first and the rounded value is compared against the
/// allocation. Usage at or above the allocation reports 100%, which also
/// covers zero and negative allocations.
pub fn annotate(allocation_mb: i64, used_mb: f64) -> Usage {
    let used_mb = round2(used_mb);
    let allocation = allocation_mb as f64;

    let used_percent = if used_mb >= allocation {
        FULL_USAGE_PERCENT
    } else {
        round2(used_mb / allocation * 100.0)
    };

    Usage {
        used_mb,
        used_percent,
    }
}

/// Resolves the requested quota for a `set` operation.
pub fn resolve_set(requested: &str) -> Result<QuotaMagnitude> {
    parse_magnitude(requested)
}

pub fn resolve_add(current_allocation_mb: i64, delta_token: &str) -> Result<i64> {
    let delta = parse_magnitude(delta_token)?.to_allocation_mb()?;
    let updated = current_allocation_mb.checked_add(delta).ok_or_else(|| {
        QuotaEngineError::AllocationOverflow(format!(
            "{current_allocation_mb} MB + {delta} MB"
        ))
    })?;

    trace!(current_allocation_mb, delta, updated, "resolved quota increase");
    Ok(updated)
}

/// Subtracts the parsed delta. The result is not clamped and may be negative.
pub fn resolve_subtract(current_allocation_mb: i64, delta_token: &str) -> Result<i64> {
    let delta = parse_magnitude(delta_token)?.to_allocation_mb()?;
    let updated = current_allocation_mb.checked_sub(delta).ok_or_else(|| {
        QuotaEngineError::AllocationOverflow(format!(
            "{current_allocation_mb} MB - {delta} MB"
        ))
    })?;

    trace!(current_allocation_mb, delta, updated, "resolved quota decrease");
    Ok(updated)
}

/// Returns `false` when the new allocation equals the network default, meaning
/// the site override should be removed instead of stored.
pub fn should_write(new_allocation_mb: i64, network_default_mb: i64) -> bool {
    new_allocation_mb != network_default_mb
}
