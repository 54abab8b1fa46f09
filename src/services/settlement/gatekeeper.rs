use chrono::{DateTime, Utc};
use tracing::warn;
use uuid::Uuid;

use crate::entities::coupon::{CouponStatus, Model as CouponModel};

/// Filters fetched coupons down to the settlement-eligible set.
///
/// A coupon is discarded, with a warning rather than a hard failure, when it
/// was requested but not found, its status is neither Unused nor InUse, its
/// value is not positive, it has expired, or it is a promotional coupon whose
/// usage limit is exhausted. An InUse coupon stays eligible: it was attached
/// to the purchase currently being settled, not consumed elsewhere.
pub fn filter_eligible(
    requested: &[Uuid],
    fetched: Vec<CouponModel>,
    now: DateTime<Utc>,
) -> Vec<CouponModel> {
    for id in requested {
        if !fetched.iter().any(|c| c.id == *id) {
            warn!(coupon_id = %id, "coupon not found; skipping");
        }
    }

    fetched
        .into_iter()
        .filter(|coupon| is_eligible(coupon, now))
        .collect()
}

fn is_eligible(coupon: &CouponModel, now: DateTime<Utc>) -> bool {
    if !matches!(coupon.status, CouponStatus::Unused | CouponStatus::InUse) {
        warn!(coupon_id = %coupon.id, status = ?coupon.status, "coupon status disallows use; skipping");
        return false;
    }
    if coupon.value_minor <= 0 {
        warn!(coupon_id = %coupon.id, value_minor = coupon.value_minor, "coupon has no redeemable value; skipping");
        return false;
    }
    if let Some(expires_at) = coupon.expires_at {
        if expires_at < now {
            warn!(coupon_id = %coupon.id, %expires_at, "coupon has expired; skipping");
            return false;
        }
    }
    if coupon.is_promotional() {
        if let Some(limit) = coupon.usage_limit {
            if coupon.usage_count >= limit {
                warn!(coupon_id = %coupon.id, limit, "promotional coupon has reached its usage limit; skipping");
                return false;
            }
        }
    }
    true
}
