use std::fmt;

use crate::entities::coupon::Model as CouponModel;

/// Eligible coupons split by combination rules: at most one promotional
/// coupon per purchase, while trade/change/other coupons combine freely.
#[derive(Debug, Clone)]
pub struct ClassifiedCoupons {
    pub promotional: Option<CouponModel>,
    pub general: Vec<CouponModel>,
}

impl ClassifiedCoupons {
    /// All classified coupons, promotional first.
    pub fn into_all(self) -> Vec<CouponModel> {
        let mut all = Vec::with_capacity(self.general.len() + 1);
        if let Some(promotional) = self.promotional {
            all.push(promotional);
        }
        all.extend(self.general);
        all
    }
}

/// Raised when a coupon set carries more than one promotional coupon. The
/// offending set is returned so the caller can report it unapplied.
#[derive(Debug, Clone)]
pub struct PromotionalCapViolation {
    pub coupons: Vec<CouponModel>,
}

impl fmt::Display for PromotionalCapViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "only one promotional coupon allowed per purchase")
    }
}

/// Partitions eligible coupons into promotional and general groups.
///
/// This is a hard business rule checked before any combination search, not an
/// optimization preference.
pub fn partition(coupons: Vec<CouponModel>) -> Result<ClassifiedCoupons, PromotionalCapViolation> {
    let promotional_count = coupons.iter().filter(|c| c.is_promotional()).count();
    if promotional_count > 1 {
        return Err(PromotionalCapViolation { coupons });
    }

    let (promotional, general): (Vec<_>, Vec<_>) =
        coupons.into_iter().partition(|c| c.is_promotional());

    Ok(ClassifiedCoupons {
        promotional: promotional.into_iter().next(),
        general,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::coupon::{CouponCategory, CouponStatus};
    use chrono::Utc;
    use uuid::Uuid;

    fn coupon(value_minor: i64, category: CouponCategory) -> CouponModel {
        let now = Utc::now();
        CouponModel {
            id: Uuid::new_v4(),
            code: format!("TST{}", Uuid::new_v4().simple()),
            title: None,
            customer_id: Uuid::new_v4(),
            value_minor,
            status: CouponStatus::Unused,
            category,
            usage_limit: None,
            usage_count: 0,
            expires_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn general_categories_collapse_together() {
        let classified = partition(vec![
            coupon(1000, CouponCategory::Trade),
            coupon(2000, CouponCategory::Change),
            coupon(3000, CouponCategory::Other),
        ])
        .unwrap();

        assert!(classified.promotional.is_none());
        assert_eq!(classified.general.len(), 3);
    }

    #[test]
    fn single_promotional_is_accepted() {
        let classified = partition(vec![
            coupon(1000, CouponCategory::Promotional),
            coupon(2000, CouponCategory::Trade),
        ])
        .unwrap();

        assert!(classified.promotional.is_some());
        assert_eq!(classified.general.len(), 1);
        assert_eq!(classified.into_all().len(), 2);
    }

    #[test]
    fn two_promotional_coupons_are_rejected() {
        let err = partition(vec![
            coupon(5000, CouponCategory::Promotional),
            coupon(1000, CouponCategory::Promotional),
        ])
        .unwrap_err();

        assert_eq!(
            err.to_string(),
            "only one promotional coupon allowed per purchase"
        );
        assert_eq!(err.coupons.len(), 2);
    }
}
