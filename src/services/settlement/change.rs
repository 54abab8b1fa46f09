use chrono::{Duration, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use sea_orm::Set;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::SettlementConfig;
use crate::entities::coupon::{
    ActiveModel as CouponActiveModel, CouponCategory, CouponStatus, Model as CouponModel,
};
use crate::errors::ServiceError;
use crate::repositories::CouponRepository;

const CODE_PREFIX: &str = "CHG-";
const CODE_SUFFIX_LEN: usize = 10;

/// Mints change coupons for settlement overpayment. This is the only
/// state-mutating step in the otherwise read-only settlement pipeline.
#[derive(Debug, Clone)]
pub struct ChangeIssuer {
    coupons: CouponRepository,
    validity_days: i64,
    code_attempts: u32,
}

impl ChangeIssuer {
    pub fn new(coupons: CouponRepository, config: &SettlementConfig) -> Self {
        Self {
            coupons,
            validity_days: config.change_coupon_validity_days,
            code_attempts: config.code_generation_attempts,
        }
    }

    /// Creates and persists a single-use change coupon for the customer.
    ///
    /// The generated code is collision-checked against existing coupons and
    /// regenerated on collision, up to a bounded number of attempts.
    pub async fn issue(
        &self,
        customer_id: Uuid,
        amount_minor: i64,
    ) -> Result<CouponModel, ServiceError> {
        if amount_minor <= 0 {
            return Err(ServiceError::InvalidOperation(format!(
                "change coupon amount must be positive, got {}",
                amount_minor
            )));
        }

        let code = self.allocate_code().await?;
        let now = Utc::now();

        let coupon = CouponActiveModel {
            id: Set(Uuid::new_v4()),
            code: Set(code),
            title: Set(Some("Change".to_string())),
            customer_id: Set(customer_id),
            value_minor: Set(amount_minor),
            status: Set(CouponStatus::Unused),
            category: Set(CouponCategory::Change),
            usage_limit: Set(None),
            usage_count: Set(0),
            expires_at: Set(Some(now + Duration::days(self.validity_days))),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let created = self.coupons.create(coupon).await?;
        info!(
            coupon_id = %created.id,
            %customer_id,
            value_minor = amount_minor,
            "change coupon issued"
        );
        Ok(created)
    }

    async fn allocate_code(&self) -> Result<String, ServiceError> {
        for _ in 0..self.code_attempts {
            let code = generate_code(&mut rand::thread_rng());
            if !self.coupons.exists_by_code(&code).await? {
                return Ok(code);
            }
            warn!(%code, "change coupon code collision; regenerating");
        }
        Err(ServiceError::InternalError(format!(
            "could not allocate a unique change coupon code after {} attempts",
            self.code_attempts
        )))
    }
}

fn generate_code<R: Rng>(rng: &mut R) -> String {
    let suffix: String = (0..CODE_SUFFIX_LEN)
        .map(|_| char::from(rng.sample(Alphanumeric)).to_ascii_uppercase())
        .collect();
    format!("{}{}", CODE_PREFIX, suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_codes_have_the_expected_shape() {
        let mut rng = rand::thread_rng();
        let code = generate_code(&mut rng);

        assert!(code.starts_with("CHG-"));
        assert_eq!(code.len(), CODE_PREFIX.len() + CODE_SUFFIX_LEN);
        assert!(code[CODE_PREFIX.len()..]
            .chars()
            .all(|c| c.is_ascii_alphanumeric() && !c.is_ascii_lowercase()));
    }

    #[test]
    fn generated_codes_vary() {
        let mut rng = rand::thread_rng();
        let first = generate_code(&mut rng);
        let second = generate_code(&mut rng);
        assert_ne!(first, second);
    }
}
