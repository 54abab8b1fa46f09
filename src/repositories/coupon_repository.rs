use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::entities::coupon::{
    ActiveModel as CouponActiveModel, Column, Entity as Coupon, Model as CouponModel,
};
use crate::errors::ServiceError;
use crate::repositories::{BaseRepository, Repository};

/// Read/create access to the coupon store. The settlement pipeline never
/// updates or deletes coupons; status transitions belong to the
/// purchase-finalization collaborator.
#[derive(Debug, Clone)]
pub struct CouponRepository {
    base: BaseRepository,
}

impl CouponRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Fetch all coupons matching the given ids. Missing ids are simply
    /// absent from the result; the gatekeeper decides what that means.
    pub async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<CouponModel>, ServiceError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        Coupon::find()
            .filter(Column::Id.is_in(ids.iter().copied()))
            .all(self.base.get_db())
            .await
            .map_err(ServiceError::from)
    }

    /// Persist a freshly minted coupon (change issuance).
    pub async fn create(&self, coupon: CouponActiveModel) -> Result<CouponModel, ServiceError> {
        coupon
            .insert(self.base.get_db())
            .await
            .map_err(ServiceError::from)
    }

    /// Collision check for generated coupon codes.
    pub async fn exists_by_code(&self, code: &str) -> Result<bool, ServiceError> {
        let count = Coupon::find()
            .filter(Column::Code.eq(code))
            .count(self.base.get_db())
            .await?;
        Ok(count > 0)
    }
}
