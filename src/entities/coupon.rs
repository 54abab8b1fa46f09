use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A redeemable monetary voucher owned by a customer.
///
/// `value_minor` is the coupon's face value in minor currency units (cents).
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "coupons")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false, column_type = "Uuid")]
    pub id: Uuid,

    #[sea_orm(unique)]
    pub code: String,

    pub title: Option<String>,

    #[sea_orm(column_type = "Uuid")]
    pub customer_id: Uuid,

    pub value_minor: i64,
    pub status: CouponStatus,
    pub category: CouponCategory,

    /// Promotional coupons only: how many purchases may use this coupon.
    pub usage_limit: Option<i32>,
    pub usage_count: i32,

    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Copy, Clone, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum CouponStatus {
    /// Available for settlement.
    #[sea_orm(string_value = "unused")]
    Unused,
    /// Attached to a pending purchase. Still eligible for the settlement of
    /// that same purchase.
    #[sea_orm(string_value = "in_use")]
    InUse,
    /// Consumed by an approved purchase. Never eligible again.
    #[sea_orm(string_value = "used")]
    Used,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum CouponCategory {
    /// Limited-use discount voucher; at most one per purchase.
    #[sea_orm(string_value = "promotional")]
    Promotional,
    /// Reward issued for a trade-in.
    #[sea_orm(string_value = "trade")]
    Trade,
    /// Minted to return overpayment from a prior settlement.
    #[sea_orm(string_value = "change")]
    Change,
    #[sea_orm(string_value = "other")]
    Other,
}

impl Model {
    pub fn is_promotional(&self) -> bool {
        self.category == CouponCategory::Promotional
    }
}
