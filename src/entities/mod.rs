pub mod coupon;
pub mod payment_card;
