//! Settlement Engine Library
//!
//! This crate provides the coupon/payment settlement core for the commerce
//! back office: given a purchase total, a customer's coupons, and one or more
//! payment cards, it selects the coupon subset that best covers the total,
//! validates the card contributions against the remaining balance, and mints
//! a change coupon when the tendered amount overpays the purchase.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod config;
pub mod entities;
pub mod errors;
pub mod events;
pub mod repositories;
pub mod services;

pub use config::SettlementConfig;
pub use errors::ServiceError;
pub use services::settlement::{
    CardContribution, SettlementOutcome, SettlementRequest, SettlementService,
};
