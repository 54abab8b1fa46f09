pub mod cards;
pub mod change;
pub mod classifier;
pub mod gatekeeper;
pub mod optimizer;

pub use change::ChangeIssuer;
pub use optimizer::{OptimizationResult, OptimizerLimits};

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::config::SettlementConfig;
use crate::entities::coupon::Model as CouponModel;
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::repositories::{CardRepository, CouponRepository};

/// Renders a minor-unit amount as a human-facing decimal, e.g. 2000 -> "20.00".
pub(crate) fn format_minor(amount_minor: i64) -> String {
    Decimal::new(amount_minor, 2).to_string()
}

/// Rationale for outcomes rejected during gatekeeping or classification,
/// before any combination search ran.
const RATIONALE_REJECTED_EARLY: &str = "settlement rejected before optimization";

/// One settlement attempt: a fixed purchase total, the coupons the customer
/// wants to apply, and the card contributions offered for the remainder.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SettlementRequest {
    /// Purchase total in minor currency units, computed by the caller.
    #[validate(range(min = 0))]
    pub purchase_total_minor: i64,
    pub customer_id: Uuid,
    pub coupon_ids: Vec<Uuid>,
    pub cards: Vec<CardContribution>,
}

/// A payment card with its assigned contribution for this settlement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardContribution {
    pub card_id: Uuid,
    pub amount_minor: i64,
}

/// Aggregate result of one settlement pass. `valid == false` means the
/// purchase-finalization workflow must not apply any coupon or card state;
/// `errors` then carries every problem found.
#[derive(Debug, Clone, Serialize)]
pub struct SettlementOutcome {
    pub valid: bool,
    pub errors: Vec<String>,
    pub selected_coupons: Vec<CouponModel>,
    pub unused_coupons: Vec<CouponModel>,
    pub coupon_total_minor: i64,
    pub card_total_minor: i64,
    pub change_amount_minor: i64,
    pub change_coupon: Option<CouponModel>,
    pub rationale: String,
}

impl SettlementOutcome {
    fn rejected(
        errors: Vec<String>,
        selected_coupons: Vec<CouponModel>,
        unused_coupons: Vec<CouponModel>,
        coupon_total_minor: i64,
        card_total_minor: i64,
        rationale: String,
    ) -> Self {
        Self {
            valid: false,
            errors,
            selected_coupons,
            unused_coupons,
            coupon_total_minor,
            card_total_minor,
            change_amount_minor: 0,
            change_coupon: None,
            rationale,
        }
    }
}

/// Orchestrates one settlement pass: coupon gatekeeping and classification,
/// combination optimization, card validation, and change issuance.
#[derive(Clone)]
pub struct SettlementService {
    coupons: CouponRepository,
    cards: CardRepository,
    issuer: ChangeIssuer,
    event_sender: Arc<EventSender>,
    config: SettlementConfig,
}

impl SettlementService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: Arc<EventSender>,
        config: SettlementConfig,
    ) -> Self {
        let coupons = CouponRepository::new(db.clone());
        let issuer = ChangeIssuer::new(coupons.clone(), &config);
        Self {
            coupons,
            cards: CardRepository::new(db),
            issuer,
            event_sender,
            config,
        }
    }

    /// Runs the full settlement pass for one purchase-finalization attempt.
    ///
    /// Business-rule failures come back as `Ok` with `valid == false` and the
    /// collected error list; `Err` is reserved for infrastructure failures.
    /// An invalid outcome mutates nothing. Change issuance happens exactly
    /// once, only on a fully valid outcome with a positive surplus.
    #[instrument(skip(self, request), fields(customer_id = %request.customer_id, purchase_total_minor = request.purchase_total_minor))]
    pub async fn settle(
        &self,
        request: SettlementRequest,
    ) -> Result<SettlementOutcome, ServiceError> {
        request.validate()?;

        let target_minor = request.purchase_total_minor;
        let now = Utc::now();
        let mut errors: Vec<String> = Vec::new();

        // Stage 1: gatekeeping and classification. Failures here abort
        // before any combination search.
        let fetched = self.coupons.find_by_ids(&request.coupon_ids).await?;
        let eligible = gatekeeper::filter_eligible(&request.coupon_ids, fetched, now);

        if !request.coupon_ids.is_empty() && eligible.is_empty() {
            let errors = vec!["no valid coupon found".to_string()];
            return self
                .reject(
                    &request,
                    SettlementOutcome::rejected(
                        errors,
                        Vec::new(),
                        Vec::new(),
                        0,
                        0,
                        RATIONALE_REJECTED_EARLY.to_string(),
                    ),
                )
                .await;
        }

        let classified = match classifier::partition(eligible) {
            Ok(classified) => classified,
            Err(violation) => {
                let errors = vec![violation.to_string()];
                let unused = violation.coupons;
                return self
                    .reject(
                        &request,
                        SettlementOutcome::rejected(
                            errors,
                            Vec::new(),
                            unused,
                            0,
                            0,
                            RATIONALE_REJECTED_EARLY.to_string(),
                        ),
                    )
                    .await;
            }
        };

        // Stage 2: pick the coupon subset covering the total.
        let optimization = optimizer::optimize(
            classified.into_all(),
            target_minor,
            &OptimizerLimits::from_config(&self.config),
        );

        // Stage 3: cards cover whatever the coupons left open.
        for card in &request.cards {
            if !self.cards.exists(card.card_id).await? {
                errors.push(format!("card {} not found", card.card_id));
            }
        }
        let card_check = cards::validate_cards(
            &request.cards,
            optimization.remaining_minor,
            self.config.multi_card_minimum_minor,
        );
        errors.extend(card_check.errors);

        if !errors.is_empty() {
            return self
                .reject(
                    &request,
                    SettlementOutcome::rejected(
                        errors,
                        optimization.selected,
                        optimization.unused,
                        optimization.selected_total_minor,
                        card_check.card_total_minor,
                        optimization.rationale,
                    ),
                )
                .await;
        }

        // Stage 4: return any overpayment, from coupon overshoot or card
        // overshoot, as a freshly minted change coupon.
        let change_amount_minor = optimization.change_minor + card_check.change_minor;
        let change_coupon = if change_amount_minor > 0 {
            let coupon = self
                .issuer
                .issue(request.customer_id, change_amount_minor)
                .await?;
            self.event_sender
                .send(Event::ChangeCouponIssued {
                    coupon_id: coupon.id,
                    customer_id: request.customer_id,
                    value_minor: change_amount_minor,
                })
                .await;
            Some(coupon)
        } else {
            None
        };

        info!(
            coupon_total_minor = optimization.selected_total_minor,
            card_total_minor = card_check.card_total_minor,
            change_amount_minor,
            "settlement validated"
        );
        self.event_sender
            .send(Event::SettlementCompleted {
                customer_id: request.customer_id,
                purchase_total_minor: target_minor,
                coupon_total_minor: optimization.selected_total_minor,
                card_total_minor: card_check.card_total_minor,
                change_amount_minor,
            })
            .await;

        Ok(SettlementOutcome {
            valid: true,
            errors: Vec::new(),
            selected_coupons: optimization.selected,
            unused_coupons: optimization.unused,
            coupon_total_minor: optimization.selected_total_minor,
            card_total_minor: card_check.card_total_minor,
            change_amount_minor,
            change_coupon,
            rationale: optimization.rationale,
        })
    }

    async fn reject(
        &self,
        request: &SettlementRequest,
        outcome: SettlementOutcome,
    ) -> Result<SettlementOutcome, ServiceError> {
        info!(errors = ?outcome.errors, "settlement rejected");
        self.event_sender
            .send(Event::SettlementRejected {
                customer_id: request.customer_id,
                errors: outcome.errors.clone(),
            })
            .await;
        Ok(outcome)
    }
}
