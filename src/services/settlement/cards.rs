use super::{format_minor, CardContribution};

/// Outcome of validating card contributions against the balance left after
/// coupon discount. Errors are collected, never short-circuited, so the
/// customer sees every problem at once.
#[derive(Debug, Clone)]
pub struct CardValidation {
    pub valid: bool,
    pub errors: Vec<String>,
    pub card_total_minor: i64,
    pub change_minor: i64,
    pub needs_change: bool,
}

/// Validates that the given cards cover `remaining_minor`.
///
/// At least one card is required when a balance remains. When two or more
/// cards participate, each contribution must meet the per-card minimum; a
/// single card has no floor. Any excess over the balance becomes the change
/// amount for the change issuer.
pub fn validate_cards(
    cards: &[CardContribution],
    remaining_minor: i64,
    multi_card_minimum_minor: i64,
) -> CardValidation {
    let mut errors = Vec::new();

    for card in cards {
        if card.amount_minor <= 0 {
            errors.push(format!(
                "card {}: contribution {} must be positive",
                card.card_id,
                format_minor(card.amount_minor)
            ));
        }
    }

    if cards.len() > 1 {
        for card in cards {
            if card.amount_minor > 0 && card.amount_minor < multi_card_minimum_minor {
                errors.push(format!(
                    "card {}: contribution {} is below the {} per-card minimum",
                    card.card_id,
                    format_minor(card.amount_minor),
                    format_minor(multi_card_minimum_minor)
                ));
            }
        }
    }

    let card_total_minor: i64 = cards.iter().map(|c| c.amount_minor).sum();

    if remaining_minor > 0 && cards.is_empty() {
        errors.push(format!(
            "no payment card provided to cover remaining {}",
            format_minor(remaining_minor)
        ));
    } else if card_total_minor < remaining_minor {
        errors.push(format!(
            "insufficient card value: shortfall {}",
            format_minor(remaining_minor - card_total_minor)
        ));
    }

    let change_minor = (card_total_minor - remaining_minor).max(0);

    CardValidation {
        valid: errors.is_empty(),
        errors,
        card_total_minor,
        change_minor,
        needs_change: change_minor > 0,
    }
}
