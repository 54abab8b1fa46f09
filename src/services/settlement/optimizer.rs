use tracing::debug;

use crate::config::SettlementConfig;
use crate::entities::coupon::Model as CouponModel;

use super::format_minor;

/// Bounds on the combination search, lifted from [`SettlementConfig`].
#[derive(Debug, Clone)]
pub struct OptimizerLimits {
    /// Largest target for which the exact-match subset-sum table is built.
    pub target_ceiling_minor: i64,
    /// Maximum number of subsets the minimal-change enumeration examines.
    pub subset_limit: u64,
}

impl OptimizerLimits {
    pub fn from_config(config: &SettlementConfig) -> Self {
        Self {
            target_ceiling_minor: config.exact_match_target_ceiling_minor,
            subset_limit: config.subset_search_limit,
        }
    }
}

/// The coupon subset chosen to cover a settlement target.
///
/// Exactly one of `remaining_minor` (coupons fall short of the target) and
/// `change_minor` (coupons overshoot it) can be positive.
#[derive(Debug, Clone)]
pub struct OptimizationResult {
    pub selected: Vec<CouponModel>,
    pub unused: Vec<CouponModel>,
    pub selected_total_minor: i64,
    pub remaining_minor: i64,
    pub change_minor: i64,
    pub needs_change: bool,
    pub rationale: String,
}

const RATIONALE_EXACT: &str = "exact combination: no change";
const RATIONALE_NO_COUPONS: &str = "no coupons applied";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Strategy {
    MinimalChange,
    Greedy,
}

#[derive(Debug, Clone)]
struct Candidate {
    indices: Vec<usize>,
    total_minor: i64,
    strategy: Strategy,
}

/// Selects the coupon subset that best covers `target_minor`.
///
/// Strategies are attempted in order: exact subset-sum match, bounded
/// minimal-change enumeration, greedy descending fallback. Across candidates
/// the policy prefers zero change, then the smallest surplus, then the subset
/// spending more coupons. Falling short of the target is not an error; the
/// remainder is passed downstream to the card stage.
///
/// Callers must run the category classifier first: every coupon set handled
/// here carries at most one promotional coupon, so no subset needs to be
/// skipped for the one-promotional rule.
pub fn optimize(
    coupons: Vec<CouponModel>,
    target_minor: i64,
    limits: &OptimizerLimits,
) -> OptimizationResult {
    if coupons.is_empty() || target_minor <= 0 {
        return OptimizationResult {
            selected: Vec::new(),
            unused: coupons,
            selected_total_minor: 0,
            remaining_minor: target_minor.max(0),
            change_minor: 0,
            needs_change: false,
            rationale: RATIONALE_NO_COUPONS.to_string(),
        };
    }

    let values: Vec<i64> = coupons.iter().map(|c| c.value_minor).collect();
    let total_minor: i64 = values.iter().sum();

    if target_minor <= limits.target_ceiling_minor {
        if let Some(indices) = exact_subset(&values, target_minor) {
            debug!(
                target_minor,
                selected = indices.len(),
                "exact coupon combination found"
            );
            return build_result(coupons, &indices, target_minor, RATIONALE_EXACT.to_string());
        }
    }

    let mut best: Option<Candidate> = None;
    if total_minor >= target_minor {
        if let Some(candidate) = bounded_minimal_change(&values, target_minor, limits.subset_limit)
        {
            consider(&mut best, candidate, target_minor);
        }
        let greedy = greedy_cover(&values, target_minor);
        if greedy.total_minor >= target_minor {
            consider(&mut best, greedy, target_minor);
        }
    }

    if let Some(candidate) = best {
        let surplus = candidate.total_minor - target_minor;
        let rationale = if surplus == 0 {
            RATIONALE_EXACT.to_string()
        } else {
            match candidate.strategy {
                Strategy::MinimalChange => {
                    format!("minimal change combination: surplus {}", format_minor(surplus))
                }
                Strategy::Greedy => {
                    format!("greedy fallback: surplus {}", format_minor(surplus))
                }
            }
        };
        return build_result(coupons, &candidate.indices, target_minor, rationale);
    }

    // No subset covers the target: apply every coupon and leave the
    // remainder to the card stage.
    let all: Vec<usize> = (0..coupons.len()).collect();
    let rationale = format!(
        "all coupons applied; remaining {} due",
        format_minor(target_minor - total_minor)
    );
    build_result(coupons, &all, target_minor, rationale)
}

/// Replaces `best` when `candidate` is preferable: smaller surplus first,
/// then more coupons spent.
fn consider(best: &mut Option<Candidate>, candidate: Candidate, target_minor: i64) {
    let replace = match best {
        None => true,
        Some(current) => {
            let current_surplus = current.total_minor - target_minor;
            let candidate_surplus = candidate.total_minor - target_minor;
            candidate_surplus < current_surplus
                || (candidate_surplus == current_surplus
                    && candidate.indices.len() > current.indices.len())
        }
    };
    if replace {
        *best = Some(candidate);
    }
}

/// Subset-sum dynamic program over integer minor units.
///
/// `counts[j]` holds the largest coupon count of any subset summing exactly
/// to `j`, so an exact match spends down as many coupons as possible. The
/// per-item `take` table allows parent-pointer reconstruction: scanning items
/// from the last to the first, the first set bit at the current sum is the
/// final improver of that state and lies on the optimal chain.
fn exact_subset(values: &[i64], target_minor: i64) -> Option<Vec<usize>> {
    let target = usize::try_from(target_minor).ok()?;
    let n = values.len();

    let mut counts = vec![-1i32; target + 1];
    counts[0] = 0;
    let mut take = vec![vec![false; target + 1]; n];

    for (i, &value) in values.iter().enumerate() {
        let Ok(v) = usize::try_from(value) else {
            continue;
        };
        if v == 0 || v > target {
            continue;
        }
        for j in (v..=target).rev() {
            if counts[j - v] >= 0 && counts[j - v] + 1 > counts[j] {
                counts[j] = counts[j - v] + 1;
                take[i][j] = true;
            }
        }
    }

    if counts[target] < 0 {
        return None;
    }

    let mut indices = Vec::new();
    let mut j = target;
    for i in (0..n).rev() {
        if j == 0 {
            break;
        }
        if take[i][j] {
            indices.push(i);
            j -= values[i] as usize;
        }
    }
    debug_assert_eq!(j, 0);
    indices.reverse();
    Some(indices)
}

/// Enumerates coupon subsets as bitmasks looking for the smallest positive
/// surplus over the target, stopping early on a zero-surplus subset or once
/// `subset_limit` masks have been examined. The cap trades completeness for a
/// hard bound on runtime with large coupon sets.
fn bounded_minimal_change(
    values: &[i64],
    target_minor: i64,
    subset_limit: u64,
) -> Option<Candidate> {
    let n = values.len();
    if n == 0 || n >= 64 {
        return None;
    }

    let mask_count = 1u64 << n;
    let mut best: Option<(u64, i64)> = None;
    let mut examined = 0u64;
    let mut mask = 1u64;

    while mask < mask_count && examined < subset_limit {
        examined += 1;
        let mut sum = 0i64;
        for (i, &value) in values.iter().enumerate() {
            if mask & (1 << i) != 0 {
                sum += value;
            }
        }
        if sum >= target_minor {
            let replace = match best {
                None => true,
                Some((best_mask, best_sum)) => {
                    sum < best_sum
                        || (sum == best_sum && mask.count_ones() > best_mask.count_ones())
                }
            };
            if replace {
                best = Some((mask, sum));
                if sum == target_minor {
                    break;
                }
            }
        }
        mask += 1;
    }

    best.map(|(mask, sum)| Candidate {
        indices: (0..n).filter(|i| mask & (1 << i) != 0).collect(),
        total_minor: sum,
        strategy: Strategy::MinimalChange,
    })
}

/// Accumulates coupons by descending value until the target is reached.
/// Always terminates; covers the target whenever the coupon total does.
fn greedy_cover(values: &[i64], target_minor: i64) -> Candidate {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|a, b| values[*b].cmp(&values[*a]));

    let mut indices = Vec::new();
    let mut sum = 0i64;
    for i in order {
        indices.push(i);
        sum += values[i];
        if sum >= target_minor {
            break;
        }
    }
    indices.sort_unstable();

    Candidate {
        indices,
        total_minor: sum,
        strategy: Strategy::Greedy,
    }
}

fn build_result(
    coupons: Vec<CouponModel>,
    indices: &[usize],
    target_minor: i64,
    rationale: String,
) -> OptimizationResult {
    let mut picked = vec![false; coupons.len()];
    for &i in indices {
        picked[i] = true;
    }

    let mut selected = Vec::with_capacity(indices.len());
    let mut unused = Vec::new();
    for (i, coupon) in coupons.into_iter().enumerate() {
        if picked[i] {
            selected.push(coupon);
        } else {
            unused.push(coupon);
        }
    }

    let selected_total_minor: i64 = selected.iter().map(|c| c.value_minor).sum();
    let change_minor = (selected_total_minor - target_minor).max(0);

    OptimizationResult {
        selected,
        unused,
        selected_total_minor,
        remaining_minor: (target_minor - selected_total_minor).max(0),
        change_minor,
        needs_change: change_minor > 0,
        rationale,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::coupon::{CouponCategory, CouponStatus};
    use chrono::Utc;
    use uuid::Uuid;

    fn coupon(value_minor: i64) -> CouponModel {
        let now = Utc::now();
        CouponModel {
            id: Uuid::new_v4(),
            code: format!("TST{}", Uuid::new_v4().simple()),
            title: None,
            customer_id: Uuid::new_v4(),
            value_minor,
            status: CouponStatus::Unused,
            category: CouponCategory::Trade,
            usage_limit: None,
            usage_count: 0,
            expires_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn limits() -> OptimizerLimits {
        OptimizerLimits::from_config(&SettlementConfig::default())
    }

    #[test]
    fn exact_match_selects_both_coupons() {
        // Target 50.00, coupons 30.00 + 20.00
        let result = optimize(vec![coupon(3000), coupon(2000)], 5000, &limits());

        assert_eq!(result.selected.len(), 2);
        assert_eq!(result.selected_total_minor, 5000);
        assert_eq!(result.remaining_minor, 0);
        assert_eq!(result.change_minor, 0);
        assert!(!result.needs_change);
        assert_eq!(result.rationale, "exact combination: no change");
    }

    #[test]
    fn exact_match_prefers_spending_more_coupons() {
        // Both {50.00} and {30.00, 20.00} are exact; the pair wins.
        let result = optimize(
            vec![coupon(5000), coupon(3000), coupon(2000)],
            5000,
            &limits(),
        );

        assert_eq!(result.selected.len(), 2);
        assert_eq!(result.selected_total_minor, 5000);
        assert_eq!(result.unused.len(), 1);
        assert_eq!(result.unused[0].value_minor, 5000);
    }

    #[test]
    fn insufficient_coupons_are_all_applied() {
        // Target 50.00, coupons 40.00 + 5.00: remainder goes to cards.
        let result = optimize(vec![coupon(4000), coupon(500)], 5000, &limits());

        assert_eq!(result.selected.len(), 2);
        assert_eq!(result.selected_total_minor, 4500);
        assert_eq!(result.remaining_minor, 500);
        assert_eq!(result.change_minor, 0);
        assert!(!result.needs_change);
        assert!(result.rationale.contains("remaining 5.00 due"));
    }

    #[test]
    fn single_overshooting_coupon_produces_change() {
        // Target 50.00, one 55.00 coupon: minimal change of 5.00.
        let result = optimize(vec![coupon(5500)], 5000, &limits());

        assert_eq!(result.selected.len(), 1);
        assert_eq!(result.change_minor, 500);
        assert_eq!(result.remaining_minor, 0);
        assert!(result.needs_change);
        assert!(result.rationale.contains("surplus 5.00"));
    }

    #[test]
    fn minimal_change_search_beats_greedy() {
        // Greedy picks 40.00 + 25.00 (surplus 17.00); the enumeration finds
        // 25.00 + 24.00 (surplus 1.00).
        let result = optimize(
            vec![coupon(4000), coupon(2500), coupon(2400)],
            4800,
            &limits(),
        );

        assert_eq!(result.selected_total_minor, 4900);
        assert_eq!(result.change_minor, 100);
        assert_eq!(result.rationale, "minimal change combination: surplus 1.00");
    }

    #[test]
    fn greedy_fallback_when_enumeration_is_disabled() {
        let bounds = OptimizerLimits {
            target_ceiling_minor: 0,
            subset_limit: 0,
        };
        let result = optimize(vec![coupon(4000), coupon(2500), coupon(2400)], 4800, &bounds);

        assert_eq!(result.selected_total_minor, 6500);
        assert_eq!(result.change_minor, 1700);
        assert!(result.rationale.starts_with("greedy fallback"));
    }

    #[test]
    fn exact_match_above_dp_ceiling_found_by_enumeration() {
        let bounds = OptimizerLimits {
            target_ceiling_minor: 10,
            subset_limit: 1 << 20,
        };
        let result = optimize(vec![coupon(3000), coupon(2000)], 5000, &bounds);

        assert_eq!(result.selected_total_minor, 5000);
        assert_eq!(result.change_minor, 0);
        assert_eq!(result.rationale, "exact combination: no change");
    }

    #[test]
    fn empty_coupon_list_is_a_trivial_result() {
        let result = optimize(Vec::new(), 5000, &limits());

        assert!(result.selected.is_empty());
        assert_eq!(result.remaining_minor, 5000);
        assert_eq!(result.change_minor, 0);
        assert_eq!(result.rationale, "no coupons applied");
    }

    #[test]
    fn zero_target_selects_nothing() {
        let result = optimize(vec![coupon(1000)], 0, &limits());

        assert!(result.selected.is_empty());
        assert_eq!(result.unused.len(), 1);
        assert_eq!(result.remaining_minor, 0);
    }
}
