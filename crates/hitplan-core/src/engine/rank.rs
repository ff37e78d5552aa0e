// Ranking with a risk tie-break inside a tolerance band.
//
// Plans are ordered by net gain (descending), then by enumeration order.
// Adjacent plans whose net gains differ by less than the tolerance are then
// swapped when the earlier one carries more risk, repeatedly, until nothing
// moves. Each swap removes one risk inversion, so the pass terminates.
//
// Two plans only change places by swapping directly, which needs their gains
// within the tolerance. A plan at or below the `limit`-th best gain minus the
// tolerance can never overtake any of the `limit` best, so `top_plans` relaxes
// only the plans above that floor.

use std::cmp::Ordering;

/// What the ranker needs from a plan.
pub trait RankKey {
    fn net_gain(&self) -> f64;
    fn risk(&self) -> f64;
    fn seq(&self) -> u64;
}

fn by_gain_then_seq<T: RankKey>(a: &T, b: &T) -> Ordering {
    b.net_gain()
        .total_cmp(&a.net_gain())
        .then_with(|| a.seq().cmp(&b.seq()))
}

/// Order `plans` in place.
pub fn rank_plans<T: RankKey>(plans: &mut [T], tolerance: f64) {
    plans.sort_by(by_gain_then_seq);
    relax_band(plans, tolerance);
}

fn relax_band<T: RankKey>(plans: &mut [T], tolerance: f64) {
    if tolerance <= 0.0 {
        return;
    }
    loop {
        let mut swapped = false;
        for i in 1..plans.len() {
            let (earlier, later) = (&plans[i - 1], &plans[i]);
            let gap = (earlier.net_gain() - later.net_gain()).abs();
            if gap < tolerance && earlier.risk() > later.risk() {
                plans.swap(i - 1, i);
                swapped = true;
            }
        }
        if !swapped {
            break;
        }
    }
}

/// Number of leading plans (already sorted by gain) that can still finish
/// in the first `limit` places once the band is relaxed.
fn contender_count<T: RankKey>(sorted: &[T], tolerance: f64, limit: usize) -> usize {
    if limit == 0 {
        return 0;
    }
    if sorted.len() <= limit {
        return sorted.len();
    }
    let floor = sorted[limit - 1].net_gain() - tolerance.max(0.0);
    limit
        + sorted[limit..]
            .iter()
            .take_while(|p| p.net_gain() > floor)
            .count()
}

/// Rank and keep the best `limit`. Gives the same leading plans as
/// `rank_plans` over the whole list.
pub fn top_plans<T: RankKey>(mut plans: Vec<T>, tolerance: f64, limit: usize) -> Vec<T> {
    plans.sort_by(by_gain_then_seq);
    plans.truncate(contender_count(&plans, tolerance, limit));
    relax_band(&mut plans, tolerance);
    plans.truncate(limit);
    plans
}
