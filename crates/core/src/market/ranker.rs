//! Ordering of queried candidates.

use std::cmp::Ordering;

use super::cost::total_cost;
use super::CandidateQueryResult;

/// Compare two query results, best candidate first.
///
/// Keys, in order: zero unseal price before non-zero, lower total cost,
/// smaller declared size. Anything else is a tie.
pub fn compare_query_results(a: &CandidateQueryResult, b: &CandidateQueryResult) -> Ordering {
    let a_needs_unseal = !a.response.unseal_price.is_zero();
    let b_needs_unseal = !b.response.unseal_price.is_zero();

    a_needs_unseal
        .cmp(&b_needs_unseal)
        .then_with(|| total_cost(&a.response).cmp(&total_cost(&b.response)))
        .then_with(|| a.response.size.cmp(&b.response.size))
}

/// Order query results for the serial driver.
///
/// With `no_sort` the caller's order is kept as is. The sort is stable, so
/// ties keep their relative order.
pub fn rank_candidates(
    mut results: Vec<CandidateQueryResult>,
    no_sort: bool,
) -> Vec<CandidateQueryResult> {
    if !no_sort {
        results.sort_by(compare_query_results);
    }
    results
}
