//! Token proximity
//!
//! For query tokens `t0..tn` with candidate start offsets `P(i)`, the
//! proximity of a document is the minimum over all choices of one
//! occurrence per token of
//!
//! ```text
//! sum |P(i+1) - P(i) - len(t_i)|
//! ```
//!
//! which is 0 when the tokens appear back to back in query order. The
//! minimizing arrangement doubles as the snippet anchor: one start offset
//! per query token.

/// Compute `(proximity, snippet_positions)`.
///
/// `locations[i]` holds the ascending start offsets of `tokens[i]`.
/// Returns `None` when there are no tokens or some token has no location.
/// Among equally tight arrangements the one with the earliest offsets wins.
pub fn compute_token_proximity<S: AsRef<str>>(
    tokens: &[S],
    locations: &[&[usize]],
) -> Option<(i32, Vec<usize>)> {
    if tokens.is_empty()
        || tokens.len() != locations.len()
        || locations.iter().any(|starts| starts.is_empty())
    {
        return None;
    }

    // cost[i][j]: cheapest arrangement of tokens[..=i] ending at locations[i][j]
    // from[i][j]: occurrence of tokens[i - 1] it was reached from
    let mut cost: Vec<Vec<u64>> = Vec::with_capacity(tokens.len());
    let mut from: Vec<Vec<usize>> = Vec::with_capacity(tokens.len());
    cost.push(vec![0; locations[0].len()]);
    from.push(vec![0; locations[0].len()]);

    for i in 1..tokens.len() {
        let prev_len = tokens[i - 1].as_ref().len() as i64;
        let mut row_cost = Vec::with_capacity(locations[i].len());
        let mut row_from = Vec::with_capacity(locations[i].len());
        for &current in locations[i] {
            let mut best = u64::MAX;
            let mut best_k = 0;
            for (k, &previous) in locations[i - 1].iter().enumerate() {
                let gap = (current as i64 - previous as i64 - prev_len).unsigned_abs();
                let candidate = cost[i - 1][k].saturating_add(gap);
                if candidate < best {
                    best = candidate;
                    best_k = k;
                }
            }
            row_cost.push(best);
            row_from.push(best_k);
        }
        cost.push(row_cost);
        from.push(row_from);
    }

    let last = cost.len() - 1;
    let (mut j, &best) = cost[last]
        .iter()
        .enumerate()
        .min_by_key(|&(idx, c)| (*c, idx))?;

    let mut positions = vec![0; tokens.len()];
    for i in (0..tokens.len()).rev() {
        positions[i] = locations[i][j];
        j = from[i][j];
    }

    Some((i32::try_from(best).unwrap_or(i32::MAX), positions))
}
