/*!
The theory-of-planned-behavior decision rule.

Both consumer decisions (what to do with end-of-life products, and whether to
buy new or used) rank their candidate options by a behavioral intention
score: the weighted sum of a subjective norm (what my neighbors do), a
perceived behavioral control (what each option costs me) and an attitude
(how pro-environmental each option is). The functions here are generic over
the option list; the consumer wires them to the concrete pathways.
*/

use rand::seq::SliceRandom;
use rand::Rng;

/// Subjective norm per option: the fraction of neighbors currently holding
/// that option, scaled by the decision weight. An isolated agent, with no
/// neighbors at all, feels no peer pressure: all entries are zero.
pub fn subjective_norm(held_by_neighbors: &[usize], neighbor_total: usize, weight: f64) -> Vec<f64> {
    if neighbor_total == 0 {
        return vec![0.0; held_by_neighbors.len()];
    }
    held_by_neighbors
        .iter()
        .map(|&count| weight * count as f64 / neighbor_total as f64)
        .collect()
}

/**
Perceived behavioral control per option, understood as a function of the
option's financial cost.

Costs are normalized by the largest absolute cost across options, then every
index in `saturated` has its normalized cost forced to 1 before weighting.
The saturation hook implements the repair/sell capacity condition exactly as
the model defines it: once second-hand demand is exhausted the two resale
pathways are pinned at the full normalized cost. Negative normalized costs
(options that pay the agent) contribute zero rather than a bonus.

When every cost is zero there is nothing to normalize by and control
contributes nothing.
*/
pub fn perceived_behavioral_control(costs: &[f64], saturated: &[usize], weight: f64) -> Vec<f64> {
    let max_cost = costs.iter().fold(0.0f64, |m, c| m.max(c.abs()));
    if max_cost == 0.0 {
        return vec![0.0; costs.len()];
    }
    let mut normalized: Vec<f64> = costs.iter().map(|c| c / max_cost).collect();
    for &i in saturated {
        normalized[i] = 1.0;
    }
    normalized
        .iter()
        .map(|&c| weight * -c.max(0.0))
        .collect()
}

/// Attitude per option: pro-environmental options receive the agent's
/// attitude level, the others its complement, scaled by the decision weight.
pub fn attitude(pro_environmental: &[bool], level: f64, weight: f64) -> Vec<f64> {
    pro_environmental
        .iter()
        .map(|&pro| weight * if pro { level } else { 1.0 - level })
        .collect()
}

/// Sum the three components into behavioral intentions.
pub fn behavioral_intentions(norm: &[f64], control: &[f64], attitude: &[f64]) -> Vec<f64> {
    norm.iter()
        .zip(control)
        .zip(attitude)
        .map(|((n, c), a)| n + c + a)
        .collect()
}

/**
Pick the option with the highest behavioral intention. Option positions are
shuffled first so that ties between equal intentions do not systematically
favor the earlier option; after the shuffle, the first maximum encountered
wins. The runner-up is returned alongside as a fallback choice.
*/
pub fn select<R: Rng>(intentions: &[f64], rng: &mut R) -> (usize, usize) {
    debug_assert!(!intentions.is_empty());
    let mut order: Vec<usize> = (0..intentions.len()).collect();
    order.shuffle(rng);
    let mut best = order[0];
    for &i in &order[1..] {
        if intentions[i] > intentions[best] {
            best = i;
        }
    }
    if intentions.len() < 2 {
        return (best, best);
    }
    // The runner-up score is the maximum after removing one instance of the
    // best score, so a tie for first place can reappear as the fallback.
    let mut rest: Vec<f64> = intentions.to_vec();
    rest.remove(
        rest.iter()
            .position(|&v| v == intentions[best])
            .unwrap_or(0),
    );
    let second_score = rest.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let mut second = best;
    for &i in &order {
        if intentions[i] == second_score {
            second = i;
            break;
        }
    }
    (best, second)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn isolated_agents_feel_no_peer_pressure() {
        assert_eq!(subjective_norm(&[0, 0, 0], 0, 0.33), vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn norm_is_the_weighted_neighbor_fraction() {
        let norm = subjective_norm(&[1, 3], 4, 0.4);
        assert!((norm[0] - 0.1).abs() < 1e-12);
        assert!((norm[1] - 0.3).abs() < 1e-12);
    }

    #[test]
    fn control_penalizes_the_most_expensive_option_fully() {
        let control = perceived_behavioral_control(&[0.5, 1.0, -0.2], &[], 0.39);
        assert!((control[0] - -0.195).abs() < 1e-12);
        assert!((control[1] - -0.39).abs() < 1e-12);
        // A negative cost is income, which contributes no penalty.
        assert_eq!(control[2], 0.0);
    }

    #[test]
    fn all_zero_costs_contribute_nothing() {
        assert_eq!(
            perceived_behavioral_control(&[0.0, 0.0], &[], 0.39),
            vec![0.0, 0.0]
        );
    }

    #[test]
    fn saturated_options_carry_the_full_penalty() {
        let control = perceived_behavioral_control(&[0.001, -0.2, 1.0], &[0, 1], 0.39);
        assert!((control[0] - -0.39).abs() < 1e-12);
        assert!((control[1] - -0.39).abs() < 1e-12);
    }

    #[test]
    fn selection_finds_the_strict_maximum_regardless_of_seed() {
        for seed in 0..20 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let (best, second) = select(&[0.1, 0.9, 0.3, 0.2], &mut rng);
            assert_eq!(best, 1);
            assert_eq!(second, 2);
        }
    }

    #[test]
    fn tied_maxima_are_both_reachable() {
        let mut seen = [false, false];
        for seed in 0..50 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let (best, _) = select(&[0.5, 0.5, 0.1], &mut rng);
            seen[best] = true;
        }
        assert!(seen[0] && seen[1]);
    }
}
