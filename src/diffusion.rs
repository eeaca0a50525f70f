/*!
Trust and knowledge diffusion across the industrial network.

Producers and recyclers share one index space (recyclers first, producers
after them) over which the model keeps a live trust matrix and a willingness
matrix. Trust moves through reputation among common contacts plus random
social events; knowledge spreads along sufficiently trusted links. Producers
additionally track acceptance of industrial symbiosis and mark willingness
toward specific partners, which is what eventually lets recovered material
flow outside established markets.
*/

use rand::Rng;

use crate::matrix::SquareMatrix;
use crate::parameters::Bounds;
use crate::Steps;

pub fn clamp_unit(value: f64) -> f64 {
    value.max(0.0).min(1.0)
}

pub fn clamp_signed(value: f64) -> f64 {
    value.max(-1.0).min(1.0)
}

/// Common graph neighbors of two members of the industrial index space,
/// excluding the two members themselves. The neighbor lists are sorted, so
/// this is a linear merge.
fn common_neighbors(lists: &[Vec<usize>], i: usize, j: usize) -> Vec<usize> {
    let (a, b) = (&lists[i], &lists[j]);
    let mut common = Vec::new();
    let (mut x, mut y) = (0, 0);
    while x < a.len() && y < b.len() {
        if a[x] == b[y] {
            if a[x] != i && a[x] != j {
                common.push(a[x]);
            }
            x += 1;
            y += 1;
        } else if a[x] < b[y] {
            x += 1;
        } else {
            y += 1;
        }
    }
    common
}

/**
Refresh one agent's outgoing trust row.

For every peer `j`, the new trust is the historical average trust in `j`,
moved by a reputation term and a random social event drawn from the
configured bounds, clamped to [-1, 1]. The reputation term is the agent's
mean live trust toward the contacts it shares with `j`, relative to the
historical trust in `j`, scaled by the agent's social influencability; with
no shared contacts there is no reputation evidence and the term vanishes.

Afterwards the historical row is advanced as a running mean weighted by the
number of completed steps.
*/
#[allow(clippy::too_many_arguments)]
pub fn trust_row_update<R: Rng>(
    rng: &mut R,
    trust: &mut SquareMatrix,
    history: &mut [f64],
    own: usize,
    neighbor_lists: &[Vec<usize>],
    influencability: f64,
    event_bounds: Bounds,
    clock: Steps,
) {
    let n = trust.size();
    for j in 0..n {
        let common = common_neighbors(neighbor_lists, own, j);
        let reputation = if common.is_empty() {
            0.0
        } else {
            let mean = common.iter().map(|&c| trust.get(own, c)).sum::<f64>() / common.len() as f64;
            influencability * (mean - history[j])
        };
        let event = event_bounds.sample(rng);
        trust.set(own, j, clamp_signed(history[j] + reputation + event));
    }
    let weight = f64::from(clock + 1);
    for j in 0..n {
        history[j] = (history[j] * weight + trust.get(own, j)) / (weight + 1.0);
    }
}

/**
One agent's knowledge after a step of social learning: every sufficiently
trusted neighbor pulls the agent's knowledge toward its own with a random
interaction strength, and an independent random increment models the agent's
own learning. The result is clamped to [0, 1].

The interaction strength is drawn for every neighbor, trusted or not, so the
number of draws depends only on the degree.
*/
#[allow(clippy::too_many_arguments)]
pub fn updated_knowledge<R: Rng, F: Fn(usize) -> f64>(
    rng: &mut R,
    trust: &SquareMatrix,
    own: usize,
    own_knowledge: f64,
    influencability: f64,
    trust_threshold: f64,
    neighbors: &[usize],
    knowledge_of: F,
) -> f64 {
    let learning: f64 = rng.gen();
    let mut from_neighbors = 0.0;
    for &j in neighbors {
        let interaction: f64 = rng.gen();
        if trust.get(own, j) >= trust_threshold {
            from_neighbors += interaction * (knowledge_of(j) - own_knowledge);
        }
    }
    clamp_unit(own_knowledge + influencability * from_neighbors + learning)
}

/// The fraction of neighbors currently engaged in a symbiotic exchange;
/// zero for an isolated agent.
pub fn symbiotic_neighbor_fraction<F: Fn(usize) -> bool>(neighbors: &[usize], engaged: F) -> f64 {
    if neighbors.is_empty() {
        return 0.0;
    }
    neighbors.iter().filter(|&&j| engaged(j)).count() as f64 / neighbors.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn no_common_contacts_means_no_reputation_term() {
        // Two nodes with disjoint neighborhoods: the trust movement must be
        // exactly the social event, which a zero-width bound pins to zero.
        let mut trust = SquareMatrix::zeros(4);
        trust.set(0, 2, 0.9);
        let lists = vec![vec![2], vec![3], vec![0], vec![1]];
        let mut history = vec![0.25; 4];
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        trust_row_update(
            &mut rng,
            &mut trust,
            &mut history,
            0,
            &lists,
            1.0,
            Bounds::new(0.0, 0.0),
            0,
        );
        // Node 1 shares no contacts with node 0.
        assert!((trust.get(0, 1) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn trust_stays_in_signed_bounds() {
        let mut trust = SquareMatrix::fill_with(6, || 1.0);
        let lists: Vec<Vec<usize>> = (0..6).map(|i| (0..6).filter(|&j| j != i).collect()).collect();
        let mut history = vec![1.0; 6];
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        trust_row_update(
            &mut rng,
            &mut trust,
            &mut history,
            0,
            &lists,
            1.0,
            Bounds::new(-1.0, 1.0),
            3,
        );
        for j in 0..6 {
            assert!(trust.get(0, j) <= 1.0 && trust.get(0, j) >= -1.0);
            assert!(history[j] <= 1.0 && history[j] >= -1.0);
        }
    }

    #[test]
    fn knowledge_stays_in_unit_bounds() {
        let trust = SquareMatrix::fill_with(3, || 1.0);
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        for _ in 0..50 {
            let k = updated_knowledge(&mut rng, &trust, 0, 0.99, 1.0, 0.5, &[1, 2], |_| 1.0);
            assert!((0.0..=1.0).contains(&k));
        }
    }

    #[test]
    fn untrusted_neighbors_do_not_teach() {
        let trust = SquareMatrix::zeros(3);
        let mut rng = ChaCha8Rng::seed_from_u64(13);
        // All trust is below the threshold: the only movement is the
        // personal learning increment, which is nonnegative.
        let k = updated_knowledge(&mut rng, &trust, 0, 0.5, 1.0, 0.5, &[1, 2], |_| 0.0);
        assert!(k >= 0.5);
    }

    #[test]
    fn symbiotic_fraction_handles_isolation() {
        assert_eq!(symbiotic_neighbor_fraction(&[], |_| true), 0.0);
        assert_eq!(symbiotic_neighbor_fraction(&[1, 2, 3, 4], |j| j % 2 == 0), 0.5);
    }
}
