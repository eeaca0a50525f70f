/*!
Refurbishers repair what consumers route to them, absorb the repairable
share triaged out by recyclers, and sell the result on the second-hand
market at a fixed markdown of the first-hand price. Repairing gets cheaper
with throughput on the same experience curve recyclers use.
*/

use rand::Rng;

use crate::consumer::{Consumer, EolPathway};
use crate::parameters::Parameters;
use crate::recycler::Recycler;

pub struct Refurbisher {
    /// Current unit cost, $/Wp, refreshed by the learning curve.
    pub repairing_cost: f64,
    pub original_repairing_cost: f64,
    /// Baseline yearly throughput anchoring the learning curve, Wp.
    pub original_repairing_volume: f64,
    /// Fixed price of a refurbished unit, $/Wp.
    pub second_hand_price: f64,
    /// Volume refurbished this step.
    pub refurbished_volume: f64,
}

impl Refurbisher {
    pub fn new<R: Rng>(rng: &mut R, p: &Parameters) -> Refurbisher {
        let original_repairing_cost = p.original_repairing_cost.sample(rng);
        Refurbisher {
            repairing_cost: original_repairing_cost,
            original_repairing_cost,
            original_repairing_volume: p.original_repairing_volume * 1e6,
            second_hand_price: p.second_hand_price_rate.sample(rng) * p.first_hand_price,
            refurbished_volume: 0.0,
        }
    }

    /// This step's refurbished volume: repairs from linked consumers plus an
    /// equal share of the repairable volume all recyclers triaged out.
    /// Returns the volume so the caller can advance the population total.
    pub fn collect_repairs(
        &mut self,
        own_index: usize,
        consumers: &[Consumer],
        recyclers: &[Recycler],
        num_refurbishers: usize,
    ) -> f64 {
        let from_consumers: f64 = consumers
            .iter()
            .filter(|c| c.refurbisher == own_index && c.eol_pathway == EolPathway::Repair)
            .map(|c| c.eol_volume)
            .sum();
        let from_recyclers: f64 = recyclers.iter().map(|r| r.repairable_volume).sum();
        self.refurbished_volume = from_consumers + from_recyclers / num_refurbishers as f64;
        self.refurbished_volume
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn second_hand_price_is_a_markdown_of_the_first_hand_price() {
        let p = Parameters::default();
        let mut rng = ChaCha8Rng::seed_from_u64(43);
        for _ in 0..100 {
            let f = Refurbisher::new(&mut rng, &p);
            assert!(f.second_hand_price <= p.first_hand_price);
            assert!(f.second_hand_price >= 0.4 * p.first_hand_price);
        }
    }

    #[test]
    fn repairable_recycler_volume_is_shared_evenly() {
        let p = Parameters::default();
        let mut rng = ChaCha8Rng::seed_from_u64(47);
        let mut f = Refurbisher::new(&mut rng, &p);
        let mut recyclers: Vec<Recycler> = (0..4)
            .map(|_| Recycler::new(&mut rng, &p, p.original_recycling_cost))
            .collect();
        for r in recyclers.iter_mut() {
            r.repairable_volume = 30.0;
        }
        let volume = f.collect_repairs(0, &[], &recyclers, 3);
        assert!((volume - 40.0).abs() < 1e-9);
    }
}
