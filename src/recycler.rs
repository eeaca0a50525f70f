/*!
Recyclers collect the end-of-life volume their linked consumers send down the
recycling pathway, split off what is still repairable while second-hand
demand remains, and get cheaper with accumulated throughput.
*/

use rand::Rng;

use crate::consumer::{Consumer, EolPathway};
use crate::parameters::{Parameters, TriangularParams};
use crate::waste_generation;

pub struct Recycler {
    /// Current unit cost, $/Wp, refreshed by the learning curve.
    pub recycling_cost: f64,
    pub original_recycling_cost: f64,
    /// Baseline yearly throughput the learning curve is anchored to,
    /// derived from historical waste volumes.
    pub original_recycling_volume: f64,
    /// Volume actually recycled this step.
    pub recycling_volume: f64,
    /// Volume triaged out for refurbishment this step.
    pub repairable_volume: f64,
    /// Lifetime sum of triaged repairable volume.
    pub total_repairable_volume: f64,
    pub social_influencability: f64,
    pub knowledge: f64,
    /// Recyclers never initiate symbiotic exchanges themselves; the flag
    /// exists because producers read it off their neighbors.
    pub symbiosis: bool,
}

impl Recycler {
    /// `recycling_cost_params` is the configured cost triple with the
    /// transportation surcharge already folded in.
    pub fn new<R: Rng>(
        rng: &mut R,
        p: &Parameters,
        recycling_cost_params: TriangularParams,
    ) -> Recycler {
        let original_recycling_cost = recycling_cost_params.sample(rng);
        // The baseline throughput assumes this facility's share of the
        // historical installations failing at the high end of the failure
        // distribution, of which only the non-repairable recycled fraction
        // ever reached a recycler.
        let historical_share: Vec<f64> = p
            .total_number_product
            .iter()
            .map(|x| x / p.num_recyclers as f64 * 1e6)
            .collect();
        let historical_waste: f64 = waste_generation(p, 0, p.failure_rate.high, &historical_share)
            .iter()
            .sum();
        let original_recycling_volume =
            (1.0 - p.repairability) * p.original_fraction_recycled_waste * historical_waste;
        Recycler {
            recycling_cost: original_recycling_cost,
            original_recycling_cost,
            original_recycling_volume,
            recycling_volume: 0.0,
            repairable_volume: 0.0,
            total_repairable_volume: 0.0,
            social_influencability: p.social_influencability_bounds.sample(rng),
            knowledge: rng.gen(),
            symbiosis: false,
        }
    }

    /**
    Collect this step's waste from linked consumers on the recycling pathway
    and triage it. While the population-wide repairable volume routed to
    recyclers stays below the repairable share of this step's total waste,
    the repairable fraction is split off for refurbishers; afterwards
    everything goes straight to recycling.

    Returns the repairable volume so the caller can advance the
    population-wide counter.
    */
    pub fn triage(
        &mut self,
        own_index: usize,
        consumers: &[Consumer],
        repairability: f64,
        total_waste: f64,
        repairable_so_far: f64,
    ) -> f64 {
        let collected: f64 = consumers
            .iter()
            .filter(|c| c.recycler == own_index && c.eol_pathway == EolPathway::Recycle)
            .map(|c| c.eol_volume)
            .sum();
        if repairable_so_far < repairability * total_waste {
            self.recycling_volume = (1.0 - repairability) * collected;
            self.repairable_volume = collected - self.recycling_volume;
        } else {
            self.recycling_volume = collected;
            self.repairable_volume = 0.0;
        }
        self.total_repairable_volume += self.repairable_volume;
        self.repairable_volume
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn recycler_with_two_consumers() -> (Recycler, Vec<Consumer>) {
        let p = Parameters::default();
        let mut rng = ChaCha8Rng::seed_from_u64(31);
        let recycler = Recycler::new(&mut rng, &p, p.original_recycling_cost);
        let mut consumers: Vec<Consumer> = (0..2).map(|_| Consumer::new(&mut rng, &p)).collect();
        for (i, c) in consumers.iter_mut().enumerate() {
            c.recycler = i % 2;
            c.eol_pathway = EolPathway::Recycle;
            c.eol_volume = 100.0;
        }
        (recycler, consumers)
    }

    #[test]
    fn triage_conserves_collected_volume() {
        let (mut recycler, consumers) = recycler_with_two_consumers();
        let repairable = recycler.triage(0, &consumers, 0.55, 200.0, 0.0);
        assert!((recycler.recycling_volume + recycler.repairable_volume - 100.0).abs() < 1e-9);
        assert!((repairable - 55.0).abs() < 1e-9);
        assert!((recycler.recycling_volume - 45.0).abs() < 1e-9);
    }

    #[test]
    fn triage_stops_splitting_once_demand_is_covered() {
        let (mut recycler, consumers) = recycler_with_two_consumers();
        // The population-wide repairable volume already exceeds the
        // repairable share of this step's waste.
        let repairable = recycler.triage(0, &consumers, 0.55, 200.0, 150.0);
        assert_eq!(repairable, 0.0);
        assert!((recycler.recycling_volume - 100.0).abs() < 1e-9);
    }

    #[test]
    fn unlinked_consumers_are_ignored() {
        let (mut recycler, mut consumers) = recycler_with_two_consumers();
        for c in consumers.iter_mut() {
            c.eol_pathway = EolPathway::Landfill;
        }
        recycler.triage(0, &consumers, 0.55, 200.0, 0.0);
        assert_eq!(recycler.recycling_volume, 0.0);
        assert_eq!(recycler.repairable_volume, 0.0);
    }

    #[test]
    fn baseline_volume_is_positive_for_default_parameters() {
        let p = Parameters::default();
        let mut rng = ChaCha8Rng::seed_from_u64(37);
        let r = Recycler::new(&mut rng, &p, p.original_recycling_cost);
        assert!(r.original_recycling_volume > 0.0);
    }
}
