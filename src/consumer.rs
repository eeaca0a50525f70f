/*!
Consumers own an aging product stock, generate end-of-life volume every step,
and route that volume down one of five disposal pathways chosen by the
planned-behavior rule. They also decide whether their next purchase is new or
second-hand, which feeds the demand side of the refurbishment loop.
*/

use rand::seq::SliceRandom;
use rand::Rng;
use rand_distr::{Distribution, SkewNormal};
use serde_derive::{Deserialize, Serialize};

use crate::parameters::Parameters;
use crate::tpb;
use crate::Steps;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EolPathway {
    Repair,
    Sell,
    Recycle,
    Landfill,
    Hoard,
}

impl EolPathway {
    pub const ALL: [EolPathway; 5] = [
        EolPathway::Repair,
        EolPathway::Sell,
        EolPathway::Recycle,
        EolPathway::Landfill,
        EolPathway::Hoard,
    ];

    /// Pathways that keep material in circulation.
    pub fn pro_environmental(self) -> bool {
        matches!(self, EolPathway::Repair | EolPathway::Sell | EolPathway::Recycle)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PurchaseChoice {
    New,
    Used,
}

impl PurchaseChoice {
    pub const ALL: [PurchaseChoice; 2] = [PurchaseChoice::New, PurchaseChoice::Used];
}

/// Positions of the repair and sell entries in the cost vector, the two
/// pathways gated by second-hand demand.
const REPAIR: usize = 0;
const SELL: usize = 1;

/// The product growth rate switches from the early to the late regime after
/// this many steps.
const GROWTH_SWITCH_STEP: Steps = 9;

/// Skew-normal (location, scale, shape) fitted to surveyed
/// pro-environmental orientation, for the disposal attitude.
const EOL_ATTITUDE_DISTRIBUTION: (f64, f64, f64) = (0.6, 0.2, 0.0);
/// Same, fitted to surveyed willingness to pay for remanufactured goods.
const REUSE_ATTITUDE_DISTRIBUTION: (f64, f64, f64) = (0.5, 0.2, 0.42);

fn attitude_level<R: Rng>(rng: &mut R, distribution: (f64, f64, f64)) -> f64 {
    let (location, scale, shape) = distribution;
    let level = match SkewNormal::new(location, scale, shape) {
        Ok(d) => d.sample(rng),
        Err(_) => location,
    };
    level.max(0.0).min(1.0)
}

/// Cross-agent state a consumer reads while deciding. All of it is settled
/// before any consumer of the current step writes its own choice.
pub struct DecisionInputs<'a> {
    /// Graph neighbors, as consumer indices.
    pub neighbors: &'a [usize],
    /// Every consumer's disposal pathway as of the end of the previous step.
    pub eol_choices: &'a [EolPathway],
    /// Every consumer's purchase choice as of the end of the previous step.
    pub purchase_choices: &'a [PurchaseChoice],
    /// Current unit cost at the consumer's recycling facility.
    pub recycling_cost: f64,
    /// Current unit cost at the consumer's refurbisher.
    pub repairing_cost: f64,
    /// Current second-hand price at the consumer's refurbisher.
    pub second_hand_price: f64,
    /// Whether resale demand is already saturated, which pins the repair and
    /// sell cost entries at the full normalized cost.
    pub resale_saturated: bool,
}

pub struct Consumer {
    pub eol_pathway: EolPathway,
    pub purchase_choice: PurchaseChoice,
    /// The runner-up disposal pathway of the latest decision, kept as a
    /// fallback for demand-constrained reallocation.
    pub second_eol_pathway: Option<EolPathway>,
    /// Product cohorts by installation year, oldest first, depleted by
    /// failure. One cohort is appended per step.
    pub number_product: Vec<f64>,
    /// Weibull shape of this consumer's failure function.
    failure_rate: f64,
    /// Cost vector over [repair, sell, recycle, landfill, hoard]. The sell
    /// entry is the negated second-hand price: resale earns money.
    eol_costs: [f64; 5],
    /// Cost pair over [new, used].
    purchase_costs: [f64; 2],
    landfill_cost: f64,
    hoarding_cost: f64,
    attitude_eol: f64,
    attitude_reuse: f64,
    /// End-of-life volume generated this step.
    pub eol_volume: f64,
    /// Index of the recycling facility this consumer always uses.
    pub recycler: usize,
    /// Index of the refurbisher this consumer always uses.
    pub refurbisher: usize,
    pub volume_repaired: f64,
    pub volume_sold: f64,
    pub volume_recycled: f64,
    pub volume_landfilled: f64,
    pub volume_hoarded: f64,
}

impl Consumer {
    pub fn new<R: Rng>(rng: &mut R, p: &Parameters) -> Consumer {
        let eol_pathway = if rng.gen::<f64>() <= p.init_eol_rate {
            EolPathway::Recycle
        } else {
            *[
                EolPathway::Repair,
                EolPathway::Sell,
                EolPathway::Landfill,
                EolPathway::Hoard,
            ]
            .choose(rng)
            .unwrap_or(&EolPathway::Landfill)
        };
        Consumer {
            eol_pathway,
            purchase_choice: PurchaseChoice::New,
            second_eol_pathway: None,
            number_product: p
                .total_number_product
                .iter()
                .map(|x| x / p.num_consumers as f64 * 1e6)
                .collect(),
            failure_rate: p.failure_rate.sample(rng),
            eol_costs: [0.0; 5],
            purchase_costs: [0.0; 2],
            landfill_cost: p.landfill_cost.sample(rng),
            hoarding_cost: p.hoarding_cost.sample(rng),
            attitude_eol: attitude_level(rng, EOL_ATTITUDE_DISTRIBUTION),
            attitude_reuse: attitude_level(rng, REUSE_ATTITUDE_DISTRIBUTION),
            eol_volume: 0.0,
            recycler: rng.gen_range(0..p.num_recyclers),
            refurbisher: rng.gen_range(0..p.num_refurbishers),
            volume_repaired: 0.0,
            volume_sold: 0.0,
            volume_recycled: 0.0,
            volume_landfilled: 0.0,
            volume_hoarded: 0.0,
        }
    }

    /// Grow the stock by one cohort, age every cohort through the failure
    /// function, and turn the failed quantity into this step's end-of-life
    /// volume.
    pub fn update_stock(&mut self, clock: Steps, p: &Parameters) {
        let growth = if clock > GROWTH_SWITCH_STEP {
            p.product_growth[1]
        } else {
            p.product_growth[0]
        };
        let newest = self.number_product.last().copied().unwrap_or(0.0);
        self.number_product.push(newest * (1.0 + growth));
        let waste = crate::waste_generation(p, clock, self.failure_rate, &self.number_product);
        self.eol_volume = waste.iter().sum();
        for (stock, failed) in self.number_product.iter_mut().zip(&waste) {
            *stock -= failed;
        }
    }

    /// Run both planned-behavior decisions and book this step's end-of-life
    /// volume on the chosen pathway.
    pub fn decide<R: Rng>(
        &mut self,
        inputs: &DecisionInputs,
        p: &Parameters,
        rng: &mut R,
        volume_used_purchased: &mut f64,
    ) {
        self.eol_costs = [
            inputs.repairing_cost,
            -inputs.second_hand_price,
            inputs.recycling_cost,
            self.landfill_cost,
            self.hoarding_cost,
        ];
        self.purchase_costs = [p.first_hand_price, inputs.second_hand_price];

        self.purchase_choice = self.choose_purchase(inputs, p, rng);
        if self.purchase_choice == PurchaseChoice::Used {
            *volume_used_purchased += self.eol_volume;
        }

        let (first, second) = self.choose_eol(inputs, p, rng);
        self.eol_pathway = first;
        self.second_eol_pathway = Some(second);
        match first {
            EolPathway::Repair => self.volume_repaired += self.eol_volume,
            EolPathway::Sell => self.volume_sold += self.eol_volume,
            EolPathway::Recycle => self.volume_recycled += self.eol_volume,
            EolPathway::Landfill => self.volume_landfilled += self.eol_volume,
            EolPathway::Hoard => self.volume_hoarded += self.eol_volume,
        }
    }

    fn choose_eol<R: Rng>(
        &self,
        inputs: &DecisionInputs,
        p: &Parameters,
        rng: &mut R,
    ) -> (EolPathway, EolPathway) {
        let mut held = [0usize; 5];
        for &neighbor in inputs.neighbors {
            let choice = inputs.eol_choices[neighbor];
            held[EolPathway::ALL.iter().position(|&o| o == choice).unwrap_or(0)] += 1;
        }
        let norm = tpb::subjective_norm(&held, inputs.neighbors.len(), p.w_sn_eol);
        let saturated: &[usize] = if inputs.resale_saturated {
            &[REPAIR, SELL]
        } else {
            &[]
        };
        let control = tpb::perceived_behavioral_control(&self.eol_costs, saturated, p.w_pbc_eol);
        let pro: Vec<bool> = EolPathway::ALL
            .iter()
            .map(|o| o.pro_environmental())
            .collect();
        let att = tpb::attitude(&pro, self.attitude_eol, p.w_a_eol);
        let intentions = tpb::behavioral_intentions(&norm, &control, &att);
        let (first, second) = tpb::select(&intentions, rng);
        (EolPathway::ALL[first], EolPathway::ALL[second])
    }

    fn choose_purchase<R: Rng>(
        &self,
        inputs: &DecisionInputs,
        p: &Parameters,
        rng: &mut R,
    ) -> PurchaseChoice {
        let mut held = [0usize; 2];
        for &neighbor in inputs.neighbors {
            let choice = inputs.purchase_choices[neighbor];
            held[PurchaseChoice::ALL
                .iter()
                .position(|&o| o == choice)
                .unwrap_or(0)] += 1;
        }
        let norm = tpb::subjective_norm(&held, inputs.neighbors.len(), p.w_sn_reuse);
        let control = tpb::perceived_behavioral_control(&self.purchase_costs, &[], p.w_pbc_reuse);
        let att = tpb::attitude(&[false, true], self.attitude_reuse, p.w_a_reuse);
        let intentions = tpb::behavioral_intentions(&norm, &control, &att);
        let (first, _) = tpb::select(&intentions, rng);
        PurchaseChoice::ALL[first]
    }

    pub fn landfill_cost(&self) -> f64 {
        self.landfill_cost
    }

    pub fn hoarding_cost(&self) -> f64 {
        self.hoarding_cost
    }

    /// Product volume still in operation.
    pub fn stock_in_operation(&self) -> f64 {
        self.number_product.iter().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn attitude_levels_are_clamped_to_the_unit_interval() {
        let mut rng = ChaCha8Rng::seed_from_u64(17);
        for _ in 0..500 {
            let a = attitude_level(&mut rng, EOL_ATTITUDE_DISTRIBUTION);
            let b = attitude_level(&mut rng, REUSE_ATTITUDE_DISTRIBUTION);
            assert!((0.0..=1.0).contains(&a));
            assert!((0.0..=1.0).contains(&b));
        }
    }

    #[test]
    fn stock_update_conserves_material() {
        let p = Parameters::default();
        let mut rng = ChaCha8Rng::seed_from_u64(23);
        let mut c = Consumer::new(&mut rng, &p);
        let before: f64 = c.stock_in_operation();
        let newest = *c.number_product.last().unwrap();
        c.update_stock(0, &p);
        let after = c.stock_in_operation();
        // Stock moves only through growth (one new cohort) and failure.
        let grown = newest * (1.0 + p.product_growth[0]);
        assert!((before + grown - c.eol_volume - after).abs() < 1e-6 * before);
        assert!(c.eol_volume > 0.0);
    }

    #[test]
    fn fresh_cohorts_do_not_fail_yet() {
        let p = Parameters::default();
        let mut rng = ChaCha8Rng::seed_from_u64(29);
        let mut c = Consumer::new(&mut rng, &p);
        c.update_stock(0, &p);
        // The cohort appended this step has nonpositive age.
        let last = *c.number_product.last().unwrap();
        let newest_initial = p.total_number_product[p.total_number_product.len() - 1]
            / p.num_consumers as f64
            * 1e6;
        assert!((last - newest_initial * (1.0 + p.product_growth[0])).abs() < 1e-9);
    }
}
