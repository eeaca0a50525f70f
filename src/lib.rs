/*!
Model Description
=================

# 1. Purpose

This model simulates how a population of economic actors adopts circular
economy strategies for an aging product stock. Consumers dispose of
end-of-life products through one of five pathways (repair, sell, recycle,
landfill, hoard) and choose between new and second-hand purchases; both
decisions follow the theory of planned behavior, ranking options by peer
adoption, perceived cost and pro-environmental attitude. Recyclers and
refurbishers process the routed volumes and get cheaper with experience,
while producers form industrial-symbiosis relations through trust and
knowledge diffusion, which determines how much recovered material flows back
into production. The model exists to explore how policy and techno-economic
levers shift those adoption dynamics over multi-decade horizons.

# 2. Entities and scales

Agents live on a fixed undirected graph built from three disjoint
components: a consumer network, a producer+recycler network and a complete
refurbisher network. Node identifiers form one contiguous namespace in role
order, so the role of an agent is a function of its identifier range. One
time step corresponds to one year.

# 3. Scheduling

Each step first snapshots the observable state into the report history (so a
record describes the state as of the end of the previous step), then updates
every consumer, then every recycler, producer and refurbisher, each role in
creation order, and finally advances the clock. The whole update is
single-threaded and deterministic for a fixed seed.
*/

use std::mem;

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde_derive::{Deserialize, Serialize};
use tracing::{debug, info};

pub mod consumer;
pub mod diffusion;
pub mod distances;
pub mod learning;
pub mod matrix;
pub mod network;
pub mod observation;
pub mod parameters;
pub mod producer;
pub mod recycler;
pub mod refurbisher;
pub mod tpb;


pub use crate::consumer::{Consumer, DecisionInputs, EolPathway, PurchaseChoice};
pub use crate::learning::learning_curve;
pub use crate::matrix::SquareMatrix;
pub use crate::network::{NodeId, PopulationGraph, Topology};
pub use crate::parameters::{Bounds, ConfigError, Material, Parameters, TriangularParams};
pub use crate::producer::Producer;
pub use crate::recycler::Recycler;
pub use crate::refurbisher::Refurbisher;

/// Discrete model time, in years since the start of the run.
pub type Steps = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Consumer,
    Recycler,
    Producer,
    Refurbisher,
}

/**
Product failure per cohort, Weibull-shaped in cohort age.

`number_product` holds one quantity per installation cohort, oldest first;
the oldest cohort of the configured initial series is `initial length - 1`
years old at step 0. Cohorts appended during the run reach a positive age
one step after their installation, so a freshly appended cohort contributes
no waste yet.
*/
pub fn waste_generation(
    p: &Parameters,
    clock: Steps,
    failure_rate: f64,
    number_product: &[f64],
) -> Vec<f64> {
    let newest_initial = p.total_number_product.len() as f64 - 1.0;
    number_product
        .iter()
        .enumerate()
        .map(|(z, quantity)| {
            let age = f64::from(clock) + newest_initial - z as f64;
            if age <= 0.0 {
                0.0
            } else {
                quantity * (1.0 - (-(age / p.product_lifetime).powf(failure_rate)).exp())
            }
        })
        .collect()
}

/**
The whole model state: the population graph with its precomputed
neighborhoods, the four role populations, the shared trust and willingness
matrices over the industrial (recycler+producer) index space, the running
totals of the current step, and the collected report history.

The shared matrices are owned here and only ever reached through the model,
never aliased into agents.
*/
pub struct Model {
    p: Parameters,
    graph: PopulationGraph,
    /// Consumer index -> indices of its consumer neighbors.
    consumer_neighbors: Vec<Vec<usize>>,
    /// Industrial matrix index (recyclers first, then producers) -> sorted
    /// industrial matrix indices of its graph neighbors.
    industrial_neighbors: Vec<Vec<usize>>,
    pub consumers: Vec<Consumer>,
    pub recyclers: Vec<Recycler>,
    pub producers: Vec<Producer>,
    pub refurbishers: Vec<Refurbisher>,
    trust: SquareMatrix,
    willingness: SquareMatrix,
    pub clock: Steps,
    /// End-of-life volume generated by all consumers this step.
    pub total_waste: f64,
    /// Lifetime volume of second-hand purchases.
    pub volume_used_purchased: f64,
    /// Repairable volume triaged out by recyclers this step.
    pub recycler_repairable_waste: f64,
    /// Volume refurbished this step.
    pub total_refurbished: f64,
    /// The `[min, max, avg]` transportation surcharge folded into the
    /// recycling cost triple at construction, kept for inspection.
    pub transportation_surcharge: [f64; 3],
    pub history: Vec<observation::StepRecord>,
    rng: ChaCha8Rng,
}

impl Model {
    pub fn new(p: Parameters) -> Result<Model, ConfigError> {
        p.validate()?;
        let mut rng = ChaCha8Rng::seed_from_u64(p.seed);

        let graph = network::build_population_graph(&p, &mut rng)?;
        let all_neighbors = network::neighbor_lists(&graph);
        let consumer_neighbors: Vec<Vec<usize>> = all_neighbors[..p.num_consumers].to_vec();
        let industrial_neighbors: Vec<Vec<usize>> = all_neighbors
            [p.num_consumers..p.num_consumers + p.num_prod_n_recyc()]
            .iter()
            .map(|list| list.iter().map(|&id| id - p.num_consumers).collect())
            .collect();

        let n_industrial = p.num_prod_n_recyc();
        let mut trust =
            SquareMatrix::fill_with(n_industrial, || p.init_trust_bounds.sample(&mut rng));
        trust.fill_diagonal(0.0);
        let willingness = SquareMatrix::zeros(n_industrial);

        let distance_summary = p.region_distances.summary_to_nearest(&p.recycling_regions)?;
        let mut transportation_surcharge = [0.0; 3];
        for (slot, distance) in transportation_surcharge.iter_mut().zip(&distance_summary) {
            *slot = distance * p.transportation_cost_rate / 1e3 * p.product_average_weight;
        }
        let recycling_cost_params = p.original_recycling_cost.shifted(transportation_surcharge);

        let consumers: Vec<Consumer> = (0..p.num_consumers)
            .map(|_| Consumer::new(&mut rng, &p))
            .collect();
        let recyclers: Vec<Recycler> = (0..p.num_recyclers)
            .map(|_| Recycler::new(&mut rng, &p, recycling_cost_params))
            .collect();
        let producers: Vec<Producer> = (0..p.num_producers)
            .map(|k| Producer::new(&mut rng, &p, trust.row(p.num_recyclers + k)))
            .collect();
        let refurbishers: Vec<Refurbisher> = (0..p.num_refurbishers)
            .map(|_| Refurbisher::new(&mut rng, &p))
            .collect();

        info!(
            consumers = consumers.len(),
            recyclers = recyclers.len(),
            producers = producers.len(),
            refurbishers = refurbishers.len(),
            "population initialized"
        );

        Ok(Model {
            p,
            graph,
            consumer_neighbors,
            industrial_neighbors,
            consumers,
            recyclers,
            producers,
            refurbishers,
            trust,
            willingness,
            clock: 0,
            total_waste: 0.0,
            volume_used_purchased: 0.0,
            recycler_repairable_waste: 0.0,
            total_refurbished: 0.0,
            transportation_surcharge,
            history: vec![],
            rng,
        })
    }

    /// Advance the model by one step: collect a report of the settled state,
    /// then update every role in order.
    pub fn advance(&mut self) {
        self.total_refurbished = 0.0;
        self.recycler_repairable_waste = 0.0;
        self.total_waste = 0.0;
        let record = observation::collect(self);
        self.history.push(record);

        self.update_consumers();
        self.update_recyclers();
        self.update_producers();
        self.update_refurbishers();

        self.clock += 1;
        debug!(
            clock = self.clock,
            total_waste = self.total_waste,
            refurbished = self.total_refurbished,
            "step complete"
        );
    }

    /// Drive the model for a fixed number of steps.
    pub fn run(&mut self, steps: Steps) {
        for _ in 0..steps {
            self.advance();
        }
    }

    /**
    Consumer phase, in two passes. First every stock ages and this step's
    end-of-life volumes are settled, so that the resale feasibility ratio is
    computed from the complete waste total. Then every consumer decides,
    with subjective norms read from a snapshot of the choices as they stood
    at the end of the previous step: no consumer observes a neighbor's
    current-step choice.
    */
    fn update_consumers(&mut self) {
        let mut consumers = mem::take(&mut self.consumers);
        for c in consumers.iter_mut() {
            c.update_stock(self.clock, &self.p);
            self.total_waste += c.eol_volume;
        }

        let eol_choices: Vec<EolPathway> = consumers.iter().map(|c| c.eol_pathway).collect();
        let purchase_choices: Vec<PurchaseChoice> =
            consumers.iter().map(|c| c.purchase_choice).collect();
        let volume_on_sale: f64 = consumers
            .iter()
            .filter(|c| c.eol_pathway == EolPathway::Sell)
            .map(|c| c.eol_volume)
            .sum();
        let volume_refurbished: f64 = self.refurbishers.iter().map(|f| f.refurbished_volume).sum();
        let resale_saturated =
            volume_on_sale + volume_refurbished > self.p.repairability * self.total_waste;

        for (i, c) in consumers.iter_mut().enumerate() {
            let inputs = DecisionInputs {
                neighbors: &self.consumer_neighbors[i],
                eol_choices: &eol_choices,
                purchase_choices: &purchase_choices,
                recycling_cost: self.recyclers[c.recycler].recycling_cost,
                repairing_cost: self.refurbishers[c.refurbisher].repairing_cost,
                second_hand_price: self.refurbishers[c.refurbisher].second_hand_price,
                resale_saturated,
            };
            c.decide(
                &inputs,
                &self.p,
                &mut self.rng,
                &mut self.volume_used_purchased,
            );
        }
        self.consumers = consumers;
    }

    /// Recycler phase: triage and cost refresh first, then knowledge
    /// diffusion in creation order, each agent reading the current mix of
    /// already- and not-yet-updated peers.
    fn update_recyclers(&mut self) {
        let mut recyclers = mem::take(&mut self.recyclers);
        for (i, r) in recyclers.iter_mut().enumerate() {
            let repairable = r.triage(
                i,
                &self.consumers,
                self.p.repairability,
                self.total_waste,
                self.recycler_repairable_waste,
            );
            self.recycler_repairable_waste += repairable;
            r.recycling_cost = learning_curve(
                r.original_recycling_volume,
                r.recycling_volume,
                r.original_recycling_cost,
                self.p.recycling_learning_shape_factor,
            );
        }
        let n_recyclers = recyclers.len();
        for i in 0..n_recyclers {
            let own = recyclers[i].knowledge;
            let influencability = recyclers[i].social_influencability;
            let updated = {
                let producers = &self.producers;
                let recyclers = &recyclers;
                let knowledge_of = |j: usize| {
                    if j < n_recyclers {
                        recyclers[j].knowledge
                    } else {
                        producers[j - n_recyclers].knowledge
                    }
                };
                diffusion::updated_knowledge(
                    &mut self.rng,
                    &self.trust,
                    i,
                    own,
                    influencability,
                    self.p.trust_threshold,
                    &self.industrial_neighbors[i],
                    knowledge_of,
                )
            };
            recyclers[i].knowledge = updated;
        }
        self.recyclers = recyclers;
    }

    /// Producer phase: trust, knowledge, acceptance, willingness and
    /// recovered material, agent by agent in creation order.
    fn update_producers(&mut self) {
        let mut producers = mem::take(&mut self.producers);
        let n_recyclers = self.p.num_recyclers;
        for k in 0..producers.len() {
            let own = n_recyclers + k;
            let influencability = producers[k].social_influencability;

            diffusion::trust_row_update(
                &mut self.rng,
                &mut self.trust,
                &mut producers[k].trust_history,
                own,
                &self.industrial_neighbors,
                influencability,
                self.p.social_event_bounds,
                self.clock,
            );

            let before = producers[k].knowledge;
            let updated = {
                let recyclers = &self.recyclers;
                let producers = &producers;
                let knowledge_of = |j: usize| {
                    if j < n_recyclers {
                        recyclers[j].knowledge
                    } else {
                        producers[j - n_recyclers].knowledge
                    }
                };
                diffusion::updated_knowledge(
                    &mut self.rng,
                    &self.trust,
                    own,
                    before,
                    influencability,
                    self.p.trust_threshold,
                    &self.industrial_neighbors[own],
                    knowledge_of,
                )
            };
            producers[k].knowledge_t = before;
            producers[k].knowledge = updated;

            let engaged_fraction = {
                let recyclers = &self.recyclers;
                let producers = &producers;
                diffusion::symbiotic_neighbor_fraction(&self.industrial_neighbors[own], |j| {
                    if j < n_recyclers {
                        recyclers[j].symbiosis
                    } else {
                        producers[j - n_recyclers].symbiosis
                    }
                })
            };
            let knowledge_delta = producers[k].knowledge - producers[k].knowledge_t;
            producers[k].acceptance = diffusion::clamp_unit(
                producers[k].acceptance
                    + influencability * engaged_fraction
                    + producers[k].self_confidence * knowledge_delta,
            );
            producers[k].knowledge_t = producers[k].knowledge;

            let mut synergies = 0;
            for &j in &self.industrial_neighbors[own] {
                if self.trust.get(own, j) >= self.p.trust_threshold
                    && producers[k].knowledge > self.p.knowledge_threshold
                {
                    self.willingness.set(own, j, producers[k].acceptance);
                    synergies += 1;
                }
            }
            if synergies > 0 {
                producers[k].symbiosis = true;
            }

            let material = &self.p.materials[producers[k].material];
            let mut recovered = 0.0;
            for &j in &self.industrial_neighbors[own] {
                let neighbor_volume = if j < n_recyclers {
                    self.recyclers[j].recycling_volume
                } else {
                    0.0
                };
                if material.established_market
                    || self.willingness.get(own, j) >= self.p.willingness_threshold
                {
                    recovered +=
                        material.mass_fraction * neighbor_volume * self.p.product_average_weight;
                }
            }
            producers[k].recycled_material_volume += recovered;
            producers[k].recycled_material_value =
                producers[k].material_price * producers[k].recycled_material_volume;
        }
        self.producers = producers;
    }

    /// Refurbisher phase: absorb repairs and the recyclers' repairable
    /// split, then refresh the repairing cost.
    fn update_refurbishers(&mut self) {
        let mut refurbishers = mem::take(&mut self.refurbishers);
        for (i, f) in refurbishers.iter_mut().enumerate() {
            let refurbished =
                f.collect_repairs(i, &self.consumers, &self.recyclers, self.p.num_refurbishers);
            self.total_refurbished += refurbished;
            f.repairing_cost = learning_curve(
                f.original_repairing_volume,
                f.refurbished_volume,
                f.original_repairing_cost,
                self.p.repairing_learning_shape_factor,
            );
        }
        self.refurbishers = refurbishers;
    }

    pub fn parameters(&self) -> &Parameters {
        &self.p
    }

    pub fn graph(&self) -> &PopulationGraph {
        &self.graph
    }

    pub fn trust(&self) -> &SquareMatrix {
        &self.trust
    }

    pub fn willingness(&self) -> &SquareMatrix {
        &self.willingness
    }

    pub fn year(&self) -> u32 {
        self.p.base_year + self.clock
    }

    /// The role an agent identifier belongs to.
    pub fn role_of(&self, id: usize) -> Role {
        if id < self.p.num_consumers {
            Role::Consumer
        } else if id < self.p.num_consumers + self.p.num_recyclers {
            Role::Recycler
        } else if id < self.p.num_consumers + self.p.num_prod_n_recyc() {
            Role::Producer
        } else {
            Role::Refurbisher
        }
    }

    /// How many consumers currently follow the given disposal pathway.
    pub fn count_eol_adoption(&self, pathway: EolPathway) -> usize {
        self.consumers
            .iter()
            .filter(|c| c.eol_pathway == pathway)
            .count()
    }

    /// Aggregate view of the current state, independent of the collected
    /// history.
    pub fn report(&self) -> observation::ModelReport {
        observation::model_report(self)
    }

    /// Per-agent view of the current state.
    pub fn agent_reports(&self) -> Vec<observation::AgentReport> {
        observation::agent_reports(self)
    }
}
