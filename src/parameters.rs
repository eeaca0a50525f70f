use rand::Rng;
use rand_distr::{Distribution, Triangular};
use serde_derive::{Deserialize, Serialize};
use thiserror::Error;

use crate::distances::DistanceTable;
use crate::network::Topology;

/// Everything that can go wrong while assembling a model from parameters.
/// Construction fails fast; once a model exists, stepping it is total.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("node degree {degree} must be smaller than the population size {nodes}")]
    DegreeTooLarge { degree: usize, nodes: usize },
    #[error("scale-free attachment degree must be at least 1, got {degree}")]
    ZeroAttachmentDegree { degree: usize },
    #[error("population of {role} agents must not be empty")]
    EmptyPopulation { role: &'static str },
    #[error("the initial product series must not be empty")]
    EmptyProductSeries,
    #[error("the material list must not be empty")]
    EmptyMaterials,
    #[error("triangular triple {name} must satisfy low <= mode <= high and low < high, got [{low}, {high}, {mode}]")]
    MalformedTriangular {
        name: &'static str,
        low: f64,
        high: f64,
        mode: f64,
    },
    #[error("bounds {name} must satisfy low <= high, got [{low}, {high}]")]
    MalformedBounds {
        name: &'static str,
        low: f64,
        high: f64,
    },
    #[error("parameter {name} must be positive, got {value}")]
    NonpositiveParameter { name: &'static str, value: f64 },
    #[error("parameter {name} must lie in [0, 1], got {value}")]
    RateOutOfRange { name: &'static str, value: f64 },
    #[error("region {region} does not appear in the distance table")]
    UnknownRegion { region: String },
    #[error("no recycling regions were given")]
    NoRecyclingRegions,
    #[error("malformed distance table: {reason}")]
    MalformedDistanceTable { reason: &'static str },
}

/// A `[low, high, mode]` triple describing a triangular distribution, the
/// parameterization used for every sampled cost and rate.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TriangularParams {
    pub low: f64,
    pub high: f64,
    pub mode: f64,
}

impl TriangularParams {
    pub fn new(low: f64, high: f64, mode: f64) -> TriangularParams {
        TriangularParams { low, high, mode }
    }

    pub fn validate(&self, name: &'static str) -> Result<(), ConfigError> {
        if !(self.low <= self.mode && self.mode <= self.high && self.low < self.high) {
            return Err(ConfigError::MalformedTriangular {
                name,
                low: self.low,
                high: self.high,
                mode: self.mode,
            });
        }
        Ok(())
    }

    pub fn sample<R: Rng>(&self, rng: &mut R) -> f64 {
        match Triangular::new(self.low, self.high, self.mode) {
            Ok(d) => d.sample(rng),
            // Validated parameter sets never reach this arm.
            Err(_) => self.mode,
        }
    }

    /// Shift the whole triple by a `[low, high, mode]` surcharge, as done
    /// when transportation is folded into the recycling cost.
    pub fn shifted(&self, addend: [f64; 3]) -> TriangularParams {
        TriangularParams {
            low: self.low + addend[0],
            high: self.high + addend[1],
            mode: self.mode + addend[2],
        }
    }
}

/// A closed interval to draw uniformly from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Bounds {
    pub low: f64,
    pub high: f64,
}

impl Bounds {
    pub fn new(low: f64, high: f64) -> Bounds {
        Bounds { low, high }
    }

    pub fn validate(&self, name: &'static str) -> Result<(), ConfigError> {
        if self.low > self.high {
            return Err(ConfigError::MalformedBounds {
                name,
                low: self.low,
                high: self.high,
            });
        }
        Ok(())
    }

    pub fn sample<R: Rng>(&self, rng: &mut R) -> f64 {
        if self.low == self.high {
            self.low
        } else {
            rng.gen_range(self.low..self.high)
        }
    }
}

/// A material recovered from end-of-life products.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Material {
    pub name: String,
    /// Share of the product mass made up by this material.
    pub mass_fraction: f64,
    /// Whether industry already absorbs the recycled material, in which case
    /// recovered volumes bypass the symbiosis formation process.
    pub established_market: bool,
    /// Secondary market price, $/kg.
    pub price: TriangularParams,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Parameters {
    pub num_consumers: usize,
    pub consumers_node_degree: usize,
    pub consumers_network_type: Topology,
    pub num_recyclers: usize,
    pub num_producers: usize,
    pub prod_n_recyc_node_degree: usize,
    pub prod_n_recyc_network_type: Topology,
    pub num_refurbishers: usize,
    /// Share of the population starting out on the recycling pathway.
    pub init_eol_rate: f64,
    /// Installed product quantity per historical year, MWp for the whole
    /// population; divided among consumers at creation.
    pub total_number_product: Vec<f64>,
    /// Piecewise yearly growth of the product stock, early then late rate.
    pub product_growth: [f64; 2],
    /// Weibull shape of the product failure function.
    pub failure_rate: TriangularParams,
    /// $/Wp.
    pub hoarding_cost: TriangularParams,
    /// $/Wp.
    pub landfill_cost: TriangularParams,
    /// Decision weights for disposing of end-of-life products: subjective
    /// norm, perceived behavioral control and attitude.
    pub w_sn_eol: f64,
    pub w_pbc_eol: f64,
    pub w_a_eol: f64,
    /// The same three weights for the purchase decision.
    pub w_sn_reuse: f64,
    pub w_pbc_reuse: f64,
    pub w_a_reuse: f64,
    /// Average product lifetime in years.
    pub product_lifetime: f64,
    /// $/Wp, before the transportation surcharge.
    pub original_recycling_cost: TriangularParams,
    pub original_fraction_recycled_waste: f64,
    pub recycling_learning_shape_factor: f64,
    /// Share of collected waste that can be made fit for resale.
    pub repairability: f64,
    /// $/Wp.
    pub original_repairing_cost: TriangularParams,
    /// MWp; scaled to Wp at agent creation like the product series.
    pub original_repairing_volume: f64,
    pub repairing_learning_shape_factor: f64,
    /// Second-hand price as a share of the first-hand price.
    pub second_hand_price_rate: TriangularParams,
    /// $/Wp.
    pub first_hand_price: f64,
    pub init_trust_bounds: Bounds,
    pub social_event_bounds: Bounds,
    pub social_influencability_bounds: Bounds,
    pub trust_threshold: f64,
    pub knowledge_threshold: f64,
    pub willingness_threshold: f64,
    pub self_confidence_bounds: Bounds,
    pub materials: Vec<Material>,
    /// kg/Wp.
    pub product_average_weight: f64,
    /// Regions hosting at least one recycling facility.
    pub recycling_regions: Vec<String>,
    /// $/(t km) hauling rate turned into the cost surcharge.
    pub transportation_cost_rate: f64,
    pub region_distances: DistanceTable,
    /// Calendar year of step 0.
    pub base_year: u32,
    pub seed: u64,
}

impl Default for Parameters {
    fn default() -> Parameters {
        Parameters {
            num_consumers: 100,
            consumers_node_degree: 5,
            consumers_network_type: Topology::SmallWorld,
            num_recyclers: 16,
            num_producers: 60,
            prod_n_recyc_node_degree: 5,
            prod_n_recyc_network_type: Topology::SmallWorld,
            num_refurbishers: 15,
            init_eol_rate: 0.14,
            total_number_product: vec![
                44., 44., 44., 44., 44., 44., 44., 160., 289., 435., 849., 1920., 3374., 4766.,
                6244., 7500., 15128., 10608., 10672., 11774.,
            ],
            product_growth: [0.0892, 0.025],
            failure_rate: TriangularParams::new(2.4928, 5.3759, 3.93495),
            hoarding_cost: TriangularParams::new(0.0, 0.01, 0.005),
            landfill_cost: TriangularParams::new(0.003, 0.009, 0.006),
            w_sn_eol: 0.33,
            w_pbc_eol: 0.39,
            w_a_eol: 0.34,
            w_sn_reuse: 0.497,
            w_pbc_reuse: 0.382,
            w_a_reuse: 0.464,
            product_lifetime: 30.0,
            original_recycling_cost: TriangularParams::new(0.027, 0.128, 0.077),
            original_fraction_recycled_waste: 0.14,
            recycling_learning_shape_factor: -0.39,
            repairability: 0.55,
            original_repairing_cost: TriangularParams::new(0.015, 0.208, 0.112),
            original_repairing_volume: 3000.0,
            repairing_learning_shape_factor: -0.31,
            second_hand_price_rate: TriangularParams::new(0.4, 1.0, 0.7),
            first_hand_price: 0.3,
            init_trust_bounds: Bounds::new(-1.0, 1.0),
            social_event_bounds: Bounds::new(-1.0, 1.0),
            social_influencability_bounds: Bounds::new(0.0, 1.0),
            trust_threshold: 0.5,
            knowledge_threshold: 0.5,
            willingness_threshold: 0.5,
            self_confidence_bounds: Bounds::new(0.0, 1.0),
            materials: vec![
                Material {
                    name: "Aluminum".to_string(),
                    mass_fraction: 0.18,
                    established_market: true,
                    price: TriangularParams::new(0.66, 1.98, 1.32),
                },
                Material {
                    name: "Glass".to_string(),
                    mass_fraction: 0.69,
                    established_market: true,
                    price: TriangularParams::new(0.01, 0.06, 0.035),
                },
                Material {
                    name: "Silver".to_string(),
                    mass_fraction: 0.005,
                    established_market: false,
                    price: TriangularParams::new(453.0, 653.0, 582.0),
                },
            ],
            product_average_weight: 0.077,
            recycling_regions: [
                "Texas",
                "Arizona",
                "Oregon",
                "Oklahoma",
                "Wisconsin",
                "Ohio",
                "Kentucky",
                "South Carolina",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            transportation_cost_rate: 0.021761,
            region_distances: DistanceTable::default(),
            base_year: 2020,
            seed: 0,
        }
    }
}

impl Parameters {
    pub fn num_prod_n_recyc(&self) -> usize {
        self.num_recyclers + self.num_producers
    }

    pub fn num_agents(&self) -> usize {
        self.num_consumers + self.num_prod_n_recyc() + self.num_refurbishers
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_consumers == 0 {
            return Err(ConfigError::EmptyPopulation { role: "consumer" });
        }
        if self.num_recyclers == 0 {
            return Err(ConfigError::EmptyPopulation { role: "recycler" });
        }
        if self.num_producers == 0 {
            return Err(ConfigError::EmptyPopulation { role: "producer" });
        }
        if self.num_refurbishers == 0 {
            return Err(ConfigError::EmptyPopulation {
                role: "refurbisher",
            });
        }
        if self.total_number_product.is_empty() {
            return Err(ConfigError::EmptyProductSeries);
        }
        if self.materials.is_empty() {
            return Err(ConfigError::EmptyMaterials);
        }
        self.failure_rate.validate("failure_rate")?;
        self.hoarding_cost.validate("hoarding_cost")?;
        self.landfill_cost.validate("landfill_cost")?;
        self.original_recycling_cost
            .validate("original_recycling_cost")?;
        self.original_repairing_cost
            .validate("original_repairing_cost")?;
        self.second_hand_price_rate
            .validate("second_hand_price_rate")?;
        for material in &self.materials {
            material.price.validate("material price")?;
            if !(0.0..=1.0).contains(&material.mass_fraction) {
                return Err(ConfigError::RateOutOfRange {
                    name: "mass_fraction",
                    value: material.mass_fraction,
                });
            }
        }
        self.init_trust_bounds.validate("init_trust_bounds")?;
        self.social_event_bounds.validate("social_event_bounds")?;
        self.social_influencability_bounds
            .validate("social_influencability_bounds")?;
        self.self_confidence_bounds
            .validate("self_confidence_bounds")?;
        for &(name, value) in [
            ("init_eol_rate", self.init_eol_rate),
            ("repairability", self.repairability),
            (
                "original_fraction_recycled_waste",
                self.original_fraction_recycled_waste,
            ),
        ]
        .iter()
        {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::RateOutOfRange { name, value });
            }
        }
        for &(name, value) in [
            ("product_lifetime", self.product_lifetime),
            ("first_hand_price", self.first_hand_price),
            ("product_average_weight", self.product_average_weight),
        ]
        .iter()
        {
            if value <= 0.0 {
                return Err(ConfigError::NonpositiveParameter { name, value });
            }
        }
        if self.recycling_regions.is_empty() {
            return Err(ConfigError::NoRecyclingRegions);
        }
        // Surfaces unknown region names before any agent is built.
        self.region_distances
            .summary_to_nearest(&self.recycling_regions)?;
        Ok(())
    }
}
