/*!
Producers source recovered material from the industrial network. Each one
keeps its own historical view of the trust relation, diffuses knowledge and
acceptance of industrial symbiosis, and marks its willingness toward
specific partners; recovered volume then flows either through an established
secondary market or through partners it has become willing to trade with.
*/

use rand::Rng;

use crate::parameters::Parameters;

pub struct Producer {
    /// This producer's historical average of its outgoing trust row,
    /// advanced as a step-weighted running mean.
    pub trust_history: Vec<f64>,
    pub social_influencability: f64,
    pub knowledge: f64,
    /// Knowledge before the latest update, for the acceptance dynamics.
    pub knowledge_t: f64,
    pub acceptance: f64,
    pub self_confidence: f64,
    /// Latches once any partner passes the trust and knowledge gates.
    pub symbiosis: bool,
    /// Index into the configured material list.
    pub material: usize,
    /// Sampled secondary-market price of that material, $/kg.
    pub material_price: f64,
    /// Lifetime recovered material, kg.
    pub recycled_material_volume: f64,
    /// Lifetime recovered material value, $.
    pub recycled_material_value: f64,
}

impl Producer {
    /// `initial_trust_row` is this producer's row of the freshly
    /// initialized trust matrix; its historical view starts from there.
    pub fn new<R: Rng>(rng: &mut R, p: &Parameters, initial_trust_row: &[f64]) -> Producer {
        let material = rng.gen_range(0..p.materials.len());
        let knowledge: f64 = rng.gen();
        Producer {
            trust_history: initial_trust_row.to_vec(),
            social_influencability: p.social_influencability_bounds.sample(rng),
            knowledge,
            knowledge_t: knowledge,
            acceptance: 0.0,
            self_confidence: p.self_confidence_bounds.sample(rng),
            symbiosis: false,
            material,
            material_price: p.materials[material].price.sample(rng),
            recycled_material_volume: 0.0,
            recycled_material_value: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn producers_start_neutral() {
        let p = Parameters::default();
        let mut rng = ChaCha8Rng::seed_from_u64(41);
        let row = vec![0.3; p.num_prod_n_recyc()];
        let producer = Producer::new(&mut rng, &p, &row);
        assert_eq!(producer.acceptance, 0.0);
        assert!(!producer.symbiosis);
        assert_eq!(producer.trust_history, row);
        assert!((0.0..=1.0).contains(&producer.knowledge));
        assert!(producer.material < p.materials.len());
        let price = p.materials[producer.material].price;
        assert!(producer.material_price >= price.low && producer.material_price <= price.high);
    }
}
