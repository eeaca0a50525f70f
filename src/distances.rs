use itertools::{Itertools, MinMaxResult};
use serde_derive::{Deserialize, Serialize};

use crate::parameters::ConfigError;

/**
Pairwise shortest-path distances between named regions.

The table is an external resource: it is computed once, outside the model,
from a region adjacency graph, and consumed read-only here. Its single use is
at construction time, where the distance from every region to its nearest
recycling facility is folded into a transportation surcharge on the recycling
cost.
*/
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistanceTable {
    regions: Vec<String>,
    distances: Vec<Vec<f64>>,
}

impl DistanceTable {
    pub fn new(regions: Vec<String>, distances: Vec<Vec<f64>>) -> Result<DistanceTable, ConfigError> {
        let n = regions.len();
        if distances.len() != n || distances.iter().any(|row| row.len() != n) {
            return Err(ConfigError::MalformedDistanceTable {
                reason: "distance matrix is not square over the region list",
            });
        }
        for i in 0..n {
            for j in 0..n {
                let d = distances[i][j];
                if d < 0.0 || !d.is_finite() {
                    return Err(ConfigError::MalformedDistanceTable {
                        reason: "distances must be finite and nonnegative",
                    });
                }
                if (d - distances[j][i]).abs() > f64::EPSILON {
                    return Err(ConfigError::MalformedDistanceTable {
                        reason: "distance matrix must be symmetric",
                    });
                }
            }
        }
        Ok(DistanceTable { regions, distances })
    }

    pub fn regions(&self) -> &[String] {
        &self.regions
    }

    fn index_of(&self, region: &str) -> Result<usize, ConfigError> {
        self.regions
            .iter()
            .position(|r| r == region)
            .ok_or_else(|| ConfigError::UnknownRegion {
                region: region.to_string(),
            })
    }

    /// For every region, the distance to the closest of the target regions.
    pub fn distances_to_nearest(&self, targets: &[String]) -> Result<Vec<f64>, ConfigError> {
        if targets.is_empty() {
            return Err(ConfigError::NoRecyclingRegions);
        }
        let target_indices: Vec<usize> = targets
            .iter()
            .map(|t| self.index_of(t))
            .collect::<Result<_, _>>()?;
        Ok(self
            .distances
            .iter()
            .map(|row| {
                target_indices
                    .iter()
                    .map(|&j| row[j])
                    .fold(f64::INFINITY, f64::min)
            })
            .collect())
    }

    /// Minimum, maximum and average distance-to-nearest-target over all
    /// regions. These three summary values parameterize the transportation
    /// surcharge triple.
    pub fn summary_to_nearest(&self, targets: &[String]) -> Result<[f64; 3], ConfigError> {
        let nearest = self.distances_to_nearest(targets)?;
        let (min, max) = match nearest.iter().cloned().minmax() {
            MinMaxResult::NoElements => {
                return Err(ConfigError::MalformedDistanceTable {
                    reason: "distance table has no regions",
                })
            }
            MinMaxResult::OneElement(d) => (d, d),
            MinMaxResult::MinMax(min, max) => (min, max),
        };
        let avg = nearest.iter().sum::<f64>() / nearest.len() as f64;
        Ok([min, max, avg])
    }
}

/// A coarse stand-in for the full state adjacency table: a dozen regions with
/// hop distances. Callers with the real table override it wholesale.
impl Default for DistanceTable {
    fn default() -> DistanceTable {
        let regions = [
            "Texas",
            "Arizona",
            "Oregon",
            "Oklahoma",
            "Wisconsin",
            "Ohio",
            "Kentucky",
            "South Carolina",
            "California",
            "New York",
            "Florida",
            "Colorado",
        ];
        let rows: [[f64; 12]; 12] = [
            [0., 1., 3., 1., 2., 2., 2., 2., 2., 3., 2., 1.],
            [1., 0., 2., 2., 3., 3., 3., 3., 1., 4., 3., 1.],
            [3., 2., 0., 3., 3., 4., 4., 5., 1., 5., 5., 2.],
            [1., 2., 3., 0., 2., 2., 2., 3., 3., 3., 3., 1.],
            [2., 3., 3., 2., 0., 1., 1., 3., 4., 2., 3., 2.],
            [2., 3., 4., 2., 1., 0., 1., 2., 5., 1., 2., 3.],
            [2., 3., 4., 2., 1., 1., 0., 1., 5., 2., 1., 3.],
            [2., 3., 5., 3., 3., 2., 1., 0., 6., 2., 1., 4.],
            [2., 1., 1., 3., 4., 5., 5., 6., 0., 5., 5., 1.],
            [3., 4., 5., 3., 2., 1., 2., 2., 5., 0., 3., 4.],
            [2., 3., 5., 3., 3., 2., 1., 1., 5., 3., 0., 4.],
            [1., 1., 2., 1., 2., 3., 3., 4., 1., 4., 4., 0.],
        ];
        DistanceTable {
            regions: regions.iter().map(|r| r.to_string()).collect(),
            distances: rows.iter().map(|r| r.to_vec()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_is_accepted_by_the_validator() {
        let t = DistanceTable::default();
        assert!(DistanceTable::new(t.regions.clone(), t.distances.clone()).is_ok());
    }

    #[test]
    fn nearest_distance_is_zero_inside_a_target_region() {
        let t = DistanceTable::default();
        let nearest = t
            .distances_to_nearest(&["Texas".to_string(), "Ohio".to_string()])
            .unwrap();
        assert_eq!(nearest[0], 0.0);
        let [min, max, avg] = t
            .summary_to_nearest(&["Texas".to_string(), "Ohio".to_string()])
            .unwrap();
        assert_eq!(min, 0.0);
        assert!(max >= avg && avg >= min);
    }

    #[test]
    fn unknown_target_region_is_a_configuration_error() {
        let t = DistanceTable::default();
        assert!(t.distances_to_nearest(&["Atlantis".to_string()]).is_err());
    }

    #[test]
    fn asymmetric_tables_are_rejected() {
        let regions = vec!["A".to_string(), "B".to_string()];
        let distances = vec![vec![0.0, 1.0], vec![2.0, 0.0]];
        assert!(DistanceTable::new(regions, distances).is_err());
    }
}
