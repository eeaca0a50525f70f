/*!
Population topology construction.

Three separately generated graphs (consumers; producers and recyclers;
refurbishers) are merged by disjoint union into a single undirected graph
whose node indices form one contiguous namespace in role order. The graph is
fixed for the lifetime of a run; neighborhood lookups are precomputed from it
once at model construction.
*/

use rand::seq::SliceRandom;
use rand::Rng;
use rustc_hash::FxHashSet;
use serde_derive::{Deserialize, Serialize};

use crate::parameters::{ConfigError, Parameters};

pub type NodeId = petgraph::graph::NodeIndex<usize>;
pub type PopulationGraph = petgraph::graph::UnGraph<(), (), usize>;

/// Rewiring probability of the small-world generator.
const REWIRING_PROBABILITY: f64 = 0.1;
/// Triangle-closing probability of the scale-free generator.
const TRIAD_PROBABILITY: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Topology {
    SmallWorld,
    Complete,
    /// A small-world graph rewired with probability 1, i.e. fully random.
    Random,
    Ring,
    ScaleFree,
}

impl Topology {
    /// Parse a topology name. Anything unrecognized falls back to the
    /// small-world default rather than failing, which keeps hand-edited
    /// scenario files running.
    pub fn from_name(name: &str) -> Topology {
        match name {
            "complete" | "complete graph" => Topology::Complete,
            "random" => Topology::Random,
            "ring" | "cycle graph" => Topology::Ring,
            "scale-free" | "scale-free graph" => Topology::ScaleFree,
            _ => Topology::SmallWorld,
        }
    }
}

/// Generate the edge list of a graph with nodes `0..n` in the requested
/// topology. The degree parameter is ignored by generators that do not use
/// one (complete, ring).
pub fn generate<R: Rng>(
    topology: Topology,
    n: usize,
    degree: usize,
    rng: &mut R,
) -> Result<Vec<(usize, usize)>, ConfigError> {
    match topology {
        Topology::SmallWorld => small_world_edges(n, degree, REWIRING_PROBABILITY, rng),
        Topology::Random => small_world_edges(n, degree, 1.0, rng),
        Topology::Complete => Ok(complete_edges(n)),
        Topology::Ring => Ok(ring_edges(n)),
        Topology::ScaleFree => scale_free_edges(n, degree, TRIAD_PROBABILITY, rng),
    }
}

fn complete_edges(n: usize) -> Vec<(usize, usize)> {
    let mut edges = Vec::with_capacity(n * (n.saturating_sub(1)) / 2);
    for u in 0..n {
        for v in u + 1..n {
            edges.push((u, v));
        }
    }
    edges
}

fn ring_edges(n: usize) -> Vec<(usize, usize)> {
    match n {
        0 | 1 => vec![],
        2 => vec![(0, 1)],
        _ => (0..n).map(|u| (u, (u + 1) % n)).collect(),
    }
}

/**
Watts-Strogatz small-world graph: a ring lattice where every node is joined
to its `degree / 2` nearest neighbors on either side, with each lattice edge
rewired to a uniformly chosen endpoint with probability `rewiring`.

Rewiring skips nodes that are already connected to everyone, and never
creates self-loops or parallel edges.
*/
fn small_world_edges<R: Rng>(
    n: usize,
    degree: usize,
    rewiring: f64,
    rng: &mut R,
) -> Result<Vec<(usize, usize)>, ConfigError> {
    if degree >= n {
        return Err(ConfigError::DegreeTooLarge { degree, nodes: n });
    }
    let mut edges: Vec<(usize, usize)> = Vec::with_capacity(n * (degree / 2));
    let mut adjacency: Vec<FxHashSet<usize>> = vec![FxHashSet::default(); n];
    for j in 1..=degree / 2 {
        for u in 0..n {
            let v = (u + j) % n;
            edges.push((u, v));
            adjacency[u].insert(v);
            adjacency[v].insert(u);
        }
    }
    for j in 1..=degree / 2 {
        for u in 0..n {
            if rng.gen::<f64>() >= rewiring {
                continue;
            }
            if adjacency[u].len() >= n - 1 {
                continue;
            }
            let old = (u + j) % n;
            let mut new = rng.gen_range(0..n);
            while new == u || adjacency[u].contains(&new) {
                new = rng.gen_range(0..n);
            }
            adjacency[u].remove(&old);
            adjacency[old].remove(&u);
            adjacency[u].insert(new);
            adjacency[new].insert(u);
            edges[(j - 1) * n + u] = (u, new);
        }
    }
    Ok(edges)
}

/**
Holme-Kim scale-free graph: preferential attachment of `degree` edges per
incoming node, where each edge after the first closes a triangle with the
previous target with probability `triad`. Yields the heavy-tailed degree
distribution of preferential attachment plus tunable clustering.
*/
fn scale_free_edges<R: Rng>(
    n: usize,
    degree: usize,
    triad: f64,
    rng: &mut R,
) -> Result<Vec<(usize, usize)>, ConfigError> {
    if degree == 0 {
        return Err(ConfigError::ZeroAttachmentDegree { degree });
    }
    if degree >= n {
        return Err(ConfigError::DegreeTooLarge { degree, nodes: n });
    }
    let mut edges: Vec<(usize, usize)> = vec![];
    let mut adjacency: Vec<FxHashSet<usize>> = vec![FxHashSet::default(); n];
    // Attachment is proportional to degree: every endpoint of every edge is
    // appended to this list, so drawing from it uniformly is drawing nodes
    // weighted by their degree.
    let mut repeated_nodes: Vec<usize> = (0..degree).collect();

    let mut add_edge = |edges: &mut Vec<(usize, usize)>,
                        adjacency: &mut Vec<FxHashSet<usize>>,
                        u: usize,
                        v: usize| {
        edges.push((u, v));
        adjacency[u].insert(v);
        adjacency[v].insert(u);
    };

    for source in degree..n {
        let mut targets = random_subset(&repeated_nodes, degree, rng);
        let mut target = match targets.pop() {
            Some(t) => t,
            None => continue,
        };
        add_edge(&mut edges, &mut adjacency, source, target);
        repeated_nodes.push(target);
        let mut count = 1;
        while count < degree {
            if rng.gen::<f64>() < triad {
                let neighborhood: Vec<usize> = adjacency[target]
                    .iter()
                    .cloned()
                    .filter(|&w| w != source && !adjacency[source].contains(&w))
                    .collect();
                if let Some(&w) = neighborhood.choose(rng) {
                    add_edge(&mut edges, &mut adjacency, source, w);
                    repeated_nodes.push(w);
                    count += 1;
                    continue;
                }
            }
            target = match targets.pop() {
                Some(t) => t,
                None => break,
            };
            if !adjacency[source].contains(&target) && target != source {
                add_edge(&mut edges, &mut adjacency, source, target);
                repeated_nodes.push(target);
            }
            count += 1;
        }
        repeated_nodes.extend(std::iter::repeat(source).take(degree));
    }
    Ok(edges)
}

/// Up to `size` distinct elements drawn from `pool` (with the pool's
/// multiplicities acting as weights).
fn random_subset<R: Rng>(pool: &[usize], size: usize, rng: &mut R) -> Vec<usize> {
    let mut chosen: Vec<usize> = Vec::with_capacity(size);
    let distinct: FxHashSet<usize> = pool.iter().cloned().collect();
    let available = distinct.len().min(size);
    while chosen.len() < available {
        let candidate = pool[rng.gen_range(0..pool.len())];
        if !chosen.contains(&candidate) {
            chosen.push(candidate);
        }
    }
    chosen
}

/// Build the combined population graph: consumer component at offset 0, the
/// producer+recycler component after it, and the always-complete refurbisher
/// component last.
pub fn build_population_graph<R: Rng>(
    p: &Parameters,
    rng: &mut R,
) -> Result<PopulationGraph, ConfigError> {
    let mut graph = PopulationGraph::default();
    for _ in 0..p.num_agents() {
        graph.add_node(());
    }
    let components = [
        (
            p.consumers_network_type,
            p.num_consumers,
            p.consumers_node_degree,
            0,
        ),
        (
            p.prod_n_recyc_network_type,
            p.num_prod_n_recyc(),
            p.prod_n_recyc_node_degree,
            p.num_consumers,
        ),
        (
            Topology::Complete,
            p.num_refurbishers,
            0,
            p.num_consumers + p.num_prod_n_recyc(),
        ),
    ];
    for &(topology, n, degree, offset) in components.iter() {
        for (u, v) in generate(topology, n, degree, rng)? {
            graph.add_edge(NodeId::new(offset + u), NodeId::new(offset + v), ());
        }
    }
    Ok(graph)
}

/// The sorted neighbor list of every node, as plain indices. Computed once;
/// every per-step neighborhood query is a slice lookup instead of a graph
/// traversal.
pub fn neighbor_lists(graph: &PopulationGraph) -> Vec<Vec<usize>> {
    let mut lists: Vec<Vec<usize>> = graph
        .node_indices()
        .map(|node| graph.neighbors(node).map(|m| m.index()).collect())
        .collect();
    for list in lists.iter_mut() {
        list.sort_unstable();
        list.dedup();
    }
    lists
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn ring_has_as_many_edges_as_nodes() {
        assert_eq!(ring_edges(10).len(), 10);
        assert_eq!(ring_edges(2), vec![(0, 1)]);
        assert!(ring_edges(1).is_empty());
    }

    #[test]
    fn complete_graph_has_all_pairs() {
        assert_eq!(complete_edges(5).len(), 10);
    }

    #[test]
    fn small_world_keeps_the_lattice_edge_count() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let edges = small_world_edges(20, 4, 0.1, &mut rng).unwrap();
        assert_eq!(edges.len(), 40);
        assert!(edges.iter().all(|&(u, v)| u != v && u < 20 && v < 20));
    }

    #[test]
    fn small_world_rejects_excessive_degree() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        assert!(matches!(
            small_world_edges(5, 5, 0.1, &mut rng),
            Err(ConfigError::DegreeTooLarge { .. })
        ));
    }

    #[test]
    fn scale_free_attaches_every_late_node() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let edges = scale_free_edges(30, 3, 0.1, &mut rng).unwrap();
        let mut degree = vec![0usize; 30];
        for &(u, v) in &edges {
            assert_ne!(u, v);
            degree[u] += 1;
            degree[v] += 1;
        }
        for node in 3..30 {
            assert!(degree[node] >= 1, "node {} never attached", node);
        }
    }

    #[test]
    fn unknown_topology_names_fall_back_to_small_world() {
        assert_eq!(Topology::from_name("hypercube"), Topology::SmallWorld);
        assert_eq!(Topology::from_name("complete graph"), Topology::Complete);
        assert_eq!(Topology::from_name("cycle graph"), Topology::Ring);
    }

    #[test]
    fn population_graph_keeps_components_disjoint() {
        let mut p = Parameters::default();
        p.num_consumers = 10;
        p.num_recyclers = 3;
        p.num_producers = 4;
        p.num_refurbishers = 3;
        p.consumers_node_degree = 4;
        p.prod_n_recyc_node_degree = 2;
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let graph = build_population_graph(&p, &mut rng).unwrap();
        assert_eq!(graph.node_count(), 20);
        let lists = neighbor_lists(&graph);
        for (node, neighbors) in lists.iter().enumerate() {
            let same_component = |m: usize| {
                (node < 10) == (m < 10) && ((10..17).contains(&node) == (10..17).contains(&m))
            };
            assert!(neighbors.iter().all(|&m| same_component(m)));
        }
        // Refurbishers form a complete component.
        for node in 17..20 {
            assert_eq!(lists[node].len(), 2);
        }
    }
}
