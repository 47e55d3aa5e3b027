// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Hierarchical agglomeration of the closed patterns.
//!
//! The closed patterns are the leaves of a dendrogram. Starting from the
//! leaves, the two frontier nodes whose element-wise union is the least noisy
//! are merged, until a single root remains. The distance of a node is the
//! largest relative noise of an element of its pattern (noise divided by the
//! number of cells of the element), computed on the relation.
//!
//! The relevance of a node is how much noisier its parent is; the root is
//! infinitely relevant. Agglomerates with a positive relevance are the ones
//! worth reporting: merging them further costs noise.
//!
//! Comparing the frontier nodes pairwise is quadratic, so the agglomerator
//! only ever holds the `cap` least noisy leaves (largest first on ties),
//! dropping the others as they arrive. The distance of every frontier pair is
//! cached between merges: a merge only brings the pairs of the new node.

use crate::pattern::Pattern;
use crate::relation::Relation;
use rustc_hash::FxHashMap;
use std::cmp::Ordering;
use std::ops::ControlFlow;

/// A node of the dendrogram.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pattern: Pattern,
    distance: f64,
    relevance: f64,
    children: Vec<usize>,
    parent: Option<usize>,
}

impl Node {
    fn new(pattern: Pattern, distance: f64, children: Vec<usize>) -> Self {
        Self {
            pattern,
            distance,
            relevance: f64::INFINITY,
            children,
            parent: None,
        }
    }

    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    /// Largest relative noise of the pattern's elements.
    pub fn distance(&self) -> f64 {
        self.distance
    }

    /// Distance of the parent minus the node's own (infinite at the root).
    pub fn relevance(&self) -> f64 {
        self.relevance
    }

    /// Indexes of the merged nodes (empty for a leaf).
    pub fn children(&self) -> &[usize] {
        &self.children
    }

    pub fn parent(&self) -> Option<usize> {
        self.parent
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Result of an agglomeration: leaves first, then agglomerates in merge
/// order, the root last.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dendrogram {
    nodes: Vec<Node>,
    leaf_count: usize,
    truncated: bool,
}

impl Dendrogram {
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, index: usize) -> &Node {
        &self.nodes[index]
    }

    pub fn leaves(&self) -> &[Node] {
        &self.nodes[..self.leaf_count]
    }

    pub fn root(&self) -> Option<&Node> {
        self.nodes.last()
    }

    /// Whether leaves were dropped to respect the cap.
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    /// Agglomerates with a positive relevance, and the root when it is an
    /// agglomerate.
    pub fn relevant_agglomerates(&self) -> Vec<&Node> {
        self.nodes[self.leaf_count..]
            .iter()
            .filter(|node| node.relevance > 0.0)
            .collect()
    }
}

/// A kept leaf with its sort key.
#[derive(Debug, Clone)]
struct Candidate {
    pattern: Pattern,
    distance: f64,
    area: u64,
}

/// Order of the leaves: least noisy first, then largest first.
fn rank(distance: f64, area: u64, other_distance: f64, other_area: u64) -> Ordering {
    distance.total_cmp(&other_distance).then(other_area.cmp(&area))
}

/// Collects the closed patterns and builds their dendrogram.
#[derive(Debug, Clone)]
pub struct Agglomerator {
    cap: usize,
    leaves: Vec<Candidate>,
    dropped: usize,
}

impl Agglomerator {
    /// Agglomerate at most `cap` leaves.
    pub fn new(cap: usize) -> Self {
        Self {
            cap,
            leaves: Vec::new(),
            dropped: 0,
        }
    }

    /// Offer a closed pattern. It is only copied when it ranks among the
    /// `cap` least noisy seen so far; the leaf it displaces is dropped.
    pub fn push(&mut self, pattern: &Pattern) {
        let distance = pattern.intrinsic_distance();
        let area = pattern.area();
        let position = self
            .leaves
            .partition_point(|leaf| rank(leaf.distance, leaf.area, distance, area) != Ordering::Greater);
        if position >= self.cap {
            self.record_drop();
            return;
        }
        self.leaves.insert(
            position,
            Candidate {
                pattern: pattern.clone(),
                distance,
                area,
            },
        );
        if self.leaves.len() > self.cap {
            self.leaves.pop();
            self.record_drop();
        }
    }

    fn record_drop(&mut self) {
        if self.dropped == 0 {
            log::warn!(
                "More than {} closed n-sets: only the {} least noisy are agglomerated",
                self.cap,
                self.cap
            );
        }
        self.dropped += 1;
    }

    /// Number of leaves held.
    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    /// Number of patterns dropped to respect the cap.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// Merge the leaves into a dendrogram.
    pub fn build(self, relation: &Relation) -> Dendrogram {
        let leaf_count = self.leaves.len();
        let mut nodes: Vec<Node> = self
            .leaves
            .into_iter()
            .map(|leaf| Node::new(leaf.pattern, leaf.distance, Vec::new()))
            .collect();
        let mut frontier: Vec<usize> = (0..leaf_count).collect();
        let mut pairs = FxHashMap::default();
        for first in 0..leaf_count {
            for second in first + 1..leaf_count {
                pairs.insert((first, second), PairDistance::Above(f64::NEG_INFINITY));
            }
        }

        while frontier.len() > 1 {
            let Some(((first, second), distance)) = closest_pair(relation, &nodes, &mut pairs) else {
                break;
            };

            let union = nodes[first].pattern.union_elements(&nodes[second].pattern);
            let pattern = union_pattern(relation, union);
            let index = nodes.len();
            log::debug!("Agglomerate {index} of nodes {first} and {second} at distance {distance}");
            for child in [first, second] {
                nodes[child].parent = Some(index);
                nodes[child].relevance = distance - nodes[child].distance;
            }
            nodes.push(Node::new(pattern, distance, vec![first, second]));

            frontier.retain(|&node| node != first && node != second);
            pairs.retain(|&(a, b), _| a != first && a != second && b != first && b != second);
            for &node in &frontier {
                pairs.insert((node, index), PairDistance::Above(f64::NEG_INFINITY));
            }
            frontier.push(index);
        }

        Dendrogram {
            nodes,
            leaf_count,
            truncated: self.dropped > 0,
        }
    }
}

/// What is known of the distance of the union of two frontier nodes.
#[derive(Debug, Clone, Copy, PartialEq)]
enum PairDistance {
    Exact(f64),
    /// Strictly more than the given distance.
    Above(f64),
}

fn precedes(distance: f64, pair: (usize, usize), best: Option<((usize, usize), f64)>) -> bool {
    best.map_or(true, |(best_pair, best_distance)| {
        distance.total_cmp(&best_distance).then(pair.cmp(&best_pair)) == Ordering::Less
    })
}

/// The pair with the least noisy union (lowest node indexes on ties).
///
/// Pairs only known to be above some distance are measured, least bound
/// first, with the best distance so far as cut-off; those still cut off
/// keep the tighter bound.
fn closest_pair(
    relation: &Relation,
    nodes: &[Node],
    pairs: &mut FxHashMap<(usize, usize), PairDistance>,
) -> Option<((usize, usize), f64)> {
    let mut best = None;
    let mut pending = Vec::new();
    for (&pair, &known) in pairs.iter() {
        match known {
            PairDistance::Exact(distance) => {
                if precedes(distance, pair, best) {
                    best = Some((pair, distance));
                }
            }
            PairDistance::Above(bound) => pending.push((pair, bound)),
        }
    }
    pending.sort_by(|(pair, bound), (other_pair, other_bound)| {
        bound.total_cmp(other_bound).then(pair.cmp(other_pair))
    });

    for (pair, lower) in pending {
        let cut_off = best.map_or(f64::INFINITY, |(_, distance)| distance);
        if lower >= cut_off {
            break;
        }
        let union = nodes[pair.0].pattern.union_elements(&nodes[pair.1].pattern);
        let known = match less_noisy_nset(relation, &union, cut_off) {
            Some(distance) => {
                if precedes(distance, pair, best) {
                    best = Some((pair, distance));
                }
                PairDistance::Exact(distance)
            }
            None => PairDistance::Above(cut_off),
        };
        pairs.insert(pair, known);
    }
    best
}

/// Noise of each element of an n-set (caller order), or `None` as soon as
/// one element's relative noise exceeds `bound`.
fn element_noise(relation: &Relation, elements: &[Vec<u32>], bound: f64) -> Option<Vec<Vec<u64>>> {
    let encoding = relation.encoding();
    let n = relation.dimension_count();
    let unit = f64::from(relation.unit());

    let mut sets = vec![Vec::new(); n];
    let mut indexes = vec![Vec::new(); n];
    for internal in 0..n {
        let caller = encoding.caller_dimension(internal);
        sets[internal] = elements[caller]
            .iter()
            .map(|&element| encoding.data_id(internal, element))
            .collect();
        let mut index = vec![0; relation.cardinality(internal)];
        for (position, &data_id) in sets[internal].iter().enumerate() {
            index[data_id as usize] = position;
        }
        indexes[internal] = index;
    }
    let thresholds: Vec<f64> = (0..n)
        .map(|internal| {
            let area: f64 = sets
                .iter()
                .enumerate()
                .filter(|&(other, _)| other != internal)
                .map(|(_, set)| set.len() as f64)
                .product();
            bound * area * unit
        })
        .collect();

    let mut noise: Vec<Vec<u64>> = sets.iter().map(|set| vec![0; set.len()]).collect();
    let flow = relation.walk_product(&sets, |cell, cell_noise| {
        for internal in 0..n {
            let accumulated = &mut noise[internal][indexes[internal][cell[internal] as usize]];
            *accumulated += u64::from(cell_noise);
            if *accumulated as f64 > thresholds[internal] {
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    });
    if flow.is_break() {
        return None;
    }

    let mut by_caller = vec![Vec::new(); n];
    for (internal, element_noise) in noise.into_iter().enumerate() {
        by_caller[encoding.caller_dimension(internal)] = element_noise;
    }
    Some(by_caller)
}

/// Distance of an n-set given in caller order and ids, or `None` when it is
/// more than `bound`.
///
/// The walk over the n-set stops as soon as one element is found noisier than
/// `bound`, which spares most of the cost of the candidates that cannot win.
pub fn less_noisy_nset(relation: &Relation, elements: &[Vec<u32>], bound: f64) -> Option<f64> {
    let noise = element_noise(relation, elements, bound)?;
    let scale = relation.scale();
    let pattern = Pattern::new(
        elements
            .iter()
            .zip(noise)
            .map(|(elements, noise)| {
                elements
                    .iter()
                    .zip(noise)
                    .map(|(&element, noise)| (element, scale.to_real(noise)))
                    .collect()
            })
            .collect(),
    );
    Some(pattern.intrinsic_distance())
}

fn union_pattern(relation: &Relation, elements: Vec<Vec<u32>>) -> Pattern {
    let scale = relation.scale();
    let noise = element_noise(relation, &elements, f64::INFINITY).unwrap_or_default();
    Pattern::new(
        elements
            .into_iter()
            .zip(noise)
            .map(|(elements, noise)| {
                elements
                    .into_iter()
                    .zip(noise)
                    .map(|(element, noise)| (element, scale.to_real(noise)))
                    .collect()
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MinerConfig;
    use crate::input::Dataset;

    /// Rows 0..4 by columns 0..5: rows 0-3 hold columns 0-4, row 4 holds
    /// columns 4 and 5.
    fn relation() -> Relation {
        let mut dataset = Dataset::with_cardinalities(&[5, 6]);
        for row in 0..4 {
            for column in 0..5 {
                dataset.push_crisp(&[row, column]).unwrap();
            }
        }
        dataset.push_crisp(&[4, 4]).unwrap();
        dataset.push_crisp(&[4, 5]).unwrap();
        Relation::build(&dataset, &MinerConfig::default()).unwrap()
    }

    /// Leaves given with their own noise: distances 0.1, 0.2 and 0.9, areas
    /// 10, 8 and 2.
    fn leaves() -> Vec<Pattern> {
        vec![
            Pattern::new(vec![vec![(4, 1.8)], vec![(4, 0.0), (5, 0.0)]]),
            Pattern::new(vec![
                vec![(0, 0.0), (1, 0.0)],
                vec![(0, 0.2), (1, 0.0), (2, 0.0), (3, 0.0), (4, 0.0)],
            ]),
            Pattern::new(vec![
                vec![(2, 0.0), (3, 0.0)],
                vec![(0, 0.4), (1, 0.0), (2, 0.0), (3, 0.0)],
            ]),
        ]
    }

    fn close(first: f64, second: f64) -> bool {
        (first - second).abs() < 1e-9
    }

    #[test]
    fn test_less_noisy_nset_cuts_off() {
        let relation = relation();
        let union = vec![vec![0, 1, 4], vec![0, 1, 2, 3, 4, 5]];
        // Row 4 misses 4 of 6 columns, column 5 misses 2 of 3 rows.
        let distance = less_noisy_nset(&relation, &union, f64::INFINITY).unwrap();
        assert!(close(distance, 2.0 / 3.0));
        assert_eq!(less_noisy_nset(&relation, &union, 0.5), None);
        assert!(less_noisy_nset(&relation, &union, 0.7).is_some());
    }

    #[test]
    fn test_closest_leaves_merge_first() {
        let relation = relation();
        let mut agglomerator = Agglomerator::new(10);
        for leaf in &leaves() {
            agglomerator.push(leaf);
        }
        let dendrogram = agglomerator.build(&relation);
        assert!(!dendrogram.is_truncated());

        let distances: Vec<f64> = dendrogram.leaves().iter().map(Node::distance).collect();
        assert!(close(distances[0], 0.1) && close(distances[1], 0.2) && close(distances[2], 0.9));
        assert_eq!(dendrogram.leaves()[0].pattern().area(), 10);

        // The two blocks of rows 0-3 merge first, into a noise-free pattern.
        let first = dendrogram.node(3);
        assert_eq!(first.children(), &[0, 1]);
        assert_eq!(first.distance(), 0.0);
        assert_eq!(first.pattern().elements(0), &[0, 1, 2, 3]);

        let root = dendrogram.root().unwrap();
        assert_eq!(root.children(), &[2, 3]);
        assert!(close(root.distance(), 0.8));
        assert_eq!(root.relevance(), f64::INFINITY);
        assert!(close(first.relevance(), 0.8));
        assert!(dendrogram.leaves()[2].relevance() < 0.0);

        let relevant = dendrogram.relevant_agglomerates();
        assert_eq!(relevant.len(), 2);
        assert!(relevant.iter().all(|node| node.relevance() > 0.0));
    }

    #[test]
    fn test_cap_drops_the_noisiest_leaves() {
        let relation = relation();
        let mut agglomerator = Agglomerator::new(2);
        for leaf in &leaves() {
            agglomerator.push(leaf);
        }
        assert_eq!(agglomerator.len(), 2);
        assert_eq!(agglomerator.dropped(), 1);
        let dendrogram = agglomerator.build(&relation);
        assert!(dendrogram.is_truncated());
        assert_eq!(dendrogram.leaves().len(), 2);
        assert!(dendrogram.leaves().iter().all(|leaf| leaf.distance() < 0.5));
        assert_eq!(dendrogram.nodes().len(), 3);
    }

    #[test]
    fn test_leaves_stay_ranked_within_the_cap() {
        let mut agglomerator = Agglomerator::new(2);
        for leaf in &leaves() {
            agglomerator.push(leaf);
            assert!(agglomerator.len() <= 2);
        }
        // The noisiest leaf came first and was displaced by the third.
        assert_eq!(agglomerator.dropped(), 1);
        let areas: Vec<u64> = agglomerator.leaves.iter().map(|leaf| leaf.area).collect();
        assert_eq!(areas, vec![10, 8]);

        // Ties on the distance go to the largest pattern, whatever the order.
        let mut ties = Agglomerator::new(1);
        ties.push(&Pattern::noise_free(vec![vec![0], vec![0, 1]]));
        ties.push(&Pattern::noise_free(vec![vec![0, 1], vec![0, 1, 2]]));
        ties.push(&Pattern::noise_free(vec![vec![0], vec![0]]));
        assert_eq!(ties.leaves[0].area, 6);
        assert_eq!(ties.dropped(), 2);
    }

    #[test]
    fn test_cached_pairs_give_the_exhaustive_merges() {
        let relation = relation();
        let mut agglomerator = Agglomerator::new(10);
        let patterns = [
            Pattern::noise_free(vec![vec![0], vec![0, 1, 2]]),
            Pattern::noise_free(vec![vec![1], vec![2, 3]]),
            Pattern::noise_free(vec![vec![2, 3], vec![4]]),
            Pattern::noise_free(vec![vec![4], vec![5]]),
        ];
        for pattern in &patterns {
            agglomerator.push(pattern);
        }
        let dendrogram = agglomerator.build(&relation);
        assert_eq!(dendrogram.nodes().len(), 7);

        // Every merge takes the least noisy union of the frontier at that time.
        let mut frontier: Vec<usize> = (0..4).collect();
        for index in 4..7 {
            let node = dendrogram.node(index);
            let mut best = f64::INFINITY;
            for (position, &first) in frontier.iter().enumerate() {
                for &second in &frontier[position + 1..] {
                    let union = dendrogram
                        .node(first)
                        .pattern()
                        .union_elements(dendrogram.node(second).pattern());
                    best = best.min(less_noisy_nset(&relation, &union, f64::INFINITY).unwrap());
                }
            }
            assert!(close(node.distance(), best));
            frontier.retain(|position| !node.children().contains(position));
            frontier.push(index);
        }
    }

    #[test]
    fn test_single_leaf_has_no_agglomerate() {
        let relation = relation();
        let mut agglomerator = Agglomerator::new(10);
        agglomerator.push(&Pattern::noise_free(vec![vec![0], vec![0]]));
        let dendrogram = agglomerator.build(&relation);
        assert_eq!(dendrogram.nodes().len(), 1);
        assert!(dendrogram.relevant_agglomerates().is_empty());
    }
}
