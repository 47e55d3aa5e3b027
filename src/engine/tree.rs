// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Search nodes.
//!
//! A [`Tree`] owns one [`Attribute`] per dimension. Peeling a node first
//! settles it:
//!
//! 1. potential values that can no longer join a pattern of the subtree are
//!    withdrawn, repeatedly, until none is left (tolerance of the new value,
//!    tolerance of the present values it would share cells with, the noise it
//!    would at least collect to reach the minimal sizes, tau-contiguity);
//! 2. absent values that could not even extend a pattern are deleted;
//! 3. the node is pruned when a mere constraint, the skyline or an absent
//!    value extending every pattern of the subtree rules it out.
//!
//! A settled node whose present and potential elements form a valid pattern
//! is finalized: that pattern is the only closed one of its subtree. A node
//! without potential values is a leaf. Any other node branches on one
//! potential value: present in one child, absent in the other.

use super::propagation;
use crate::attribute::{Attribute, Partition, Value};
use crate::context::{SearchContext, SearchSettings};
use crate::measures::{Bounds, Extent, Measure};
use crate::pattern::Pattern;
use crate::relation::Relation;
use crate::state::{Counters, PruneReason, Statistics};
use rustc_hash::FxHashSet;

/// A closed pattern found at a leaf, with its exact measures.
#[derive(Debug, Clone, PartialEq)]
pub struct Leaf {
    pub pattern: Pattern,
    pub bounds: Bounds,
}

/// Result of peeling a node.
#[derive(Debug)]
pub enum NodeOutcome {
    Pruned(PruneReason),
    Leaf(Leaf),
    Branch { present: Tree, absent: Tree },
}

/// One node of the search.
#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
    attributes: Vec<Attribute>,
}

impl Tree {
    /// The root: every element potential.
    pub fn root(relation: &Relation, settings: &SearchSettings) -> Self {
        let mut attributes: Vec<Attribute> = settings
            .kinds
            .iter()
            .enumerate()
            .map(|(id, kind)| {
                Attribute::new(
                    id,
                    kind.clone(),
                    settings.epsilons[id],
                    settings.closed[id],
                    relation.cardinalities(),
                )
            })
            .collect();
        propagation::initialize_counters(relation, &mut attributes);
        Self { attributes }
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Dimensions an element of `dimension` is added to or removed from: both
    /// clique dimensions for a symmetric attribute.
    fn instances(&self, dimension: usize) -> Vec<usize> {
        match self.attributes[dimension].partner() {
            Some(partner) => vec![dimension, partner],
            None => vec![dimension],
        }
    }

    /// Whether decisions are taken on this attribute (the second clique
    /// dimension only mirrors the first).
    fn is_primary(&self, dimension: usize) -> bool {
        self.attributes[dimension]
            .partner()
            .map_or(true, |partner| dimension < partner)
    }

    fn primaries(&self) -> impl Iterator<Item = &Attribute> + '_ {
        self.attributes
            .iter()
            .filter(move |attribute| self.is_primary(attribute.id()))
    }

    /// Measures of the smallest and largest patterns of the subtree.
    ///
    /// The noise of the tuples covered by the present elements is summed
    /// over the present values of any dimension. Without potential values
    /// (after finalization in particular) both ends coincide and the counters
    /// against the present and potential elements are used.
    pub fn bounds(&self, settings: &SearchSettings) -> Bounds {
        let ids = |values: &[Value]| -> Vec<u32> { values.iter().map(Value::data_id).collect() };
        let present: Vec<Vec<u32>> = self.attributes.iter().map(|a| ids(a.present())).collect();
        let present_and_potential: Vec<Vec<u32>> = self
            .attributes
            .iter()
            .map(|a| ids(a.present_and_potential()))
            .collect();

        let first = &self.attributes[0];
        let present_and_potential_noise: u64 = first
            .present_and_potential()
            .iter()
            .map(|value| u64::from(value.present_and_potential_noise()))
            .sum();
        let present_noise = if self.attributes.iter().all(|a| a.potential_count() == 0) {
            present_and_potential_noise
        } else {
            first.present().iter().map(|value| u64::from(value.present_noise())).sum()
        };

        let extent = Extent {
            present: &present,
            present_and_potential: &present_and_potential,
            present_noise,
            present_and_potential_noise,
        };
        Bounds::new(extent, settings.unit, &settings.groups, &settings.points)
    }

    fn check_constraints(&self, settings: &SearchSettings) -> Result<(), PruneReason> {
        let bounds = self.bounds(settings);
        match Measure::first_violated(&settings.measures, &bounds) {
            Some(measure) => Err(measure.reason()),
            None => Ok(()),
        }
    }

    /// Whether adding `data_id` to `instances` makes some element exceed its
    /// tolerance, counting noise against `partition`: the element itself, or
    /// a member of `partition` sharing cells with it.
    fn exceeds_tolerance(&self, instances: &[usize], data_id: u32, partition: Partition) -> bool {
        for &dimension in instances {
            let attribute = &self.attributes[dimension];
            let table = attribute.intersections(partition);
            let noise = u64::from(attribute.value(data_id).noise(partition))
                + instances
                    .iter()
                    .filter(|&&other| other != dimension)
                    .map(|&other| u64::from(table.get(data_id, other, data_id)))
                    .sum::<u64>();
            if noise > u64::from(attribute.epsilon()) {
                return true;
            }
        }
        self.attributes.iter().any(|attribute| {
            let members = match partition {
                Partition::Present => attribute.present(),
                Partition::PresentAndPotential => attribute.present_and_potential(),
            };
            members.iter().any(|member| {
                let extra: u64 = instances
                    .iter()
                    .filter(|&&dimension| dimension != attribute.id())
                    .map(|&dimension| {
                        u64::from(self.attributes[dimension].intersections(partition).get(
                            data_id,
                            attribute.id(),
                            member.data_id(),
                        ))
                    })
                    .sum();
                extra > 0 && u64::from(member.noise(partition)) + extra > u64::from(attribute.epsilon())
            })
        })
    }

    /// Whether `data_id` collects more noise than tolerated in every pattern
    /// of the subtree meeting the minimal sizes.
    ///
    /// A pattern holds at least `min_size - |P_j|` potential elements of each
    /// other dimension `j`; each brings at least its pairwise noise with
    /// `data_id`, and these cells are disjoint.
    fn misses_min_sizes(&self, settings: &SearchSettings, dimension: usize, data_id: u32) -> bool {
        self.instances(dimension).into_iter().any(|instance| {
            let attribute = &self.attributes[instance];
            let table = attribute.intersections(Partition::Present);
            let mut bound = u64::from(attribute.value(data_id).present_noise());
            for other in &self.attributes {
                if other.id() == instance {
                    continue;
                }
                let need = settings.min_sizes[other.id()].saturating_sub(other.present_count());
                if need == 0 || need > other.potential_count() {
                    continue;
                }
                let mut noise: Vec<u32> = other
                    .potential()
                    .iter()
                    .map(|value| table.get(data_id, other.id(), value.data_id()))
                    .collect();
                noise.select_nth_unstable(need - 1);
                bound += noise[..need].iter().map(|&n| u64::from(n)).sum::<u64>();
            }
            bound > u64::from(attribute.epsilon())
        })
    }

    fn tau_far_values(attribute: &Attribute) -> Result<FxHashSet<u32>, PruneReason> {
        match attribute.tau_far_values() {
            Ok(far) => Ok(far.into_iter().collect()),
            Err(violation) => {
                log::trace!(
                    "Dimension {}: gap {:?} cannot be bridged",
                    attribute.id(),
                    violation.gap
                );
                Err(PruneReason::TauContiguity)
            }
        }
    }

    /// Potential values that cannot join any pattern containing the present
    /// elements, as `(dimension, data id)` (first clique dimension only).
    ///
    /// Fails when the present elements of a tau-contiguous dimension cannot be
    /// chained.
    pub fn find_irrelevant_values_and_check_tau_contiguity(&self) -> Result<Vec<(usize, u32)>, PruneReason> {
        let mut irrelevant = Vec::new();
        for attribute in self.primaries() {
            let far = Self::tau_far_values(attribute)?;
            let instances = self.instances(attribute.id());
            for value in attribute.potential() {
                let data_id = value.data_id();
                if far.contains(&data_id) || self.exceeds_tolerance(&instances, data_id, Partition::Present) {
                    irrelevant.push((attribute.id(), data_id));
                }
            }
        }
        Ok(irrelevant)
    }

    /// Withdraw irrelevant values until a fixed point, checking the mere
    /// constraints after every round.
    ///
    /// Removing potential values shrinks the potential elements other values
    /// rely on to reach the minimal sizes or to stay tau-contiguous, hence the
    /// rounds.
    pub fn find_min_size_irrelevant_values_and_check_constraints(
        &mut self,
        relation: &Relation,
        settings: &SearchSettings,
        statistics: &mut Statistics,
    ) -> Result<(), PruneReason> {
        loop {
            self.check_constraints(settings)?;
            let mut irrelevant = Vec::new();
            for attribute in self.primaries() {
                let far = Self::tau_far_values(attribute)?;
                for value in attribute.potential() {
                    let data_id = value.data_id();
                    if far.contains(&data_id)
                        || (settings.min_size_element_pruning
                            && self.misses_min_sizes(settings, attribute.id(), data_id))
                    {
                        irrelevant.push((attribute.id(), data_id));
                    }
                }
            }
            if irrelevant.is_empty() {
                return Ok(());
            }
            self.remove_irrelevant(relation, &irrelevant, statistics);
        }
    }

    fn remove_irrelevant(&mut self, relation: &Relation, irrelevant: &[(usize, u32)], statistics: &mut Statistics) {
        for &(dimension, data_id) in irrelevant {
            for instance in self.instances(dimension) {
                propagation::remove_from_present_and_potential(relation, &mut self.attributes, instance, data_id);
                self.attributes[instance].set_irrelevant(data_id);
            }
        }
        for attribute in &mut self.attributes {
            attribute.clear_irrelevant();
        }
        statistics.add(Counters::IrrelevantValues, irrelevant.len() as u64);
    }

    fn settle(
        &mut self,
        relation: &Relation,
        settings: &SearchSettings,
        statistics: &mut Statistics,
    ) -> Result<(), PruneReason> {
        let irrelevant = self.find_irrelevant_values_and_check_tau_contiguity()?;
        if !irrelevant.is_empty() {
            self.remove_irrelevant(relation, &irrelevant, statistics);
        }
        self.find_min_size_irrelevant_values_and_check_constraints(relation, settings, statistics)
    }

    /// Delete the absent values that could not join a pattern containing the
    /// present elements, hence neither extend one. Returns how many.
    fn purge_absent(&mut self) -> usize {
        let mut purged = Vec::new();
        for attribute in self.primaries() {
            let instances = self.instances(attribute.id());
            for value in attribute.absent() {
                if self.exceeds_tolerance(&instances, value.data_id(), Partition::Present) {
                    purged.push((attribute.id(), value.data_id()));
                }
            }
        }
        for &(dimension, data_id) in &purged {
            for instance in self.instances(dimension) {
                self.attributes[instance].remove_absent(data_id);
            }
        }
        purged.len()
    }

    /// Whether some absent value extends every pattern of the subtree, which
    /// then holds no closed pattern.
    ///
    /// The value must keep every element of the present and potential
    /// elements within tolerance, and along a tau-contiguous dimension be
    /// within tau of the present ones.
    pub fn unclosed(&self) -> bool {
        self.primaries().any(|attribute| {
            let reach = match attribute.metric() {
                Some(metric) => match metric.range(attribute.present()) {
                    Some(range) => Some((metric, range)),
                    None => return false,
                },
                None => None,
            };
            let instances = self.instances(attribute.id());
            attribute.absent().iter().any(|value| {
                let data_id = value.data_id();
                reach.map_or(true, |(metric, range)| metric.within_reach(data_id, range))
                    && !self.exceeds_tolerance(&instances, data_id, Partition::PresentAndPotential)
            })
        })
    }

    /// Whether the present and potential elements form a valid pattern, in
    /// which case it is the only closed pattern of the subtree.
    pub fn finalizable(&self, settings: &SearchSettings) -> bool {
        settings.all_closed()
            && self.attributes.iter().any(|attribute| attribute.potential_count() > 0)
            && self.attributes.iter().all(|attribute| {
                attribute
                    .present_and_potential()
                    .iter()
                    .all(|value| value.present_and_potential_noise() <= attribute.epsilon())
                    && attribute
                        .metric()
                        .map_or(true, |metric| metric.is_contiguous(attribute.present_and_potential()))
            })
    }

    /// Make every potential value present. The counters against the present
    /// elements are not updated: only those against the present and potential
    /// elements are meaningful afterwards.
    pub fn finalize(&mut self) {
        for attribute in &mut self.attributes {
            attribute.finalize();
        }
    }

    /// Pick the attribute with the highest appeal (lowest dimension on ties)
    /// and its value to branch on.
    fn choose(&mut self, settings: &SearchSettings) -> Option<(usize, u32)> {
        let present_sizes: Vec<usize> = self.attributes.iter().map(Attribute::present_count).collect();
        let present_and_potential_sizes: Vec<usize> = self
            .attributes
            .iter()
            .map(Attribute::present_and_potential_count)
            .collect();
        let mut best: Option<(usize, u64)> = None;
        for attribute in self.primaries() {
            if let Some(appeal) = attribute.appeal(settings.appeal, &present_sizes, &present_and_potential_sizes) {
                if best.map_or(true, |(_, highest)| appeal > highest) {
                    best = Some((attribute.id(), appeal));
                }
            }
        }
        let (dimension, _) = best?;
        let data_id = self.attributes[dimension].choose_value(settings.prefer_dense_values)?;
        if let Some(partner) = self.attributes[dimension].partner() {
            self.attributes[partner].move_to_front_of_potential(data_id);
        }
        Some((dimension, data_id))
    }

    /// Make the chosen value present.
    fn set_present(&mut self, relation: &Relation, dimension: usize) {
        for instance in self.instances(dimension) {
            if let Some(data_id) = self.attributes[instance].chosen_value() {
                propagation::set_present(relation, &mut self.attributes, instance, data_id);
                self.attributes[instance].set_chosen_value_present();
            }
        }
    }

    /// Make the chosen value absent, keeping it if closedness must be checked
    /// against it.
    fn set_absent(&mut self, relation: &Relation, dimension: usize) {
        let instances = self.instances(dimension);
        let keep = instances.iter().any(|&instance| self.attributes[instance].is_closed());
        for instance in instances {
            if let Some(data_id) = self.attributes[instance].chosen_value() {
                propagation::remove_from_present_and_potential(relation, &mut self.attributes, instance, data_id);
                self.attributes[instance].set_chosen_value_absent(keep);
            }
        }
    }

    /// The present elements as a caller-facing pattern.
    pub fn pattern(&self, relation: &Relation) -> Pattern {
        let encoding = relation.encoding();
        let scale = relation.scale();
        let mut dimensions = vec![Vec::new(); self.attributes.len()];
        for attribute in &self.attributes {
            dimensions[encoding.caller_dimension(attribute.id())] = attribute
                .present()
                .iter()
                .map(|value| {
                    (
                        encoding.original_id(attribute.id(), value.data_id()),
                        scale.to_real(u64::from(value.present_and_potential_noise())),
                    )
                })
                .collect();
        }
        Pattern::new(dimensions)
    }

    /// Settle the node and decide what becomes of it.
    pub fn peel(mut self, ctx: &mut SearchContext) -> NodeOutcome {
        let SearchContext {
            relation,
            settings,
            statistics,
            skyline,
        } = ctx;
        statistics.increment_counter(Counters::Nodes);

        if let Err(reason) = self.settle(relation, settings, statistics) {
            return NodeOutcome::Pruned(reason);
        }
        let purged = self.purge_absent();
        statistics.add(Counters::DeletedAbsentValues, purged as u64);

        if settings.check_invariants {
            if let Err(message) = self.validate_invariants(relation) {
                panic!("Invariant violated: {message}");
            }
        }

        if let Some(skyline) = skyline {
            if skyline.dominated(&skyline.values(&self.bounds(settings))) {
                return NodeOutcome::Pruned(PruneReason::Dominated);
            }
        }
        if self.unclosed() {
            return NodeOutcome::Pruned(PruneReason::Unclosed);
        }

        if self.finalizable(settings) {
            self.finalize();
            statistics.increment_counter(Counters::Finalizations);
            if self.unclosed() {
                return NodeOutcome::Pruned(PruneReason::Unclosed);
            }
            if let Err(reason) = self.check_constraints(settings) {
                return NodeOutcome::Pruned(reason);
            }
        }

        match self.choose(settings) {
            None => NodeOutcome::Leaf(Leaf {
                pattern: self.pattern(relation),
                bounds: self.bounds(settings),
            }),
            Some((dimension, _)) => {
                let mut present = self.clone();
                present.set_present(relation, dimension);
                self.set_absent(relation, dimension);
                NodeOutcome::Branch { present, absent: self }
            }
        }
    }

    /// Recompute every counter from the relation and compare.
    ///
    /// Also checks the segments of every attribute, the mirroring of the
    /// clique, the tolerance of the present elements and that no potential
    /// value is left that the irrelevancy rules would withdraw.
    pub fn validate_invariants(&self, relation: &Relation) -> Result<(), String> {
        for attribute in &self.attributes {
            attribute.check_partition()?;
            if !attribute.irrelevant().is_empty() {
                return Err(format!("dimension {}: irrelevant values left", attribute.id()));
            }
        }

        let ids = |values: &[Value]| -> Vec<u32> { values.iter().map(Value::data_id).collect() };
        let present: Vec<Vec<u32>> = self.attributes.iter().map(|a| ids(a.present())).collect();
        let present_and_potential: Vec<Vec<u32>> = self
            .attributes
            .iter()
            .map(|a| ids(a.present_and_potential()))
            .collect();

        for (partition, sets) in [
            (Partition::Present, &present),
            (Partition::PresentAndPotential, &present_and_potential),
        ] {
            for attribute in &self.attributes {
                let k = attribute.id();
                for value in attribute.values() {
                    let v = value.data_id();
                    let mut restricted = sets.clone();
                    restricted[k] = vec![v];
                    let expected = noise_sum(relation, &restricted);
                    if u64::from(value.noise(partition)) != expected {
                        return Err(format!(
                            "dimension {k}, value {v}: {partition:?} noise {} instead of {expected}",
                            value.noise(partition)
                        ));
                    }
                    for other in self.attributes.iter().filter(|other| other.id() != k) {
                        let j = other.id();
                        for w in other.values().iter().map(Value::data_id) {
                            let mut pair = restricted.clone();
                            pair[j] = vec![w];
                            let expected = noise_sum(relation, &pair);
                            let actual = attribute.intersections(partition).get(v, j, w);
                            if u64::from(actual) != expected {
                                return Err(format!(
                                    "dimension {k}, value {v} with dimension {j}, value {w}: \
                                     {partition:?} noise {actual} instead of {expected}"
                                ));
                            }
                        }
                    }
                }
            }
        }

        for attribute in &self.attributes {
            for value in attribute.present() {
                if value.present_noise() > attribute.epsilon() {
                    return Err(format!(
                        "dimension {}, present value {}: noise {} beyond tolerance {}",
                        attribute.id(),
                        value.data_id(),
                        value.present_noise(),
                        attribute.epsilon()
                    ));
                }
            }
            if let Some(partner) = attribute.partner() {
                let mirrored = &self.attributes[partner];
                let same = |first: &[Value], second: &[Value]| {
                    let mut first = ids(first);
                    let mut second = ids(second);
                    first.sort_unstable();
                    second.sort_unstable();
                    first == second
                };
                if !(same(attribute.present(), mirrored.present())
                    && same(attribute.potential(), mirrored.potential())
                    && same(attribute.absent(), mirrored.absent()))
                {
                    return Err(format!("dimensions {} and {partner} are not mirrored", attribute.id()));
                }
            }
        }

        match self.find_irrelevant_values_and_check_tau_contiguity() {
            Ok(irrelevant) if irrelevant.is_empty() => Ok(()),
            Ok(irrelevant) => Err(format!("irrelevant values left after settling: {irrelevant:?}")),
            Err(reason) => Err(format!("settled node violates {reason}")),
        }
    }
}

/// Noise of the cells of a product of element sets.
fn noise_sum(relation: &Relation, sets: &[Vec<u32>]) -> u64 {
    let mut total = 0u64;
    relation.for_each_product_cell(sets, |_, noise| total += u64::from(noise));
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MinerConfig;
    use crate::input::Dataset;

    fn context(dataset: &Dataset, config: MinerConfig) -> SearchContext {
        let mut ctx = SearchContext::new(dataset, &config).unwrap();
        ctx.settings.check_invariants = true;
        ctx
    }

    /// Caller cells (0,0), (0,1) and (1,0); the internal layout is the
    /// caller's.
    fn corner() -> Dataset {
        let mut dataset = Dataset::with_cardinalities(&[2, 2]);
        dataset.push_crisp(&[0, 0]).unwrap();
        dataset.push_crisp(&[0, 1]).unwrap();
        dataset.push_crisp(&[1, 0]).unwrap();
        dataset
    }

    fn branch(outcome: NodeOutcome) -> (Tree, Tree) {
        match outcome {
            NodeOutcome::Branch { present, absent } => (present, absent),
            other => panic!("expected a branch, got {other:?}"),
        }
    }

    fn leaf(outcome: NodeOutcome) -> Pattern {
        match outcome {
            NodeOutcome::Leaf(leaf) => leaf.pattern,
            other => panic!("expected a leaf, got {other:?}"),
        }
    }

    #[test]
    fn test_root_counters() {
        let ctx = context(&corner(), MinerConfig::default());
        let root = Tree::root(&ctx.relation, &ctx.settings);
        assert_eq!(root.validate_invariants(&ctx.relation), Ok(()));
        assert_eq!(root.attributes()[0].value(1).present_and_potential_noise(), 1);
        assert_eq!(root.attributes()[0].value(0).present_and_potential_noise(), 0);
        let bounds = root.bounds(&ctx.settings);
        assert_eq!(bounds.present_and_potential_sizes, vec![2, 2]);
        // Three tuples of the relation, none present yet.
        assert_eq!(bounds.present_and_potential_memberships, 3);
        assert_eq!(bounds.present_memberships, 0);
    }

    #[test]
    fn test_corner_has_two_closed_patterns() {
        let mut ctx = context(&corner(), MinerConfig::default());
        let root = Tree::root(&ctx.relation, &ctx.settings);
        let (present, absent) = branch(root.peel(&mut ctx));

        // Element 1 of dimension 0 is chosen first (the only noisy one).
        assert!(present.attributes()[0].is_present(1));
        assert_eq!(absent.attributes()[0].absent()[0].data_id(), 1);

        let first = leaf(present.peel(&mut ctx));
        assert_eq!(first.elements(0), &[0, 1]);
        assert_eq!(first.elements(1), &[0]);
        let second = leaf(absent.peel(&mut ctx));
        assert_eq!(second.elements(0), &[0]);
        assert_eq!(second.elements(1), &[0, 1]);

        assert_eq!(ctx.statistics.get(Counters::Nodes), 3);
        assert_eq!(ctx.statistics.get(Counters::Finalizations), 2);
        assert_eq!(ctx.statistics.get(Counters::IrrelevantValues), 1);
    }

    #[test]
    fn test_settling_is_idempotent() {
        let mut dataset = Dataset::with_cardinalities(&[3, 3, 2]);
        for cell in [[0, 0, 0], [0, 1, 0], [1, 0, 0], [1, 1, 1], [2, 2, 1], [0, 0, 1], [2, 1, 0]] {
            dataset.push_crisp(&cell).unwrap();
        }
        let ctx = context(&dataset, MinerConfig::new().with_epsilons(vec![1.0, 1.0, 1.0]));
        let mut statistics = Statistics::new();
        let mut node = Tree::root(&ctx.relation, &ctx.settings);
        node.set_present(&ctx.relation, 0);
        node.settle(&ctx.relation, &ctx.settings, &mut statistics).unwrap();
        assert_eq!(node.find_irrelevant_values_and_check_tau_contiguity(), Ok(vec![]));
        assert_eq!(node.validate_invariants(&ctx.relation), Ok(()));

        let settled = node.clone();
        node.settle(&ctx.relation, &ctx.settings, &mut statistics).unwrap();
        assert_eq!(node, settled);
    }

    #[test]
    fn test_min_size_prunes_the_root() {
        let config = MinerConfig::new().with_min_sizes(vec![3]);
        let mut ctx = context(&corner(), config);
        let root = Tree::root(&ctx.relation, &ctx.settings);
        assert!(matches!(root.peel(&mut ctx), NodeOutcome::Pruned(PruneReason::MinSize)));
    }

    #[test]
    fn test_absent_value_extending_the_pattern_prunes() {
        let mut dataset = Dataset::with_cardinalities(&[2, 2]);
        for cell in [[0, 0], [0, 1], [1, 0], [1, 1]] {
            dataset.push_crisp(&cell).unwrap();
        }
        let mut ctx = context(&dataset, MinerConfig::default());
        let root = Tree::root(&ctx.relation, &ctx.settings);
        // The full relation is noise free: the root is finalized at once.
        let pattern = leaf(root.peel(&mut ctx));
        assert_eq!(pattern.area(), 4);

        let mut node = Tree::root(&ctx.relation, &ctx.settings);
        node.choose(&ctx.settings);
        node.set_absent(&ctx.relation, 0);
        assert!(node.unclosed());
    }
}
