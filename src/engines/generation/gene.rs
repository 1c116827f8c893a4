//! Gene representation for Genetic Network Programming
//!
//! A gene is a fixed array of `Npn + Njg` nodes. The first `Npn` slots are
//! processing nodes (entry points); the rest are judgment nodes, each testing one
//! attribute at one time delay. Every connection points at a judgment node, so a
//! walk from a processing node only ends by failing a test or reaching the depth
//! limit.
//!
//! Processing nodes leave `attribute` and `delay` at 0; only their connection is
//! used.

use crate::config::EvolutionConfig;
use rand::Rng;
use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Node {
    pub attribute: usize,
    pub connection: usize,
    pub delay: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gene {
    pub nodes: Vec<Node>,
}

/// Shape shared by every gene in a population
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeneLayout {
    pub processing: usize,
    pub judgment: usize,
    pub attributes: usize,
    pub max_delay: usize,
}

impl GeneLayout {
    pub fn new(config: &EvolutionConfig, attributes: usize) -> Self {
        Self {
            processing: config.processing_nodes,
            judgment: config.judgment_nodes,
            attributes,
            max_delay: config.max_time_delay,
        }
    }

    pub fn total(&self) -> usize {
        self.processing + self.judgment
    }

    pub fn is_processing(&self, index: usize) -> bool {
        index < self.processing
    }

    pub fn judgment_range(&self) -> Range<usize> {
        self.processing..self.total()
    }

    pub fn delay_options(&self) -> usize {
        self.max_delay + 1
    }

    pub fn random_judgment<R: Rng>(&self, rng: &mut R) -> usize {
        rng.gen_range(self.judgment_range())
    }

    pub fn random_attribute<R: Rng>(&self, rng: &mut R) -> usize {
        rng.gen_range(0..self.attributes)
    }

    pub fn random_delay<R: Rng>(&self, rng: &mut R) -> usize {
        rng.gen_range(0..self.delay_options())
    }
}

impl Gene {
    /// Generate random gene
    pub fn random<R: Rng>(layout: &GeneLayout, rng: &mut R) -> Self {
        let nodes = (0..layout.total())
            .map(|index| {
                if layout.is_processing(index) {
                    Node {
                        attribute: 0,
                        connection: layout.random_judgment(rng),
                        delay: 0,
                    }
                } else {
                    Node {
                        attribute: layout.random_attribute(rng),
                        connection: layout.random_judgment(rng),
                        delay: layout.random_delay(rng),
                    }
                }
            })
            .collect();
        Self { nodes }
    }
}

/// The chromosomes of a whole population
#[derive(Debug, Clone)]
pub struct GeneStore {
    layout: GeneLayout,
    genes: Vec<Gene>,
}

impl GeneStore {
    pub fn random<R: Rng>(layout: GeneLayout, population: usize, rng: &mut R) -> Self {
        let genes = (0..population).map(|_| Gene::random(&layout, rng)).collect();
        Self { layout, genes }
    }

    /// Build a store from explicit genes; every gene must match `layout`
    pub fn from_genes(layout: GeneLayout, genes: Vec<Gene>) -> Option<Self> {
        let valid = genes.iter().all(|gene| {
            gene.nodes.len() == layout.total()
                && gene.nodes.iter().all(|n| {
                    layout.judgment_range().contains(&n.connection)
                        && n.delay <= layout.max_delay
                        && (layout.attributes == 0 || n.attribute < layout.attributes)
                })
        });
        if valid {
            Some(Self { layout, genes })
        } else {
            None
        }
    }

    pub fn layout(&self) -> &GeneLayout {
        &self.layout
    }

    pub fn len(&self) -> usize {
        self.genes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    pub fn gene(&self, individual: usize) -> &Gene {
        &self.genes[individual]
    }

    pub fn gene_mut(&mut self, individual: usize) -> &mut Gene {
        &mut self.genes[individual]
    }

    pub fn genes(&self) -> &[Gene] {
        &self.genes
    }

    pub(crate) fn replace_all(&mut self, genes: Vec<Gene>) {
        debug_assert_eq!(genes.len(), self.genes.len());
        self.genes = genes;
    }

    /// Swap node `index` between two individuals
    pub fn swap_node(&mut self, a: usize, b: usize, index: usize) {
        if a == b {
            return;
        }
        let node_a = self.genes[a].nodes[index];
        self.genes[a].nodes[index] = self.genes[b].nodes[index];
        self.genes[b].nodes[index] = node_a;
    }
}
