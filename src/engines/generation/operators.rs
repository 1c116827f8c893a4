use crate::config::EvolutionConfig;
use crate::engines::generation::gene::{GeneStore, Node};
use crate::engines::generation::usage::{roulette_select, UsageHistory};
use rand::Rng;
use std::ops::Range;

/// Rank of each individual: how many others have strictly higher fitness
pub fn rank(fitness: &[f64]) -> Vec<usize> {
    fitness
        .iter()
        .map(|&f| fitness.iter().filter(|&&other| other > f).count())
        .collect()
}

/// The three population bands of size `elite` each.
///
/// band0 keeps the elites untouched, band1 receives crossover and connection
/// mutation, band2 receives attribute mutation. Slots past `3 * elite` belong to
/// band2.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PopulationBands {
    pub elite: usize,
    pub population: usize,
}

impl PopulationBands {
    pub fn new(population: usize) -> Self {
        Self {
            elite: population / 3,
            population,
        }
    }

    pub fn band0(&self) -> Range<usize> {
        0..self.elite
    }

    pub fn band1(&self) -> Range<usize> {
        self.elite..2 * self.elite
    }

    pub fn band2(&self) -> Range<usize> {
        2 * self.elite..self.population
    }

    /// band1 and band2 together
    pub fn offspring(&self) -> Range<usize> {
        self.elite..self.population
    }
}

/// Copy the individual of rank `r < elite` into slots `r`, `r + elite` and
/// `r + 2 * elite`. Slots no individual maps to keep their previous gene.
pub fn select_elites(genes: &mut GeneStore, ranks: &[usize], bands: PopulationBands) {
    let mut next = genes.genes().to_vec();
    for (individual, &r) in ranks.iter().enumerate() {
        if r >= bands.elite {
            continue;
        }
        let gene = genes.gene(individual);
        next[r] = gene.clone();
        next[r + bands.elite] = gene.clone();
        next[r + 2 * bands.elite] = gene.clone();
    }
    genes.replace_all(next);
}

/// Pair band1 halves and swap `points` uniformly chosen judgment nodes per pair
pub fn crossover<R: Rng>(genes: &mut GeneStore, bands: PopulationBands, points: usize, rng: &mut R) {
    let pairs = bands.elite / 2;
    let judgment = genes.layout().judgment_range();
    if judgment.is_empty() {
        return;
    }

    for i in 0..pairs {
        let a = bands.elite + i;
        let b = a + pairs;
        for _ in 0..points {
            let index = rng.gen_range(judgment.clone());
            genes.swap_node(a, b, index);
        }
    }
}

fn fires<R: Rng>(rate: u32, rng: &mut R) -> bool {
    rng.gen_range(0..rate) == 0
}

/// Re-point processing-node connections of `individuals`
pub fn mutate_processing_connections<R: Rng>(
    genes: &mut GeneStore,
    individuals: Range<usize>,
    rate: u32,
    rng: &mut R,
) {
    let layout = *genes.layout();
    for individual in individuals {
        let gene = genes.gene_mut(individual);
        for node in gene.nodes.iter_mut().take(layout.processing) {
            if fires(rate, rng) {
                node.connection = layout.random_judgment(rng);
            }
        }
    }
}

/// Re-point judgment-node connections of `individuals`
pub fn mutate_judgment_connections<R: Rng>(
    genes: &mut GeneStore,
    individuals: Range<usize>,
    rate: u32,
    rng: &mut R,
) {
    let layout = *genes.layout();
    for individual in individuals {
        let gene = genes.gene_mut(individual);
        for node in gene.nodes.iter_mut().skip(layout.processing) {
            if fires(rate, rng) {
                node.connection = layout.random_judgment(rng);
            }
        }
    }
}

/// Redraw judgment-node attributes by roulette over `weights`
pub fn mutate_attributes<R: Rng>(
    genes: &mut GeneStore,
    individuals: Range<usize>,
    rate: u32,
    weights: &[u64],
    rng: &mut R,
) {
    mutate_judgment_field(genes, individuals, rate, weights, rng, |node, value| node.attribute = value);
}

/// Redraw judgment-node delays by roulette over `weights`
pub fn mutate_delays<R: Rng>(
    genes: &mut GeneStore,
    individuals: Range<usize>,
    rate: u32,
    weights: &[u64],
    rng: &mut R,
) {
    mutate_judgment_field(genes, individuals, rate, weights, rng, |node, value| node.delay = value);
}

fn mutate_judgment_field<R, F>(
    genes: &mut GeneStore,
    individuals: Range<usize>,
    rate: u32,
    weights: &[u64],
    rng: &mut R,
    mut apply: F,
) where
    R: Rng,
    F: FnMut(&mut Node, usize),
{
    let processing = genes.layout().processing;
    for individual in individuals {
        let gene = genes.gene_mut(individual);
        for node in gene.nodes.iter_mut().skip(processing) {
            if !fires(rate, rng) {
                continue;
            }
            if let Some(value) = roulette_select(weights, rng) {
                apply(node, value);
            }
        }
    }
}

/// One generation step: selection, crossover and the four mutation passes
pub struct EvolutionOperators<'a> {
    config: &'a EvolutionConfig,
}

impl<'a> EvolutionOperators<'a> {
    pub fn new(config: &'a EvolutionConfig) -> Self {
        Self { config }
    }

    pub fn evolve<R: Rng>(
        &self,
        genes: &mut GeneStore,
        fitness: &[f64],
        usage: &UsageHistory,
        rng: &mut R,
    ) {
        let c = self.config;
        let bands = PopulationBands::new(genes.len());
        let ranks = rank(fitness);

        select_elites(genes, &ranks, bands);
        crossover(genes, bands, c.crossover_points, rng);

        mutate_processing_connections(genes, 0..bands.population, c.mutation_processing, rng);
        mutate_judgment_connections(genes, bands.band1(), c.mutation_judgment, rng);
        mutate_attributes(genes, bands.band2(), c.mutation_attribute, &usage.attribute_weights(), rng);
        mutate_delays(genes, bands.offspring(), c.mutation_delay, &usage.delay_weights(), rng);
    }
}
