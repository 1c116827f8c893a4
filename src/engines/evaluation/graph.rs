use super::context::EvaluationContext;
use crate::data::TimeSeriesStore;
use crate::engines::generation::gene::{Gene, GeneLayout, GeneStore};
use crate::types::AttributeValue;

/// One judgment node on a decision list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub node: usize,
    pub attribute: usize,
    pub delay: usize,
}

/// The judgment nodes reached from one processing node, in walk order.
///
/// Failing a test always returns to the root, so the path a row can take is
/// fixed by the gene: the list is the connection chain cut at `max_depth`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionList {
    pub root: usize,
    pub steps: Vec<Step>,
}

impl DecisionList {
    pub fn compile(gene: &Gene, layout: &GeneLayout, root: usize, max_depth: usize) -> Self {
        let mut steps = Vec::with_capacity(max_depth);
        let mut current = gene.nodes[root].connection;
        while !layout.is_processing(current) && steps.len() < max_depth {
            let node = gene.nodes[current];
            steps.push(Step {
                node: current,
                attribute: node.attribute,
                delay: node.delay,
            });
            current = node.connection;
        }
        Self { root, steps }
    }

    pub fn prefix(&self, depth: usize) -> &[Step] {
        &self.steps[..depth.min(self.steps.len())]
    }
}

/// Walks every (individual, processing node, row) through its decision list
pub struct GraphEvaluator<'a> {
    store: &'a TimeSeriesStore,
    max_depth: usize,
}

impl<'a> GraphEvaluator<'a> {
    pub fn new(store: &'a TimeSeriesStore, max_depth: usize) -> Self {
        Self { store, max_depth }
    }

    /// Compile every processing node of every individual, indexed `[individual][node]`
    pub fn compile(&self, genes: &GeneStore) -> Vec<Vec<DecisionList>> {
        let layout = genes.layout();
        genes
            .genes()
            .iter()
            .map(|gene| {
                (0..layout.processing)
                    .map(|root| DecisionList::compile(gene, layout, root, self.max_depth))
                    .collect()
            })
            .collect()
    }

    pub fn evaluate(&self, lists: &[Vec<DecisionList>], context: &mut EvaluationContext) {
        for (individual, node_lists) in lists.iter().enumerate() {
            for (node, list) in node_lists.iter().enumerate() {
                for &row in self.store.window() {
                    self.walk(individual, node, list, row, context);
                }
            }
        }
    }

    fn walk(
        &self,
        individual: usize,
        node: usize,
        list: &DecisionList,
        row: usize,
        context: &mut EvaluationContext,
    ) {
        let futures = self.store.future_row(row);

        // Depth 0 is unconditional
        context.record_match(individual, node, 0, futures);
        context.record_visit(individual, node, 0);

        let mut matched = true;
        for (i, step) in list.steps.iter().enumerate() {
            let depth = i + 1;
            match self.store.attribute_at(row, step.attribute, step.delay) {
                AttributeValue::Present => {
                    if matched {
                        context.record_match(individual, node, depth, futures);
                    }
                    context.record_visit(individual, node, depth);
                }
                AttributeValue::Absent => break,
                AttributeValue::Missing => {
                    context.record_visit(individual, node, depth);
                    matched = false;
                }
            }
        }
    }
}
