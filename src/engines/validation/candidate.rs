use crate::config::MiningConfig;
use crate::engines::evaluation::{DecisionList, StatisticsTable, Step};
use crate::types::RuleAttribute;

/// A normalized attribute set taken from one decision-list prefix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleCandidate {
    pub individual: usize,
    pub node: usize,
    pub depth: usize,
    pub attributes: Vec<RuleAttribute>,
    /// The prefix tested some attribute twice, so graph counters undercount
    pub has_repeats: bool,
}

/// Sort by attribute id and keep the first delay seen for a repeated id
pub fn normalize(steps: &[Step]) -> (Vec<RuleAttribute>, bool) {
    let mut attributes: Vec<RuleAttribute> = Vec::with_capacity(steps.len());
    let mut has_repeats = false;
    for step in steps {
        if attributes.iter().any(|a| a.id == step.attribute) {
            has_repeats = true;
            continue;
        }
        attributes.push(RuleAttribute {
            id: step.attribute,
            delay: step.delay,
        });
    }
    attributes.sort();
    (attributes, has_repeats)
}

pub struct RuleCandidateExtractor {
    min_attributes: usize,
    min_support_count: usize,
    max_depth: usize,
}

impl RuleCandidateExtractor {
    pub fn new(config: &MiningConfig, max_depth: usize) -> Self {
        Self {
            min_attributes: config.min_attributes,
            min_support_count: config.min_support_count,
            max_depth,
        }
    }

    /// Candidates for every (individual, processing node, depth >= min_attributes).
    ///
    /// While a prefix has no repeated attribute its graph match count equals the
    /// rematch count, and every deeper prefix tests a superset of its attributes.
    /// A prefix below `min_support_count` therefore ends that node's scan.
    pub fn extract(&self, lists: &[Vec<DecisionList>], table: &StatisticsTable) -> Vec<RuleCandidate> {
        let mut candidates = Vec::new();

        for (individual, node_lists) in lists.iter().enumerate() {
            for (node, list) in node_lists.iter().enumerate() {
                let deepest = self.max_depth.min(list.steps.len());
                let mut previous: Option<Vec<RuleAttribute>> = None;

                for depth in self.min_attributes..=deepest {
                    let (attributes, has_repeats) = normalize(list.prefix(depth));
                    if !has_repeats && table.get(individual, node, depth).match_count < self.min_support_count {
                        break;
                    }
                    if previous.as_ref() == Some(&attributes) {
                        continue;
                    }
                    previous = Some(attributes.clone());

                    candidates.push(RuleCandidate {
                        individual,
                        node,
                        depth,
                        attributes,
                        has_repeats,
                    });
                }
            }
        }

        candidates
    }
}
