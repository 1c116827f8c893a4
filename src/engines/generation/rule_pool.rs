use crate::config::DedupPolicy;
use crate::engines::metrics::Registration;
use crate::types::{Rule, RuleAttribute};

use std::collections::HashSet;

/// Identity of a rule under a dedup policy
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RuleKey {
    ids: Vec<usize>,
    delays: Option<Vec<usize>>,
}

impl RuleKey {
    pub fn new(attributes: &[RuleAttribute], policy: DedupPolicy) -> Self {
        let ids = attributes.iter().map(|a| a.id).collect();
        let delays = match policy {
            DedupPolicy::AttributesOnly => None,
            DedupPolicy::AttributesAndDelays => Some(attributes.iter().map(|a| a.delay).collect()),
        };
        Self { ids, delays }
    }
}

/// Unique rules of one trial, capped at `max_rules`
pub struct RulePool {
    rules: Vec<Rule>,
    max_rules: usize,
    policy: DedupPolicy,
    seen_keys: HashSet<RuleKey>,
}

impl RulePool {
    pub fn new(max_rules: usize, policy: DedupPolicy) -> Self {
        Self {
            rules: Vec::new(),
            max_rules,
            policy,
            seen_keys: HashSet::new(),
        }
    }

    pub fn contains(&self, attributes: &[RuleAttribute]) -> bool {
        self.seen_keys.contains(&RuleKey::new(attributes, self.policy))
    }

    /// Attempt to add a rule to the pool
    pub fn register(&mut self, rule: Rule) -> Registration {
        let key = RuleKey::new(&rule.attributes, self.policy);
        if self.seen_keys.contains(&key) {
            return Registration::Duplicate;
        }
        if self.is_full() {
            return Registration::Full;
        }

        self.rules.push(rule);
        self.seen_keys.insert(key);
        Registration::New
    }

    pub fn is_full(&self) -> bool {
        self.rules.len() >= self.max_rules
    }

    pub fn get_all(&self) -> &[Rule] {
        &self.rules
    }

    pub fn into_rules(self) -> Vec<Rule> {
        self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Rules merged across every trial of an experiment
pub struct GlobalRulePool {
    rules: Vec<Rule>,
    policy: DedupPolicy,
    seen_keys: HashSet<RuleKey>,
}

impl GlobalRulePool {
    pub fn new(policy: DedupPolicy) -> Self {
        Self {
            rules: Vec::new(),
            policy,
            seen_keys: HashSet::new(),
        }
    }

    /// Append the rules not merged before; returns how many were new
    pub fn merge(&mut self, rules: &[Rule]) -> usize {
        let before = self.rules.len();
        for rule in rules {
            let key = RuleKey::new(&rule.attributes, self.policy);
            if self.seen_keys.insert(key) {
                self.rules.push(rule.clone());
            }
        }
        self.rules.len() - before
    }

    pub fn get_all(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{RuleOrigin, RuleStatistics};

    fn rule(attributes: &[(usize, usize)]) -> Rule {
        Rule {
            attributes: attributes
                .iter()
                .map(|&(id, delay)| RuleAttribute { id, delay })
                .collect(),
            stats: RuleStatistics {
                support_count: 1,
                support: 0.1,
                confidence: 1.0,
                future_mean: vec![1.0, 1.0],
                future_sigma: vec![0.0, 0.0],
                quadrant_counts: [1, 0, 0, 0],
                concentration: 1.0,
                dominant_quadrant: None,
            },
            matched_rows: vec![3],
            high_support: false,
            low_variance: true,
            origin: RuleOrigin {
                trial: 0,
                generation: 0,
                individual: 0,
                node: 0,
                depth: attributes.len(),
            },
        }
    }

    #[test]
    fn test_duplicate_leaves_count_unchanged() {
        let mut pool = RulePool::new(10, DedupPolicy::AttributesAndDelays);
        assert_eq!(pool.register(rule(&[(1, 0), (4, 2)])), Registration::New);
        assert_eq!(pool.register(rule(&[(1, 0), (4, 2)])), Registration::Duplicate);
        assert_eq!(pool.len(), 1);
        // Same ids, other delays: a different rule under this policy
        assert_eq!(pool.register(rule(&[(1, 1), (4, 2)])), Registration::New);
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn test_attributes_only_policy() {
        let mut pool = RulePool::new(10, DedupPolicy::AttributesOnly);
        assert_eq!(pool.register(rule(&[(1, 0), (4, 2)])), Registration::New);
        assert_eq!(pool.register(rule(&[(1, 1), (4, 0)])), Registration::Duplicate);
        assert!(pool.contains(&[RuleAttribute { id: 1, delay: 3 }, RuleAttribute { id: 4, delay: 3 }]));
    }

    #[test]
    fn test_cap() {
        let mut pool = RulePool::new(2, DedupPolicy::AttributesAndDelays);
        pool.register(rule(&[(0, 0)]));
        pool.register(rule(&[(1, 0)]));
        assert!(pool.is_full());
        assert_eq!(pool.register(rule(&[(2, 0)])), Registration::Full);
        assert_eq!(pool.register(rule(&[(1, 0)])), Registration::Duplicate);
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn test_global_merge_appends_only_novel() {
        let mut global = GlobalRulePool::new(DedupPolicy::AttributesAndDelays);
        assert_eq!(global.merge(&[rule(&[(0, 0)]), rule(&[(1, 0)])]), 2);
        assert_eq!(global.merge(&[rule(&[(1, 0)]), rule(&[(2, 1)])]), 1);
        let ids: Vec<Vec<usize>> = global.get_all().iter().map(|r| r.attribute_ids()).collect();
        assert_eq!(ids, vec![vec![0], vec![1], vec![2]]);
    }
}
