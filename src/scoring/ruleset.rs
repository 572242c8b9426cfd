use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::rule::ScoringRule;
use crate::error::{Result, ScoringError};

/// Ordered scoring variants for one event.
///
/// Order only matters when more than one rule matches: the first wins.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct RuleSet {
    rules: Vec<ScoringRule>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rules(&self) -> &[ScoringRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn push(&mut self, rule: ScoringRule) {
        self.rules.push(rule);
    }

    /// Append a default rule (wildcard scope, always valid, faults then time).
    pub fn add_rule(&mut self) -> &mut ScoringRule {
        self.rules.push(ScoringRule::default());
        let last = self.rules.len() - 1;
        &mut self.rules[last]
    }

    /// Replace the rule at `index`. Returns the previous rule.
    pub fn replace(&mut self, index: usize, rule: ScoringRule) -> Option<ScoringRule> {
        self.rules
            .get_mut(index)
            .map(|slot| std::mem::replace(slot, rule))
    }

    /// All rules that apply, in set order.
    ///
    /// A `None` date matches every validity window. With
    /// `title_points_only`, rules that award neither title nor lifetime
    /// points are dropped.
    pub fn matching(
        &self,
        division: &str,
        level: &str,
        date: Option<NaiveDate>,
        title_points_only: bool,
    ) -> Vec<&ScoringRule> {
        self.rules
            .iter()
            .filter(|r| r.applies_to(division, level))
            .filter(|r| date.map_or(true, |d| r.is_valid_on(d)))
            .filter(|r| {
                !title_points_only || !r.title_points.is_empty() || !r.lifetime_points.is_empty()
            })
            .collect()
    }

    /// Pick the rule for a run: the first match in set order.
    pub fn resolve(&self, division: &str, level: &str, date: NaiveDate) -> Result<&ScoringRule> {
        let matches = self.matching(division, level, Some(date), false);
        match matches.as_slice() {
            [] => {
                tracing::debug!(division, level, %date, "no scoring rule matched");
                Err(ScoringError::NotFound {
                    division: division.to_string(),
                    level: level.to_string(),
                    date,
                })
            }
            [only] => Ok(*only),
            [first, rest @ ..] => {
                tracing::warn!(
                    division,
                    level,
                    %date,
                    extra = rest.len(),
                    chosen = %first.describe(),
                    "multiple scoring rules match, using the first"
                );
                Ok(*first)
            }
        }
    }

    pub fn verify(&self, division: &str, level: &str, date: NaiveDate) -> bool {
        !self.matching(division, level, Some(date), false).is_empty()
    }

    /// Pairs of rules with the same division/level whose windows overlap.
    pub fn detect_overlaps(&self) -> Vec<(&ScoringRule, &ScoringRule)> {
        let mut overlaps = Vec::new();
        for (i, a) in self.rules.iter().enumerate() {
            for b in &self.rules[i + 1..] {
                if a.division == b.division
                    && a.level == b.level
                    && a.validity().overlaps(&b.validity())
                {
                    overlaps.push((a, b));
                }
            }
        }
        overlaps
    }
}

impl From<Vec<ScoringRule>> for RuleSet {
    fn from(rules: Vec<ScoringRule>) -> Self {
        Self { rules }
    }
}

impl<'a> IntoIterator for &'a RuleSet {
    type Item = &'a ScoringRule;
    type IntoIter = std::slice::Iter<'a, ScoringRule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}
