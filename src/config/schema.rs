use serde::{Deserialize, Serialize};

use crate::scoring::{PointsTable, RuleSet, ScoringRule, ScoringStyle};

/// Configuration version written by `init`.
pub const CONFIG_VERSION: u16 = 3;

/// A venue's scoring configuration: one rule set per event.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct VenueConfig {
    #[serde(default = "default_version")]
    pub version: u16,
    #[serde(default)]
    pub events: Vec<EventConfig>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct EventConfig {
    pub name: String,
    #[serde(default)]
    pub rules: RuleSet,
}

fn default_version() -> u16 {
    CONFIG_VERSION
}

impl VenueConfig {
    /// Look up an event by name (case-sensitive).
    pub fn find_event(&self, name: &str) -> Option<&EventConfig> {
        self.events.iter().find(|e| e.name == name)
    }

    /// Small working configuration used by `init`.
    pub fn starter() -> Self {
        let mut standard = ScoringRule::new(ScoringStyle::FaultsThenTime).scoped("*", "Novice");
        standard.sct = 60.0;
        standard.compute_time_faults_over = true;
        standard.title_points = PointsTable::from_pairs([(0, 10.0)]).unwrap_or_default();
        standard.note = "Clean runs earn 10 title points".to_string();

        let mut gamblers = ScoringRule::new(ScoringStyle::OpenCloseScoreThenTime);
        gamblers.sct = 30.0;
        gamblers.sct2 = 15.0;
        gamblers.required_opening_points = 20;
        gamblers.required_closing_points = 8;
        gamblers.compute_time_faults_over = true;
        gamblers.subtract_time_faults_from_score = true;
        gamblers.title_points = PointsTable::from_pairs([(0, 5.0)]).unwrap_or_default();

        Self {
            version: CONFIG_VERSION,
            events: vec![
                EventConfig {
                    name: "Standard".to_string(),
                    rules: RuleSet::from(vec![standard]),
                },
                EventConfig {
                    name: "Gamblers".to_string(),
                    rules: RuleSet::from(vec![gamblers]),
                },
            ],
        }
    }
}
