pub mod engine;
pub mod facts;
pub mod migration;
pub mod points;
pub mod rule;
pub mod ruleset;
pub mod style;
pub mod validation;

pub use engine::{evaluate, evaluate_with, EvalOptions, RunResult};
pub use facts::RunFacts;
pub use migration::{migrate, migrate_facts, FileVersion, MigrationContext, CURRENT_FILE_VERSION};
pub use points::{PointsEntry, PointsTable, ANY_PLACEMENT};
pub use rule::{ScopeName, ScoringRule, Validity, WILDCARD};
pub use ruleset::RuleSet;
pub use style::{classify, ScoringStyle, ScoringType, ALL_STYLES};
pub use validation::{validate_rule, validate_rule_set};
