use chrono::NaiveDate;
use thiserror::Error;

/// Errors returned by the scoring engine.
///
/// Overlapping rule windows are not represented here: they are reported by
/// [`RuleSet::detect_overlaps`](crate::scoring::RuleSet::detect_overlaps) and
/// never block resolution or evaluation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScoringError {
    /// The rule cannot be evaluated as configured (unknown style, missing SCT, ...).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// No rule in the set applies to the requested division/level/date.
    #[error("no scoring rule for division '{division}', level '{level}' on {date}")]
    NotFound {
        division: String,
        level: String,
        date: NaiveDate,
    },

    /// A points table already has an entry at this breakpoint.
    #[error("duplicate breakpoint {0} in points table")]
    DuplicateBreakpoint(i32),
}

pub type Result<T> = std::result::Result<T, ScoringError>;
