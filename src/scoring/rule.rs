use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;

use super::points::PointsTable;
use super::style::{self, ScoringStyle, ScoringType};

/// Wildcard marker for division/level names in venue files.
pub const WILDCARD: &str = "*";

/// A division or level a rule is scoped to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum ScopeName {
    #[default]
    Wildcard,
    Named(String),
}

impl ScopeName {
    pub fn named(name: impl Into<String>) -> Self {
        ScopeName::Named(name.into())
    }

    /// Whether a rule scoped to `self` applies to `name`.
    pub fn matches(&self, name: &str) -> bool {
        match self {
            ScopeName::Wildcard => true,
            ScopeName::Named(n) => n == name,
        }
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, ScopeName::Wildcard)
    }

    pub fn as_str(&self) -> &str {
        match self {
            ScopeName::Wildcard => WILDCARD,
            ScopeName::Named(n) => n,
        }
    }
}

impl From<&str> for ScopeName {
    fn from(s: &str) -> Self {
        if s == WILDCARD {
            ScopeName::Wildcard
        } else {
            ScopeName::Named(s.to_string())
        }
    }
}

impl fmt::Display for ScopeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ScopeName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ScopeName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(ScopeName::from(s.as_str()))
    }
}

/// Closed date window; `None` leaves that side unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Validity {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl Validity {
    pub fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        Self { from, to }
    }

    /// Whether `date` falls in the window. A window with `from > to`
    /// contains nothing.
    pub fn contains(&self, date: NaiveDate) -> bool {
        if let Some(from) = self.from {
            if date < from {
                return false;
            }
        }
        if let Some(to) = self.to {
            if date > to {
                return false;
            }
        }
        true
    }

    pub fn is_well_formed(&self) -> bool {
        match (self.from, self.to) {
            (Some(from), Some(to)) => from <= to,
            _ => true,
        }
    }

    /// Overlap check used for configuration warnings. Endpoints that
    /// touch count as overlapping.
    pub fn overlaps(&self, other: &Validity) -> bool {
        if self.from.is_none() && other.from.is_none() {
            return true;
        }
        if self.to.is_none() && other.to.is_none() {
            return true;
        }
        // A missing end is unbounded on that side.
        let starts_before_other_ends = match (self.from, other.to) {
            (Some(from), Some(to)) => from <= to,
            _ => true,
        };
        let other_starts_before_end = match (other.from, self.to) {
            (Some(from), Some(to)) => from <= to,
            _ => true,
        };
        starts_before_other_ends && other_starts_before_end
    }
}

impl fmt::Display for Validity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let from = self.from.map(|d| d.to_string()).unwrap_or_default();
        let to = self.to.map(|d| d.to_string()).unwrap_or_default();
        write!(f, "[{}..{}]", from, to)
    }
}

fn default_multiplier() -> f64 {
    1.0
}

/// One configured scoring variant for an event.
///
/// Example YAML:
/// ```yaml
/// division: "*"
/// level: Novice
/// style: FaultsThenTime
/// valid_from: "2020-01-01"
/// sct: 60
/// drop_fractions: true
/// title_points:
///   - { breakpoint: 0, points: 10 }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ScoringRule {
    pub division: ScopeName,
    pub level: ScopeName,

    /// `None` when the file named a style this build does not know.
    #[serde(with = "style::lenient")]
    pub style: Option<ScoringStyle>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_from: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_to: Option<NaiveDate>,

    /// Standard course time.
    pub sct: f64,
    /// Second SCT, used by two-part (gamble) styles.
    pub sct2: f64,

    pub required_opening_points: u32,
    /// Only meaningful for [`ScoringStyle::OpenCloseScoreThenTime`].
    pub required_closing_points: u32,

    pub drop_fractions: bool,
    #[serde(default = "default_multiplier")]
    pub time_fault_multiplier: f64,
    pub qs_must_be_clean: bool,
    pub compute_time_faults_under: bool,
    pub compute_time_faults_over: bool,
    pub subtract_time_faults_from_score: bool,
    /// TimePlusFaults: title points only when time plus faults is within SCT.
    pub titling_points_raw_faults: bool,

    pub has_table: bool,
    pub has_super_q: bool,
    pub has_speed_points: bool,
    pub has_bonus_points: bool,

    pub title_points: PointsTable,
    pub lifetime_points: PointsTable,
    pub placement_points: PointsTable,
    /// Speed point multiplier per placement.
    pub speed_point_multipliers: PointsTable,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub note: String,
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub sub_names: BTreeSet<String>,

    /// Set by migration when an old file left the table flag undecided.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub needs_table_conversion: bool,
}

impl Default for ScoringRule {
    fn default() -> Self {
        Self {
            division: ScopeName::Wildcard,
            level: ScopeName::Wildcard,
            style: Some(ScoringStyle::FaultsThenTime),
            valid_from: None,
            valid_to: None,
            sct: 0.0,
            sct2: 0.0,
            required_opening_points: 0,
            required_closing_points: 0,
            drop_fractions: false,
            time_fault_multiplier: 1.0,
            qs_must_be_clean: false,
            compute_time_faults_under: false,
            compute_time_faults_over: false,
            subtract_time_faults_from_score: false,
            titling_points_raw_faults: false,
            has_table: false,
            has_super_q: false,
            has_speed_points: false,
            has_bonus_points: false,
            title_points: PointsTable::new(),
            lifetime_points: PointsTable::new(),
            placement_points: PointsTable::new(),
            speed_point_multipliers: PointsTable::new(),
            note: String::new(),
            sub_names: BTreeSet::new(),
            needs_table_conversion: false,
        }
    }
}

impl ScoringRule {
    /// A rule of the given style that applies everywhere, always.
    pub fn new(style: ScoringStyle) -> Self {
        Self {
            style: Some(style),
            ..Self::default()
        }
    }

    pub fn scoped(mut self, division: impl Into<ScopeName>, level: impl Into<ScopeName>) -> Self {
        self.division = division.into();
        self.level = level.into();
        self
    }

    pub fn valid_between(mut self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        self.valid_from = from;
        self.valid_to = to;
        self
    }

    pub fn scoring_type(&self) -> ScoringType {
        style::classify_opt(self.style)
    }

    pub fn validity(&self) -> Validity {
        Validity::new(self.valid_from, self.valid_to)
    }

    pub fn is_valid_on(&self, date: NaiveDate) -> bool {
        self.validity().contains(date)
    }

    pub fn applies_to(&self, division: &str, level: &str) -> bool {
        self.division.matches(division) && self.level.matches(level)
    }

    /// Two-part styles add the second SCT to the limit.
    pub fn is_two_part(&self) -> bool {
        matches!(
            self.scoring_type(),
            ScoringType::ByOpenClose | ScoringType::ByPoints
        ) && self.sct2 > 0.0
    }

    /// Short description used in logs and listings.
    pub fn describe(&self) -> String {
        let style = self
            .style
            .map(|s| s.label().to_string())
            .unwrap_or_else(|| "Unknown".to_string());
        format!("{}/{} {} {}", self.division, self.level, self.validity(), style)
    }
}
