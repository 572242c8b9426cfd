use serde::{Deserialize, Serialize};

/// Raw measurements recorded for one run.
///
/// All fields are optional in YAML; a missing value means "not tracked".
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RunFacts {
    /// Elapsed time in seconds.
    pub time: f64,
    pub course_faults: u32,
    pub table_used: bool,
    pub yards: f64,
    pub obstacles: u32,
    pub opening_points_earned: u32,
    pub closing_points_earned: u32,
    /// 1-based finishing place; 0 when not placed.
    pub placement: u32,
    pub qualified: bool,
    pub bonus_title_points: f64,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub needs_table_conversion: bool,
}

impl RunFacts {
    pub fn timed(time: f64, course_faults: u32) -> Self {
        Self {
            time,
            course_faults,
            ..Self::default()
        }
    }
}
