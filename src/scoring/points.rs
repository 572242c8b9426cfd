use serde::{Deserialize, Serialize};

use crate::error::{Result, ScoringError};

/// Placement breakpoint that applies to any placement without its own entry.
pub const ANY_PLACEMENT: i32 = -1;

/// One row of a points table.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PointsEntry {
    /// Fault count or finishing place, depending on the table.
    pub breakpoint: i32,
    pub points: f64,
}

/// Break-point lookup table used for title, lifetime and placement points.
///
/// Entries are unique by breakpoint and kept sorted so the table always
/// serializes the same way.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(try_from = "Vec<PointsEntry>", into = "Vec<PointsEntry>")]
pub struct PointsTable {
    entries: Vec<PointsEntry>,
}

impl PointsTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Speed point multipliers used before files stored their own:
    /// 1st place doubles, 2nd place gets half again.
    pub fn default_speed_multipliers() -> Self {
        Self {
            entries: vec![
                PointsEntry { breakpoint: 1, points: 2.0 },
                PointsEntry { breakpoint: 2, points: 1.5 },
            ],
        }
    }

    /// Build a table from `(breakpoint, points)` pairs.
    pub fn from_pairs<I>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (i32, f64)>,
    {
        let mut table = Self::new();
        for (breakpoint, points) in pairs {
            table.insert(breakpoint, points)?;
        }
        Ok(table)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> &[PointsEntry] {
        &self.entries
    }

    /// Exact-match lookup. No interpolation, no nearest entry.
    pub fn lookup(&self, breakpoint: i32) -> Option<f64> {
        self.entries
            .iter()
            .find(|e| e.breakpoint == breakpoint)
            .map(|e| e.points)
    }

    /// Placement lookup: an exact entry, else the [`ANY_PLACEMENT`] entry
    /// for any real (positive) placement.
    pub fn lookup_place(&self, place: u32) -> Option<f64> {
        let Ok(breakpoint) = i32::try_from(place) else {
            return None;
        };
        self.lookup(breakpoint).or_else(|| {
            if place > 0 {
                self.lookup(ANY_PLACEMENT)
            } else {
                None
            }
        })
    }

    pub fn insert(&mut self, breakpoint: i32, points: f64) -> Result<()> {
        if self.lookup(breakpoint).is_some() {
            return Err(ScoringError::DuplicateBreakpoint(breakpoint));
        }
        self.entries.push(PointsEntry { breakpoint, points });
        self.sort();
        Ok(())
    }

    /// Remove the entry at `breakpoint`. Returns false if there was none.
    pub fn delete(&mut self, breakpoint: i32) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.breakpoint != breakpoint);
        self.entries.len() != before
    }

    fn sort(&mut self) {
        self.entries.sort_by_key(|e| e.breakpoint);
    }
}

impl TryFrom<Vec<PointsEntry>> for PointsTable {
    type Error = ScoringError;

    fn try_from(entries: Vec<PointsEntry>) -> Result<Self> {
        Self::from_pairs(entries.into_iter().map(|e| (e.breakpoint, e.points)))
    }
}

impl From<PointsTable> for Vec<PointsEntry> {
    fn from(table: PointsTable) -> Self {
        table.entries
    }
}
