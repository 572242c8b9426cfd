use anyhow::{bail, Context};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use super::facts::RunFacts;
use super::points::PointsTable;
use super::rule::ScoringRule;
use super::style::{ScoringStyle, ScoringType};

/// Save-file format version, compared major first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FileVersion {
    pub major: u16,
    pub minor: u16,
}

impl FileVersion {
    pub const fn new(major: u16, minor: u16) -> Self {
        Self { major, minor }
    }

    /// Parse "major.minor" (a bare major means minor 0).
    pub fn parse(s: &str) -> anyhow::Result<Self> {
        let s = s.trim();
        let (major, minor) = match s.split_once('.') {
            Some((major, minor)) => (major, minor),
            None => (s, "0"),
        };
        if major.is_empty() {
            bail!("Invalid file version: '{}'", s);
        }
        let major = major
            .parse()
            .with_context(|| format!("Invalid file version major in '{}'", s))?;
        let minor = minor
            .parse()
            .with_context(|| format!("Invalid file version minor in '{}'", s))?;
        Ok(Self { major, minor })
    }
}

impl fmt::Display for FileVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl FromStr for FileVersion {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for FileVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FileVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        FileVersion::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Newest format this crate writes.
pub const CURRENT_FILE_VERSION: FileVersion = FileVersion::new(15, 3);
/// Files older than this stored `TableInYPS` instead of a table flag.
pub const TABLE_ATTRIBUTE_VERSION: FileVersion = FileVersion::new(8, 6);
/// Files older than this may carry a stale table flag.
pub const TABLE_TRACKING_VERSION: FileVersion = FileVersion::new(12, 6);
/// Files older than this had fixed speed point multipliers.
pub const PLACE_MULTIPLIER_VERSION: FileVersion = FileVersion::new(12, 3);
/// Files at or below this implied dropped fractions for 100-minus-faults.
pub const IMPLIED_DROP_FRACTIONS_VERSION: FileVersion = FileVersion::new(3, 0);

/// Inputs to [`migrate`] besides the data being fixed up.
#[derive(Debug, Clone, Copy)]
pub struct MigrationContext<'a> {
    /// Format of the file the data was read from.
    pub file_version: FileVersion,
    /// Venue configuration version the file was saved against.
    pub prior_config_version: u16,
    /// Raw `TableInYPS` attribute, when an old file stored one.
    pub table_in_yps: Option<bool>,
    /// Rule from the current configuration for the run's event/division/level.
    pub current_rule: Option<&'a ScoringRule>,
}

impl<'a> MigrationContext<'a> {
    pub fn new(file_version: FileVersion, prior_config_version: u16) -> Self {
        Self {
            file_version,
            prior_config_version,
            table_in_yps: None,
            current_rule: None,
        }
    }

    pub fn needs_migration(&self) -> bool {
        self.file_version < CURRENT_FILE_VERSION
    }
}

/// Correct flags whose stored meaning changed between file formats.
///
/// Every step is gated on `ctx.file_version`, so running the migration
/// again on its own output changes nothing.
pub fn migrate(
    mut rule: ScoringRule,
    mut facts: RunFacts,
    ctx: &MigrationContext<'_>,
) -> (ScoringRule, RunFacts) {
    if !ctx.needs_migration() {
        return (rule, facts);
    }
    let version = ctx.file_version;

    if version <= IMPLIED_DROP_FRACTIONS_VERSION
        && rule.style == Some(ScoringStyle::Faults100ThenTime)
    {
        rule.drop_fractions = true;
    }

    if version < PLACE_MULTIPLIER_VERSION
        && rule.has_speed_points
        && rule.speed_point_multipliers.is_empty()
    {
        // Only 1st and 2nd place scaled speed points in these files.
        rule.speed_point_multipliers = PointsTable::default_speed_multipliers();
    }

    if rule.scoring_type() == ScoringType::ByTime {
        if version < TABLE_ATTRIBUTE_VERSION {
            // TableInYPS=false means the speed was adjusted for a table.
            // Anything else is undecided until the configuration is merged.
            let had_table = ctx.table_in_yps == Some(false);
            if had_table {
                rule.has_table = true;
                facts.table_used = true;
            }
            rule.needs_table_conversion = !had_table;
            facts.needs_table_conversion = !had_table;
            tracing::debug!(
                %version,
                table_in_yps = ?ctx.table_in_yps,
                had_table,
                "migrated TableInYPS attribute"
            );
        }

        // A v2 configuration still being merged forward must keep the flag.
        if (rule.has_table || facts.table_used)
            && version < TABLE_TRACKING_VERSION
            && ctx.prior_config_version >= 3
        {
            if let Some(current) = ctx.current_rule {
                if !current.has_table {
                    tracing::warn!(
                        %version,
                        rule = %rule.describe(),
                        "clearing table flag not present in current configuration"
                    );
                    rule.has_table = false;
                    facts.table_used = false;
                }
            }
        }
    }

    (rule, facts)
}

/// Migrate saved run facts only, judged against the current configuration rule.
///
/// Without a current rule there is nothing to judge the facts against, so
/// they come back unchanged.
pub fn migrate_facts(facts: RunFacts, ctx: &MigrationContext<'_>) -> RunFacts {
    match ctx.current_rule {
        Some(current) => migrate(current.clone(), facts, ctx).1,
        None => facts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timed_rule() -> ScoringRule {
        let mut rule = ScoringRule::new(ScoringStyle::FaultsThenTime);
        rule.sct = 60.0;
        rule
    }

    #[test]
    fn test_parse_version() {
        assert_eq!(FileVersion::parse("12.6").unwrap(), FileVersion::new(12, 6));
        assert_eq!(FileVersion::parse(" 8 ").unwrap(), FileVersion::new(8, 0));
        assert!(FileVersion::parse("x.1").is_err());
        assert!(FileVersion::parse(".1").is_err());
        assert!(FileVersion::parse("").is_err());
    }

    #[test]
    fn test_version_ordering() {
        assert!(FileVersion::new(8, 5) < TABLE_ATTRIBUTE_VERSION);
        assert!(FileVersion::new(8, 10) > TABLE_ATTRIBUTE_VERSION);
        assert!(FileVersion::new(12, 5) < FileVersion::new(13, 0));
        assert_eq!(FileVersion::new(12, 6).to_string(), "12.6");
    }

    #[test]
    fn test_current_files_untouched() {
        let mut rule = timed_rule();
        rule.has_table = true;
        let facts = RunFacts::timed(50.0, 0);
        let mut ctx = MigrationContext::new(CURRENT_FILE_VERSION, 5);
        ctx.table_in_yps = Some(true);
        let (migrated, migrated_facts) = migrate(rule.clone(), facts.clone(), &ctx);
        assert_eq!(migrated, rule);
        assert_eq!(migrated_facts, facts);
    }

    #[test]
    fn test_table_in_yps_false_sets_table() {
        let mut ctx = MigrationContext::new(FileVersion::new(8, 4), 2);
        ctx.table_in_yps = Some(false);
        let (rule, facts) = migrate(timed_rule(), RunFacts::timed(50.0, 0), &ctx);
        assert!(rule.has_table);
        assert!(facts.table_used);
        assert!(!rule.needs_table_conversion);
        assert!(!facts.needs_table_conversion);
    }

    #[test]
    fn test_table_in_yps_true_or_missing_needs_conversion() {
        for table_in_yps in [Some(true), None] {
            let mut ctx = MigrationContext::new(FileVersion::new(8, 5), 2);
            ctx.table_in_yps = table_in_yps;
            let (rule, facts) = migrate(timed_rule(), RunFacts::timed(50.0, 0), &ctx);
            assert!(!rule.has_table);
            assert!(rule.needs_table_conversion);
            assert!(facts.needs_table_conversion);
        }
    }

    #[test]
    fn test_stale_table_cleared_against_current_config() {
        let current = timed_rule();
        let mut rule = timed_rule();
        rule.has_table = true;
        let mut facts = RunFacts::timed(50.0, 0);
        facts.table_used = true;

        let mut ctx = MigrationContext::new(FileVersion::new(12, 5), 3);
        ctx.current_rule = Some(&current);
        let (rule, facts) = migrate(rule, facts, &ctx);
        assert!(!rule.has_table);
        assert!(!facts.table_used);
    }

    #[test]
    fn test_stale_table_kept_for_v2_config() {
        let current = timed_rule();
        let mut rule = timed_rule();
        rule.has_table = true;
        let mut ctx = MigrationContext::new(FileVersion::new(12, 5), 2);
        ctx.current_rule = Some(&current);
        let (rule, _) = migrate(rule, RunFacts::default(), &ctx);
        assert!(rule.has_table);
    }

    #[test]
    fn test_table_kept_when_current_config_has_table() {
        let mut current = timed_rule();
        current.has_table = true;
        let mut rule = timed_rule();
        rule.has_table = true;
        let mut ctx = MigrationContext::new(FileVersion::new(10, 0), 4);
        ctx.current_rule = Some(&current);
        let (rule, _) = migrate(rule, RunFacts::default(), &ctx);
        assert!(rule.has_table);
    }

    #[test]
    fn test_table_kept_after_tracking_fixed() {
        let current = timed_rule();
        let mut rule = timed_rule();
        rule.has_table = true;
        let mut ctx = MigrationContext::new(FileVersion::new(12, 6), 4);
        ctx.current_rule = Some(&current);
        let (rule, _) = migrate(rule, RunFacts::default(), &ctx);
        assert!(rule.has_table);
    }

    #[test]
    fn test_migrate_is_idempotent() {
        let current = timed_rule();
        let mut rule = timed_rule();
        rule.has_speed_points = true;
        let mut ctx = MigrationContext::new(FileVersion::new(8, 4), 3);
        ctx.table_in_yps = Some(false);
        ctx.current_rule = Some(&current);

        let once = migrate(rule, RunFacts::timed(50.0, 0), &ctx);
        let twice = migrate(once.0.clone(), once.1.clone(), &ctx);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_old_faults_100_drops_fractions() {
        let rule = ScoringRule::new(ScoringStyle::Faults100ThenTime);
        let ctx = MigrationContext::new(FileVersion::new(3, 0), 1);
        let (rule, _) = migrate(rule, RunFacts::default(), &ctx);
        assert!(rule.drop_fractions);

        let rule = ScoringRule::new(ScoringStyle::Faults100ThenTime);
        let ctx = MigrationContext::new(FileVersion::new(3, 1), 1);
        let (rule, _) = migrate(rule, RunFacts::default(), &ctx);
        assert!(!rule.drop_fractions);
    }

    #[test]
    fn test_old_speed_points_get_default_multipliers() {
        let mut rule = timed_rule();
        rule.has_speed_points = true;
        let ctx = MigrationContext::new(FileVersion::new(12, 2), 3);
        let (rule, _) = migrate(rule, RunFacts::default(), &ctx);
        assert_eq!(rule.speed_point_multipliers.lookup(1), Some(2.0));
        assert_eq!(rule.speed_point_multipliers.lookup(2), Some(1.5));
    }

    #[test]
    fn test_migrate_facts_leaves_current_rule_alone() {
        let mut current = ScoringRule::new(ScoringStyle::Faults100ThenTime);
        current.sct = 60.0;
        let mut ctx = MigrationContext::new(FileVersion::new(3, 0), 1);
        ctx.table_in_yps = Some(false);
        ctx.current_rule = Some(&current);

        let facts = migrate_facts(RunFacts::timed(50.0, 0), &ctx);
        assert!(facts.table_used);
        assert!(!current.drop_fractions);
        assert!(!current.has_table);

        ctx.current_rule = None;
        assert_eq!(migrate_facts(RunFacts::timed(50.0, 0), &ctx), RunFacts::timed(50.0, 0));
    }

    #[test]
    fn test_non_timed_rules_keep_table() {
        let mut rule = ScoringRule::new(ScoringStyle::OpenCloseScoreThenTime);
        rule.has_table = true;
        let current = ScoringRule::new(ScoringStyle::OpenCloseScoreThenTime);
        let mut ctx = MigrationContext::new(FileVersion::new(8, 0), 3);
        ctx.current_rule = Some(&current);
        let (rule, _) = migrate(rule, RunFacts::default(), &ctx);
        assert!(rule.has_table);
        assert!(!rule.needs_table_conversion);
    }
}
