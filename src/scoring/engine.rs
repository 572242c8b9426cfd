use serde::{Deserialize, Serialize};

use super::facts::RunFacts;
use super::rule::ScoringRule;
use super::style::{is_time_only_family, ScoringStyle, ScoringType};
use crate::error::{Result, ScoringError};

/// Seconds conventionally spent on the table, excluded from speed metrics.
pub const TABLE_CROSSING_SECONDS: f64 = 5.0;

/// Divide by run time to get miles per hour on speed-only courses.
/// Kept as published so stored results stay comparable.
pub const MPH_MAGIC: f64 = 204.545;

/// Caller preferences that change how speed metrics are computed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct EvalOptions {
    /// Leave the table crossing time in when computing speed.
    pub table_time_included_in_yps: bool,
    /// Use the whole run time (not the opening time) for obstacles/second.
    pub run_time_in_obstacles_per_second: bool,
}

/// Everything derived from one run under one rule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunResult {
    pub scoring_type: ScoringType,
    pub time_faults: f64,
    pub score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yards_per_second: Option<f64>,
    /// Obstacles per second, or miles per hour for speed-only styles.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub obstacles_per_second: Option<f64>,
    pub title_points: f64,
    pub lifetime_points: f64,
    pub placement_points: f64,
    pub speed_points: u32,
    pub clean: bool,
    pub super_q_eligible: bool,
}

/// Evaluate a run with default speed options.
pub fn evaluate(rule: &ScoringRule, facts: &RunFacts) -> Result<RunResult> {
    evaluate_with(rule, facts, EvalOptions::default())
}

pub fn evaluate_with(
    rule: &ScoringRule,
    facts: &RunFacts,
    options: EvalOptions,
) -> Result<RunResult> {
    let (style, scoring_type) = check_rule(rule)?;

    let time_faults = compute_time_faults(rule, style, scoring_type, facts);
    let score = compute_score(rule, style, scoring_type, facts, time_faults);
    let clean = is_clean(rule, scoring_type, facts, time_faults);

    let result = RunResult {
        scoring_type,
        time_faults,
        score,
        yards_per_second: yards_per_second(rule, facts, options.table_time_included_in_yps),
        obstacles_per_second: speed_score(
            rule,
            facts,
            options.table_time_included_in_yps,
            options.run_time_in_obstacles_per_second,
        ),
        title_points: earned_points(rule, style, scoring_type, facts, time_faults, true),
        lifetime_points: earned_points(rule, style, scoring_type, facts, time_faults, false),
        placement_points: placement_points(rule, facts),
        speed_points: speed_points(rule, facts),
        clean,
        super_q_eligible: rule.has_super_q && clean,
    };

    tracing::debug!(
        rule = %rule.describe(),
        time = facts.time,
        time_faults = result.time_faults,
        score = result.score,
        title_points = result.title_points,
        "evaluated run"
    );
    Ok(result)
}

/// Reject rules the evaluator cannot score.
pub fn check_rule(rule: &ScoringRule) -> Result<(ScoringStyle, ScoringType)> {
    let Some(style) = rule.style else {
        return Err(ScoringError::Configuration(format!(
            "{}: scoring style is not recognized",
            rule.describe()
        )));
    };
    let scoring_type = rule.scoring_type();

    if !(rule.time_fault_multiplier >= 0.0) {
        return Err(ScoringError::Configuration(format!(
            "{}: time fault multiplier must be non-negative, got {}",
            rule.describe(),
            rule.time_fault_multiplier
        )));
    }
    let needs_sct = match scoring_type {
        ScoringType::ByOpenClose => true,
        ScoringType::ByPoints => {
            rule.sct2 > 0.0 || rule.compute_time_faults_under || rule.compute_time_faults_over
        }
        _ => false,
    };
    if needs_sct && rule.sct <= 0.0 {
        return Err(ScoringError::Configuration(format!(
            "{}: no SCT is set",
            rule.describe()
        )));
    }
    Ok((style, scoring_type))
}

/// The limit time faults are measured against.
pub fn effective_sct(rule: &ScoringRule) -> f64 {
    if rule.is_two_part() {
        rule.sct + rule.sct2
    } else {
        rule.sct
    }
}

/// Time faults for a run; zero for styles that never accrue them.
pub fn time_faults(rule: &ScoringRule, facts: &RunFacts) -> f64 {
    match rule.style {
        Some(style) => compute_time_faults(rule, style, rule.scoring_type(), facts),
        None => 0.0,
    }
}

fn compute_time_faults(
    rule: &ScoringRule,
    style: ScoringStyle,
    scoring_type: ScoringType,
    facts: &RunFacts,
) -> f64 {
    if !matches!(
        scoring_type,
        ScoringType::ByTime | ScoringType::ByOpenClose | ScoringType::ByPoints
    ) {
        return 0.0;
    }
    let limit = effective_sct(rule);
    if limit <= 0.0 {
        return 0.0;
    }

    let (under, over) = if is_time_only_family(style) {
        let over = style != ScoringStyle::TimePlusFaults || rule.compute_time_faults_over;
        (false, over)
    } else {
        (rule.compute_time_faults_under, rule.compute_time_faults_over)
    };

    let mut faults = 0.0;
    if under {
        // Fractions round up under the limit and down over it.
        let time = if rule.drop_fractions {
            facts.time.ceil()
        } else {
            facts.time
        };
        if time < limit {
            faults = limit - time;
        }
    }
    if over {
        let time = if rule.drop_fractions {
            facts.time.floor()
        } else {
            facts.time
        };
        if time > limit {
            faults = time - limit;
        }
    }
    faults * rule.time_fault_multiplier
}

/// Total score for a run, in the units of the rule's style.
pub fn score(rule: &ScoringRule, facts: &RunFacts) -> Result<f64> {
    let (style, scoring_type) = check_rule(rule)?;
    let time_faults = compute_time_faults(rule, style, scoring_type, facts);
    Ok(compute_score(rule, style, scoring_type, facts, time_faults))
}

fn compute_score(
    rule: &ScoringRule,
    style: ScoringStyle,
    scoring_type: ScoringType,
    facts: &RunFacts,
    time_faults: f64,
) -> f64 {
    match scoring_type {
        ScoringType::ByTime | ScoringType::BySpeed => {
            let faults = f64::from(facts.course_faults) + time_faults;
            match style {
                ScoringStyle::TimePlusFaults => faults + facts.time,
                ScoringStyle::Faults100ThenTime => (100.0 - faults).max(0.0),
                ScoringStyle::Faults200ThenTime => (200.0 - faults).max(0.0),
                _ => faults,
            }
        }
        ScoringType::ByOpenClose => {
            let mut pts = f64::from(facts.opening_points_earned)
                + f64::from(facts.closing_points_earned)
                - f64::from(facts.course_faults);
            if rule.subtract_time_faults_from_score {
                pts -= time_faults;
            }
            pts
        }
        ScoringType::ByPoints => {
            let mut pts =
                f64::from(facts.opening_points_earned) - f64::from(facts.course_faults);
            if rule.subtract_time_faults_from_score {
                pts -= time_faults;
            }
            pts
        }
        ScoringType::ByPass | ScoringType::Unknown => 0.0,
    }
}

fn table_adjusted_time(rule: &ScoringRule, facts: &RunFacts, table_time_included: bool) -> f64 {
    let time = facts.time;
    if (facts.table_used || rule.has_table) && time > TABLE_CROSSING_SECONDS && !table_time_included
    {
        time - TABLE_CROSSING_SECONDS
    } else {
        time
    }
}

/// Yards per second, for timed and speed styles with a measured course.
pub fn yards_per_second(
    rule: &ScoringRule,
    facts: &RunFacts,
    table_time_included: bool,
) -> Option<f64> {
    if !matches!(
        rule.scoring_type(),
        ScoringType::ByTime | ScoringType::BySpeed
    ) || facts.yards <= 0.0
        || facts.time <= 0.0
    {
        return None;
    }
    Some(facts.yards / table_adjusted_time(rule, facts, table_time_included))
}

/// Yards per second needed to finish exactly on SCT.
pub fn min_yards_per_second(
    rule: &ScoringRule,
    facts: &RunFacts,
    table_time_included: bool,
) -> Option<f64> {
    if rule.scoring_type() != ScoringType::ByTime || facts.yards <= 0.0 || rule.sct <= 0.0 {
        return None;
    }
    let mut time = rule.sct;
    if (facts.table_used || rule.has_table) && time > TABLE_CROSSING_SECONDS && !table_time_included
    {
        time -= TABLE_CROSSING_SECONDS;
    }
    Some(facts.yards / time)
}

/// Obstacles per second, or the miles-per-hour figure for speed-only styles.
pub fn speed_score(
    rule: &ScoringRule,
    facts: &RunFacts,
    table_time_included: bool,
    run_time_in_obstacles_per_second: bool,
) -> Option<f64> {
    let scoring_type = rule.scoring_type();
    if facts.time <= 0.0 || scoring_type == ScoringType::Unknown {
        return None;
    }
    if scoring_type == ScoringType::BySpeed {
        return Some(MPH_MAGIC / facts.time);
    }
    if facts.obstacles == 0 {
        return None;
    }
    let mut time = facts.time;
    if scoring_type == ScoringType::ByTime {
        time = table_adjusted_time(rule, facts, table_time_included);
    } else if scoring_type == ScoringType::ByOpenClose
        && !run_time_in_obstacles_per_second
        && rule.sct > 0.0
        && time > rule.sct
        && rule.sct2 > 0.0
    {
        // Only the opening counts.
        time = rule.sct;
    }
    Some(f64::from(facts.obstacles) / time)
}

fn requirements_met(rule: &ScoringRule, scoring_type: ScoringType, facts: &RunFacts) -> bool {
    let open = facts.opening_points_earned;
    let close = facts.closing_points_earned;
    match scoring_type {
        ScoringType::ByOpenClose => {
            (rule.required_opening_points <= open && rule.required_closing_points <= close)
                // Single requirement over both halves (tournament gambles)
                || (rule.required_closing_points == 0
                    && rule.required_opening_points <= open + close)
        }
        ScoringType::ByPoints => rule.required_opening_points <= open,
        _ => true,
    }
}

fn is_clean(
    rule: &ScoringRule,
    scoring_type: ScoringType,
    facts: &RunFacts,
    time_faults: f64,
) -> bool {
    match scoring_type {
        ScoringType::ByTime | ScoringType::BySpeed => {
            facts.course_faults == 0 && time_faults == 0.0
        }
        ScoringType::ByOpenClose | ScoringType::ByPoints => {
            requirements_met(rule, scoring_type, facts)
        }
        ScoringType::ByPass => facts.qualified,
        ScoringType::Unknown => false,
    }
}

/// Title or lifetime points, keyed by course faults.
fn earned_points(
    rule: &ScoringRule,
    style: ScoringStyle,
    scoring_type: ScoringType,
    facts: &RunFacts,
    time_faults: f64,
    title: bool,
) -> f64 {
    let eligible = match scoring_type {
        ScoringType::ByTime | ScoringType::BySpeed => {
            let faults = f64::from(facts.course_faults) + time_faults;
            if style != ScoringStyle::TimePlusFaults {
                true
            } else if rule.qs_must_be_clean && faults > 0.0 {
                false
            } else {
                // Raw-fault titling needs time plus penalties within SCT.
                !(title
                    && rule.titling_points_raw_faults
                    && rule.sct > 0.0
                    && facts.time + faults > rule.sct)
            }
        }
        ScoringType::ByOpenClose | ScoringType::ByPoints => {
            requirements_met(rule, scoring_type, facts)
        }
        ScoringType::ByPass => facts.qualified,
        ScoringType::Unknown => false,
    };
    if !eligible {
        return 0.0;
    }

    let table = if title {
        &rule.title_points
    } else {
        &rule.lifetime_points
    };
    let points = i32::try_from(facts.course_faults)
        .ok()
        .and_then(|faults| table.lookup(faults))
        .unwrap_or(0.0);
    // Pass/fail title points never carry the bonus.
    let bonus = if rule.has_bonus_points && !(title && scoring_type == ScoringType::ByPass) {
        facts.bonus_title_points
    } else {
        0.0
    };
    points + bonus
}

pub fn title_points(rule: &ScoringRule, facts: &RunFacts) -> Result<f64> {
    let (style, scoring_type) = check_rule(rule)?;
    let time_faults = compute_time_faults(rule, style, scoring_type, facts);
    Ok(earned_points(rule, style, scoring_type, facts, time_faults, true))
}

pub fn lifetime_points(rule: &ScoringRule, facts: &RunFacts) -> Result<f64> {
    let (style, scoring_type) = check_rule(rule)?;
    let time_faults = compute_time_faults(rule, style, scoring_type, facts);
    Ok(earned_points(rule, style, scoring_type, facts, time_faults, false))
}

pub fn placement_points(rule: &ScoringRule, facts: &RunFacts) -> f64 {
    rule.placement_points
        .lookup_place(facts.placement)
        .unwrap_or(0.0)
}

/// Whole seconds under SCT, scaled by the placement multiplier.
pub fn speed_points(rule: &ScoringRule, facts: &RunFacts) -> u32 {
    if !rule.has_speed_points || !facts.qualified || facts.time <= 0.0 || rule.sct <= 0.0 {
        return 0;
    }
    let mut pts = (rule.sct - facts.time).trunc().max(0.0);
    if facts.placement > 0 {
        if let Some(multiplier) = rule.speed_point_multipliers.lookup_place(facts.placement) {
            pts = (pts * multiplier).trunc();
        }
    }
    pts as u32
}
