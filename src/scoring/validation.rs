use super::rule::ScoringRule;
use super::ruleset::RuleSet;
use super::style::{ScoringStyle, ScoringType};

/// Validate one rule. `path` prefixes every message (e.g. "events[0].rules[2]").
/// Returns all validation errors at once (not just the first).
pub fn validate_rule(path: &str, rule: &ScoringRule) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();
    check_rule(path, rule, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate every rule in a set.
pub fn validate_rule_set(path: &str, rules: &RuleSet) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();
    for (i, rule) in rules.rules().iter().enumerate() {
        check_rule(&format!("{}[{}]", path, i), rule, &mut errors);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_rule(path: &str, rule: &ScoringRule, errors: &mut Vec<String>) {
    let Some(style) = rule.style else {
        errors.push(format!("{}.style: unknown scoring style", path));
        return;
    };

    if !rule.validity().is_well_formed() {
        errors.push(format!(
            "{}: valid_from is after valid_to ({}), rule never applies",
            path,
            rule.validity()
        ));
    }

    if rule.sct < 0.0 {
        errors.push(format!("{}.sct: must be non-negative", path));
    }
    if rule.sct2 < 0.0 {
        errors.push(format!("{}.sct2: must be non-negative", path));
    }
    if !(rule.time_fault_multiplier >= 0.0) {
        errors.push(format!(
            "{}.time_fault_multiplier: must be non-negative, got {}",
            path, rule.time_fault_multiplier
        ));
    }

    let scoring_type = style.scoring_type();
    let two_part = matches!(scoring_type, ScoringType::ByOpenClose | ScoringType::ByPoints);
    if rule.sct2 > 0.0 && !two_part {
        errors.push(format!("{}.sct2: only used by open/close and points styles", path));
    }
    if rule.sct <= 0.0
        && (scoring_type == ScoringType::ByOpenClose
            || (two_part && (rule.sct2 > 0.0 || time_faults_enabled(rule))))
    {
        errors.push(format!(
            "{}.sct: required for open/close styles and when time faults are computed",
            path
        ));
    }
    if rule.required_closing_points > 0 && style != ScoringStyle::OpenCloseScoreThenTime {
        errors.push(format!(
            "{}.required_closing_points: only used by {}",
            path,
            ScoringStyle::OpenCloseScoreThenTime.file_name()
        ));
    }
}

fn time_faults_enabled(rule: &ScoringRule) -> bool {
    rule.compute_time_faults_under || rule.compute_time_faults_over
}
