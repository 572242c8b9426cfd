use std::io::IsTerminal;
use owo_colors::OwoColorize;
use terminal_size::{Width, terminal_size};

use crate::scoring::{RunResult, ScoringRule, ScoringType};

/// Check if stdout is a TTY (for auto-detecting color support)
pub fn should_use_colors() -> bool {
    std::io::stdout().is_terminal()
}

/// Format a number without a trailing ".0" (10.0 -> "10", 2.5 -> "2.5")
pub fn format_number(value: f64) -> String {
    let formatted = format!("{:.3}", value);
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    if trimmed == "-0" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Get terminal width, defaulting to None for pipes (unlimited)
fn get_terminal_width() -> Option<usize> {
    terminal_size().map(|(Width(w), _)| w as usize)
}

/// Truncate text to fit available width, accounting for Unicode
fn truncate(text: &str, max_width: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= max_width {
        text.to_string()
    } else if max_width > 3 {
        format!("{}...", chars[..max_width - 3].iter().collect::<String>())
    } else {
        chars[..max_width].iter().collect()
    }
}

fn style_label(rule: &ScoringRule) -> &'static str {
    rule.style.map(|s| s.label()).unwrap_or("Unknown")
}

/// Format rules as one line each: index, scope, validity, style, note
pub fn format_rule_list(rules: &[ScoringRule], use_colors: bool) -> String {
    if rules.is_empty() {
        return "No scoring rules defined.".to_string();
    }

    let term_width = get_terminal_width();

    rules
        .iter()
        .enumerate()
        .map(|(idx, rule)| {
            let index_str = format!("{:>2}.", idx + 1);
            let scope = format!("{}/{}", rule.division, rule.level);
            let mut line = if use_colors {
                format!(
                    "{} {}  {}  {}",
                    index_str.dimmed(),
                    scope.cyan(),
                    rule.validity(),
                    style_label(rule).bold()
                )
            } else {
                format!(
                    "{} {}  {}  {}",
                    index_str,
                    scope,
                    rule.validity(),
                    style_label(rule)
                )
            };

            if !rule.note.is_empty() {
                // Note fills whatever room the fixed columns leave
                let fixed_width = index_str.len()
                    + scope.chars().count()
                    + rule.validity().to_string().len()
                    + style_label(rule).len()
                    + 7;
                let note = match term_width {
                    Some(width) if width > fixed_width + 10 => {
                        truncate(&rule.note, width - fixed_width)
                    }
                    Some(_) => truncate(&rule.note, 20),
                    None => rule.note.clone(),
                };
                line.push_str("  ");
                if use_colors {
                    line.push_str(&note.dimmed().to_string());
                } else {
                    line.push_str(&note);
                }
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format a single rule with detailed multi-line output
pub fn format_rule_detail(rule: &ScoringRule, use_colors: bool) -> String {
    let mut lines = Vec::new();
    let heading = format!("{}/{}", rule.division, rule.level);
    if use_colors {
        lines.push(format!("{}  {}", heading.bold(), style_label(rule).cyan()));
    } else {
        lines.push(format!("{}  {}", heading, style_label(rule)));
    }
    lines.push(format!("  Valid: {}", rule.validity()));
    if rule.sct > 0.0 {
        lines.push(format!("  SCT: {}", format_number(rule.sct)));
    }
    if rule.sct2 > 0.0 {
        lines.push(format!("  SCT2: {}", format_number(rule.sct2)));
    }
    if rule.scoring_type() == ScoringType::ByOpenClose {
        lines.push(format!(
            "  Required: {} opening / {} closing",
            rule.required_opening_points, rule.required_closing_points
        ));
    } else if rule.scoring_type() == ScoringType::ByPoints {
        lines.push(format!("  Required: {} points", rule.required_opening_points));
    }
    if rule.time_fault_multiplier != 1.0 {
        lines.push(format!(
            "  Time fault multiplier: {}",
            format_number(rule.time_fault_multiplier)
        ));
    }

    let flags: Vec<&str> = [
        (rule.drop_fractions, "drop fractions"),
        (rule.compute_time_faults_under, "time faults under"),
        (rule.compute_time_faults_over, "time faults over"),
        (rule.subtract_time_faults_from_score, "subtract time faults"),
        (rule.qs_must_be_clean, "Qs must be clean"),
        (rule.has_table, "table"),
        (rule.has_super_q, "super Q"),
        (rule.has_speed_points, "speed points"),
        (rule.has_bonus_points, "bonus points"),
    ]
    .into_iter()
    .filter_map(|(set, name)| set.then_some(name))
    .collect();
    if !flags.is_empty() {
        lines.push(format!("  Options: {}", flags.join(", ")));
    }

    for (label, table) in [
        ("Title points", &rule.title_points),
        ("Lifetime points", &rule.lifetime_points),
        ("Placement points", &rule.placement_points),
        ("Speed multipliers", &rule.speed_point_multipliers),
    ] {
        if table.is_empty() {
            continue;
        }
        let entries = table
            .entries()
            .iter()
            .map(|e| format!("{}={}", e.breakpoint, format_number(e.points)))
            .collect::<Vec<_>>()
            .join(" ");
        lines.push(format!("  {}: {}", label, entries));
    }
    if !rule.note.is_empty() {
        lines.push(format!("  Note: {}", rule.note));
    }
    lines.join("\n")
}

/// Format an evaluated run as aligned label/value rows
pub fn format_run_result(result: &RunResult, use_colors: bool) -> String {
    let mut rows: Vec<(&str, String)> = vec![
        ("Scoring", format!("{:?}", result.scoring_type)),
        ("Score", format_number(result.score)),
        ("Time faults", format_number(result.time_faults)),
    ];
    if let Some(yps) = result.yards_per_second {
        rows.push(("Yards/sec", format!("{:.2}", yps)));
    }
    if let Some(ops) = result.obstacles_per_second {
        let label = if result.scoring_type == ScoringType::BySpeed {
            "MPH"
        } else {
            "Obstacles/sec"
        };
        rows.push((label, format!("{:.3}", ops)));
    }
    rows.push(("Title points", format_number(result.title_points)));
    rows.push(("Lifetime points", format_number(result.lifetime_points)));
    if result.placement_points > 0.0 {
        rows.push(("Placement points", format_number(result.placement_points)));
    }
    if result.speed_points > 0 {
        rows.push(("Speed points", result.speed_points.to_string()));
    }
    rows.push(("Clean", if result.clean { "yes" } else { "no" }.to_string()));
    if result.super_q_eligible {
        rows.push(("Super Q", "eligible".to_string()));
    }

    let label_width = rows.iter().map(|(label, _)| label.len()).max().unwrap_or(0);
    rows.into_iter()
        .map(|(label, value)| {
            let label = format!("{:<width$}", label, width = label_width);
            if use_colors {
                format!("{}  {}", label.dimmed(), value.bold())
            } else {
                format!("{}  {}", label, value)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format overlapping rule pairs for one event as warnings
pub fn format_overlaps(
    event: &str,
    overlaps: &[(&ScoringRule, &ScoringRule)],
    use_colors: bool,
) -> String {
    overlaps
        .iter()
        .map(|(a, b)| {
            let prefix = "warning:";
            let message = format!(
                "{}: {}/{} windows {} and {} overlap; the first listed wins",
                event,
                a.division,
                a.level,
                a.validity(),
                b.validity()
            );
            if use_colors {
                format!("{} {}", prefix.yellow().bold(), message)
            } else {
                format!("{} {}", prefix, message)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::{evaluate, PointsTable, RunFacts, ScoringStyle};
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample_rule() -> ScoringRule {
        let mut rule = ScoringRule::new(ScoringStyle::FaultsThenTime).scoped("Open", "Novice");
        rule.sct = 60.0;
        rule.compute_time_faults_over = true;
        rule.title_points = PointsTable::from_pairs([(0, 10.0)]).unwrap();
        rule.note = "Standard course".to_string();
        rule
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(10.0), "10");
        assert_eq!(format_number(2.5), "2.5");
        assert_eq!(format_number(0.0), "0");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(40.909), "40.909");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a longer note", 8), "a lon...");
        assert_eq!(truncate("abcdef", 3), "abc");
    }

    #[test]
    fn test_format_rule_list_empty() {
        assert_eq!(format_rule_list(&[], false), "No scoring rules defined.");
    }

    #[test]
    fn test_format_rule_list() {
        let result = format_rule_list(&[sample_rule()], false);
        assert!(result.starts_with(" 1. Open/Novice"));
        assert!(result.contains("[..]"));
        assert!(result.contains("Faults, then Time"));
        assert!(result.ends_with("Standard course"));
    }

    #[test]
    fn test_format_rule_detail() {
        let result = format_rule_detail(&sample_rule(), false);
        assert!(result.starts_with("Open/Novice"));
        assert!(result.contains("SCT: 60"));
        assert!(result.contains("Options: time faults over"));
        assert!(result.contains("Title points: 0=10"));
        assert!(result.contains("Note: Standard course"));
    }

    #[test]
    fn test_format_run_result() {
        let result = evaluate(&sample_rule(), &RunFacts::timed(62.4, 0)).unwrap();
        let text = format_run_result(&result, false);
        // Labels pad to "Lifetime points"
        assert!(text.contains(&format!("{:<15}  {}", "Time faults", "2.4")));
        assert!(text.contains(&format!("{:<15}  {}", "Score", "2.4")));
        assert!(text.contains(&format!("{:<15}  {}", "Clean", "no")));
        assert!(!text.contains("Speed points"));
    }

    #[test]
    fn test_format_overlaps() {
        let a = sample_rule().valid_between(Some(date(2020, 1, 1)), Some(date(2020, 12, 31)));
        let b = sample_rule().valid_between(Some(date(2020, 6, 1)), None);
        let text = format_overlaps("Standard", &[(&a, &b)], false);
        assert!(text.starts_with("warning: Standard: Open/Novice"));
        assert!(text.contains("overlap"));
    }
}
