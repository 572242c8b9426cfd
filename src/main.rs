use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use agility_scoring::config::{self, VenueConfig, CONFIG_VERSION};
use agility_scoring::output;
use agility_scoring::scoring::{self, EvalOptions, FileVersion, MigrationContext, RunFacts};
use agility_scoring::ScoringError;

// Exit codes
const EXIT_SUCCESS: i32 = 0;
const EXIT_CONFIG: i32 = 4;
const EXIT_NOT_FOUND: i32 = 5;
const EXIT_EVALUATION: i32 = 6;

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate the venue config and report overlapping rules
    Check,
    /// List the rules configured for one or every event
    List {
        /// Event name (all events if omitted)
        event: Option<String>,
    },
    /// Show the rule that applies to a run
    Resolve {
        event: String,
        division: String,
        level: String,
        /// Trial date (YYYY-MM-DD)
        date: NaiveDate,
    },
    /// Resolve the rule and evaluate a run from a YAML facts file
    Score {
        event: String,
        division: String,
        level: String,
        /// Trial date (YYYY-MM-DD)
        date: NaiveDate,
        /// YAML file with the run's facts
        facts: PathBuf,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
        /// Keep the table crossing time in speed figures
        #[arg(long)]
        table_time_in_yps: bool,
        /// Use the whole run time for obstacles per second
        #[arg(long)]
        run_time_ops: bool,
        /// Format version the facts were saved with; older facts are migrated
        #[arg(long)]
        file_version: Option<FileVersion>,
        /// Config version the facts were saved against
        #[arg(long, default_value_t = CONFIG_VERSION)]
        prior_config_version: u16,
        /// Legacy TableInYPS attribute from the saved run
        #[arg(long)]
        legacy_table_in_yps: Option<bool>,
    },
    /// Write a starter venue config
    Init {
        /// Overwrite an existing file without asking
        #[arg(long)]
        force: bool,
    },
}

#[derive(Parser, Debug)]
#[command(name = "agility-score")]
#[command(about = "Dog agility scoring rule resolution and run evaluation", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to config file (defaults to ~/.config/agility-scoring/venue.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

fn main() {
    let cli = Cli::parse();
    agility_scoring::logging::init(cli.verbose);

    let code = match cli.command {
        Commands::Init { force } => match config::run_init(cli.config, force) {
            Ok(Some(path)) => {
                println!("Config written to {}", path.display());
                EXIT_SUCCESS
            }
            Ok(None) => EXIT_SUCCESS,
            Err(e) => {
                eprintln!("Config error: {:#}", e);
                EXIT_CONFIG
            }
        },
        command => {
            let venue = match load_valid_config(cli.config) {
                Ok(v) => v,
                Err(code) => std::process::exit(code),
            };
            let use_colors = output::should_use_colors();
            match command {
                Commands::Check => run_check(&venue, use_colors),
                Commands::List { event } => run_list(&venue, event.as_deref(), use_colors),
                Commands::Resolve {
                    event,
                    division,
                    level,
                    date,
                } => run_resolve(&venue, &event, &division, &level, date, use_colors),
                Commands::Score {
                    event,
                    division,
                    level,
                    date,
                    facts,
                    json,
                    table_time_in_yps,
                    run_time_ops,
                    file_version,
                    prior_config_version,
                    legacy_table_in_yps,
                } => {
                    let request = ScoreRequest {
                        event,
                        division,
                        level,
                        date,
                        facts,
                        json,
                        options: EvalOptions {
                            table_time_included_in_yps: table_time_in_yps,
                            run_time_in_obstacles_per_second: run_time_ops,
                        },
                        file_version,
                        prior_config_version,
                        legacy_table_in_yps,
                    };
                    run_score(&venue, &request, use_colors)
                }
                Commands::Init { .. } => EXIT_SUCCESS,
            }
        }
    };

    std::process::exit(code);
}

/// Load the config and validate it at startup, reporting every problem.
fn load_valid_config(path: Option<PathBuf>) -> Result<VenueConfig, i32> {
    let venue = match config::load_config(path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {:#}", e);
            return Err(EXIT_CONFIG);
        }
    };

    if let Err(errors) = config::validate_config(&venue) {
        eprintln!("Scoring config errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        return Err(EXIT_CONFIG);
    }
    Ok(venue)
}

fn find_event<'a>(venue: &'a VenueConfig, name: &str) -> Result<&'a config::EventConfig, i32> {
    venue.find_event(name).ok_or_else(|| {
        eprintln!("No event named '{}' in config", name);
        EXIT_NOT_FOUND
    })
}

fn run_check(venue: &VenueConfig, use_colors: bool) -> i32 {
    let mut rule_count = 0;
    let mut overlap_count = 0;
    for event in &venue.events {
        rule_count += event.rules.len();
        let overlaps = event.rules.detect_overlaps();
        if !overlaps.is_empty() {
            overlap_count += overlaps.len();
            eprintln!("{}", output::format_overlaps(&event.name, &overlaps, use_colors));
        }
    }
    println!(
        "{} events, {} rules OK ({} overlapping pairs)",
        venue.events.len(),
        rule_count,
        overlap_count
    );
    EXIT_SUCCESS
}

fn run_list(venue: &VenueConfig, event: Option<&str>, use_colors: bool) -> i32 {
    let events: Vec<&config::EventConfig> = match event {
        Some(name) => match find_event(venue, name) {
            Ok(e) => vec![e],
            Err(code) => return code,
        },
        None => venue.events.iter().collect(),
    };
    if events.is_empty() {
        println!("No events configured.");
    }
    for event in events {
        println!("{}", event.name);
        println!("{}", output::format_rule_list(event.rules.rules(), use_colors));
    }
    EXIT_SUCCESS
}

fn run_resolve(
    venue: &VenueConfig,
    event: &str,
    division: &str,
    level: &str,
    date: NaiveDate,
    use_colors: bool,
) -> i32 {
    let event = match find_event(venue, event) {
        Ok(e) => e,
        Err(code) => return code,
    };
    match event.rules.resolve(division, level, date) {
        Ok(rule) => {
            println!("{}", output::format_rule_detail(rule, use_colors));
            EXIT_SUCCESS
        }
        Err(e) => {
            eprintln!("{}: {}", event.name, e);
            exit_code_for(&e)
        }
    }
}

struct ScoreRequest {
    event: String,
    division: String,
    level: String,
    date: NaiveDate,
    facts: PathBuf,
    json: bool,
    options: EvalOptions,
    file_version: Option<FileVersion>,
    prior_config_version: u16,
    legacy_table_in_yps: Option<bool>,
}

fn load_facts(path: &Path) -> anyhow::Result<RunFacts> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read run facts at {}", path.display()))?;
    serde_saphyr::from_str(&content)
        .with_context(|| format!("Failed to parse run facts: invalid YAML in {}", path.display()))
}

fn run_score(venue: &VenueConfig, request: &ScoreRequest, use_colors: bool) -> i32 {
    let event = match find_event(venue, &request.event) {
        Ok(e) => e,
        Err(code) => return code,
    };
    let current = match event
        .rules
        .resolve(&request.division, &request.level, request.date)
    {
        Ok(rule) => rule,
        Err(e) => {
            eprintln!("{}: {}", event.name, e);
            return exit_code_for(&e);
        }
    };
    let facts = match load_facts(&request.facts) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Facts error: {:#}", e);
            return EXIT_CONFIG;
        }
    };

    // Only the saved facts are migrated; the venue rule is already current.
    let facts = match request.file_version {
        Some(file_version) => {
            let ctx = MigrationContext {
                file_version,
                prior_config_version: request.prior_config_version,
                table_in_yps: request.legacy_table_in_yps,
                current_rule: Some(current),
            };
            scoring::migrate_facts(facts, &ctx)
        }
        None => facts,
    };
    let rule = current;

    let result = match scoring::evaluate_with(rule, &facts, request.options) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Evaluation error: {}", e);
            return exit_code_for(&e);
        }
    };

    if request.json {
        match serde_json::to_string_pretty(&result) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Failed to serialize result: {}", e);
                return EXIT_EVALUATION;
            }
        }
    } else {
        println!("{}", output::format_rule_detail(rule, use_colors));
        println!();
        println!("{}", output::format_run_result(&result, use_colors));
    }
    EXIT_SUCCESS
}

fn exit_code_for(err: &ScoringError) -> i32 {
    match err {
        ScoringError::NotFound { .. } => EXIT_NOT_FOUND,
        ScoringError::Configuration(_) => EXIT_EVALUATION,
        ScoringError::DuplicateBreakpoint(_) => EXIT_CONFIG,
    }
}
