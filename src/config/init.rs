use anyhow::{Context, Result};
use std::io::{BufRead, Write};
use std::path::PathBuf;

use super::{get_config_path, write_starter_config};

/// Prompt user with a message and return their trimmed input.
fn prompt(message: &str) -> Result<String> {
    print!("{}", message);
    std::io::stdout()
        .flush()
        .context("Failed to flush stdout")?;
    let mut input = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut input)
        .context("Failed to read input")?;
    Ok(input.trim().to_string())
}

/// Prompt user with a yes/no question. Returns bool based on input and default.
fn prompt_yes_no(message: &str, default_yes: bool) -> Result<bool> {
    let hint = if default_yes { "Y/n" } else { "y/N" };
    let input = prompt(&format!("{} [{}]: ", message, hint))?;
    let input = input.to_lowercase();
    if input.is_empty() {
        Ok(default_yes)
    } else {
        Ok(input == "y" || input == "yes")
    }
}

/// Write a starter venue configuration.
///
/// Asks before overwriting an existing file unless `force` is set.
/// Returns the path written, or None if the user declined.
pub fn run_init(path: Option<PathBuf>, force: bool) -> Result<Option<PathBuf>> {
    let config_path = path.unwrap_or_else(get_config_path);

    if config_path.exists() && !force {
        let overwrite = prompt_yes_no(
            &format!(
                "Config already exists at {}. Overwrite?",
                config_path.display()
            ),
            false,
        )?;
        if !overwrite {
            println!("Aborted.");
            return Ok(None);
        }
    }

    write_starter_config(&config_path)?;
    tracing::info!(path = %config_path.display(), "wrote starter config");
    Ok(Some(config_path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn test_init_writes_new_file() {
        let temp_path = env::temp_dir().join("agility_scoring_test_init.yaml");
        let _ = std::fs::remove_file(&temp_path);

        let written = run_init(Some(temp_path.clone()), false).unwrap();
        assert_eq!(written, Some(temp_path.clone()));
        assert!(temp_path.exists());

        // Forced re-init overwrites without prompting
        let written = run_init(Some(temp_path.clone()), true).unwrap();
        assert_eq!(written, Some(temp_path.clone()));

        let _ = std::fs::remove_file(&temp_path);
    }
}
