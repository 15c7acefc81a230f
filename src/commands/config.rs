use anyhow::Result;
use colored::Colorize;
use lawyer_office_api::config::{self, Config};
use std::path::Path;
use tracing::info;

/// Execute the config show command
///
/// Displays the current configuration with user tokens masked
pub fn show(config_path: &Path) -> Result<()> {
    println!("{}", "Loading configuration...".yellow());
    info!("Loading configuration for display");

    let cfg = config::load_config_from(config_path)?;
    let sanitized = sanitize_secrets(&cfg);

    println!("{}", "Current Configuration:".green().bold());
    println!();
    println!("{}", toml::to_string_pretty(&sanitized)?);

    Ok(())
}

/// Execute the config validate command
pub fn validate(config_path: &Path) -> Result<()> {
    println!("{}", "Validating configuration...".yellow());

    let cfg = config::load_config_from(config_path)?;

    println!("{}", "✓ Configuration is valid".green());
    println!();
    println!("{}", "Summary:".bold());
    println!("  Users: {}", cfg.users.len());
    println!("  Staff: {}", cfg.users.iter().filter(|u| u.is_staff).count());
    println!(
        "  Exempt prefixes: {}",
        cfg.request_logging.exempt_prefixes.join(", ")
    );

    info!("Configuration validation successful");
    Ok(())
}

fn sanitize_secrets(cfg: &Config) -> Config {
    let mut sanitized = cfg.clone();
    for user in &mut sanitized.users {
        user.token = mask_token(&user.token);
    }
    sanitized
}

/// First 4 and last 4 characters, `***` when too short to mask meaningfully
///
/// Example: "office-tok-1234abcd" -> "offi...abcd"
fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 11 {
        return "***".to_string();
    }

    let prefix: String = chars[..4].iter().collect();
    let suffix: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", prefix, suffix)
}
