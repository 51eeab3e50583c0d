//! `deckhand doctor`: Diagnose configuration health.
//!
//! Reports which credentials are present, never their values.

use deckhand_config::AppConfig;
use std::path::PathBuf;

pub async fn run(config_path: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    println!("Deckhand Doctor: Configuration Diagnostics");
    println!("===========================================\n");

    let path = super::config_path(config_path);
    if path.exists() {
        println!("  ✅ Config file: {}", path.display());
    } else {
        println!("  ℹ️  No config file at {} (using defaults)", path.display());
    }

    let config = match super::load_config(&path) {
        Ok(config) => {
            println!("  ✅ Config valid");
            config
        }
        Err(e) => {
            println!("  ❌ {e}");
            return Err(e.into());
        }
    };

    for line in report(&config) {
        println!("  {line}");
    }

    let missing = config.missing_credentials();
    println!();
    if missing.is_empty() {
        println!("  🎉 All checks passed!");
    } else {
        for m in &missing {
            println!("  ⚠️  {m}");
        }
        println!("\n  {} issue(s) found.", missing.len());
    }

    Ok(())
}

fn presence(value: &Option<String>) -> &'static str {
    if value.is_some() { "set" } else { "missing" }
}

fn report(config: &AppConfig) -> Vec<String> {
    vec![
        format!("Model:              {}", config.agent.model),
        format!("Max iterations:     {}", config.agent.max_iterations),
        format!("ANTHROPIC_API_KEY:  {}", presence(&config.anthropic.api_key)),
        format!("GOOGLE_ACCESS_TOKEN: {}", presence(&config.google.access_token)),
        format!(
            "Template deck:      {}",
            config
                .google
                .template_presentation_id
                .as_deref()
                .unwrap_or("none (new deck per request)")
        ),
        format!("CORS origins:       {}", config.server.cors_origins().join(", ")),
    ]
}
