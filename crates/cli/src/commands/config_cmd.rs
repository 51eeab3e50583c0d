//! `deckhand config`: Print the default configuration.

use deckhand_config::AppConfig;

pub fn show_default() -> Result<(), Box<dyn std::error::Error>> {
    println!("# {}", AppConfig::config_dir().join("config.toml").display());
    println!("{}", AppConfig::default_toml());
    Ok(())
}

#[cfg(test)]
mod tests {
    #[test]
    fn config_path_is_valid() {
        let path = deckhand_config::AppConfig::config_dir().join("config.toml");
        assert!(path.to_str().unwrap().contains("config.toml"));
    }

    #[test]
    fn default_toml_parses_back() {
        let text = deckhand_config::AppConfig::default_toml();
        let parsed: deckhand_config::AppConfig = toml_roundtrip(&text);
        assert_eq!(parsed.agent.max_iterations, 20);
    }

    fn toml_roundtrip(text: &str) -> deckhand_config::AppConfig {
        let dir = std::env::temp_dir().join(format!("deckhand-cli-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, text).unwrap();
        let config = deckhand_config::AppConfig::load_from(&path).unwrap();
        std::fs::remove_dir_all(&dir).ok();
        config
    }
}
