use gr_domain::config::{Config, ConfigSeverity};

/// Parse and validate the config, printing any issues.
///
/// Returns `false` when at least one error was found.
pub fn validate(config: &Config, config_path: &str) -> bool {
    let issues = config.validate();

    if issues.is_empty() {
        println!("Config OK ({config_path})");
        return true;
    }

    let error_count = issues
        .iter()
        .filter(|e| e.severity == ConfigSeverity::Error)
        .count();
    let warning_count = issues.len() - error_count;

    for issue in &issues {
        println!("{issue}");
    }

    println!("\n{error_count} error(s), {warning_count} warning(s) in {config_path}");

    error_count == 0
}

/// Render the resolved config (with all defaults filled in) as TOML.
///
/// Plaintext credential values are masked.
pub fn render(config: &Config) -> anyhow::Result<String> {
    let mut masked = config.clone();
    for cred in [
        &mut masked.llm.auth,
        &mut masked.search.auth,
        &mut masked.search.engine_id,
        &mut masked.platform.token,
    ] {
        if cred.key.is_some() {
            cred.key = Some("********".into());
        }
    }
    Ok(toml::to_string_pretty(&masked)?)
}

pub fn show(config: &Config) -> anyhow::Result<()> {
    print!("{}", render(config)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_masks_plaintext_keys() {
        let mut config = Config::default();
        config.llm.auth.key = Some("AIza-secret".into());
        let out = render(&config).unwrap();
        assert!(!out.contains("AIza-secret"));
        assert!(out.contains("GEMINI_API_KEY"));
        assert!(out.contains("imagen-3.0-generate-002"));
    }
}
