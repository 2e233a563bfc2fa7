use gr_domain::config::{Config, ConfigSeverity, CredentialConfig};
use gr_providers::util::resolve_credential;

/// Run all diagnostic checks and print a summary.
///
/// Returns `Ok(true)` when every check passes, `Ok(false)` when at least
/// one check failed.
pub fn run(config: &Config, config_path: &str) -> anyhow::Result<bool> {
    println!("gemrelay doctor");
    println!("===============\n");

    let mut all_passed = true;

    // 1. Config file
    check_config_file(config_path);

    // 2. Config validation
    check_config_validation(config, &mut all_passed);

    // 3. Credentials
    for (name, cred) in credentials(config) {
        check_credential(name, cred, &mut all_passed);
    }

    // 4. History storage
    check_storage(config, &mut all_passed);

    // Summary
    println!();
    if all_passed {
        println!("All checks passed.");
    } else {
        println!("Some checks failed. Review the output above.");
    }

    Ok(all_passed)
}

/// Every credential the bot needs, with a display name.
pub fn credentials(config: &Config) -> [(&'static str, &CredentialConfig); 4] {
    [
        ("Chat platform token", &config.platform.token),
        ("Gemini API key", &config.llm.auth),
        ("Search API key", &config.search.auth),
        ("Search engine id", &config.search.engine_id),
    ]
}

// ── Individual checks ─────────────────────────────────────────────────

fn check_config_file(config_path: &str) {
    let exists = std::path::Path::new(config_path).exists();
    // A missing file is fine: every setting has a default.
    print_check(
        "Config file",
        true,
        if exists {
            config_path.to_owned()
        } else {
            format!("{config_path} not found (using defaults)")
        },
    );
}

fn check_config_validation(config: &Config, all_passed: &mut bool) {
    let issues = config.validate();
    let error_count = issues
        .iter()
        .filter(|e| e.severity == ConfigSeverity::Error)
        .count();

    if issues.is_empty() {
        print_check("Config validation", true, "no issues".into());
    } else {
        print_check(
            "Config validation",
            error_count == 0,
            format!("{} issue(s) ({} error(s))", issues.len(), error_count),
        );
        for issue in &issues {
            println!("      {issue}");
        }
        if error_count > 0 {
            *all_passed = false;
        }
    }
}

fn check_credential(name: &str, cred: &CredentialConfig, all_passed: &mut bool) {
    let ok = resolve_credential(cred, name).is_ok();
    let detail = if ok {
        format!("set ({})", cred.describe())
    } else {
        format!("missing or placeholder ({})", cred.describe())
    };
    print_check(name, ok, detail);
    if !ok {
        *all_passed = false;
    }
}

fn check_storage(config: &Config, all_passed: &mut bool) {
    let path = &config.storage.state_path;
    if std::fs::create_dir_all(path).is_err() {
        print_check("History storage", false, format!("{} (cannot create)", path.display()));
        *all_passed = false;
        return;
    }

    // Try creating a temp file to verify write access.
    let probe = path.join(".gemrelay_doctor_probe");
    let writable = std::fs::write(&probe, b"probe").is_ok();
    let _ = std::fs::remove_file(&probe);

    let detail = if writable {
        format!("{} (writable)", path.display())
    } else {
        format!("{} (not writable)", path.display())
    };
    print_check("History storage", writable, detail);
    if !writable {
        *all_passed = false;
    }
}

// ── Formatting helper ─────────────────────────────────────────────────

fn print_check(name: &str, passed: bool, detail: String) {
    let status = if passed { "PASS" } else { "FAIL" };
    println!("  [{status}] {name}: {detail}");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plaintext(key: &str) -> CredentialConfig {
        CredentialConfig {
            key: Some(key.into()),
            ..Default::default()
        }
    }

    #[test]
    fn lists_all_four_credentials() {
        let mut config = Config::default();
        config.search.engine_id = plaintext("engine-1");
        let creds = credentials(&config);
        let names: Vec<_> = creds.iter().map(|(name, _)| *name).collect();
        assert_eq!(
            names,
            ["Chat platform token", "Gemini API key", "Search API key", "Search engine id"]
        );
        assert_eq!(creds[3].1.key.as_deref(), Some("engine-1"));
    }

    #[test]
    fn placeholder_credential_fails_the_check() {
        let mut all_passed = true;
        check_credential("Gemini API key", &plaintext("YOUR_GEMINI_API_KEY_HERE"), &mut all_passed);
        assert!(!all_passed);

        let mut all_passed = true;
        check_credential("Gemini API key", &plaintext("AIza-real"), &mut all_passed);
        assert!(all_passed);
    }

    #[test]
    fn writable_storage_passes() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.storage.state_path = dir.path().join("state");

        let mut all_passed = true;
        check_storage(&config, &mut all_passed);
        assert!(all_passed);
        assert!(!dir.path().join("state/.gemrelay_doctor_probe").exists());
    }

    #[test]
    fn run_reports_failure_when_credentials_are_placeholders() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.storage.state_path = dir.path().to_path_buf();
        config.platform.token = plaintext("YOUR_DISCORD_BOT_TOKEN_HERE");
        config.llm.auth = plaintext("YOUR_GEMINI_API_KEY_HERE");
        config.search.auth = plaintext("YOUR_GOOGLE_API_KEY_HERE");
        config.search.engine_id = plaintext("YOUR_GOOGLE_CSE_ID_HERE");

        assert!(!run(&config, "missing.toml").unwrap());
    }
}
