use gr_domain::config::{Config, ConfigSeverity};

#[test]
fn default_credentials_read_from_env() {
    let config = Config::default();
    assert_eq!(config.llm.auth.env.as_deref(), Some("GEMINI_API_KEY"));
    assert_eq!(config.search.auth.env.as_deref(), Some("GOOGLE_API_KEY"));
    assert_eq!(config.search.engine_id.env.as_deref(), Some("GOOGLE_CSE_ID"));
    assert_eq!(config.platform.token.env.as_deref(), Some("DISCORD_BOT_TOKEN"));
}

#[test]
fn default_image_retry_policy() {
    let config = Config::default();
    assert_eq!(config.image.max_attempts, 3);
    assert_eq!(config.image.base_delay_ms, 1000);
    assert_eq!(config.image.sample_count, 1);
}

#[test]
fn default_storage_layout() {
    let config = Config::default();
    assert!(config
        .storage
        .shared_path()
        .ends_with("conversation_histories.json"));
    assert!(config.storage.private_path().ends_with("dm_histories"));
}

#[test]
fn empty_file_is_valid() {
    let config: Config = toml::from_str("").unwrap();
    assert!(config.validate().is_empty());
}

#[test]
fn sections_override_defaults() {
    let toml_str = r#"
[storage]
state_path = "/var/lib/gemrelay"

[llm]
text_model = "gemini-2.0-flash"

[llm.auth]
service = "gemrelay"
account = "gemini-api-key"

[search]
num_results = 5
"#;
    let config: Config = toml::from_str(toml_str).unwrap();
    assert_eq!(config.storage.state_path.to_str(), Some("/var/lib/gemrelay"));
    assert_eq!(config.llm.text_model, "gemini-2.0-flash");
    assert_eq!(config.llm.auth.service.as_deref(), Some("gemrelay"));
    assert!(config.llm.auth.env.is_none());
    assert_eq!(config.search.num_results, 5);
    assert_eq!(config.llm.vision_model, "gemini-2.5-pro-preview-05-06");
}

#[test]
fn zero_attempts_is_an_error() {
    let toml_str = r#"
[image]
max_attempts = 0
"#;
    let config: Config = toml::from_str(toml_str).unwrap();
    let issues = config.validate();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].severity, ConfigSeverity::Error);
    assert_eq!(issues[0].field, "image.max_attempts");
}

#[test]
fn oversized_result_count_is_a_warning() {
    let toml_str = r#"
[search]
num_results = 25
"#;
    let config: Config = toml::from_str(toml_str).unwrap();
    let issues = config.validate();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].severity, ConfigSeverity::Warning);
}
