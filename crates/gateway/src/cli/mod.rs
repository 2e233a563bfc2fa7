pub mod config;
pub mod doctor;
pub mod run;

use clap::{Args, Parser, Subcommand};

use gr_domain::ConversationScope;

/// gemrelay: chat, vision and image generation over Google's generative APIs.
#[derive(Debug, Parser)]
#[command(name = "gemrelay", version, about)]
pub struct Cli {
    /// Keep conversation history in memory only (nothing is written to disk).
    #[arg(long, global = true)]
    pub ephemeral: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Send a prompt in a conversation and print the answer.
    Ai {
        /// Your message or query for the AI.
        prompt: String,
        /// Search the web for the prompt first.
        #[arg(long)]
        search: bool,
        #[command(flatten)]
        scope: ScopeArgs,
        /// Print the answer as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Ask the AI about an image file.
    AiUpload {
        /// Path to the image.
        image: std::path::PathBuf,
        /// Optional question about the image (also the search query).
        #[arg(long)]
        text: Option<String>,
        /// Search the web for `--text` first.
        #[arg(long)]
        search: bool,
        /// MIME type override (guessed from the extension otherwise).
        #[arg(long)]
        mime: Option<String>,
    },
    /// Generate an image from a prompt.
    GenerateImage {
        prompt: String,
        /// Where to write the image.
        #[arg(long, default_value = "generated_image.png")]
        out: std::path::PathBuf,
    },
    /// Reset the conversation history of a server or a DM.
    ResetAi {
        #[command(flatten)]
        scope: ScopeArgs,
    },
    /// Run diagnostic checks against the current configuration.
    Doctor,
    /// Configuration utilities.
    #[command(subcommand)]
    Config(ConfigCommand),
}

/// Which conversation a command applies to.
#[derive(Debug, Clone, Copy, Args)]
#[group(required = true, multiple = false)]
pub struct ScopeArgs {
    /// Server (guild) id: the conversation shared by everyone there.
    #[arg(long)]
    pub space: Option<u64>,
    /// User id: that user's private conversation.
    #[arg(long)]
    pub user: Option<u64>,
}

impl ScopeArgs {
    pub fn scope(&self) -> anyhow::Result<ConversationScope> {
        match (self.space, self.user) {
            (Some(space), _) => Ok(ConversationScope::Shared(space)),
            (None, Some(user)) => Ok(ConversationScope::Private(user)),
            (None, None) => anyhow::bail!("either --space or --user is required"),
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Parse the config file and report any errors.
    Validate,
    /// Dump the resolved configuration (with defaults) as TOML.
    Show,
}

// ── Config loading helper ─────────────────────────────────────────────

/// Load the configuration from the path specified by `GR_CONFIG` (or
/// `config.toml` by default).  Returns the parsed [`Config`] and the
/// path that was used.
///
/// [`Config`]: gr_domain::config::Config
pub fn load_config() -> anyhow::Result<(gr_domain::config::Config, String)> {
    let config_path = std::env::var("GR_CONFIG").unwrap_or_else(|_| "config.toml".into());

    let config = if std::path::Path::new(&config_path).exists() {
        let raw = std::fs::read_to_string(&config_path)
            .map_err(|e| anyhow::anyhow!("reading {config_path}: {e}"))?;
        toml::from_str(&raw).map_err(|e| anyhow::anyhow!("parsing {config_path}: {e}"))?
    } else {
        gr_domain::config::Config::default()
    };

    Ok((config, config_path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ai_requires_exactly_one_scope() {
        assert!(Cli::try_parse_from(["gemrelay", "ai", "hi"]).is_err());
        assert!(Cli::try_parse_from(["gemrelay", "ai", "hi", "--space", "1", "--user", "2"]).is_err());

        let cli = Cli::try_parse_from(["gemrelay", "ai", "hi", "--user", "42", "--search"]).unwrap();
        match cli.command {
            Command::Ai { scope, search, .. } => {
                assert!(search);
                assert_eq!(scope.scope().unwrap(), ConversationScope::Private(42));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn ephemeral_is_global() {
        let cli = Cli::try_parse_from(["gemrelay", "reset-ai", "--space", "7", "--ephemeral"]).unwrap();
        assert!(cli.ephemeral);
    }
}
