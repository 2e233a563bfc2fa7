use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Conversation history storage
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root directory for all persisted history.
    #[serde(default = "d_state_path")]
    pub state_path: PathBuf,
    /// Aggregate file (relative to `state_path`) holding every shared scope.
    #[serde(default = "d_shared_file")]
    pub shared_file: PathBuf,
    /// Directory (relative to `state_path`) with one file per private scope.
    #[serde(default = "d_private_dir")]
    pub private_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            state_path: d_state_path(),
            shared_file: d_shared_file(),
            private_dir: d_private_dir(),
        }
    }
}

impl StorageConfig {
    pub fn shared_path(&self) -> PathBuf {
        self.state_path.join(&self.shared_file)
    }

    pub fn private_path(&self) -> PathBuf {
        self.state_path.join(&self.private_dir)
    }
}

fn d_state_path() -> PathBuf {
    PathBuf::from("./data")
}
fn d_shared_file() -> PathBuf {
    PathBuf::from("conversation_histories.json")
}
fn d_private_dir() -> PathBuf {
    PathBuf::from("dm_histories")
}
