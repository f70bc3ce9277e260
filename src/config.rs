//! Runtime settings - CLI flags with environment fallbacks (.env supported)

use std::time::Duration;

use clap::Args;

use crate::ai::AiConfig;

#[derive(Debug, Clone, Args)]
pub struct Settings {
    /// SQLite database file
    #[arg(long, env = "CARNET_DB", default_value = "carnet.db", global = true)]
    pub db_path: String,

    /// Quiet period before an autosave is written (ms)
    #[arg(long, env = "CARNET_SAVE_DELAY_MS", default_value = "2000", global = true)]
    pub save_delay_ms: u64,

    /// Default rest timer length (seconds)
    #[arg(long, env = "CARNET_REST_SECS", default_value = "90", global = true)]
    pub rest_secs: u32,

    /// Number of past workouts fetched for history and stats
    #[arg(long, env = "CARNET_HISTORY_LIMIT", default_value = "50", global = true)]
    pub history_limit: usize,

    /// Chat-completions API base URL
    #[arg(long, env = "CARNET_AI_URL", default_value = "https://api.openai.com/v1", global = true)]
    pub ai_url: String,

    /// API key; AI features are disabled without it
    #[arg(long, env = "CARNET_AI_KEY", hide_env_values = true, global = true)]
    pub ai_key: Option<String>,

    #[arg(long, env = "CARNET_AI_MODEL", default_value = "gpt-4o-mini", global = true)]
    pub ai_model: String,
}

impl Settings {
    pub fn save_delay(&self) -> Duration {
        Duration::from_millis(self.save_delay_ms)
    }

    pub fn ai_config(&self) -> AiConfig {
        AiConfig {
            api_url: self.ai_url.clone(),
            api_key: self.ai_key.clone().filter(|k| !k.trim().is_empty()),
            model: self.ai_model.clone(),
        }
    }
}
