use dotenvy::dotenv;
use std::env;

#[derive(Clone)]
pub struct Config {
    pub discord_token: String,
    /// Default archive destination when the command gives no path.
    pub output_dir: String,
    /// Minimum interval between progress-message edits.
    pub progress_edit_interval_ms: u64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv().ok();
        Self::build()
    }

    fn build() -> anyhow::Result<Self> {
        Ok(Config {
            discord_token: env::var("DISCORD_TOKEN")
                .map_err(|_| anyhow::anyhow!("DISCORD_TOKEN must be set"))?,
            output_dir: env::var("OUTPUT_DIR").unwrap_or_else(|_| "./archive".to_string()),
            progress_edit_interval_ms: env::var("PROGRESS_EDIT_INTERVAL_MS")
                .unwrap_or_else(|_| "2500".to_string())
                .parse()
                .unwrap_or(2500),
        })
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("discord_token", &"[REDACTED]")
            .field("output_dir", &self.output_dir)
            .field("progress_edit_interval_ms", &self.progress_edit_interval_ms)
            .finish()
    }
}
