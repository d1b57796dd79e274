pub mod archive;
pub mod client;
pub mod commands;
pub mod config;
pub mod discord;
pub mod download;
pub mod paginator;
pub mod pause;
pub mod purge;
pub mod sanitize;

/// Custom data passed to all commands
pub struct Data {
    pub config: config::Config,
    pub client: discord::DiscordClient,
    pub pauses: pause::PauseRegistry,
}

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;
