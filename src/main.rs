use poise::serenity_prelude as serenity;
use tracing::{error, info};
use vaultcord::commands::archive;
use vaultcord::{config::Config, Data};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    // Load configuration
    let config = Config::from_env()?;
    let discord_token = config.discord_token.clone();

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![
                archive::archive(),
                archive::archive_pause(),
                archive::archive_resume(),
                archive::archive_delete(),
            ],
            ..Default::default()
        })
        .setup(|ctx, _ready, framework| {
            Box::pin(async move {
                info!("Bot is ready!");
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;

                let client =
                    vaultcord::discord::DiscordClient::new(ctx.http.clone(), ctx.cache.clone())?;

                Ok(Data {
                    config,
                    client,
                    pauses: vaultcord::pause::PauseRegistry::new(),
                })
            })
        })
        .build();

    let intents = serenity::GatewayIntents::non_privileged()
        | serenity::GatewayIntents::MESSAGE_CONTENT
        | serenity::GatewayIntents::GUILD_MESSAGES;

    let mut client = serenity::ClientBuilder::new(&discord_token, intents)
        .framework(framework)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create client: {}", e))?;

    info!("Starting bot...");
    if let Err(why) = client.start().await {
        error!("Client error: {:?}", why);
    }

    Ok(())
}
