use crate::archive::{archive_guild, ArchiveOptions, Progress};
use crate::client::GuildRef;
use crate::purge::purge_guild;
use crate::{Context, Error};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{error, info};

fn guild_ref(ctx: &Context<'_>) -> Option<GuildRef> {
    let id = ctx.guild_id()?.get();
    let name = ctx.guild().map(|g| g.name.clone())?;
    Some(GuildRef { id, name })
}

/// Archive this server's messages and attachments to disk
#[poise::command(slash_command, guild_only)]
pub async fn archive(
    ctx: Context<'_>,
    #[description = "Destination directory (defaults to OUTPUT_DIR)"] dir: Option<String>,
) -> Result<(), Error> {
    let data = ctx.data();
    let Some(guild) = guild_ref(&ctx) else {
        ctx.say("This command only works in a server.").await?;
        return Ok(());
    };

    let Some((guard, token)) = data.pauses.begin(guild.id) else {
        ctx.say("An archive or purge is already running for this server.")
            .await?;
        return Ok(());
    };

    let base_dir = PathBuf::from(dir.unwrap_or_else(|| data.config.output_dir.clone()));
    info!(guild = %guild.name, dir = %base_dir.display(), "archive requested by {}", ctx.author().name);

    let reply = ctx
        .say(format!("Archiving to `{}`…", base_dir.display()))
        .await?;

    let (tx, mut rx) = mpsc::unbounded_channel::<Progress>();
    let run = {
        let client = data.client.clone();
        let guild = guild.clone();
        let base_dir = base_dir.clone();
        tokio::spawn(async move {
            let opts = ArchiveOptions {
                progress: Some(tx),
                pause: Some(token),
            };
            archive_guild(&client, &guild, &base_dir, opts).await
        })
    };

    // Render progress, throttled so long runs do not spam edits.
    let interval = Duration::from_millis(data.config.progress_edit_interval_ms);
    let mut last_edit: Option<Instant> = None;
    while let Some(p) = rx.recv().await {
        if last_edit.is_some_and(|t| t.elapsed() < interval) {
            continue;
        }
        last_edit = Some(Instant::now());
        let paused = if data.pauses.is_paused(guild.id) {
            " **[PAUSED]**"
        } else {
            ""
        };
        let text = format!(
            "Archiving to `{}`…{}\nChannel **{}** ({}/{}) — {} messages, {} attachments",
            base_dir.display(),
            paused,
            p.channel_name,
            p.channel_index,
            p.total_channels,
            p.messages,
            p.attachments
        );
        let _ = reply
            .edit(ctx, poise::CreateReply::default().content(text))
            .await;
    }

    let result = run.await;
    drop(guard);

    let summary = match result {
        Ok(Ok(stats)) => {
            let errors = if stats.errors.is_empty() {
                String::new()
            } else {
                format!(" ({} errors)", stats.errors.len())
            };
            format!(
                "Done. {} channels, {} messages, {} attachments.{}",
                stats.channels, stats.messages, stats.attachments, errors
            )
        }
        Ok(Err(err)) => {
            error!(guild = %guild.name, %err, "archive failed");
            format!("Failed: {err}")
        }
        Err(err) => {
            error!(guild = %guild.name, %err, "archive task panicked");
            "Failed: internal error".to_string()
        }
    };
    // Interaction tokens expire before long runs finish; if the edit no
    // longer works, post the summary as a fresh channel message.
    if reply
        .edit(ctx, poise::CreateReply::default().content(summary.clone()))
        .await
        .is_err()
    {
        let _ = ctx.channel_id().say(ctx.http(), summary).await;
    }
    Ok(())
}

/// Pause an in-progress archive
#[poise::command(slash_command, guild_only)]
pub async fn archive_pause(ctx: Context<'_>) -> Result<(), Error> {
    let Some(guild_id) = ctx.guild_id() else {
        return Ok(());
    };
    if ctx.data().pauses.set_paused(guild_id.get(), true) {
        ctx.say("Archive paused. Use `/archive_resume` to continue.")
            .await?;
    } else {
        ctx.say("No archive is currently running.").await?;
    }
    Ok(())
}

/// Resume a paused archive
#[poise::command(slash_command, guild_only)]
pub async fn archive_resume(ctx: Context<'_>) -> Result<(), Error> {
    let Some(guild_id) = ctx.guild_id() else {
        return Ok(());
    };
    if ctx.data().pauses.set_paused(guild_id.get(), false) {
        ctx.say("Archive resumed.").await?;
    } else {
        ctx.say("No archive is currently running.").await?;
    }
    Ok(())
}

/// Delete every message in this server (irreversible)
#[poise::command(slash_command, guild_only)]
pub async fn archive_delete(
    ctx: Context<'_>,
    #[description = "Type `confirm` to run the deletion"] confirm: Option<String>,
) -> Result<(), Error> {
    let data = ctx.data();
    let Some(guild) = guild_ref(&ctx) else {
        ctx.say("This command only works in a server.").await?;
        return Ok(());
    };

    if confirm.as_deref() != Some("confirm") {
        ctx.say(
            "To delete all messages in this server (after you have a backup), run: \
             `/archive_delete confirm:confirm`. Bot needs Manage Messages. Irreversible.",
        )
        .await?;
        return Ok(());
    }

    // Claims the same slot as archive: one run per guild at a time.
    let Some((_guard, _token)) = data.pauses.begin(guild.id) else {
        ctx.say("An archive or purge is already running for this server.")
            .await?;
        return Ok(());
    };

    info!(guild = %guild.name, "purge requested by {}", ctx.author().name);
    ctx.say("Deleting… (slow, rate-limited).").await?;

    let summary = match purge_guild(&data.client, &guild).await {
        Ok(outcome) => {
            let errors = if outcome.errors.is_empty() {
                String::new()
            } else {
                format!(" ({} errors)", outcome.errors.len())
            };
            format!("Deleted {} messages.{}", outcome.deleted, errors)
        }
        Err(err) => {
            error!(guild = %guild.name, %err, "purge failed");
            format!("Failed: {err}")
        }
    };
    // A purge can outlive the interaction token; post a fresh message.
    let _ = ctx.channel_id().say(ctx.http(), summary).await;
    Ok(())
}
