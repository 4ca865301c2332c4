use std::sync::Arc;

use anyhow::Context;

use vcard_bot::allowlist::AllowList;
use vcard_bot::channels::TelegramChannel;
use vcard_bot::scratch::ScratchDir;
use vcard_bot::{Bot, BotConfig, logging};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Configuration comes first: without a token there is nothing to run
    let config = match BotConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            eprintln!("  export BOT_TOKEN=123456:ABC-...");
            return Err(e.into());
        }
    };

    let _log_guard = match logging::init(config.log_file.as_deref()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error: {e}");
            return Err(e.into());
        }
    };

    eprintln!("🤖 vcard-bot v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Allow-list: {}", config.allowlist_path.display());
    eprintln!("   Scratch dir: {}", config.scratch_dir.display());
    if let Some(ref log_file) = config.log_file {
        eprintln!("   Activity log: {}", log_file.display());
    }

    let allowlist = AllowList::load(&config.allowlist_path)
        .await
        .context("failed to load allow-list")?;
    tracing::info!(
        admins = config.admin_ids.len(),
        allowed = allowlist.users().len(),
        "Access control loaded"
    );

    let scratch = ScratchDir::new(&config.scratch_dir);
    scratch
        .ensure()
        .await
        .with_context(|| format!("failed to create {}", scratch.root().display()))?;

    let channel = Arc::new(TelegramChannel::new(
        config.bot_token.clone(),
        config.poll_timeout,
    ));
    let bot = Bot::new(channel, config.admin_ids.iter().copied(), allowlist, scratch);

    bot.run().await?;
    Ok(())
}
