//! Update Router Example
//!
//! Reads newline-delimited JSON updates (a file or stdin) and routes them
//! through matchers declared in `sift.toml`.
//!
//! # Routes
//!
//! Routes are declared in configuration and bound to handlers here by name:
//!
//! ```text
//! links       message|channel_post|edited_message :entities:url
//! commands    message:entities:bot_command          (blocking)
//! callbacks   callback_query                        (blocking)
//! promotions  my_chat_member:new_chat_member:can_manage_chat
//! polls       poll | poll_answer                    (disabled)
//! ```
//!
//! One matcher is registered in code to show chained filters.
//!
//! # Usage
//!
//! ```bash
//! cargo run --package update-router -- --config demos/update_router/sift.toml \
//!     demos/update_router/updates.ndjson
//! ```

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use futures::{Stream, StreamExt, stream};
use sift::prelude::*;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

#[derive(Debug, Parser)]
#[command(version, about = "Route JSON updates through Sift matchers")]
struct Cli {
    /// Configuration file.
    #[arg(short, long, default_value = "sift.toml")]
    config: PathBuf,

    /// Configuration profile.
    #[arg(short, long)]
    profile: Option<String>,

    /// Print each route's shape contract and exit.
    #[arg(long)]
    shapes: bool,

    /// Newline-delimited JSON updates; stdin if omitted.
    input: Option<PathBuf>,
}

// ============================================================================
// Handler Functions
// ============================================================================

async fn links_handler(msg: Msg, query: MatchedQuery) {
    let text = msg.get("text").and_then(|t| t.as_str()).unwrap_or_default();
    info!(query = %query.0, message_id = %msg["message_id"], "Link found: {text}");
}

async fn command_handler(msg: Msg, chat: Chat, sender: Option<Sender>) {
    let text = msg.get("text").and_then(|t| t.as_str()).unwrap_or_default();
    let command = text.split_whitespace().next().unwrap_or_default();
    let user = sender
        .and_then(|s| s.get("first_name").and_then(|n| n.as_str()).map(str::to_owned))
        .unwrap_or_else(|| "someone".to_owned());

    info!(chat = %chat["id"], "{user} ran {command}");
}

async fn callback_handler(event: Event, propagation: Propagation) {
    let Some(Narrowed::CallbackQuery(query)) = event.narrow() else {
        return;
    };

    info!(
        data = query.str("data").unwrap_or_default(),
        from = ?event.from_user().and_then(|u| u.get("id")),
        "Callback query answered"
    );
    propagation.stop();
}

async fn promotion_handler(event: Event, chat: Chat) {
    let status = event
        .my_chat_member()
        .and_then(|m| m.object("new_chat_member"))
        .and_then(|m| m.get("status"))
        .and_then(|s| s.as_str())
        .unwrap_or("unknown");

    info!(chat = %chat["id"], status, "Bot can now manage chat");
}

async fn private_text_handler(variant: Variant) {
    info!(kind = %variant.kind, "Private text message");
}

// ============================================================================
// Input
// ============================================================================

/// Non-blank input lines; parsing is left to the runtime.
fn documents<R>(reader: R) -> impl Stream<Item = String>
where
    R: AsyncBufRead + Unpin,
{
    stream::unfold(reader.lines(), |mut lines| async move {
        match lines.next_line().await {
            Ok(Some(line)) => Some((line, lines)),
            Ok(None) => None,
            Err(e) => {
                error!(error = %e, "Failed to read input");
                None
            }
        }
    })
    .filter(|line| std::future::ready(!line.trim().is_empty()))
}

fn print_shapes(config: &SiftConfig) -> Result<()> {
    for route in &config.routes {
        let shape = resolve(&route.queries)?;
        let kinds: Vec<_> = shape.members().map(|c| c.present().as_str()).collect();
        println!(
            "{:<12} {:<9} present: {}",
            route.name,
            if route.enabled { "enabled" } else { "disabled" },
            kinds.join(" | ")
        );
    }
    Ok(())
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut builder = SiftRuntime::builder().config_file(&cli.config);
    if let Some(profile) = &cli.profile {
        builder = builder.profile(profile);
    }
    let runtime = builder.build()?;

    if cli.shapes {
        return print_shapes(runtime.config());
    }

    runtime.bind_route("links", links_handler).await?;
    runtime.bind_route("commands", command_handler).await?;
    runtime.bind_route("callbacks", callback_handler).await?;
    runtime.bind_route("promotions", promotion_handler).await?;
    runtime.bind_route("polls", |variant: Variant| async move {
        info!(kind = %variant.kind, "Poll activity");
    })
    .await?;

    // Chained filters: a text message whose chat is private.
    let private_text = on_message()
        .on("message:text")?
        .name("private_text")
        .check(|ctx| {
            ctx.event()
                .chat()
                .and_then(|chat| chat.get("type"))
                .and_then(|t| t.as_str())
                == Some("private")
        })
        .handler(private_text_handler);
    info!(
        shape = ?private_text.shape().guaranteed_present(),
        "Registered chained matcher"
    );
    runtime.register_matcher(private_text).await;

    match &cli.input {
        Some(path) => {
            let file = tokio::fs::File::open(path).await?;
            runtime.run_json(documents(BufReader::new(file))).await?;
        }
        None => {
            runtime
                .run_json(documents(BufReader::new(tokio::io::stdin())))
                .await?;
        }
    }

    let stats = runtime.stats();
    println!(
        "received {} | matched {} | unmatched {} | rejected {}",
        stats.received, stats.matched, stats.unmatched, stats.rejected
    );

    Ok(())
}
