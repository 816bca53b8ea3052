mod client;
mod config;
mod debate;
mod error;
mod origin;
mod protocol;
mod server;
mod stream;
mod transcript;

use clap::Parser;
use client::DebateClient;
use config::{Cli, Command, HealthArgs, WatchArgs};
use std::io::IsTerminal;
use tracing_subscriber::EnvFilter;
use transcript::Renderer;

type MainResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

#[tokio::main]
async fn main() -> MainResult<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("debate_stream=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match Cli::parse().command {
        Command::Serve(args) => server::run(args.into_config()).await,
        Command::Watch(args) => watch(args).await,
        Command::Health(args) => health(args).await,
    }
}

async fn watch(args: WatchArgs) -> MainResult<()> {
    let client = DebateClient::new(args.client_config());
    let color = !args.no_color && std::io::stdout().is_terminal();
    let mut renderer = Renderer::new(std::io::stdout(), color);
    let mut render_error = None;

    client
        .stream_debate(&args.request(), |event| {
            if render_error.is_none() {
                if let Err(err) = renderer.render(&event) {
                    render_error = Some(err);
                }
            }
            std::future::ready(())
        })
        .await?;

    if let Some(err) = render_error {
        return Err(err.into());
    }
    let transcript = renderer.transcript();
    if !transcript.is_complete() {
        return Err(format!("stream from {} ended before the debate finished", client.base_url()).into());
    }
    transcript
        .check_rounds(args.rounds)
        .map_err(|err| format!("incomplete debate from {}: {err}", client.base_url()))?;

    Ok(())
}

async fn health(args: HealthArgs) -> MainResult<()> {
    let client = DebateClient::new(client::ClientConfig {
        base_url: args.url,
        connect_timeout: std::time::Duration::from_secs(10),
    });
    let health = client.check_health().await?;
    println!(
        "{}: {} ({} active, {} completed, {} disconnected, {} failed)",
        health.status,
        health.message,
        health.active_streams,
        health.completed_streams,
        health.disconnected_streams,
        health.failed_streams
    );

    Ok(())
}
