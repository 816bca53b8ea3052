use crate::client::ClientConfig;
use crate::debate::{Granularity, Pacing};
use crate::origin::OriginPolicy;
use crate::protocol::{DEFAULT_MAX_ROUNDS, DebateRequest};
use crate::server::ServerConfig;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::time::Duration;

#[derive(Debug, Parser)]
#[command(name = "debate-stream", version, about = "Streams a simulated two-sided debate over SSE")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP server.
    Serve(ServeArgs),
    /// Start a debate on a running server and print it as it streams.
    Watch(WatchArgs),
    /// Probe a running server's health endpoint.
    Health(HealthArgs),
}

#[derive(Debug, Args)]
pub struct ServeArgs {
    #[arg(long, env = "DEBATE_LISTEN", default_value = "0.0.0.0:8000")]
    pub listen: String,

    /// Extra origins allowed to call the API, comma separated.
    #[arg(long, env = "ALLOWED_ORIGINS", value_delimiter = ',')]
    pub allowed_origins: Vec<String>,

    /// Static-hosting domain whose https subdomains are always allowed.
    #[arg(long, env = "DEBATE_WILDCARD_DOMAIN", default_value = "pages.dev")]
    pub wildcard_domain: String,

    #[arg(long, env = "DEBATE_GRANULARITY", value_enum, default_value_t = FragmentSize::Char)]
    pub granularity: FragmentSize,

    /// Seconds between SSE keep-alive comments; 0 disables them.
    #[arg(long, env = "DEBATE_KEEP_ALIVE_SECS", default_value_t = 15)]
    pub keep_alive_secs: u64,

    /// Stream every event with no delay, ignoring the pacing flags.
    #[arg(long, env = "DEBATE_INSTANT")]
    pub instant: bool,

    #[command(flatten)]
    pub pacing: PacingArgs,
}

#[derive(Debug, Args)]
pub struct PacingArgs {
    #[arg(long, env = "DEBATE_STARTUP_DELAY_MS", default_value_t = 500)]
    pub startup_delay_ms: u64,

    #[arg(long, env = "DEBATE_READY_DELAY_MS", default_value_t = 300)]
    pub ready_delay_ms: u64,

    #[arg(long, env = "DEBATE_SPEAKER_DELAY_MS", default_value_t = 200)]
    pub speaker_delay_ms: u64,

    #[arg(long, env = "DEBATE_TOKEN_DELAY_MS", default_value_t = 30)]
    pub token_delay_ms: u64,

    #[arg(long, env = "DEBATE_TURN_DELAY_MS", default_value_t = 500)]
    pub turn_delay_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FragmentSize {
    Char,
    Word,
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// What to debate.
    pub topic: String,

    #[arg(short, long, default_value_t = DEFAULT_MAX_ROUNDS)]
    pub rounds: i64,

    #[arg(long, env = "DEBATE_URL", default_value = "http://localhost:8000")]
    pub url: String,

    /// Seconds to wait for the first frame before giving up.
    #[arg(long, default_value_t = 30)]
    pub connect_timeout_secs: u64,

    #[arg(long)]
    pub no_color: bool,
}

#[derive(Debug, Args)]
pub struct HealthArgs {
    #[arg(long, env = "DEBATE_URL", default_value = "http://localhost:8000")]
    pub url: String,
}

impl From<FragmentSize> for Granularity {
    fn from(size: FragmentSize) -> Self {
        match size {
            FragmentSize::Char => Granularity::Char,
            FragmentSize::Word => Granularity::Word,
        }
    }
}

impl From<&PacingArgs> for Pacing {
    fn from(args: &PacingArgs) -> Self {
        Pacing {
            warmup: [
                Duration::from_millis(args.startup_delay_ms),
                Duration::from_millis(args.ready_delay_ms),
            ],
            speaker: Duration::from_millis(args.speaker_delay_ms),
            token: Duration::from_millis(args.token_delay_ms),
            speaker_end: Duration::from_millis(args.turn_delay_ms),
            ..Pacing::default()
        }
    }
}

impl ServeArgs {
    pub fn into_config(self) -> ServerConfig {
        ServerConfig {
            origins: OriginPolicy::new(self.wildcard_domain, self.allowed_origins),
            pacing: if self.instant {
                Pacing::instant()
            } else {
                Pacing::from(&self.pacing)
            },
            granularity: self.granularity.into(),
            keep_alive: Duration::from_secs(self.keep_alive_secs),
            listen: self.listen,
        }
    }
}

impl WatchArgs {
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.url.clone(),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
        }
    }

    pub fn request(&self) -> DebateRequest {
        DebateRequest::new(self.topic.clone(), self.rounds)
    }
}
