use std::sync::Arc;

use clap::{
    CommandFactory, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use clap_complete::{Shell, generate};

use yfitops::{
    cli,
    config::{self, Config},
    error,
    logging,
    management::SessionManager,
    server::{BrowserAuthorizer, ManualAuthorizer},
    service::{AuthorizationCodeSource, SpotifyService},
    spotify::SpotifyClient,
    warning,
};

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::White.on_default() | Effects::BOLD)
        .usage(AnsiColor::White.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightBlue.on_default())
        .placeholder(AnsiColor::BrightGreen.on_default())
}

#[derive(Parser, Debug, Clone)]
#[clap(
  version = env!("CARGO_PKG_VERSION"),
  name=env!("CARGO_PKG_NAME"),
  bin_name=env!("CARGO_PKG_NAME"),
  author=env!("CARGO_PKG_AUTHORS"),
  about=env!("CARGO_PKG_DESCRIPTION"),
  styles=styles(),
)]
struct Cli {
    /// Print debug logs to stderr
    #[clap(long, short, global = true)]
    verbose: bool,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Authorize with Spotify API
    Login(LoginOptions),

    /// Forget the stored session
    Logout,

    /// Show whether credentials and a session are available
    Status,

    /// Show the logged in user
    Whoami,

    /// Search tracks and albums
    Search(SearchOptions),

    /// Show an album and its tracks
    Album(AlbumOptions),

    /// Manage the queue playlist
    Queue(QueueOptions),

    /// Get shell completions
    Completions(CompletionsOption),
}

#[derive(Parser, Debug, Clone)]
pub struct LoginOptions {
    /// Paste the redirect URL instead of running the local callback server
    #[clap(long)]
    pub manual: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct SearchOptions {
    /// Search terms
    #[clap(required = true, num_args = 1..)]
    pub query: Vec<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct AlbumOptions {
    /// Album id or `spotify:album:` URI
    pub id: String,
}

#[derive(Parser, Debug, Clone)]
pub struct QueueOptions {
    #[command(subcommand)]
    pub command: QueueSubcommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum QueueSubcommand {
    /// Find or create the queue playlist
    Ensure,

    /// Append tracks to the queue playlist
    Add(QueueAddOpts),

    /// Move a block of the queue playlist behind the current track
    PlayNext(QueuePlayNextOpts),

    /// Show what is playing and from which context
    Context,
}

#[derive(Parser, Debug, Clone)]
pub struct QueueAddOpts {
    /// Track ids, URIs or open.spotify.com links
    #[clap(required = true, num_args = 1..)]
    pub tracks: Vec<String>,

    /// Play the added tracks right after the current one
    #[clap(long)]
    pub next: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct QueuePlayNextOpts {
    /// Index of the first item to move
    #[clap(long, allow_negative_numbers = true)]
    pub range_start: i64,

    /// Number of items to move
    #[clap(long, default_value_t = 1, allow_negative_numbers = true)]
    pub range_length: i64,

    /// Reject the move if the playlist changed since this snapshot
    #[clap(long)]
    pub snapshot_id: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct CompletionsOption {
    shell: Shell,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = config::load_env().await {
        warning!("Cannot load environment. Err: {}", e);
    }
    logging::init_logging(cli.verbose);

    if let Command::Completions(opt) = &cli.command {
        let mut cmd = Cli::command_for_update();
        let name = cmd.get_name().to_string();
        generate(opt.shell, &mut cmd, name, &mut std::io::stdout());
        return;
    }

    let config = Config::from_env();
    let authorizer: Arc<dyn AuthorizationCodeSource> = match &cli.command {
        Command::Login(opt) if opt.manual => Arc::new(ManualAuthorizer::new(&config)),
        _ => Arc::new(BrowserAuthorizer::new(&config)),
    };
    let service = SpotifyService::new(
        config.clone(),
        Arc::new(SpotifyClient::new(&config)),
        authorizer,
    );

    let session_path = config::session_path();
    if session_path.is_file() {
        match SessionManager::load(&session_path).await {
            Ok(manager) => {
                if let Some(session) = manager.session() {
                    service.restore_session(session.clone()).await;
                }
            }
            Err(e) => warning!("Ignoring unreadable session file. Err: {}", e),
        }
    }

    let outcome = match cli.command {
        Command::Login(_) => cli::login(&service).await,
        Command::Logout => {
            cli::logout(&service).await;
            Ok(())
        }
        Command::Status => {
            cli::status(&service).await;
            Ok(())
        }
        Command::Whoami => cli::whoami(&service).await,
        Command::Search(opt) => cli::search(&service, &opt.query.join(" ")).await,
        Command::Album(opt) => cli::album(&service, &opt.id).await,
        Command::Queue(opt) => match opt.command {
            QueueSubcommand::Ensure => cli::queue_ensure(&service).await,
            QueueSubcommand::Add(add) => cli::queue_add(&service, &add.tracks, add.next).await,
            QueueSubcommand::PlayNext(p) => {
                cli::queue_play_next(&service, p.range_start, p.range_length, p.snapshot_id).await
            }
            QueueSubcommand::Context => cli::queue_context(&service).await,
        },
        Command::Completions(_) => Ok(()),
    };

    let manager = match service.session().await {
        Some(session) => SessionManager::with_session(session),
        None => SessionManager::new(),
    };
    if let Err(e) = manager.persist(&session_path).await {
        warning!("Failed to save session. Err: {}", e);
    }

    if let Err(e) = outcome {
        error!("{}", e);
    }
}
