//! Checkers client - terminal front end
//!
//! Opens one server-hosted game and plays it from line commands on stdin.

#![warn(missing_docs)]

mod cli;

use anyhow::Result;
use checkers_client::{
    ClientConfig, CredentialStore, Credentials, FileCredentialStore, GameView, HttpTokenRefresher,
    SessionTransport, UserCommand, ViewEvent, WsConnector, parse_command,
};
use clap::Parser;
use cli::{Cli, Command};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info, instrument};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const HELP: &str = "commands: t <row> <col> | say <text> | board | cancel | quit";

type TerminalView = GameView<WsConnector, HttpTokenRefresher, FileCredentialStore>;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = ClientConfig::load(&cli.config)?;
    initialize_tracing(config.log_filter());

    match cli.command {
        Command::Play {
            game_id,
            token,
            refresh_token,
            username,
        } => run_play(config, game_id, token, refresh_token, username).await,
        Command::Logout => run_logout(&config),
    }
}

fn initialize_tracing(default_filter: &str) {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Play one game until quit, logout or reconnect exhaustion.
#[instrument(skip(config, token, refresh_token, username))]
async fn run_play(
    config: ClientConfig,
    game_id: u64,
    token: Option<String>,
    refresh_token: Option<String>,
    username: Option<String>,
) -> Result<()> {
    let mut store = FileCredentialStore::open(config.credentials_path())?;
    if let (Some(token), Some(refresh_token)) = (token, refresh_token) {
        let username = username.or_else(|| store.username()).unwrap_or_default();
        store.store(Credentials::new(username, token, refresh_token))?;
    }

    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let connector = WsConnector::new(config.server_url().clone(), event_tx.clone());
    let refresher = HttpTokenRefresher::new(config.refresh_url().clone(), event_tx);
    let session = SessionTransport::new(connector, refresher, store, *config.reconnect());
    let mut view = GameView::new(session);

    info!(server_url = %config.server_url(), "Starting client");
    println!("{}", HELP);
    let mut commands = spawn_stdin_reader();
    let events = view.open(game_id);
    let mut finished = report(&view, events);

    while !finished {
        tokio::select! {
            Some(event) = event_rx.recv() => {
                let events = view.handle(event);
                finished = report(&view, events);
            }
            command = commands.recv() => match command {
                Some(UserCommand::Quit) | None => finished = true,
                Some(command) => {
                    let events = run_command(&mut view, command);
                    finished = report(&view, events);
                }
            },
        }
    }

    let events = view.close();
    report(&view, events);
    info!("Client stopped");
    Ok(())
}

#[instrument(skip(config))]
fn run_logout(config: &ClientConfig) -> Result<()> {
    let mut store = FileCredentialStore::open(config.credentials_path())?;
    store.clear()?;
    println!("Credentials removed from {}", store.path().display());
    Ok(())
}

fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<UserCommand> {
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            match parse_command(&line) {
                Some(command) => {
                    if tx.send(command).is_err() {
                        break;
                    }
                }
                None => println!("{}", HELP),
            }
        }
        debug!("Stdin closed");
    });
    rx
}

fn run_command(view: &mut TerminalView, command: UserCommand) -> Vec<ViewEvent> {
    match command {
        UserCommand::Touch(pos) => view.touch(pos),
        UserCommand::Say(text) => {
            view.send_chat(&text);
            Vec::new()
        }
        UserCommand::Board => {
            print_board(view);
            Vec::new()
        }
        UserCommand::Cancel => view.cancel_selection(),
        UserCommand::Quit => Vec::new(),
    }
}

fn print_board(view: &TerminalView) {
    let Some(state) = view.board() else {
        println!("No board loaded yet");
        return;
    };
    print!("{}", state.board().display());
    println!(
        "{} vs {} | {} ({}) to move | {}",
        state.player1(),
        state.player2(),
        state.player_to_move(),
        state.side_to_move(),
        state.status()
    );
}

/// Prints view events. Returns true when the session cannot continue.
fn report(view: &TerminalView, events: Vec<ViewEvent>) -> bool {
    let mut finished = false;
    for event in events {
        match event {
            ViewEvent::Session(state) => println!("[{}]", state),
            ViewEvent::SignedIn { username } => {
                println!("Signed in as {}", username.as_deref().unwrap_or("unknown"))
            }
            ViewEvent::BoardLoaded => print_board(view),
            ViewEvent::MoveApplied { player, encoded } => {
                println!("{} played {}", player, encoded);
                print_board(view);
            }
            ViewEvent::MoveRejected { player, encoded } => {
                println!("Move {} by {} was rejected", encoded, player)
            }
            ViewEvent::GameOver(status) => println!("Game over: {}", status),
            ViewEvent::SelectionStarted(pos) => {
                let targets = &view.highlights().targets;
                println!("Selected {}; targets {:?}", pos, targets);
            }
            ViewEvent::AwaitingHop => {
                println!("Keep jumping; targets {:?}", view.highlights().targets)
            }
            ViewEvent::SelectionCleared => println!("Selection cleared"),
            ViewEvent::MoveSubmitted { encoded } => println!("Sent {}", encoded),
            ViewEvent::Chat(chat) => println!(
                "<{}> {}",
                chat.player.as_deref().unwrap_or("server"),
                chat.message
            ),
            ViewEvent::LoggedOut { reason } => {
                println!("Logged out: {}. Log in again with --token and --refresh-token.", reason);
                finished = true;
            }
            ViewEvent::ConnectionAbandoned => {
                println!("Could not reach the server, giving up");
                finished = true;
            }
        }
    }
    finished
}
