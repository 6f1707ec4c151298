//! By Defeat - band player command-line client
//!
//! Main entry point: parses arguments, installs logging and dispatches to
//! the commands.

use std::path::PathBuf;

use anyhow::{Context, Result};
use bydefeat_core::{AuthStatus, CallbackState, SessionState};
use bydefeat_domain::Track;
use bydefeat_infra::config;
use bydefeat_lib::commands::{self, Transport};
use bydefeat_lib::utils::init_logging;
use bydefeat_lib::AppContext;
use clap::{Parser, Subcommand};
use tracing::info;

/// By Defeat - log in and play the band's catalog.
#[derive(Parser, Debug)]
#[command(name = "bydefeat")]
#[command(version, about, long_about = None)]
struct Args {
    /// Config file to load instead of the standard locations.
    #[arg(short, long, env = "BYDEFEAT_CONFIG")]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines.
    #[arg(long, env = "BYDEFEAT_LOG_JSON")]
    json_logs: bool,

    /// Print results as JSON.
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log in through the browser.
    Login,
    /// Show the session state.
    Status,
    /// Forget stored credentials.
    Logout,
    /// List the band catalog.
    Tracks,
    /// List tracks saved in your library.
    Saved,
    /// Play the current track, or the catalog entry at INDEX.
    Play { index: Option<usize> },
    Pause,
    Next,
    Previous,
    /// Set the output level, 0.0 to 1.0.
    Volume { level: f32 },
    /// Jump to a position in percent of the track.
    Seek { progress: f32 },
    /// Show audio features of the catalog entry at INDEX.
    Features { index: usize },
}

fn load_context(path: Option<PathBuf>) -> Result<AppContext> {
    let config = match path {
        Some(path) => {
            let mut config = config::load_from_file(Some(path))?;
            config::apply_env(&mut config)?;
            config.validate()?;
            config
        }
        None => config::load()?,
    };
    AppContext::with_config(config).context("failed to initialize application context")
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env first so RUST_LOG from it applies
    let _ = dotenvy::dotenv();

    let args = Args::parse();
    init_logging(args.json_logs);
    info!(command = ?args.command, "By Defeat starting");

    let ctx = load_context(args.config)?;

    match args.command {
        Command::Login => {
            let outcome = commands::login(&ctx, |url| {
                println!("Open this URL in your browser to log in:\n\n  {url}\n");
            })
            .await?;
            match outcome {
                CallbackState::Success => {
                    let state = ctx.session.state();
                    print_state(&state, args.json)?;
                    if !args.json {
                        print_tracks(&state.playlist, false)?;
                    }
                }
                CallbackState::Error(failure) => anyhow::bail!("login failed: {failure}"),
                CallbackState::TimedOut => {
                    anyhow::bail!("login timed out waiting for the token exchange")
                }
                CallbackState::Idle | CallbackState::Exchanging => {
                    anyhow::bail!("login did not complete")
                }
            }
        }
        Command::Status => print_state(&commands::status(&ctx).await?, args.json)?,
        Command::Logout => {
            commands::logout(&ctx).await;
            println!("Logged out.");
        }
        Command::Tracks => print_tracks(&commands::tracks(&ctx).await?, args.json)?,
        Command::Saved => print_tracks(&commands::saved_tracks(&ctx).await?, args.json)?,
        Command::Features { index } => match commands::audio_features(&ctx, index).await? {
            Some(features) if args.json => println!("{}", serde_json::to_string_pretty(&features)?),
            Some(features) => println!(
                "energy {:.2}  valence {:.2}  danceability {:.2}  tempo {:.0} bpm",
                features.energy, features.valence, features.danceability, features.tempo
            ),
            None => println!("No audio features available."),
        },
        Command::Play { index } => run_transport(&ctx, Transport::Play(index), args.json).await?,
        Command::Pause => run_transport(&ctx, Transport::Pause, args.json).await?,
        Command::Next => run_transport(&ctx, Transport::Next, args.json).await?,
        Command::Previous => run_transport(&ctx, Transport::Previous, args.json).await?,
        Command::Volume { level } => run_transport(&ctx, Transport::Volume(level), args.json).await?,
        Command::Seek { progress } => {
            run_transport(&ctx, Transport::Seek(progress), args.json).await?;
        }
    }

    Ok(())
}

async fn run_transport(ctx: &AppContext, action: Transport, json: bool) -> Result<()> {
    let state = commands::transport(ctx, action).await?;
    print_state(&state, json)
}

fn print_state(state: &SessionState, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(state)?);
        return Ok(());
    }

    match &state.auth_status {
        AuthStatus::Authenticated => {
            let name = state
                .profile
                .as_ref()
                .map_or("unknown listener", |p| p.display_name.as_deref().unwrap_or(p.id.as_str()));
            println!("Logged in as {name}");
        }
        AuthStatus::AuthError(reason) => println!("Login error: {reason}"),
        AuthStatus::Unauthenticated | AuthStatus::Authenticating => println!("Not logged in"),
    }

    if let Some(track) = &state.current_track {
        let marker = if state.is_playing { "Playing" } else { "Paused" };
        println!("{marker}: {} - {} ({:.0}%)", track.artist, track.name, state.progress);
    }
    println!("Volume: {:.0}%", state.volume * 100.0);
    if let Some(error) = &state.error {
        println!("Note: {error}");
    }
    Ok(())
}

fn print_tracks(tracks: &[Track], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(tracks)?);
        return Ok(());
    }
    for (index, track) in tracks.iter().enumerate() {
        let minutes = track.duration_ms / 60_000;
        let seconds = (track.duration_ms / 1000) % 60;
        println!("{index:>3}  {} - {}  [{minutes}:{seconds:02}]", track.artist, track.name);
    }
    Ok(())
}
