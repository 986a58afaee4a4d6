/// Resonance Player - headless command-line player
use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use resonance_core::TrackId;
use resonance_player::{PlayerConfig, Session};
use resonance_playback::{LoopMode, PlayOptions, PlayerCommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "resonance-player")]
#[command(about = "Play tracks from a Resonance catalog", long_about = None)]
struct Cli {
    /// Configuration file path (defaults to ./resonance.toml if present)
    #[arg(short, long, global = true, env = "RESONANCE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a single track, optionally within a queue
    Play {
        /// Track ID
        track_id: String,

        /// Queue to play the track in (repeatable)
        #[arg(long = "in", value_name = "TRACK_ID")]
        queue: Vec<String>,
    },
    /// Shuffle a queue and play it through
    Queue {
        /// Track IDs
        #[arg(required = true)]
        track_ids: Vec<String>,

        /// Index of the first track to play
        #[arg(short, long, default_value_t = 0)]
        start: usize,

        /// Loop mode: none, all or one
        #[arg(short, long, value_parser = parse_loop_mode)]
        loop_mode: Option<LoopMode>,
    },
    /// Resume the last played track
    Resume,
}

fn parse_loop_mode(value: &str) -> Result<LoopMode, String> {
    LoopMode::from_str(&value.to_lowercase())
        .ok_or_else(|| format!("unknown loop mode '{value}' (expected none, all or one)"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "resonance_player=info,resonance_playback=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let config = PlayerConfig::load(cli.config.as_deref())?;
    config.validate()?;

    let mut session = Session::start(&config)
        .await
        .context("failed to start player")?;

    match cli.command {
        Commands::Play { track_id, queue } => {
            let track = session
                .fetch_tracks(&[TrackId::new(track_id)])
                .await?
                .pop()
                .context("catalog returned no track")?;
            let options = if queue.is_empty() {
                PlayOptions::default()
            } else {
                let ids: Vec<TrackId> = queue.into_iter().map(TrackId::new).collect();
                PlayOptions::with_queue(session.fetch_tracks(&ids).await?)
            };
            session.player().play(track, options).await?;
        }
        Commands::Queue {
            track_ids,
            start,
            loop_mode,
        } => {
            let ids: Vec<TrackId> = track_ids.into_iter().map(TrackId::new).collect();
            let tracks = session.fetch_tracks(&ids).await?;
            if let Some(mode) = loop_mode {
                session
                    .player()
                    .send(PlayerCommand::SetLoopMode(mode))
                    .await?;
            }
            session.player().play_queue(tracks, start).await?;
        }
        Commands::Resume => {
            let Some(track) = session.player().snapshot().current_track else {
                bail!("no previous session to resume");
            };
            tracing::info!(track_id = %track.id, name = %track.name, "Resuming last track");
            session.player().resume().await?;
        }
    }

    tokio::select! {
        result = session.wait_until_finished() => result?,
        _ = tokio::signal::ctrl_c() => tracing::info!("Interrupted"),
    }

    let snapshot = session.shutdown().await?;
    tracing::info!(
        track = snapshot.current_track.as_ref().map(|t| t.name.as_str()).unwrap_or("-"),
        "Player stopped"
    );

    Ok(())
}
