use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dojo_scoreboard::api::{build_router, cors_layer, state::AppState};
use dojo_scoreboard::calculate::{aggregate_with, classify, find_winner};
use dojo_scoreboard::config::AppConfig;
use dojo_scoreboard::feed::{
    run_poller, scoreboard_rows, HttpSnapshotSource, ScoreboardRow, ScoreboardView, SnapshotHub,
    SnapshotSource,
};
use dojo_scoreboard::models::{Match, ScoringRules, StatColumn, Tournament, TournamentId};
use dojo_scoreboard::parse_duration;
use dojo_scoreboard::storage::{latest_snapshots, load_snapshots, JsonlWriter};

#[derive(Parser)]
#[command(name = "dojo-scoreboard")]
#[command(about = "Live scoreboard for round-robin martial arts tournaments")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "./config.toml")]
    config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server
    Serve {
        /// Bind address (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port number (overrides config)
        #[arg(long)]
        port: Option<u16>,

        /// Snapshot file (.json or .jsonl) to load at startup
        #[arg(long)]
        seed: Option<PathBuf>,

        /// Tournament ids to keep polling from the backend
        #[arg(long)]
        poll: Vec<String>,
    },

    /// Print standings from a snapshot file
    Standings {
        /// Snapshot file (.json or .jsonl)
        #[arg(long)]
        file: PathBuf,

        /// Only this tournament
        #[arg(long)]
        id: Option<String>,
    },

    /// Print ongoing, upcoming and past matches from a snapshot file
    Matches {
        /// Snapshot file (.json or .jsonl)
        #[arg(long)]
        file: PathBuf,

        /// Only this tournament
        #[arg(long)]
        id: Option<String>,
    },

    /// Follow a live tournament from the backend
    Watch {
        /// Tournament id
        #[arg(long)]
        id: String,

        /// Poll interval (e.g., "5s", "1m"); overrides config
        #[arg(long)]
        interval: Option<String>,

        /// Append every received snapshot to this JSONL file
        #[arg(long)]
        record: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load_or_default(Path::new(&cli.config))
        .with_context(|| format!("Failed to load config from {}", cli.config))?;

    // Initialize tracing
    let log_level = cli.log_level.as_deref().unwrap_or(&config.log_level);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    if cli.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    tracing::info!("Starting dojo-scoreboard v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Serve {
            host,
            port,
            seed,
            poll,
        } => {
            let hub = Arc::new(SnapshotHub::default());

            if let Some(seed) = seed {
                let snapshots = latest_snapshots(load_snapshots(&seed)?);
                tracing::info!("Seeding {} tournaments from {:?}", snapshots.len(), seed);
                for snapshot in snapshots {
                    if let Err(e) = aggregate_with(&snapshot, &config.scoring) {
                        tracing::warn!(tournament = %snapshot.id, "Skipping seed snapshot: {}", e);
                        continue;
                    }
                    hub.publish(snapshot).await;
                }
            }

            if !poll.is_empty() {
                let source: Arc<dyn SnapshotSource> =
                    Arc::new(HttpSnapshotSource::new(config.backend.source_config())?);
                let interval = poll_interval(None, &config)?;
                for id in poll {
                    tokio::spawn(run_poller(
                        Arc::clone(&source),
                        Arc::clone(&hub),
                        TournamentId::from(id),
                        interval,
                    ));
                }
            }

            let state = AppState {
                hub,
                rules: config.scoring,
            };
            let app = build_router(state).layer(cors_layer(&config.server.cors_origin));

            let host = host.unwrap_or(config.server.host);
            let port = port.unwrap_or(config.server.port);
            let addr = format!("{}:{}", host, port);
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            tracing::info!("Scoreboard API: http://{}/api", addr);
            axum::serve(listener, app).await?;
        }
        Commands::Standings { file, id } => {
            for tournament in select(&file, id.as_deref())? {
                print_standings(&tournament, &config.scoring)?;
            }
        }
        Commands::Matches { file, id } => {
            for tournament in select(&file, id.as_deref())? {
                print_matches(&tournament)?;
            }
        }
        Commands::Watch {
            id,
            interval,
            record,
        } => {
            let interval = poll_interval(interval.as_deref(), &config)?;
            let id = TournamentId::from(id);
            let source: Arc<dyn SnapshotSource> =
                Arc::new(HttpSnapshotSource::new(config.backend.source_config())?);
            let hub = Arc::new(SnapshotHub::default());
            let recorder = record.map(JsonlWriter::<Tournament>::new);

            let mut subscription = hub.subscribe(&id).await;
            let poller = tokio::spawn(run_poller(source, Arc::clone(&hub), id.clone(), interval));
            let mut view = ScoreboardView::new(id.clone(), config.scoring);

            loop {
                tokio::select! {
                    update = subscription.recv() => {
                        let update = update?;
                        if let Some(recorder) = &recorder {
                            recorder.append(update.tournament.as_ref())?;
                        }
                        match view.apply(&update) {
                            Ok(true) => print_view(&view),
                            Ok(false) => {}
                            Err(e) => tracing::warn!(
                                tournament = %id,
                                revision = update.revision,
                                "Keeping previous scoreboard: {}",
                                e
                            ),
                        }
                    }
                    _ = tokio::signal::ctrl_c() => {
                        tracing::info!("Stopping watch");
                        break;
                    }
                }
            }

            poller.abort();
            hub.unsubscribe(&id).await;
        }
    }

    Ok(())
}

fn poll_interval(flag: Option<&str>, config: &AppConfig) -> Result<Duration> {
    match flag {
        Some(s) => parse_duration(s)
            .filter(|d| !d.is_zero())
            .ok_or_else(|| anyhow!("Invalid interval: {}", s)),
        None => config
            .backend
            .poll_interval()
            .ok_or_else(|| anyhow!("Invalid poll interval in config")),
    }
}

/// Latest snapshot of each tournament in `file`, optionally just one.
fn select(file: &Path, id: Option<&str>) -> Result<Vec<Tournament>> {
    let mut snapshots = latest_snapshots(load_snapshots(file)?);
    if let Some(id) = id {
        snapshots.retain(|t| t.id.as_str() == id);
        if snapshots.is_empty() {
            return Err(anyhow!("Tournament {} not found in {:?}", id, file));
        }
    }
    Ok(snapshots)
}

fn print_header(tournament: &Tournament) {
    println!(
        "\n{} ({}, {})",
        tournament.name,
        tournament.location,
        tournament.start_date.format("%Y-%m-%d")
    );
    println!("{}", "=".repeat(60));
}

fn print_table(rows: &[ScoreboardRow]) {
    print!("{:<4} {:<28}", "#", "Player");
    for column in StatColumn::ALL {
        print!(" {:>7}", column.label());
    }
    println!();

    for row in rows {
        print!("{:<4} {:<28}", row.rank, row.name);
        for cell in &row.stats {
            print!(" {:>7}", cell.value);
        }
        println!();
    }
}

fn print_standings(tournament: &Tournament, rules: &ScoringRules) -> Result<()> {
    let standings = aggregate_with(tournament, rules)?;
    print_header(tournament);
    print_table(&scoreboard_rows(&standings, tournament.has_same_names()));

    if let Some(winner) = find_winner(tournament, rules)? {
        println!("\nWinner: {}", tournament.player_name(&winner));
    }
    Ok(())
}

fn print_matches(tournament: &Tournament) -> Result<()> {
    let buckets = classify(&tournament.match_schedule)?;
    let same_names = tournament.has_same_names();
    print_header(tournament);

    for (label, matches) in [
        ("Ongoing", &buckets.ongoing),
        ("Upcoming", &buckets.upcoming),
        ("Past", &buckets.past),
    ] {
        println!("\n{} ({})", label, matches.len());
        for m in matches {
            println!("  {}", describe(m, same_names));
        }
    }
    Ok(())
}

fn describe(m: &Match, same_names: bool) -> String {
    let names: Vec<String> = m.players.iter().map(|p| p.display_name(same_names)).collect();
    if m.is_bye() {
        return format!("{} (bye)", names.join(""));
    }

    let mut line = format!("{}  {}", names.join(" vs "), m.score_line());
    if m.winner.is_none() && !m.has_ended() && !m.time_expired() {
        line.push_str(&format!("  [{:.0}/{:.0}s]", m.elapsed_time, m.match_time));
    }
    line
}

fn print_view(view: &ScoreboardView) {
    if let Some(tournament) = view.tournament() {
        print_header(tournament);
    }
    println!(
        "revision {}  ongoing {}  upcoming {}  past {}",
        view.revision(),
        view.buckets().ongoing.len(),
        view.buckets().upcoming.len(),
        view.buckets().past.len()
    );
    print_table(&view.rows());
}
