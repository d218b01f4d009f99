use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use dialoguer::{Confirm, Select};
use log::{info, warn};
use tokio_util::sync::CancellationToken;

use player_attribution::batch::{BatchSample, FrameSource, MaskMode};
use player_attribution::calibration::{sample_profile, DEFAULT_SAMPLE_SIDE};
use player_attribution::color::rgb_to_hex;
use player_attribution::review::{FlushOutcome, ReviewChoice};
use player_attribution::{
    init_logging, CalibrationStore, Database, EngineConfig, FileCalibrationStore, OfflineBatchClassifier, Player,
    ReviewQueue,
};

/// Player attribution for two-player block-game sessions
#[derive(Parser, Debug)]
#[command(name = "attribution")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Engine config file (defaults apply when absent)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding calibration.json and the move database
    #[arg(short, long, global = true, default_value = "attribution-data")]
    data_dir: PathBuf,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Store a player's color profile sampled from an image
    Calibrate {
        #[arg(short, long, value_enum)]
        player: PlayerArg,

        /// Image showing the player's color
        #[arg(short, long, required_unless_present = "clear")]
        image: Option<PathBuf>,

        /// Sample center (defaults to the image center)
        #[arg(long, requires = "y")]
        x: Option<u32>,
        #[arg(long, requires = "x")]
        y: Option<u32>,

        /// Side of the sampled square in pixels
        #[arg(long, default_value_t = DEFAULT_SAMPLE_SIDE)]
        side: u32,

        /// Remove the player's profile instead
        #[arg(long, conflicts_with = "image")]
        clear: bool,
    },

    /// Print the stored calibration
    ShowCalibration,

    /// Re-run the offline clustering over a session's captured frames
    Reclassify {
        #[arg(short, long)]
        session: String,

        /// Report without writing labels back
        #[arg(long)]
        dry_run: bool,
    },

    /// Resolve a session's uncertain moves by hand
    Review {
        #[arg(short, long)]
        session: String,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum PlayerArg {
    A,
    B,
}

impl From<PlayerArg> for Player {
    fn from(arg: PlayerArg) -> Self {
        match arg {
            PlayerArg::A => Player::A,
            PlayerArg::B => Player::B,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    let calibration = FileCalibrationStore::open(cli.data_dir.join("calibration.json"))?;

    match cli.command {
        Commands::Calibrate {
            player,
            image,
            x,
            y,
            side,
            clear,
        } => calibrate(&calibration, player.into(), image.as_deref(), x.zip(y), side, clear),
        Commands::ShowCalibration => show_calibration(&calibration),
        Commands::Reclassify { session, dry_run } => {
            let db = open_database(&cli.data_dir)?;
            reclassify(&db, Arc::new(calibration), config, &session, dry_run).await
        }
        Commands::Review { session } => {
            let db = open_database(&cli.data_dir)?;
            review(&db, &config, &session).await
        }
    }
}

fn open_database(data_dir: &Path) -> Result<Database> {
    Database::new(data_dir.join("attribution.sqlite3"))
}

fn calibrate(
    store: &FileCalibrationStore,
    player: Player,
    image: Option<&Path>,
    center: Option<(u32, u32)>,
    side: u32,
    clear: bool,
) -> Result<()> {
    if clear {
        store.clear(player)?;
        println!("Cleared calibration for {player}");
        return Ok(());
    }

    let Some(path) = image else {
        bail!("an image is required to calibrate {player}");
    };
    let frame = image::open(path)
        .with_context(|| format!("failed to open {}", path.display()))?
        .to_rgb8();
    let profile = sample_profile(&frame, center, side)?;
    store.set(player, profile)?;

    let rgb = profile.to_rgb();
    println!(
        "{player}: h={:.1} s={:.1} v={:.1} ({})",
        profile.h,
        profile.s,
        profile.v,
        rgb_to_hex(rgb.r, rgb.g, rgb.b)
    );
    Ok(())
}

fn show_calibration(store: &FileCalibrationStore) -> Result<()> {
    let snapshot = store.snapshot();
    for player in Player::BOTH {
        match snapshot.get(player) {
            Some(profile) => println!(
                "{player}: h={:.1} s={:.1} v={:.1} (±{:.0}/{:.0}/{:.0})",
                profile.h, profile.s, profile.v, profile.hue_tolerance, profile.sat_tolerance, profile.val_tolerance
            ),
            None => println!("{player}: not calibrated"),
        }
    }
    if let Some(updated) = store.last_updated() {
        println!("Last updated {}", updated.to_rfc3339());
    }
    Ok(())
}

async fn reclassify(
    db: &Database,
    calibration: Arc<dyn CalibrationStore>,
    mut config: EngineConfig,
    session: &str,
    dry_run: bool,
) -> Result<()> {
    if config.batch.mask_mode == MaskMode::Segmented {
        warn!("no segmentation provider available from the command line; averaging whole frames");
        config.batch.mask_mode = MaskMode::General;
    }

    let moves = db.list_moves_for_session(session).await?;
    let samples: Vec<BatchSample> = moves
        .iter()
        .filter_map(|record| {
            let frame = record.captured_frame.as_ref()?;
            Some(BatchSample {
                move_id: record.move_id.clone(),
                source: FrameSource::Path(PathBuf::from(frame)),
                existing_label: record.assigned_player.player(),
            })
        })
        .collect();
    info!(
        "session {session}: {} move(s), {} with a captured frame",
        moves.len(),
        samples.len()
    );

    let cancel = CancellationToken::new();
    let ctrl_c_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c_token.cancel();
        }
    });

    let classifier = OfflineBatchClassifier::new(config.batch.clone(), calibration, None);
    let outcome = classifier.run(samples, &cancel).await?;

    for cluster in &outcome.clusters {
        println!(
            "{} <- {} move(s), centroid [{:.3}, {:.3}, {:.3}] ({:?})",
            cluster.assigned_player,
            cluster.member_move_ids.len(),
            cluster.centroid[0],
            cluster.centroid[1],
            cluster.centroid[2],
            cluster.mapped_by
        );
    }
    println!(
        "{} frame(s) skipped, {} rebalanced, converged: {}",
        outcome.skipped.len(),
        outcome.rebalanced_count(),
        outcome.converged
    );

    if dry_run {
        return Ok(());
    }
    let updates = outcome.updates();
    let written = db.apply_attributions(&updates).await?;
    let kept = updates.len() - written;
    if kept > 0 {
        warn!("{kept} move(s) already labelled by a reviewer were left unchanged");
    }
    println!("Updated {written} move(s)");
    Ok(())
}

async fn review(db: &Database, config: &EngineConfig, session: &str) -> Result<()> {
    let moves = db.list_moves_for_session(session).await?;
    let mut queue = ReviewQueue::from_records(moves, config.review.acceptance_threshold);
    if queue.remaining() == 0 {
        println!("Nothing to review");
        return Ok(());
    }

    let options = ["Player A", "Player B", "Skip"];
    while let Some(item) = queue.current() {
        let prompt = format!(
            "Move {} ({}, {} at {:.2}) frame: {}",
            item.record.move_id,
            item.record.phase,
            item.record.assigned_player.as_str(),
            item.record.confidence,
            item.record.captured_frame.as_deref().unwrap_or("none")
        );
        let selection = Select::new()
            .with_prompt(prompt)
            .items(&options)
            .default(0)
            .interact()?;
        let choice = match selection {
            0 => ReviewChoice::Player(Player::A),
            1 => ReviewChoice::Player(Player::B),
            _ => ReviewChoice::Skip,
        };
        queue.decide(choice);
    }

    loop {
        match queue.flush(db, config.review.flush_timeout()).await {
            Ok(FlushOutcome::Empty) => {
                println!("No decisions to save");
                break;
            }
            Ok(FlushOutcome::Written(count)) => {
                println!("Saved {count} decision(s)");
                break;
            }
            Err(err) => {
                eprintln!("{err}");
                let retry = Confirm::new()
                    .with_prompt("Retry saving?")
                    .default(true)
                    .interact()?;
                if !retry {
                    bail!("{} review decision(s) were not saved", queue.pending().len());
                }
            }
        }
    }

    if !queue.skipped().is_empty() {
        println!("{} move(s) skipped", queue.skipped().len());
    }
    Ok(())
}
