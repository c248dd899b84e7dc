use anyhow::{Context, Result};
use atomic_write_file::AtomicWriteFile;
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use listing_rank::listing::{parse_listings, Category, VisitKind, VisitRecord};
use listing_rank::ranker::{LogObserver, RankError, Ranker};
use listing_rank::scoring::{calculate_score, Importance};
use listing_rank::store::{JsonFileStore, StoreError};

// Exit codes
const EXIT_SUCCESS: i32 = 0;
const EXIT_FAILURE: i32 = 1;
const EXIT_STORAGE: i32 = 2;
const EXIT_CONFIG: i32 = 4;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CategoryArg {
    Dwelling,
    RoomShare,
}

impl From<CategoryArg> for Category {
    fn from(arg: CategoryArg) -> Self {
        match arg {
            CategoryArg::Dwelling => Category::Dwelling,
            CategoryArg::RoomShare => Category::RoomShare,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum KindArg {
    Visit,
    Contact,
    Note,
}

impl From<KindArg> for VisitKind {
    fn from(arg: KindArg) -> Self {
        match arg {
            KindArg::Visit => VisitKind::Visit,
            KindArg::Contact => VisitKind::Contact,
            KindArg::Note => VisitKind::Note,
        }
    }
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Print the active scoring config of a category
    Show {
        #[arg(value_enum)]
        category: CategoryArg,
    },
    /// Restore the built-in preset of a category and re-rank
    Reset {
        #[arg(value_enum)]
        category: CategoryArg,
    },
    /// Set how much an attribute matters (0 irrelevant, 1 valuable, 2 essential)
    SetWeight {
        #[arg(value_enum)]
        category: CategoryArg,
        key: String,
        level: u8,
    },
    /// Set an acceptance range (price, size, rooms, bathrooms); omitted bounds are unset
    SetRange {
        #[arg(value_enum)]
        category: CategoryArg,
        field: String,
        #[arg(long)]
        min: Option<f64>,
        #[arg(long)]
        max: Option<f64>,
    },
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List saved listings, best first (default if no subcommand)
    List,
    /// Import extracted listings from a JSON file, or `-` for stdin
    Add { file: String },
    /// Remove a listing by id
    Remove { id: String },
    /// Remove every saved listing
    Clear,
    /// Record a visit, contact or note on a listing
    Visit {
        id: String,
        #[arg(long, value_enum, default_value = "visit")]
        kind: KindArg,
        #[arg(long)]
        note: Option<String>,
    },
    /// Recalculate every score under the current configs
    Recalc,
    /// Export listings as tab-separated values
    Export {
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Open a listing in the browser by its index number
    Open {
        /// Index number of the listing to open (1-based, as shown in list)
        index: usize,
    },
    /// Inspect or edit scoring configs
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Parser, Debug)]
#[command(name = "listing-rank")]
#[command(about = "Rank saved real-estate listings by what matters to you", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging and score breakdowns
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to config file (defaults to ~/.config/listing-rank/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::List);

    let config_path = cli.config.map(PathBuf::from);
    let config = match listing_rank::config::load_config(config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };

    listing_rank::logging::init_tracing(cli.verbose, config.log.as_deref());

    let data_dir = match listing_rank::config::data_dir(&config) {
        Ok(dir) => dir,
        Err(e) => {
            eprintln!("Config error: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };
    tracing::debug!(dir = %data_dir.display(), "using data directory");

    let mut ranker = Ranker::new(JsonFileStore::new(data_dir));
    ranker.subscribe(LogObserver);

    if let Err(e) = run(command, &ranker, cli.verbose).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(exit_code(&e));
    }

    std::process::exit(EXIT_SUCCESS);
}

fn exit_code(error: &anyhow::Error) -> i32 {
    match error.downcast_ref::<RankError>() {
        Some(RankError::InvalidConfig { .. }) => EXIT_CONFIG,
        Some(RankError::Store(StoreError::InvalidConfig { .. })) => EXIT_CONFIG,
        Some(RankError::Store(_)) => EXIT_STORAGE,
        _ => EXIT_FAILURE,
    }
}

async fn run(command: Commands, ranker: &Ranker<JsonFileStore>, verbose: bool) -> Result<()> {
    let use_colors = listing_rank::output::should_use_colors();

    match command {
        Commands::List => {
            let listings = ranker.listings().await?;
            if listings.is_empty() {
                println!("No listings saved yet. Import some with `listing-rank add <FILE>`.");
                return Ok(());
            }

            if verbose {
                for listing in &listings {
                    let config = ranker.config(listing.category).await?;
                    let result = calculate_score(listing, &config);
                    println!(
                        "{}",
                        listing_rank::output::format_listing_detail(listing, Some(&result), use_colors)
                    );
                    println!();
                }
            } else {
                println!(
                    "{}",
                    listing_rank::output::format_scored_table(&listings, use_colors)
                );
            }
        }
        Commands::Add { file } => {
            let json = read_input(&file).await?;
            let incoming = parse_listings(&json)
                .with_context(|| format!("Failed to parse listings from {}", file))?;
            let count = incoming.len();
            let listings = ranker.add_listings(incoming).await?;
            println!("Imported {} listing(s); {} saved in total.", count, listings.len());
        }
        Commands::Remove { id } => {
            let removed = ranker.remove_listing(&id).await?;
            println!("Removed {}", removed.display_title());
        }
        Commands::Clear => {
            let count = ranker.clear().await?;
            println!("Removed {} listing(s).", count);
        }
        Commands::Visit { id, kind, note } => {
            let record = VisitRecord {
                at: Utc::now(),
                kind: kind.into(),
                note,
            };
            let listing = ranker.record_visit(&id, record).await?;
            println!(
                "Recorded {} on {} ({} entries).",
                VisitKind::from(kind),
                listing.display_title(),
                listing.history.len()
            );
        }
        Commands::Recalc => {
            let listings = ranker.recalculate_all().await?;
            println!("Recalculated {} listing(s).", listings.len());
        }
        Commands::Export { output } => {
            let listings = ranker.listings().await?;
            let tsv = listing_rank::output::format_tsv(&listings);
            match output {
                Some(path) => {
                    write_atomic(&path, &tsv)?;
                    eprintln!("Exported {} listing(s) to {}", listings.len(), path.display());
                }
                None => println!("{}", tsv),
            }
        }
        Commands::Open { index } => {
            let listings = ranker.listings().await?;
            if index < 1 || index > listings.len() {
                anyhow::bail!(
                    "Invalid index {}. Must be between 1 and {}.",
                    index,
                    listings.len()
                );
            }

            let listing = &listings[index - 1];
            let url = listing
                .url
                .as_deref()
                .with_context(|| format!("Listing {} has no URL", listing.id))?;
            listing_rank::browser::open_url(url)?;
            println!("Opening {} in browser: {}", listing.display_title(), url);
        }
        Commands::Config(sub) => run_config(sub, ranker).await?,
    }

    Ok(())
}

async fn run_config(command: ConfigCommands, ranker: &Ranker<JsonFileStore>) -> Result<()> {
    match command {
        ConfigCommands::Show { category } => {
            let config = ranker.config(category.into()).await?;
            println!("{}", listing_rank::output::format_config(&config));
        }
        ConfigCommands::Reset { category } => {
            let category = Category::from(category);
            let listings = ranker.reset_config(category).await?;
            println!("Reset {} config; re-ranked {} listing(s).", category, listings.len());
        }
        ConfigCommands::SetWeight {
            category,
            key,
            level,
        } => {
            let importance = Importance::try_from(level).map_err(|e| RankError::InvalidConfig {
                category: category.into(),
                errors: vec![format!("weights.{}: {}", key, e)],
            })?;
            let mut config = ranker.config(category.into()).await?;
            config.set_importance(key.clone(), importance);
            let listings = ranker.save_config(config).await?;
            println!(
                "Set {} to {}; re-ranked {} listing(s).",
                key,
                importance,
                listings.len()
            );
        }
        ConfigCommands::SetRange {
            category,
            field,
            min,
            max,
        } => {
            let mut config = ranker.config(category.into()).await?;
            let range = config
                .ranges
                .get_mut(&field)
                .ok_or_else(|| RankError::InvalidConfig {
                    category: category.into(),
                    errors: vec![format!(
                        "ranges.{}: unknown range (expected price, size, rooms or bathrooms)",
                        field
                    )],
                })?;
            range.min = min;
            range.max = max;
            let shown = range.to_string();
            let listings = ranker.save_config(config).await?;
            println!(
                "Set {} range to {}; re-ranked {} listing(s).",
                field,
                shown,
                listings.len()
            );
        }
    }
    Ok(())
}

async fn read_input(file: &str) -> Result<String> {
    if file == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read listings from stdin")?;
        Ok(buffer)
    } else {
        tokio::fs::read_to_string(file)
            .await
            .with_context(|| format!("Failed to read {}", file))
    }
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let mut file = AtomicWriteFile::open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    file.write_all(contents.as_bytes())?;
    file.write_all(b"\n")?;
    file.commit()
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}
