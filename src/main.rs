use clap::{ArgAction, Parser, Subcommand};
use imgstorage::imaging::Source;
use imgstorage::store::{ImageStore, StoreError};
use imgstorage::{config, output};
use std::collections::BTreeMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "imgstorage")]
#[command(about = "Store images under named profiles, each with its own filter chain")]
#[command(long_about = "\
Store images under named profiles, each with its own filter chain

Every pushed image is rotated according to its EXIF orientation, then each
profile's filters run on a copy and the result is written to
<root>/<profile>/<name>. The output format follows the name's extension.

Example config (imgstorage.toml):

  root = \"store\"

  [[profiles]]
  name = \"full\"
  filters = [{ type = \"shrink\", max_width = 2000, max_height = 2000 }]

  [[profiles]]
  name = \"thumbnail\"
  filters = [
    { type = \"crop\", ratio = 1.0 },
    { type = \"shrink\", max_width = 256, max_height = 256 },
  ]

Run 'imgstorage gen-config' for a documented config file.")]
#[command(version)]
struct Cli {
    /// Config file (stock defaults are used if it does not exist)
    #[arg(long, default_value = "imgstorage.toml", global = true)]
    config: PathBuf,

    /// Override the storage root from the config
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Log more (-v info, -vv debug); RUST_LOG takes precedence
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Push images into every profile
    Push {
        /// Source image files; `-` reads one image from stdin
        #[arg(required = true)]
        sources: Vec<PathBuf>,
        /// Name to store under (defaults to the source file name)
        #[arg(long)]
        name: Option<String>,
        /// Print written paths as JSON
        #[arg(long)]
        json: bool,
    },
    /// List stored files per profile
    List {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show profiles and their filter chains
    Profiles,
    /// Print a stock config file with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Command::GenConfig = cli.command {
        print!("{}", config::stock_config_toml());
        return Ok(());
    }

    let mut config = config::load_config(&cli.config)?;
    if let Some(root) = cli.root {
        config.root = root;
    }
    let store = config.build_store()?;

    match cli.command {
        Command::Push {
            sources,
            name,
            json,
        } => {
            if name.is_some() && sources.len() > 1 {
                return Err("--name can only be used with a single source".into());
            }
            init_thread_pool(&config.processing);
            store.prepare()?;

            let mut all_written = BTreeMap::new();
            let mut failed = 0;
            for source in &sources {
                let filename = match (&name, stored_name(source)) {
                    (Some(name), _) => name.clone(),
                    (None, Some(name)) => name,
                    (None, None) => {
                        return Err(format!(
                            "cannot derive a name from {}, pass --name",
                            source.display()
                        )
                        .into());
                    }
                };
                let (written, failures) = push_one(&store, source, &filename)?;
                failed += failures.len();
                if !json {
                    output::print_push(&filename, &written, &failures);
                }
                all_written.insert(filename, written);
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&all_written)?);
            }
            if failed > 0 {
                return Err(format!("{failed} profile write(s) failed").into());
            }
        }
        Command::List { json } => {
            let listing = store.list_files()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&listing)?);
            } else {
                output::print_listing(&listing);
            }
        }
        Command::Profiles => {
            output::print_profiles(store.root(), store.profiles());
        }
        Command::GenConfig => unreachable!("handled before loading config"),
    }

    Ok(())
}

/// Push one source, splitting a partial failure into what was written and what failed.
fn push_one(
    store: &ImageStore,
    source: &Path,
    filename: &str,
) -> Result<(BTreeMap<String, PathBuf>, Vec<imgstorage::store::ProfileFailure>), StoreError> {
    let result = if source == Path::new("-") {
        let mut bytes = Vec::new();
        std::io::stdin().read_to_end(&mut bytes)?;
        store.push(Source::Bytes(&bytes), filename)
    } else {
        store.push(Source::Path(source), filename)
    };

    match result {
        Ok(written) => Ok((written, Vec::new())),
        Err(StoreError::PartialPush { written, failures }) => Ok((written, failures)),
        Err(e) => Err(e),
    }
}

/// Name a source is stored under when `--name` is not given.
fn stored_name(source: &Path) -> Option<String> {
    if source == Path::new("-") {
        return None;
    }
    source
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
}

/// Install the stderr log subscriber. `RUST_LOG` wins over `-v`.
fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; the config can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
