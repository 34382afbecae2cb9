use clap::{Parser, Subcommand};
use modelpack::archive::ZipArchiveWriter;
use modelpack::batch::{BatchSession, BatchStep};
use modelpack::build::{BuildEnv, BuildSession, BuildStep, ConflictChoice, DirectoryChoice};
use modelpack::bundle::ZipBundleCompiler;
use modelpack::cache::ThumbnailCache;
use modelpack::convert;
use modelpack::naming;
use modelpack::output;
use modelpack::prefs::{JsonFilePrefs, MemoryPrefs, PrefStore};
use modelpack::render::FlatTintRenderer;
use modelpack::types::{AssetCollection, filter_assets};
use std::path::{Path, PathBuf};

/// Crate version on release tags, `dev@<commit>` otherwise.
fn version_string() -> &'static str {
    if env!("ON_RELEASE_TAG") == "true" {
        return env!("CARGO_PKG_VERSION");
    }
    match env!("GIT_HASH") {
        "" => "dev@unknown",
        // One small leak at startup, on the single call clap makes.
        hash => Box::leak(format!("dev@{hash}").into_boxed_str()),
    }
}

#[derive(Parser)]
#[command(name = "modelpack")]
#[command(about = "Compile 3D asset collections into headset packages")]
#[command(long_about = "\
Compile 3D asset collections into headset packages

Collections are TOML definition files listing model sources; a build turns
one into a single .modelpack archive the headset runtime consumes.

Collection definition:

  Props.collection.toml
  ├── name = \"Props\"               # package file becomes Props.modelpack
  ├── author = \"Acme\"              # identifier becomes acme-props
  ├── created = \"2026-…\"           # optional, ISO-8601, defaults to now
  └── assets = [                     # ordered; duplicates and dead refs
      \"Models/Chairs/Chair.fbx\",   #   are filtered at build time
      \"Models/Tables/Chair.fbx\",
  ]

Asset paths resolve against the definition file's directory unless
--asset-root says otherwise. Models sharing a filename get disambiguated
logical names from their paths (Chairs_Chair, Tables_Chair).

The last-used output directory is remembered, so --output is only needed
the first time (or to switch destinations).")]
#[command(version = version_string())]
struct Cli {
    /// Preferences file (defaults to the user config directory)
    #[arg(long, global = true)]
    prefs_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

/// Shared flags for commands that write packages.
#[derive(clap::Args, Clone)]
struct BuildArgs {
    /// Output directory (defaults to the last one used)
    #[arg(long)]
    output: Option<PathBuf>,

    /// Replace existing packages instead of stopping
    #[arg(long)]
    overwrite: bool,

    /// Directory asset paths resolve against (defaults to the collection
    /// file's directory)
    #[arg(long)]
    asset_root: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Build one collection into a package
    Build {
        /// Collection definition file
        collection: PathBuf,
        #[command(flatten)]
        args: BuildArgs,
    },
    /// Build several collections into one destination, stopping on the
    /// first failure
    Batch {
        /// Collection definition files
        collections: Vec<PathBuf>,
        #[command(flatten)]
        args: BuildArgs,
    },
    /// Validate a collection and preview its logical names
    Check {
        /// Collection definition file
        collection: PathBuf,
        /// Directory asset paths resolve against
        #[arg(long)]
        asset_root: Option<PathBuf>,
    },
    /// Create a collection definition from a directory of model files
    FromDir {
        /// Directory to collect model files from
        dir: PathBuf,
        /// Author recorded in the definition
        #[arg(long, default_value = "unknown")]
        author: String,
    },
    /// Forget stored preferences (last-used output directory)
    ClearPrefs,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match &cli.command {
        Command::Build { collection, args } => {
            let loaded = AssetCollection::load(collection)?;
            let asset_root = resolve_asset_root(args.asset_root.as_deref(), collection);
            let mut prefs = open_prefs(cli.prefs_file.as_deref());
            run_build(&loaded, &asset_root, args, prefs.as_mut())?;
        }
        Command::Batch { collections, args } => {
            if collections.is_empty() {
                return Err("no collection files given".into());
            }
            let loaded: Vec<AssetCollection> = collections
                .iter()
                .map(|path| AssetCollection::load(path))
                .collect::<Result<_, _>>()?;
            let asset_root = resolve_asset_root(args.asset_root.as_deref(), &collections[0]);
            let mut prefs = open_prefs(cli.prefs_file.as_deref());
            run_batch(&loaded, &asset_root, args, prefs.as_mut())?;
        }
        Command::Check {
            collection,
            asset_root,
        } => {
            let loaded = AssetCollection::load(collection)?;
            let root = resolve_asset_root(asset_root.as_deref(), collection);
            let assets = filter_assets(&loaded.assets, &root);
            if assets.is_empty() {
                return Err(format!(
                    "collection '{}' contains no valid assets",
                    loaded.name
                )
                .into());
            }
            let paths: Vec<String> = assets.iter().map(|a| a.source.clone()).collect();
            let names = naming::resolve(&paths)?;
            output::print_check_output(&loaded, &assets, &names);
        }
        Command::FromDir { dir, author } => {
            let written = convert::convert_folder(dir, author)?;
            println!("Created {}", written.display());
        }
        Command::ClearPrefs => {
            if let Some(path) = prefs_path(cli.prefs_file.as_deref()) {
                let mut prefs = JsonFilePrefs::load(&path);
                prefs.clear()?;
                println!("Preferences cleared");
            } else {
                println!("No preferences stored");
            }
        }
    }

    Ok(())
}

fn run_build(
    collection: &AssetCollection,
    asset_root: &Path,
    args: &BuildArgs,
    prefs: &mut dyn PrefStore,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut cache = ThumbnailCache::new(Box::new(FlatTintRenderer::new()));
    let compiler = ZipBundleCompiler::new();
    let writer = ZipArchiveWriter::new();
    let mut env = BuildEnv {
        cache: &mut cache,
        compiler: &compiler,
        archive: &writer,
        prefs,
        asset_root,
    };

    let mut session = BuildSession::new(collection, &env)?;
    let mut step = session.first_step(&env);
    loop {
        step = match step {
            BuildStep::NeedOutputDirectory { last_used } => {
                let dir = pick_output_dir(args.output.as_deref(), last_used)?;
                session.provide_directory(&mut env, DirectoryChoice::Select(dir))?
            }
            BuildStep::NeedConflictResolution { target } => {
                if args.overwrite {
                    session.resolve_conflict(&mut env, ConflictChoice::Overwrite)?
                } else {
                    eprintln!(
                        "{} already exists; pass --overwrite to replace it",
                        target.display()
                    );
                    session.resolve_conflict(&mut env, ConflictChoice::Cancel)?
                }
            }
            BuildStep::Cancelled => {
                println!("Build cancelled");
                return Ok(());
            }
            BuildStep::Finished(report) => {
                output::print_build_report(&report);
                println!("Previews: {}", env.cache.stats());
                return Ok(());
            }
        };
    }
}

fn run_batch(
    collections: &[AssetCollection],
    asset_root: &Path,
    args: &BuildArgs,
    prefs: &mut dyn PrefStore,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut cache = ThumbnailCache::new(Box::new(FlatTintRenderer::new()));
    let compiler = ZipBundleCompiler::new();
    let writer = ZipArchiveWriter::new();
    let mut env = BuildEnv {
        cache: &mut cache,
        compiler: &compiler,
        archive: &writer,
        prefs,
        asset_root,
    };

    let mut session = BatchSession::new(collections, &env)?;
    let mut step = session.first_step(&env);
    loop {
        step = match step {
            BatchStep::NeedOutputDirectory { last_used } => {
                let dir = pick_output_dir(args.output.as_deref(), last_used)?;
                session.provide_directory(&mut env, DirectoryChoice::Select(dir))?
            }
            BatchStep::NeedConflictResolution { conflicts } => {
                if args.overwrite {
                    session.resolve_conflict(&mut env, ConflictChoice::Overwrite)?
                } else {
                    eprintln!("These packages already exist; pass --overwrite to replace them:");
                    for target in &conflicts {
                        eprintln!("  {}", target.display());
                    }
                    session.resolve_conflict(&mut env, ConflictChoice::Cancel)?
                }
            }
            BatchStep::Cancelled => {
                println!("Batch cancelled");
                return Ok(());
            }
            BatchStep::Finished(report) => {
                output::print_batch_report(&report);
                if report.all_succeeded() {
                    return Ok(());
                }
                return Err("batch stopped on first failure".into());
            }
        };
    }
}

/// Output directory: the flag wins, then the remembered directory.
fn pick_output_dir(
    flag: Option<&Path>,
    last_used: Option<PathBuf>,
) -> Result<PathBuf, Box<dyn std::error::Error>> {
    flag.map(Path::to_path_buf)
        .or(last_used)
        .ok_or_else(|| "no output directory: pass --output (it is remembered for next time)".into())
}

/// Asset root: the flag wins, then the collection file's directory.
fn resolve_asset_root(flag: Option<&Path>, collection_file: &Path) -> PathBuf {
    flag.map(Path::to_path_buf).unwrap_or_else(|| {
        collection_file
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."))
            .to_path_buf()
    })
}

fn prefs_path(flag: Option<&Path>) -> Option<PathBuf> {
    flag.map(Path::to_path_buf).or_else(JsonFilePrefs::default_path)
}

/// File-backed prefs when a location exists, in-memory otherwise.
fn open_prefs(flag: Option<&Path>) -> Box<dyn PrefStore> {
    match prefs_path(flag) {
        Some(path) => Box::new(JsonFilePrefs::load(&path)),
        None => Box::new(MemoryPrefs::new()),
    }
}
