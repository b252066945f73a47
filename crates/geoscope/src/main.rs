use std::path::{Path, PathBuf};
use std::{env, process};

use clap::{Parser, Subcommand, ValueEnum};
use geoscope_core::memory::MemoryReader;
use geoscope_core::session::snapshot::SnapshotSession;
use geoscope_core::user_types::{load_definitions, ReloadOutcome};
use geoscope_core::{Dialect, ExpressionLoader, Options};
use geoscope_utils::{debug, info, init_logging, init_logging_with_level, warn, LogFormat, LogLevel};
use serde_json::json;

/// Draw geometry stored in a debugged program through user-defined type loaders.
#[derive(Parser, Debug)]
#[command(name = "geoscope")]
#[command(version)]
#[command(about = "Draw geometry stored in a debugged program through user-defined type loaders", long_about = None)]
struct Cli
{
    /// Log level (overrides RUST_LOG)
    #[arg(long, global = true)]
    log_level: Option<LogLevel>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands
{
    /// Parse a type definition file and list the loaders it declares
    Types
    {
        /// Path to the XML definition file
        file: PathBuf,
    },
    /// Load variables from a snapshot session and print them as JSON
    Draw
    {
        /// Snapshot session (JSON)
        #[arg(long)]
        snapshot: PathBuf,
        /// Type definition file; defaults to GEOSCOPE_USER_TYPES_CPP or GEOSCOPE_USER_TYPES_CS
        #[arg(long)]
        types: Option<PathBuf>,
        /// Expression dialect of the session
        #[arg(long, value_enum, default_value_t = DialectArg::Cpp)]
        dialect: DialectArg,
        /// Skip the memory path and decode values from their text
        #[arg(long, default_value_t = false)]
        parsed: bool,
        /// Variables to draw
        #[arg(required = true)]
        names: Vec<String>,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum DialectArg
{
    Cpp,
    Cs,
}

impl DialectArg
{
    fn dialect(self) -> Dialect
    {
        match self {
            DialectArg::Cpp => Dialect::Cpp,
            DialectArg::Cs => Dialect::CSharp,
        }
    }

    fn env_var(self) -> &'static str
    {
        match self {
            DialectArg::Cpp => "GEOSCOPE_USER_TYPES_CPP",
            DialectArg::Cs => "GEOSCOPE_USER_TYPES_CS",
        }
    }
}

fn main()
{
    let cli = Cli::parse();

    // Without --log-level, RUST_LOG and GEOSCOPE_LOG_FORMAT apply
    let logging = match cli.log_level {
        Some(level) => init_logging_with_level(level, LogFormat::Pretty),
        None => init_logging(),
    };
    if let Err(e) = logging {
        eprintln!("Failed to initialize logging: {e}");
        process::exit(1);
    }

    if let Err(e) = run_command(cli) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run_command(cli: Cli) -> Result<(), Box<dyn std::error::Error>>
{
    match cli.command {
        Commands::Types { file } => list_types(&file),
        Commands::Draw {
            snapshot,
            types,
            dialect,
            parsed,
            names,
        } => {
            let types = types.or_else(|| env::var_os(dialect.env_var()).map(PathBuf::from));
            draw(&snapshot, types, dialect, parsed, &names)
        }
    }
}

fn list_types(file: &Path) -> Result<(), Box<dyn std::error::Error>>
{
    let definitions = load_definitions(file)?;
    info!(
        file = %file.display(),
        loaders = definitions.loaders.len(),
        skipped = definitions.skipped.len(),
        "parsed definitions"
    );

    for loader in &definitions.loaders {
        match loader.describe() {
            Some(details) => println!("{:<12} {} ({details})", loader.kind().to_string(), loader.id()),
            None => println!("{:<12} {}", loader.kind().to_string(), loader.id()),
        }
    }
    for skipped in &definitions.skipped {
        println!(
            "skipped      {} {} (line {}): {}",
            skipped.element,
            skipped.id.as_deref().unwrap_or("<no id>"),
            skipped.line,
            skipped.reason
        );
    }
    Ok(())
}

fn draw(
    snapshot: &Path,
    types: Option<PathBuf>,
    dialect: DialectArg,
    parsed: bool,
    names: &[String],
) -> Result<(), Box<dyn std::error::Error>>
{
    let session = SnapshotSession::from_path(snapshot)?;
    let loader = ExpressionLoader::new();

    let mut options = Options::new();
    match dialect {
        DialectArg::Cpp => options.set_user_types_path_cpp(types),
        DialectArg::Cs => options.set_user_types_path_cs(types),
    }
    let report = loader.reload_user_types(&mut options);
    let outcome = match dialect {
        DialectArg::Cpp => report.cpp,
        DialectArg::Cs => report.cs,
    }?;
    if let ReloadOutcome::Reloaded { added, skipped, .. } = &outcome {
        debug!(added, skipped = skipped.len(), "user types loaded");
        if !skipped.is_empty() {
            warn!(count = skipped.len(), "some type declarations were skipped");
        }
    }

    let reader = MemoryReader::new(&session);
    let reader = (!parsed).then_some(&reader);
    let dialect = dialect.dialect();

    let mut drawn = Vec::with_capacity(names.len());
    for name in names {
        let value = match loader.load(dialect, reader, &session, name)? {
            Some((traits, drawable)) => json!({
                "name": name,
                "traits": traits,
                "bounds": drawable.bounds(),
                "geometry": drawable,
            }),
            None => {
                info!(name = %name, "nothing to draw");
                json!({ "name": name, "geometry": null })
            }
        };
        drawn.push(value);
    }

    println!("{}", serde_json::to_string_pretty(&drawn)?);
    Ok(())
}
