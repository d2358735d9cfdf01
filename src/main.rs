use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use modes_locations::batch::{self, Targets, UpdateOptions};
use modes_locations::config::Config;
use modes_locations::io::directives::{self, PendingUpdates};
use modes_locations::io::report;
use modes_locations::model::PartialDate;
use modes_locations::update::UpdateMode;
use modes_locations::{Result, ToolError};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    if let Err(error) = run(cli) {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    init_logging(cli.global.verbose)?;
    let mut config = load_config(&cli.global)?;
    match cli.command {
        Command::Validate(args) => execute_validate(args, &mut config),
        Command::Select(args) => execute_select(args, &config),
        Command::Diff(args) => execute_diff(args, &config),
        Command::Update(args) => execute_update(args, &mut config),
    }
}

fn init_logging(verbosity: u8) -> Result<()> {
    let default_level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| ToolError::Logging(error.to_string()))
}

fn load_config(global: &GlobalArgs) -> Result<Config> {
    let mut config = match &global.config {
        Some(path) if !path.exists() => return Err(ToolError::MissingInput(path.clone())),
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(code) = &global.mda_code {
        config.mda_code = code.trim().to_uppercase();
    }
    if global.lenient_ids {
        config.strict_ids = false;
    }
    Ok(config)
}

fn execute_validate(args: ValidateArgs, config: &mut Config) -> Result<()> {
    if args.lenient {
        config.strict_dates = false;
    }
    let report = batch::validate_file(&args.input, config)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for failure in &report.failures {
            println!("{}", failure.message);
        }
        println!(
            "{} object(s) checked, {} failed",
            report.checked,
            report.failures.len()
        );
    }

    report.ensure_clean()
}

fn execute_select(args: SelectArgs, config: &Config) -> Result<()> {
    let codec = config.codec();
    let selection = match &args.directives {
        Some(path) => load_directives(path, config)?.into_keys().collect(),
        None => batch::selection_from_ids(&args.ids, &codec, config.strict_ids)?,
    };
    let kept = batch::select_file(&args.input, &args.output, &selection, config)?;
    println!("{kept} object(s) selected");
    Ok(())
}

fn execute_diff(args: DiffArgs, config: &Config) -> Result<()> {
    let pending = load_directives(&args.directives, config)?;
    let targets = args.targets.resolve();
    let rows = batch::diff_file(&args.input, &pending, targets, config)?;

    match &args.report {
        Some(path) => report::write_report(path, &batch::diff_table(&rows))?,
        None => {
            for row in &rows {
                println!(
                    "{}\t{}\t{}\t{}",
                    row.object, row.kind, row.recorded, row.requested
                );
            }
        }
    }
    Ok(())
}

fn execute_update(args: UpdateArgs, config: &mut Config) -> Result<()> {
    if args.lenient {
        config.strict_dates = false;
    }
    let mode = if args.patch {
        UpdateMode::Patch
    } else if args.move_to_normal {
        UpdateMode::MoveToNormal
    } else {
        UpdateMode::Insert
    };

    let mut pending = match (&args.directives, &args.location) {
        (Some(path), _) => load_directives(path, config)?,
        (None, Some(location)) => {
            directives::directives_for_ids(&args.ids, location, &config.codec(), config.strict_ids)?
        }
        (None, None) if mode == UpdateMode::MoveToNormal => {
            directives::directives_for_ids(&args.ids, "", &config.codec(), config.strict_ids)?
        }
        (None, None) => {
            return Err(ToolError::InvalidDirectives(
                "--location is required with --ids".into(),
            ));
        }
    };

    let as_of = match args.date {
        Some(date) => date,
        None => PartialDate::today()?,
    };
    let mut options = UpdateOptions::new(as_of);
    options.targets = args.targets.resolve();
    options.targets.previous = args.previous;
    options.mode = mode;
    options.force = args.force;
    options.reset_current = args.reset_current;
    options.reason = args.reason;
    options.single = args.single;

    let summary = batch::update_file(&args.input, &args.output, &mut pending, &options, config)?;
    println!(
        "{} object(s) read, {} updated, {} unchanged, {} directive(s) unmatched, {} skipped",
        summary.objects,
        summary.updated.len(),
        summary.unchanged.len(),
        summary.unmatched.len(),
        summary.skipped.len()
    );
    Ok(())
}

fn load_directives(path: &Path, config: &Config) -> Result<PendingUpdates> {
    if !path.exists() {
        return Err(ToolError::MissingInput(path.to_path_buf()));
    }
    directives::read_directives(path, &config.codec(), config.strict_ids)
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Validate and update object locations in a Modes XML export."
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct GlobalArgs {
    /// Increase log output. Repeat for more detail.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// JSON configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Institution prefix of coded accession numbers.
    #[arg(long, global = true)]
    mda_code: Option<String>,

    /// Pass malformed accession numbers through instead of failing.
    #[arg(long, global = true)]
    lenient_ids: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Check every object's location history.
    Validate(ValidateArgs),
    /// Copy only the listed objects into a new export.
    Select(SelectArgs),
    /// Report objects whose location differs from a directive file.
    Diff(DiffArgs),
    /// Apply location directives to an export.
    Update(UpdateArgs),
}

#[derive(Args)]
struct TargetArgs {
    /// Work on the normal location.
    #[arg(long)]
    normal: bool,

    /// Work on the current location. The default when no kind is chosen.
    #[arg(long)]
    current: bool,
}

impl TargetArgs {
    fn resolve(&self) -> Targets {
        Targets {
            normal: self.normal,
            current: self.current || !self.normal,
            previous: false,
        }
    }
}

#[derive(Args)]
struct ValidateArgs {
    /// Modes XML export.
    #[arg(long)]
    input: PathBuf,

    /// Tolerate gaps between consecutive locations.
    #[arg(long)]
    lenient: bool,

    /// Print the report as JSON.
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct SelectArgs {
    /// Modes XML export.
    #[arg(long)]
    input: PathBuf,

    /// Output file path.
    #[arg(long)]
    output: PathBuf,

    /// Accession numbers or ranges such as JB021-024.
    #[arg(long, num_args = 1.., required_unless_present = "directives")]
    ids: Vec<String>,

    /// Take the selection from a directive file instead.
    #[arg(long, conflicts_with = "ids")]
    directives: Option<PathBuf>,
}

#[derive(Args)]
struct DiffArgs {
    /// Modes XML export.
    #[arg(long)]
    input: PathBuf,

    /// CSV or XLSX file of requested locations.
    #[arg(long)]
    directives: PathBuf,

    #[command(flatten)]
    targets: TargetArgs,

    /// Write the differences to an XLSX report instead of stdout.
    #[arg(long)]
    report: Option<PathBuf>,
}

#[derive(Args)]
struct UpdateArgs {
    /// Modes XML export.
    #[arg(long)]
    input: PathBuf,

    /// Output file path.
    #[arg(long)]
    output: PathBuf,

    /// CSV or XLSX file of requested locations.
    #[arg(long, required_unless_present = "ids")]
    directives: Option<PathBuf>,

    /// Accession numbers or ranges to move.
    #[arg(long, num_args = 1.., conflicts_with = "directives")]
    ids: Vec<String>,

    /// Target location for every object given with --ids.
    #[arg(long, requires = "ids")]
    location: Option<String>,

    #[command(flatten)]
    targets: TargetArgs,

    /// Try to add a previous location. Not supported.
    #[arg(long)]
    previous: bool,

    /// Move objects back to their normal location.
    #[arg(long, conflicts_with = "patch")]
    move_to_normal: bool,

    /// Overwrite the current location instead of recording a move.
    #[arg(long)]
    patch: bool,

    /// Rewrite objects even when their location is unchanged.
    #[arg(long)]
    force: bool,

    /// Keep only the location being replaced as history.
    #[arg(long = "reset_current", alias = "reset-current")]
    reset_current: bool,

    /// Date of the move as d.m.yyyy. Defaults to today.
    #[arg(long)]
    date: Option<PartialDate>,

    /// Reason recorded with the move.
    #[arg(long)]
    reason: Option<String>,

    /// Tolerate gaps between consecutive locations.
    #[arg(long)]
    lenient: bool,

    /// Stop after the first object with a directive.
    #[arg(long)]
    single: bool,
}
