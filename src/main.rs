//! CLI for bibfuse - Normalize and fuse BibTeX files.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use bibfuse::{
    builtin_rules, load_rules, parse_entries, registry, render_bibtex, render_json,
    to_external_entry, OutputOptions, Record, RecordBuilder, RuleConfig,
};

// ---------------------------------------------------------------------------
// CLI definition
// ---------------------------------------------------------------------------

/// Normalize and fuse BibTeX files
#[derive(Parser)]
#[command(name = "bibfuse")]
#[command(version)]
#[command(after_help = "\
Examples:
  bibfuse fuse refs.bib
  bibfuse fuse a.bib b.bib --config bibfuse.toml -o out.bib
  bibfuse fuse refs.bib --smart --no-optional
  bibfuse rules")]
struct Cli {
    /// Print verbose messages
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalize the entries of one or more .bib files into one bibliography
    #[command(after_help = "\
Entries are merged by citation key; the first occurrence wins.
Empty mandatory fields become \"(TODO)\", empty optional fields \"(OPTIONAL)\".")]
    Fuse {
        /// Input .bib files (use '-' for stdin)
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Rule configuration (.toml or .json); builtin rules if omitted
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Bib)]
        format: Format,

        /// Drop redundant fields using the one-of groups
        #[arg(long)]
        smart: bool,

        /// Suppress "(TODO)" fields
        #[arg(long)]
        no_todo: bool,

        /// Suppress "(OPTIONAL)" fields
        #[arg(long)]
        no_optional: bool,

        /// Keep empty fields
        #[arg(long)]
        show_empty: bool,

        /// Abort on the first invalid entry instead of skipping it
        #[arg(long)]
        strict: bool,
    },

    /// Print the rules of a configuration (builtin rules if omitted)
    Rules {
        /// Rule configuration (.toml or .json)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Bib,
    Json,
}

// ---------------------------------------------------------------------------
// AppError — semantic exit codes
// ---------------------------------------------------------------------------

enum AppError {
    /// Exit 10 — input file not found / unreadable
    InputFile(String),
    /// Exit 11 — rule configuration not found / invalid
    Config(String),
    /// Exit 12 — malformed .bib input
    BibSyntax(String),
    /// Exit 13 — entry rejected in strict mode
    InvalidRecord(String),
    /// Exit 15 — cannot write output file
    OutputFile(String),
}

impl AppError {
    fn exit_code(&self) -> i32 {
        match self {
            AppError::InputFile(_) => 10,
            AppError::Config(_) => 11,
            AppError::BibSyntax(_) => 12,
            AppError::InvalidRecord(_) => 13,
            AppError::OutputFile(_) => 15,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::InputFile(msg) => {
                write!(f, "{}\n  hint: verify the file path is correct", msg)
            }
            AppError::Config(msg) => {
                write!(
                    f,
                    "{}\n  hint: the config maps each citation type to lists such as todos = [...], optionals = [...], oneof_<name> = [...]",
                    msg
                )
            }
            AppError::BibSyntax(msg) => write!(f, "{}", msg),
            AppError::InvalidRecord(msg) => {
                write!(
                    f,
                    "{}\n  hint: authors are written \"Last, First and Last, First\" with initials ending in a period",
                    msg
                )
            }
            AppError::OutputFile(msg) => {
                write!(
                    f,
                    "{}\n  hint: check that the output directory exists and is writable",
                    msg
                )
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(e.exit_code());
    }
}

fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // Validate the record schema before touching any input
    registry();

    match cli.command {
        Commands::Fuse {
            files,
            config,
            output,
            format,
            smart,
            no_todo,
            no_optional,
            show_empty,
            strict,
        } => {
            let options = OutputOptions {
                no_todo,
                no_optional,
                show_empty,
            };
            fuse_command(
                &files,
                config.as_deref(),
                output.as_deref(),
                format,
                smart,
                strict,
                &options,
            )?;
        }
        Commands::Rules { config } => {
            rules_command(config.as_deref())?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// Normalize and merge the entries of the given files.
fn fuse_command(
    files: &[PathBuf],
    config: Option<&Path>,
    output: Option<&Path>,
    format: Format,
    smart: bool,
    strict: bool,
    options: &OutputOptions,
) -> Result<(), AppError> {
    // 1. Load rules (file or builtin)
    let config = load_config(config)?;
    let builder = RecordBuilder::new(&config.rules, &config.one_ofs).smart(smart);

    // 2. Build records, first occurrence of a citation key wins
    let mut records: BTreeMap<String, Record> = BTreeMap::new();
    let mut skipped = 0usize;
    for path in files {
        info!("Parsing {}", path.display());
        let content = read_input(path)?;
        let entries = parse_entries(&content)
            .map_err(|e| AppError::BibSyntax(format!("'{}': {}", path.display(), e)))?;

        for entry in entries {
            if records.contains_key(&entry.cite_name) {
                debug!("[{}] already present, skipping", entry.cite_name);
                continue;
            }
            match builder.build(&entry) {
                Ok(record) => {
                    debug!("Added {}", entry.cite_name);
                    records.insert(entry.cite_name, record);
                }
                Err(e) if strict => return Err(AppError::InvalidRecord(e.to_string())),
                Err(e) => {
                    warn!("skipping entry: {}", e);
                    skipped += 1;
                }
            }
        }
    }
    info!("{} entries, {} skipped", records.len(), skipped);

    // 3. Render
    let entries: Vec<_> = records
        .values()
        .map(|record| to_external_entry(record).filtered(options))
        .collect();
    let result = match format {
        Format::Bib => render_bibtex(&entries),
        Format::Json => {
            let mut json = render_json(&entries)
                .map_err(|e| AppError::OutputFile(format!("JSON encoding failed: {}", e)))?;
            json.push('\n');
            json
        }
    };

    // 4. Write to file or stdout
    if let Some(output_path) = output {
        fs::write(output_path, &result).map_err(|e| {
            AppError::OutputFile(format!("'{}': {}", output_path.display(), e))
        })?;
        info!("wrote {} entries to {}", entries.len(), output_path.display());
    } else {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        write!(handle, "{}", result)
            .map_err(|e| AppError::OutputFile(format!("stdout: {}", e)))?;
    }

    Ok(())
}

/// Print the citation types and rules of a configuration.
fn rules_command(config: Option<&Path>) -> Result<(), AppError> {
    let config = load_config(config)?;
    for citation_type in config.rules.citation_types() {
        println!("{}: {}", citation_type, config.rules.resolve(citation_type));
    }
    for citation_type in config.one_ofs.citation_types() {
        for group in config.one_ofs.groups_for(citation_type).unwrap_or_default() {
            println!("{}: oneof [{}]", citation_type, group.join(", "));
        }
    }
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<RuleConfig, AppError> {
    match path {
        Some(path) => {
            load_rules(path).map_err(|e| AppError::Config(format!("'{}': {}", path.display(), e)))
        }
        None => Ok(builtin_rules()),
    }
}

/// Read a file, or stdin for '-'.
fn read_input(path: &Path) -> Result<String, AppError> {
    if path == Path::new("-") {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .map_err(|e| AppError::InputFile(format!("failed to read from stdin: {}", e)))?;
        Ok(buf)
    } else {
        fs::read_to_string(path)
            .map_err(|e| AppError::InputFile(format!("'{}': {}", path.display(), e)))
    }
}
