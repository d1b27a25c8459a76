//! Fieldmerge CLI - update one column of a delimited file from another
//!
//! # Commands
//!
//! ```bash
//! fieldmerge merge -s catalog.csv -i updates.csv --source-field 4
//! fieldmerge parse catalog.csv --delimiter ';'   # rows as JSON
//! fieldmerge config                              # effective configuration
//! ```
//!
//! Settings come from defaults, then `fieldmerge.json`, then `FIELDMERGE_*`
//! environment variables (a `.env` file is honoured), then flags.

use clap::{Args, Parser, Subcommand, ValueEnum};
use fieldmerge::{
    parse, resolve_read_encoding, run_config, ConfigOverrides, ConsoleSink, Delimiter, JsonSink,
    LogLevel, LogSink, MergeConfig, Row,
};
use std::io::{BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "fieldmerge")]
#[command(about = "Update one column of a delimited file from a keyed input file", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge the input file into the source file and write the result
    Merge {
        #[command(flatten)]
        settings: SettingsArgs,

        #[command(flatten)]
        logging: LogArgs,
    },

    /// Parse one delimited file and print its rows as JSON
    Parse {
        /// File to parse
        input: PathBuf,

        /// Field delimiter
        #[arg(short, long, default_value = ",")]
        delimiter: String,

        /// Encoding label, or "auto"
        #[arg(short, long, default_value = "utf-8")]
        encoding: String,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        logging: LogArgs,
    },

    /// Print the effective configuration as JSON
    Config {
        #[command(flatten)]
        settings: SettingsArgs,
    },
}

#[derive(Args)]
struct SettingsArgs {
    /// Config file (default: fieldmerge.json in the working or executable directory)
    #[arg(short, long, env = "FIELDMERGE_CONFIG")]
    config: Option<PathBuf>,

    /// Source file whose rows get updated
    #[arg(short, long, env = "FIELDMERGE_SOURCE")]
    source: Option<PathBuf>,

    /// Input file supplying new values
    #[arg(short, long, env = "FIELDMERGE_INPUT")]
    input: Option<PathBuf>,

    /// Output file (default: <source>.merged.<ext>)
    #[arg(short, long, env = "FIELDMERGE_OUTPUT")]
    output: Option<PathBuf>,

    #[arg(long, env = "FIELDMERGE_SOURCE_DELIMITER")]
    source_delimiter: Option<String>,

    #[arg(long, env = "FIELDMERGE_INPUT_DELIMITER")]
    input_delimiter: Option<String>,

    #[arg(long, env = "FIELDMERGE_OUTPUT_DELIMITER")]
    output_delimiter: Option<String>,

    /// Encoding label or "auto"
    #[arg(long, env = "FIELDMERGE_SOURCE_ENCODING")]
    source_encoding: Option<String>,

    /// Encoding label or "auto"
    #[arg(long, env = "FIELDMERGE_INPUT_ENCODING")]
    input_encoding: Option<String>,

    #[arg(long, env = "FIELDMERGE_OUTPUT_ENCODING")]
    output_encoding: Option<String>,

    /// 0-based key column in the source file
    #[arg(long, env = "FIELDMERGE_SOURCE_MATCH_BY")]
    source_match_by: Option<usize>,

    /// 0-based column of the source file to overwrite
    #[arg(long, env = "FIELDMERGE_SOURCE_FIELD")]
    source_field: Option<usize>,

    /// 0-based key column in the input file
    #[arg(long, env = "FIELDMERGE_INPUT_MATCH_BY")]
    input_match_by: Option<usize>,

    /// 0-based column of the input file holding the new value
    #[arg(long, env = "FIELDMERGE_INPUT_FIELD")]
    input_field: Option<usize>,
}

impl SettingsArgs {
    /// Config file (or defaults) with every given flag applied.
    fn load(self) -> Result<MergeConfig, Box<dyn std::error::Error>> {
        let (mut config, loaded_from) = MergeConfig::load(self.config.as_deref())?;
        if let Some(path) = loaded_from {
            eprintln!("🔧 Config: {}", path.display());
        }
        config.apply(ConfigOverrides {
            source_path: self.source,
            input_path: self.input,
            output_path: self.output,
            source_delimiter: self.source_delimiter,
            input_delimiter: self.input_delimiter,
            output_delimiter: self.output_delimiter,
            source_encoding: self.source_encoding,
            input_encoding: self.input_encoding,
            output_encoding: self.output_encoding,
            source_match_by: self.source_match_by,
            source_field: self.source_field,
            input_match_by: self.input_match_by,
            input_field: self.input_field,
        });
        Ok(config)
    }
}

#[derive(Args)]
struct LogArgs {
    /// Also show per-row diagnostics
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Only show warnings and errors
    #[arg(short, long)]
    quiet: bool,

    /// Diagnostic output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

impl LogArgs {
    fn sink(&self) -> Box<dyn LogSink> {
        let level = if self.verbose {
            LogLevel::Debug
        } else if self.quiet {
            LogLevel::Warning
        } else {
            LogLevel::Info
        };
        match self.log_format {
            LogFormat::Text => Box::new(ConsoleSink::new(level)),
            LogFormat::Json => Box::new(JsonSink::new(level)),
        }
    }
}

fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Merge { settings, logging } => cmd_merge(settings, &logging),

        Commands::Parse {
            input,
            delimiter,
            encoding,
            output,
            logging,
        } => cmd_parse(&input, &delimiter, &encoding, output.as_deref(), &logging),

        Commands::Config { settings } => cmd_config(settings),
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn cmd_merge(settings: SettingsArgs, logging: &LogArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = settings.load()?;

    if config.source_path.is_none() {
        config.source_path = prompt_path("Source file")?;
    }
    if config.input_path.is_none() {
        config.input_path = prompt_path("Input file")?;
    }

    let sink = logging.sink();
    let summary = run_config(&config, sink.as_ref())?;

    eprintln!("\n📊 Results:");
    eprintln!("   Source rows: {}", summary.source_rows);
    eprintln!("   Input rows:  {} ({} keys)", summary.input_rows, summary.input_keys);
    eprintln!("   Updated:     {}", summary.matched);
    eprintln!("   Unchanged:   {}", summary.unmatched);
    eprintln!("\n✨ Done! Output written to: {}", summary.output.display());
    Ok(())
}

fn cmd_parse(
    input: &Path,
    delimiter: &str,
    encoding: &str,
    output: Option<&Path>,
    logging: &LogArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Parsing: {}", input.display());

    let delimiter = Delimiter::new(delimiter)?;
    let encoding = resolve_read_encoding(encoding, input)?;
    eprintln!("   Encoding: {}", encoding.name());
    eprintln!("   Delimiter: '{}'", delimiter);

    let sink = logging.sink();
    let rows = parse(input, &delimiter, encoding, sink.as_ref())?.collect::<Result<Vec<Row>, _>>()?;
    eprintln!("✅ Parsed {} rows (header included)", rows.len());

    let json = serde_json::to_string_pretty(&rows)?;
    write_output(&json, output)
}

fn cmd_config(settings: SettingsArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = settings.load()?;
    println!("{}", config.to_json()?);
    Ok(())
}

/// Ask for a path on stdin. Returns `None` when stdin is not a terminal.
fn prompt_path(label: &str) -> Result<Option<PathBuf>, Box<dyn std::error::Error>> {
    let stdin = std::io::stdin();
    if !stdin.is_terminal() {
        return Ok(None);
    }

    loop {
        eprint!("{}: ", label);
        std::io::stderr().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let answer = line.trim().trim_matches('"');
        if answer.is_empty() {
            continue;
        }
        let path = PathBuf::from(answer);
        if path.is_file() {
            return Ok(Some(path));
        }
        eprintln!("   ⚠️ Not a file: {}", path.display());
    }
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            std::fs::write(p, content)?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
