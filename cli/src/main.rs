//! xlrows CLI - worksheet extraction tool
//!
//! A command-line tool for dumping the first worksheet of an XLSX file as
//! JSON, or extracting header-labelled records from it.

mod extract;
mod logger;

use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use xlrows::{ColumnAlignment, ReadOptions, SheetReader};

use extract::{extract_records, ExtractRules};

/// First-worksheet extraction from XLSX files to JSON
#[derive(Parser)]
#[command(
    name = "xlrows",
    author = "iyulab",
    version,
    about = "Extract worksheet rows from XLSX files",
    long_about = "xlrows - minimal XLSX worksheet reader.\n\n\
                  Reads the first worksheet of a spreadsheet and writes its rows,\n\
                  or the records below a header row, as JSON."
)]
struct Cli {
    /// Increase log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write every row of the first worksheet as a JSON array of arrays
    Rows {
        /// Input file path
        input: PathBuf,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output compact JSON (no indentation)
        #[arg(long)]
        compact: bool,

        /// How cells are placed within a row
        #[arg(long, default_value = "positional")]
        align: AlignMode,
    },

    /// Write the records below the header row as a JSON array of objects
    Extract {
        /// Input file path
        input: PathBuf,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output compact JSON (no indentation)
        #[arg(long)]
        compact: bool,

        /// Text the first cell of the header row contains
        #[arg(long, default_value = "Precinct")]
        header: String,

        /// Drop rows whose first cell contains this text
        #[arg(long, default_value = "Total")]
        exclude: String,

        /// Keep rows whose first cell contains the exclude text
        #[arg(long)]
        no_exclude: bool,

        /// Output field names, comma separated (default: header row values)
        #[arg(long, value_delimiter = ',')]
        columns: Vec<String>,

        /// Fewest cells a row needs to become a record
        #[arg(long, default_value_t = 3)]
        min_cells: usize,

        /// How cells are placed within a row
        #[arg(long, default_value = "positional")]
        align: AlignMode,
    },

    /// Show package and worksheet information
    Info {
        /// Input file path
        input: PathBuf,
    },

    /// Show version information
    Version,
}

/// Column placement mode
#[derive(Clone, ValueEnum)]
enum AlignMode {
    /// Cells in source order, no padding
    Positional,
    /// Cells at their declared column, gaps padded
    Reference,
}

impl From<AlignMode> for ColumnAlignment {
    fn from(mode: AlignMode) -> Self {
        match mode {
            AlignMode::Positional => ColumnAlignment::Positional,
            AlignMode::Reference => ColumnAlignment::Reference,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    logger::init(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Rows {
            input,
            output,
            compact,
            align,
        } => {
            let pb = create_spinner("Reading worksheet...");

            let options = ReadOptions::new().with_column_alignment(align.into());
            let table = xlrows::read_table_with_options(&input, &options)?;
            pb.set_message("Rendering to JSON...");

            let json = to_json(&table, compact)?;

            pb.finish_and_clear();
            write_output(output.as_ref(), &json)?;

            if let Some(path) = output {
                println!(
                    "{} Wrote {} rows: {}",
                    "✓".green().bold(),
                    table.len(),
                    path.display()
                );
            }
        }

        Commands::Extract {
            input,
            output,
            compact,
            header,
            exclude,
            no_exclude,
            columns,
            min_cells,
            align,
        } => {
            let pb = create_spinner("Reading worksheet...");

            let options = ReadOptions::new().with_column_alignment(align.into());
            let table = xlrows::read_table_with_options(&input, &options)?;
            pb.set_message("Extracting records...");

            let rules = ExtractRules {
                header,
                exclude: (!no_exclude).then_some(exclude),
                columns,
                min_cells,
            };
            let records = extract_records(&table, &rules);
            let json = to_json(&records, compact)?;

            pb.finish_and_clear();
            write_output(output.as_ref(), &json)?;

            if let Some(path) = output {
                println!(
                    "{} Extracted {} records: {}",
                    "✓".green().bold(),
                    records.len(),
                    path.display()
                );
            }
        }

        Commands::Info { input } => {
            let pb = create_spinner("Analyzing spreadsheet...");

            let reader = SheetReader::open(&input)?;
            let parts = reader.package().part_names();
            let table = reader.read_table()?;

            pb.finish_and_clear();

            println!("{}", "Spreadsheet Information".cyan().bold());
            println!("{}", "─".repeat(40));
            println!(
                "{}: {}",
                "File".bold(),
                input.file_name().unwrap_or_default().to_string_lossy()
            );
            println!("{}: {}", "Parts".bold(), parts.len());
            println!(
                "{}: {}",
                "Shared strings".bold(),
                reader.shared_strings().len()
            );

            println!("\n{}", "First Worksheet".cyan().bold());
            println!("{}", "─".repeat(40));
            println!("{}: {}", "Rows".bold(), table.len());
            println!("{}: {}", "Widest row".bold(), table.width());
            let empty = table.iter().filter(|row| row.is_empty()).count();
            println!("{}: {}", "Empty rows".bold(), empty);
        }

        Commands::Version => {
            print_version();
        }
    }

    Ok(())
}

fn to_json<T: serde::Serialize + ?Sized>(
    value: &T,
    compact: bool,
) -> Result<String, serde_json::Error> {
    if compact {
        serde_json::to_string(value)
    } else {
        serde_json::to_string_pretty(value)
    }
}

fn print_version() {
    println!("{} {}", "xlrows".green().bold(), env!("CARGO_PKG_VERSION"));
    println!("Minimal XLSX worksheet reader");
    println!();
    println!("Reads: first worksheet, shared strings, literal values");
}

fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
            .template("{spinner:.blue} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn write_output(path: Option<&PathBuf>, content: &str) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            writeln!(handle, "{}", content)?;
        }
    }
    Ok(())
}
