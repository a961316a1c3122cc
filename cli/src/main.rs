//! pagemodel CLI - replay recorded PDF drawing events into page models

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use colored::Colorize;

use pagemodel::{load_font_maps, ConversionStats, Error, JsonFormat, Options};

#[derive(Parser)]
#[command(name = "pagemodel")]
#[command(version)]
#[command(about = "Turn recorded PDF drawing events into page models", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay an event recording and write the page models as JSON
    Convert {
        /// Recorded events (JSON)
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Destination file to write output to
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,

        /// JSON font mapping configuration file to use for this run
        #[arg(short = 'm', long, value_name = "FILE", env = "PAGEMODEL_FONT_MAP")]
        font_map: Option<PathBuf>,

        /// Include additional debug metadata in output
        #[arg(short = 'D', long)]
        debug_meta: bool,

        /// Include invisible text in output (OCR'd documents)
        #[arg(short, long)]
        invisible_text: bool,

        /// Extract only link data
        #[arg(short, long)]
        links_only: bool,

        /// Overwrite output and image files if they exist
        #[arg(short, long)]
        force: bool,

        /// Extract data for only this page (0-indexed)
        #[arg(short, long, value_name = "N")]
        page: Option<u32>,

        /// Directory to write images to
        #[arg(long, value_name = "DIR")]
        image_dir: Option<PathBuf>,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,

        /// Print conversion statistics as JSON
        #[arg(long)]
        stats: bool,
    },

    /// Display the configured font substitution list
    Fonts {
        /// JSON font mapping configuration file
        #[arg(short = 'm', long, value_name = "FILE", env = "PAGEMODEL_FONT_MAP")]
        font_map: Option<PathBuf>,
    },

    /// Show version information
    Version,
}

fn main() -> ExitCode {
    env_logger::init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    let result = match cli.command {
        Commands::Convert {
            input,
            output,
            font_map,
            debug_meta,
            invisible_text,
            links_only,
            force,
            page,
            image_dir,
            compact,
            stats,
        } => {
            let mut options = Options::new(output)
                .with_debug_info(debug_meta)
                .with_invisible_text(invisible_text)
                .with_force_output(force);
            if links_only {
                options = options.links_only();
            }
            if let Some(path) = font_map {
                options = options.with_font_map(path);
            }
            if let Some(page) = page {
                options = options.with_page(page);
            }
            if let Some(dir) = image_dir {
                options = options.with_resource_dir(dir);
            }
            if compact {
                options = options.with_json_format(JsonFormat::Compact);
            }
            cmd_convert(&input, &options, stats)
        }
        Commands::Fonts { font_map } => cmd_fonts(font_map.as_deref()),
        Commands::Version => {
            cmd_version();
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}: {}", "Error".red().bold(), e);
            ExitCode::from(exit_code(&e))
        }
    }
}

/// 1 for problems with what was asked for, 2 for failures while doing it.
fn exit_code(err: &Error) -> u8 {
    match err {
        Error::PageOutOfRange(..) => 1,
        _ => 2,
    }
}

fn cmd_convert(input: &Path, options: &Options, print_stats: bool) -> Result<(), Error> {
    let stats = pagemodel::replay_file(input, options)?;

    print_summary(&stats, &options.output_file);
    if print_stats {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    }
    Ok(())
}

fn print_summary(stats: &ConversionStats, output: &Path) {
    let status = if stats.is_ok() {
        "Done!".green().bold()
    } else {
        "Done with errors".yellow().bold()
    };
    println!("{} {}", status, output.display());
    println!(
        "  {} {} pages, {} spans, {} graphics, {} images",
        "├─".dimmed(),
        stats.page_count,
        stats.span_count,
        stats.graphic_count,
        stats.image_count
    );
    println!(
        "  {} {} errors, {} warnings",
        "└─".dimmed(),
        stats.error_count,
        stats.warning_count
    );
}

fn cmd_fonts(font_map: Option<&Path>) -> Result<(), Error> {
    let mut options = Options::new("-");
    if let Some(path) = font_map {
        options = options.with_font_map(path);
    }
    let maps = load_font_maps(&options)?;

    println!("{} ({} entries)", "Font substitutions".cyan().bold(), maps.len());
    print!("{}", maps);
    Ok(())
}

fn cmd_version() {
    println!("{} {}", "pagemodel".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("PDF page accumulation engine");
}
