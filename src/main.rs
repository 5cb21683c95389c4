use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use genwiki::extract;
use genwiki::stats::ReadStats;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(name = "genwiki")]
#[command(about = "Extract places, people and review lists from genealogy wiki dumps")]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the place hierarchy into place_words.csv and places.csv
    Places(PlacesArgs),
    /// One pipe-delimited summary line per person
    People(ReportArgs),
    /// One JSON object per person, joined with parents and spouse
    PeopleJson(ReportArgs),
    /// Wikitext lists of families with unlikely spouse combinations
    MultiSpouseFamilies(MultiSpouseArgs),
    /// Wikitext list of MySource pages without a user prefix
    OrphanMysources(ReportArgs),
}

#[derive(Args)]
struct PlacesArgs {
    /// Path to the dump file (.xml or .xml.bz2)
    #[arg(short, long)]
    input: String,

    /// Output directory for generated files
    #[arg(short, long)]
    output: PathBuf,

    /// Ignore and rebuild the place catalog cache
    #[arg(long)]
    no_cache: bool,
}

#[derive(Args)]
struct ReportArgs {
    /// Path to the dump file (.xml or .xml.bz2)
    #[arg(short, long)]
    input: String,

    /// Output file
    #[arg(short, long)]
    output: PathBuf,
}

#[derive(Args)]
struct MultiSpouseArgs {
    /// Path to the dump file (.xml or .xml.bz2)
    #[arg(short, long)]
    input: String,

    /// Output file for families with spouses of one gender only
    #[arg(long)]
    same_gender: PathBuf,

    /// Output file for families with three or more spouses
    #[arg(long)]
    diff_gender: PathBuf,
}

fn print_header(start: Instant) {
    println!();
    println!("=== Summary ===");
    println!("Total time:         {:.2}s", start.elapsed().as_secs_f64());
}

fn finish_report(start: Instant, stats: &ReadStats, label: &str, written: u64) {
    print_header(start);
    stats.print_summary();
    println!("{:<20}{}", format!("{}:", label), written);
}

fn run_places(args: PlacesArgs) -> Result<()> {
    let start = Instant::now();
    let summary = extract::run_places(&args.input, &args.output, !args.no_cache, true)?;

    print_header(start);
    match &summary.read {
        Some(stats) => stats.print_summary(),
        None => println!("Place catalog loaded from cache"),
    }
    println!("Places:             {}", summary.places);
    println!("Place redirects:    {}", summary.redirects);
    println!("Places written:     {}", summary.resolved);
    println!("Word lines written: {}", summary.words);
    Ok(())
}

fn run_people(args: ReportArgs) -> Result<()> {
    let start = Instant::now();
    let (stats, written) = extract::run_people(&args.input, &args.output, true)?;
    finish_report(start, &stats, "People written", written);
    Ok(())
}

fn run_people_json(args: ReportArgs) -> Result<()> {
    let start = Instant::now();
    let (stats, written) = extract::run_people_json(&args.input, &args.output, true)?;
    finish_report(start, &stats, "People written", written as u64);
    Ok(())
}

fn run_multi_spouse(args: MultiSpouseArgs) -> Result<()> {
    let start = Instant::now();
    let (stats, (same, diff)) = extract::run_multi_spouse_families(
        &args.input,
        &args.same_gender,
        &args.diff_gender,
        true,
    )?;
    finish_report(start, &stats, "Same gender", same);
    println!("Different gender:   {}", diff);
    Ok(())
}

fn run_orphans(args: ReportArgs) -> Result<()> {
    let start = Instant::now();
    let (stats, written) = extract::run_orphan_mysources(&args.input, &args.output, true)?;
    finish_report(start, &stats, "MySources listed", written);
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return ExitCode::FAILURE;
    }

    let result = match cli.command {
        Commands::Places(args) => run_places(args),
        Commands::People(args) => run_people(args),
        Commands::PeopleJson(args) => run_people_json(args),
        Commands::MultiSpouseFamilies(args) => run_multi_spouse(args),
        Commands::OrphanMysources(args) => run_orphans(args),
    };

    match result {
        Ok(()) => {
            info!("Completed successfully");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Error: {:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
