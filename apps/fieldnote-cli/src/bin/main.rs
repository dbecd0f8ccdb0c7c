use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;

use anyhow::Context;
use chrono::{Duration, Local, NaiveTime};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use fieldnote_clinical::infusion;
use fieldnote_clinical::ClinicalExtractor;
use fieldnote_core::config::{expand_path, Config, Settings};
use fieldnote_core::data_processor::DataProcessor;
use fieldnote_core::session::SessionLog;
use fieldnote_core::traits::Retriever;
use fieldnote_core::types::Timestamp;
use fieldnote_text::TfIdfSearchEngine;

/// Offline field notes: vitals/medication capture and reference lookup.
#[derive(Parser, Debug)]
#[command(name = "fieldnote", version, about)]
struct Cli {
    /// Raise log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log utterances (one per line, `!` prefix for a timeline mark) and print the export summary
    Capture {
        /// Input file; stdin when omitted
        file: Option<PathBuf>,
        /// Stamp the first line with this local time (HH:MM:SS), one second apart after that
        #[arg(long)]
        at: Option<String>,
    },
    /// Answer a question from a reference document
    Ask { document: String, query: String },
    /// Show how a reference document is chunked and indexed
    Chunks { document: String },
    /// Infusion calculators
    Drip {
        #[command(subcommand)]
        calc: DripCommand,
    },
}

#[derive(Subcommand, Debug)]
enum DripCommand {
    /// Drops per minute from volume, time and tubing drop factor
    Gtt { total_ml: String, minutes: String, drop_factor: String },
    /// mL/hr from a mg/hr order
    Mlhr { dose_mg_per_hour: String, concentration_mg_per_ml: String },
    /// mL/hr from a mcg/kg/min order
    Weight { mcg_per_kg_per_min: String, weight_kg: String, concentration_mg_per_ml: String },
}

fn init_tracing(settings: &Settings, cli: &Cli) {
    let filter = if cli.quiet {
        EnvFilter::new("error")
    } else if cli.verbose > 0 {
        EnvFilter::new(if cli.verbose > 1 { "trace" } else { "debug" })
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.logging.filter))
    };
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::load().map_err(|e| { eprintln!("Error loading config: {}", e); e })?;
    let settings = config.settings()?;
    init_tracing(&settings, &cli);

    match &cli.command {
        Command::Capture { file, at } => capture(file.as_ref(), at.as_deref(), cli.json),
        Command::Ask { document, query } => ask(&settings, document, query, cli.json),
        Command::Chunks { document } => chunks(&settings, document, cli.json),
        Command::Drip { calc } => {
            drip(calc);
            Ok(())
        }
    }
}

fn capture(file: Option<&PathBuf>, at: Option<&str>, json: bool) -> anyhow::Result<()> {
    let reader: Box<dyn BufRead> = match file {
        Some(path) => Box::new(BufReader::new(
            std::fs::File::open(path).with_context(|| format!("opening {}", path.display()))?,
        )),
        None => Box::new(BufReader::new(io::stdin())),
    };
    let start = at.map(parse_start_time).transpose()?;

    let mut log = SessionLog::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let stamp = match start {
            Some(t) => t + Duration::seconds(i64::try_from(i)?),
            None => Local::now(),
        };
        match line.trim().strip_prefix('!') {
            Some(label) => log.mark(label, stamp),
            None => {
                log.capture(&ClinicalExtractor, &line, stamp);
            }
        }
    }
    tracing::info!(events = log.events().len(), vitals = log.vitals().len(), medications = log.medications().len(), "session captured");

    if json {
        println!("{}", serde_json::to_string_pretty(&log)?);
    } else {
        println!("{}", log.export_summary());
    }
    Ok(())
}

fn parse_start_time(raw: &str) -> anyhow::Result<Timestamp> {
    let time = NaiveTime::parse_from_str(raw, "%H:%M:%S").with_context(|| format!("invalid --at time '{raw}', expected HH:MM:SS"))?;
    Local::now()
        .date_naive()
        .and_time(time)
        .and_local_timezone(Local)
        .earliest()
        .with_context(|| format!("local time {raw} does not exist today"))
}

fn load_engine(settings: &Settings, document: &str) -> anyhow::Result<TfIdfSearchEngine> {
    let path = expand_path(document);
    let text = DataProcessor::new().read_document(&path)?;
    Ok(TfIdfSearchEngine::from_document(&text, settings.retrieval.clone()))
}

fn ask(settings: &Settings, document: &str, query: &str, json: bool) -> anyhow::Result<()> {
    let engine = load_engine(settings, document)?;
    let answers = engine.answer(query);
    if json {
        println!("{}", serde_json::to_string_pretty(&answers)?);
        return Ok(());
    }
    println!("Query: {}", query);
    if answers.is_empty() {
        println!("No matching passages.");
        return Ok(());
    }
    println!("Answer: {}", engine.direct_answer(&answers));
    for (i, a) in answers.iter().enumerate() {
        println!("\n  {}. score={:.4}  id={}  section={}", i + 1, a.score, a.chunk.id, a.chunk.hint.as_deref().unwrap_or("-"));
        for s in &a.supporting_sentences { println!("     > {}", s); }
    }
    Ok(())
}

fn chunks(settings: &Settings, document: &str, json: bool) -> anyhow::Result<()> {
    let engine = load_engine(settings, document)?;
    if json {
        println!("{}", serde_json::to_string_pretty(engine.chunks())?);
        return Ok(());
    }
    for c in engine.chunks() {
        println!("{:>4}  {:>5} chars  {}", c.id, c.text.chars().count(), c.hint.as_deref().unwrap_or("-"));
    }
    let stats = engine.index().stats();
    println!("\n{} chunks, {} distinct terms", stats.chunk_count, stats.vocabulary_size);
    Ok(())
}

fn drip(calc: &DripCommand) {
    let result = match calc {
        DripCommand::Gtt { total_ml, minutes, drop_factor } => {
            infusion::gtt_per_minute_fields(total_ml, minutes, drop_factor).map(|v| format!("{v} gtt/min"))
        }
        DripCommand::Mlhr { dose_mg_per_hour, concentration_mg_per_ml } => {
            infusion::ml_per_hour_fields(dose_mg_per_hour, concentration_mg_per_ml).map(|v| format!("{v:.2} mL/hr"))
        }
        DripCommand::Weight { mcg_per_kg_per_min, weight_kg, concentration_mg_per_ml } => {
            infusion::weight_based_ml_per_hour_fields(mcg_per_kg_per_min, weight_kg, concentration_mg_per_ml)
                .map(|v| format!("{v:.2} mL/hr"))
        }
    };
    println!("{}", result.unwrap_or_else(|| "--".to_string()));
}
