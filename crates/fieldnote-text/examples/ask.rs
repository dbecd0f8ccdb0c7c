use std::env;
use std::path::PathBuf;

use fieldnote_core::config::RetrievalSettings;
use fieldnote_core::data_processor::DataProcessor;
use fieldnote_core::traits::Retriever;
use fieldnote_text::TfIdfSearchEngine;

// Ask one question of a plain text reference document.
// Usage:
//   cargo run -p fieldnote-text --example ask -- <document.txt> "<query>" [--target 900]

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();
    let mut positional = Vec::new();
    let mut settings = RetrievalSettings::default();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--target" => {
                if i + 1 >= args.len() { eprintln!("--target requires a number"); std::process::exit(2); }
                settings.chunk_target_size = args[i + 1].parse()?;
                i += 2; continue;
            }
            s if s.starts_with('-') => { eprintln!("Unknown flag: {}", s); std::process::exit(2); }
            s => positional.push(s.to_string()),
        }
        i += 1;
    }
    if positional.len() != 2 {
        eprintln!("Usage: ask <document.txt> \"<query>\" [--target 900]");
        std::process::exit(2);
    }

    let text = DataProcessor::new().read_document(&PathBuf::from(&positional[0]))?;
    let engine = TfIdfSearchEngine::from_document(&text, settings);
    let stats = engine.index().stats();
    println!("Indexed {} chunks ({} terms)", stats.chunk_count, stats.vocabulary_size);

    let answers = engine.answer(&positional[1]);
    println!("Answer: {}", engine.direct_answer(&answers));
    for (rank, a) in answers.iter().enumerate() {
        println!("  {}. score={:.4} id={} section={}", rank + 1, a.score, a.chunk.id, a.chunk.hint.as_deref().unwrap_or("-"));
    }
    Ok(())
}
