use regex::Regex;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use crate::error::{Error, Result};
use crate::types::Chunk;

pub const DEFAULT_TARGET_SIZE: usize = 900;

/// A blank line, possibly holding stray whitespace, separates paragraphs.
static PARAGRAPH_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\r?\n[ \t\r]*\n").expect("invalid paragraph break pattern"));

const PARAGRAPH_JOIN: &str = "\n\n";
const MIN_HINT_CHARS: usize = 5;

#[derive(Debug, Clone)]
pub struct ChunkingConfig {
    /// Soft upper bound on a chunk's character length. A single paragraph
    /// longer than this still becomes one chunk.
    pub target_size: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self { target_size: DEFAULT_TARGET_SIZE }
    }
}

#[derive(Default)]
pub struct DataProcessor {
    chunking_config: ChunkingConfig,
}

impl DataProcessor {
    pub fn new() -> Self { Self::default() }

    pub fn with_target_size(target_size: usize) -> Self {
        Self { chunking_config: ChunkingConfig { target_size } }
    }

    /// Reads a reference document, falling back to lossy UTF-8 decoding.
    pub fn read_document(&self, file_path: &Path) -> Result<String> {
        if !file_path.is_file() {
            return Err(Error::NotFound(file_path.display().to_string()));
        }
        match fs::read_to_string(file_path) {
            Ok(content) => Ok(content),
            Err(_) => Ok(String::from_utf8_lossy(&fs::read(file_path)?).to_string()),
        }
    }

    pub fn chunk(&self, document: &str) -> Vec<Chunk> {
        chunk(document, self.chunking_config.target_size)
    }
}

/// Splits `document` into paragraph-aligned chunks of roughly `target_size`
/// characters. Paragraphs are never split; ids run `c0, c1, ...` in order.
pub fn chunk(document: &str, target_size: usize) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut buffer = String::new();
    let mut buffer_chars = 0usize;

    for paragraph in PARAGRAPH_BREAK.split(document) {
        let paragraph = paragraph.trim();
        if paragraph.is_empty() { continue; }
        let paragraph_chars = paragraph.chars().count();
        let joined_chars = if buffer.is_empty() { paragraph_chars } else { buffer_chars + PARAGRAPH_JOIN.len() + paragraph_chars };

        if !buffer.is_empty() && joined_chars > target_size {
            push_chunk(&mut chunks, std::mem::take(&mut buffer));
            buffer.push_str(paragraph);
            buffer_chars = paragraph_chars;
        } else {
            if !buffer.is_empty() { buffer.push_str(PARAGRAPH_JOIN); }
            buffer.push_str(paragraph);
            buffer_chars = joined_chars;
        }
    }
    if !buffer.is_empty() { push_chunk(&mut chunks, buffer); }

    tracing::debug!(chunks = chunks.len(), target_size, "chunked document");
    chunks
}

fn push_chunk(chunks: &mut Vec<Chunk>, text: String) {
    let hint = heading_hint(&text);
    chunks.push(Chunk { id: format!("c{}", chunks.len()), text, hint });
}

/// First line of at least five characters, measured as written, that is
/// already upper-case. The hint itself is returned trimmed.
pub fn heading_hint(text: &str) -> Option<String> {
    text.lines()
        .find(|line| {
            line.chars().count() >= MIN_HINT_CHARS && !line.trim().is_empty() && *line == line.to_uppercase()
        })
        .map(|line| line.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_documents_yield_no_chunks() {
        assert!(chunk("", 900).is_empty());
        assert!(chunk("  \n\n \t\n\n", 900).is_empty());
    }

    #[test]
    fn small_paragraphs_share_a_chunk() {
        let chunks = chunk("alpha bravo\n\ncharlie delta\n\n\n\necho", 900);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].id, "c0");
        assert_eq!(chunks[0].text, "alpha bravo\n\ncharlie delta\n\necho");
    }

    #[test]
    fn flushes_before_exceeding_target() {
        // "aaaa" + "\n\n" + "bbbb" = 10 chars
        let chunks = chunk("aaaa\n\nbbbb\n\ncccc", 10);
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["aaaa\n\nbbbb", "cccc"]);
        assert_eq!(chunks[1].id, "c1");
    }

    #[test]
    fn oversized_paragraph_is_kept_whole() {
        let long = "x".repeat(50);
        let doc = format!("short\n\n{long}\n\ntail");
        let chunks = chunk(&doc, 10);
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["short", long.as_str(), "tail"]);
    }

    #[test]
    fn whitespace_only_separator_lines_split_paragraphs() {
        let chunks = chunk("one\n   \ntwo\r\n\r\nthree", 3);
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["one", "two", "three"]);
    }

    #[test]
    fn hint_is_first_upper_case_line() {
        let chunks = chunk("Intro text\nAIRWAY MANAGEMENT\nOPEN THE AIRWAY\nmore", 900);
        assert_eq!(chunks[0].hint.as_deref(), Some("AIRWAY MANAGEMENT"));
    }

    #[test]
    fn short_or_mixed_case_lines_are_not_hints() {
        assert_eq!(heading_hint("CPR\nAirway Management\nnothing here"), None);
        assert_eq!(heading_hint("  SHOCK  \nbody"), Some("SHOCK".to_string()));
    }

    #[test]
    fn hint_length_counts_surrounding_spaces() {
        assert_eq!(heading_hint("  CPR  \nbody"), Some("CPR".to_string()));
        assert_eq!(heading_hint("text\n CPR"), None);
        assert_eq!(heading_hint("      \nbody"), None);
    }

    #[test]
    fn processor_uses_configured_target() {
        let processor = DataProcessor::with_target_size(4);
        assert_eq!(processor.chunk("aaaa\n\nbbbb").len(), 2);
        assert_eq!(DataProcessor::new().chunk("aaaa\n\nbbbb").len(), 1);
    }
}
