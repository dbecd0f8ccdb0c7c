use std::sync::{LazyLock, Mutex, PoisonError};
use tantivy::tokenizer::{LowerCaser, SimpleTokenizer, TextAnalyzer, TokenStream};

use fieldnote_core::types::TermVector;

/// Splits on every non-alphanumeric character and lower-cases each token.
/// No stop words and no stemming.
pub fn build_analyzer() -> TextAnalyzer {
	TextAnalyzer::builder(SimpleTokenizer::default())
		.filter(LowerCaser)
		.build()
}

/// Shared by every call; `token_stream` takes `&mut self`.
static ANALYZER: LazyLock<Mutex<TextAnalyzer>> = LazyLock::new(|| Mutex::new(build_analyzer()));

pub fn tokenize(text: &str) -> Vec<String> {
	let mut analyzer = ANALYZER.lock().unwrap_or_else(PoisonError::into_inner);
	let mut stream = analyzer.token_stream(text);
	let mut tokens = Vec::new();
	while stream.advance() { tokens.push(stream.token().text.clone()); }
	tokens
}

/// Raw occurrence count of every token in `text`.
pub fn term_counts(text: &str) -> TermVector {
	let mut counts = TermVector::new();
	for token in tokenize(text) { *counts.entry(token).or_insert(0.0) += 1.0; }
	counts
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn lowercases_and_splits_on_punctuation() {
		assert_eq!(tokenize("Give EPI-pen, 0.3mg IM!"), vec!["give", "epi", "pen", "0", "3mg", "im"]);
	}

	#[test]
	fn blank_text_has_no_tokens() {
		assert!(tokenize("").is_empty());
		assert!(tokenize(" \n\t ... ").is_empty());
	}

	#[test]
	fn stop_words_are_kept() {
		assert_eq!(tokenize("The airway is open"), vec!["the", "airway", "is", "open"]);
	}

	#[test]
	fn shared_analyzer_is_safe_across_threads() {
		let handles: Vec<_> = (0..4)
			.map(|_| std::thread::spawn(|| (0..50).map(|_| tokenize("Splint the LIMB, check pulses")).collect::<Vec<_>>()))
			.collect();
		for handle in handles {
			for tokens in handle.join().unwrap() {
				assert_eq!(tokens, vec!["splint", "the", "limb", "check", "pulses"]);
			}
		}
	}

	#[test]
	fn counts_repeated_tokens() {
		let counts = term_counts("Shock shock SHOCK fluids");
		assert_eq!(counts.get("shock"), Some(&3.0));
		assert_eq!(counts.get("fluids"), Some(&1.0));
		assert_eq!(counts.len(), 2);
	}
}
