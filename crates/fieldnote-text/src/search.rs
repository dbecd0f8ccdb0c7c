use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

use fieldnote_core::config::RetrievalSettings;
use fieldnote_core::data_processor::chunk;
use fieldnote_core::traits::Retriever;
use fieldnote_core::types::{Answer, Chunk, TermVector};

use crate::index::TfIdfIndex;
use crate::tokenizer::{term_counts, tokenize};

/// Sentence terminators followed by whitespace or the end of the text, so
/// decimals such as "0.5 mg" stay inside their sentence.
static SENTENCE_END: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"[.!?]+(?:\s+|$)").expect("invalid sentence boundary pattern"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchLimits {
	pub max_results: usize,
	pub max_sentences: usize,
}

impl Default for SearchLimits {
	fn default() -> Self { Self { max_results: 5, max_sentences: 3 } }
}

impl From<&RetrievalSettings> for SearchLimits {
	fn from(s: &RetrievalSettings) -> Self { Self { max_results: s.max_results, max_sentences: s.max_supporting_sentences } }
}

/// Ranks `chunks` against `query` by cosine similarity of TF·IDF vectors.
/// Zero-score chunks are dropped; at most `limits.max_results` are returned,
/// best first, each with up to `limits.max_sentences` supporting sentences.
pub fn answer(index: &TfIdfIndex, chunks: &[Chunk], query: &str, limits: SearchLimits) -> Vec<Answer> {
	let query_vector = index.weigh(&term_counts(query));
	if query_vector.is_empty() { return Vec::new(); }

	let mut scored: Vec<(&Chunk, f64)> = chunks
		.iter()
		.filter_map(|c| {
			let chunk_vector = index.weigh(index.term_frequencies(&c.id)?);
			let score = cosine_similarity(&query_vector, &chunk_vector);
			(score > 0.0).then_some((c, score))
		})
		.collect();
	scored.sort_by(|a, b| b.1.total_cmp(&a.1));
	scored.truncate(limits.max_results);

	let query_tokens: BTreeSet<String> = tokenize(query).into_iter().collect();
	let answers: Vec<Answer> = scored
		.into_iter()
		.map(|(c, score)| Answer {
			chunk: c.clone(),
			score,
			supporting_sentences: supporting_sentences(&c.text, &query_tokens, limits.max_sentences),
		})
		.collect();
	tracing::debug!(query, hits = answers.len(), "ranked chunks");
	answers
}

/// Dot product over shared terms divided by the product of both norms. A zero
/// norm floors the denominator to 1, which yields 0.
pub fn cosine_similarity(a: &TermVector, b: &TermVector) -> f64 {
	let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
	let dot: f64 = small.iter().filter_map(|(token, w)| large.get(token).map(|v| w * v)).sum();
	let denominator = norm(a) * norm(b);
	let denominator = if denominator == 0.0 { 1.0 } else { denominator };
	(dot / denominator).clamp(0.0, 1.0)
}

fn norm(v: &TermVector) -> f64 { v.values().map(|w| w * w).sum::<f64>().sqrt() }

/// Sentences of `text` ranked by how many distinct query tokens they contain
/// (case-insensitive substring match). Sentences matching nothing are dropped;
/// ties keep document order.
pub fn supporting_sentences(text: &str, query_tokens: &BTreeSet<String>, max: usize) -> Vec<String> {
	let mut scored: Vec<(usize, String)> = split_sentences(text)
		.into_iter()
		.filter_map(|sentence| {
			let folded = sentence.to_lowercase();
			let hits = query_tokens.iter().filter(|t| folded.contains(t.as_str())).count();
			(hits > 0).then_some((hits, sentence))
		})
		.collect();
	scored.sort_by(|a, b| b.0.cmp(&a.0));
	scored.into_iter().take(max).map(|(_, s)| s).collect()
}

/// Splits on `.`, `!` or `?` followed by whitespace, collapsing inner whitespace.
pub fn split_sentences(text: &str) -> Vec<String> {
	let mut sentences = Vec::new();
	let mut start = 0;
	for m in SENTENCE_END.find_iter(text) {
		push_sentence(&mut sentences, &text[start..m.end()]);
		start = m.end();
	}
	push_sentence(&mut sentences, &text[start..]);
	sentences
}

fn push_sentence(sentences: &mut Vec<String>, raw: &str) {
	let sentence = raw.split_whitespace().collect::<Vec<_>>().join(" ");
	if !sentence.is_empty() { sentences.push(sentence); }
}

/// The top-line answer: supporting sentences in rank order, at most `n`.
pub fn direct_answer(answers: &[Answer], n: usize) -> String {
	answers
		.iter()
		.flat_map(|a| a.supporting_sentences.iter().map(String::as_str))
		.take(n)
		.collect::<Vec<_>>()
		.join(" ")
}

/// Owns one (chunks, index) build of a reference document.
pub struct TfIdfSearchEngine {
	chunks: Vec<Chunk>,
	index: TfIdfIndex,
	settings: RetrievalSettings,
}

impl TfIdfSearchEngine {
	pub fn new(settings: RetrievalSettings) -> Self {
		Self { chunks: Vec::new(), index: TfIdfIndex::default(), settings }
	}

	pub fn from_document(document: &str, settings: RetrievalSettings) -> Self {
		let mut engine = Self::new(settings);
		engine.rebuild(document);
		engine
	}

	pub fn chunks(&self) -> &[Chunk] { &self.chunks }

	pub fn index(&self) -> &TfIdfIndex { &self.index }

	pub fn direct_answer(&self, answers: &[Answer]) -> String { direct_answer(answers, self.settings.direct_answer_sentences) }
}

impl Retriever for TfIdfSearchEngine {
	fn rebuild(&mut self, document: &str) {
		let chunks = chunk(document, self.settings.chunk_target_size);
		let index = TfIdfIndex::build(&chunks);
		self.chunks = chunks;
		self.index = index;
	}

	fn answer(&self, query: &str) -> Vec<Answer> {
		answer(&self.index, &self.chunks, query, SearchLimits::from(&self.settings))
	}
}
