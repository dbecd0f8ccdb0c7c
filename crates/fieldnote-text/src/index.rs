use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use fieldnote_core::types::{Chunk, ChunkId, TermVector};

use crate::tokenizer::term_counts;

/// Term statistics for one chunk set. Built in one call and never updated;
/// a changed document means a new index.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TfIdfIndex {
	term_frequencies: HashMap<ChunkId, TermVector>,
	inverse_document_frequency: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
	pub chunk_count: usize,
	pub vocabulary_size: usize,
}

impl TfIdfIndex {
	pub fn build(chunks: &[Chunk]) -> Self {
		let mut term_frequencies = HashMap::with_capacity(chunks.len());
		let mut document_frequency: BTreeMap<String, usize> = BTreeMap::new();
		for c in chunks {
			let counts = term_counts(&c.text);
			for token in counts.keys() { *document_frequency.entry(token.clone()).or_insert(0) += 1; }
			term_frequencies.insert(c.id.clone(), counts);
		}
		let n = chunks.len() as f64;
		let inverse_document_frequency = document_frequency
			.into_iter()
			.map(|(token, df)| { let idf = smoothed_idf(n, df as f64); (token, idf) })
			.collect();
		let index = Self { term_frequencies, inverse_document_frequency };
		let stats = index.stats();
		tracing::debug!(chunks = stats.chunk_count, vocabulary = stats.vocabulary_size, "built tf-idf index");
		index
	}

	/// Raw term counts of one chunk.
	pub fn term_frequencies(&self, id: &str) -> Option<&TermVector> { self.term_frequencies.get(id) }

	pub fn inverse_document_frequency(&self) -> &BTreeMap<String, f64> { &self.inverse_document_frequency }

	/// Zero for tokens the index has never seen.
	pub fn idf(&self, token: &str) -> f64 { self.inverse_document_frequency.get(token).copied().unwrap_or(0.0) }

	/// Multiplies raw counts by idf, dropping terms that end up weightless.
	pub fn weigh(&self, counts: &TermVector) -> TermVector {
		counts
			.iter()
			.filter_map(|(token, count)| {
				let weight = count * self.idf(token);
				(weight > 0.0).then(|| (token.clone(), weight))
			})
			.collect()
	}

	pub fn stats(&self) -> IndexStats {
		IndexStats { chunk_count: self.term_frequencies.len(), vocabulary_size: self.inverse_document_frequency.len() }
	}

	/// Number of distinct chunks containing `token`.
	pub fn document_frequency(&self, token: &str) -> usize {
		self.term_frequencies.values().filter(|tf| tf.contains_key(token)).count()
	}
}

/// `ln((N + 1) / (df + 0.5)) + 1`: finite and strictly positive even when a
/// term occurs in every chunk, including N = 1.
pub fn smoothed_idf(n: f64, df: f64) -> f64 { ((n + 1.0) / (df + 0.5)).ln() + 1.0 }
