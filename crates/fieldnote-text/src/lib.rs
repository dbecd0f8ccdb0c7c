//! fieldnote-text
//!
//! Bag-of-words retrieval over one reference document: tokenizer, TF-IDF
//! index, and a cosine-similarity ranker that cites supporting sentences.
pub mod tokenizer;
pub mod index;
pub mod search;

pub use index::{IndexStats, TfIdfIndex};
pub use search::{answer, direct_answer, SearchLimits, TfIdfSearchEngine};
pub use tokenizer::tokenize;
