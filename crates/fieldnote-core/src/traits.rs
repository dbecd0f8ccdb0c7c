use crate::types::{Answer, Extraction, Timestamp};

/// Turns one finalized utterance into structured records. Implementations are
/// pure: every returned record carries `captured_at` unchanged.
pub trait UtteranceExtractor: Send + Sync {
    fn extract(&self, utterance: &str, captured_at: Timestamp) -> Extraction;
}

/// A retrieval engine over a single reference document.
pub trait Retriever: Send + Sync {
    /// Replaces the whole index with one built from `document`.
    fn rebuild(&mut self, document: &str);
    fn answer(&self, query: &str) -> Vec<Answer>;
}
