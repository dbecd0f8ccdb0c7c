use fieldnote_core::config::RetrievalSettings;
use fieldnote_core::data_processor::chunk;
use fieldnote_core::traits::Retriever;
use fieldnote_text::{answer, SearchLimits, TfIdfIndex, TfIdfSearchEngine};

const FIELD_GUIDE: &str = "\
HYPOTHERMIA
Remove wet clothing and insulate the patient from the ground. Warm the core first.

Shivering stops below roughly 32 degrees. Handle the patient gently to avoid arrhythmia.

BURNS
Cool the burn with clean running water for twenty minutes. Do not use ice.

Cover burns loosely with cling film. Estimate the burned surface area with the rule of nines.

FRACTURES
Splint the limb in the position found. Check circulation below the splint.

SNAKE BITE
Keep the patient still and the bitten limb below heart level. Do not cut or suck the wound.";

fn engine(target: usize) -> TfIdfSearchEngine {
    let settings = RetrievalSettings { chunk_target_size: target, ..RetrievalSettings::default() };
    TfIdfSearchEngine::from_document(FIELD_GUIDE, settings)
}

#[test]
fn relevant_chunk_ranks_first_with_citations() {
    let engine = engine(120);
    let answers = engine.answer("how long to cool a burn with water");
    assert!(!answers.is_empty());
    let top = &answers[0];
    assert_eq!(top.chunk.hint.as_deref(), Some("BURNS"));
    assert_eq!(top.supporting_sentences[0], "BURNS Cool the burn with clean running water for twenty minutes.");
    assert!(top.supporting_sentences.len() <= 3);
}

#[test]
fn scores_are_bounded_and_sorted() {
    let engine = engine(120);
    for q in ["patient", "the limb below the splint", "burns ice water", "warm core shivering"] {
        let answers = engine.answer(q);
        assert!(answers.len() <= 5, "q='{q}' returned {}", answers.len());
        for a in &answers {
            assert!(a.score > 0.0 && a.score <= 1.0, "q='{q}' score {}", a.score);
        }
        for pair in answers.windows(2) {
            assert!(pair[0].score >= pair[1].score, "q='{q}' not sorted");
        }
    }
}

#[test]
fn query_without_overlap_returns_nothing() {
    let engine = engine(120);
    assert!(engine.answer("cardiac defibrillation").is_empty());
    assert!(engine.answer("").is_empty());
    assert!(engine.answer("?!").is_empty());
}

#[test]
fn results_are_capped() {
    let index_chunks = chunk(FIELD_GUIDE, 10);
    assert!(index_chunks.len() > 5);
    let index = TfIdfIndex::build(&index_chunks);
    let answers = answer(&index, &index_chunks, "the", SearchLimits { max_results: 5, max_sentences: 3 });
    assert_eq!(answers.len(), 5);
    let narrow = answer(&index, &index_chunks, "the", SearchLimits { max_results: 2, max_sentences: 1 });
    assert_eq!(narrow.len(), 2);
    assert!(narrow.iter().all(|a| a.supporting_sentences.len() <= 1));
}

#[test]
fn direct_answer_takes_top_sentences() {
    let engine = engine(120);
    let answers = engine.answer("splint circulation");
    let direct = engine.direct_answer(&answers);
    assert!(direct.starts_with("Check circulation below the splint."));
}

#[test]
fn empty_document_answers_nothing() {
    let engine = TfIdfSearchEngine::from_document("   ", RetrievalSettings::default());
    assert!(engine.chunks().is_empty());
    assert!(engine.answer("burns").is_empty());
}
