//! Append-only record of one capture session and its plain-text export.
//!
//! The log owns every Event, VitalRecord and MedicationRecord produced during a
//! session. Nothing is ever edited or removed; each collection stays ordered by
//! capture time.

use serde::{Deserialize, Serialize};

use crate::traits::UtteranceExtractor;
use crate::types::{Event, EventKind, Extraction, MedicationRecord, Timestamp, VitalKind, VitalRecord};

const TIME_FORMAT: &str = "%H:%M:%S";
const EMPTY_SECTION: &str = "(none)";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionLog {
    events: Vec<Event>,
    vitals: Vec<VitalRecord>,
    medications: Vec<MedicationRecord>,
}

impl SessionLog {
    pub fn new() -> Self { Self::default() }

    /// Records one finalized utterance and whatever `extractor` finds in it.
    /// Blank utterances are ignored.
    pub fn capture(&mut self, extractor: &dyn UtteranceExtractor, text: &str, captured_at: Timestamp) -> Extraction {
        let text = text.trim();
        if text.is_empty() {
            return Extraction::default();
        }
        let extraction = extractor.extract(text, captured_at);
        insert_ordered(&mut self.events, Event { text: text.to_string(), captured_at, kind: EventKind::Utterance }, |e| e.captured_at);
        for vital in &extraction.vitals {
            insert_ordered(&mut self.vitals, vital.clone(), |v| v.captured_at);
        }
        if let Some(medication) = &extraction.medication {
            insert_ordered(&mut self.medications, medication.clone(), |m| m.captured_at);
        }
        tracing::debug!(
            vitals = extraction.vitals.len(),
            medication = extraction.medication.is_some(),
            "captured utterance"
        );
        extraction
    }

    /// Adds a manual timeline marker such as "CPR started".
    pub fn mark(&mut self, label: &str, captured_at: Timestamp) {
        let label = label.trim();
        if label.is_empty() { return; }
        insert_ordered(&mut self.events, Event { text: label.to_string(), captured_at, kind: EventKind::Mark }, |e| e.captured_at);
    }

    pub fn events(&self) -> &[Event] { &self.events }

    pub fn vitals(&self) -> &[VitalRecord] { &self.vitals }

    pub fn medications(&self) -> &[MedicationRecord] { &self.medications }

    /// History of one vital kind, oldest first.
    pub fn vitals_of(&self, kind: VitalKind) -> impl Iterator<Item = &VitalRecord> + '_ {
        self.vitals.iter().filter(move |v| v.kind == kind)
    }

    pub fn latest(&self, kind: VitalKind) -> Option<&VitalRecord> {
        self.vitals_of(kind).last()
    }

    /// Plain-text summary with `Vitals`, `Medications` and `Timeline` sections,
    /// newest entry first within each section.
    pub fn export_summary(&self) -> String {
        let vitals = self.vitals.iter().rev().map(|v| entry_line(v.captured_at, v.kind.label(), &v.value));
        let medications = self.medications.iter().rev().map(|m| entry_line(m.captured_at, &m.drug, &m.summary()));
        let timeline = self.events.iter().rev().map(|e| entry_line(e.captured_at, e.kind.label(), &e.text));
        [section("Vitals", vitals), section("Medications", medications), section("Timeline", timeline)].join("\n\n")
    }
}

fn entry_line(at: Timestamp, label: &str, value: &str) -> String {
    format!("[{}] {}: {}", at.format(TIME_FORMAT), label, value)
}

fn section(title: &str, lines: impl Iterator<Item = String>) -> String {
    let mut out = vec![title.to_string()];
    out.extend(lines);
    if out.len() == 1 {
        out.push(EMPTY_SECTION.to_string());
    }
    out.join("\n")
}

/// Appends `item`, or slots it in after the last entry captured no later than it.
fn insert_ordered<T>(items: &mut Vec<T>, item: T, at: impl Fn(&T) -> Timestamp) {
    let when = at(&item);
    let pos = items.partition_point(|existing| at(existing) <= when);
    items.insert(pos, item);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Route;
    use chrono::{Local, TimeZone};

    fn at(h: u32, m: u32, s: u32) -> Timestamp {
        Local.with_ymd_and_hms(2024, 3, 9, h, m, s).unwrap()
    }

    /// Emits a fixed BP for any text containing "bp" and a medication for "give".
    struct StubExtractor;

    impl UtteranceExtractor for StubExtractor {
        fn extract(&self, utterance: &str, captured_at: Timestamp) -> Extraction {
            let mut out = Extraction::default();
            if utterance.contains("bp") {
                out.vitals.push(VitalRecord { kind: VitalKind::Bp, value: "120/80".into(), captured_at });
            }
            if utterance.contains("give") {
                out.medication = Some(MedicationRecord {
                    drug: "ondansetron".into(),
                    dose: "4 mg".into(),
                    route: Some(Route::Iv),
                    rate: None,
                    captured_at,
                });
            }
            out
        }
    }

    #[test]
    fn capture_appends_event_and_records() {
        let mut log = SessionLog::new();
        let extraction = log.capture(&StubExtractor, "bp check then give zofran", at(10, 0, 0));
        assert_eq!(extraction.vitals.len(), 1);
        assert_eq!(log.events().len(), 1);
        assert_eq!(log.events()[0].kind, EventKind::Utterance);
        assert_eq!(log.vitals()[0].captured_at, at(10, 0, 0));
        assert_eq!(log.medications().len(), 1);
    }

    #[test]
    fn blank_utterances_are_ignored() {
        let mut log = SessionLog::new();
        assert!(log.capture(&StubExtractor, "   ", at(10, 0, 0)).is_empty());
        assert!(log.events().is_empty());
    }

    #[test]
    fn late_arrivals_keep_capture_order() {
        let mut log = SessionLog::new();
        log.capture(&StubExtractor, "bp one", at(10, 0, 5));
        log.capture(&StubExtractor, "bp two", at(10, 0, 1));
        log.capture(&StubExtractor, "bp three", at(10, 0, 9));
        let times: Vec<Timestamp> = log.vitals_of(VitalKind::Bp).map(|v| v.captured_at).collect();
        assert_eq!(times, vec![at(10, 0, 1), at(10, 0, 5), at(10, 0, 9)]);
        assert_eq!(log.latest(VitalKind::Bp).map(|v| v.captured_at), Some(at(10, 0, 9)));
        assert!(log.latest(VitalKind::Hr).is_none());
    }

    #[test]
    fn export_groups_sections_newest_first() {
        let mut log = SessionLog::new();
        log.capture(&StubExtractor, "bp first", at(9, 5, 0));
        log.mark("CPR started", at(9, 6, 0));
        log.capture(&StubExtractor, "give it", at(9, 7, 30));

        let expected = "Vitals\n\
[09:05:00] BP: 120/80\n\
\n\
Medications\n\
[09:07:30] ondansetron: 4 mg IV\n\
\n\
Timeline\n\
[09:07:30] Note: give it\n\
[09:06:00] Mark: CPR started\n\
[09:05:00] Note: bp first";
        assert_eq!(log.export_summary(), expected);
    }

    #[test]
    fn empty_sections_say_none() {
        let log = SessionLog::new();
        assert_eq!(log.export_summary(), "Vitals\n(none)\n\nMedications\n(none)\n\nTimeline\n(none)");
    }
}
