//! Domain types shared by the clinical extractor, the retrieval engine and the shell.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub type Timestamp = DateTime<Local>;
pub type ChunkId = String;

/// Token -> weight. Raw counts for a chunk's own term frequencies,
/// TF·IDF weights when scoring. Absent keys weigh zero.
pub type TermVector = BTreeMap<String, f64>;

/// The fixed set of vital signs the extractor recognizes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VitalKind {
    #[serde(rename = "BP")]
    Bp,
    #[serde(rename = "HR")]
    Hr,
    #[serde(rename = "RR")]
    Rr,
    #[serde(rename = "SpO2")]
    SpO2,
    #[serde(rename = "Temp")]
    Temp,
    #[serde(rename = "GCS")]
    Gcs,
    #[serde(rename = "EtCO2")]
    EtCo2,
    #[serde(rename = "Glucose")]
    Glucose,
}

impl VitalKind {
    pub const ALL: [VitalKind; 8] = [
        VitalKind::Bp,
        VitalKind::Hr,
        VitalKind::Rr,
        VitalKind::SpO2,
        VitalKind::Temp,
        VitalKind::Gcs,
        VitalKind::EtCo2,
        VitalKind::Glucose,
    ];

    pub fn label(self) -> &'static str {
        match self {
            VitalKind::Bp => "BP",
            VitalKind::Hr => "HR",
            VitalKind::Rr => "RR",
            VitalKind::SpO2 => "SpO2",
            VitalKind::Temp => "Temp",
            VitalKind::Gcs => "GCS",
            VitalKind::EtCo2 => "EtCO2",
            VitalKind::Glucose => "Glucose",
        }
    }
}

impl fmt::Display for VitalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One timestamped measurement. `value` formatting depends on `kind`
/// (`"128/82"` for BP, `"97%"` for SpO2, `"38.5 C"` for Temp).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VitalRecord {
    pub kind: VitalKind,
    pub value: String,
    pub captured_at: Timestamp,
}

/// Administration route, rendered upper-case.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum Route {
    Iv,
    Im,
    Io,
    Po,
    Pr,
    Sq,
    Nebulized,
    Inhaled,
}

impl Route {
    /// Maps a spoken/typed route token (any case) to a route.
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_lowercase().as_str() {
            "iv" => Some(Route::Iv),
            "im" => Some(Route::Im),
            "io" => Some(Route::Io),
            "po" => Some(Route::Po),
            "pr" => Some(Route::Pr),
            "sq" | "subq" | "sc" => Some(Route::Sq),
            "nebulized" | "neb" => Some(Route::Nebulized),
            "inhaled" => Some(Route::Inhaled),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Route::Iv => "IV",
            Route::Im => "IM",
            Route::Io => "IO",
            Route::Po => "PO",
            Route::Pr => "PR",
            Route::Sq => "SQ",
            Route::Nebulized => "NEBULIZED",
            Route::Inhaled => "INHALED",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A medication administration pulled out of one utterance.
///
/// - `dose`: magnitude and unit, optionally suffixed `/kg` (`"0.1 mcg/kg"`)
/// - `rate`: only present when a per-time qualifier was spoken (`"0.1 mcg/kg/min"`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicationRecord {
    pub drug: String,
    pub dose: String,
    pub route: Option<Route>,
    pub rate: Option<String>,
    pub captured_at: Timestamp,
}

impl MedicationRecord {
    /// `"<dose>[ @ <rate>][ <ROUTE>]"`, the value column of the export.
    pub fn summary(&self) -> String {
        let mut out = self.dose.clone();
        if let Some(rate) = &self.rate {
            out.push_str(" @ ");
            out.push_str(rate);
        }
        if let Some(route) = self.route {
            out.push(' ');
            out.push_str(route.label());
        }
        out
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Utterance,
    Mark,
}

impl EventKind {
    pub fn label(self) -> &'static str {
        match self {
            EventKind::Utterance => "Note",
            EventKind::Mark => "Mark",
        }
    }
}

/// An entry of the timeline: a captured utterance or a manual mark.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub text: String,
    pub captured_at: Timestamp,
    pub kind: EventKind,
}

/// Everything one utterance yielded. At most one record per vital kind and
/// at most one medication.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Extraction {
    pub vitals: Vec<VitalRecord>,
    pub medication: Option<MedicationRecord>,
}

impl Extraction {
    pub fn is_empty(&self) -> bool {
        self.vitals.is_empty() && self.medication.is_none()
    }
}

/// A paragraph-aligned slice of a reference document, the unit of retrieval.
///
/// `id` is only stable within one index build. `hint` is the first line of the
/// chunk that looks like a heading (5+ characters, all upper-case).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: ChunkId,
    pub text: String,
    pub hint: Option<String>,
}

/// One ranked retrieval result. `score` is a cosine similarity in `[0, 1]`,
/// higher is better.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    pub chunk: Chunk,
    pub score: f64,
    pub supporting_sentences: Vec<String>,
}
