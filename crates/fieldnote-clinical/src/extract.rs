//! Pattern rules that pull vitals and a medication out of one utterance.
//!
//! The utterance is case-folded once; every rule then runs independently, so
//! one sentence can yield several vitals (at most one per kind) and at most
//! one medication. Nothing here fails: unmatched text simply yields nothing.

use regex::{Captures, Regex};
use std::sync::LazyLock;

use fieldnote_core::traits::UtteranceExtractor;
use fieldnote_core::types::{Extraction, MedicationRecord, Route, Timestamp, VitalKind, VitalRecord};

/// Up to 20 non-digit characters between trigger and number, never crossing a
/// `.` or `;` clause break.
const GAP: &str = r"(?P<gap>[^\d.;]{0,20}?)";

/// Above this an unlabeled temperature is read as Fahrenheit.
const CELSIUS_CEILING: f64 = 45.0;

/// Ends a reading without swallowing a glued-on unit ("88bpm", "120/80mmhg")
/// while still rejecting a longer run of digits.
const END: &str = r"(?:\D|$)";

const VERB: &str = r"\b(?:give|gave|given|administer|administered|push|pushed|start|started|bolus|begin|began)\b";
const DOSE: &str = r"(?P<amount>\d+(?:\.\d+)?)\s*(?P<unit>mcg|mg|g|units?|ml|l)\b(?P<per_kg>\s*(?:/|per)\s*kg\b)?(?:\s*(?:/|per)\s*(?P<time>min(?:ute)?|hr|hour)\b)?";
const ROUTE_TOKEN: &str = r"(?:iv|im|io|po|pr|sq|subq|sc|nebulized|neb|inhaled)";

struct VitalRule {
    kind: VitalKind,
    regex: Regex,
}

static VITAL_RULES: LazyLock<Vec<VitalRule>> = LazyLock::new(|| {
    VitalKind::ALL
        .iter()
        .map(|&kind| VitalRule { kind, regex: Regex::new(&trigger_pattern(kind)).expect("invalid vital pattern") })
        .collect()
});

/// `verb DRUG DOSE UNIT [/kg] [/min|/hr] [ROUTE]`
static DRUG_FIRST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"{VERB}\s+(?P<drug>[a-z][a-z\- ]{{1,39}}?)\s*{DOSE}(?:\s+(?:via\s+)?(?P<route>{ROUTE_TOKEN})\b)?"
    ))
    .expect("invalid medication pattern")
});

/// `verb DOSE UNIT [/kg] [/min|/hr] [ROUTE] [of] DRUG [ROUTE]`, the drug being
/// one to three words ended by a route, punctuation, end of text or a connective.
static DOSE_FIRST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"{VERB}\s+{DOSE}(?:\s+(?:via\s+)?(?P<lead_route>{ROUTE_TOKEN})\b)?\s+(?:of\s+)?(?P<drug>[a-z][a-z\-]+(?:\s+[a-z][a-z\-]+){{0,2}}?)(?:\s+(?:via\s+)?(?P<route>{ROUTE_TOKEN})\b|\s*[,.;]|\s*$|\s+(?:for|to|at|over|x|and|then|now)\b)"
    ))
    .expect("invalid medication pattern")
});

fn trigger_pattern(kind: VitalKind) -> String {
    match kind {
        VitalKind::Bp => format!(r"\b(?:bp|blood pressure)\b.*?\b(?P<sys>\d{{2,3}})\s*(?:/|over)\s*(?P<dia>\d{{2,3}}){END}"),
        // "/hr" belongs to an infusion rate, not a heart rate. `systolic` marks a
        // number that is really the start of a blood pressure.
        VitalKind::Hr => format!(
            r"(?:^|[^/\w])(?:heart rate|hr|pulse)\b{GAP}(?P<num>\d{{1,3}})(?:(?P<systolic>\s*(?:/|over)\s*\d)|\D|$)"
        ),
        VitalKind::Rr => format!(r"\b(?:rr|resp(?:iratory)? rate|resps?|respirations?|breathing rate)\b{GAP}(?P<num>\d{{1,3}}){END}"),
        VitalKind::SpO2 => format!(
            r"\b(?:spo2|sp02|o2 sat(?:uration)?s?|sats?|satting|saturation|pulse ox(?:imetry)?)\b{GAP}(?P<num>\d{{2,3}}){END}"
        ),
        VitalKind::Temp => format!(
            r"\b(?:temp|temperature|tmax)\b{GAP}(?P<num>\d{{2,3}}(?:\.\d+)?)(?:\s*(?:°|degrees?)?\s*(?P<unit>celsius|fahrenheit|c|f)\b|{END})"
        ),
        VitalKind::Gcs => format!(r"\b(?:gcs|glasgow(?: coma scale)?)\b{GAP}(?P<num>\d{{1,2}}){END}"),
        VitalKind::EtCo2 => format!(r"\b(?:etco2|end[ -]tidal(?: co2)?|capnography|capno)\b{GAP}(?P<num>\d{{1,3}}){END}"),
        VitalKind::Glucose => format!(r"\b(?:glucose|blood sugar|bgl|bg|cbg|fsbs|sugar)\b{GAP}(?P<num>\d{{1,3}}){END}"),
    }
}

/// Formats the value of one matched rule, or rejects the match.
fn render(kind: VitalKind, caps: &Captures<'_>) -> Option<String> {
    let num = caps.name("num").map(|m| m.as_str());
    match kind {
        VitalKind::Bp => Some(format!("{}/{}", &caps["sys"], &caps["dia"])),
        VitalKind::Hr => {
            let gap = caps.name("gap").map_or("", |m| m.as_str());
            // "pulse ox" is a saturation reading
            if gap.trim_start().starts_with("ox") { return None; }
            // "1 hr ago, bp 130/80": the number is a systolic
            if caps.name("systolic").is_some() { return None; }
            num.map(str::to_string)
        }
        VitalKind::SpO2 => num.map(|n| format!("{n}%")),
        VitalKind::Temp => {
            let value: f64 = num?.parse().ok()?;
            let unit = match caps.name("unit").map(|m| m.as_str()) {
                Some(u) if u.starts_with('f') => "F",
                Some(_) => "C",
                None if value > CELSIUS_CEILING => "F",
                None => "C",
            };
            Some(format!("{value:.1} {unit}"))
        }
        VitalKind::Rr | VitalKind::Gcs | VitalKind::EtCo2 | VitalKind::Glucose => num.map(str::to_string),
    }
}

impl VitalRule {
    fn first_value(&self, text: &str) -> Option<String> {
        self.regex.captures_iter(text).find_map(|caps| render(self.kind, &caps))
    }
}

/// Extracts every vital kind mentioned and the first medication administration.
pub fn extract(utterance: &str, captured_at: Timestamp) -> Extraction {
    let text = utterance.to_lowercase();
    let vitals: Vec<VitalRecord> = VITAL_RULES
        .iter()
        .filter_map(|rule| rule.first_value(&text).map(|value| VitalRecord { kind: rule.kind, value, captured_at }))
        .collect();
    let medication = extract_medication(&text, captured_at);
    tracing::debug!(vitals = vitals.len(), medication = medication.is_some(), "extracted utterance");
    Extraction { vitals, medication }
}

/// Only the earliest administration in the utterance is kept.
fn extract_medication(text: &str, captured_at: Timestamp) -> Option<MedicationRecord> {
    let caps = match (DRUG_FIRST.captures(text), DOSE_FIRST.captures(text)) {
        (Some(a), Some(b)) => {
            if b.get(0)?.start() < a.get(0)?.start() { b } else { a }
        }
        (Some(a), None) => a,
        (None, Some(b)) => b,
        (None, None) => return None,
    };

    let mut dose = format!("{} {}", &caps["amount"], &caps["unit"]);
    if caps.name("per_kg").is_some() { dose.push_str("/kg"); }
    let rate = caps.name("time").map(|t| {
        let per = if t.as_str().starts_with('m') { "min" } else { "hr" };
        format!("{dose}/{per}")
    });

    Some(MedicationRecord {
        drug: caps["drug"].trim().to_string(),
        dose,
        route: caps.name("route").or_else(|| caps.name("lead_route")).and_then(|r| Route::from_token(r.as_str())),
        rate,
        captured_at,
    })
}

/// [`extract`] behind the core extractor trait.
#[derive(Debug, Default, Clone, Copy)]
pub struct ClinicalExtractor;

impl UtteranceExtractor for ClinicalExtractor {
    fn extract(&self, utterance: &str, captured_at: Timestamp) -> Extraction {
        extract(utterance, captured_at)
    }
}
