//! fieldnote-clinical
//!
//! Rule-based extraction of vitals and medication administrations from
//! spoken/typed field notes, plus the drip-rate calculators.
pub mod extract;
pub mod infusion;

pub use extract::{extract, ClinicalExtractor};
