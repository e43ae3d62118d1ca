//! Keyword extraction of symptom flags from free text.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

use crate::models::{Symptom, SymptomFlags};

const KEYWORDS: [(Symptom, &[&str]); 5] = [
    (
        Symptom::Cough,
        &[r"\btosse(m|s)?\b", r"\btossindo\b", r"\bcof\b"],
    ),
    (
        Symptom::Fatigue,
        &[
            r"\bfadiga\b",
            r"\bcansac[oa]\b",
            r"\bexaust[ao]\b",
            r"\bprostrac?ao\b",
        ],
    ),
    (
        Symptom::ExcessiveThirst,
        &[r"\bsede\b", r"\bpolidips?ia\b", r"\bmuita sede\b"],
    ),
    (
        Symptom::Vomiting,
        &[r"\bvomit(o|os|ou|ando)?\b", r"\benjoo\b", r"\bnauseas?\b"],
    ),
    (
        Symptom::Breathlessness,
        &[
            r"\bfalta de ar\b",
            r"\bdificuldade para? respirar\b",
            r"\bdispneia?\b",
            r"\bchiado\b",
            r"\bsufoc[oa]\b",
        ],
    ),
];

static PATTERNS: Lazy<Vec<(Symptom, Vec<Regex>)>> = Lazy::new(|| {
    KEYWORDS
        .iter()
        .map(|(symptom, patterns)| {
            let compiled = patterns
                .iter()
                .map(|pattern| Regex::new(pattern).expect("symptom keyword pattern compiles"))
                .collect();
            (*symptom, compiled)
        })
        .collect()
});

/// Canonical decomposition, non-ASCII dropped, lower-cased.
pub fn normalize(text: &str) -> String {
    text.nfd()
        .filter(char::is_ascii)
        .collect::<String>()
        .to_ascii_lowercase()
}

/// Absent, empty and whitespace-only text all yield no flags.
pub fn extract_flags(text: Option<&str>) -> SymptomFlags {
    let mut flags = SymptomFlags::default();
    let Some(text) = text.filter(|text| !text.trim().is_empty()) else {
        return flags;
    };

    let normalized = normalize(text);
    for (symptom, patterns) in PATTERNS.iter() {
        if patterns.iter().any(|pattern| pattern.is_match(&normalized)) {
            flags.set(*symptom, true);
        }
    }
    flags
}
