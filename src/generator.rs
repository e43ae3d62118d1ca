//! Synthetic labeled corpus drawn from a fixed clinical rule.

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::models::{FeatureVector, Sex, SymptomFlags, Vitals};

const TEMPERATURE_MEAN: f64 = 36.8;
const TEMPERATURE_SD: f64 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Diagnosis {
    Type1Diabetes,
    Pneumonia,
    AsthmaCrisis,
    Hypotension,
    Dehydration,
    Flu,
}

impl Diagnosis {
    pub fn as_str(self) -> &'static str {
        match self {
            Diagnosis::Type1Diabetes => "Type 1 Diabetes",
            Diagnosis::Pneumonia => "Pneumonia",
            Diagnosis::AsthmaCrisis => "Asthma Crisis",
            Diagnosis::Hypotension => "Hypotension",
            Diagnosis::Dehydration => "Dehydration",
            Diagnosis::Flu => "Flu",
        }
    }
}

#[derive(Debug, Clone)]
pub struct TrainingCase {
    pub features: FeatureVector,
    pub label: Diagnosis,
}

/// Ground-truth rule. Branches are checked in priority order; first match wins.
pub fn diagnose(features: &FeatureVector) -> Diagnosis {
    let vitals = &features.vitals;
    let symptoms = &features.symptoms;

    if symptoms.excessive_thirst && vitals.age < 18 && vitals.temperature > 36.5 {
        Diagnosis::Type1Diabetes
    } else if symptoms.cough && symptoms.breathlessness && vitals.saturation < 93 {
        Diagnosis::Pneumonia
    } else if symptoms.breathlessness && vitals.saturation < 90 {
        Diagnosis::AsthmaCrisis
    } else if vitals.systolic_bp < 90 || vitals.diastolic_bp < 60 {
        Diagnosis::Hypotension
    } else if symptoms.vomiting && symptoms.excessive_thirst {
        Diagnosis::Dehydration
    } else {
        Diagnosis::Flu
    }
}

pub fn generate_cases(count: usize, rng: &mut StdRng) -> Vec<TrainingCase> {
    let temperature = Normal::new(TEMPERATURE_MEAN, TEMPERATURE_SD)
        .unwrap_or_else(|_| unreachable!("temperature sd is finite and positive"));

    let cases: Vec<TrainingCase> = (0..count)
        .map(|_| {
            let features = draw_features(rng, &temperature);
            TrainingCase {
                label: diagnose(&features),
                features,
            }
        })
        .collect();

    log::debug!(
        "generated {} synthetic cases: {:?}",
        cases.len(),
        label_counts(&cases)
    );
    cases
}

fn draw_features(rng: &mut StdRng, temperature: &Normal<f64>) -> FeatureVector {
    let vitals = Vitals {
        age: rng.gen_range(1..90),
        sex: if rng.gen_bool(0.5) {
            Sex::Male
        } else {
            Sex::Female
        },
        temperature: temperature.sample(rng),
        heart_rate: rng.gen_range(60..120),
        systolic_bp: rng.gen_range(90..150),
        diastolic_bp: rng.gen_range(60..100),
        saturation: rng.gen_range(85..100),
    };
    let symptoms = SymptomFlags {
        cough: rng.gen_bool(0.5),
        fatigue: rng.gen_bool(0.5),
        excessive_thirst: rng.gen_bool(0.5),
        vomiting: rng.gen_bool(0.5),
        breathlessness: rng.gen_bool(0.5),
    };
    FeatureVector { vitals, symptoms }
}

pub fn label_counts(cases: &[TrainingCase]) -> BTreeMap<&'static str, usize> {
    let mut counts = BTreeMap::new();
    for case in cases {
        *counts.entry(case.label.as_str()).or_insert(0) += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn case(age: i32, temperature: f64, saturation: i32, flags: SymptomFlags) -> FeatureVector {
        FeatureVector {
            vitals: Vitals {
                age,
                sex: Sex::Female,
                temperature,
                heart_rate: 80,
                systolic_bp: 120,
                diastolic_bp: 80,
                saturation,
            },
            symptoms: flags,
        }
    }

    fn label(age: i32, temperature: f64, saturation: i32, flags: SymptomFlags) -> Diagnosis {
        diagnose(&case(age, temperature, saturation, flags))
    }

    fn all_flags() -> SymptomFlags {
        SymptomFlags {
            cough: true,
            fatigue: true,
            excessive_thirst: true,
            vomiting: true,
            breathlessness: true,
        }
    }

    // Literal restatement of the rule chain, kept independent of `diagnose`.
    fn expected_label(features: &FeatureVector) -> &'static str {
        let v = &features.vitals;
        let s = &features.symptoms;
        if s.excessive_thirst && v.age < 18 && v.temperature > 36.5 {
            return "Type 1 Diabetes";
        }
        if s.cough && s.breathlessness && v.saturation < 93 {
            return "Pneumonia";
        }
        if s.breathlessness && v.saturation < 90 {
            return "Asthma Crisis";
        }
        if v.systolic_bp < 90 || v.diastolic_bp < 60 {
            return "Hypotension";
        }
        if s.vomiting && s.excessive_thirst {
            return "Dehydration";
        }
        "Flu"
    }

    #[test]
    fn every_generated_label_follows_the_rule_chain() {
        let mut rng = StdRng::seed_from_u64(42);
        let cases = generate_cases(400, &mut rng);
        assert_eq!(cases.len(), 400);
        for case in &cases {
            assert_eq!(case.label.as_str(), expected_label(&case.features));
        }
    }

    #[test]
    fn draws_stay_inside_their_ranges() {
        let mut rng = StdRng::seed_from_u64(7);
        for case in generate_cases(500, &mut rng) {
            let v = case.features.vitals;
            assert!((1..90).contains(&v.age));
            assert!((60..120).contains(&v.heart_rate));
            assert!((90..150).contains(&v.systolic_bp));
            assert!((60..100).contains(&v.diastolic_bp));
            assert!((85..100).contains(&v.saturation));
            assert!(v.temperature.is_finite());
        }
    }

    #[test]
    fn earlier_branches_take_priority() {
        // Matches diabetes, pneumonia, asthma and dehydration at once.
        assert_eq!(label(10, 37.2, 85, all_flags()), Diagnosis::Type1Diabetes);
        // Adult: diabetes branch no longer applies.
        assert_eq!(label(40, 37.2, 85, all_flags()), Diagnosis::Pneumonia);

        let no_cough = SymptomFlags {
            cough: false,
            ..all_flags()
        };
        assert_eq!(label(40, 37.2, 85, no_cough), Diagnosis::AsthmaCrisis);
        assert_eq!(label(40, 37.2, 95, no_cough), Diagnosis::Dehydration);
    }

    #[test]
    fn diabetes_boundaries_are_strict() {
        let thirst = SymptomFlags {
            excessive_thirst: true,
            ..SymptomFlags::default()
        };
        assert_eq!(label(17, 36.6, 98, thirst), Diagnosis::Type1Diabetes);
        assert_eq!(label(18, 36.6, 98, thirst), Diagnosis::Flu);
        assert_eq!(label(17, 36.5, 98, thirst), Diagnosis::Flu);
    }

    #[test]
    fn low_pressure_maps_to_hypotension() {
        let mut features = case(50, 36.8, 98, SymptomFlags::default());
        features.vitals.diastolic_bp = 55;
        assert_eq!(diagnose(&features), Diagnosis::Hypotension);

        features.vitals.diastolic_bp = 70;
        features.vitals.systolic_bp = 85;
        assert_eq!(diagnose(&features), Diagnosis::Hypotension);
    }

    #[test]
    fn same_seed_same_corpus() {
        let first = generate_cases(50, &mut StdRng::seed_from_u64(3));
        let second = generate_cases(50, &mut StdRng::seed_from_u64(3));
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.features, b.features);
            assert_eq!(a.label, b.label);
        }
    }

    #[test]
    fn sampled_ranges_never_reach_hypotension() {
        let cases = generate_cases(400, &mut StdRng::seed_from_u64(42));
        let counts = label_counts(&cases);
        assert!(!counts.contains_key("Hypotension"));
        assert_eq!(counts.values().sum::<usize>(), 400);
    }
}
