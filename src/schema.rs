//! Ordered feature schema shared by the generator, the assembler, corpus
//! export and the classifier. Positions in a feature row are defined here and
//! nowhere else.

use crate::models::Symptom;

/// Bumped whenever a feature is added, removed or reordered.
pub const SCHEMA_VERSION: u32 = 1;

pub const FEATURE_COUNT: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    Age,
    Sex,
    Temperature,
    HeartRate,
    SystolicBp,
    DiastolicBp,
    Saturation,
    Symptom(Symptom),
}

pub const FEATURE_SCHEMA: [Feature; FEATURE_COUNT] = [
    Feature::Age,
    Feature::Sex,
    Feature::Temperature,
    Feature::HeartRate,
    Feature::SystolicBp,
    Feature::DiastolicBp,
    Feature::Saturation,
    Feature::Symptom(Symptom::Cough),
    Feature::Symptom(Symptom::Fatigue),
    Feature::Symptom(Symptom::ExcessiveThirst),
    Feature::Symptom(Symptom::Vomiting),
    Feature::Symptom(Symptom::Breathlessness),
];

impl Feature {
    pub fn name(self) -> &'static str {
        match self {
            Feature::Age => "age",
            Feature::Sex => "sex",
            Feature::Temperature => "temperature",
            Feature::HeartRate => "heart_rate",
            Feature::SystolicBp => "systolic_bp",
            Feature::DiastolicBp => "diastolic_bp",
            Feature::Saturation => "saturation",
            Feature::Symptom(symptom) => symptom.key(),
        }
    }
}

pub fn feature_names() -> [&'static str; FEATURE_COUNT] {
    FEATURE_SCHEMA.map(Feature::name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_lists_vitals_before_symptoms() {
        assert_eq!(
            feature_names(),
            [
                "age",
                "sex",
                "temperature",
                "heart_rate",
                "systolic_bp",
                "diastolic_bp",
                "saturation",
                "cough",
                "fatigue",
                "excessive_thirst",
                "vomiting",
                "breathlessness",
            ]
        );
    }

    #[test]
    fn every_symptom_has_a_slot() {
        let position = |wanted: Feature| FEATURE_SCHEMA.iter().position(|f| *f == wanted);
        for symptom in Symptom::ALL {
            let slot = position(Feature::Symptom(symptom)).unwrap();
            assert!(slot >= 7 && slot < FEATURE_COUNT);
        }
        assert_eq!(position(Feature::Saturation), Some(6));
    }
}
