use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::schema::{Feature, FEATURE_COUNT, FEATURE_SCHEMA};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Symptom {
    Cough,
    Fatigue,
    ExcessiveThirst,
    Vomiting,
    Breathlessness,
}

impl Symptom {
    pub const ALL: [Symptom; 5] = [
        Symptom::Cough,
        Symptom::Fatigue,
        Symptom::ExcessiveThirst,
        Symptom::Vomiting,
        Symptom::Breathlessness,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Symptom::Cough => "cough",
            Symptom::Fatigue => "fatigue",
            Symptom::ExcessiveThirst => "excessive_thirst",
            Symptom::Vomiting => "vomiting",
            Symptom::Breathlessness => "breathlessness",
        }
    }
}

/// Binary sex code as the model sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sex {
    Female,
    Male,
}

impl Sex {
    pub const MALE_LABEL: &'static str = "Masculino";

    /// Exact match on the recognized label; anything else is the other code.
    pub fn from_label(label: &str) -> Self {
        if label == Self::MALE_LABEL {
            Sex::Male
        } else {
            Sex::Female
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Sex::Female => 0,
            Sex::Male => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vitals {
    pub age: i32,
    pub sex: Sex,
    pub temperature: f64,
    pub heart_rate: i32,
    pub systolic_bp: i32,
    pub diastolic_bp: i32,
    pub saturation: i32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SymptomFlags {
    pub cough: bool,
    pub fatigue: bool,
    pub excessive_thirst: bool,
    pub vomiting: bool,
    pub breathlessness: bool,
}

impl SymptomFlags {
    pub fn get(&self, symptom: Symptom) -> bool {
        match symptom {
            Symptom::Cough => self.cough,
            Symptom::Fatigue => self.fatigue,
            Symptom::ExcessiveThirst => self.excessive_thirst,
            Symptom::Vomiting => self.vomiting,
            Symptom::Breathlessness => self.breathlessness,
        }
    }

    pub fn set(&mut self, symptom: Symptom, present: bool) {
        let slot = match symptom {
            Symptom::Cough => &mut self.cough,
            Symptom::Fatigue => &mut self.fatigue,
            Symptom::ExcessiveThirst => &mut self.excessive_thirst,
            Symptom::Vomiting => &mut self.vomiting,
            Symptom::Breathlessness => &mut self.breathlessness,
        };
        *slot = present;
    }

    /// Per-category OR. A flag raised on either side stays raised.
    pub fn merge(self, other: SymptomFlags) -> SymptomFlags {
        let mut merged = self;
        for symptom in Symptom::ALL {
            merged.set(symptom, self.get(symptom) || other.get(symptom));
        }
        merged
    }
}

impl Serialize for SymptomFlags {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Symptom::ALL.len()))?;
        for symptom in Symptom::ALL {
            map.serialize_entry(symptom.key(), &u8::from(self.get(symptom)))?;
        }
        map.end()
    }
}

/// Canonical model input, laid out by [`FEATURE_SCHEMA`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector {
    pub vitals: Vitals,
    pub symptoms: SymptomFlags,
}

impl FeatureVector {
    pub fn value(&self, feature: Feature) -> f64 {
        let vitals = &self.vitals;
        match feature {
            Feature::Age => f64::from(vitals.age),
            Feature::Sex => f64::from(vitals.sex.code()),
            Feature::Temperature => vitals.temperature,
            Feature::HeartRate => f64::from(vitals.heart_rate),
            Feature::SystolicBp => f64::from(vitals.systolic_bp),
            Feature::DiastolicBp => f64::from(vitals.diastolic_bp),
            Feature::Saturation => f64::from(vitals.saturation),
            Feature::Symptom(symptom) => {
                if self.symptoms.get(symptom) {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }

    pub fn to_row(&self) -> [f64; FEATURE_COUNT] {
        FEATURE_SCHEMA.map(|feature| self.value(feature))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelProbability {
    pub label: String,
    pub prob: f64,
}

/// Full distribution over the model's classes, most probable first.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedPrediction {
    pub ranking: Vec<LabelProbability>,
}

impl RankedPrediction {
    pub fn top(&self, k: usize) -> &[LabelProbability] {
        &self.ranking[..k.min(self.ranking.len())]
    }

    pub fn top3(&self) -> &[LabelProbability] {
        self.top(3)
    }

    pub fn best(&self) -> Option<&LabelProbability> {
        self.ranking.first()
    }

    pub fn labels(&self) -> Vec<String> {
        self.ranking.iter().map(|entry| entry.label.clone()).collect()
    }

    pub fn probabilities(&self) -> Vec<f64> {
        self.ranking.iter().map(|entry| entry.prob).collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabelSummary {
    pub label: String,
    pub count: usize,
    pub avg_probability: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum PredictionResponse {
    Success {
        ok: bool,
        classes: Vec<String>,
        probs: Vec<f64>,
        top3: Vec<LabelProbability>,
    },
    Failure {
        ok: bool,
        error: String,
    },
}

impl PredictionResponse {
    pub fn success(prediction: &RankedPrediction) -> Self {
        PredictionResponse::Success {
            ok: true,
            classes: prediction.labels(),
            probs: prediction.probabilities(),
            top3: prediction.top3().to_vec(),
        }
    }

    pub fn failure(error: impl std::fmt::Display) -> Self {
        PredictionResponse::Failure {
            ok: false,
            error: error.to_string(),
        }
    }
}
