//! Validation of loosely typed requests into a [`FeatureVector`].

use serde::Deserialize;
use serde_json::Value;

use crate::error::ValidationError;
use crate::extract;
use crate::models::{FeatureVector, Sex, Symptom, SymptomFlags, Vitals};

/// Request as it arrives from a JSON body or a CSV row. The Portuguese form
/// keys are accepted as aliases.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawRequest {
    #[serde(default, alias = "idade")]
    pub age: Option<Value>,
    #[serde(default, alias = "sexo")]
    pub sex: Option<Value>,
    #[serde(default, alias = "temperatura")]
    pub temperature: Option<Value>,
    #[serde(default, alias = "frequencia_cardiaca")]
    pub heart_rate: Option<Value>,
    #[serde(default, alias = "pressao_sistolica")]
    pub systolic_bp: Option<Value>,
    #[serde(default, alias = "pressao_diastolica")]
    pub diastolic_bp: Option<Value>,
    #[serde(default, alias = "saturacao")]
    pub saturation: Option<Value>,
    #[serde(default, alias = "tosse")]
    pub cough: Option<Value>,
    #[serde(default, alias = "fadiga")]
    pub fatigue: Option<Value>,
    #[serde(default, alias = "sede_excessiva")]
    pub excessive_thirst: Option<Value>,
    #[serde(default, alias = "vomitos")]
    pub vomiting: Option<Value>,
    #[serde(default, alias = "falta_ar")]
    pub breathlessness: Option<Value>,
    #[serde(default, alias = "sintomas_texto")]
    pub symptoms_text: Option<Value>,
}

impl RawRequest {
    pub fn from_json(payload: &str) -> Result<Self, ValidationError> {
        serde_json::from_str(payload)
            .map_err(|err| ValidationError::Payload(err.to_string()))
    }

    fn checkbox(&self, symptom: Symptom) -> Option<&Value> {
        match symptom {
            Symptom::Cough => self.cough.as_ref(),
            Symptom::Fatigue => self.fatigue.as_ref(),
            Symptom::ExcessiveThirst => self.excessive_thirst.as_ref(),
            Symptom::Vomiting => self.vomiting.as_ref(),
            Symptom::Breathlessness => self.breathlessness.as_ref(),
        }
    }
}

pub fn assemble(request: &RawRequest) -> Result<FeatureVector, ValidationError> {
    let vitals = Vitals {
        age: require_int("age", request.age.as_ref())?,
        sex: require_sex(request.sex.as_ref())?,
        temperature: require_float("temperature", request.temperature.as_ref())?,
        heart_rate: require_int("heart_rate", request.heart_rate.as_ref())?,
        systolic_bp: require_int("systolic_bp", request.systolic_bp.as_ref())?,
        diastolic_bp: require_int("diastolic_bp", request.diastolic_bp.as_ref())?,
        saturation: require_int("saturation", request.saturation.as_ref())?,
    };

    let mut checkboxes = SymptomFlags::default();
    for symptom in Symptom::ALL {
        checkboxes.set(
            symptom,
            optional_flag(symptom.key(), request.checkbox(symptom))?,
        );
    }

    let text = optional_text("symptoms_text", request.symptoms_text.as_ref())?;
    let symptoms = checkboxes.merge(extract::extract_flags(text.as_deref()));

    Ok(FeatureVector { vitals, symptoms })
}

fn present<'a>(
    field: &'static str,
    value: Option<&'a Value>,
) -> Result<&'a Value, ValidationError> {
    match value {
        None | Some(Value::Null) => Err(ValidationError::Missing { field }),
        Some(value) => Ok(value),
    }
}

fn malformed(field: &'static str, expected: &'static str, value: &Value) -> ValidationError {
    ValidationError::Malformed {
        field,
        expected,
        value: value.to_string(),
    }
}

fn require_int(field: &'static str, value: Option<&Value>) -> Result<i32, ValidationError> {
    let value = present(field, value)?;
    let wide = match value {
        Value::Number(number) => match number.as_i64() {
            Some(int) => int,
            None => integral(field, value, number.as_f64())?,
        },
        Value::String(text) => {
            let text = text.trim();
            match text.parse::<i64>() {
                Ok(int) => int,
                Err(_) => integral(field, value, text.parse::<f64>().ok())?,
            }
        }
        _ => return Err(malformed(field, "integer", value)),
    };

    i32::try_from(wide).map_err(|_| ValidationError::OutOfRange {
        field,
        value: value.to_string(),
    })
}

fn integral(
    field: &'static str,
    value: &Value,
    float: Option<f64>,
) -> Result<i64, ValidationError> {
    match float {
        Some(float) if !float.is_finite() || float.abs() > i64::MAX as f64 => {
            Err(ValidationError::OutOfRange {
                field,
                value: value.to_string(),
            })
        }
        Some(float) if float.fract() == 0.0 => Ok(float as i64),
        _ => Err(malformed(field, "integer", value)),
    }
}

fn require_float(field: &'static str, value: Option<&Value>) -> Result<f64, ValidationError> {
    let value = present(field, value)?;
    let float = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }
    .ok_or_else(|| malformed(field, "number", value))?;

    if float.is_finite() {
        Ok(float)
    } else {
        Err(ValidationError::OutOfRange {
            field,
            value: value.to_string(),
        })
    }
}

fn require_sex(value: Option<&Value>) -> Result<Sex, ValidationError> {
    match present("sex", value)? {
        Value::String(label) => Ok(Sex::from_label(label)),
        other => Err(malformed("sex", "string", other)),
    }
}

fn optional_flag(field: &'static str, value: Option<&Value>) -> Result<bool, ValidationError> {
    let Some(value) = value else {
        return Ok(false);
    };
    match value {
        Value::Null => Ok(false),
        Value::Bool(flag) => Ok(*flag),
        Value::Number(number) => match number.as_i64() {
            Some(int) => Ok(int != 0),
            None => Err(malformed(field, "flag", value)),
        },
        Value::String(text) => match text.trim().to_ascii_lowercase().as_str() {
            "" | "0" | "false" => Ok(false),
            "1" | "true" => Ok(true),
            _ => Err(malformed(field, "flag", value)),
        },
        _ => Err(malformed(field, "flag", value)),
    }
}

fn optional_text(
    field: &'static str,
    value: Option<&Value>,
) -> Result<Option<String>, ValidationError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) => Ok(Some(text.clone())),
        Some(Value::Number(number)) => Ok(Some(number.to_string())),
        Some(Value::Bool(flag)) => Ok(Some(flag.to_string())),
        Some(other) => Err(malformed(field, "string", other)),
    }
}
