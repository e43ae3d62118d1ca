use thiserror::Error;

/// Client-input problems found while assembling a feature vector.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("missing required field `{field}`")]
    Missing { field: &'static str },
    #[error("field `{field}` is not a valid {expected}: {value}")]
    Malformed {
        field: &'static str,
        expected: &'static str,
        value: String,
    },
    #[error("field `{field}` is out of range: {value}")]
    OutOfRange { field: &'static str, value: String },
    #[error("request payload is malformed: {0}")]
    Payload(String),
}

/// Reasons the one-time fit refuses to produce a classifier.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TrainError {
    #[error("training needs at least one case")]
    NoCases,
    #[error("an ensemble needs at least one tree")]
    EmptyEnsemble,
    #[error("training produced {found} distinct label(s); at least 2 are required")]
    DegenerateLabels { found: usize },
}
