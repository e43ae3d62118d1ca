use std::io::Read;
use std::sync::Arc;

use anyhow::Context;
use uuid::Uuid;

use crate::assemble::{self, RawRequest};
use crate::classifier::Classifier;
use crate::error::ValidationError;
use crate::models::RankedPrediction;

#[derive(Debug, Clone)]
pub struct BatchCase {
    pub case_id: String,
    pub request: RawRequest,
}

#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub case_id: String,
    pub result: Result<RankedPrediction, ValidationError>,
}

/// Reads one request per CSV row. Rows without a `case_id` get a generated one.
pub fn read_cases<R: Read>(source: R) -> anyhow::Result<Vec<BatchCase>> {
    let mut reader = csv::Reader::from_reader(source);
    let headers = reader
        .headers()
        .context("CSV input has no header row")?
        .clone();
    let id_column = headers.iter().position(|header| header == "case_id");

    let mut cases = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let row = index + 1;
        let record = record.with_context(|| format!("failed to read CSV row {row}"))?;
        let request: RawRequest = record
            .deserialize(Some(&headers))
            .with_context(|| format!("failed to decode CSV row {row}"))?;

        let case_id = id_column
            .and_then(|column| record.get(column))
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("case-{}", Uuid::new_v4()));

        cases.push(BatchCase { case_id, request });
    }

    Ok(cases)
}

/// Scores every case on the blocking pool against one shared classifier.
/// Outcomes come back in input order; invalid rows are kept, not fatal.
pub async fn score_cases(
    classifier: Arc<Classifier>,
    cases: Vec<BatchCase>,
) -> anyhow::Result<Vec<BatchOutcome>> {
    let handles: Vec<_> = cases
        .into_iter()
        .map(|case| {
            let classifier = Arc::clone(&classifier);
            tokio::task::spawn_blocking(move || BatchOutcome {
                result: assemble::assemble(&case.request)
                    .map(|features| classifier.predict(&features)),
                case_id: case.case_id,
            })
        })
        .collect();

    let mut outcomes = Vec::with_capacity(handles.len());
    for handle in handles {
        let outcome = handle.await.context("scoring task failed")?;
        if let Err(err) = &outcome.result {
            log::warn!("rejected case {}: {err}", outcome.case_id);
        }
        outcomes.push(outcome);
    }

    Ok(outcomes)
}
