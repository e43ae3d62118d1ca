use std::io::Write;

use anyhow::Context;

use crate::generator::TrainingCase;
use crate::schema::{feature_names, SCHEMA_VERSION};

/// Writes the synthetic corpus as CSV: one column per schema feature, then
/// `label`.
pub fn write_corpus<W: Write>(cases: &[TrainingCase], sink: W) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_writer(sink);

    let mut header: Vec<&str> = feature_names().to_vec();
    header.push("label");
    writer.write_record(&header)?;

    for case in cases {
        let mut record: Vec<String> = case
            .features
            .to_row()
            .iter()
            .map(|value| value.to_string())
            .collect();
        record.push(case.label.as_str().to_string());
        writer.write_record(&record)?;
    }

    writer
        .flush()
        .with_context(|| format!("failed to flush corpus (schema v{SCHEMA_VERSION})"))?;
    Ok(())
}
