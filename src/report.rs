use std::fmt::Write;

use chrono::{DateTime, Utc};

use crate::batch::BatchOutcome;
use crate::models::LabelSummary;

/// Counts how often each label came out on top, with its mean probability.
pub fn summarize_by_label(outcomes: &[BatchOutcome]) -> Vec<LabelSummary> {
    let mut map: std::collections::BTreeMap<String, (usize, f64)> =
        std::collections::BTreeMap::new();

    for outcome in outcomes {
        let Ok(prediction) = &outcome.result else {
            continue;
        };
        if let Some(best) = prediction.best() {
            let entry = map.entry(best.label.clone()).or_insert((0, 0.0));
            entry.0 += 1;
            entry.1 += best.prob;
        }
    }

    let mut summaries: Vec<LabelSummary> = map
        .into_iter()
        .map(|(label, (count, total_probability))| LabelSummary {
            label,
            count,
            avg_probability: if count == 0 {
                0.0
            } else {
                total_probability / count as f64
            },
        })
        .collect();

    summaries.sort_by(|a, b| b.count.cmp(&a.count));
    summaries
}

pub fn build_report(
    source: &str,
    generated_at: DateTime<Utc>,
    classes: &[String],
    outcomes: &[BatchOutcome],
    limit: usize,
) -> String {
    let summaries = summarize_by_label(outcomes);
    let rejected: Vec<&BatchOutcome> =
        outcomes.iter().filter(|o| o.result.is_err()).collect();

    let mut output = String::new();

    let _ = writeln!(output, "# Diagnosis Batch Report");
    let _ = writeln!(
        output,
        "Generated {} from {} ({} cases, {} rejected)",
        generated_at.format("%Y-%m-%d %H:%M UTC"),
        source,
        outcomes.len(),
        rejected.len()
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Model Labels");
    let _ = writeln!(output, "{}", classes.join(", "));

    let _ = writeln!(output);
    let _ = writeln!(output, "## Top Diagnosis Mix");

    if summaries.is_empty() {
        let _ = writeln!(output, "No cases scored.");
    } else {
        for summary in summaries.iter() {
            let _ = writeln!(
                output,
                "- {}: {} cases (avg confidence {:.0}%)",
                summary.label,
                summary.count,
                summary.avg_probability * 100.0
            );
        }
    }

    let mut confident: Vec<&BatchOutcome> =
        outcomes.iter().filter(|o| o.result.is_ok()).collect();
    confident.sort_by(|a, b| best_probability(b).total_cmp(&best_probability(a)));
    let _ = writeln!(output);
    let _ = writeln!(output, "## Most Confident Cases");

    if confident.is_empty() {
        let _ = writeln!(output, "No cases scored.");
    } else {
        for outcome in confident.iter().take(limit) {
            if let Ok(prediction) = &outcome.result {
                let top: Vec<String> = prediction
                    .top3()
                    .iter()
                    .map(|entry| format!("{} {:.0}%", entry.label, entry.prob * 100.0))
                    .collect();
                let _ = writeln!(output, "- {}: {}", outcome.case_id, top.join(", "));
            }
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Rejected Cases");

    if rejected.is_empty() {
        let _ = writeln!(output, "No rejected cases.");
    } else {
        for outcome in rejected {
            if let Err(err) = &outcome.result {
                let _ = writeln!(output, "- {}: {}", outcome.case_id, err);
            }
        }
    }

    output
}

fn best_probability(outcome: &BatchOutcome) -> f64 {
    match &outcome.result {
        Ok(prediction) => prediction.best().map_or(0.0, |entry| entry.prob),
        Err(_) => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use crate::models::{LabelProbability, RankedPrediction};
    use chrono::TimeZone;

    fn scored(case_id: &str, entries: &[(&str, f64)]) -> BatchOutcome {
        BatchOutcome {
            case_id: case_id.to_string(),
            result: Ok(RankedPrediction {
                ranking: entries
                    .iter()
                    .map(|(label, prob)| LabelProbability {
                        label: label.to_string(),
                        prob: *prob,
                    })
                    .collect(),
            }),
        }
    }

    fn rejected(case_id: &str) -> BatchOutcome {
        BatchOutcome {
            case_id: case_id.to_string(),
            result: Err(ValidationError::Missing { field: "age" }),
        }
    }

    #[test]
    fn summarizes_top_labels() {
        let outcomes = vec![
            scored("a", &[("Flu", 0.6), ("Pneumonia", 0.4)]),
            scored("b", &[("Flu", 0.8), ("Pneumonia", 0.2)]),
            scored("c", &[("Pneumonia", 0.9), ("Flu", 0.1)]),
            rejected("d"),
        ];

        let summaries = summarize_by_label(&outcomes);
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].label, "Flu");
        assert_eq!(summaries[0].count, 2);
        assert!((summaries[0].avg_probability - 0.7).abs() < 1e-9);
        assert_eq!(summaries[1].label, "Pneumonia");
    }

    #[test]
    fn report_lists_confident_and_rejected_cases() {
        let outcomes = vec![
            scored("low", &[("Flu", 0.55), ("Dehydration", 0.45)]),
            scored("high", &[("Pneumonia", 0.92), ("Flu", 0.08)]),
            rejected("bad-row"),
        ];
        let classes = vec![
            "Dehydration".to_string(),
            "Flu".to_string(),
            "Pneumonia".to_string(),
        ];
        let generated_at = Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).unwrap();

        let report = build_report("cases.csv", generated_at, &classes, &outcomes, 10);

        assert!(report.starts_with("# Diagnosis Batch Report"));
        let header = "Generated 2026-03-01 09:30 UTC from cases.csv (3 cases, 1 rejected)";
        assert!(report.contains(header));
        assert!(report.contains("Dehydration, Flu, Pneumonia"));
        assert!(report.contains("- Flu: 1 cases (avg confidence 55%)"));
        assert!(report.contains("- bad-row: missing required field `age`"));

        let high = report.find("- high: Pneumonia 92%").unwrap();
        let low = report.find("- low: Flu 55%").unwrap();
        assert!(high < low);
    }

    #[test]
    fn empty_batch_still_renders() {
        let generated_at = Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).unwrap();
        let report = build_report("empty.csv", generated_at, &[], &[], 5);
        assert!(report.contains("No cases scored."));
        assert!(report.contains("No rejected cases."));
    }
}
