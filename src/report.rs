//! Report aggregation over a batch's summary records.
//!
//! [`compile`] is a pure function: no I/O, no mutation of its input, and
//! idempotent over the same record list. Rendering to text or TSV is
//! separate so the aggregation stays trivially testable.

use serde::Serialize;

use crate::types::summary::SummaryRecord;

/// Aggregated view of one batch.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    /// Total records consumed.
    pub total: usize,

    /// Records with `failed == false`.
    pub success_count: usize,

    /// Records with `failed == true`.
    pub failed_count: usize,

    /// Mean fit score over successful records, rounded to 2 decimals.
    /// 0.0 when there are no successes.
    pub average_fit_score: f64,

    /// Successful records with fit score >= 4.
    pub high_fit: usize,

    /// Successful records with 2 <= fit score < 4.
    pub medium_fit: usize,

    /// Successful records with fit score == 1.
    pub low_fit: usize,

    /// Failed records (unreachable, not a posting, errors).
    pub unreachable: usize,

    /// Successful records, stably sorted by fit score descending.
    pub sorted_successful: Vec<SummaryRecord>,

    /// Failed records, in input order.
    pub failures: Vec<SummaryRecord>,
}

/// Compile summary statistics over a batch's records.
pub fn compile(records: &[SummaryRecord]) -> Report {
    let mut successful: Vec<SummaryRecord> =
        records.iter().filter(|r| !r.failed).cloned().collect();
    let failures: Vec<SummaryRecord> = records.iter().filter(|r| r.failed).cloned().collect();

    let average_fit_score = if successful.is_empty() {
        0.0
    } else {
        let sum: u32 = successful.iter().map(|r| u32::from(r.fit_score)).sum();
        round2(f64::from(sum) / successful.len() as f64)
    };

    let high_fit = successful.iter().filter(|r| r.fit_score >= 4).count();
    let medium_fit = successful
        .iter()
        .filter(|r| (2..4).contains(&r.fit_score))
        .count();
    let low_fit = successful
        .iter()
        .filter(|r| (1..2).contains(&r.fit_score))
        .count();

    // Stable sort: ties keep their input order.
    successful.sort_by(|a, b| b.fit_score.cmp(&a.fit_score));

    Report {
        total: records.len(),
        success_count: successful.len(),
        failed_count: failures.len(),
        average_fit_score,
        high_fit,
        medium_fit,
        low_fit,
        unreachable: failures.len(),
        sorted_successful: successful,
        failures,
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

impl Report {
    /// Render the human-readable screening report.
    ///
    /// Successful postings ranked by fit score, then a clearly separated
    /// failures section, then the summary statistics.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let rule = "=".repeat(60);

        out.push_str(&rule);
        out.push_str("\nJOB SCREENING REPORT\n");
        out.push_str(&format!(
            "Generated: {}\n",
            chrono::Utc::now().format("%Y-%m-%d %H:%M UTC")
        ));
        out.push_str(&rule);
        out.push('\n');

        for (i, record) in self.sorted_successful.iter().enumerate() {
            out.push_str(&format!(
                "\n#{rank} [{score}/5] {title} at {company}\n    {url}\n    {reason}\n",
                rank = i + 1,
                score = record.fit_score,
                title = record.title,
                company = record.company,
                url = record.url,
                reason = record.reason,
            ));
        }

        if !self.failures.is_empty() {
            out.push('\n');
            out.push_str(&rule);
            out.push_str("\nFAILURES\n");
            out.push_str(&rule);
            out.push('\n');
            for record in &self.failures {
                out.push_str(&format!(
                    "\n- {url}\n    {error}\n",
                    url = record.url,
                    error = record.error_message.as_deref().unwrap_or("unknown error"),
                ));
            }
        }

        out.push('\n');
        out.push_str(&rule);
        out.push('\n');
        out.push_str(&format!("Total jobs processed:    {}\n", self.total));
        out.push_str(&format!("Successful screenings:   {}\n", self.success_count));
        out.push_str(&format!("Failed screenings:       {}\n", self.failed_count));
        out.push_str(&format!(
            "Average fit score:       {:.2}\n",
            self.average_fit_score
        ));
        out.push_str(&format!("High fit jobs (4-5):     {}\n", self.high_fit));
        out.push_str(&format!("Medium fit jobs (2-3):   {}\n", self.medium_fit));
        out.push_str(&format!("Low fit jobs (1):        {}\n", self.low_fit));
        out.push_str(&format!("Unreachable/failed:      {}\n", self.unreachable));
        out
    }

    /// Render all records as TSV, successes first (ranked), failures after.
    pub fn render_tsv(&self) -> String {
        let mut out = String::from("url\tcompany\ttitle\tfit_score\tfailed\treason\n");
        for record in self.sorted_successful.iter().chain(&self.failures) {
            out.push_str(&format!(
                "{}\t{}\t{}\t{}\t{}\t{}\n",
                record.url,
                record.company,
                record.title,
                record.fit_score,
                record.failed,
                sanitize_tsv(if record.failed {
                    record.error_message.as_deref().unwrap_or("")
                } else {
                    &record.reason
                }),
            ));
        }
        out
    }
}

fn sanitize_tsv(field: &str) -> String {
    field.replace(['\t', '\n'], " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn success(url: &str, score: u8) -> SummaryRecord {
        SummaryRecord {
            url: url.to_string(),
            company: "Acme".into(),
            title: "Engineer".into(),
            fit_score: score,
            reason: format!("scored {score}"),
            failed: false,
            error_message: None,
        }
    }

    fn failure(url: &str) -> SummaryRecord {
        SummaryRecord::failure(url, "unreachable")
    }

    #[test]
    fn empty_input_yields_zeroed_report() {
        let report = compile(&[]);
        assert_eq!(report.total, 0);
        assert_eq!(report.average_fit_score, 0.0);
        assert_eq!(report.high_fit, 0);
        assert_eq!(report.medium_fit, 0);
        assert_eq!(report.low_fit, 0);
        assert_eq!(report.unreachable, 0);
    }

    #[test]
    fn counts_partition_the_input() {
        let records = vec![
            success("https://a.test", 5),
            failure("https://b.test"),
            success("https://c.test", 2),
        ];
        let report = compile(&records);
        assert_eq!(report.success_count + report.failed_count, records.len());
        assert_eq!(report.success_count, 2);
        assert_eq!(report.unreachable, 1);
    }

    #[test]
    fn average_is_rounded_to_two_decimals() {
        let records = vec![
            success("https://a.test", 5),
            success("https://b.test", 4),
            success("https://c.test", 4),
        ];
        // 13 / 3 = 4.3333...
        assert_eq!(compile(&records).average_fit_score, 4.33);
    }

    #[test]
    fn sorting_is_descending_and_stable() {
        let records = vec![
            success("https://a.test", 2),
            success("https://b.test", 4),
            success("https://c.test", 2),
            success("https://d.test", 5),
        ];
        let report = compile(&records);
        let order: Vec<_> = report
            .sorted_successful
            .iter()
            .map(|r| r.url.as_str())
            .collect();
        // Ties (a, c) keep their input order.
        assert_eq!(
            order,
            vec!["https://d.test", "https://b.test", "https://a.test", "https://c.test"]
        );
    }

    #[test]
    fn histogram_buckets_match_score_ranges() {
        let records = vec![
            success("https://a.test", 5),
            success("https://b.test", 4),
            success("https://c.test", 3),
            success("https://d.test", 2),
            success("https://e.test", 1),
            failure("https://f.test"),
        ];
        let report = compile(&records);
        assert_eq!(report.high_fit, 2);
        assert_eq!(report.medium_fit, 2);
        assert_eq!(report.low_fit, 1);
        assert_eq!(report.unreachable, 1);
    }

    #[test]
    fn compile_is_idempotent() {
        let records = vec![
            success("https://a.test", 3),
            failure("https://b.test"),
            success("https://c.test", 5),
        ];
        let first = serde_json::to_string(&compile(&records)).unwrap();
        let second = serde_json::to_string(&compile(&records)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn text_report_separates_failures() {
        let report = compile(&[success("https://a.test", 4), failure("https://b.test")]);
        let text = report.render_text();
        assert!(text.contains("JOB SCREENING REPORT"));
        assert!(text.contains("FAILURES"));
        assert!(text.contains("https://b.test"));
        assert!(text.contains("unreachable"));
    }

    #[test]
    fn tsv_flattens_embedded_tabs_and_newlines() {
        let mut record = success("https://a.test", 4);
        record.reason = "line one\nline\ttwo".into();
        let tsv = compile(&[record]).render_tsv();
        let data_line = tsv.lines().nth(1).unwrap();
        assert_eq!(data_line.split('\t').count(), 6);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn arb_record() -> impl Strategy<Value = SummaryRecord> {
            (any::<bool>(), 0u8..=5, "[a-z]{1,8}").prop_map(|(failed, score, slug)| {
                SummaryRecord {
                    url: format!("https://{slug}.test/job"),
                    company: slug.clone(),
                    title: "role".into(),
                    fit_score: if failed { 0 } else { score },
                    reason: "r".into(),
                    failed,
                    error_message: failed.then(|| "err".to_string()),
                }
            })
        }

        proptest! {
            #[test]
            fn counts_always_partition(records in prop::collection::vec(arb_record(), 0..40)) {
                let report = compile(&records);
                prop_assert_eq!(report.success_count + report.failed_count, records.len());
                prop_assert_eq!(report.failed_count, report.unreachable);
            }

            #[test]
            fn sorted_successful_is_monotonic(records in prop::collection::vec(arb_record(), 0..40)) {
                let report = compile(&records);
                for pair in report.sorted_successful.windows(2) {
                    prop_assert!(pair[0].fit_score >= pair[1].fit_score);
                }
            }

            #[test]
            fn average_is_bounded(records in prop::collection::vec(arb_record(), 0..40)) {
                let report = compile(&records);
                prop_assert!(report.average_fit_score >= 0.0);
                prop_assert!(report.average_fit_score <= 5.0);
            }
        }
    }
}
