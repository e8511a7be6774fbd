//! Sampler run report and mutable report builder.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use irlkit_io_xlsx::SpecXlsxReport;

/// Aggregate counters and diagnostics for one `run_sampler` call.
#[derive(Debug, Default, Clone)]
pub struct ReportSampler {
    /// Client name read from the inventory.
    pub client_name: String,
    /// Audit type token.
    pub audit_type: String,
    /// Platform groups read.
    pub cnt_platforms: u64,
    /// Host entries read.
    pub cnt_hosts: u64,
    /// Record handles allocated.
    pub cnt_records: u64,
    /// Records without content.
    pub cnt_records_empty: u64,
    /// Request list data rows written.
    pub cnt_request_rows: u64,
    /// Tracking grid reference rows written.
    pub cnt_references: u64,
    /// Tracking cells marked not applicable.
    pub cnt_not_applicable: u64,
    /// Output workbooks written, in write order.
    pub files_written: Vec<PathBuf>,
    /// Non-fatal warnings from grid building and workbook writing.
    pub warnings: Vec<String>,
}

impl ReportSampler {
    /// Number of collected warnings.
    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    /// Machine-readable counters.
    pub fn to_dict(&self) -> BTreeMap<String, u64> {
        let mut dict_counts = BTreeMap::new();
        dict_counts.insert("cnt_platforms".to_string(), self.cnt_platforms);
        dict_counts.insert("cnt_hosts".to_string(), self.cnt_hosts);
        dict_counts.insert("cnt_records".to_string(), self.cnt_records);
        dict_counts.insert("cnt_records_empty".to_string(), self.cnt_records_empty);
        dict_counts.insert("cnt_request_rows".to_string(), self.cnt_request_rows);
        dict_counts.insert("cnt_references".to_string(), self.cnt_references);
        dict_counts.insert("cnt_not_applicable".to_string(), self.cnt_not_applicable);
        dict_counts.insert("cnt_warnings".to_string(), self.warning_count() as u64);
        dict_counts
    }

    /// Human-readable one-line summary.
    pub fn format(&self, prefix: &str) -> String {
        let dict_counts = self.to_dict();
        format!(
            "{prefix} client={:?} audit={} platforms={} hosts={} records={} empty={} requests={} references={} na={} warnings={}",
            self.client_name,
            self.audit_type,
            dict_counts["cnt_platforms"],
            dict_counts["cnt_hosts"],
            dict_counts["cnt_records"],
            dict_counts["cnt_records_empty"],
            dict_counts["cnt_request_rows"],
            dict_counts["cnt_references"],
            dict_counts["cnt_not_applicable"],
            dict_counts["cnt_warnings"]
        )
    }
}

impl fmt::Display for ReportSampler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format("[SAMPLER]"))
    }
}

/// Mutable accumulator for run statistics.
#[derive(Debug, Default, Clone)]
pub struct ReportSamplerBuilder {
    report: ReportSampler,
}

impl ReportSamplerBuilder {
    /// Record the audit context.
    pub fn set_context(&mut self, client_name: &str, audit_type: &str) {
        self.report.client_name = client_name.to_string();
        self.report.audit_type = audit_type.to_string();
    }

    /// Increment one or more named counters by `value`.
    ///
    /// Unknown names are ignored.
    pub fn add_counts(&mut self, field_names: &[&str], value: u64) {
        for field_name in field_names {
            match *field_name {
                "cnt_platforms" => self.report.cnt_platforms += value,
                "cnt_hosts" => self.report.cnt_hosts += value,
                "cnt_records" => self.report.cnt_records += value,
                "cnt_records_empty" => self.report.cnt_records_empty += value,
                "cnt_request_rows" => self.report.cnt_request_rows += value,
                "cnt_references" => self.report.cnt_references += value,
                "cnt_not_applicable" => self.report.cnt_not_applicable += value,
                _ => {}
            }
        }
    }

    /// Add warning message.
    pub fn add_warning(&mut self, warning: String) {
        self.report.warnings.push(warning);
    }

    /// Record one written workbook and its writer warnings.
    pub fn add_written(&mut self, path: PathBuf, report_xlsx: SpecXlsxReport) {
        self.report.files_written.push(path);
        self.report.warnings.extend(report_xlsx.warnings);
    }

    /// Finalize builder into immutable report.
    pub fn build(self) -> ReportSampler {
        self.report
    }
}

/// Fold per-sheet writer reports into one.
pub fn merge_xlsx_reports(l_reports: Vec<SpecXlsxReport>) -> SpecXlsxReport {
    let mut report = SpecXlsxReport::default();
    for sub in l_reports {
        report.sheets.extend(sub.sheets);
        report.warnings.extend(sub.warnings);
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_sampler_format_lists_every_counter() {
        let mut builder = ReportSamplerBuilder::default();
        builder.set_context("Acme", "PCI");
        builder.add_counts(&["cnt_platforms"], 2);
        builder.add_counts(&["cnt_hosts", "cnt_records"], 3);
        builder.add_counts(&["cnt_unknown"], 9);
        builder.add_warning("w".to_string());
        let report = builder.build();

        let txt = report.format("[SAMPLER]");
        assert_eq!(
            txt,
            "[SAMPLER] client=\"Acme\" audit=PCI platforms=2 hosts=3 records=3 empty=0 requests=0 references=0 na=0 warnings=1"
        );
        assert_eq!(report.to_string(), txt);
        assert_eq!(report.to_dict()["cnt_warnings"], 1);
    }

    #[test]
    fn merge_xlsx_reports_keeps_sheet_order() {
        let mut first = SpecXlsxReport::default();
        first.warn("a");
        let mut second = SpecXlsxReport::default();
        second.warn("b");

        let merged = merge_xlsx_reports(vec![first, second]);
        assert_eq!(merged.warnings, vec!["a".to_string(), "b".to_string()]);
    }
}
