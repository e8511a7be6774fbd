//! Request list writer: projects request records onto the fixed upload schema.

use std::path::Path;

use irlkit_io_xlsx::{
    SpecXlsxReport, SpecXlsxSheetWriteOptions, XlsxWriter, derive_text_dataframe,
};
use polars::prelude::DataFrame;
use tracing::info;

use crate::conf::{C_DEFAULT_EVIDENCE_FORM, C_DEFAULT_POPULATION_REQUEST, C_SHEET_REQUEST_LIST};
use crate::report::merge_xlsx_reports;
use crate::spec::{SamplerError, SpecRequestArena, SpecRequestRecord};

////////////////////////////////////////////////////////////////////////////////
// #region ColumnRoles

/// Output columns of the request list, in sheet order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnumRequestListColumn {
    Title,
    Instructions,
    DueDate,
    Reference,
    PopulationRequest,
    EvidenceForm,
    RelatedSections,
    Assignee1,
    Assignee2,
    Assignee3,
    Assignee4,
    Assignee5,
    Project1,
    Project2,
    Project3,
    Project4,
    Project5,
}

impl EnumRequestListColumn {
    /// Every column in sheet order.
    pub const ALL: [EnumRequestListColumn; 17] = [
        Self::Title,
        Self::Instructions,
        Self::DueDate,
        Self::Reference,
        Self::PopulationRequest,
        Self::EvidenceForm,
        Self::RelatedSections,
        Self::Assignee1,
        Self::Assignee2,
        Self::Assignee3,
        Self::Assignee4,
        Self::Assignee5,
        Self::Project1,
        Self::Project2,
        Self::Project3,
        Self::Project4,
        Self::Project5,
    ];

    /// Header text written to row 1.
    pub fn header(self) -> &'static str {
        match self {
            Self::Title => "Title",
            Self::Instructions => "Instructions",
            Self::DueDate => "Due Date",
            Self::Reference => "Reference",
            Self::PopulationRequest => "Population Request",
            Self::EvidenceForm => "Evidence Form",
            Self::RelatedSections => "Related Section(s)",
            Self::Assignee1 => "Assignee 1",
            Self::Assignee2 => "Assignee 2",
            Self::Assignee3 => "Assignee 3",
            Self::Assignee4 => "Assignee 4",
            Self::Assignee5 => "Assignee 5",
            Self::Project1 => "Project 1",
            Self::Project2 => "Project 2",
            Self::Project3 => "Project 3",
            Self::Project4 => "Project 4",
            Self::Project5 => "Project 5",
        }
    }

    /// Lowercase substrings a record key must contain to feed this column.
    pub fn accepted_substrings(self) -> &'static [&'static str] {
        match self {
            Self::Title => &["title"],
            Self::Instructions => &["instructions"],
            Self::DueDate => &["due date"],
            Self::Reference => &["reference"],
            Self::PopulationRequest => &["population request"],
            Self::EvidenceForm => &["evidence form"],
            Self::RelatedSections => &["related section(s)"],
            Self::Assignee1 => &["assignee 1"],
            Self::Assignee2 => &["assignee 2"],
            Self::Assignee3 => &["assignee 3"],
            Self::Assignee4 => &["assignee 4"],
            Self::Assignee5 => &["assignee 5"],
            Self::Project1 => &["project 1"],
            Self::Project2 => &["project 2"],
            Self::Project3 => &["project 3"],
            Self::Project4 => &["project 4"],
            Self::Project5 => &["project 5"],
        }
    }

    /// Value used when no record key feeds this column.
    pub fn default_value(self) -> Option<&'static str> {
        match self {
            Self::PopulationRequest => Some(C_DEFAULT_POPULATION_REQUEST),
            Self::EvidenceForm => Some(C_DEFAULT_EVIDENCE_FORM),
            _ => None,
        }
    }

    /// `true` when `key` feeds this column (case-insensitive substring).
    pub fn accepts_key(self, key: &str) -> bool {
        let c_key = key.to_lowercase();
        self.accepted_substrings()
            .iter()
            .any(|c_sub| c_key.contains(c_sub))
    }

    /// Resolve this column for one record; the last accepted key wins.
    pub fn resolve(self, record: &SpecRequestRecord) -> Option<String> {
        record
            .values
            .iter()
            .rev()
            .find(|(key, _)| self.accepts_key(key))
            .map(|(_, value)| value.clone())
            .or_else(|| self.default_value().map(ToString::to_string))
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Table

/// Request list rows, each aligned with [`EnumRequestListColumn::ALL`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecRequestListTable {
    /// Row cells; `None` stays blank in the sheet.
    pub rows: Vec<Vec<Option<String>>>,
}

impl SpecRequestListTable {
    /// Header texts in sheet order.
    pub fn header() -> Vec<String> {
        EnumRequestListColumn::ALL
            .iter()
            .map(|col| col.header().to_string())
            .collect()
    }

    /// Number of data rows.
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Cell of `column` in data row `n_idx_row`.
    pub fn value(&self, n_idx_row: usize, column: EnumRequestListColumn) -> Option<&str> {
        let n_idx_col = EnumRequestListColumn::ALL
            .iter()
            .position(|col| *col == column)?;
        self.rows
            .get(n_idx_row)
            .and_then(|row| row.get(n_idx_col))
            .and_then(|value| value.as_deref())
    }
}

/// Project every non-empty record onto the request list schema.
///
/// Records without keys and rows whose title resolves empty are skipped.
pub fn build_request_list(arena: &SpecRequestArena) -> SpecRequestListTable {
    let mut table = SpecRequestListTable::default();
    for (_, record) in arena.iter() {
        if record.is_empty() {
            continue;
        }
        let row: Vec<Option<String>> = EnumRequestListColumn::ALL
            .iter()
            .map(|col| col.resolve(record).filter(|value| !value.is_empty()))
            .collect();
        if row.first().is_none_or(Option::is_none) {
            continue;
        }
        table.rows.push(row);
    }
    table
}

/// Convert the table to a text DataFrame named after the output columns.
pub fn derive_request_list_dataframe(
    table: &SpecRequestListTable,
) -> Result<DataFrame, SamplerError> {
    let l_headers = SpecRequestListTable::header();
    let mut l_values_by_col: Vec<Vec<Option<String>>> =
        vec![Vec::with_capacity(table.height()); l_headers.len()];
    for row in &table.rows {
        for (n_idx_col, value) in row.iter().enumerate() {
            if let Some(l_col) = l_values_by_col.get_mut(n_idx_col) {
                l_col.push(value.clone());
            }
        }
    }
    derive_text_dataframe(&l_headers, l_values_by_col).map_err(SamplerError::Table)
}

/// Write the request list workbook to `path`.
pub fn write_request_list(
    table: &SpecRequestListTable,
    path: &Path,
) -> Result<SpecXlsxReport, SamplerError> {
    let df_data = derive_request_list_dataframe(table)?;

    let mut writer = XlsxWriter::with_defaults(path.to_path_buf()).map_err(SamplerError::Workbook)?;
    writer
        .write_sheet_from_dataframes(
            &df_data,
            C_SHEET_REQUEST_LIST,
            None,
            &SpecXlsxSheetWriteOptions::default(),
        )
        .map_err(SamplerError::Workbook)?;
    writer.close().map_err(SamplerError::Workbook)?;

    info!(path = %path.display(), n_rows = table.height(), "Wrote request list");
    Ok(merge_xlsx_reports(writer.report()))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn derive_record(l_pairs: &[(&str, &str)]) -> SpecRequestRecord {
        SpecRequestRecord {
            platform: "Windows".to_string(),
            sheet_name: "Windows".to_string(),
            values: l_pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    #[test]
    fn test_columns_match_keys_case_insensitively() {
        let record = derive_record(&[
            ("Global TITLE", "Patch levels"),
            ("PCI Instructions", "Export for srv01"),
            ("Global Reference", "ABC-001"),
        ]);
        assert_eq!(
            EnumRequestListColumn::Title.resolve(&record).as_deref(),
            Some("Patch levels")
        );
        assert_eq!(
            EnumRequestListColumn::Instructions.resolve(&record).as_deref(),
            Some("Export for srv01")
        );
        assert_eq!(
            EnumRequestListColumn::Reference.resolve(&record).as_deref(),
            Some("ABC-001")
        );
        assert_eq!(EnumRequestListColumn::DueDate.resolve(&record), None);
    }

    #[test]
    fn test_defaults_fill_missing_population_and_evidence_form() {
        let record = derive_record(&[("Global Title", "Patch levels")]);
        assert_eq!(
            EnumRequestListColumn::PopulationRequest.resolve(&record).as_deref(),
            Some("No")
        );
        assert_eq!(
            EnumRequestListColumn::EvidenceForm.resolve(&record).as_deref(),
            Some("Documentation")
        );

        let record = derive_record(&[
            ("Global Title", "Patch levels"),
            ("Global Population Request", "Yes"),
        ]);
        assert_eq!(
            EnumRequestListColumn::PopulationRequest.resolve(&record).as_deref(),
            Some("Yes")
        );
    }

    #[test]
    fn test_last_matching_key_wins() {
        let record = derive_record(&[
            ("Global Title", "Generic title"),
            ("PCI Title", "PCI title"),
        ]);
        assert_eq!(
            EnumRequestListColumn::Title.resolve(&record).as_deref(),
            Some("PCI title")
        );
    }

    #[test]
    fn test_build_skips_empty_and_untitled_records() {
        let mut arena = SpecRequestArena::default();
        arena.push(derive_record(&[("Global Title", "First")]));
        arena.push(SpecRequestRecord::default());
        arena.push(derive_record(&[("Global Instructions", "No title here")]));
        arena.push(derive_record(&[("Global Title", "Second"), ("SOC Due Date", "Q3")]));

        let table = build_request_list(&arena);
        assert_eq!(table.height(), 2);
        assert_eq!(table.value(0, EnumRequestListColumn::Title), Some("First"));
        assert_eq!(table.value(1, EnumRequestListColumn::Title), Some("Second"));
        assert_eq!(table.value(1, EnumRequestListColumn::DueDate), Some("Q3"));
        assert_eq!(table.value(1, EnumRequestListColumn::Assignee1), None);
        assert_eq!(
            table.value(0, EnumRequestListColumn::EvidenceForm),
            Some("Documentation")
        );
    }

    #[test]
    fn test_dataframe_has_fixed_schema() {
        let mut arena = SpecRequestArena::default();
        arena.push(derive_record(&[("Global Title", "First")]));
        let df = derive_request_list_dataframe(&build_request_list(&arena)).unwrap();

        assert_eq!(df.width(), 17);
        assert_eq!(df.height(), 1);
        let l_names: Vec<String> = df
            .get_column_names_str()
            .into_iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(l_names, SpecRequestListTable::header());
    }
}
