//! Shared XLSX specification models.

use crate::util::format_number_text;

////////////////////////////////////////////////////////////////////////////////
// #region CellFormatSpecification

/// Cell format specification merged into `rust_xlsxwriter::Format` at write time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SpecCellFormat {
    /// Font family name.
    pub font_name: Option<String>,
    /// Font size in points.
    pub font_size: Option<i64>,
    /// Bold style.
    pub bold: Option<bool>,

    /// Horizontal alignment.
    pub align: Option<String>,
    /// Vertical alignment.
    pub valign: Option<String>,
    /// Border on all sides: `0` none, `1` thin, `2` medium, `5` thick.
    pub border: Option<i64>,

    /// Background fill color (`#RRGGBB`); platform headers and N/A cells.
    pub bg_color: Option<String>,
}

impl SpecCellFormat {
    /// Return a new format by overlaying `patch` onto `self`.
    pub fn with_(&self, patch: SpecCellFormat) -> SpecCellFormat {
        self.merge(&patch)
    }

    /// Merge two formats with right-side non-`None` overwrite semantics.
    pub fn merge(&self, other: &SpecCellFormat) -> SpecCellFormat {
        SpecCellFormat {
            font_name: other.font_name.clone().or_else(|| self.font_name.clone()),
            font_size: other.font_size.or(self.font_size),
            bold: other.bold.or(self.bold),
            align: other.align.clone().or_else(|| self.align.clone()),
            valign: other.valign.clone().or_else(|| self.valign.clone()),
            border: other.border.or(self.border),
            bg_color: other.bg_color.clone().or_else(|| self.bg_color.clone()),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region CellValues

/// Normalized cell value shared by the reader and the writer.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum EnumCellValue {
    /// Missing/blank value.
    #[default]
    None,
    /// Text value.
    String(String),
    /// Numeric value.
    Number(f64),
}

impl EnumCellValue {
    /// `true` for blank cells and empty strings.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::None => true,
            Self::String(s) => s.is_empty(),
            Self::Number(_) => false,
        }
    }

    /// Type guard for header comparisons: only string cells are textual.
    pub fn is_textual(&self) -> bool {
        matches!(self, Self::String(_))
    }

    /// Borrow the text of a textual cell.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Render any cell to display text; blanks become `""`.
    pub fn to_text(&self) -> String {
        match self {
            Self::None => String::new(),
            Self::String(s) => s.clone(),
            Self::Number(n) => format_number_text(*n),
        }
    }
}

/// Dense, zero-based cell grid of one worksheet anchored at `A1`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpecSheetGrid {
    /// Worksheet name as stored in the workbook.
    pub sheet_name: String,
    /// Row-major cells; rows may be shorter than [`Self::width`].
    pub rows: Vec<Vec<EnumCellValue>>,
}

static CELL_NONE: EnumCellValue = EnumCellValue::None;

impl SpecSheetGrid {
    /// Build a grid from raw rows.
    pub fn new(sheet_name: impl Into<String>, rows: Vec<Vec<EnumCellValue>>) -> Self {
        Self {
            sheet_name: sheet_name.into(),
            rows,
        }
    }

    /// Number of rows, counting from `A1`.
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Widest row length.
    pub fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Cell at zero-based `(row_idx, col_idx)`; out-of-range cells are blank.
    pub fn cell(&self, row_idx: usize, col_idx: usize) -> &EnumCellValue {
        self.rows
            .get(row_idx)
            .and_then(|row| row.get(col_idx))
            .unwrap_or(&CELL_NONE)
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region WriteOptions

/// Autofit rule for column width inference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnumAutofitColumnsRule {
    /// Disable autofit.
    None,
    /// Infer width from header cells only (default).
    #[default]
    Header,
    /// Infer width from both header and body cells.
    All,
}

/// Autofit policy for per-sheet write call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecAutofitCellsPolicy {
    /// Autofit width inference rule.
    pub rule_columns: EnumAutofitColumnsRule,
    /// Max body rows inspected when body-based inference is active.
    pub height_body_inferred_max: Option<usize>,
    /// Minimum final width.
    pub width_cell_min: usize,
    /// Maximum final width.
    pub width_cell_max: usize,
    /// Width padding added after inference.
    pub width_cell_padding: usize,
}

impl Default for SpecAutofitCellsPolicy {
    fn default() -> Self {
        Self {
            rule_columns: EnumAutofitColumnsRule::Header,
            height_body_inferred_max: Some(20_000),
            width_cell_min: 8,
            width_cell_max: 60,
            width_cell_padding: 2,
        }
    }
}

/// Writer-wide formatting defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecXlsxWriteOptions {
    /// Base patch merged into all body formats.
    pub base_format_patch: SpecCellFormat,
}

impl Default for SpecXlsxWriteOptions {
    fn default() -> Self {
        Self {
            base_format_patch: SpecCellFormat {
                border: Some(0),
                ..Default::default()
            },
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ReportSpecification

/// Summary of one sheet emitted to a workbook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecSheetSummary {
    /// Actual unique sheet name in workbook.
    pub sheet_name: String,
    /// Body rows written below the header.
    pub height_body: usize,
    /// Columns written.
    pub width: usize,
}

/// Per-write call report.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecXlsxReport {
    /// Sheets produced by the write call.
    pub sheets: Vec<SpecSheetSummary>,
    /// Non-fatal warnings.
    pub warnings: Vec<String>,
}

impl SpecXlsxReport {
    /// Add a warning message.
    pub fn warn(&mut self, msg: impl AsRef<str>) {
        self.warnings.push(msg.as_ref().to_string());
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_value_text_and_guards() {
        assert!(EnumCellValue::None.is_empty());
        assert!(EnumCellValue::String(String::new()).is_empty());
        assert!(!EnumCellValue::Number(0.0).is_empty());

        assert!(EnumCellValue::String("Global".to_string()).is_textual());
        assert!(!EnumCellValue::Number(3.0).is_textual());
        assert!(!EnumCellValue::None.is_textual());

        assert_eq!(EnumCellValue::Number(12.0).to_text(), "12");
        assert_eq!(EnumCellValue::Number(1.5).to_text(), "1.5");
        assert_eq!(EnumCellValue::None.to_text(), "");
    }

    #[test]
    fn test_sheet_grid_out_of_range_cells_are_blank() {
        let grid = SpecSheetGrid::new(
            "generic",
            vec![
                vec![EnumCellValue::String("ID".to_string())],
                vec![
                    EnumCellValue::Number(1.0),
                    EnumCellValue::String("x".to_string()),
                ],
            ],
        );

        assert_eq!(grid.height(), 2);
        assert_eq!(grid.width(), 2);
        assert_eq!(grid.cell(0, 1), &EnumCellValue::None);
        assert_eq!(grid.cell(9, 9), &EnumCellValue::None);
        assert_eq!(grid.cell(1, 1).as_text(), Some("x"));
    }

    #[test]
    fn test_format_merge_right_side_wins() {
        let base = SpecCellFormat {
            bold: Some(false),
            bg_color: Some("#FFFFFF".to_string()),
            ..Default::default()
        };
        let merged = base.with_(SpecCellFormat {
            bold: Some(true),
            ..Default::default()
        });

        assert_eq!(merged.bold, Some(true));
        assert_eq!(merged.bg_color.as_deref(), Some("#FFFFFF"));
    }
}
