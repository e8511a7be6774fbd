//! XLSX reader kernel that loads worksheets into dense [`SpecSheetGrid`]s.
//!
//! calamine ranges start at the first used cell; grids produced here are
//! re-anchored at `A1` so fixed cell positions (`B4`, row 9, ...) can be
//! addressed directly.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use calamine::{Data, Range, Reader, Xlsx, XlsxError, open_workbook};

use crate::spec::{EnumCellValue, SpecSheetGrid};

/// Read-only workbook handle.
pub struct XlsxReader {
    path_file_in: PathBuf,
    workbook: Xlsx<BufReader<File>>,
}

impl XlsxReader {
    /// Open workbook at `path_file_in`.
    pub fn open(path_file_in: impl AsRef<Path>) -> Result<Self, String> {
        let path_file_in = path_file_in.as_ref().to_path_buf();
        let workbook: Xlsx<BufReader<File>> = open_workbook(&path_file_in).map_err(|err| {
            format!(
                "Failed to open workbook {}: {err}",
                path_file_in.display()
            )
        })?;
        Ok(Self {
            path_file_in,
            workbook,
        })
    }

    /// Return input file path as string.
    pub fn file_in(&self) -> String {
        self.path_file_in.to_string_lossy().to_string()
    }

    /// Sheet names in workbook order.
    pub fn sheet_names(&self) -> Vec<String> {
        self.workbook.sheet_names()
    }

    /// Exact, case-sensitive sheet-name lookup.
    pub fn has_sheet(&self, sheet_name: &str) -> bool {
        self.workbook
            .sheet_names()
            .iter()
            .any(|c_name| c_name == sheet_name)
    }

    /// Load one worksheet as a grid anchored at `A1`.
    pub fn read_sheet(&mut self, sheet_name: &str) -> Result<SpecSheetGrid, String> {
        let range = self
            .workbook
            .worksheet_range(sheet_name)
            .map_err(|err| derive_xlsx_read_error_text(&self.path_file_in, sheet_name, err))?;
        Ok(derive_sheet_grid_from_range(sheet_name, &range))
    }

    /// Load every worksheet in workbook order.
    pub fn read_all_sheets(&mut self) -> Result<Vec<SpecSheetGrid>, String> {
        let l_sheet_names = self.sheet_names();
        let mut l_grids = Vec::with_capacity(l_sheet_names.len());
        for sheet_name in &l_sheet_names {
            l_grids.push(self.read_sheet(sheet_name)?);
        }
        Ok(l_grids)
    }
}

/// Convert a calamine range into a dense grid anchored at `A1`.
pub fn derive_sheet_grid_from_range(sheet_name: &str, range: &Range<Data>) -> SpecSheetGrid {
    let Some((n_row_start, n_col_start)) = range.start() else {
        return SpecSheetGrid::new(sheet_name, vec![]);
    };
    let n_row_start = n_row_start as usize;
    let n_col_start = n_col_start as usize;

    let mut l_rows: Vec<Vec<EnumCellValue>> = vec![vec![]; n_row_start];
    for row in range.rows() {
        let mut l_cells = vec![EnumCellValue::None; n_col_start];
        l_cells.extend(row.iter().map(derive_cell_value_from_data));
        while matches!(l_cells.last(), Some(EnumCellValue::None)) {
            l_cells.pop();
        }
        l_rows.push(l_cells);
    }
    while l_rows.last().is_some_and(Vec::is_empty) {
        l_rows.pop();
    }

    SpecSheetGrid::new(sheet_name, l_rows)
}

/// Map one calamine cell onto [`EnumCellValue`].
pub fn derive_cell_value_from_data(value: &Data) -> EnumCellValue {
    match value {
        Data::Empty => EnumCellValue::None,
        Data::String(val) => EnumCellValue::String(val.clone()),
        Data::Int(val) => EnumCellValue::Number(*val as f64),
        Data::Float(val) => EnumCellValue::Number(*val),
        Data::Bool(val) => EnumCellValue::String(if *val { "True" } else { "False" }.to_string()),
        Data::DateTimeIso(val) => EnumCellValue::String(val.clone()),
        Data::DurationIso(val) => EnumCellValue::String(val.clone()),
        other => EnumCellValue::String(other.to_string()),
    }
}

fn derive_xlsx_read_error_text(path_file_in: &Path, sheet_name: &str, err: XlsxError) -> String {
    format!(
        "xlsx read error in {} (sheet {sheet_name:?}): {err}",
        path_file_in.display()
    )
}
