//! Stateless helper utilities used by the XLSX reader and writer kernels.

use std::collections::{BTreeMap, BTreeSet};

use polars::prelude::{Column, DataFrame};

use crate::conf::{
    N_LEN_EXCEL_SHEET_NAME_MAX, N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX, TUP_EXCEL_ILLEGAL,
    TUP_FILE_STEM_ILLEGAL,
};
use crate::spec::EnumCellValue;

////////////////////////////////////////////////////////////////////////////////
// #region CellValueConversion

/// Render a number the way a spreadsheet user typed it: integral values lose `.0`.
pub fn format_number_text(x: f64) -> String {
    if x.is_finite() && x.fract() == 0.0 && x.abs() < 1e15 {
        return format!("{}", x as i64);
    }
    x.to_string()
}

/// Normalize a cell value for writing; non-finite numbers become text.
pub fn convert_cell_value(value: &EnumCellValue) -> EnumCellValue {
    match value {
        EnumCellValue::None => EnumCellValue::None,
        EnumCellValue::String(s) => EnumCellValue::String(s.clone()),
        EnumCellValue::Number(n) => {
            if n.is_finite() {
                EnumCellValue::Number(*n)
            } else {
                EnumCellValue::String(n.to_string())
            }
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region DataFrameLikeUtils

/// Validate that `columns` has no duplicated names.
pub fn validate_unique_columns(columns: &[String]) -> Result<(), String> {
    if columns.len() == columns.iter().collect::<BTreeSet<_>>().len() {
        return Ok(());
    }

    let mut dict_pos: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (n_idx, c_name) in columns.iter().enumerate() {
        dict_pos.entry(c_name).or_default().push(n_idx);
    }

    let c_msg = dict_pos
        .iter()
        .filter_map(|(c_name, l_pos)| {
            if l_pos.len() > 1 {
                Some(format!(
                    "{c_name:?} x{} at indices {:?}",
                    l_pos.len(),
                    l_pos
                ))
            } else {
                None
            }
        })
        .collect::<Vec<_>>()
        .join("; ");

    Err(format!("Duplicate column names detected: {c_msg}"))
}

/// Build a text-only DataFrame from column names and column-major values.
pub fn derive_text_dataframe(
    columns: &[String],
    l_values_by_col: Vec<Vec<Option<String>>>,
) -> Result<DataFrame, String> {
    if columns.len() != l_values_by_col.len() {
        return Err(format!(
            "Column count mismatch: {} names vs {} value columns.",
            columns.len(),
            l_values_by_col.len()
        ));
    }
    validate_unique_columns(columns)?;

    let l_cols = columns
        .iter()
        .zip(l_values_by_col)
        .map(|(c_name, l_values)| Column::new(c_name.as_str().into(), l_values))
        .collect::<Vec<_>>();

    DataFrame::new(l_cols).map_err(|err| format!("Failed to build DataFrame: {err}"))
}

/// Reject tables that do not fit on a single worksheet.
pub fn validate_sheet_dimensions(
    height_body: usize,
    width: usize,
    height_header: usize,
) -> Result<(), String> {
    if height_body + height_header > N_NROWS_EXCEL_MAX {
        return Err(format!(
            "Excel limit overflow: {} rows (header {height_header}) exceeds {N_NROWS_EXCEL_MAX}.",
            height_body + height_header
        ));
    }
    if width > N_NCOLS_EXCEL_MAX {
        return Err(format!(
            "Excel limit overflow: {width} columns exceeds {N_NCOLS_EXCEL_MAX}."
        ));
    }
    Ok(())
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region NameNormalization

/// Replace invalid chars and trim to valid Excel sheet name.
pub fn sanitize_sheet_name(name: &str, replace_to: &str) -> String {
    let mut c_name = name.to_string();
    for c_illegal in TUP_EXCEL_ILLEGAL {
        c_name = c_name.replace(c_illegal, replace_to);
    }
    c_name = c_name.trim().to_string();
    if c_name.is_empty() {
        c_name = "Sheet".to_string();
    }

    c_name.chars().take(N_LEN_EXCEL_SHEET_NAME_MAX).collect()
}

/// Replace path separators so `name` stays a single file-name component.
pub fn sanitize_file_stem(name: &str, replace_to: &str) -> String {
    let mut c_name = name.to_string();
    for c_illegal in TUP_FILE_STEM_ILLEGAL {
        c_name = c_name.replace(c_illegal, replace_to);
    }
    c_name.trim().to_string()
}

/// Parse an A1-style reference (`"B4"`) into zero-based `(row_idx, col_idx)`.
pub fn parse_cell_reference(reference: &str) -> Result<(usize, usize), String> {
    let c_ref = reference.trim().to_ascii_uppercase();
    let n_split = c_ref
        .find(|chr: char| chr.is_ascii_digit())
        .ok_or_else(|| format!("Invalid cell reference (no row): {reference:?}"))?;
    let (c_col, c_row) = c_ref.split_at(n_split);

    if c_col.is_empty() || !c_col.chars().all(|chr| chr.is_ascii_uppercase()) {
        return Err(format!(
            "Invalid cell reference (bad column): {reference:?}"
        ));
    }

    let mut n_col_1based = 0usize;
    for chr in c_col.chars() {
        n_col_1based = n_col_1based * 26 + (chr as usize - 'A' as usize + 1);
    }
    let n_row_1based = c_row
        .parse::<usize>()
        .map_err(|_| format!("Invalid cell reference (bad row): {reference:?}"))?;
    if n_row_1based == 0 || n_row_1based > N_NROWS_EXCEL_MAX || n_col_1based > N_NCOLS_EXCEL_MAX
    {
        return Err(format!(
            "Cell reference outside worksheet bounds: {reference:?}"
        ));
    }

    Ok((n_row_1based - 1, n_col_1based - 1))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
