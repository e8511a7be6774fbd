//! XLSX writer kernel that converts text DataFrames into workbook output.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use polars::prelude::{AnyValue, DataFrame};
use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, Workbook, Worksheet, XlsxError};

use crate::conf::N_LEN_EXCEL_SHEET_NAME_MAX;
use crate::spec::{
    EnumAutofitColumnsRule, EnumCellValue, SpecAutofitCellsPolicy, SpecCellFormat,
    SpecSheetSummary, SpecXlsxReport, SpecXlsxWriteOptions,
};
use crate::util::{
    convert_cell_value, format_number_text, sanitize_sheet_name, validate_sheet_dimensions,
    validate_unique_columns,
};

/// Per-sheet call options.
#[derive(Default, Debug, Clone)]
pub struct SpecXlsxSheetWriteOptions {
    /// Number of frozen columns.
    pub col_freeze: usize,
    /// Column autofit policy.
    pub policy_autofit: SpecAutofitCellsPolicy,
    /// Header format patches by column index.
    pub fmts_header_by_col: BTreeMap<usize, SpecCellFormat>,
    /// Body format patches by `(body_row_idx, col_idx)`.
    pub fmts_body_by_cell: BTreeMap<(usize, usize), SpecCellFormat>,
    /// Fixed widths by column index; these win over autofit.
    pub widths_by_col: BTreeMap<usize, f64>,
    /// Height of every header row, when set.
    pub height_header_row: Option<f64>,
}

/// Stateful workbook writer.
pub struct XlsxWriter {
    path_file_out: PathBuf,
    workbook: Workbook,
    fmt_text: SpecCellFormat,
    fmt_header: SpecCellFormat,
    write_options: SpecXlsxWriteOptions,
    set_sheet_names_existing: BTreeSet<String>,
    l_reports: Vec<SpecXlsxReport>,
    if_closed: bool,
}

impl XlsxWriter {
    /// Create writer bound to output path and format/options presets.
    ///
    /// The workbook is buffered in memory until [`Self::close`] is called.
    pub fn new(
        path_file_out: PathBuf,
        fmt_text: SpecCellFormat,
        fmt_header: SpecCellFormat,
        write_options: SpecXlsxWriteOptions,
    ) -> Self {
        Self {
            path_file_out,
            workbook: Workbook::new(),
            fmt_text,
            fmt_header,
            write_options,
            set_sheet_names_existing: BTreeSet::new(),
            l_reports: Vec::new(),
            if_closed: false,
        }
    }

    /// Create writer with [`crate::conf::derive_default_xlsx_formats`] presets.
    pub fn with_defaults(path_file_out: PathBuf) -> Result<Self, String> {
        let dict_default_fmts = crate::conf::derive_default_xlsx_formats();
        let fmt_text = dict_default_fmts
            .get("text")
            .cloned()
            .ok_or_else(|| "Missing default format: text".to_string())?;
        let fmt_header = dict_default_fmts
            .get("header")
            .cloned()
            .ok_or_else(|| "Missing default format: header".to_string())?;
        Ok(Self::new(
            path_file_out,
            fmt_text,
            fmt_header,
            crate::conf::derive_default_xlsx_write_options(),
        ))
    }

    /// Return output file path as string.
    pub fn file_out(&self) -> String {
        self.path_file_out.to_string_lossy().to_string()
    }

    /// Return immutable snapshot of per-sheet write reports.
    pub fn report(&self) -> Vec<SpecXlsxReport> {
        self.l_reports.clone()
    }

    /// Flush workbook to disk. Idempotent.
    pub fn close(&mut self) -> Result<(), String> {
        if self.if_closed {
            return Ok(());
        }
        self.workbook
            .save(&self.path_file_out)
            .map_err(derive_xlsx_error_text)?;
        self.if_closed = true;
        Ok(())
    }

    /// Write one sheet from an in-memory dataframe.
    ///
    /// `df_header`, when given, replaces the column names as the header grid and
    /// must have the same width as `df_data`.
    pub fn write_sheet_from_dataframes(
        &mut self,
        df_data: &DataFrame,
        sheet_name: &str,
        df_header: Option<&DataFrame>,
        options: &SpecXlsxSheetWriteOptions,
    ) -> Result<(), String> {
        if self.if_closed {
            return Err("Cannot write after close().".to_string());
        }
        self.write_sheet(df_data, sheet_name, df_header, options)
    }

    /// Write a one-cell sheet holding `message` in `A1`.
    pub fn write_sheet_message(&mut self, sheet_name: &str, message: &str) -> Result<(), String> {
        if self.if_closed {
            return Err("Cannot write after close().".to_string());
        }
        let sheet_name_unique =
            self.derive_unique_sheet_name(&sanitize_sheet_name(sheet_name, "_"));
        let fmt_text = derive_rust_xlsx_format(&self.fmt_text);
        let worksheet = self.workbook.add_worksheet();
        worksheet
            .set_name(&sheet_name_unique)
            .map_err(derive_xlsx_error_text)?;
        worksheet
            .write_string_with_format(0, 0, message, &fmt_text)
            .map_err(derive_xlsx_error_text)?;

        self.l_reports.push(SpecXlsxReport {
            sheets: vec![SpecSheetSummary {
                sheet_name: sheet_name_unique,
                height_body: 0,
                width: 1,
            }],
            warnings: vec![],
        });
        Ok(())
    }

    fn write_sheet(
        &mut self,
        df_data: &DataFrame,
        sheet_name: &str,
        df_header: Option<&DataFrame>,
        options: &SpecXlsxSheetWriteOptions,
    ) -> Result<(), String> {
        validate_policy_autofit(&options.policy_autofit)?;

        let l_colnames_df: Vec<String> = df_data
            .get_column_names_str()
            .into_iter()
            .map(ToString::to_string)
            .collect();
        validate_unique_columns(&l_colnames_df)?;

        let n_width_df = l_colnames_df.len();
        let n_height_df = df_data.height();

        let mut l_header_grid = vec![l_colnames_df.clone()];
        if let Some(df_header_custom) = df_header {
            let n_header_height = df_header_custom.height();
            if n_header_height == 0 {
                return Err(
                    "df_header must have >= 1 row (0-row header is not allowed).".to_string(),
                );
            }
            if df_header_custom.width() != n_width_df {
                return Err("df_header.width must equal df.width.".to_string());
            }

            l_header_grid = derive_string_grid_from_dataframe(df_header_custom)?;
        }

        let n_rows_header = l_header_grid.len();
        validate_sheet_dimensions(n_height_df, n_width_df, n_rows_header)?;

        let mut report = SpecXlsxReport::default();
        let sheet_name_unique =
            self.derive_unique_sheet_name(&sanitize_sheet_name(sheet_name, "_"));
        if sheet_name_unique != sheet_name {
            report.warn(format!(
                "Sheet name {sheet_name:?} written as {sheet_name_unique:?}."
            ));
        }

        let fmt_base_body = self.fmt_text.merge(&self.write_options.base_format_patch);
        let fmt_header_base = self.fmt_header.clone();
        let fmt_body_default = derive_rust_xlsx_format(&fmt_base_body);

        let worksheet = self.workbook.add_worksheet();
        worksheet
            .set_name(&sheet_name_unique)
            .map_err(derive_xlsx_error_text)?;

        let if_autofit_columns = !matches!(
            options.policy_autofit.rule_columns,
            EnumAutofitColumnsRule::None
        );
        let mut l_width_by_col_header = vec![0usize; n_width_df];
        let mut l_width_by_col_body = vec![0usize; n_width_df];

        if if_autofit_columns {
            for row in &l_header_grid {
                for (n_idx_col, value) in row.iter().enumerate() {
                    l_width_by_col_header[n_idx_col] = usize::max(
                        l_width_by_col_header[n_idx_col],
                        estimate_unicode_string_width(value),
                    );
                }
            }
        }

        write_header(
            worksheet,
            &l_header_grid,
            &fmt_header_base,
            &options.fmts_header_by_col,
        )?;
        if let Some(n_height) = options.height_header_row {
            for n_idx_row in 0..n_rows_header {
                worksheet
                    .set_row_height(cast_row_num(n_idx_row)?, n_height)
                    .map_err(derive_xlsx_error_text)?;
            }
        }

        worksheet
            .set_freeze_panes(
                cast_row_num(n_rows_header)?,
                cast_col_num(options.col_freeze)?,
            )
            .map_err(derive_xlsx_error_text)?;

        let l_cols = df_data.get_columns();
        let n_rows_autofit_max = options
            .policy_autofit
            .height_body_inferred_max
            .unwrap_or(usize::MAX);
        for n_idx_row in 0..n_height_df {
            let if_inspect_width = if_autofit_columns && n_idx_row < n_rows_autofit_max;
            for (n_idx_col, col) in l_cols.iter().enumerate() {
                let value_raw = derive_cell_value_from_any_value(
                    col.get(n_idx_row)
                        .map_err(|err| format!("Failed to access cell value: {err}"))?,
                );
                let value = convert_cell_value(&value_raw);

                if if_inspect_width {
                    l_width_by_col_body[n_idx_col] = usize::max(
                        l_width_by_col_body[n_idx_col],
                        estimate_width_len(&value),
                    );
                }

                let fmt_cell_override = options
                    .fmts_body_by_cell
                    .get(&(n_idx_row, n_idx_col))
                    .map(|fmt_patch| derive_rust_xlsx_format(&fmt_base_body.merge(fmt_patch)));
                write_cell_with_format(
                    worksheet,
                    n_rows_header + n_idx_row,
                    n_idx_col,
                    &value,
                    fmt_cell_override.as_ref().unwrap_or(&fmt_body_default),
                )?;
            }
        }

        if if_autofit_columns && n_width_df > 0 {
            let n_min = usize::max(1, options.policy_autofit.width_cell_min);
            let n_max = usize::min(
                255,
                usize::max(n_min, options.policy_autofit.width_cell_max),
            );
            let n_pad = options.policy_autofit.width_cell_padding;

            for n_idx_col in 0..n_width_df {
                let n_width_recorded = match options.policy_autofit.rule_columns {
                    EnumAutofitColumnsRule::Header => l_width_by_col_header[n_idx_col],
                    EnumAutofitColumnsRule::All => usize::max(
                        l_width_by_col_header[n_idx_col],
                        l_width_by_col_body[n_idx_col],
                    ),
                    EnumAutofitColumnsRule::None => l_width_by_col_header[n_idx_col],
                };
                let n_width_final = usize::min(n_max, usize::max(n_min, n_width_recorded + n_pad));
                worksheet
                    .set_column_width(cast_col_num(n_idx_col)?, n_width_final as f64)
                    .map_err(derive_xlsx_error_text)?;
            }
        }

        for (n_idx_col, n_width) in &options.widths_by_col {
            if *n_idx_col >= n_width_df {
                report.warn(format!(
                    "Fixed width for column {n_idx_col} ignored: sheet has {n_width_df} columns."
                ));
                continue;
            }
            worksheet
                .set_column_width(cast_col_num(*n_idx_col)?, *n_width)
                .map_err(derive_xlsx_error_text)?;
        }

        report.sheets.push(SpecSheetSummary {
            sheet_name: sheet_name_unique,
            height_body: n_height_df,
            width: n_width_df,
        });
        self.l_reports.push(report);
        Ok(())
    }

    /// Reserve `name`, suffixing `__2`, `__3`, ... when already taken.
    fn derive_unique_sheet_name(&mut self, name: &str) -> String {
        let base_name: String = name
            .chars()
            .take(N_LEN_EXCEL_SHEET_NAME_MAX.saturating_sub(3).max(1))
            .collect();
        let c_unique = std::iter::once(name.to_string())
            .chain((2usize..).map(|n_idx| {
                format!("{base_name}__{n_idx}")
                    .chars()
                    .take(N_LEN_EXCEL_SHEET_NAME_MAX)
                    .collect()
            }))
            .find(|candidate| !self.set_sheet_names_existing.contains(candidate))
            .unwrap_or_else(|| name.to_string());
        self.set_sheet_names_existing.insert(c_unique.clone());
        c_unique
    }
}

/// Estimate displayed width units for one normalized cell value.
///
/// Used by autofit inference logic.
pub fn estimate_width_len(value: &EnumCellValue) -> usize {
    match value {
        EnumCellValue::None => 0,
        EnumCellValue::String(s) => estimate_unicode_string_width(s),
        EnumCellValue::Number(n) => format_number_text(*n).len(),
    }
}

fn estimate_unicode_string_width(s: &str) -> usize {
    let n_ascii = s.chars().filter(|chr| chr.is_ascii()).count();
    let n_non_ascii = s.chars().count().saturating_sub(n_ascii);
    n_ascii + (n_non_ascii as f64 * 1.6).round() as usize
}

fn validate_policy_autofit(policy_autofit: &SpecAutofitCellsPolicy) -> Result<(), String> {
    if policy_autofit.width_cell_min == 0 {
        return Err("policy_autofit.width_cell_min must be >= 1.".to_string());
    }
    if policy_autofit.width_cell_max < policy_autofit.width_cell_min {
        return Err(
            "policy_autofit.width_cell_max must be >= policy_autofit.width_cell_min.".to_string(),
        );
    }
    Ok(())
}

/// Header rows as display text; nulls become empty strings.
fn derive_string_grid_from_dataframe(df: &DataFrame) -> Result<Vec<Vec<String>>, String> {
    let l_cols = df.get_columns();
    (0..df.height())
        .map(|n_idx_row| {
            l_cols
                .iter()
                .map(|col| {
                    col.get(n_idx_row)
                        .map(|value| derive_cell_value_from_any_value(value).to_text())
                        .map_err(|err| format!("Failed to read header cell value: {err}"))
                })
                .collect()
        })
        .collect()
}

fn derive_cell_value_from_any_value(value: AnyValue<'_>) -> EnumCellValue {
    match value {
        AnyValue::Null => EnumCellValue::None,
        AnyValue::String(val) => EnumCellValue::String(val.to_string()),
        AnyValue::StringOwned(val) => EnumCellValue::String(val.to_string()),
        AnyValue::Boolean(val) => {
            EnumCellValue::String(if val { "True" } else { "False" }.to_string())
        }
        AnyValue::UInt32(val) => EnumCellValue::Number(val as f64),
        AnyValue::UInt64(val) => EnumCellValue::Number(val as f64),
        AnyValue::Int32(val) => EnumCellValue::Number(val as f64),
        AnyValue::Int64(val) => EnumCellValue::Number(val as f64),
        AnyValue::Float32(val) => EnumCellValue::Number(val as f64),
        AnyValue::Float64(val) => EnumCellValue::Number(val),
        _ => EnumCellValue::String(value.to_string()),
    }
}

fn write_header(
    worksheet: &mut Worksheet,
    header_grid: &[Vec<String>],
    fmt_header: &SpecCellFormat,
    fmts_header_by_col: &BTreeMap<usize, SpecCellFormat>,
) -> Result<(), String> {
    let fmt_header_default = derive_rust_xlsx_format(fmt_header);
    let dict_fmt_by_col: BTreeMap<usize, Format> = fmts_header_by_col
        .iter()
        .map(|(n_idx_col, fmt_patch)| {
            (*n_idx_col, derive_rust_xlsx_format(&fmt_header.merge(fmt_patch)))
        })
        .collect();

    for (n_idx_row, row_values) in header_grid.iter().enumerate() {
        for (n_idx_col, c_value) in row_values.iter().enumerate() {
            let value = if c_value.is_empty() {
                EnumCellValue::None
            } else {
                EnumCellValue::String(c_value.clone())
            };
            let fmt_cell = dict_fmt_by_col.get(&n_idx_col).unwrap_or(&fmt_header_default);
            write_cell_with_format(worksheet, n_idx_row, n_idx_col, &value, fmt_cell)?;
        }
    }
    Ok(())
}

fn write_cell_with_format(
    worksheet: &mut Worksheet,
    row_idx: usize,
    col_idx: usize,
    value: &EnumCellValue,
    format: &Format,
) -> Result<(), String> {
    let (n_row, n_col) = (cast_row_num(row_idx)?, cast_col_num(col_idx)?);
    let result = match value {
        EnumCellValue::None => worksheet.write_blank(n_row, n_col, format),
        EnumCellValue::String(val) => worksheet.write_string_with_format(n_row, n_col, val, format),
        EnumCellValue::Number(val) => worksheet.write_number_with_format(n_row, n_col, *val, format),
    };
    result.map(|_| ()).map_err(derive_xlsx_error_text)
}

fn derive_rust_xlsx_format(spec: &SpecCellFormat) -> Format {
    let mut format = Format::new();

    if let Some(val) = &spec.font_name {
        format = format.set_font_name(val.clone());
    }
    if let Some(val) = spec.font_size {
        format = format.set_font_size(val as f64);
    }
    if spec.bold.unwrap_or(false) {
        format = format.set_bold();
    }

    if let Some(val) = &spec.align
        && let Some(align) = derive_format_align(val)
    {
        format = format.set_align(align);
    }
    if let Some(val) = &spec.valign
        && let Some(align) = derive_format_align(val)
    {
        format = format.set_align(align);
    }

    if let Some(val) = &spec.bg_color {
        format = format.set_background_color(val.as_str());
    }

    if let Some(val) = spec.border {
        format = format.set_border(derive_format_border(val));
    }

    format
}

fn derive_format_border(border: i64) -> FormatBorder {
    match border {
        1 => FormatBorder::Thin,
        2 => FormatBorder::Medium,
        5 => FormatBorder::Thick,
        _ => FormatBorder::None,
    }
}

fn derive_format_align(align: &str) -> Option<FormatAlign> {
    let value = align.trim().to_ascii_lowercase();
    match value.as_str() {
        "general" => Some(FormatAlign::General),
        "left" => Some(FormatAlign::Left),
        "center" => Some(FormatAlign::Center),
        "right" => Some(FormatAlign::Right),
        "top" => Some(FormatAlign::Top),
        "bottom" => Some(FormatAlign::Bottom),
        "vcenter" | "vertical_center" => Some(FormatAlign::VerticalCenter),
        _ => None,
    }
}

fn cast_row_num(value: usize) -> Result<u32, String> {
    u32::try_from(value).map_err(|_| format!("row index overflow: {value}"))
}

fn cast_col_num(value: usize) -> Result<u16, String> {
    u16::try_from(value).map_err(|_| format!("column index overflow: {value}"))
}

fn derive_xlsx_error_text(err: XlsxError) -> String {
    format!("xlsx write error: {err}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_width_len_counts_wide_chars() {
        assert_eq!(
            estimate_width_len(&EnumCellValue::String("srv01".to_string())),
            5
        );
        assert_eq!(estimate_width_len(&EnumCellValue::None), 0);
        assert_eq!(estimate_width_len(&EnumCellValue::Number(12.0)), 2);
        assert_eq!(estimate_unicode_string_width("日本"), 3);
    }

    #[test]
    fn test_derive_unique_sheet_name_suffixes_duplicates() {
        let mut writer = XlsxWriter::with_defaults(PathBuf::from("unused.xlsx")).unwrap();
        assert_eq!(writer.derive_unique_sheet_name("Tracking"), "Tracking");
        assert_eq!(writer.derive_unique_sheet_name("Tracking"), "Tracking__2");
        assert_eq!(writer.derive_unique_sheet_name("Tracking"), "Tracking__3");
    }

    #[test]
    fn test_write_after_close_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = XlsxWriter::with_defaults(dir.path().join("closed.xlsx")).unwrap();
        writer.write_sheet_message("Request List", "hello").unwrap();
        writer.close().unwrap();
        writer.close().unwrap();

        assert!(writer.write_sheet_message("Again", "x").is_err());
        assert!(dir.path().join("closed.xlsx").exists());
    }

    #[test]
    fn test_header_width_mismatch_is_rejected() {
        let df_data = crate::util::derive_text_dataframe(
            &["c0".to_string(), "c1".to_string()],
            vec![vec![Some("a".to_string())], vec![None]],
        )
        .unwrap();
        let df_header = crate::util::derive_text_dataframe(
            &["c0".to_string()],
            vec![vec![Some("".to_string())]],
        )
        .unwrap();

        let mut writer = XlsxWriter::with_defaults(PathBuf::from("unused.xlsx")).unwrap();
        let err = writer
            .write_sheet_from_dataframes(
                &df_data,
                "Tracking",
                Some(&df_header),
                &SpecXlsxSheetWriteOptions::default(),
            )
            .unwrap_err();
        assert_eq!(err, "df_header.width must equal df.width.");
    }
}
