//! `irlkit_io_xlsx` v1:
//! Workbook I/O kernel for the request sampler.
//!
//! Module layout:
//! - `conf`   : constants and default presets
//! - `spec`   : specs/models/options
//! - `util`   : pure helper functions
//! - `reader` : worksheet to dense cell grid (calamine)
//! - `writer` : DataFrame to workbook writer kernel (rust_xlsxwriter)
pub mod conf;
pub mod reader;
pub mod spec;
pub mod util;
pub mod writer;

pub use conf::{
    N_LEN_EXCEL_SHEET_NAME_MAX, N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX, TUP_EXCEL_ILLEGAL,
};
pub use reader::XlsxReader;
pub use spec::{
    EnumAutofitColumnsRule, EnumCellValue, SpecAutofitCellsPolicy, SpecCellFormat,
    SpecSheetGrid, SpecSheetSummary, SpecXlsxReport, SpecXlsxWriteOptions,
};
pub use util::{
    derive_text_dataframe, format_number_text, parse_cell_reference, sanitize_file_stem,
    sanitize_sheet_name,
};
pub use writer::{SpecXlsxSheetWriteOptions, XlsxWriter};
