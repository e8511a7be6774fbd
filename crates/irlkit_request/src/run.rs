//! Sampler orchestration: read, compile, then write both workbooks.

use std::fs;
use std::path::{Path, PathBuf};

use irlkit_io_xlsx::{XlsxWriter, sanitize_file_stem};
use tracing::info;

use crate::catalog::load_template_catalog;
use crate::compile::compile_requests;
use crate::conf::{
    C_FILE_SUFFIX_ERROR_REPORT, C_FILE_SUFFIX_REQUEST_LIST, C_FILE_SUFFIX_TRACKING,
    C_MSG_UNSUPPORTED_AUDIT_TYPE, C_SHEET_REQUEST_LIST,
};
use crate::inventory::read_inventory_file;
use crate::palette::PaletteAllocator;
use crate::report::{ReportSampler, ReportSamplerBuilder};
use crate::request_list::{build_request_list, write_request_list};
use crate::spec::{SamplerError, SpecSamplerOptions};
use crate::tracking::{build_tracking_grid, compile_reference_pattern, write_tracking_grid};

/// Output workbook paths for one client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecOutputPaths {
    /// `<client> - AuditSource Request List.xlsx`
    pub path_request_list: PathBuf,
    /// `<client> - System Evidence Tracking.xlsx`
    pub path_tracking: PathBuf,
}

/// Derive output paths under `path_dir_out`; path separators in the client
/// name become `_`.
pub fn derive_output_paths(path_dir_out: &Path, client_name: &str) -> SpecOutputPaths {
    let c_stem = sanitize_file_stem(client_name, "_");
    SpecOutputPaths {
        path_request_list: path_dir_out.join(format!("{c_stem}{C_FILE_SUFFIX_REQUEST_LIST}")),
        path_tracking: path_dir_out.join(format!("{c_stem}{C_FILE_SUFFIX_TRACKING}")),
    }
}

/// Run the full pipeline.
///
/// Every input is read and compiled before the first workbook is written.
pub fn run_sampler(options: &SpecSamplerOptions) -> Result<ReportSampler, SamplerError> {
    let re_reference = compile_reference_pattern(&options.pattern_reference_id)?;
    let mut builder = ReportSamplerBuilder::default();

    let (inventory, context) = read_inventory_file(&options.path_inventory, &options.layout)?;
    builder.set_context(&context.client_name, context.audit_type.as_str());
    builder.add_counts(&["cnt_platforms"], inventory.platform_count() as u64);
    builder.add_counts(&["cnt_hosts"], inventory.host_count() as u64);

    let catalog = load_template_catalog(&options.path_requests)?;
    let compiled = compile_requests(&inventory, context.audit_type, &catalog)?;
    builder.add_counts(&["cnt_records"], compiled.records.len() as u64);
    builder.add_counts(&["cnt_records_empty"], compiled.records.empty_count() as u64);

    let table_requests = build_request_list(&compiled.records);
    let mut palette = PaletteAllocator::new(&options.style);
    let grid = build_tracking_grid(
        &inventory,
        &compiled.records,
        &compiled.references,
        &mut palette,
        &re_reference,
    );
    builder.add_counts(&["cnt_request_rows"], table_requests.height() as u64);
    builder.add_counts(&["cnt_references"], grid.references.len() as u64);
    builder.add_counts(&["cnt_not_applicable"], grid.count_not_applicable() as u64);
    for warning in &grid.warnings {
        builder.add_warning(warning.clone());
    }

    ensure_dir_out(&options.path_dir_out)?;
    let paths = derive_output_paths(&options.path_dir_out, &context.client_name);
    let report_requests = write_request_list(&table_requests, &paths.path_request_list)?;
    builder.add_written(paths.path_request_list, report_requests);
    let report_tracking = write_tracking_grid(&grid, &paths.path_tracking, &options.style)?;
    builder.add_written(paths.path_tracking, report_tracking);

    let report = builder.build();
    info!("{report}");
    Ok(report)
}

/// Write the one-cell workbook telling the user the audit type is unsupported.
///
/// Returns the path written: `<client>-Requests.xlsx` under `path_dir_out`.
pub fn write_unsupported_audit_type_report(
    path_dir_out: &Path,
    client_name: &str,
) -> Result<PathBuf, SamplerError> {
    ensure_dir_out(path_dir_out)?;
    let path_out = path_dir_out.join(format!(
        "{}{C_FILE_SUFFIX_ERROR_REPORT}",
        sanitize_file_stem(client_name, "_")
    ));

    let mut writer = XlsxWriter::with_defaults(path_out.clone()).map_err(SamplerError::Workbook)?;
    writer
        .write_sheet_message(C_SHEET_REQUEST_LIST, C_MSG_UNSUPPORTED_AUDIT_TYPE)
        .map_err(SamplerError::Workbook)?;
    writer.close().map_err(SamplerError::Workbook)?;

    info!(path = %path_out.display(), "Wrote unsupported audit type report");
    Ok(path_out)
}

fn ensure_dir_out(path_dir_out: &Path) -> Result<(), SamplerError> {
    if path_dir_out.as_os_str().is_empty() || path_dir_out.is_dir() {
        return Ok(());
    }
    fs::create_dir_all(path_dir_out).map_err(|err| {
        SamplerError::Workbook(format!(
            "Failed to create output directory {}: {err}",
            path_dir_out.display()
        ))
    })
}
