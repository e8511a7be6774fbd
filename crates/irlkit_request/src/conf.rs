//! Sampler constants.

////////////////////////////////////////////////////////////////////////////////
// #region InventoryWorkbook

/// Local inventory workbook used when no path is given and the file exists.
pub const C_FILE_INVENTORY_DEFAULT: &str = "example_input.xlsx";
/// Inventory sheet name.
pub const C_SHEET_INVENTORY: &str = "Sample";
/// Client name cell.
pub const C_CELL_CLIENT_NAME: &str = "B4";
/// Audit type cell.
pub const C_CELL_AUDIT_TYPE: &str = "B5";
/// First inventory data row (1-based, as shown in Excel).
pub const N_ROW_INVENTORY_DATA_START: usize = 9;

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region TemplateWorkbook

/// Default request-template workbook file name.
pub const C_FILE_REQUESTS_DEFAULT: &str = "requests.xlsx";
/// Fallback template sheet for platforms without their own sheet.
pub const C_SHEET_TEMPLATE_GENERIC: &str = "generic";
/// Header token marking a column applicable to every audit type.
pub const C_HEADER_TOKEN_GLOBAL: &str = "Global";
/// Header token marking reference-ID columns.
pub const C_HEADER_TOKEN_REFERENCE: &str = "Reference";
/// Placeholder replaced by the platform's host list.
pub const C_TEMPLATE_MARKER: &str = "%%";
/// Separator used when joining host names into a template.
pub const C_HOST_JOIN_SEPARATOR: &str = ", ";
/// Reference-ID pattern (`ABC-123`).
pub const C_PATTERN_REFERENCE_ID: &str = r"[A-Z]+-[0-9]{3}";

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region OutputWorkbooks

/// Request list sheet name.
pub const C_SHEET_REQUEST_LIST: &str = "Request List";
/// Tracking grid sheet name.
pub const C_SHEET_TRACKING: &str = "Tracking";
/// Request list file name suffix after the client name.
pub const C_FILE_SUFFIX_REQUEST_LIST: &str = " - AuditSource Request List.xlsx";
/// Tracking grid file name suffix after the client name.
pub const C_FILE_SUFFIX_TRACKING: &str = " - System Evidence Tracking.xlsx";
/// Error report file name suffix after the client name.
pub const C_FILE_SUFFIX_ERROR_REPORT: &str = "-Requests.xlsx";
/// Error report message for unsupported audit types.
pub const C_MSG_UNSUPPORTED_AUDIT_TYPE: &str =
    "Unsupported audit type entered. Use a valid type as noted in the input template.";

/// Default for a missing "Population Request" value.
pub const C_DEFAULT_POPULATION_REQUEST: &str = "No";
/// Default for a missing "Evidence Form" value.
pub const C_DEFAULT_EVIDENCE_FORM: &str = "Documentation";
/// Tracking cell text for a request that does not apply to a host.
pub const C_VALUE_NOT_APPLICABLE: &str = "N/A";

/// Platform header colors, handed out in order.
pub const TUP_PALETTE_PLATFORM: [&str; 9] = [
    "#03990F", "#D2A2F2", "#8AF202", "#F7B2F2", "#02F2EE", "#EFC25F", "#EFF24D", "#CCFFCC",
    "#FFCCFF",
];
/// Fill for not-applicable tracking cells.
pub const C_COLOR_NOT_APPLICABLE: &str = "#BCB7B9";
/// Tracking header row height.
pub const N_HEIGHT_TRACKING_HEADER: f64 = 30.0;
/// Extra width added to the longest host name.
pub const N_WIDTH_HOST_PADDING: usize = 3;

// #endregion
////////////////////////////////////////////////////////////////////////////////
