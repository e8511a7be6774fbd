//! Sampler specification models, options and top-level error types.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use indexmap::IndexMap;

use crate::conf::{
    C_CELL_AUDIT_TYPE, C_CELL_CLIENT_NAME, C_COLOR_NOT_APPLICABLE, C_FILE_REQUESTS_DEFAULT,
    C_PATTERN_REFERENCE_ID, C_SHEET_INVENTORY, N_HEIGHT_TRACKING_HEADER,
    N_ROW_INVENTORY_DATA_START, N_WIDTH_HOST_PADDING, TUP_PALETTE_PLATFORM,
};

////////////////////////////////////////////////////////////////////////////////
// #region AuditContext

/// Supported compliance frameworks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnumAuditType {
    /// PCI DSS.
    Pci,
    /// ISO 27001.
    Iso,
    /// SOC 1/2.
    Soc,
    /// HIPAA.
    Hipaa,
    /// HITRUST CSF.
    Hitrust,
}

impl EnumAuditType {
    /// Every supported audit type.
    pub const ALL: [EnumAuditType; 5] = [
        EnumAuditType::Pci,
        EnumAuditType::Iso,
        EnumAuditType::Soc,
        EnumAuditType::Hipaa,
        EnumAuditType::Hitrust,
    ];

    /// Canonical token as it appears in template headers.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pci => "PCI",
            Self::Iso => "ISO",
            Self::Soc => "SOC",
            Self::Hipaa => "HIPAA",
            Self::Hitrust => "HITRUST",
        }
    }
}

impl fmt::Display for EnumAuditType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EnumAuditType {
    type Err = String;

    /// Case-insensitive, whitespace-trimmed parse.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let c_value = s.trim();
        Self::ALL
            .into_iter()
            .find(|audit_type| audit_type.as_str().eq_ignore_ascii_case(c_value))
            .ok_or_else(|| c_value.to_string())
    }
}

/// Run-wide scalars read from the inventory header cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecAuditContext {
    /// Client name; output file names derive from it.
    pub client_name: String,
    /// Validated audit type.
    pub audit_type: EnumAuditType,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Inventory

/// Hosts grouped by platform, both in spreadsheet order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecInventory {
    dict_hosts_by_platform: IndexMap<String, Vec<String>>,
}

impl SpecInventory {
    /// Append `hostname` to `platform`, creating the group on first sight.
    pub fn push(&mut self, platform: impl Into<String>, hostname: impl Into<String>) {
        self.dict_hosts_by_platform
            .entry(platform.into())
            .or_default()
            .push(hostname.into());
    }

    /// Iterate `(platform, hosts)` in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.dict_hosts_by_platform
            .iter()
            .map(|(platform, l_hosts)| (platform.as_str(), l_hosts.as_slice()))
    }

    /// Hosts of one platform.
    pub fn hosts(&self, platform: &str) -> Option<&[String]> {
        self.dict_hosts_by_platform
            .get(platform)
            .map(Vec::as_slice)
    }

    /// Number of platform groups.
    pub fn platform_count(&self) -> usize {
        self.dict_hosts_by_platform.len()
    }

    /// Number of host entries across all platforms (duplicates counted).
    pub fn host_count(&self) -> usize {
        self.dict_hosts_by_platform.values().map(Vec::len).sum()
    }

    /// `true` when no platform was read.
    pub fn is_empty(&self) -> bool {
        self.dict_hosts_by_platform.is_empty()
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region RequestRecords

/// Arena handle of a request record.
///
/// Handles are allocated in creation order across the whole run and mean
/// nothing beyond that order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(pub usize);

/// One template data row resolved for one platform.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecRequestRecord {
    /// Platform whose hosts were substituted.
    pub platform: String,
    /// Template sheet the row came from.
    pub sheet_name: String,
    /// Applicable column header to resolved text, in column order.
    pub values: IndexMap<String, String>,
}

impl SpecRequestRecord {
    /// `true` when no applicable column held content.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Append-only record storage indexed by [`RequestId`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecRequestArena {
    l_records: Vec<SpecRequestRecord>,
}

impl SpecRequestArena {
    /// Store `record` and return its handle.
    pub fn push(&mut self, record: SpecRequestRecord) -> RequestId {
        self.l_records.push(record);
        RequestId(self.l_records.len() - 1)
    }

    /// Look up a record.
    pub fn get(&self, id: RequestId) -> Option<&SpecRequestRecord> {
        self.l_records.get(id.0)
    }

    /// Iterate records in handle order.
    pub fn iter(&self) -> impl Iterator<Item = (RequestId, &SpecRequestRecord)> {
        self.l_records
            .iter()
            .enumerate()
            .map(|(n_idx, record)| (RequestId(n_idx), record))
    }

    /// Number of allocated handles, empty records included.
    pub fn len(&self) -> usize {
        self.l_records.len()
    }

    /// `true` when nothing was allocated.
    pub fn is_empty(&self) -> bool {
        self.l_records.is_empty()
    }

    /// Number of records with no content.
    pub fn empty_count(&self) -> usize {
        self.l_records.iter().filter(|r| r.is_empty()).count()
    }
}

/// Hostname to reference strings from every record that covered the host.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecReferenceIndex {
    dict_refs_by_host: IndexMap<String, Vec<String>>,
}

impl SpecReferenceIndex {
    /// Append `reference` to `hostname`'s list.
    pub fn push(&mut self, hostname: &str, reference: impl Into<String>) {
        self.dict_refs_by_host
            .entry(hostname.to_string())
            .or_default()
            .push(reference.into());
    }

    /// References recorded for `hostname`.
    pub fn get(&self, hostname: &str) -> Option<&[String]> {
        self.dict_refs_by_host.get(hostname).map(Vec::as_slice)
    }

    /// Iterate `(hostname, references)` in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.dict_refs_by_host
            .iter()
            .map(|(host, l_refs)| (host.as_str(), l_refs.as_slice()))
    }

    /// Number of hosts with at least one reference.
    pub fn len(&self) -> usize {
        self.dict_refs_by_host.len()
    }

    /// `true` when no reference was recorded.
    pub fn is_empty(&self) -> bool {
        self.dict_refs_by_host.is_empty()
    }
}

/// Request compiler output.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecCompiledRequests {
    /// Records in handle order.
    pub records: SpecRequestArena,
    /// Reference index by host.
    pub references: SpecReferenceIndex,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Options

/// Fixed positions inside the inventory workbook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecInventoryLayout {
    /// Sheet holding the inventory.
    pub sheet_name: String,
    /// A1 reference of the client name cell.
    pub cell_client_name: String,
    /// A1 reference of the audit type cell.
    pub cell_audit_type: String,
    /// First data row, 1-based.
    pub row_data_start: usize,
}

impl Default for SpecInventoryLayout {
    fn default() -> Self {
        Self {
            sheet_name: C_SHEET_INVENTORY.to_string(),
            cell_client_name: C_CELL_CLIENT_NAME.to_string(),
            cell_audit_type: C_CELL_AUDIT_TYPE.to_string(),
            row_data_start: N_ROW_INVENTORY_DATA_START,
        }
    }
}

/// Immutable tracking-grid styling injected into the grid writer.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecTrackingStyle {
    /// Platform header colors, handed out in order.
    pub palette: Vec<String>,
    /// Fill of not-applicable cells.
    pub color_not_applicable: String,
    /// Header row height.
    pub height_header: f64,
    /// Padding added to the longest host name for column width.
    pub width_host_padding: usize,
}

impl Default for SpecTrackingStyle {
    fn default() -> Self {
        Self {
            palette: TUP_PALETTE_PLATFORM.iter().map(ToString::to_string).collect(),
            color_not_applicable: C_COLOR_NOT_APPLICABLE.to_string(),
            height_header: N_HEIGHT_TRACKING_HEADER,
            width_host_padding: N_WIDTH_HOST_PADDING,
        }
    }
}

/// Input options for `run_sampler`.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecSamplerOptions {
    /// Inventory workbook.
    pub path_inventory: PathBuf,
    /// Request-template workbook.
    pub path_requests: PathBuf,
    /// Directory receiving output workbooks.
    pub path_dir_out: PathBuf,
    /// Inventory cell positions.
    pub layout: SpecInventoryLayout,
    /// Tracking grid styling.
    pub style: SpecTrackingStyle,
    /// Reference-ID regex.
    pub pattern_reference_id: String,
}

impl Default for SpecSamplerOptions {
    fn default() -> Self {
        Self {
            path_inventory: PathBuf::new(),
            path_requests: PathBuf::from(C_FILE_REQUESTS_DEFAULT),
            path_dir_out: PathBuf::from("."),
            layout: SpecInventoryLayout::default(),
            style: SpecTrackingStyle::default(),
            pattern_reference_id: C_PATTERN_REFERENCE_ID.to_string(),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Errors

/// Fatal run errors; none of them leave partial output behind.
#[derive(Debug, thiserror::Error)]
pub enum SamplerError {
    /// Audit type cell holds an unsupported value.
    #[error("Unsupported audit type {value:?} for client {client_name:?}; expected one of PCI, ISO, SOC, HIPAA, HITRUST")]
    UnsupportedAuditType {
        /// Raw cell text.
        value: String,
        /// Client name read alongside, for error reporting.
        client_name: String,
    },
    /// Client name cell is blank.
    #[error("Client name cell is empty")]
    MissingClientName,
    /// Required sheet not found.
    #[error("Sheet {sheet:?} not found in {path}")]
    MissingSheet {
        /// Requested sheet name.
        sheet: String,
        /// Workbook path.
        path: String,
    },
    /// Template workbook lacks the fallback sheet.
    #[error("Request templates have no {sheet:?} fallback sheet")]
    MissingGenericSheet {
        /// Expected fallback sheet name.
        sheet: String,
    },
    /// Template sheet header has no reference column.
    #[error("Template sheet {sheet:?} has no header containing \"Reference\"")]
    MissingReferenceColumn {
        /// Template sheet name.
        sheet: String,
    },
    /// Inventory layout cannot be resolved.
    #[error("Invalid inventory layout: {0}")]
    InvalidLayout(String),
    /// Reference pattern does not compile.
    #[error("Invalid reference pattern: {0}")]
    InvalidPattern(String),
    /// Workbook read/write failure.
    #[error("{0}")]
    Workbook(String),
    /// DataFrame construction failure.
    #[error("Failed to build table: {0}")]
    Table(String),
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audit_type_parse_is_case_insensitive() {
        assert_eq!("pci".parse::<EnumAuditType>(), Ok(EnumAuditType::Pci));
        assert_eq!(" Hitrust ".parse::<EnumAuditType>(), Ok(EnumAuditType::Hitrust));
        assert_eq!("SOC".parse::<EnumAuditType>(), Ok(EnumAuditType::Soc));
        assert_eq!(
            "SOX".parse::<EnumAuditType>(),
            Err("SOX".to_string())
        );
        assert!("".parse::<EnumAuditType>().is_err());
    }

    #[test]
    fn test_inventory_keeps_first_seen_platform_order() {
        let mut inventory = SpecInventory::default();
        inventory.push("Windows", "srv02");
        inventory.push("Linux", "lnx01");
        inventory.push("Windows", "srv01");
        inventory.push("Windows", "srv01");

        let l_pairs: Vec<(&str, Vec<String>)> = inventory
            .iter()
            .map(|(platform, l_hosts)| (platform, l_hosts.to_vec()))
            .collect();
        assert_eq!(
            l_pairs,
            vec![
                (
                    "Windows",
                    vec!["srv02".to_string(), "srv01".to_string(), "srv01".to_string()]
                ),
                ("Linux", vec!["lnx01".to_string()]),
            ]
        );
        assert_eq!(inventory.platform_count(), 2);
        assert_eq!(inventory.host_count(), 4);
    }

    #[test]
    fn test_arena_handles_are_sequential() {
        let mut arena = SpecRequestArena::default();
        let id_a = arena.push(SpecRequestRecord::default());
        let id_b = arena.push(SpecRequestRecord::default());

        assert_eq!(id_a, RequestId(0));
        assert_eq!(id_b, RequestId(1));
        assert_eq!(arena.len(), 2);
        assert_eq!(arena.empty_count(), 2);
        assert!(arena.get(RequestId(2)).is_none());
    }
}
