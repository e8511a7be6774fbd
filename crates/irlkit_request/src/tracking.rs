//! Tracking grid: reference IDs down, hosts across, default-deny marking.
//!
//! A cell is applicable (blank) unless its host has an entry in the
//! reference index and the row's reference is missing from that entry, in
//! which case it is marked `N/A`.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use irlkit_io_xlsx::{
    EnumAutofitColumnsRule, SpecAutofitCellsPolicy, SpecCellFormat, SpecXlsxReport,
    SpecXlsxSheetWriteOptions, XlsxWriter, derive_text_dataframe,
};
use polars::prelude::DataFrame;
use regex::Regex;
use tracing::{info, warn};

use crate::conf::{C_SHEET_TRACKING, C_VALUE_NOT_APPLICABLE};
use crate::palette::PaletteAllocator;
use crate::report::merge_xlsx_reports;
use crate::spec::{
    SamplerError, SpecInventory, SpecReferenceIndex, SpecRequestArena, SpecTrackingStyle,
};

////////////////////////////////////////////////////////////////////////////////
// #region ReferenceExtraction

/// Compile the reference-ID pattern.
pub fn compile_reference_pattern(pattern: &str) -> Result<Regex, SamplerError> {
    Regex::new(pattern).map_err(|err| SamplerError::InvalidPattern(format!("{pattern:?}: {err}")))
}

/// Every match of `re_reference` in `text`, in order, duplicates kept.
pub fn extract_reference_ids(text: &str, re_reference: &Regex) -> Vec<String> {
    re_reference
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Flatten all records (keys and values) into one searchable text.
pub fn serialize_records(arena: &SpecRequestArena) -> String {
    let mut c_text = String::new();
    for (_, record) in arena.iter() {
        for (key, value) in &record.values {
            c_text.push_str(key);
            c_text.push('\t');
            c_text.push_str(value);
            c_text.push('\n');
        }
    }
    c_text
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Grid

/// One host column of the tracking grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecTrackingHost {
    /// Header text.
    pub hostname: String,
    /// Platform the host was listed under.
    pub platform: String,
    /// Header fill, shared by every host of the platform.
    pub color: Option<String>,
}

/// Host × reference applicability matrix.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecTrackingGrid {
    /// Sorted, distinct reference IDs (row labels).
    pub references: Vec<String>,
    /// Host columns in platform-then-insertion order.
    pub hosts: Vec<SpecTrackingHost>,
    /// `[row][col]` not-applicable flags.
    pub not_applicable: Vec<Vec<bool>>,
    /// Non-fatal notes raised while building.
    pub warnings: Vec<String>,
}

impl SpecTrackingGrid {
    /// `true` when `(row, col)` is marked not applicable.
    pub fn is_not_applicable(&self, n_idx_row: usize, n_idx_col: usize) -> bool {
        self.not_applicable
            .get(n_idx_row)
            .and_then(|row| row.get(n_idx_col))
            .copied()
            .unwrap_or(false)
    }

    /// Number of marked cells.
    pub fn count_not_applicable(&self) -> usize {
        self.not_applicable
            .iter()
            .map(|row| row.iter().filter(|flag| **flag).count())
            .sum()
    }

    /// Longest hostname in characters.
    pub fn max_hostname_len(&self) -> usize {
        self.hosts
            .iter()
            .map(|host| host.hostname.chars().count())
            .max()
            .unwrap_or(0)
    }
}

/// Build the tracking grid.
pub fn build_tracking_grid(
    inventory: &SpecInventory,
    arena: &SpecRequestArena,
    index: &SpecReferenceIndex,
    palette: &mut PaletteAllocator,
    re_reference: &Regex,
) -> SpecTrackingGrid {
    let set_references: BTreeSet<String> =
        extract_reference_ids(&serialize_records(arena), re_reference)
            .into_iter()
            .collect();
    let l_references: Vec<String> = set_references.into_iter().collect();

    let mut grid = SpecTrackingGrid::default();
    for (platform, l_hosts) in inventory.iter() {
        let color = palette.next_color();
        grid.hosts.extend(l_hosts.iter().map(|hostname| SpecTrackingHost {
            hostname: hostname.clone(),
            platform: platform.to_string(),
            color: color.clone(),
        }));
    }
    if palette.has_wrapped() {
        let c_msg = format!(
            "{} platforms share a smaller palette; header colors repeat.",
            inventory.platform_count()
        );
        warn!("{c_msg}");
        grid.warnings.push(c_msg);
    }

    // Index keys differing only by case feed the same columns.
    let mut dict_allowed_by_host: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for (hostname, l_refs) in index.iter() {
        dict_allowed_by_host
            .entry(hostname.to_lowercase())
            .or_default()
            .extend(extract_reference_ids(&l_refs.join("\n"), re_reference));
    }

    grid.not_applicable = vec![vec![false; grid.hosts.len()]; l_references.len()];
    for (n_idx_col, host) in grid.hosts.iter().enumerate() {
        let Some(set_allowed) = dict_allowed_by_host.get(&host.hostname.to_lowercase()) else {
            continue;
        };
        for (n_idx_row, c_ref) in l_references.iter().enumerate() {
            if !set_allowed.contains(c_ref) {
                grid.not_applicable[n_idx_row][n_idx_col] = true;
            }
        }
    }
    grid.references = l_references;
    grid
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Writer

/// Build `(data, header)` DataFrames for the writer.
///
/// Hostnames may repeat, so columns are named positionally and the header
/// row comes from the second frame.
pub fn derive_tracking_dataframes(
    grid: &SpecTrackingGrid,
) -> Result<(DataFrame, DataFrame), SamplerError> {
    let n_width = grid.hosts.len() + 1;
    let l_names: Vec<String> = (0..n_width).map(|n_idx| format!("c{n_idx}")).collect();

    let mut l_data_by_col: Vec<Vec<Option<String>>> = Vec::with_capacity(n_width);
    l_data_by_col.push(grid.references.iter().cloned().map(Some).collect());
    for n_idx_col in 0..grid.hosts.len() {
        l_data_by_col.push(
            (0..grid.references.len())
                .map(|n_idx_row| {
                    grid.is_not_applicable(n_idx_row, n_idx_col)
                        .then(|| C_VALUE_NOT_APPLICABLE.to_string())
                })
                .collect(),
        );
    }

    let mut l_header_by_col: Vec<Vec<Option<String>>> = Vec::with_capacity(n_width);
    l_header_by_col.push(vec![Some(String::new())]);
    l_header_by_col.extend(grid.hosts.iter().map(|host| vec![Some(host.hostname.clone())]));

    let df_data = derive_text_dataframe(&l_names, l_data_by_col).map_err(SamplerError::Table)?;
    let df_header =
        derive_text_dataframe(&l_names, l_header_by_col).map_err(SamplerError::Table)?;
    Ok((df_data, df_header))
}

/// Sheet options carrying header colors, N/A fills and host widths.
pub fn derive_tracking_write_options(
    grid: &SpecTrackingGrid,
    style: &SpecTrackingStyle,
) -> SpecXlsxSheetWriteOptions {
    let n_width_host = (grid.max_hostname_len() + style.width_host_padding) as f64;

    let mut fmts_header_by_col = BTreeMap::new();
    let mut widths_by_col = BTreeMap::new();
    for (n_idx_host, host) in grid.hosts.iter().enumerate() {
        fmts_header_by_col.insert(
            n_idx_host + 1,
            SpecCellFormat {
                bold: Some(true),
                bg_color: host.color.clone(),
                ..Default::default()
            },
        );
        widths_by_col.insert(n_idx_host + 1, n_width_host);
    }

    let fmt_not_applicable = SpecCellFormat {
        bg_color: Some(style.color_not_applicable.clone()),
        ..Default::default()
    };
    let mut fmts_body_by_cell = BTreeMap::new();
    for (n_idx_row, row) in grid.not_applicable.iter().enumerate() {
        for (n_idx_host, if_marked) in row.iter().enumerate() {
            if *if_marked {
                fmts_body_by_cell.insert((n_idx_row, n_idx_host + 1), fmt_not_applicable.clone());
            }
        }
    }

    SpecXlsxSheetWriteOptions {
        col_freeze: 1,
        policy_autofit: SpecAutofitCellsPolicy {
            rule_columns: EnumAutofitColumnsRule::All,
            ..Default::default()
        },
        fmts_header_by_col,
        fmts_body_by_cell,
        widths_by_col,
        height_header_row: Some(style.height_header),
        ..Default::default()
    }
}

/// Write the tracking workbook to `path`.
pub fn write_tracking_grid(
    grid: &SpecTrackingGrid,
    path: &Path,
    style: &SpecTrackingStyle,
) -> Result<SpecXlsxReport, SamplerError> {
    let (df_data, df_header) = derive_tracking_dataframes(grid)?;
    let options = derive_tracking_write_options(grid, style);

    let mut writer = XlsxWriter::with_defaults(path.to_path_buf()).map_err(SamplerError::Workbook)?;
    writer
        .write_sheet_from_dataframes(&df_data, C_SHEET_TRACKING, Some(&df_header), &options)
        .map_err(SamplerError::Workbook)?;
    writer.close().map_err(SamplerError::Workbook)?;

    info!(
        path = %path.display(),
        n_references = grid.references.len(),
        n_hosts = grid.hosts.len(),
        n_not_applicable = grid.count_not_applicable(),
        "Wrote tracking grid"
    );
    Ok(merge_xlsx_reports(writer.report()))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conf::C_PATTERN_REFERENCE_ID;
    use crate::spec::SpecRequestRecord;
    use pretty_assertions::assert_eq;

    fn derive_pattern() -> Regex {
        compile_reference_pattern(C_PATTERN_REFERENCE_ID).unwrap()
    }

    fn derive_record(platform: &str, l_pairs: &[(&str, &str)]) -> SpecRequestRecord {
        SpecRequestRecord {
            platform: platform.to_string(),
            sheet_name: platform.to_string(),
            values: l_pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    #[test]
    fn test_extract_reference_ids() {
        let re_reference = derive_pattern();
        assert_eq!(
            extract_reference_ids("see ABC-001, XY-12 and Q-9999; abc-001", &re_reference),
            vec!["ABC-001".to_string(), "Q-999".to_string()]
        );
    }

    #[test]
    fn test_invalid_pattern_is_reported() {
        let err = compile_reference_pattern("[A-Z").err().unwrap();
        assert!(matches!(err, SamplerError::InvalidPattern(_)));
    }

    #[test]
    fn test_grid_marks_missing_references_per_host() {
        let mut inventory = SpecInventory::default();
        inventory.push("Windows", "SRV01");
        inventory.push("Windows", "srv02");
        inventory.push("Linux", "lnx01");
        inventory.push("Mainframe", "mf01");

        let mut arena = SpecRequestArena::default();
        arena.push(derive_record("Windows", &[("Global Reference", "WIN-001")]));
        arena.push(derive_record("Windows", &[("Global Reference", "GEN-001")]));
        arena.push(derive_record("Linux", &[("Global Reference", "LNX-001")]));
        arena.push(derive_record("Linux", &[("Global Reference", "GEN-001")]));

        let mut index = SpecReferenceIndex::default();
        for host in ["srv01", "srv02"] {
            index.push(host, "WIN-001");
            index.push(host, "GEN-001");
        }
        index.push("lnx01", "LNX-001");
        index.push("lnx01", "GEN-001");

        let mut palette = PaletteAllocator::new(&SpecTrackingStyle::default());
        let grid = build_tracking_grid(&inventory, &arena, &index, &mut palette, &derive_pattern());

        assert_eq!(grid.references, vec!["GEN-001", "LNX-001", "WIN-001"]);
        assert_eq!(
            grid.hosts
                .iter()
                .map(|host| host.hostname.as_str())
                .collect::<Vec<_>>(),
            vec!["SRV01", "srv02", "lnx01", "mf01"]
        );
        assert_eq!(grid.hosts[0].color, grid.hosts[1].color);
        assert_ne!(grid.hosts[0].color, grid.hosts[2].color);

        // GEN-001 applies everywhere.
        assert!((0..4).all(|n_idx_col| !grid.is_not_applicable(0, n_idx_col)));
        // LNX-001 is not applicable to Windows hosts (header match ignores case).
        assert!(grid.is_not_applicable(1, 0));
        assert!(grid.is_not_applicable(1, 1));
        assert!(!grid.is_not_applicable(1, 2));
        // WIN-001 is not applicable to the Linux host.
        assert!(grid.is_not_applicable(2, 2));
        // Hosts without an index entry stay applicable.
        assert!((0..3).all(|n_idx_row| !grid.is_not_applicable(n_idx_row, 3)));
        assert_eq!(grid.count_not_applicable(), 3);
        assert!(grid.warnings.is_empty());
    }

    #[test]
    fn test_hosts_differing_by_case_share_reference_union() {
        let mut inventory = SpecInventory::default();
        inventory.push("Windows", "SRV01");
        inventory.push("Linux", "srv01");
        inventory.push("Linux", "lnx01");

        let mut arena = SpecRequestArena::default();
        arena.push(derive_record("Windows", &[("Global Reference", "WIN-001")]));
        arena.push(derive_record("Linux", &[("Global Reference", "LNX-001")]));

        let mut index = SpecReferenceIndex::default();
        index.push("SRV01", "WIN-001");
        index.push("srv01", "LNX-001");
        index.push("lnx01", "LNX-001");

        let mut palette = PaletteAllocator::new(&SpecTrackingStyle::default());
        let grid = build_tracking_grid(&inventory, &arena, &index, &mut palette, &derive_pattern());

        assert_eq!(grid.references, vec!["LNX-001", "WIN-001"]);
        assert_eq!(
            grid.not_applicable,
            vec![vec![false, false, false], vec![false, false, true]]
        );
        assert_eq!(grid.count_not_applicable(), 1);
    }

    #[test]
    fn test_palette_wrap_is_recorded() {
        let mut inventory = SpecInventory::default();
        for n_idx in 0..3 {
            inventory.push(format!("P{n_idx}"), format!("h{n_idx}"));
        }
        let style = SpecTrackingStyle {
            palette: vec!["#111111".to_string(), "#222222".to_string()],
            ..Default::default()
        };
        let mut palette = PaletteAllocator::new(&style);
        let grid = build_tracking_grid(
            &inventory,
            &SpecRequestArena::default(),
            &SpecReferenceIndex::default(),
            &mut palette,
            &derive_pattern(),
        );
        assert_eq!(grid.hosts[2].color.as_deref(), Some("#111111"));
        assert_eq!(grid.warnings.len(), 1);
        assert!(grid.references.is_empty());
    }

    #[test]
    fn test_dataframes_allow_duplicate_hostnames() {
        let grid = SpecTrackingGrid {
            references: vec!["ABC-001".to_string()],
            hosts: vec![
                SpecTrackingHost {
                    hostname: "srv01".to_string(),
                    platform: "Windows".to_string(),
                    color: None,
                },
                SpecTrackingHost {
                    hostname: "srv01".to_string(),
                    platform: "Windows".to_string(),
                    color: None,
                },
            ],
            not_applicable: vec![vec![false, true]],
            warnings: vec![],
        };
        let (df_data, df_header) = derive_tracking_dataframes(&grid).unwrap();
        assert_eq!(df_data.width(), 3);
        assert_eq!(df_data.height(), 1);
        assert_eq!(df_header.height(), 1);

        let options = derive_tracking_write_options(&grid, &SpecTrackingStyle::default());
        assert_eq!(options.fmts_body_by_cell.len(), 1);
        assert!(options.fmts_body_by_cell.contains_key(&(0, 2)));
        assert_eq!(options.widths_by_col.get(&1), Some(&8.0));
        assert_eq!(options.height_header_row, Some(30.0));
    }
}
