//! Request compiler.
//!
//! Joins the inventory against the template catalog: picks a sheet per
//! platform, keeps the columns applicable to the audit type, substitutes the
//! platform's host list into `%%` markers and indexes reference cells by host.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use irlkit_io_xlsx::SpecSheetGrid;
use tracing::{debug, info, warn};

use crate::catalog::SpecTemplateCatalog;
use crate::conf::{
    C_HEADER_TOKEN_GLOBAL, C_HEADER_TOKEN_REFERENCE, C_HOST_JOIN_SEPARATOR, C_TEMPLATE_MARKER,
};
use crate::spec::{
    EnumAuditType, SamplerError, SpecCompiledRequests, SpecInventory, SpecRequestRecord,
};

/// Column selection of one template sheet for one audit type.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecTemplatePlan {
    /// Applicable `(col_idx, header)` pairs in column order.
    pub l_applicable: Vec<(usize, String)>,
    /// Columns whose header contains `Reference`.
    pub l_reference_cols: Vec<usize>,
}

/// Plan the columns of `grid` for `audit_type`.
///
/// Only textual header cells take part; numeric or blank headers never match.
pub fn plan_template_columns(
    grid: &SpecSheetGrid,
    audit_type: EnumAuditType,
) -> Result<SpecTemplatePlan, SamplerError> {
    let mut plan = SpecTemplatePlan::default();
    for n_idx_col in 0..grid.width() {
        let cell = grid.cell(0, n_idx_col);
        if !cell.is_textual() {
            continue;
        }
        let c_header = cell.to_text();
        if c_header.contains(C_HEADER_TOKEN_GLOBAL) || c_header.contains(audit_type.as_str()) {
            plan.l_applicable.push((n_idx_col, c_header.clone()));
        }
        if c_header.contains(C_HEADER_TOKEN_REFERENCE) {
            plan.l_reference_cols.push(n_idx_col);
        }
    }

    if plan.l_reference_cols.is_empty() {
        return Err(SamplerError::MissingReferenceColumn {
            sheet: grid.sheet_name.clone(),
        });
    }
    Ok(plan)
}

/// Replace every template marker in `template` with the joined host list.
pub fn substitute_hosts(template: &str, l_hosts: &[String]) -> String {
    template.replace(C_TEMPLATE_MARKER, &l_hosts.join(C_HOST_JOIN_SEPARATOR))
}

/// Compile request records and the host reference index.
///
/// One record handle is allocated per template data row with a non-empty
/// first cell, even when no applicable column holds content.
pub fn compile_requests(
    inventory: &SpecInventory,
    audit_type: EnumAuditType,
    catalog: &SpecTemplateCatalog,
) -> Result<SpecCompiledRequests, SamplerError> {
    let mut compiled = SpecCompiledRequests::default();
    let mut dict_plans: BTreeMap<String, SpecTemplatePlan> = BTreeMap::new();

    for (platform, l_hosts) in inventory.iter() {
        let (grid, if_fallback) = catalog.select_sheet(platform);
        if if_fallback {
            warn!(
                platform,
                sheet = %grid.sheet_name,
                "No template sheet for platform; using fallback"
            );
        }

        let plan = match dict_plans.entry(grid.sheet_name.clone()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let plan = plan_template_columns(grid, audit_type)?;
                debug!(
                    sheet = %grid.sheet_name,
                    n_applicable = plan.l_applicable.len(),
                    n_reference_cols = plan.l_reference_cols.len(),
                    "Planned template columns"
                );
                entry.insert(plan)
            }
        };

        let n_records_before = compiled.records.len();
        for n_idx_row in 1..grid.height() {
            if grid.cell(n_idx_row, 0).is_empty() {
                continue;
            }

            let mut record = SpecRequestRecord {
                platform: platform.to_string(),
                sheet_name: grid.sheet_name.clone(),
                ..Default::default()
            };
            for (n_idx_col, c_header) in &plan.l_applicable {
                let cell = grid.cell(n_idx_row, *n_idx_col);
                if cell.is_empty() {
                    continue;
                }
                record
                    .values
                    .insert(c_header.clone(), substitute_hosts(&cell.to_text(), l_hosts));
            }
            compiled.records.push(record);

            for n_idx_col in &plan.l_reference_cols {
                let cell = grid.cell(n_idx_row, *n_idx_col);
                if cell.is_empty() {
                    continue;
                }
                let c_reference = cell.to_text();
                for hostname in l_hosts {
                    compiled.references.push(hostname, c_reference.clone());
                }
            }
        }
        debug!(
            platform,
            sheet = %grid.sheet_name,
            n_records = compiled.records.len() - n_records_before,
            "Compiled platform requests"
        );
    }

    info!(
        n_records = compiled.records.len(),
        n_empty = compiled.records.empty_count(),
        n_hosts_indexed = compiled.references.len(),
        "Compiled requests"
    );
    Ok(compiled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use irlkit_io_xlsx::EnumCellValue;
    use pretty_assertions::assert_eq;

    fn s(value: &str) -> EnumCellValue {
        EnumCellValue::String(value.to_string())
    }

    fn derive_windows_sheet(name: &str) -> SpecSheetGrid {
        SpecSheetGrid::new(
            name,
            vec![
                vec![
                    s("ID"),
                    s("Global-Note"),
                    s("PCI-Task"),
                    s("Reference"),
                    s("ISO-Task"),
                ],
                vec![
                    EnumCellValue::Number(1.0),
                    s("Check %% and %%"),
                    s("PCI only"),
                    s("ABC-001"),
                    s("ISO only"),
                ],
                vec![EnumCellValue::None, s("skipped"), s("x"), s("ABC-009")],
                vec![EnumCellValue::Number(2.0), EnumCellValue::None, EnumCellValue::None, s("ABC-002")],
            ],
        )
    }

    fn derive_inventory() -> SpecInventory {
        let mut inventory = SpecInventory::default();
        inventory.push("Windows", "srv01");
        inventory.push("Windows", "srv02");
        inventory
    }

    #[test]
    fn test_plan_ignores_non_textual_headers() {
        let grid = SpecSheetGrid::new(
            "generic",
            vec![vec![
                EnumCellValue::Number(7.0),
                s("Global Title"),
                EnumCellValue::None,
                s("HIPAA Scope"),
                s("Global Reference"),
            ]],
        );
        let plan = plan_template_columns(&grid, EnumAuditType::Hipaa).unwrap();
        assert_eq!(
            plan.l_applicable,
            vec![
                (1, "Global Title".to_string()),
                (3, "HIPAA Scope".to_string()),
                (4, "Global Reference".to_string()),
            ]
        );
        assert_eq!(plan.l_reference_cols, vec![4]);
    }

    #[test]
    fn test_plan_requires_reference_column() {
        let grid = SpecSheetGrid::new("Linux", vec![vec![s("Global Title")]]);
        let err = plan_template_columns(&grid, EnumAuditType::Pci).err().unwrap();
        match err {
            SamplerError::MissingReferenceColumn { sheet } => assert_eq!(sheet, "Linux"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_compile_substitutes_hosts_and_indexes_references() {
        let catalog = SpecTemplateCatalog::from_sheets(vec![
            derive_windows_sheet("Windows"),
            SpecSheetGrid::new("generic", vec![vec![s("Reference")]]),
        ])
        .unwrap();

        let compiled = compile_requests(&derive_inventory(), EnumAuditType::Pci, &catalog).unwrap();

        assert_eq!(compiled.records.len(), 2);
        let l_records: Vec<&SpecRequestRecord> =
            compiled.records.iter().map(|(_, record)| record).collect();
        assert_eq!(
            l_records[0]
                .values
                .iter()
                .map(|(k, v)| (k.as_str(), v.as_str()))
                .collect::<Vec<_>>(),
            vec![
                ("Global-Note", "Check srv01, srv02 and srv01, srv02"),
                ("PCI-Task", "PCI only"),
            ]
        );
        assert!(l_records[1].is_empty());
        assert_eq!(compiled.records.empty_count(), 1);

        let l_expected = ["ABC-001".to_string(), "ABC-002".to_string()];
        assert_eq!(compiled.references.get("srv01").unwrap(), &l_expected);
        assert_eq!(compiled.references.get("srv02").unwrap(), &l_expected);
    }

    #[test]
    fn test_unmatched_platform_uses_fallback_sheet() {
        let catalog = SpecTemplateCatalog::from_sheets(vec![derive_windows_sheet("generic")]).unwrap();
        let mut inventory = SpecInventory::default();
        inventory.push("Mainframe", "mf01");

        let compiled = compile_requests(&inventory, EnumAuditType::Iso, &catalog).unwrap();
        let (_, record) = compiled.records.iter().next().unwrap();
        assert_eq!(record.sheet_name, "generic");
        assert_eq!(record.platform, "Mainframe");
        assert_eq!(record.values.get("ISO-Task").map(String::as_str), Some("ISO only"));
        assert_eq!(record.values.get("Global-Note").map(String::as_str), Some("Check mf01 and mf01"));
        assert!(record.values.get("PCI-Task").is_none());
    }

    #[test]
    fn test_missing_reference_column_on_selected_sheet_is_fatal() {
        let catalog = SpecTemplateCatalog::from_sheets(vec![
            SpecSheetGrid::new("Windows", vec![vec![s("Global Title")]]),
            SpecSheetGrid::new("generic", vec![vec![s("Reference")]]),
        ])
        .unwrap();
        let err = compile_requests(&derive_inventory(), EnumAuditType::Pci, &catalog)
            .err()
            .unwrap();
        assert!(matches!(err, SamplerError::MissingReferenceColumn { .. }));
    }
}
