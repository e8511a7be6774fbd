//! Inventory reader: platform/host grouping plus the audit context cells.

use std::path::Path;

use irlkit_io_xlsx::{SpecSheetGrid, XlsxReader, parse_cell_reference};
use tracing::{debug, info};

use crate::spec::{
    EnumAuditType, SamplerError, SpecAuditContext, SpecInventory, SpecInventoryLayout,
};

/// Read inventory and audit context from an already loaded sheet.
///
/// Rows from `layout.row_data_start` on are kept when column A is non-empty;
/// column B is taken verbatim, blanks included.
pub fn read_inventory(
    grid: &SpecSheetGrid,
    layout: &SpecInventoryLayout,
) -> Result<(SpecInventory, SpecAuditContext), SamplerError> {
    let (n_row_client, n_col_client) =
        parse_cell_reference(&layout.cell_client_name).map_err(SamplerError::InvalidLayout)?;
    let (n_row_audit, n_col_audit) =
        parse_cell_reference(&layout.cell_audit_type).map_err(SamplerError::InvalidLayout)?;
    if layout.row_data_start == 0 {
        return Err(SamplerError::InvalidLayout(
            "Data start row is 1-based and must be >= 1.".to_string(),
        ));
    }

    let client_name = grid.cell(n_row_client, n_col_client).to_text().trim().to_string();
    if client_name.is_empty() {
        return Err(SamplerError::MissingClientName);
    }

    let c_audit_type = grid.cell(n_row_audit, n_col_audit).to_text();
    let audit_type = c_audit_type
        .parse::<EnumAuditType>()
        .map_err(|value| SamplerError::UnsupportedAuditType {
            value,
            client_name: client_name.clone(),
        })?;

    let mut inventory = SpecInventory::default();
    for n_idx_row in (layout.row_data_start - 1)..grid.height() {
        let cell_platform = grid.cell(n_idx_row, 0);
        if cell_platform.is_empty() {
            continue;
        }
        inventory.push(cell_platform.to_text(), grid.cell(n_idx_row, 1).to_text());
    }

    for (platform, l_hosts) in inventory.iter() {
        debug!(platform, n_hosts = l_hosts.len(), "Inventory platform");
    }

    Ok((
        inventory,
        SpecAuditContext {
            client_name,
            audit_type,
        },
    ))
}

/// Open the inventory workbook and read its inventory sheet.
pub fn read_inventory_file(
    path: &Path,
    layout: &SpecInventoryLayout,
) -> Result<(SpecInventory, SpecAuditContext), SamplerError> {
    let mut reader = XlsxReader::open(path).map_err(SamplerError::Workbook)?;
    if !reader.has_sheet(&layout.sheet_name) {
        return Err(SamplerError::MissingSheet {
            sheet: layout.sheet_name.clone(),
            path: reader.file_in(),
        });
    }
    let grid = reader
        .read_sheet(&layout.sheet_name)
        .map_err(SamplerError::Workbook)?;

    let (inventory, context) = read_inventory(&grid, layout)?;
    info!(
        client = %context.client_name,
        audit_type = %context.audit_type,
        n_platforms = inventory.platform_count(),
        n_hosts = inventory.host_count(),
        "Read inventory"
    );
    Ok((inventory, context))
}

#[cfg(test)]
mod tests {
    use super::*;
    use irlkit_io_xlsx::EnumCellValue;
    use pretty_assertions::assert_eq;

    fn s(value: &str) -> EnumCellValue {
        EnumCellValue::String(value.to_string())
    }

    fn derive_inventory_grid(
        client_name: EnumCellValue,
        audit_type: EnumCellValue,
        l_rows: Vec<Vec<EnumCellValue>>,
    ) -> SpecSheetGrid {
        let mut l_grid_rows = vec![vec![]; 8];
        l_grid_rows[3] = vec![s("Client"), client_name];
        l_grid_rows[4] = vec![s("Audit"), audit_type];
        l_grid_rows.extend(l_rows);
        SpecSheetGrid::new("Sample", l_grid_rows)
    }

    #[test]
    fn test_read_inventory_groups_rows_by_platform() {
        let grid = derive_inventory_grid(
            s("Acme"),
            s("pci"),
            vec![
                vec![s("Windows"), s("srv01")],
                vec![EnumCellValue::None, s("orphan")],
                vec![s("Linux"), s("lnx01")],
                vec![s("Windows"), s("srv02")],
                vec![s("Windows")],
            ],
        );

        let (inventory, context) = read_inventory(&grid, &SpecInventoryLayout::default()).unwrap();
        assert_eq!(context.client_name, "Acme");
        assert_eq!(context.audit_type, EnumAuditType::Pci);
        assert_eq!(
            inventory.hosts("Windows").unwrap(),
            &["srv01".to_string(), "srv02".to_string(), String::new()]
        );
        assert_eq!(inventory.hosts("Linux").unwrap(), &["lnx01".to_string()]);
        assert_eq!(inventory.host_count(), 4);
        assert_eq!(
            inventory.iter().map(|(platform, _)| platform).collect::<Vec<_>>(),
            vec!["Windows", "Linux"]
        );
    }

    #[test]
    fn test_numeric_hostnames_render_as_integers() {
        let grid = derive_inventory_grid(
            s("Acme"),
            s("SOC"),
            vec![vec![s("Appliance"), EnumCellValue::Number(1001.0)]],
        );
        let (inventory, _) = read_inventory(&grid, &SpecInventoryLayout::default()).unwrap();
        assert_eq!(inventory.hosts("Appliance").unwrap(), &["1001".to_string()]);
    }

    #[test]
    fn test_unsupported_audit_type_fails_before_rows_are_read() {
        let grid = derive_inventory_grid(
            s("Acme"),
            s("SOX"),
            vec![vec![s("Windows"), s("srv01")]],
        );
        let err = read_inventory(&grid, &SpecInventoryLayout::default())
            .err()
            .unwrap();
        match err {
            SamplerError::UnsupportedAuditType { value, client_name } => {
                assert_eq!(value, "SOX");
                assert_eq!(client_name, "Acme");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_blank_client_name_is_rejected() {
        let grid = derive_inventory_grid(EnumCellValue::None, s("ISO"), vec![]);
        let err = read_inventory(&grid, &SpecInventoryLayout::default())
            .err()
            .unwrap();
        assert!(matches!(err, SamplerError::MissingClientName));
    }

    #[test]
    fn test_invalid_layout_cell_is_rejected() {
        let grid = derive_inventory_grid(s("Acme"), s("ISO"), vec![]);
        let layout = SpecInventoryLayout {
            cell_client_name: "4B".to_string(),
            ..Default::default()
        };
        let err = read_inventory(&grid, &layout).err().unwrap();
        assert!(matches!(err, SamplerError::InvalidLayout(_)));
    }
}
