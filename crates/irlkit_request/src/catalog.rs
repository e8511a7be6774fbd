//! Request-template workbook catalog.

use std::path::Path;

use indexmap::IndexMap;
use irlkit_io_xlsx::{SpecSheetGrid, XlsxReader};
use tracing::debug;

use crate::conf::C_SHEET_TEMPLATE_GENERIC;
use crate::spec::SamplerError;

/// Template sheets by name; always holds the fallback sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecTemplateCatalog {
    dict_sheets: IndexMap<String, SpecSheetGrid>,
    grid_generic: SpecSheetGrid,
}

impl SpecTemplateCatalog {
    /// Build a catalog from loaded sheets.
    ///
    /// Fails with [`SamplerError::MissingGenericSheet`] when no sheet is named
    /// `generic`.
    pub fn from_sheets(l_sheets: Vec<SpecSheetGrid>) -> Result<Self, SamplerError> {
        let dict_sheets: IndexMap<String, SpecSheetGrid> = l_sheets
            .into_iter()
            .map(|grid| (grid.sheet_name.clone(), grid))
            .collect();
        let grid_generic = dict_sheets
            .get(C_SHEET_TEMPLATE_GENERIC)
            .cloned()
            .ok_or_else(|| SamplerError::MissingGenericSheet {
                sheet: C_SHEET_TEMPLATE_GENERIC.to_string(),
            })?;
        Ok(Self {
            dict_sheets,
            grid_generic,
        })
    }

    /// Template sheet for `platform`: exact name match, else `generic`.
    ///
    /// The flag is `true` when the fallback was used.
    pub fn select_sheet(&self, platform: &str) -> (&SpecSheetGrid, bool) {
        match self.dict_sheets.get(platform) {
            Some(grid) => (grid, false),
            None => (&self.grid_generic, true),
        }
    }

    /// Sheet names in workbook order.
    pub fn sheet_names(&self) -> impl Iterator<Item = &str> {
        self.dict_sheets.keys().map(String::as_str)
    }

    /// Number of template sheets.
    pub fn len(&self) -> usize {
        self.dict_sheets.len()
    }

    /// Always `false` once built.
    pub fn is_empty(&self) -> bool {
        self.dict_sheets.is_empty()
    }
}

/// Load every sheet of the request-template workbook.
pub fn load_template_catalog(path: &Path) -> Result<SpecTemplateCatalog, SamplerError> {
    let mut reader = XlsxReader::open(path).map_err(SamplerError::Workbook)?;
    let l_sheets = reader.read_all_sheets().map_err(SamplerError::Workbook)?;
    debug!(
        path = %path.display(),
        n_sheets = l_sheets.len(),
        "Loaded request templates"
    );
    SpecTemplateCatalog::from_sheets(l_sheets)
}
