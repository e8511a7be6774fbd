//! `irlkit_request` v1:
//! Audit request sampler.
//!
//! Turns an inventory workbook (hosts grouped by platform) and a
//! request-template workbook into a request list and a host tracking grid.
//!
//! Module layout:
//! - `inventory`    : inventory sheet reader
//! - `catalog`      : request-template catalog
//! - `compile`      : request compiler (records + reference index)
//! - `request_list` : request list projection and writer
//! - `palette`      : platform color allocation
//! - `tracking`     : tracking grid builder and writer
//! - `run`          : pipeline orchestration
//! - `report`       : run report model
//! - `spec`/`conf`  : models, options, errors and constants

pub mod catalog;
pub mod compile;
pub mod conf;
pub mod inventory;
pub mod palette;
pub mod report;
pub mod request_list;
pub mod run;
pub mod spec;
pub mod tracking;

pub use catalog::{SpecTemplateCatalog, load_template_catalog};
pub use compile::{SpecTemplatePlan, compile_requests, plan_template_columns};
pub use inventory::{read_inventory, read_inventory_file};
pub use palette::PaletteAllocator;
pub use report::{ReportSampler, ReportSamplerBuilder};
pub use request_list::{
    EnumRequestListColumn, SpecRequestListTable, build_request_list,
    derive_request_list_dataframe, write_request_list,
};
pub use run::{
    SpecOutputPaths, derive_output_paths, run_sampler, write_unsupported_audit_type_report,
};
pub use spec::{
    EnumAuditType, RequestId, SamplerError, SpecAuditContext, SpecCompiledRequests,
    SpecInventory, SpecInventoryLayout, SpecReferenceIndex, SpecRequestArena, SpecRequestRecord,
    SpecSamplerOptions, SpecTrackingStyle,
};
pub use tracking::{
    SpecTrackingGrid, SpecTrackingHost, build_tracking_grid, derive_tracking_dataframes,
    extract_reference_ids, write_tracking_grid,
};
