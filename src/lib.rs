//! Slip consolidation engine for the distribution admin dashboard.
//!
//! Takes a set of orders from the order-query service, fetches their line
//! items, infers a packaging unit from each free-text product name,
//! normalizes to base units (liters/kilograms/eaches), buckets into
//! crates, consolidates per route, and renders loading- and delivery-slip
//! workbooks (XLSX). The dashboard frontend and the REST backend are
//! external collaborators; everything in here is request-scoped
//! computation with no shared state across report runs.
//!
//! Pipeline, leaves first: unit parsing ([`units`]) → base-unit and crate
//! math ([`units`]) → route grouping ([`routes`]) → product consolidation
//! ([`consolidate`]) → brand totals ([`brands`]) → grid rendering
//! ([`sheet`]) → XLSX bytes ([`workbook`]), orchestrated per report run by
//! [`slips`].

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub mod api;
pub mod brands;
pub mod consolidate;
pub mod error;
pub mod model;
pub mod routes;
pub mod sheet;
pub mod slips;
pub mod units;
pub mod workbook;

pub use api::{ApiConfig, DashboardApi};
pub use brands::{aggregate_brands, BrandTotal};
pub use consolidate::{
    consolidate, consolidate_per_customer, ConsolidatedProduct, DeliveryMatrix, LineItemFetcher,
    DEFAULT_FETCH_CONCURRENCY,
};
pub use error::SlipError;
pub use model::{Order, OrderLineItem};
pub use routes::{group_by_route, UNROUTED};
pub use sheet::{delivery_slip_grid, loading_slip_grid, Cell, CellGrid};
pub use slips::{
    generate_delivery_slips, generate_loading_slips, RouteSlip, SlipBatch, SlipKind, SlipOptions,
    SlipPayload, SlipStatusSink, StatusUpdateSummary,
};
pub use units::{
    parse, to_base_units, to_crates, CatalogUnitExtractor, ParsedUnit, RegexUnitExtractor, Unit,
    UnitExtractor, UNITS_PER_CRATE,
};
pub use workbook::{slip_filename, workbook_base64, write_workbook};

/// Initialize structured logging for the embedding application. Safe to
/// call more than once; later calls are no-ops.
pub fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,slip_engine=debug"));

    let console_layer = fmt::layer().with_target(true);
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .try_init();
}
