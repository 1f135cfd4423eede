//! End-to-end slip generation.
//!
//! Ties the pipeline together for one report run: group the orders by
//! route, consolidate each bucket, render the grid, serialize the
//! workbook, then mark the orders as slip-generated on the dashboard.
//! Status-update failures are collected into an aggregate summary and
//! never roll back the workbooks already produced.

use std::collections::HashMap;
use std::future::Future;
use tracing::{info, warn};

use crate::brands::aggregate_brands;
use crate::consolidate::{
    consolidate, consolidate_per_customer, LineItemFetcher, DEFAULT_FETCH_CONCURRENCY,
};
use crate::error::SlipError;
use crate::model::Order;
use crate::routes::group_by_route;
use crate::sheet::{delivery_slip_grid, loading_slip_grid};
use crate::units::UnitExtractor;
use crate::workbook::{slip_filename, workbook_base64, write_workbook};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlipKind {
    Loading,
    Delivery,
}

impl SlipKind {
    fn default_title(self) -> &'static str {
        match self {
            SlipKind::Loading => "Loading Slip",
            SlipKind::Delivery => "Delivery Slip",
        }
    }
}

/// Seam for the post-generation status update (an I/O call in
/// production, a stub in tests).
pub trait SlipStatusSink {
    fn mark_slip_generated(
        &self,
        kind: SlipKind,
        order_id: i64,
    ) -> impl Future<Output = Result<(), SlipError>> + Send;
}

impl SlipStatusSink for crate::api::DashboardApi {
    fn mark_slip_generated(
        &self,
        kind: SlipKind,
        order_id: i64,
    ) -> impl Future<Output = Result<(), SlipError>> + Send {
        async move {
            match kind {
                SlipKind::Loading => self.update_loading_slip_status(order_id).await,
                SlipKind::Delivery => self.update_delivery_slip_status(order_id).await,
            }
        }
    }
}

/// Per-run settings.
#[derive(Debug, Clone)]
pub struct SlipOptions {
    /// Report title; defaults to "Loading Slip" / "Delivery Slip".
    pub report_title: Option<String>,
    /// `true` produces raw bytes for a download; `false` produces a
    /// base64 string for the on-screen preview.
    pub download_only: bool,
    pub fetch_concurrency: usize,
}

impl Default for SlipOptions {
    fn default() -> Self {
        Self {
            report_title: None,
            download_only: true,
            fetch_concurrency: DEFAULT_FETCH_CONCURRENCY,
        }
    }
}

/// Serialized workbook, in the representation the caller asked for.
#[derive(Debug, Clone, PartialEq)]
pub enum SlipPayload {
    Bytes(Vec<u8>),
    Base64(String),
}

/// One generated workbook for one route.
#[derive(Debug, Clone)]
pub struct RouteSlip {
    pub route: String,
    pub filename: String,
    pub payload: SlipPayload,
}

/// Aggregate outcome of the post-generation status updates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusUpdateSummary {
    pub succeeded: usize,
    pub failed: usize,
}

/// Result of one report run.
#[derive(Debug)]
pub struct SlipBatch {
    pub slips: Vec<RouteSlip>,
    pub status_updates: StatusUpdateSummary,
}

// ---------------------------------------------------------------------------
// Loading slips
// ---------------------------------------------------------------------------

/// Generate one loading-slip workbook per route.
///
/// Cancelled orders are dropped up front; routes where nothing
/// consolidates are skipped. When no route at all yields products, the
/// whole run is [`SlipError::NothingToExport`].
pub async fn generate_loading_slips<S>(
    service: &S,
    orders: Vec<Order>,
    customer_routes: &HashMap<i64, String>,
    extractor: &dyn UnitExtractor,
    options: &SlipOptions,
) -> Result<SlipBatch, SlipError>
where
    S: LineItemFetcher + SlipStatusSink,
{
    let title = options
        .report_title
        .as_deref()
        .unwrap_or(SlipKind::Loading.default_title());

    let buckets = group_by_route(drop_cancelled(orders), customer_routes);

    let mut slips = Vec::new();
    let mut generated_orders: Vec<i64> = Vec::new();
    for (route, bucket) in &buckets {
        let consolidated =
            consolidate(bucket, service, extractor, options.fetch_concurrency).await;
        if consolidated.is_empty() {
            info!(route = %route, "no consolidatable products; route skipped");
            continue;
        }

        let brands = aggregate_brands(&consolidated);
        let grid = loading_slip_grid(&consolidated, &brands, route, title)?;
        slips.push(RouteSlip {
            route: route.clone(),
            filename: slip_filename(title, route),
            payload: serialize(&grid, route, options)?,
        });
        generated_orders.extend(bucket.iter().map(|o| o.id));
        info!(route = %route, products = consolidated.len(), "loading slip generated");
    }

    if slips.is_empty() {
        return Err(SlipError::NothingToExport);
    }

    let status_updates =
        push_status_updates(service, SlipKind::Loading, &generated_orders).await;
    Ok(SlipBatch {
        slips,
        status_updates,
    })
}

// ---------------------------------------------------------------------------
// Delivery slips
// ---------------------------------------------------------------------------

/// Generate one delivery-slip workbook per route (customer-as-column
/// manifest). Same skip and failure policy as the loading slips.
pub async fn generate_delivery_slips<S>(
    service: &S,
    orders: Vec<Order>,
    customer_routes: &HashMap<i64, String>,
    customer_names: &HashMap<i64, String>,
    extractor: &dyn UnitExtractor,
    options: &SlipOptions,
) -> Result<SlipBatch, SlipError>
where
    S: LineItemFetcher + SlipStatusSink,
{
    let title = options
        .report_title
        .as_deref()
        .unwrap_or(SlipKind::Delivery.default_title());

    let buckets = group_by_route(drop_cancelled(orders), customer_routes);

    let mut slips = Vec::new();
    let mut generated_orders: Vec<i64> = Vec::new();
    for (route, bucket) in &buckets {
        let matrix = consolidate_per_customer(
            bucket,
            service,
            extractor,
            customer_names,
            options.fetch_concurrency,
        )
        .await;
        if matrix.is_empty() {
            info!(route = %route, "no consolidatable products; route skipped");
            continue;
        }

        let grid = delivery_slip_grid(&matrix)?;
        slips.push(RouteSlip {
            route: route.clone(),
            filename: slip_filename(title, route),
            payload: serialize(&grid, route, options)?,
        });
        generated_orders.extend(bucket.iter().map(|o| o.id));
        info!(
            route = %route,
            customers = matrix.customers.len(),
            products = matrix.products.len(),
            "delivery slip generated"
        );
    }

    if slips.is_empty() {
        return Err(SlipError::NothingToExport);
    }

    let status_updates =
        push_status_updates(service, SlipKind::Delivery, &generated_orders).await;
    Ok(SlipBatch {
        slips,
        status_updates,
    })
}

// ---------------------------------------------------------------------------
// Shared steps
// ---------------------------------------------------------------------------

fn drop_cancelled(orders: Vec<Order>) -> Vec<Order> {
    let before = orders.len();
    let kept: Vec<Order> = orders.into_iter().filter(|o| !o.cancelled).collect();
    if kept.len() < before {
        info!(dropped = before - kept.len(), "cancelled orders excluded");
    }
    kept
}

fn serialize(
    grid: &crate::sheet::CellGrid,
    route: &str,
    options: &SlipOptions,
) -> Result<SlipPayload, SlipError> {
    if options.download_only {
        Ok(SlipPayload::Bytes(write_workbook(grid, route)?))
    } else {
        Ok(SlipPayload::Base64(workbook_base64(grid, route)?))
    }
}

/// Mark every generated order on the dashboard, collecting the outcome
/// per order. Failures are logged and counted, nothing is retried and
/// nothing is rolled back.
async fn push_status_updates<S: SlipStatusSink>(
    service: &S,
    kind: SlipKind,
    order_ids: &[i64],
) -> StatusUpdateSummary {
    let mut summary = StatusUpdateSummary::default();
    for &order_id in order_ids {
        match service.mark_slip_generated(kind, order_id).await {
            Ok(()) => summary.succeeded += 1,
            Err(err) => {
                summary.failed += 1;
                warn!(order_id, error = %err, "slip status update failed");
            }
        }
    }
    if summary.failed > 0 {
        warn!(
            succeeded = summary.succeeded,
            failed = summary.failed,
            "some slip status updates failed"
        );
    }
    summary
}
