//! Product consolidation for one route bucket.
//!
//! Line items are fetched per order from the order-products service and
//! folded into running per-product totals: ordered package count, base-unit
//! quantity, crate count. A fetch failure for a single order is logged and
//! that order skipped — one unreachable order must not block the slip for
//! the rest of the route.
//!
//! Fetches run as a task list with bounded concurrency. The fold is
//! commutative and associative, so completion order cannot change the
//! result; `buffered` additionally keeps first-seen product order stable.

use futures::stream::{self, StreamExt};
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::HashMap;
use std::future::Future;
use tracing::warn;

use crate::error::SlipError;
use crate::model::{Order, OrderLineItem};
use crate::units::{to_base_units, to_crates, UnitExtractor};

/// How many order-products fetches are in flight at once.
pub const DEFAULT_FETCH_CONCURRENCY: usize = 4;

/// Seam for the order-products lookup (an I/O call in production,
/// a stub in tests).
pub trait LineItemFetcher {
    fn line_items(
        &self,
        order_id: i64,
    ) -> impl Future<Output = Result<Vec<OrderLineItem>, SlipError>> + Send;
}

/// Running totals for one product name within a route bucket. Keyed by the
/// exact (case-sensitive) product name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConsolidatedProduct {
    pub total_quantity: i64,
    pub category: Option<String>,
    pub total_base_units: f64,
    pub total_crates: i64,
}

// ---------------------------------------------------------------------------
// Route-level consolidation
// ---------------------------------------------------------------------------

/// Consolidate all orders of one route bucket into per-product totals.
///
/// Exactly one entry per distinct product name seen; orders whose
/// line-item fetch fails contribute nothing.
pub async fn consolidate<F>(
    orders: &[Order],
    fetcher: &F,
    extractor: &dyn UnitExtractor,
    concurrency: usize,
) -> IndexMap<String, ConsolidatedProduct>
where
    F: LineItemFetcher,
{
    let mut consolidated: IndexMap<String, ConsolidatedProduct> = IndexMap::new();
    for (order, result) in fetch_all(orders, fetcher, concurrency).await {
        match result {
            Ok(items) => {
                for item in &items {
                    fold_line_item(&mut consolidated, item, extractor);
                }
            }
            Err(err) => {
                warn!(order_id = order.id, error = %err, "line-item fetch failed; order skipped");
            }
        }
    }
    consolidated
}

fn fold_line_item(
    consolidated: &mut IndexMap<String, ConsolidatedProduct>,
    item: &OrderLineItem,
    extractor: &dyn UnitExtractor,
) {
    let parsed = extractor.extract(&item.product_name);
    let base = to_base_units(parsed, item.quantity);

    let entry = consolidated.entry(item.product_name.clone()).or_default();
    entry.total_quantity += item.quantity;
    entry.total_base_units += base;
    // Crates derive from the running base-unit total so partial packages
    // from separate orders can still fill a crate together.
    entry.total_crates = to_crates(entry.total_base_units);

    if let Some(category) = &item.category {
        if let Some(previous) = &entry.category {
            if previous != category {
                warn!(
                    product = %item.product_name,
                    previous = %previous,
                    new = %category,
                    "category differs across orders; keeping the latest"
                );
            }
        }
        entry.category = Some(category.clone());
    }
}

// ---------------------------------------------------------------------------
// Per-customer consolidation (delivery-slip matrix)
// ---------------------------------------------------------------------------

/// One customer column of a delivery matrix.
#[derive(Debug, Clone, Serialize)]
pub struct DeliveryCustomer {
    pub id: i64,
    pub name: String,
}

/// One product row: per-customer quantities (parallel to
/// `DeliveryMatrix::customers`) plus the row-wide crate figure.
#[derive(Debug, Clone, Serialize)]
pub struct DeliveryRow {
    pub quantities: Vec<i64>,
    pub total_base_units: f64,
    pub total_crates: i64,
}

/// Customer-as-column view of a route bucket, feeding the delivery-slip
/// renderer.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DeliveryMatrix {
    pub customers: Vec<DeliveryCustomer>,
    pub products: IndexMap<String, DeliveryRow>,
}

impl DeliveryMatrix {
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

/// Consolidate a route bucket per customer. Customers appear in the order
/// their first successfully fetched order is seen; customers whose name is
/// missing from the master fall back to their numeric id.
pub async fn consolidate_per_customer<F>(
    orders: &[Order],
    fetcher: &F,
    extractor: &dyn UnitExtractor,
    customer_names: &HashMap<i64, String>,
    concurrency: usize,
) -> DeliveryMatrix
where
    F: LineItemFetcher,
{
    let mut matrix = DeliveryMatrix::default();
    for (order, result) in fetch_all(orders, fetcher, concurrency).await {
        let items = match result {
            Ok(items) => items,
            Err(err) => {
                warn!(order_id = order.id, error = %err, "line-item fetch failed; order skipped");
                continue;
            }
        };

        let col = match matrix
            .customers
            .iter()
            .position(|c| c.id == order.customer_id)
        {
            Some(col) => col,
            None => {
                let name = customer_names
                    .get(&order.customer_id)
                    .cloned()
                    .unwrap_or_else(|| order.customer_id.to_string());
                matrix.customers.push(DeliveryCustomer {
                    id: order.customer_id,
                    name,
                });
                // Widen existing rows for the new column.
                for row in matrix.products.values_mut() {
                    row.quantities.push(0);
                }
                matrix.customers.len() - 1
            }
        };

        let width = matrix.customers.len();
        for item in &items {
            let parsed = extractor.extract(&item.product_name);
            let base = to_base_units(parsed, item.quantity);
            let row = matrix
                .products
                .entry(item.product_name.clone())
                .or_insert_with(|| DeliveryRow {
                    quantities: vec![0; width],
                    total_base_units: 0.0,
                    total_crates: 0,
                });
            row.quantities[col] += item.quantity;
            row.total_base_units += base;
            row.total_crates = to_crates(row.total_base_units);
        }
    }
    matrix
}

// ---------------------------------------------------------------------------
// Bounded-concurrency fetch
// ---------------------------------------------------------------------------

/// Fetch line items for every order, at most `concurrency` requests in
/// flight. Results come back in input order, paired with their order.
async fn fetch_all<'a, F>(
    orders: &'a [Order],
    fetcher: &'a F,
    concurrency: usize,
) -> Vec<(&'a Order, Result<Vec<OrderLineItem>, SlipError>)>
where
    F: LineItemFetcher,
{
    stream::iter(orders.iter().map(|order| {
        let fut = fetcher.line_items(order.id);
        async move { (order, fut.await) }
    }))
    .buffered(concurrency.max(1))
    .collect()
    .await
}
