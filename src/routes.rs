//! Route grouping.
//!
//! Partitions a flat order list into per-route buckets using the
//! customer→route master data supplied by the caller. Grouping is stable
//! (orders keep their input order inside a bucket) and does not
//! deduplicate — a repeated order id shows up twice.

use indexmap::IndexMap;
use std::collections::HashMap;

use crate::model::Order;

/// Bucket for customers with no route assignment.
pub const UNROUTED: &str = "Unrouted";

/// Group orders by the route of their customer. Routes appear in
/// first-seen order; unmapped customers land in [`UNROUTED`].
pub fn group_by_route(
    orders: Vec<Order>,
    customer_routes: &HashMap<i64, String>,
) -> IndexMap<String, Vec<Order>> {
    let mut buckets: IndexMap<String, Vec<Order>> = IndexMap::new();
    for order in orders {
        let route = customer_routes
            .get(&order.customer_id)
            .map(String::as_str)
            .unwrap_or(UNROUTED);
        buckets.entry(route.to_string()).or_default().push(order);
    }
    buckets
}
