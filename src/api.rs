//! Admin dashboard API client.
//!
//! Authenticated HTTP access to the order-query and order-products
//! services plus the slip-status update endpoints. The bearer token comes
//! from the caller's session store; this client only carries it.

use chrono::{DateTime, Utc};
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

use crate::consolidate::LineItemFetcher;
use crate::error::SlipError;
use crate::model::{Order, OrderLineItem};

/// Default timeout for API requests (30 seconds).
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

// ---------------------------------------------------------------------------
// URL normalisation
// ---------------------------------------------------------------------------

/// Normalise the dashboard base URL:
/// - strip trailing slashes
/// - strip a trailing `/api` segment
/// - ensure a scheme is present (https, or http for localhost)
pub fn normalize_base_url(url: &str) -> String {
    let mut url = url.trim().to_string();

    // Ensure scheme
    if !url.starts_with("http://") && !url.starts_with("https://") {
        if url.starts_with("localhost") || url.starts_with("127.0.0.1") {
            url = format!("http://{url}");
        } else {
            url = format!("https://{url}");
        }
    }

    // Strip trailing slashes
    while url.ends_with('/') {
        url.pop();
    }

    // Strip trailing /api
    if url.ends_with("/api") {
        url.truncate(url.len() - 4);
    }

    while url.ends_with('/') {
        url.pop();
    }

    url
}

// ---------------------------------------------------------------------------
// Error mapping
// ---------------------------------------------------------------------------

/// Convert a `reqwest::Error` into a user-friendly message.
fn friendly_error(url: &str, err: &reqwest::Error) -> String {
    if err.is_connect() {
        return format!("Cannot reach admin dashboard at {url}");
    }
    if err.is_timeout() {
        return format!("Connection to {url} timed out");
    }
    if err.is_builder() {
        return format!("Invalid admin dashboard URL: {url}");
    }
    format!("Network error communicating with {url}: {err}")
}

/// Convert an HTTP status code into a user-friendly message.
fn status_error(status: StatusCode) -> String {
    match status.as_u16() {
        401 => "Session is invalid or expired".to_string(),
        403 => "Not authorized for this dashboard".to_string(),
        404 => "Admin dashboard endpoint not found".to_string(),
        s if s >= 500 => format!("Admin dashboard server error (HTTP {s})"),
        s => format!("Unexpected response from admin dashboard (HTTP {s})"),
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Connection settings for one dashboard.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub bearer_token: String,
}

pub struct DashboardApi {
    base_url: String,
    bearer_token: String,
    client: Client,
}

impl DashboardApi {
    pub fn new(config: ApiConfig) -> Result<Self, SlipError> {
        let base_url = normalize_base_url(&config.base_url);
        if base_url.is_empty() {
            return Err(SlipError::InvalidBaseUrl(config.base_url));
        }
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| SlipError::InvalidBaseUrl(e.to_string()))?;
        Ok(Self {
            base_url,
            bearer_token: config.bearer_token,
            client,
        })
    }

    /// Perform an authenticated request; `path` includes the leading slash.
    async fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<Value>,
    ) -> Result<Value, SlipError> {
        let full_url = format!("{}{path}", self.base_url);

        let mut req = self
            .client
            .request(method, &full_url)
            .header("Authorization", format!("Bearer {}", self.bearer_token))
            .header("Content-Type", "application/json");
        if !query.is_empty() {
            req = req.query(query);
        }
        if let Some(b) = body {
            req = req.json(&b);
        }

        let resp = req.send().await.map_err(|e| SlipError::Http {
            url: self.base_url.clone(),
            message: friendly_error(&self.base_url, &e),
        })?;
        let status = resp.status();

        if !status.is_success() {
            // Preserve validation details for the log; the user sees the
            // short message.
            let body_text = resp.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<Value>(&body_text) {
                Ok(json) => json
                    .get("error")
                    .or_else(|| json.get("message"))
                    .and_then(Value::as_str)
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| status_error(status)),
                Err(_) => status_error(status),
            };
            if !body_text.trim().is_empty() {
                warn!(path, status = status.as_u16(), body = %body_text.trim(), "dashboard request failed");
            }
            return Err(SlipError::Api {
                status: status.as_u16(),
                message,
            });
        }

        // Empty 204 bodies come back as null.
        let body_text = resp.text().await.unwrap_or_default();
        if body_text.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body_text).map_err(|e| SlipError::Decode(e.to_string()))
    }

    // -- Endpoints ----------------------------------------------------------

    /// Orders placed in the given range (epoch-second bounds, inclusive).
    pub async fn orders_with_date_range(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Order>, SlipError> {
        let value = self
            .request(
                Method::GET,
                "/orders",
                &[
                    ("fromDate", from.timestamp().to_string()),
                    ("toDate", to.timestamp().to_string()),
                ],
                None,
            )
            .await?;
        decode_list(value)
    }

    /// Line items of one order.
    pub async fn order_products(&self, order_id: i64) -> Result<Vec<OrderLineItem>, SlipError> {
        let value = self
            .request(
                Method::GET,
                "/order-products",
                &[("orderId", order_id.to_string())],
                None,
            )
            .await?;
        decode_list(value)
    }

    /// Route assignment for one customer; `None` when the customer has no
    /// route in the master data.
    pub async fn customer_route(&self, customer_id: i64) -> Result<Option<String>, SlipError> {
        let value = match self
            .request(
                Method::GET,
                "/customer-route",
                &[("customerId", customer_id.to_string())],
                None,
            )
            .await
        {
            Ok(value) => value,
            Err(SlipError::Api { status: 404, .. }) => return Ok(None),
            Err(err) => return Err(err),
        };
        Ok(route_name_from(&value))
    }

    /// The route catalogue.
    pub async fn routes(&self) -> Result<Vec<String>, SlipError> {
        let value = self.request(Method::GET, "/routes", &[], None).await?;
        let items = match value {
            Value::Array(items) => items,
            Value::Object(mut obj) => match obj.remove("data").or_else(|| obj.remove("routes")) {
                Some(Value::Array(items)) => items,
                _ => return Err(SlipError::Decode("expected a route list".into())),
            },
            _ => return Err(SlipError::Decode("expected a route list".into())),
        };
        Ok(items.iter().filter_map(route_name_from).collect())
    }

    /// Build the customer→route map for a set of orders. A customer whose
    /// lookup fails is logged and left unmapped (the grouper sends their
    /// orders to "Unrouted").
    pub async fn customer_routes_for(&self, orders: &[Order]) -> HashMap<i64, String> {
        let mut routes = HashMap::new();
        for order in orders {
            if routes.contains_key(&order.customer_id) {
                continue;
            }
            match self.customer_route(order.customer_id).await {
                Ok(Some(route)) => {
                    routes.insert(order.customer_id, route);
                }
                Ok(None) => {}
                Err(err) => {
                    warn!(
                        customer_id = order.customer_id,
                        error = %err,
                        "route lookup failed; customer treated as unrouted"
                    );
                }
            }
        }
        routes
    }

    /// Mark an order's loading slip as generated.
    pub async fn update_loading_slip_status(&self, order_id: i64) -> Result<(), SlipError> {
        self.request(
            Method::POST,
            "/update-loading-slip-status",
            &[],
            Some(serde_json::json!({ "orderId": order_id })),
        )
        .await
        .map(|_| ())
    }

    /// Mark an order's delivery slip as generated.
    pub async fn update_delivery_slip_status(&self, order_id: i64) -> Result<(), SlipError> {
        self.request(
            Method::POST,
            "/update-delivery-slip-status",
            &[],
            Some(serde_json::json!({ "orderId": order_id })),
        )
        .await
        .map(|_| ())
    }
}

impl LineItemFetcher for DashboardApi {
    fn line_items(
        &self,
        order_id: i64,
    ) -> impl Future<Output = Result<Vec<OrderLineItem>, SlipError>> + Send {
        self.order_products(order_id)
    }
}

// ---------------------------------------------------------------------------
// Payload decoding
// ---------------------------------------------------------------------------

/// The reporting endpoints answer either a bare array or `{"data": [...]}`
/// depending on their vintage; accept both.
fn decode_list<T: DeserializeOwned>(value: Value) -> Result<Vec<T>, SlipError> {
    let items = match value {
        Value::Array(_) => value,
        Value::Object(mut obj) => obj
            .remove("data")
            .filter(Value::is_array)
            .ok_or_else(|| SlipError::Decode("expected a list payload".into()))?,
        Value::Null => Value::Array(vec![]),
        _ => return Err(SlipError::Decode("expected a list payload".into())),
    };
    serde_json::from_value(items).map_err(|e| SlipError::Decode(e.to_string()))
}

fn route_name_from(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Object(obj) => obj
            .get("route")
            .or_else(|| obj.get("name"))
            .and_then(Value::as_str)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_base_url() {
        assert_eq!(
            normalize_base_url("dashboard.example.com"),
            "https://dashboard.example.com"
        );
        assert_eq!(normalize_base_url("localhost:3000"), "http://localhost:3000");
        assert_eq!(
            normalize_base_url("https://dashboard.example.com/api/"),
            "https://dashboard.example.com"
        );
        assert_eq!(
            normalize_base_url("  https://dashboard.example.com// "),
            "https://dashboard.example.com"
        );
    }

    #[test]
    fn test_status_error_messages() {
        assert_eq!(
            status_error(StatusCode::UNAUTHORIZED),
            "Session is invalid or expired"
        );
        assert!(status_error(StatusCode::BAD_GATEWAY).contains("502"));
    }

    #[test]
    fn test_decode_list_accepts_both_shapes() {
        let bare: Vec<OrderLineItem> =
            decode_list(serde_json::json!([{ "name": "Milk 500 ML", "quantity": 2 }])).unwrap();
        let wrapped: Vec<OrderLineItem> =
            decode_list(serde_json::json!({ "data": [{ "name": "Milk 500 ML", "quantity": 2 }] }))
                .unwrap();
        assert_eq!(bare[0].product_name, wrapped[0].product_name);

        let empty: Vec<OrderLineItem> = decode_list(Value::Null).unwrap();
        assert!(empty.is_empty());

        assert!(decode_list::<OrderLineItem>(serde_json::json!("nope")).is_err());
    }

    #[test]
    fn test_route_name_from_shapes() {
        assert_eq!(
            route_name_from(&serde_json::json!("North")),
            Some("North".to_string())
        );
        assert_eq!(
            route_name_from(&serde_json::json!({ "route": "South" })),
            Some("South".to_string())
        );
        assert_eq!(
            route_name_from(&serde_json::json!({ "name": " East " })),
            Some("East".to_string())
        );
        assert_eq!(route_name_from(&serde_json::json!({ "route": "" })), None);
        assert_eq!(route_name_from(&Value::Null), None);
    }
}
