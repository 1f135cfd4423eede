//! Wire types shared across the engine.
//!
//! These mirror what the admin dashboard's order-query and order-products
//! services return. Both services are inconsistent about casing (snake_case
//! from the reporting endpoints, camelCase from the newer ones), so the
//! serde derives accept either spelling.

use serde::{Deserialize, Serialize};

/// An order as returned by the order-query service. Read-only to this
/// engine; identity is `id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    #[serde(alias = "customerId")]
    pub customer_id: i64,
    #[serde(default, alias = "orderType")]
    pub order_type: String,
    /// Epoch seconds.
    #[serde(default, alias = "placedOn")]
    pub placed_on: i64,
    #[serde(default, alias = "totalAmount")]
    pub total_amount: f64,
    #[serde(default)]
    pub cancelled: bool,
    #[serde(default, alias = "approveStatus")]
    pub approve_status: Option<String>,
    /// Whether a loading slip has already been generated for this order.
    #[serde(default, alias = "loadingSlip")]
    pub loading_slip: Option<bool>,
}

/// One line of an order, fetched lazily per order via
/// `GET /order-products`. `quantity` is the ordered package count and is
/// never negative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLineItem {
    #[serde(rename = "name", alias = "product_name", alias = "productName")]
    pub product_name: String,
    #[serde(default)]
    pub quantity: i64,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default, alias = "gstRate")]
    pub gst_rate: Option<f64>,
    #[serde(default)]
    pub price: Option<f64>,
}

impl OrderLineItem {
    pub fn new(product_name: impl Into<String>, quantity: i64) -> Self {
        Self {
            product_name: product_name.into(),
            quantity,
            category: None,
            gst_rate: None,
            price: None,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_accepts_both_casings() {
        let snake: Order = serde_json::from_str(
            r#"{"id":7,"customer_id":3,"order_type":"regular","placed_on":1700000000,
                "total_amount":420.5,"cancelled":false}"#,
        )
        .unwrap();
        let camel: Order = serde_json::from_str(
            r#"{"id":7,"customerId":3,"orderType":"regular","placedOn":1700000000,
                "totalAmount":420.5}"#,
        )
        .unwrap();
        assert_eq!(snake.customer_id, camel.customer_id);
        assert_eq!(snake.placed_on, camel.placed_on);
        assert!(!camel.cancelled);
    }

    #[test]
    fn test_line_item_uses_name_field() {
        let item: OrderLineItem =
            serde_json::from_str(r#"{"name":"Toned Milk 500 ML","quantity":24,"category":"Milk"}"#)
                .unwrap();
        assert_eq!(item.product_name, "Toned Milk 500 ML");
        assert_eq!(item.quantity, 24);
        assert_eq!(item.category.as_deref(), Some("Milk"));
        assert!(item.gst_rate.is_none());
    }
}
