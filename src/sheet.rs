//! Spreadsheet grid rendering.
//!
//! Pure functions from consolidated route data to a 2-D cell grid; the
//! workbook writer turns the grid into XLSX bytes. Base-unit columns are
//! rendered as 2-decimal strings to match how the dashboard displays and
//! prints them; counts stay numeric.

use serde::Serialize;

use crate::brands::BrandTotal;
use crate::consolidate::{ConsolidatedProduct, DeliveryMatrix};
use crate::error::SlipError;
use indexmap::IndexMap;

/// A scalar spreadsheet cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Text(String),
    Int(i64),
    Float(f64),
}

impl Cell {
    pub fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }
}

/// Ordered rows of ordered cells. Rows may be ragged; an empty row is a
/// spacer.
pub type CellGrid = Vec<Vec<Cell>>;

fn two_decimals(value: f64) -> Cell {
    Cell::Text(format!("{value:.2}"))
}

// ---------------------------------------------------------------------------
// Loading slip
// ---------------------------------------------------------------------------

/// Render the loading-slip grid for one route: title, product table with a
/// totals row, then the per-brand crate table.
///
/// Refuses to build an empty workbook: a route with no consolidated
/// products is [`SlipError::NothingToExport`].
pub fn loading_slip_grid(
    consolidated: &IndexMap<String, ConsolidatedProduct>,
    brand_totals: &[BrandTotal],
    route_name: &str,
    report_title: &str,
) -> Result<CellGrid, SlipError> {
    if consolidated.is_empty() {
        return Err(SlipError::NothingToExport);
    }

    let mut grid: CellGrid = Vec::new();
    grid.push(vec![Cell::text(format!(
        "{report_title} - Route {route_name}"
    ))]);
    grid.push(vec![]);
    grid.push(vec![
        Cell::text("Products"),
        Cell::text("Quantity in base units (eaches)"),
        Cell::text("Quantity in base units (kgs/lts)"),
        Cell::text("Crates"),
    ]);

    let mut quantity_sum = 0_i64;
    let mut base_sum = 0.0_f64;
    let mut crate_sum = 0_i64;
    for (name, product) in consolidated {
        grid.push(vec![
            Cell::text(name),
            Cell::Int(product.total_quantity),
            two_decimals(product.total_base_units),
            Cell::Int(product.total_crates),
        ]);
        quantity_sum += product.total_quantity;
        base_sum += product.total_base_units;
        crate_sum += product.total_crates;
    }

    grid.push(vec![
        Cell::text("Totals"),
        Cell::Int(quantity_sum),
        two_decimals(base_sum),
        Cell::Int(crate_sum),
    ]);
    grid.push(vec![]);

    grid.push(vec![Cell::text("Brand"), Cell::text("Total Crates")]);
    for brand in brand_totals {
        grid.push(vec![
            Cell::text(&brand.brand),
            Cell::Int(brand.total_crates),
        ]);
    }

    Ok(grid)
}

// ---------------------------------------------------------------------------
// Delivery slip
// ---------------------------------------------------------------------------

/// Render the delivery-slip grid for one route: customers as columns, one
/// row per product, a totals row, and a trailing customer-id row for the
/// delivery staff to tick against.
pub fn delivery_slip_grid(matrix: &DeliveryMatrix) -> Result<CellGrid, SlipError> {
    if matrix.is_empty() {
        return Err(SlipError::NothingToExport);
    }

    let mut grid: CellGrid = Vec::new();

    let mut header = vec![Cell::text("Items")];
    header.extend(matrix.customers.iter().map(|c| Cell::text(&c.name)));
    header.push(Cell::text("Total Crates"));
    grid.push(header);

    let mut column_sums = vec![0_i64; matrix.customers.len()];
    let mut crate_sum = 0_i64;
    for (name, row) in &matrix.products {
        let mut cells = vec![Cell::text(name)];
        for (col, quantity) in row.quantities.iter().enumerate() {
            cells.push(Cell::Int(*quantity));
            column_sums[col] += quantity;
        }
        cells.push(Cell::Int(row.total_crates));
        crate_sum += row.total_crates;
        grid.push(cells);
    }

    let mut totals = vec![Cell::text("Totals")];
    totals.extend(column_sums.into_iter().map(Cell::Int));
    totals.push(Cell::Int(crate_sum));
    grid.push(totals);

    let mut ids = vec![Cell::text("Customer ID")];
    ids.extend(matrix.customers.iter().map(|c| Cell::Int(c.id)));
    grid.push(ids);

    Ok(grid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consolidate::{DeliveryCustomer, DeliveryRow};

    fn consolidated_fixture() -> IndexMap<String, ConsolidatedProduct> {
        let mut map = IndexMap::new();
        map.insert(
            "Nandini Milk 500 ML".to_string(),
            ConsolidatedProduct {
                total_quantity: 36,
                category: Some("Milk".into()),
                total_base_units: 18.0,
                total_crates: 1,
            },
        );
        map.insert(
            "Amul Butter 200 GM".to_string(),
            ConsolidatedProduct {
                total_quantity: 10,
                category: Some("Dairy".into()),
                total_base_units: 2.0,
                total_crates: 0,
            },
        );
        map
    }

    #[test]
    fn test_loading_slip_layout() {
        let consolidated = consolidated_fixture();
        let brands = crate::brands::aggregate_brands(&consolidated);
        let grid = loading_slip_grid(&consolidated, &brands, "North", "Loading Slip").unwrap();

        assert_eq!(
            grid[0],
            vec![Cell::text("Loading Slip - Route North")],
        );
        assert!(grid[1].is_empty());
        assert_eq!(grid[2][0], Cell::text("Products"));

        // Product rows, then totals.
        assert_eq!(
            grid[3],
            vec![
                Cell::text("Nandini Milk 500 ML"),
                Cell::Int(36),
                Cell::text("18.00"),
                Cell::Int(1),
            ]
        );
        assert_eq!(
            grid[5],
            vec![
                Cell::text("Totals"),
                Cell::Int(46),
                Cell::text("20.00"),
                Cell::Int(1),
            ]
        );

        // Brand table after the spacer row.
        assert!(grid[6].is_empty());
        assert_eq!(grid[7], vec![Cell::text("Brand"), Cell::text("Total Crates")]);
        assert_eq!(grid[8], vec![Cell::text("AMUL"), Cell::Int(0)]);
        assert_eq!(grid[9], vec![Cell::text("NANDINI"), Cell::Int(1)]);
    }

    #[test]
    fn test_loading_slip_refuses_empty_input() {
        let empty = IndexMap::new();
        let err = loading_slip_grid(&empty, &[], "North", "Loading Slip").unwrap_err();
        assert!(matches!(err, SlipError::NothingToExport));
    }

    #[test]
    fn test_delivery_slip_layout() {
        let mut matrix = DeliveryMatrix::default();
        matrix.customers.push(DeliveryCustomer {
            id: 10,
            name: "Sharma Stores".into(),
        });
        matrix.customers.push(DeliveryCustomer {
            id: 11,
            name: "Daily Needs".into(),
        });
        matrix.products.insert(
            "Toned Milk 500 ML".to_string(),
            DeliveryRow {
                quantities: vec![16, 14],
                total_base_units: 15.0,
                total_crates: 1,
            },
        );

        let grid = delivery_slip_grid(&matrix).unwrap();
        assert_eq!(
            grid[0],
            vec![
                Cell::text("Items"),
                Cell::text("Sharma Stores"),
                Cell::text("Daily Needs"),
                Cell::text("Total Crates"),
            ]
        );
        assert_eq!(
            grid[1],
            vec![
                Cell::text("Toned Milk 500 ML"),
                Cell::Int(16),
                Cell::Int(14),
                Cell::Int(1),
            ]
        );
        assert_eq!(
            grid[2],
            vec![
                Cell::text("Totals"),
                Cell::Int(16),
                Cell::Int(14),
                Cell::Int(1),
            ]
        );
        assert_eq!(
            grid[3],
            vec![Cell::text("Customer ID"), Cell::Int(10), Cell::Int(11)]
        );
    }

    #[test]
    fn test_delivery_slip_refuses_empty_matrix() {
        let err = delivery_slip_grid(&DeliveryMatrix::default()).unwrap_err();
        assert!(matches!(err, SlipError::NothingToExport));
    }
}
