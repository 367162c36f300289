//! Test fixtures for catalog reader integration tests
//!
//! These fixtures describe a small order-entry database. The same contents are
//! served through a [`MockCatalog`] and written out as a snapshot file, so both
//! readers can be checked against each other.

#![allow(dead_code)]

use modelsync_catalog::{
    CatalogSnapshot, ColumnDescriptor, ForeignKeyDescriptor, IndexColumnDescriptor, IndexDescriptor,
    MockCatalog, ObjectName, ParameterDescriptor, ProcedureDescriptor, ResultColumn, TableDescriptor,
};
use std::path::{Path, PathBuf};

/// `dbo.Customer`
///
/// - Identity primary key
/// - Unicode name and an ANSI country code
pub fn customer_table() -> TableDescriptor {
    TableDescriptor::new("dbo", "Customer")
        .column(ColumnDescriptor::new("CustomerId", "int").identity())
        .column(ColumnDescriptor::new("Name", "nvarchar").not_null().with_length(100))
        .column(ColumnDescriptor::new("CountryCode", "char").with_length(2))
        .primary_key(["CustomerId"])
}

/// `sales.Order`
///
/// - Identity primary key
/// - Foreign key to `dbo.Customer`
/// - Persisted computed total
pub fn order_table() -> TableDescriptor {
    TableDescriptor::new("sales", "Order")
        .column(ColumnDescriptor::new("OrderId", "int").identity())
        .column(ColumnDescriptor::new("CustomerId", "int").not_null())
        .column(ColumnDescriptor::new("Net", "money").not_null())
        .column(ColumnDescriptor::new("Tax", "decimal").not_null().with_precision(10, 2))
        .column(ColumnDescriptor::new("Total", "decimal").with_computed("([Net]+[Tax])", true))
        .column(ColumnDescriptor::new("PlacedAt", "datetimeoffset").with_default("(sysdatetimeoffset())"))
        .primary_key(["OrderId"])
}

pub fn order_customer_fk() -> ForeignKeyDescriptor {
    ForeignKeyDescriptor::new("FK_Order_Customer", ["CustomerId"], ObjectName::new("dbo", "Customer"))
        .referencing(["CustomerId"])
}

pub fn order_placed_index() -> IndexDescriptor {
    IndexDescriptor {
        filter: Some("([PlacedAt] IS NOT NULL)".to_string()),
        ..IndexDescriptor::new("IX_Order_PlacedAt")
            .column(IndexColumnDescriptor::key("PlacedAt"))
            .column(IndexColumnDescriptor::included("Total"))
    }
}

pub fn order_totals_view() -> TableDescriptor {
    TableDescriptor::new("sales", "vwOrderTotals")
        .column(ColumnDescriptor::new("CustomerId", "int").not_null())
        .column(ColumnDescriptor::new("Total", "decimal").with_precision(19, 4))
}

pub fn order_line_type() -> TableDescriptor {
    TableDescriptor::new("sales", "OrderLineList")
        .column(ColumnDescriptor::new("ProductId", "int").not_null())
        .column(ColumnDescriptor::new("Quantity", "smallint").not_null())
}

pub fn get_orders() -> (ProcedureDescriptor, Vec<ResultColumn>) {
    let order = ObjectName::new("sales", "Order");
    let procedure = ProcedureDescriptor::new("sales", "GetOrders")
        .parameter(ParameterDescriptor::new("@CustomerId", "int"))
        .parameter(ParameterDescriptor::new("@Count", "int").output());
    let result_set = vec![
        ResultColumn::new("OrderId", "int").not_null().from_table(order.clone()),
        ResultColumn::new("Total", "decimal").from_table(order),
    ];
    (procedure, result_set)
}

pub fn import_orders() -> ProcedureDescriptor {
    ProcedureDescriptor::new("sales", "ImportOrders")
        .parameter(ParameterDescriptor::table_valued("@Lines", ObjectName::new("sales", "OrderLineList")))
}

pub fn export_orders() -> ProcedureDescriptor {
    ProcedureDescriptor::new("sales", "ExportOrders")
        .parameter(ParameterDescriptor::new("@Path", "nvarchar").with_length(260))
}

/// Every fixture object in one mock catalog
pub fn sales_catalog() -> MockCatalog {
    let (orders, orders_result) = get_orders();
    let order = order_table().object_name();

    MockCatalog::new()
        .with_table(customer_table())
        .with_table(order_table())
        .with_foreign_key(order.clone(), order_customer_fk())
        .with_index(order, order_placed_index())
        .with_view(order_totals_view())
        .with_table_type(order_line_type())
        .with_procedure(orders, orders_result)
        .with_procedure(import_orders(), Vec::new())
        .with_failing_procedure(export_orders(), "Invalid object name '#staging'")
}

/// Write `snapshot` as pretty JSON into `dir`
pub fn write_snapshot(dir: &Path, snapshot: &CatalogSnapshot) -> PathBuf {
    let path = dir.join("catalog.json");
    let json = serde_json::to_string_pretty(snapshot).expect("snapshot serializes");
    std::fs::write(&path, json).expect("snapshot is written");
    path
}
