//! Test fixtures for sync integration tests
//!
//! This module provides reusable catalog objects for driving the synchronizer
//! through a [`MockCatalog`]. The objects describe a small order-entry
//! database of the kind the importer is typically pointed at.

#![allow(dead_code)]

use modelsync_catalog::{
    ColumnDescriptor, ForeignKeyDescriptor, IndexColumnDescriptor, IndexDescriptor, MockCatalog,
    ObjectName, ParameterDescriptor, ProcedureDescriptor, ResultColumn, TableDescriptor,
};

/// `dbo.Customer`
///
/// - Identity primary key (CustomerId)
/// - Required unicode name
pub fn customer_table() -> TableDescriptor {
    TableDescriptor::new("dbo", "Customer")
        .column(ColumnDescriptor::new("CustomerId", "int").identity())
        .column(ColumnDescriptor::new("Name", "nvarchar").not_null().with_length(100))
        .primary_key(["CustomerId"])
}

/// `dbo.Order`
///
/// - Identity primary key (OrderId)
/// - Required foreign key to Customer (CustomerId)
/// - Order date with a default
/// - Money amount as decimal(10,2)
pub fn order_table() -> TableDescriptor {
    TableDescriptor::new("dbo", "Order")
        .column(ColumnDescriptor::new("OrderId", "int").identity())
        .column(ColumnDescriptor::new("CustomerId", "int").not_null())
        .column(
            ColumnDescriptor::new("OrderDate", "datetime2")
                .not_null()
                .with_default("(sysutcdatetime())"),
        )
        .column(ColumnDescriptor::new("Total", "decimal").not_null().with_precision(10, 2))
        .primary_key(["OrderId"])
}

/// `dbo.CustomerProfile`, keyed by its foreign key to Customer
pub fn customer_profile_table() -> TableDescriptor {
    TableDescriptor::new("dbo", "CustomerProfile")
        .column(ColumnDescriptor::new("CustomerId", "int").not_null())
        .column(ColumnDescriptor::new("Bio", "nvarchar").with_length(-1))
        .primary_key(["CustomerId"])
}

pub fn order_customer_fk() -> ForeignKeyDescriptor {
    ForeignKeyDescriptor::new("FK_Order_Customer", ["CustomerId"], ObjectName::new("dbo", "Customer"))
        .referencing(["CustomerId"])
}

pub fn profile_customer_fk() -> ForeignKeyDescriptor {
    ForeignKeyDescriptor::new("FK_CustomerProfile_Customer", ["CustomerId"], ObjectName::new("dbo", "Customer"))
        .referencing(["CustomerId"])
}

/// Indexes of `dbo.Order`
///
/// - Clustered primary key
/// - Plain index restating the Customer foreign key
/// - Covering index on the order date
pub fn order_indexes() -> Vec<IndexDescriptor> {
    vec![
        IndexDescriptor {
            is_primary_key: true,
            ..IndexDescriptor::new("PK_Order")
                .clustered()
                .unique()
                .column(IndexColumnDescriptor::key("OrderId"))
        },
        IndexDescriptor::new("IX_Order_CustomerId").column(IndexColumnDescriptor::key("CustomerId")),
        IndexDescriptor::new("IX_Order_OrderDate")
            .column(IndexColumnDescriptor {
                descending: true,
                ..IndexColumnDescriptor::key("OrderDate")
            })
            .column(IndexColumnDescriptor::included("Total")),
    ]
}

/// Customer and Order with their foreign key and indexes
pub fn sales_catalog() -> MockCatalog {
    let order = order_table().object_name();
    let mut catalog = MockCatalog::new()
        .with_table(customer_table())
        .with_table(order_table())
        .with_foreign_key(order.clone(), order_customer_fk());

    for index in order_indexes() {
        catalog = catalog.with_index(order.clone(), index);
    }

    catalog
}

/// `dbo.OrderLineList` table type
pub fn order_line_type() -> TableDescriptor {
    TableDescriptor::new("dbo", "OrderLineList")
        .column(ColumnDescriptor::new("ProductId", "int").not_null())
        .column(ColumnDescriptor::new("Quantity", "int").not_null())
}

/// `dbo.GetOrders`, returning rows of `dbo.Order`
pub fn get_orders() -> (ProcedureDescriptor, Vec<ResultColumn>) {
    let order = ObjectName::new("dbo", "Order");
    let procedure = ProcedureDescriptor::new("dbo", "GetOrders")
        .parameter(ParameterDescriptor::new("@CustomerId", "int"));
    let result_set = vec![
        ResultColumn::new("OrderId", "int").not_null().from_table(order.clone()),
        ResultColumn::new("Total", "decimal").not_null().from_table(order),
    ];
    (procedure, result_set)
}

/// `dbo.GetCustomerOrders`, joining Customer and Order
pub fn get_customer_orders() -> (ProcedureDescriptor, Vec<ResultColumn>) {
    let procedure = ProcedureDescriptor::new("dbo", "GetCustomerOrders")
        .parameter(ParameterDescriptor::new("@Since", "datetime2"));
    let result_set = vec![
        ResultColumn::new("Name", "nvarchar").not_null().from_table(ObjectName::new("dbo", "Customer")),
        ResultColumn::new("OrderId", "int").not_null().from_table(ObjectName::new("dbo", "Order")),
        ResultColumn::new("LineCount", "int"),
    ];
    (procedure, result_set)
}

/// `dbo.ImportOrders`, taking a table-valued parameter
pub fn import_orders() -> ProcedureDescriptor {
    ProcedureDescriptor::new("dbo", "ImportOrders")
        .parameter(ParameterDescriptor::table_valued("@Lines", ObjectName::new("dbo", "OrderLineList")))
        .parameter(ParameterDescriptor::new("@BatchId", "uniqueidentifier"))
        .parameter(ParameterDescriptor::new("@Imported", "int").output())
}

/// Sales catalog plus procedures and a table type
pub fn full_catalog() -> MockCatalog {
    let (orders, orders_result) = get_orders();
    let (customer_orders, customer_orders_result) = get_customer_orders();

    sales_catalog()
        .with_view(
            TableDescriptor::new("dbo", "vwCustomerTotals")
                .column(ColumnDescriptor::new("CustomerId", "int").not_null())
                .column(ColumnDescriptor::new("OrderTotal", "decimal").with_precision(18, 2)),
        )
        .with_table_type(order_line_type())
        .with_procedure(orders, orders_result)
        .with_procedure(customer_orders, customer_orders_result)
        .with_procedure(import_orders(), Vec::new())
}
