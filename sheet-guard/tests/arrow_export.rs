//! Exporting cleaned tables to Arrow.

use arrow::array::{Array, BooleanArray, Date32Array, Float64Array, StringArray};
use arrow::datatypes::DataType;
use sheet_guard::config::PipelineConfig;
use sheet_guard::core::{process, Table};
use sheet_guard::interop::{to_record_batch, SEMANTIC_TYPE_KEY};

fn cleaned_orders() -> Table {
    let table = Table::from_rows(
        [
            ["Customer", "Region", "Order Date", "Total", "Paid"],
            ["Ada", "North", "2024-01-05", "$1,200.50", "yes"],
            ["Grace", "South", "2024-01-09", "$980.00", "no"],
            ["Alan", "North", "2024-02-20", "N/A", "yes"],
            ["Edsger", "South", "2024-03-02", "$45.10", "no"],
            ["Barbara", "North", "2024-03-11", "$610.00", "N/A"],
        ]
        .iter()
        .map(|row| row.iter().map(|cell| cell.to_string()).collect())
        .collect(),
    )
    .unwrap();
    process(table, &PipelineConfig::default()).unwrap().table
}

#[test]
fn test_cleaned_table_exports_typed_columns() {
    let batch = to_record_batch(&cleaned_orders()).unwrap();
    let schema = batch.schema();

    assert_eq!(batch.num_rows(), 5);
    let types: Vec<(&str, &DataType)> = schema
        .fields()
        .iter()
        .map(|f| (f.name().as_str(), f.data_type()))
        .collect();
    assert_eq!(
        types,
        vec![
            ("Customer", &DataType::Utf8),
            ("Region", &DataType::Utf8),
            ("Order Date", &DataType::Date32),
            ("Total", &DataType::Float64),
            ("Paid", &DataType::Boolean),
        ]
    );
    assert_eq!(
        schema
            .field(1)
            .metadata()
            .get(SEMANTIC_TYPE_KEY)
            .map(String::as_str),
        Some("Categorical")
    );

    let totals = batch
        .column(3)
        .as_any()
        .downcast_ref::<Float64Array>()
        .unwrap();
    assert_eq!(totals.value(0), 1200.5);
    assert!(totals.is_null(2));

    let paid = batch
        .column(4)
        .as_any()
        .downcast_ref::<BooleanArray>()
        .unwrap();
    assert!(paid.value(0));
    assert!(paid.is_null(4));

    let dates = batch
        .column(2)
        .as_any()
        .downcast_ref::<Date32Array>()
        .unwrap();
    assert_eq!(dates.null_count(), 0);

    let customers = batch
        .column(0)
        .as_any()
        .downcast_ref::<StringArray>()
        .unwrap();
    assert_eq!(customers.value(1), "Grace");
}
