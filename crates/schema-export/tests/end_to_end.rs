//! End-to-end exports driven by snapshot sources.

use schema_export::core::metadata::fields;
use schema_export::{
    build_and_generate, Collection, ExportError, MetadataProvider, MetadataTable, Restrictions,
    Result, SchemaBuilder, ScriptGenerator, SnapshotSource,
};

const SHOP: &str = r#"{
    "collections": [
        {
            "name": "Tables",
            "columns": ["TABLE_NAME", "TABLE_TYPE"],
            "rows": [
                [{"text": "T"}, {"text": "TABLE"}],
                [{"text": "OrderLines"}, {"text": "TABLE"}],
                [{"text": "MSysObjects"}, {"text": "SYSTEM TABLE"}]
            ]
        },
        {
            "name": "Columns",
            "columns": ["TABLE_NAME", "COLUMN_NAME", "ORDINAL_POSITION", "DATA_TYPE", "IS_NULLABLE"],
            "rows": [
                [{"text": "T"}, {"text": "id"}, {"int": 1}, {"int": 3}, {"bool": false}],
                [{"text": "T"}, {"text": "name"}, {"int": 2}, {"int": 130}, {"bool": true}],
                [{"text": "OrderLines"}, {"text": "qty"}, {"int": 3}, {"int": 2}, {"bool": false}],
                [{"text": "OrderLines"}, {"text": "order_id"}, {"int": 1}, {"int": 3}, {"bool": false}],
                [{"text": "OrderLines"}, {"text": "line"}, {"int": 2}, {"int": 3}, {"bool": false}],
                [{"text": "OrderLines"}, {"text": "price"}, {"int": 4}, {"int": 6}, {"bool": true}]
            ]
        },
        {
            "name": "Indexes",
            "columns": ["TABLE_NAME", "INDEX_NAME", "COLUMN_NAME", "ORDINAL_POSITION", "PRIMARY_KEY"],
            "rows": [
                [{"text": "T"}, {"text": "PrimaryKey"}, {"text": "id"}, {"int": 1}, {"bool": true}],
                [{"text": "OrderLines"}, {"text": "PrimaryKey"}, {"text": "order_id"}, {"int": 1}, {"bool": true}],
                [{"text": "OrderLines"}, {"text": "PrimaryKey"}, {"text": "line"}, {"int": 2}, {"bool": true}]
            ]
        }
    ],
    "data": [
        {"table": "T", "columns": ["name", "id"], "rows": [[{"text": "x"}, {"int": 1}], ["null", {"int": 2}]]},
        {"table": "OrderLines", "columns": ["order_id", "line", "qty", "price"],
         "rows": [[{"int": 10}, {"int": 1}, {"text": "3"}, {"decimal": "4.50"}]]}
    ]
}"#;

/// Wraps a provider and fails every Indexes request for one table.
struct FailingIndexes<'a> {
    inner: &'a SnapshotSource,
    table: &'static str,
}

impl MetadataProvider for FailingIndexes<'_> {
    fn get_schema(
        &self,
        collection: Collection,
        restrictions: &Restrictions,
    ) -> Result<MetadataTable> {
        if collection == Collection::Indexes && restrictions.get(4) == Some(self.table) {
            return Err(ExportError::metadata(collection.name(), "connection reset"));
        }
        self.inner.get_schema(collection, restrictions)
    }

    fn describe(&self) -> String {
        "flaky".into()
    }
}

fn shop() -> SnapshotSource {
    SnapshotSource::from_json(SHOP).unwrap()
}

#[test]
fn test_schema_matches_source_order_and_types() {
    let schema = SchemaBuilder::new(&shop()).build();
    assert_eq!(schema.table_names(), vec!["T", "OrderLines"]);

    let lines = schema.get("OrderLines").unwrap();
    assert_eq!(lines.column_names(), vec!["order_id", "line", "qty", "price"]);
}

#[test]
fn test_script_for_reference_table() {
    let source = shop();
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("shop.sql");

    let summary = build_and_generate(&source, Some(&source), &out, true).unwrap();
    assert_eq!(summary.tables, 2);
    assert_eq!(summary.rows_written, 3);

    let script = std::fs::read_to_string(&out).unwrap();
    assert!(script.contains(
        "DROP TABLE IF EXISTS \"T\";\nDROP TABLE IF EXISTS \"OrderLines\";\n"
    ));
    assert!(script.contains(
        "CREATE TABLE \"T\" (\n\t\"id\" INTEGER PRIMARY KEY AUTOINCREMENT, \n\t\"name\" STRING NULL\n);"
    ));
    // Cells are matched by name, so the fetched column order does not matter.
    assert!(script.contains("INSERT INTO \"T\" (\"id\", \"name\") \n\tVALUES (1, \"x\");"));
    assert!(script.contains("INSERT INTO \"T\" (\"id\", \"name\") \n\tVALUES (2, NULL);"));
}

#[test]
fn test_sections_keep_table_order() {
    let source = shop();
    let schema = SchemaBuilder::new(&source).build();
    let script = ScriptGenerator::new(&schema)
        .with_data(&source)
        .generate()
        .unwrap();

    let pos = |needle: &str| script.find(needle).unwrap();
    assert!(pos("DROP TABLE IF EXISTS \"T\"") < pos("DROP TABLE IF EXISTS \"OrderLines\""));
    assert!(pos("DROP TABLE IF EXISTS \"OrderLines\"") < pos("CREATE TABLE \"T\""));
    assert!(pos("CREATE TABLE \"T\"") < pos("CREATE TABLE \"OrderLines\""));
    assert!(pos("CREATE TABLE \"OrderLines\"") < pos("-- Data for table \"T\""));
    assert!(pos("-- Data for table \"T\"") < pos("-- Data for table \"OrderLines\""));
}

#[test]
fn test_composite_primary_key_is_flagged_per_column() {
    // Known defect: each key column gets its own PRIMARY KEY clause,
    // which strict engines reject.
    let source = shop();
    let schema = SchemaBuilder::new(&source).build();
    let lines = schema.get("OrderLines").unwrap();
    assert!(lines.has_composite_primary_key());

    let script = ScriptGenerator::new(&schema).generate().unwrap();
    assert!(script.contains(
        "CREATE TABLE \"OrderLines\" (\n\t\"order_id\" INTEGER PRIMARY KEY AUTOINCREMENT, \n\t\"line\" INTEGER PRIMARY KEY AUTOINCREMENT, \n\t\"qty\" INTEGER NOT NULL, \n\t\"price\" DOUBLE NULL\n);"
    ));
}

#[test]
fn test_failed_index_request_leaves_table_without_key() {
    let source = shop();
    let flaky = FailingIndexes {
        inner: &source,
        table: "T",
    };
    let schema = SchemaBuilder::new(&flaky).build();

    let t = schema.get("T").unwrap();
    assert!(t.columns.iter().all(|c| !c.is_primary_key));
    assert_eq!(schema.get("OrderLines").unwrap().primary_key_columns().count(), 2);
}

#[test]
fn test_missing_table_data_keeps_script_valid() {
    let json = SHOP.replace("\"table\": \"OrderLines\"", "\"table\": \"Elsewhere\"");
    let source = SnapshotSource::from_json(&json).unwrap();
    let schema = SchemaBuilder::new(&source).build();

    let mut buf = Vec::new();
    let summary = ScriptGenerator::new(&schema)
        .with_data(&source)
        .write_to(&mut buf)
        .unwrap();
    assert_eq!(summary.tables_without_data, vec!["OrderLines".to_string()]);
    assert_eq!(summary.rows_written, 2);

    let script = String::from_utf8(buf).unwrap();
    assert!(script.trim_end().ends_with("-- Data for table \"OrderLines\""));
}

#[test]
fn test_unreachable_output_is_io_error() {
    let source = shop();
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("missing-dir").join("shop.sql");

    let err = build_and_generate(&source, None, &out, false).unwrap_err();
    assert!(matches!(err, ExportError::Io(_)));
    assert_eq!(err.exit_code(), 7);
}

#[test]
fn test_snapshot_restrictions_follow_collection_fields() {
    let source = shop();
    let columns = source
        .get_schema(Collection::Columns, &Restrictions::columns_of("T"))
        .unwrap();
    assert_eq!(columns.len(), 2);
    let idx = columns.column_index(fields::TABLE_NAME).unwrap();
    assert!(columns.rows.iter().all(|r| r[idx].to_string() == "T"));
}
