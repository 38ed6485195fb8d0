//! Index tables: collected entries as an Arrow record batch
//!
//! One row per entry, one column per distinct metadata key. Column types
//! are inferred across rows with widening (all integers stay `Int64`, a
//! stray float widens to `Float64`, anything mixed falls back to `Utf8`);
//! rows missing a key get a null cell.

use crate::entry::Metadata;
use crate::error::{LayoutError, Result};
use arrow::array::{
    ArrayRef, BooleanArray, Float64Array, Int64Array, RecordBatch, RecordBatchOptions,
    StringArray,
};
use arrow::datatypes::{DataType, Field, Schema};
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Tabular view over collected entries, optionally keyed by index fields.
#[derive(Debug, Clone)]
pub struct IndexTable {
    batch: RecordBatch,
    index_fields: Vec<String>,
    index: HashMap<Vec<String>, usize>,
}

impl IndexTable {
    pub(crate) fn from_rows(rows: Vec<Metadata>, index_fields: &[&str]) -> Result<Self> {
        let mut columns: BTreeSet<String> = BTreeSet::new();
        for row in &rows {
            columns.extend(row.keys().cloned());
        }
        for field in index_fields {
            if !columns.contains(*field) {
                return Err(LayoutError::Config(format!(
                    "index field '{}' not present in any entry",
                    field
                )));
            }
        }

        let mut fields: Vec<Field> = Vec::with_capacity(columns.len());
        let mut arrays: Vec<ArrayRef> = Vec::with_capacity(columns.len());
        for name in &columns {
            let ty = infer_column_type(&rows, name);
            fields.push(Field::new(name.clone(), ty.data_type(), true));
            arrays.push(build_column(&rows, name, ty));
        }

        let schema = Arc::new(Schema::new(fields));
        let batch = if arrays.is_empty() {
            // No columns at all; keep the row count without any arrays.
            RecordBatch::try_new_with_options(
                schema,
                arrays,
                &RecordBatchOptions::new().with_row_count(Some(rows.len())),
            )?
        } else {
            RecordBatch::try_new(schema, arrays)?
        };

        let index_fields: Vec<String> = index_fields.iter().map(|s| s.to_string()).collect();
        let index = build_row_index(&rows, &index_fields);

        info!(
            rows = batch.num_rows(),
            columns = batch.num_columns(),
            "built index table"
        );
        Ok(Self {
            batch,
            index_fields,
            index,
        })
    }

    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    pub fn num_columns(&self) -> usize {
        self.batch.num_columns()
    }

    /// Column names in table order (sorted by key).
    pub fn column_names(&self) -> Vec<String> {
        self.batch
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect()
    }

    pub fn index_fields(&self) -> &[String] {
        &self.index_fields
    }

    pub fn column(&self, name: &str) -> Option<ArrayRef> {
        self.batch.column_by_name(name).cloned()
    }

    pub fn record_batch(&self) -> &RecordBatch {
        &self.batch
    }

    /// Row number of the first entry whose index-field values (in string
    /// form) equal `key`. `None` without index fields or without a match.
    pub fn lookup(&self, key: &[&str]) -> Option<usize> {
        if self.index_fields.is_empty() || key.len() != self.index_fields.len() {
            return None;
        }
        let key: Vec<String> = key.iter().map(|s| s.to_string()).collect();
        self.index.get(&key).copied()
    }

    /// Write the table as CSV with headers, via a temp-file rename.
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let temp_path = temp_sibling(path);
        let result = self.write_csv_at(&temp_path, path);
        if result.is_err() {
            let _ = fs::remove_file(&temp_path);
        }
        result
    }

    fn write_csv_at(&self, temp_path: &Path, final_path: &Path) -> Result<()> {
        let file = fs::File::create(temp_path)?;
        let mut writer = arrow::csv::WriterBuilder::new().with_header(true).build(file);
        writer.write(&self.batch)?;
        drop(writer);
        fs::rename(temp_path, final_path)?;
        info!(
            path = %final_path.display(),
            rows = self.batch.num_rows(),
            "wrote csv"
        );
        Ok(())
    }

    /// Write the table as SNAPPY-compressed Parquet, via a temp-file rename.
    pub fn write_parquet(&self, path: &Path) -> Result<()> {
        let temp_path = temp_sibling(path);
        let result = self.write_parquet_at(&temp_path, path);
        if result.is_err() {
            let _ = fs::remove_file(&temp_path);
        }
        result
    }

    fn write_parquet_at(&self, temp_path: &Path, final_path: &Path) -> Result<()> {
        let file = fs::File::create(temp_path)?;
        let props = parquet::file::properties::WriterProperties::builder()
            .set_compression(parquet::basic::Compression::SNAPPY)
            .build();
        let mut writer = parquet::arrow::arrow_writer::ArrowWriter::try_new(
            file,
            self.batch.schema(),
            Some(props),
        )?;
        writer.write(&self.batch)?;
        writer.close()?;
        fs::rename(temp_path, final_path)?;
        info!(
            path = %final_path.display(),
            rows = self.batch.num_rows(),
            "wrote parquet"
        );
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnType {
    Int,
    Float,
    Bool,
    Text,
}

impl ColumnType {
    fn data_type(self) -> DataType {
        match self {
            ColumnType::Int => DataType::Int64,
            ColumnType::Float => DataType::Float64,
            ColumnType::Bool => DataType::Boolean,
            ColumnType::Text => DataType::Utf8,
        }
    }
}

fn infer_column_type(rows: &[Metadata], name: &str) -> ColumnType {
    let mut inferred: Option<ColumnType> = None;
    for row in rows {
        let observed = match row.get(name) {
            None | Some(Value::Null) => continue,
            Some(Value::Bool(_)) => ColumnType::Bool,
            Some(Value::Number(n)) if n.is_f64() => ColumnType::Float,
            Some(Value::Number(_)) => ColumnType::Int,
            Some(_) => ColumnType::Text,
        };
        inferred = Some(match inferred {
            None => observed,
            Some(current) => widen(current, observed),
        });
        if inferred == Some(ColumnType::Text) {
            break;
        }
    }
    inferred.unwrap_or(ColumnType::Text)
}

fn widen(a: ColumnType, b: ColumnType) -> ColumnType {
    use ColumnType::*;
    match (a, b) {
        (Int, Int) => Int,
        (Int, Float) | (Float, Int) | (Float, Float) => Float,
        (Bool, Bool) => Bool,
        _ => Text,
    }
}

fn build_column(rows: &[Metadata], name: &str, ty: ColumnType) -> ArrayRef {
    match ty {
        ColumnType::Int => {
            let values: Vec<Option<i64>> = rows
                .iter()
                .map(|row| row.get(name).and_then(Value::as_i64))
                .collect();
            Arc::new(Int64Array::from(values))
        }
        ColumnType::Float => {
            let values: Vec<Option<f64>> = rows
                .iter()
                .map(|row| row.get(name).and_then(Value::as_f64))
                .collect();
            Arc::new(Float64Array::from(values))
        }
        ColumnType::Bool => {
            let values: Vec<Option<bool>> = rows
                .iter()
                .map(|row| row.get(name).and_then(Value::as_bool))
                .collect();
            Arc::new(BooleanArray::from(values))
        }
        ColumnType::Text => {
            let values: StringArray = rows
                .iter()
                .map(|row| match row.get(name) {
                    None | Some(Value::Null) => None,
                    Some(value) => Some(cell_text(value)),
                })
                .collect();
            Arc::new(values)
        }
    }
}

/// String form of a cell: strings verbatim, everything else compact JSON.
fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn build_row_index(rows: &[Metadata], index_fields: &[String]) -> HashMap<Vec<String>, usize> {
    let mut index = HashMap::new();
    if index_fields.is_empty() {
        return index;
    }
    for (row_number, row) in rows.iter().enumerate() {
        let key: Vec<String> = index_fields
            .iter()
            .map(|field| row.get(field).map(cell_text).unwrap_or_default())
            .collect();
        // First occurrence wins; duplicate keys are the caller's concern.
        index.entry(key).or_insert(row_number);
    }
    index
}

fn temp_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "table".to_string());
    path.with_file_name(format!(".{}.tmp", name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::Array;
    use serde_json::json;

    fn row(pairs: &[(&str, Value)]) -> Metadata {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn missing_keys_become_null_cells() {
        let rows = vec![
            row(&[("a", json!("1"))]),
            row(&[("a", json!("2")), ("b", json!("x"))]),
        ];
        let table = IndexTable::from_rows(rows, &[]).unwrap();

        assert_eq!(table.num_rows(), 2);
        assert_eq!(table.column_names(), vec!["a", "b"]);

        let b = table.column("b").unwrap();
        let b = b.as_any().downcast_ref::<StringArray>().unwrap();
        assert!(b.is_null(0));
        assert_eq!(b.value(1), "x");
    }

    #[test]
    fn integer_columns_stay_integers() {
        let rows = vec![
            row(&[("size", json!(10))]),
            row(&[("size", json!(20))]),
        ];
        let table = IndexTable::from_rows(rows, &[]).unwrap();

        let size = table.column("size").unwrap();
        let size = size.as_any().downcast_ref::<Int64Array>().unwrap();
        assert_eq!(size.value(0), 10);
        assert_eq!(size.value(1), 20);
    }

    #[test]
    fn a_float_widens_the_whole_column() {
        let rows = vec![
            row(&[("score", json!(1))]),
            row(&[("score", json!(2.5))]),
        ];
        let table = IndexTable::from_rows(rows, &[]).unwrap();

        let score = table.column("score").unwrap();
        let score = score.as_any().downcast_ref::<Float64Array>().unwrap();
        assert_eq!(score.value(0), 1.0);
        assert_eq!(score.value(1), 2.5);
    }

    #[test]
    fn mixed_types_fall_back_to_text() {
        let rows = vec![
            row(&[("v", json!(1))]),
            row(&[("v", json!("two"))]),
        ];
        let table = IndexTable::from_rows(rows, &[]).unwrap();

        let v = table.column("v").unwrap();
        let v = v.as_any().downcast_ref::<StringArray>().unwrap();
        assert_eq!(v.value(0), "1");
        assert_eq!(v.value(1), "two");
    }

    #[test]
    fn bool_columns_are_boolean() {
        let rows = vec![
            row(&[("ok", json!(true))]),
            row(&[("ok", json!(false))]),
        ];
        let table = IndexTable::from_rows(rows, &[]).unwrap();

        let ok = table.column("ok").unwrap();
        let ok = ok.as_any().downcast_ref::<BooleanArray>().unwrap();
        assert!(ok.value(0));
        assert!(!ok.value(1));
    }

    #[test]
    fn index_lookup_returns_the_first_match() {
        let rows = vec![
            row(&[("year", json!("1949")), ("title", json!("1984"))]),
            row(&[("year", json!("1965")), ("title", json!("dune"))]),
            row(&[("year", json!("1965")), ("title", json!("duplicate"))]),
        ];
        let table = IndexTable::from_rows(rows, &["year"]).unwrap();

        assert_eq!(table.index_fields(), &["year".to_string()]);
        assert_eq!(table.lookup(&["1949"]), Some(0));
        assert_eq!(table.lookup(&["1965"]), Some(1));
        assert_eq!(table.lookup(&["2001"]), None);
        // Wrong arity never matches.
        assert_eq!(table.lookup(&["1949", "1984"]), None);
    }

    #[test]
    fn compound_index_keys_work() {
        let rows = vec![
            row(&[("genre", json!("scifi")), ("year", json!("1965"))]),
            row(&[("genre", json!("gothic")), ("year", json!("1847"))]),
        ];
        let table = IndexTable::from_rows(rows, &["genre", "year"]).unwrap();
        assert_eq!(table.lookup(&["gothic", "1847"]), Some(1));
        assert_eq!(table.lookup(&["gothic", "1965"]), None);
    }

    #[test]
    fn unknown_index_field_is_a_config_error() {
        let rows = vec![row(&[("a", json!("1"))])];
        let err = IndexTable::from_rows(rows, &["missing"]).unwrap_err();
        assert!(matches!(err, LayoutError::Config(_)));
    }

    #[test]
    fn empty_input_builds_an_empty_table() {
        let table = IndexTable::from_rows(Vec::new(), &[]).unwrap();
        assert_eq!(table.num_rows(), 0);
        assert_eq!(table.num_columns(), 0);
        assert!(table.lookup(&["x"]).is_none());
    }

    #[test]
    fn csv_export_writes_atomically() {
        let dir = tempfile::TempDir::new().unwrap();
        let rows = vec![
            row(&[("a", json!("1"))]),
            row(&[("a", json!("2")), ("b", json!("x"))]),
        ];
        let table = IndexTable::from_rows(rows, &[]).unwrap();

        let out = dir.path().join("table.csv");
        table.write_csv(&out).unwrap();

        let content = fs::read_to_string(&out).unwrap();
        assert!(content.starts_with("a,b"));
        assert!(!temp_sibling(&out).exists());
    }

    #[test]
    fn parquet_export_writes_atomically() {
        let dir = tempfile::TempDir::new().unwrap();
        let rows = vec![row(&[("a", json!("1"))])];
        let table = IndexTable::from_rows(rows, &[]).unwrap();

        let out = dir.path().join("table.parquet");
        table.write_parquet(&out).unwrap();

        assert!(out.exists());
        assert!(fs::metadata(&out).unwrap().len() > 0);
        assert!(!temp_sibling(&out).exists());
    }
}
