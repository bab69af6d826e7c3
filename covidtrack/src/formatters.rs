use std::io::Write;

use anyhow::{anyhow, Result};
use enum_dispatch::enum_dispatch;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Utility function to convert from polars `AnyValue` to `serde_json::Value`.
/// Covers the types the series and canonical frames are built from.
fn any_value_to_json(value: &AnyValue) -> Result<Value> {
    match value {
        AnyValue::Null => Ok(Value::Null),
        AnyValue::Boolean(b) => Ok(Value::Bool(*b)),
        AnyValue::String(s) => Ok(Value::String((*s).to_string())),
        AnyValue::Int32(n) => Ok(json!(*n)),
        AnyValue::Int64(n) => Ok(json!(*n)),
        AnyValue::UInt32(n) => Ok(json!(*n)),
        AnyValue::UInt64(n) => Ok(json!(*n)),
        // Non-finite floats have no JSON form and serialize as null.
        AnyValue::Float32(n) => Ok(json!(*n)),
        AnyValue::Float64(n) => Ok(json!(*n)),
        AnyValue::List(series) => {
            let json_values: Result<Vec<Value>> =
                series.iter().map(|val| any_value_to_json(&val)).collect();
            Ok(Value::Array(json_values?))
        }
        other => Err(anyhow!("Failed to convert type {}", other.dtype())),
    }
}

/// Trait to define different output generators. `save` writes the `DataFrame` to a
/// writer and `format` returns it as a string.
#[enum_dispatch]
pub trait OutputGenerator {
    fn save(&self, writer: &mut impl Write, df: &mut DataFrame) -> Result<()>;
    fn format(&self, df: &mut DataFrame) -> Result<String> {
        let mut data: Vec<u8> = vec![];
        self.save(&mut data, df)?;
        Ok(String::from_utf8(data)?)
    }
}

/// Enum of OutputFormatters, one for each output type.
#[enum_dispatch(OutputGenerator)]
#[derive(Serialize, Deserialize, Debug)]
pub enum OutputFormatter {
    Csv(CsvFormatter),
    Parquet(ParquetFormatter),
    JsonRecords(JsonRecordsFormatter),
    JsonColumns(JsonColumnsFormatter),
}

#[derive(Serialize, Deserialize, Debug, Default)]
pub struct CsvFormatter;

impl OutputGenerator for CsvFormatter {
    fn save(&self, writer: &mut impl Write, df: &mut DataFrame) -> Result<()> {
        CsvWriter::new(writer).finish(df)?;
        Ok(())
    }
}

/// Binary output: `format` is not meaningful and fails on the UTF-8 conversion.
#[derive(Serialize, Deserialize, Debug, Default)]
pub struct ParquetFormatter;

impl OutputGenerator for ParquetFormatter {
    fn save(&self, writer: &mut impl Write, df: &mut DataFrame) -> Result<()> {
        ParquetWriter::new(writer)
            .with_compression(ParquetCompression::Zstd(None))
            .finish(df)?;
        Ok(())
    }
}

/// A JSON array with one object per row.
#[derive(Serialize, Deserialize, Debug, Default)]
pub struct JsonRecordsFormatter;

impl OutputGenerator for JsonRecordsFormatter {
    fn save(&self, writer: &mut impl Write, df: &mut DataFrame) -> Result<()> {
        let mut rows = Vec::with_capacity(df.height());
        for idx in 0..df.height() {
            let mut row = Map::new();
            for col in df.get_columns() {
                row.insert(col.name().to_string(), any_value_to_json(&col.get(idx)?)?);
            }
            rows.push(Value::Object(row));
        }
        serde_json::to_writer(writer, &rows)?;
        Ok(())
    }
}

/// A JSON array with one `{"name", "values"}` object per column, in column order.
#[derive(Serialize, Deserialize, Debug, Default)]
pub struct JsonColumnsFormatter;

impl OutputGenerator for JsonColumnsFormatter {
    fn save(&self, writer: &mut impl Write, df: &mut DataFrame) -> Result<()> {
        let columns = df
            .get_columns()
            .iter()
            .map(|col| {
                let values = col
                    .iter()
                    .map(|val| any_value_to_json(&val))
                    .collect::<Result<Vec<_>>>()?;
                Ok(json!({ "name": col.name(), "values": values }))
            })
            .collect::<Result<Vec<_>>>()?;
        serde_json::to_writer(writer, &columns)?;
        Ok(())
    }
}
