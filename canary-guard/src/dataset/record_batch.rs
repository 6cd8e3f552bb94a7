//! Conversion from Arrow record batches.

use arrow::array::{Array, AsArray};
use arrow::datatypes::{
    DataType, Date32Type, Date64Type, Float32Type, Float64Type, Int16Type, Int32Type, Int64Type,
    Int8Type, TimeUnit, TimestampMicrosecondType, TimestampMillisecondType,
    TimestampNanosecondType, TimestampSecondType, UInt16Type, UInt32Type, UInt64Type, UInt8Type,
};
use arrow::record_batch::RecordBatch;
use arrow::util::display::{ArrayFormatter, FormatOptions};
use tracing::debug;

use super::{Column, Dataset, Value};
use crate::prelude::*;

impl Dataset {
    /// Builds a dataset from a single Arrow record batch.
    ///
    /// Arrow nulls become [`Value::Null`]. Integer, float, boolean, string,
    /// date and timestamp arrays map onto the matching [`Value`] variants;
    /// any other type is rendered with Arrow's display formatter as text.
    pub fn from_record_batch(batch: &RecordBatch) -> Result<Self> {
        Self::from_record_batches(std::slice::from_ref(batch))
    }

    /// Builds a dataset from record batches sharing one schema, concatenating
    /// rows in batch order.
    pub fn from_record_batches(batches: &[RecordBatch]) -> Result<Self> {
        let Some(first) = batches.first() else {
            return Dataset::new(Vec::new());
        };

        let schema = first.schema();
        let mut columns: Vec<(String, Vec<Value>)> = schema
            .fields()
            .iter()
            .map(|field| (field.name().clone(), Vec::new()))
            .collect();

        for batch in batches {
            if batch.schema().fields() != schema.fields() {
                return Err(CanaryError::InvalidDataset(
                    "record batches do not share a schema".to_string(),
                ));
            }
            for ((_, values), array) in columns.iter_mut().zip(batch.columns()) {
                values.extend(array_values(array.as_ref())?);
            }
        }

        debug!(
            batches = batches.len(),
            columns = columns.len(),
            "Converted Arrow record batches"
        );

        Dataset::new(
            columns
                .into_iter()
                .map(|(name, values)| Column::new(name, values))
                .collect(),
        )
    }
}

macro_rules! collect_values {
    ($array:expr, $convert:expr) => {{
        let array = $array;
        (0..array.len())
            .map(|i| {
                if array.is_null(i) {
                    Ok(Value::Null)
                } else {
                    $convert(array, i)
                }
            })
            .collect::<Result<Vec<Value>>>()
    }};
}

fn array_values(array: &dyn Array) -> Result<Vec<Value>> {
    match array.data_type() {
        DataType::Boolean => {
            let typed = array.as_boolean();
            collect_values!(typed, |a: &arrow::array::BooleanArray, i| {
                Ok(Value::Boolean(a.value(i)))
            })
        }
        DataType::Int8 => integers::<Int8Type>(array),
        DataType::Int16 => integers::<Int16Type>(array),
        DataType::Int32 => integers::<Int32Type>(array),
        DataType::Int64 => integers::<Int64Type>(array),
        DataType::UInt8 => integers::<UInt8Type>(array),
        DataType::UInt16 => integers::<UInt16Type>(array),
        DataType::UInt32 => integers::<UInt32Type>(array),
        DataType::UInt64 => {
            let typed = array.as_primitive::<UInt64Type>();
            collect_values!(typed, |a: &arrow::array::UInt64Array, i| {
                let raw = a.value(i);
                Ok(i64::try_from(raw)
                    .map(Value::Integer)
                    .unwrap_or_else(|_| Value::Text(raw.to_string())))
            })
        }
        DataType::Float32 => {
            let typed = array.as_primitive::<Float32Type>();
            collect_values!(typed, |a: &arrow::array::Float32Array, i| {
                Ok(Value::Float(f64::from(a.value(i))))
            })
        }
        DataType::Float64 => {
            let typed = array.as_primitive::<Float64Type>();
            collect_values!(typed, |a: &arrow::array::Float64Array, i| {
                Ok(Value::Float(a.value(i)))
            })
        }
        DataType::Utf8 => {
            let typed = array.as_string::<i32>();
            collect_values!(typed, |a: &arrow::array::StringArray, i| {
                Ok(Value::Text(a.value(i).to_string()))
            })
        }
        DataType::LargeUtf8 => {
            let typed = array.as_string::<i64>();
            collect_values!(typed, |a: &arrow::array::LargeStringArray, i| {
                Ok(Value::Text(a.value(i).to_string()))
            })
        }
        DataType::Utf8View => {
            let typed = array.as_string_view();
            collect_values!(typed, |a: &arrow::array::StringViewArray, i| {
                Ok(Value::Text(a.value(i).to_string()))
            })
        }
        DataType::Date32 => {
            let typed = array.as_primitive::<Date32Type>();
            collect_values!(typed, |a: &arrow::array::Date32Array, i| {
                a.value_as_date(i)
                    .map(Value::Date)
                    .ok_or_else(|| out_of_range("Date32", i))
            })
        }
        DataType::Date64 => {
            let typed = array.as_primitive::<Date64Type>();
            collect_values!(typed, |a: &arrow::array::Date64Array, i| {
                a.value_as_date(i)
                    .map(Value::Date)
                    .ok_or_else(|| out_of_range("Date64", i))
            })
        }
        DataType::Timestamp(TimeUnit::Second, _) => {
            let typed = array.as_primitive::<TimestampSecondType>();
            collect_values!(typed, |a: &arrow::array::TimestampSecondArray, i| {
                a.value_as_datetime(i)
                    .map(Value::DateTime)
                    .ok_or_else(|| out_of_range("Timestamp", i))
            })
        }
        DataType::Timestamp(TimeUnit::Millisecond, _) => {
            let typed = array.as_primitive::<TimestampMillisecondType>();
            collect_values!(typed, |a: &arrow::array::TimestampMillisecondArray, i| {
                a.value_as_datetime(i)
                    .map(Value::DateTime)
                    .ok_or_else(|| out_of_range("Timestamp", i))
            })
        }
        DataType::Timestamp(TimeUnit::Microsecond, _) => {
            let typed = array.as_primitive::<TimestampMicrosecondType>();
            collect_values!(typed, |a: &arrow::array::TimestampMicrosecondArray, i| {
                a.value_as_datetime(i)
                    .map(Value::DateTime)
                    .ok_or_else(|| out_of_range("Timestamp", i))
            })
        }
        DataType::Timestamp(TimeUnit::Nanosecond, _) => {
            let typed = array.as_primitive::<TimestampNanosecondType>();
            collect_values!(typed, |a: &arrow::array::TimestampNanosecondArray, i| {
                a.value_as_datetime(i)
                    .map(Value::DateTime)
                    .ok_or_else(|| out_of_range("Timestamp", i))
            })
        }
        _ => {
            let formatter = ArrayFormatter::try_new(array, &FormatOptions::default())?;
            Ok((0..array.len())
                .map(|i| {
                    if array.is_null(i) {
                        Value::Null
                    } else {
                        Value::Text(formatter.value(i).to_string())
                    }
                })
                .collect())
        }
    }
}

fn integers<T>(array: &dyn Array) -> Result<Vec<Value>>
where
    T: arrow::datatypes::ArrowPrimitiveType,
    T::Native: Into<i64>,
{
    let typed = array.as_primitive::<T>();
    Ok((0..typed.len())
        .map(|i| {
            if typed.is_null(i) {
                Value::Null
            } else {
                Value::Integer(typed.value(i).into())
            }
        })
        .collect())
}

fn out_of_range(kind: &str, row: usize) -> CanaryError {
    CanaryError::InvalidDataset(format!("{kind} value at row {row} is out of range"))
}
