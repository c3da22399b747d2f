use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use ordered_float::OrderedFloat;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Column and parameter types understood by the planner.
///
/// Integral widths are kept distinct because a value extracted from SQL text
/// must fit the declared column before a cached plan may be reused with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    Boolean,
    TinyInt,
    SmallInt,
    Integer,
    BigInt,
    Float,
    Decimal,
    Varchar(Option<u32>),
    Varbinary(Option<u32>),
    Timestamp,
}

impl DataType {
    /// Parses a DDL type name such as `INTEGER` or `VARCHAR(64)`.
    pub fn from_sql_name(name: &str) -> Option<DataType> {
        let upper = name.trim().to_uppercase();
        let (base, length) = match upper.find('(') {
            Some(open) => {
                let close = upper.rfind(')')?;
                let inner = upper.get(open + 1..close)?;
                let length = inner.split(',').next()?.trim().parse::<u32>().ok();
                (upper[..open].trim().to_string(), length)
            }
            None => (upper, None),
        };

        match base.as_str() {
            "BOOLEAN" | "BOOL" => Some(DataType::Boolean),
            "TINYINT" => Some(DataType::TinyInt),
            "SMALLINT" => Some(DataType::SmallInt),
            "INT" | "INTEGER" => Some(DataType::Integer),
            "BIGINT" => Some(DataType::BigInt),
            "FLOAT" | "REAL" | "DOUBLE" | "DOUBLE PRECISION" => Some(DataType::Float),
            "DECIMAL" | "NUMERIC" | "DEC" => Some(DataType::Decimal),
            "VARCHAR" | "CHAR" | "CHARACTER VARYING" | "TEXT" | "STRING" => {
                Some(DataType::Varchar(length))
            }
            "VARBINARY" | "BINARY" | "BYTEA" => Some(DataType::Varbinary(length)),
            "TIMESTAMP" | "DATETIME" => Some(DataType::Timestamp),
            _ => None,
        }
    }

    pub fn is_integral(&self) -> bool {
        matches!(
            self,
            DataType::TinyInt | DataType::SmallInt | DataType::Integer | DataType::BigInt
        )
    }

    pub fn is_numeric(&self) -> bool {
        self.is_integral() || matches!(self, DataType::Float | DataType::Decimal)
    }

    fn integral_range(&self) -> Option<(i64, i64)> {
        match self {
            DataType::TinyInt => Some((i8::MIN as i64, i8::MAX as i64)),
            DataType::SmallInt => Some((i16::MIN as i64, i16::MAX as i64)),
            DataType::Integer => Some((i32::MIN as i64, i32::MAX as i64)),
            DataType::BigInt => Some((i64::MIN, i64::MAX)),
            _ => None,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Boolean => write!(f, "BOOLEAN"),
            DataType::TinyInt => write!(f, "TINYINT"),
            DataType::SmallInt => write!(f, "SMALLINT"),
            DataType::Integer => write!(f, "INTEGER"),
            DataType::BigInt => write!(f, "BIGINT"),
            DataType::Float => write!(f, "FLOAT"),
            DataType::Decimal => write!(f, "DECIMAL"),
            DataType::Varchar(Some(len)) => write!(f, "VARCHAR({})", len),
            DataType::Varchar(None) => write!(f, "VARCHAR"),
            DataType::Varbinary(Some(len)) => write!(f, "VARBINARY({})", len),
            DataType::Varbinary(None) => write!(f, "VARBINARY"),
            DataType::Timestamp => write!(f, "TIMESTAMP"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Value {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(OrderedFloat<f64>),
    Decimal(Decimal),
    String(String),
    Bytes(Vec<u8>),
    /// Microseconds since the Unix epoch.
    Timestamp(i64),
}

impl Value {
    pub fn integer(v: i64) -> Self {
        Value::Integer(v)
    }

    pub fn float(v: f64) -> Self {
        Value::Float(OrderedFloat(v))
    }

    pub fn string(v: impl Into<String>) -> Self {
        Value::String(v.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The type a literal of this value has before any column context applies.
    pub fn natural_type(&self) -> Option<DataType> {
        match self {
            Value::Null => None,
            Value::Boolean(_) => Some(DataType::Boolean),
            Value::Integer(_) => Some(DataType::BigInt),
            Value::Float(_) => Some(DataType::Float),
            Value::Decimal(_) => Some(DataType::Decimal),
            Value::String(_) => Some(DataType::Varchar(None)),
            Value::Bytes(_) => Some(DataType::Varbinary(None)),
            Value::Timestamp(_) => Some(DataType::Timestamp),
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "NULL",
            Value::Boolean(_) => "BOOLEAN",
            Value::Integer(_) => "INTEGER",
            Value::Float(_) => "FLOAT",
            Value::Decimal(_) => "DECIMAL",
            Value::String(_) => "VARCHAR",
            Value::Bytes(_) => "VARBINARY",
            Value::Timestamp(_) => "TIMESTAMP",
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) | Value::Timestamp(i) => Some(*i),
            _ => None,
        }
    }

    /// Converts the value to `target`, failing instead of truncating.
    pub fn coerce_to(&self, target: &DataType) -> Result<Value> {
        let mismatch = || Error::type_mismatch(target.to_string(), self.kind_name());

        match (self, target) {
            (Value::Null, _) => Ok(Value::Null),
            (Value::Boolean(b), DataType::Boolean) => Ok(Value::Boolean(*b)),

            (Value::Integer(i), t) if t.is_integral() => {
                let (min, max) = t.integral_range().ok_or_else(mismatch)?;
                if *i < min || *i > max {
                    return Err(Error::invalid_literal(format!(
                        "value {} is out of range for {}",
                        i, t
                    )));
                }
                Ok(Value::Integer(*i))
            }
            (Value::Integer(i), DataType::Float) => Ok(Value::Float(OrderedFloat(*i as f64))),
            (Value::Integer(i), DataType::Decimal) => Ok(Value::Decimal(Decimal::from(*i))),
            (Value::Integer(i), DataType::Timestamp) => Ok(Value::Timestamp(*i)),

            (Value::Float(f), DataType::Float) => Ok(Value::Float(*f)),
            (Value::Float(f), DataType::Decimal) => Decimal::from_f64_retain(f.0)
                .map(Value::Decimal)
                .ok_or_else(|| Error::invalid_literal(format!("{} is not a valid DECIMAL", f))),

            (Value::Decimal(d), DataType::Decimal) => Ok(Value::Decimal(*d)),
            (Value::Decimal(d), DataType::Float) => d
                .to_f64()
                .map(|f| Value::Float(OrderedFloat(f)))
                .ok_or_else(mismatch),
            (Value::Decimal(d), t) if t.is_integral() => {
                if !d.fract().is_zero() {
                    return Err(mismatch());
                }
                let i = d.to_i64().ok_or_else(mismatch)?;
                Value::Integer(i).coerce_to(t)
            }

            (Value::String(s), DataType::Varchar(limit)) => {
                if let Some(limit) = limit
                    && s.chars().count() > *limit as usize
                {
                    return Err(Error::invalid_literal(format!(
                        "string of length {} exceeds VARCHAR({})",
                        s.chars().count(),
                        limit
                    )));
                }
                Ok(Value::String(s.clone()))
            }
            (Value::String(s), DataType::Timestamp) => parse_timestamp(s).map(Value::Timestamp),
            (Value::String(s), DataType::Varbinary(_)) => hex::decode(s)
                .map(Value::Bytes)
                .map_err(|e| Error::invalid_literal(format!("invalid hex string: {}", e))),

            (Value::Bytes(b), DataType::Varbinary(limit)) => {
                if let Some(limit) = limit
                    && b.len() > *limit as usize
                {
                    return Err(Error::invalid_literal(format!(
                        "{} bytes exceed VARBINARY({})",
                        b.len(),
                        limit
                    )));
                }
                Ok(Value::Bytes(b.clone()))
            }
            (Value::Timestamp(t), DataType::Timestamp) => Ok(Value::Timestamp(*t)),

            _ => Err(mismatch()),
        }
    }
}

fn parse_timestamp(s: &str) -> Result<i64> {
    let trimmed = s.trim();
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(dt.and_utc().timestamp_micros());
        }
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp_micros())
        .ok_or_else(|| Error::invalid_literal(format!("invalid TIMESTAMP: '{}'", s)))
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Boolean(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(v) => write!(f, "{}", v),
            Value::Decimal(d) => write!(f, "{}", d),
            Value::String(s) => write!(f, "'{}'", s.replace('\'', "''")),
            Value::Bytes(b) => write!(f, "X'{}'", hex::encode_upper(b)),
            Value::Timestamp(micros) => match DateTime::from_timestamp_micros(*micros) {
                Some(dt) => write!(f, "'{}'", dt.format("%Y-%m-%d %H:%M:%S%.6f")),
                None => write!(f, "{}", micros),
            },
        }
    }
}

/// Ordered concrete values for one invocation of a planned statement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParameterSet {
    values: Vec<Value>,
}

impl ParameterSet {
    pub fn new() -> Self {
        Self { values: Vec::new() }
    }

    pub fn from_values(values: Vec<Value>) -> Self {
        Self { values }
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.values.iter()
    }
}

impl From<Vec<Value>> for ParameterSet {
    fn from(values: Vec<Value>) -> Self {
        Self::from_values(values)
    }
}
