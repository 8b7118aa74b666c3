//! The analytical type lattice: inference from runtime values and type
//! promotion for schema evolution.

use std::fmt;

use crate::record::Value;
use crate::store::error::StoreError;

/// Column types of the analytical store.
///
/// The value-carrying types map one-to-one onto DuckDB column types
/// (`Null` is stored as `BIT`, which only ever holds NULLs here). `JsonMap`
/// is never materialised as a column; it marks a nested object that must be
/// flattened. The `Unknown*` sentinels exist to make bugs loud: they have
/// no SQL meaning and the promotion lattice rejects them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    Null,
    Boolean,
    Utinyint,
    Usmallint,
    Uinteger,
    Ubigint,
    Tinyint,
    Smallint,
    Integer,
    Bigint,
    Hugeint,
    Float,
    Double,
    Date,
    Time,
    Timestamp,
    Uuid,
    Varchar,
    Json,
    JsonMap,
    UnknownInt,
    UnknownFloat,
    UnknownString,
    Unknown,
}

impl ColumnType {
    /// SQL spelling, as used in DDL and reported by `information_schema`.
    pub fn as_sql(self) -> &'static str {
        match self {
            ColumnType::Null => "BIT",
            ColumnType::Boolean => "BOOLEAN",
            ColumnType::Utinyint => "UTINYINT",
            ColumnType::Usmallint => "USMALLINT",
            ColumnType::Uinteger => "UINTEGER",
            ColumnType::Ubigint => "UBIGINT",
            ColumnType::Tinyint => "TINYINT",
            ColumnType::Smallint => "SMALLINT",
            ColumnType::Integer => "INTEGER",
            ColumnType::Bigint => "BIGINT",
            ColumnType::Hugeint => "HUGEINT",
            ColumnType::Float => "FLOAT",
            ColumnType::Double => "DOUBLE",
            ColumnType::Date => "DATE",
            ColumnType::Time => "TIME",
            ColumnType::Timestamp => "TIMESTAMP",
            ColumnType::Uuid => "UUID",
            ColumnType::Varchar => "VARCHAR",
            ColumnType::Json => "JSON",
            ColumnType::JsonMap => "JSON_MAP",
            ColumnType::UnknownInt => "UNKNOWN_INT",
            ColumnType::UnknownFloat => "UNKNOWN_FLOAT",
            ColumnType::UnknownString => "UNKNOWN_STRING",
            ColumnType::Unknown => "UNKNOWN",
        }
    }

    /// Inverse of [`as_sql`](Self::as_sql) for catalogue lookups.
    /// Unrecognised spellings map to the `Unknown` sentinel.
    pub fn from_sql(data_type: &str) -> ColumnType {
        match data_type {
            "BIT" => ColumnType::Null,
            "BOOLEAN" => ColumnType::Boolean,
            "UTINYINT" => ColumnType::Utinyint,
            "USMALLINT" => ColumnType::Usmallint,
            "UINTEGER" => ColumnType::Uinteger,
            "UBIGINT" => ColumnType::Ubigint,
            "TINYINT" => ColumnType::Tinyint,
            "SMALLINT" => ColumnType::Smallint,
            "INTEGER" => ColumnType::Integer,
            "BIGINT" => ColumnType::Bigint,
            "HUGEINT" => ColumnType::Hugeint,
            "FLOAT" => ColumnType::Float,
            "DOUBLE" => ColumnType::Double,
            "DATE" => ColumnType::Date,
            "TIME" => ColumnType::Time,
            "TIMESTAMP" => ColumnType::Timestamp,
            "UUID" => ColumnType::Uuid,
            "VARCHAR" => ColumnType::Varchar,
            "JSON" => ColumnType::Json,
            _ => ColumnType::Unknown,
        }
    }

    /// Infers the narrowest column type holding `value`.
    pub fn infer(value: &Value) -> ColumnType {
        match value {
            Value::Null => ColumnType::Null,
            Value::Bool(_) => ColumnType::Boolean,
            Value::Int(v) => Self::from_integer(*v),
            Value::Float(v) => Self::from_float(*v),
            Value::Timestamp(_) => ColumnType::Timestamp,
            Value::Text(v) => Self::from_text(v),
            Value::Json(_) | Value::Array(_) => ColumnType::Json,
            Value::Object(_) => ColumnType::JsonMap,
        }
    }

    fn from_integer(v: i64) -> ColumnType {
        match v {
            0..=255 => ColumnType::Utinyint,
            256..=65_535 => ColumnType::Usmallint,
            65_536..=4_294_967_295 => ColumnType::Uinteger,
            v if v >= 0 => ColumnType::Ubigint,
            -128..=-1 => ColumnType::Tinyint,
            -32_768..=-129 => ColumnType::Smallint,
            -2_147_483_648..=-32_769 => ColumnType::Integer,
            // A lone value cannot distinguish Bigint from Hugeint; the
            // lattice widens later when a Bigint column meets Ubigint.
            _ => ColumnType::Bigint,
        }
    }

    fn from_float(v: f64) -> ColumnType {
        if (-3.4e38..=3.4e38).contains(&v) {
            ColumnType::Float
        } else if (-1.7e308..=1.7e308).contains(&v) {
            ColumnType::Double
        } else {
            // Outside the double range, or NaN. Reaching this is a bug.
            ColumnType::UnknownFloat
        }
    }

    /// Shape-matches text against the supported date/time renderings.
    fn from_text(v: &str) -> ColumnType {
        let b = v.as_bytes();
        match b.len() {
            // 2023-01-01
            10 if b[4] == b'-' && b[7] == b'-' => ColumnType::Date,
            // 12:00:00
            8 if b[2] == b':' && b[5] == b':' => ColumnType::Time,
            // 12:00:00.123 / 12:00:00.123456
            12 | 15 if b[2] == b':' && b[5] == b':' && b[8] == b'.' => ColumnType::Time,
            // 2023-01-01 12:00:00
            19 if b[4] == b'-'
                && b[7] == b'-'
                && b[10] == b' '
                && b[13] == b':'
                && b[16] == b':' =>
            {
                ColumnType::Timestamp
            }
            // 2023-01-01 12:00:00.123 / 2023-01-01 12:00:00.123456
            23 | 26
                if b[4] == b'-'
                    && b[7] == b'-'
                    && b[10] == b' '
                    && b[13] == b':'
                    && b[16] == b':'
                    && b[19] == b'.' =>
            {
                ColumnType::Timestamp
            }
            _ => ColumnType::Varchar,
        }
    }

    /// Resolves the column type after observing a value of type `given` in a
    /// column currently typed `self`.
    ///
    /// The result is not always one of the two inputs: widening a Utinyint
    /// column with a Tinyint value needs Smallint to cover both ranges.
    /// Total over the value-carrying types; sentinel inputs error.
    pub fn promote_to(self, given: ColumnType) -> Result<ColumnType, StoreError> {
        use ColumnType::*;

        let unresolved = || StoreError::PromotionUnresolved { old: self, given };

        let resolved = match self {
            // A null column takes whatever arrives
            Null => given,
            Boolean => match given {
                Null | Boolean => Boolean,
                // false/true widen to 0/1
                Utinyint | Usmallint | Uinteger | Ubigint | Tinyint | Smallint | Integer
                | Bigint | Hugeint | Float | Double => given,
                Date | Time | Timestamp | Uuid | Varchar | Json => Varchar,
                _ => return Err(unresolved()),
            },
            Utinyint => match given {
                Null | Boolean | Utinyint => Utinyint,
                Usmallint | Uinteger | Ubigint | Float | Double => given,
                // 255 & -128
                Tinyint => Smallint,
                // 255 & -32,768
                Smallint => Integer,
                // 255 & -2,147,483,648
                Integer => Bigint,
                // 255 & -9,223,372,036,854,775,808
                Bigint | Hugeint => Hugeint,
                Date | Time | Timestamp | Uuid | Varchar | Json => Varchar,
                _ => return Err(unresolved()),
            },
            Usmallint => match given {
                Null | Boolean | Utinyint | Usmallint => Usmallint,
                Uinteger | Ubigint | Float | Double => given,
                // 65,535 & -128 (or -32,768)
                Tinyint | Smallint => Integer,
                // 65,535 & -2,147,483,648
                Integer => Bigint,
                // 65,535 & -9,223,372,036,854,775,808
                Bigint | Hugeint => Hugeint,
                Date | Time | Timestamp | Uuid | Varchar | Json => Varchar,
                _ => return Err(unresolved()),
            },
            Uinteger => match given {
                Null | Boolean | Utinyint | Usmallint | Uinteger => Uinteger,
                Ubigint => Ubigint,
                // 4,294,967,295 & any negative up to Integer
                Tinyint | Smallint | Integer => Bigint,
                // 4,294,967,295 & -9,223,372,036,854,775,808
                Bigint | Hugeint => Hugeint,
                Float | Double => given,
                Date | Time | Timestamp | Uuid | Varchar | Json => Varchar,
                _ => return Err(unresolved()),
            },
            Ubigint => match given {
                Null | Boolean | Utinyint | Usmallint | Uinteger | Ubigint => Ubigint,
                // 18,446,744,073,709,551,615 & any signed
                Tinyint | Smallint | Integer | Bigint | Hugeint => Hugeint,
                Float | Double => given,
                Date | Time | Timestamp | Uuid | Varchar | Json => Varchar,
                _ => return Err(unresolved()),
            },
            Tinyint => match given {
                Null | Boolean | Tinyint => Tinyint,
                // -128 & 255
                Utinyint => Smallint,
                // -128 & 65,535
                Usmallint => Integer,
                // -128 & 4,294,967,295
                Uinteger => Bigint,
                // -128 & 18,446,744,073,709,551,615
                Ubigint => Hugeint,
                Smallint | Integer | Bigint | Hugeint | Float | Double => given,
                Date | Time | Timestamp | Uuid | Varchar | Json => Varchar,
                _ => return Err(unresolved()),
            },
            Smallint => match given {
                Null | Boolean | Utinyint | Tinyint | Smallint => Smallint,
                // -32,768 & 65,535
                Usmallint => Integer,
                // -32,768 & 4,294,967,295
                Uinteger => Bigint,
                // -32,768 & 18,446,744,073,709,551,615
                Ubigint => Hugeint,
                Integer | Bigint | Hugeint | Float | Double => given,
                Date | Time | Timestamp | Uuid | Varchar | Json => Varchar,
                _ => return Err(unresolved()),
            },
            Integer => match given {
                Null | Boolean | Utinyint | Usmallint | Tinyint | Smallint | Integer => Integer,
                // -2,147,483,648 & 4,294,967,295
                Uinteger => Bigint,
                // -2,147,483,648 & 18,446,744,073,709,551,615
                Ubigint => Hugeint,
                Bigint | Hugeint | Float | Double => given,
                Date | Time | Timestamp | Uuid | Varchar | Json => Varchar,
                _ => return Err(unresolved()),
            },
            Bigint => match given {
                Null | Boolean | Utinyint | Usmallint | Tinyint | Smallint | Integer | Bigint => {
                    Bigint
                }
                // -9,223,372,036,854,775,808 & 4,294,967,295 (or larger)
                Uinteger | Ubigint => Hugeint,
                Hugeint | Float | Double => given,
                Date | Time | Timestamp | Uuid | Varchar | Json => Varchar,
                _ => return Err(unresolved()),
            },
            Hugeint => match given {
                Null | Boolean | Utinyint | Usmallint | Uinteger | Ubigint | Tinyint | Smallint
                | Integer | Bigint | Hugeint => Hugeint,
                // 128-bit integers do not fit a float without loss
                Float | Double | Date | Time | Timestamp | Uuid | Varchar | Json => Varchar,
                _ => return Err(unresolved()),
            },
            Float => match given {
                Null | Boolean | Utinyint | Usmallint | Uinteger | Ubigint | Tinyint | Smallint
                | Integer | Bigint | Float => Float,
                Double => Double,
                Hugeint | Date | Time | Timestamp | Uuid | Varchar | Json => Varchar,
                _ => return Err(unresolved()),
            },
            Double => match given {
                Null | Boolean | Utinyint | Usmallint | Uinteger | Ubigint | Tinyint | Smallint
                | Integer | Bigint | Float | Double => Double,
                Hugeint | Date | Time | Timestamp | Uuid | Varchar | Json => Varchar,
                _ => return Err(unresolved()),
            },
            Date => match given {
                Null | Date => Date,
                Time | Timestamp => Timestamp,
                Boolean | Utinyint | Usmallint | Uinteger | Ubigint | Tinyint | Smallint
                | Integer | Bigint | Hugeint | Float | Double | Uuid | Varchar | Json => Varchar,
                _ => return Err(unresolved()),
            },
            Time => match given {
                Null | Time => Time,
                Date | Timestamp => Timestamp,
                Boolean | Utinyint | Usmallint | Uinteger | Ubigint | Tinyint | Smallint
                | Integer | Bigint | Hugeint | Float | Double | Uuid | Varchar | Json => Varchar,
                _ => return Err(unresolved()),
            },
            Timestamp => match given {
                Null | Date | Time | Timestamp => Timestamp,
                Boolean | Utinyint | Usmallint | Uinteger | Ubigint | Tinyint | Smallint
                | Integer | Bigint | Hugeint | Float | Double | Uuid | Varchar | Json => Varchar,
                _ => return Err(unresolved()),
            },
            Uuid => match given {
                Null | Uuid => Uuid,
                Boolean | Utinyint | Usmallint | Uinteger | Ubigint | Tinyint | Smallint
                | Integer | Bigint | Hugeint | Float | Double | Date | Time | Timestamp
                | Varchar | Json => Varchar,
                _ => return Err(unresolved()),
            },
            Varchar => match given {
                Null | Boolean | Utinyint | Usmallint | Uinteger | Ubigint | Tinyint | Smallint
                | Integer | Bigint | Hugeint | Float | Double | Date | Time | Timestamp | Uuid
                | Varchar | Json => Varchar,
                _ => return Err(unresolved()),
            },
            Json => match given {
                Null | Json => Json,
                Boolean | Utinyint | Usmallint | Uinteger | Ubigint | Tinyint | Smallint
                | Integer | Bigint | Hugeint | Float | Double | Date | Time | Timestamp | Uuid
                | Varchar => Varchar,
                _ => return Err(unresolved()),
            },
            JsonMap | UnknownInt | UnknownFloat | UnknownString | Unknown => {
                return Err(unresolved())
            }
        };
        Ok(resolved)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}
