//! Book domain model.
//!
//! # Responsibility
//! - Define the insert payload (`NewBook`) and stored row (`Book`) shapes.
//! - Define `Money`, the two-decimal fixed-point value used by price columns.
//!
//! # Invariants
//! - `BookId` is assigned by the store and never changes for a row.
//! - `title` is the only required field besides `id`.
//! - Numeric fields carry no range constraints; the schema declares none.

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, Value, ValueRef};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Store-generated identity of a `Books` row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookId(pub i64);

impl BookId {
    pub fn get(self) -> i64 {
        self.0
    }
}

impl Display for BookId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl ToSql for BookId {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::Owned(Value::Integer(self.0)))
    }
}

impl FromSql for BookId {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        i64::column_result(value).map(Self)
    }
}

/// Two-decimal fixed-point money value, held as minor units (hundredths).
///
/// Price columns are stored as REAL, which is exact only up to
/// `MAX_STORED_MINOR_UNITS` in magnitude; binding a larger amount fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Self = Self(0);

    /// Largest magnitude a REAL column holds without losing a cent (2^53).
    pub const MAX_STORED_MINOR_UNITS: i64 = 1 << 53;

    pub const fn from_minor_units(minor_units: i64) -> Self {
        Self(minor_units)
    }

    pub const fn minor_units(self) -> i64 {
        self.0
    }

    /// Converts a floating-point amount, rounding to the nearest hundredth.
    ///
    /// Returns `None` for NaN, infinities and values outside the `i64` range.
    pub fn from_f64(amount: f64) -> Option<Self> {
        if !amount.is_finite() {
            return None;
        }
        let minor = (amount * 100.0).round();
        if minor < i64::MIN as f64 || minor > i64::MAX as f64 {
            return None;
        }
        Some(Self(minor as i64))
    }

    pub fn to_f64(self) -> f64 {
        self.0 as f64 / 100.0
    }
}

impl Display for Money {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

/// Error returned when text cannot be read as a two-decimal amount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseMoneyError {
    Empty,
    Invalid(String),
    /// More than two digits after the decimal point.
    TooPrecise(String),
    OutOfRange(String),
}

impl Display for ParseMoneyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "money amount is empty"),
            Self::Invalid(value) => write!(f, "invalid money amount `{value}`"),
            Self::TooPrecise(value) => {
                write!(f, "money amount `{value}` has more than two decimals")
            }
            Self::OutOfRange(value) => write!(f, "money amount `{value}` is out of range"),
        }
    }
}

impl Error for ParseMoneyError {}

impl FromStr for Money {
    type Err = ParseMoneyError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ParseMoneyError::Empty);
        }

        let (negative, digits) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        };
        let (whole, fraction) = digits.split_once('.').unwrap_or((digits, ""));

        let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if (whole.is_empty() && fraction.is_empty()) || !all_digits(whole) || !all_digits(fraction)
        {
            return Err(ParseMoneyError::Invalid(trimmed.to_string()));
        }
        if fraction.len() > 2 {
            return Err(ParseMoneyError::TooPrecise(trimmed.to_string()));
        }

        let out_of_range = || ParseMoneyError::OutOfRange(trimmed.to_string());
        let whole_value: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| out_of_range())?
        };
        let fraction_value: i64 = match fraction.len() {
            0 => 0,
            1 => i64::from(fraction.as_bytes()[0] - b'0') * 10,
            _ => fraction.parse().map_err(|_| out_of_range())?,
        };

        let minor = whole_value
            .checked_mul(100)
            .and_then(|value| value.checked_add(fraction_value))
            .ok_or_else(out_of_range)?;
        Ok(Self(if negative { -minor } else { minor }))
    }
}

impl ToSql for Money {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        if self.0.unsigned_abs() > Self::MAX_STORED_MINOR_UNITS.unsigned_abs() {
            return Err(rusqlite::Error::ToSqlConversionFailure(Box::new(
                ParseMoneyError::OutOfRange(self.to_string()),
            )));
        }
        Ok(ToSqlOutput::Owned(Value::Real(self.to_f64())))
    }
}

impl FromSql for Money {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value {
            ValueRef::Integer(whole) => whole
                .checked_mul(100)
                .map(Self)
                .ok_or(FromSqlError::OutOfRange(whole)),
            ValueRef::Real(amount) => Self::from_f64(amount).ok_or(FromSqlError::InvalidType),
            ValueRef::Text(bytes) => std::str::from_utf8(bytes)
                .map_err(|err| FromSqlError::Other(Box::new(err)))?
                .parse()
                .map_err(|err: ParseMoneyError| FromSqlError::Other(Box::new(err))),
            ValueRef::Null | ValueRef::Blob(_) => Err(FromSqlError::InvalidType),
        }
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Text(String),
            Integer(i64),
            Float(f64),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Text(text) => text.parse().map_err(serde::de::Error::custom),
            Repr::Integer(whole) => whole
                .checked_mul(100)
                .map(Self)
                .ok_or_else(|| serde::de::Error::custom("money amount is out of range")),
            Repr::Float(amount) => Self::from_f64(amount)
                .ok_or_else(|| serde::de::Error::custom("money amount is not finite")),
        }
    }
}

/// Insert payload for one `Books` row.
///
/// Every optional field left as `None` is stored as NULL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NewBook {
    pub title: String,
    #[serde(default)]
    pub price: Option<Money>,
    /// Star rating as published; nothing enforces a 0-5 range.
    #[serde(default)]
    pub rating: Option<i64>,
    /// Units in stock.
    #[serde(default)]
    pub availability: Option<i64>,
    /// Not unique: two rows may share a UPC.
    #[serde(default, rename = "UPC")]
    pub upc: Option<String>,
    #[serde(default)]
    pub product_type: Option<String>,
    #[serde(default)]
    pub price_excl_tax: Option<Money>,
    #[serde(default)]
    pub price_incl_tax: Option<Money>,
    #[serde(default)]
    pub tax: Option<Money>,
    #[serde(default)]
    pub num_reviews: Option<i64>,
    #[serde(default)]
    pub description: Option<String>,
}

impl NewBook {
    /// Creates a payload with only the required title set.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            price: None,
            rating: None,
            availability: None,
            upc: None,
            product_type: None,
            price_excl_tax: None,
            price_incl_tax: None,
            tax: None,
            num_reviews: None,
            description: None,
        }
    }
}

/// One stored `Books` row, all 12 columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub price: Option<Money>,
    pub rating: Option<i64>,
    pub availability: Option<i64>,
    #[serde(rename = "UPC")]
    pub upc: Option<String>,
    pub product_type: Option<String>,
    pub price_excl_tax: Option<Money>,
    pub price_incl_tax: Option<Money>,
    pub tax: Option<Money>,
    pub num_reviews: Option<i64>,
    pub description: Option<String>,
}

impl Book {
    /// Builds the row a store would return for `book` inserted under `id`.
    pub fn with_id(id: BookId, book: NewBook) -> Self {
        Self {
            id,
            title: book.title,
            price: book.price,
            rating: book.rating,
            availability: book.availability,
            upc: book.upc,
            product_type: book.product_type,
            price_excl_tax: book.price_excl_tax,
            price_incl_tax: book.price_incl_tax,
            tax: book.tax,
            num_reviews: book.num_reviews,
            description: book.description,
        }
    }
}
