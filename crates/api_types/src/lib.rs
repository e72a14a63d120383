use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub mod auth {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Register {
        pub email: String,
        pub password: String,
        /// Display name; the API expects an empty string when omitted.
        pub name: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Login {
        pub email: String,
        pub password: String,
    }

    /// Response body of both `/auth/register` and `/auth/login`.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct TokenResponse {
        pub access_token: String,
    }
}

pub mod period {
    use std::{fmt, str::FromStr};

    use chrono::{Datelike, NaiveDate};

    use super::*;

    const MIN_YEAR: i32 = 0;
    const MAX_YEAR: i32 = 9999;

    #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
    #[error("invalid period \"{0}\": expected YYYY-MM")]
    pub struct PeriodParseError(pub String);

    /// A year-month reporting period, serialized as `YYYY-MM`.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct Period {
        year: i32,
        month: u32,
    }

    impl Period {
        pub fn new(year: i32, month: u32) -> Option<Self> {
            if !(1..=12).contains(&month) || !(MIN_YEAR..=MAX_YEAR).contains(&year) {
                return None;
            }
            Some(Self { year, month })
        }

        pub fn from_date(date: NaiveDate) -> Self {
            Self {
                year: date.year(),
                month: date.month(),
            }
        }

        pub fn year(self) -> i32 {
            self.year
        }

        pub fn month(self) -> u32 {
            self.month
        }

        /// Steps back one month; stays put at `0000-01`.
        pub fn prev(self) -> Self {
            if self.month == 1 {
                if self.year <= MIN_YEAR {
                    return self;
                }
                Self {
                    year: self.year - 1,
                    month: 12,
                }
            } else {
                Self {
                    year: self.year,
                    month: self.month - 1,
                }
            }
        }

        /// Steps forward one month; stays put at `9999-12`.
        pub fn next(self) -> Self {
            if self.month == 12 {
                if self.year >= MAX_YEAR {
                    return self;
                }
                Self {
                    year: self.year + 1,
                    month: 1,
                }
            } else {
                Self {
                    year: self.year,
                    month: self.month + 1,
                }
            }
        }

        /// Human label such as `March 2025`.
        pub fn label(self) -> String {
            NaiveDate::from_ymd_opt(self.year, self.month, 1)
                .map(|d| d.format("%B %Y").to_string())
                .unwrap_or_else(|| self.to_string())
        }
    }

    impl fmt::Display for Period {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{:04}-{:02}", self.year, self.month)
        }
    }

    impl FromStr for Period {
        type Err = PeriodParseError;

        fn from_str(s: &str) -> Result<Self, Self::Err> {
            let err = || PeriodParseError(s.to_string());
            let (year, month) = s.trim().split_once('-').ok_or_else(err)?;
            let digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
            if year.len() != 4 || month.len() != 2 || !digits(year) || !digits(month) {
                return Err(err());
            }
            let year = year.parse::<i32>().map_err(|_| err())?;
            let month = month.parse::<u32>().map_err(|_| err())?;
            Self::new(year, month).ok_or_else(err)
        }
    }

    impl Serialize for Period {
        fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            serializer.collect_str(self)
        }
    }

    impl<'de> Deserialize<'de> for Period {
        fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            let raw = String::deserialize(deserializer)?;
            raw.parse().map_err(serde::de::Error::custom)
        }
    }
}

pub mod transaction {
    use std::fmt;

    use super::*;

    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum TransactionKind {
        Income,
        #[default]
        Expense,
    }

    impl TransactionKind {
        pub fn as_str(self) -> &'static str {
            match self {
                Self::Income => "income",
                Self::Expense => "expense",
            }
        }

        pub fn toggle(self) -> Self {
            match self {
                Self::Income => Self::Expense,
                Self::Expense => Self::Income,
            }
        }
    }

    impl fmt::Display for TransactionKind {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.as_str())
        }
    }

    /// A transaction as returned by the API.
    ///
    /// The backing store may serialize the identifier either as `id` or as a
    /// legacy `_id` (plain string or `{"$oid": "..."}`); use
    /// [`Transaction::resolved_id`] instead of reading the raw fields.
    #[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
    pub struct Transaction {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub id: Option<Value>,
        #[serde(default, rename = "_id", skip_serializing_if = "Option::is_none")]
        pub legacy_id: Option<Value>,
        #[serde(default, deserialize_with = "null_as_empty")]
        pub user_id: String,
        #[serde(rename = "type")]
        pub kind: TransactionKind,
        pub amount: f64,
        #[serde(default, deserialize_with = "null_as_empty")]
        pub currency: String,
        #[serde(default, deserialize_with = "null_as_empty")]
        pub category: String,
        #[serde(default)]
        pub description: Option<String>,
        #[serde(default, deserialize_with = "null_as_empty")]
        pub date: String,
        #[serde(default)]
        pub created_at: Option<String>,
        #[serde(default)]
        pub updated_at: Option<String>,
    }

    impl Transaction {
        /// Returns the usable identifier, or an empty string when none of the
        /// known shapes is present.
        pub fn resolved_id(&self) -> String {
            if let Some(id) = self.id.as_ref().and_then(primary_id) {
                return id;
            }
            match &self.legacy_id {
                Some(Value::String(raw)) => raw.clone(),
                Some(Value::Object(map)) => match map.get("$oid") {
                    Some(Value::String(oid)) => oid.clone(),
                    _ => String::new(),
                },
                _ => String::new(),
            }
        }
    }

    /// Stored records may carry explicit nulls for text fields.
    fn null_as_empty<'de, D: serde::Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
    }

    fn primary_id(value: &Value) -> Option<String> {
        match value {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) if n.as_f64().is_some_and(|v| v != 0.0) => Some(n.to_string()),
            Value::Bool(true) => Some("true".to_string()),
            Value::Array(_) | Value::Object(_) => Some(value.to_string()),
            _ => None,
        }
    }

    /// Request body for create and update.
    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct TransactionInput {
        #[serde(rename = "type")]
        pub kind: TransactionKind,
        pub amount: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub currency: Option<String>,
        pub category: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub description: Option<String>,
        /// RFC3339 timestamp.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub date: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoriesResponse {
        pub categories: Vec<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MessageResponse {
        #[serde(default)]
        pub message: String,
    }

    /// Categories offered before (or instead of) the server-provided list.
    pub const FALLBACK_CATEGORIES: [&str; 9] = [
        "Salary",
        "Food",
        "Rent",
        "Freelance",
        "Transport",
        "Entertainment",
        "Utilities",
        "Shopping",
        "Other",
    ];
}

pub mod summary {
    use super::*;

    #[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
    pub struct Summary {
        pub total_income: f64,
        pub total_expense: f64,
        pub balance: f64,
        /// Category name to net signed amount for the period.
        #[serde(default)]
        pub category_breakdown: BTreeMap<String, f64>,
    }
}
