//! Filter and limit descriptions for user queries

use std::str::FromStr;

use common::Query;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

/// Filter parsing errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
    #[error("Invalid condition on filter: {0}, should be one of eq, lte, gte")]
    InvalidFilterComparator(String),
}

/// Comparison applied between a field and a filter value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Comparator {
    Eq,
    Lte,
    Gte,
}

impl FromStr for Comparator {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "eq" => Ok(Comparator::Eq),
            "lte" => Ok(Comparator::Lte),
            "gte" => Ok(Comparator::Gte),
            other => Err(FilterError::InvalidFilterComparator(other.to_string())),
        }
    }
}

/// Single field condition
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub value: Value,
    pub comparator: Comparator,
}

impl Filter {
    pub fn new(field: impl Into<String>, value: impl Into<Value>, comparator: Comparator) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
            comparator,
        }
    }

    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, value, Comparator::Eq)
    }

    pub fn lte(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, value, Comparator::Lte)
    }

    pub fn gte(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, value, Comparator::Gte)
    }

    /// Match records where `field` is not set
    pub fn unset(field: impl Into<String>) -> Self {
        Self::eq(field, Value::Null)
    }

    pub fn parse(
        field: impl Into<String>,
        value: impl Into<Value>,
        comparator: &str,
    ) -> Result<Self, FilterError> {
        Ok(Self::new(field, value, comparator.parse()?))
    }

    /// Parse `(field, value, comparator)` triples, skipping any with an
    /// unknown comparator.
    pub fn parse_all<I, F, S>(raw: I) -> Vec<Filter>
    where
        I: IntoIterator<Item = (F, Value, S)>,
        F: Into<String>,
        S: AsRef<str>,
    {
        raw.into_iter()
            .filter_map(|(field, value, comparator)| {
                match Filter::parse(field, value, comparator.as_ref()) {
                    Ok(filter) => Some(filter),
                    Err(e) => {
                        warn!("{}", e);
                        None
                    }
                }
            })
            .collect()
    }

    pub fn to_query(&self) -> Query {
        let query = Query::order_by(self.field.clone());
        match self.comparator {
            Comparator::Eq => query.equal_to(self.value.clone()),
            Comparator::Lte => query.end_at(self.value.clone()),
            Comparator::Gte => query.start_at(self.value.clone()),
        }
    }
}

/// Sort direction used when limiting results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Order {
    #[default]
    Asc,
    Desc,
}

/// Keep the first (ascending) or last (descending) `count` users ordered by a field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Limit {
    pub count: u32,
    pub order: Order,
    pub by: String,
}

impl Limit {
    /// First `count` users by `user_id`
    pub fn new(count: u32) -> Self {
        Self {
            count,
            order: Order::Asc,
            by: "user_id".to_string(),
        }
    }

    pub fn order(mut self, order: Order) -> Self {
        self.order = order;
        self
    }

    pub fn by(mut self, field: impl Into<String>) -> Self {
        self.by = field.into();
        self
    }

    pub fn to_query(&self) -> Query {
        let query = Query::order_by(self.by.clone());
        match self.order {
            Order::Asc => query.limit_to_first(self.count),
            Order::Desc => query.limit_to_last(self.count),
        }
    }
}
