//! Ordered queries over a keyed record collection
//!
//! A [`Query`] mirrors the Realtime Database query model: order the collection
//! by one child field, optionally constrain it with `equal_to`, `start_at` or
//! `end_at`, and optionally keep only the first or last N matches. The same
//! rules are used to evaluate a query in memory and to sort results returned
//! by the REST API, which does not guarantee any order in its response body.

use std::cmp::Ordering;

use serde_json::Value;

use crate::store::Record;

/// Value the upstream store uses for an optional field that is not set.
pub const SENTINEL: &str = "null";

/// Keep the first or last N records of an ordered result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitTo {
    First(u32),
    Last(u32),
}

/// Query against a record collection
///
/// Constraints only take effect when an order-by field is set; a query with
/// no order-by field is a full scan ordered by key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    order_by: Option<String>,
    equal_to: Option<Value>,
    start_at: Option<Value>,
    end_at: Option<Value>,
    limit: Option<LimitTo>,
}

impl Query {
    /// Query returning the whole collection
    pub fn all() -> Self {
        Self::default()
    }

    /// Query ordered by a child field
    pub fn order_by(field: impl Into<String>) -> Self {
        Self {
            order_by: Some(field.into()),
            ..Self::default()
        }
    }

    /// Keep records whose field equals `value`.
    ///
    /// `Value::Null` matches records where the field is unset.
    pub fn equal_to(mut self, value: impl Into<Value>) -> Self {
        self.equal_to = Some(value.into());
        self
    }

    /// Keep records whose field is unset
    pub fn is_unset(self) -> Self {
        self.equal_to(Value::Null)
    }

    /// Keep records whose field is `>= value`
    pub fn start_at(mut self, value: impl Into<Value>) -> Self {
        self.start_at = Some(value.into());
        self
    }

    /// Keep records whose field is `<= value`
    pub fn end_at(mut self, value: impl Into<Value>) -> Self {
        self.end_at = Some(value.into());
        self
    }

    pub fn limit_to_first(mut self, count: u32) -> Self {
        self.limit = Some(LimitTo::First(count));
        self
    }

    pub fn limit_to_last(mut self, count: u32) -> Self {
        self.limit = Some(LimitTo::Last(count));
        self
    }

    /// Query sent to the REST API.
    ///
    /// The server only matches the literal sentinel for `equalTo`, missing
    /// children never equal it. An unset query without a range or limit is
    /// widened to every value ordered at or before the sentinel (missing
    /// children sort first) and narrowed again with [`Query::evaluate`].
    pub fn to_remote(&self) -> Query {
        match (&self.equal_to, &self.start_at, &self.end_at, self.limit) {
            (Some(Value::Null), None, None, None) => Query {
                order_by: self.order_by.clone(),
                end_at: Some(Value::String(SENTINEL.to_string())),
                ..Query::default()
            },
            _ => self.clone(),
        }
    }

    /// Encode the query as REST query parameters.
    ///
    /// Values are JSON encoded as the REST API expects; an unset constraint
    /// value is sent as the sentinel string.
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let Some(field) = &self.order_by else {
            return Vec::new();
        };

        let mut params = vec![("orderBy", Value::String(field.clone()).to_string())];
        if let Some(value) = &self.equal_to {
            params.push(("equalTo", encode(value)));
        }
        if let Some(value) = &self.start_at {
            params.push(("startAt", encode(value)));
        }
        if let Some(value) = &self.end_at {
            params.push(("endAt", encode(value)));
        }
        match self.limit {
            Some(LimitTo::First(count)) => params.push(("limitToFirst", count.to_string())),
            Some(LimitTo::Last(count)) => params.push(("limitToLast", count.to_string())),
            None => {}
        }
        params
    }

    /// Check a record against the equality and range constraints
    pub fn matches(&self, record: &Record) -> bool {
        let Some(field) = &self.order_by else {
            return true;
        };
        let value = child(record, field);

        if let Some(expected) = &self.equal_to {
            if compare_values(value, normalize(expected)) != Ordering::Equal {
                return false;
            }
        }
        if let Some(lower) = &self.start_at {
            if compare_values(value, normalize(lower)) == Ordering::Less {
                return false;
            }
        }
        if let Some(upper) = &self.end_at {
            if compare_values(value, normalize(upper)) == Ordering::Greater {
                return false;
            }
        }
        true
    }

    /// Sort entries by the ordered field, ties and full scans by key
    pub fn sort(&self, entries: &mut [(String, Record)]) {
        match &self.order_by {
            Some(field) => entries.sort_by(|(a_key, a), (b_key, b)| {
                compare_values(child(a, field), child(b, field))
                    .then_with(|| compare_keys(a_key, b_key))
            }),
            None => entries.sort_by(|(a, _), (b, _)| compare_keys(a, b)),
        }
    }

    /// Apply the limit to an already filtered and sorted list
    pub fn truncate(&self, entries: &mut Vec<(String, Record)>) {
        if self.order_by.is_none() {
            return;
        }
        match self.limit {
            Some(LimitTo::First(count)) => entries.truncate(count as usize),
            Some(LimitTo::Last(count)) => {
                let skip = entries.len().saturating_sub(count as usize);
                entries.drain(..skip);
            }
            None => {}
        }
    }

    /// Evaluate the query against an in-memory collection
    pub fn evaluate(&self, entries: Vec<(String, Record)>) -> Vec<(String, Record)> {
        let mut selected: Vec<_> = entries
            .into_iter()
            .filter(|(_, record)| self.matches(record))
            .collect();
        self.sort(&mut selected);
        self.truncate(&mut selected);
        selected
    }
}

fn encode(value: &Value) -> String {
    match value {
        Value::Null => Value::String(SENTINEL.to_string()).to_string(),
        other => other.to_string(),
    }
}

/// Treat a missing field, JSON null and the sentinel string alike
fn normalize(value: &Value) -> Option<&Value> {
    match value {
        Value::Null => None,
        Value::String(s) if s == SENTINEL => None,
        other => Some(other),
    }
}

fn child<'a>(record: &'a Record, field: &str) -> Option<&'a Value> {
    record.get(field).and_then(normalize)
}

fn rank(value: Option<&Value>) -> u8 {
    match value {
        None | Some(Value::Null) => 0,
        Some(Value::Bool(false)) => 1,
        Some(Value::Bool(true)) => 2,
        Some(Value::Number(_)) => 3,
        Some(Value::String(_)) => 4,
        Some(Value::Array(_)) | Some(Value::Object(_)) => 5,
    }
}

/// Order two child values: unset, false, true, numbers, strings, objects.
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    rank(a).cmp(&rank(b)).then_with(|| match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        _ => Ordering::Equal,
    })
}

/// Integer-looking keys sort numerically before all other keys.
pub fn compare_keys(a: &str, b: &str) -> Ordering {
    match (a.parse::<i64>(), b.parse::<i64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(key: &str, value: Value) -> (String, Record) {
        match value {
            Value::Object(map) => (key.to_string(), map),
            _ => panic!("test records must be objects"),
        }
    }

    fn keys(entries: &[(String, Record)]) -> Vec<&str> {
        entries.iter().map(|(key, _)| key.as_str()).collect()
    }

    fn collection() -> Vec<(String, Record)> {
        vec![
            entry("c", json!({"followers": 30, "twitter": "null"})),
            entry("a", json!({"followers": 10, "twitter": "bob"})),
            entry("b", json!({"followers": 20})),
            entry("d", json!({"followers": 20, "twitter": null})),
        ]
    }

    #[test]
    fn test_full_scan_orders_by_key() {
        let result = Query::all().evaluate(collection());
        assert_eq!(keys(&result), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_order_by_breaks_ties_by_key() {
        let result = Query::order_by("followers").evaluate(collection());
        assert_eq!(keys(&result), vec!["a", "b", "d", "c"]);
    }

    #[test]
    fn test_unset_matches_sentinel_null_and_missing() {
        let result = Query::order_by("twitter").is_unset().evaluate(collection());
        assert_eq!(keys(&result), vec!["b", "c", "d"]);
    }

    #[test]
    fn test_range_bounds_are_inclusive() {
        let upper = Query::order_by("followers")
            .end_at(20)
            .evaluate(collection());
        assert_eq!(keys(&upper), vec!["a", "b", "d"]);

        let lower = Query::order_by("followers")
            .start_at(20)
            .evaluate(collection());
        assert_eq!(keys(&lower), vec!["b", "d", "c"]);
    }

    #[test]
    fn test_limits_apply_after_sorting() {
        let first = Query::order_by("followers")
            .limit_to_first(2)
            .evaluate(collection());
        assert_eq!(keys(&first), vec!["a", "b"]);

        let last = Query::order_by("followers")
            .limit_to_last(2)
            .evaluate(collection());
        assert_eq!(keys(&last), vec!["d", "c"]);
    }

    #[test]
    fn test_strings_sort_after_numbers() {
        let entries = vec![
            entry("x", json!({"v": "10"})),
            entry("y", json!({"v": 99})),
            entry("z", json!({"v": true})),
        ];
        let result = Query::order_by("v").evaluate(entries);
        assert_eq!(keys(&result), vec!["z", "y", "x"]);
    }

    #[test]
    fn test_timestamp_strings_compare_lexicographically() {
        let entries = vec![
            entry("1", json!({"time_created": "2021-03-04T10:11:12.000000+00:00"})),
            entry("2", json!({"time_created": "2020-01-01T00:00:00.000000+00:00"})),
        ];
        let result = Query::order_by("time_created")
            .end_at("2020-06-01T00:00:00+00:00")
            .evaluate(entries);
        assert_eq!(keys(&result), vec!["2"]);
    }

    #[test]
    fn test_integer_keys_sort_numerically() {
        let mut keys = vec!["10", "b", "2", "a"];
        keys.sort_by(|a, b| compare_keys(a, b));
        assert_eq!(keys, vec!["2", "10", "a", "b"]);
    }

    #[test]
    fn test_params_are_json_encoded() {
        let params = Query::order_by("instagram").is_unset().to_params();
        assert_eq!(
            params,
            vec![
                ("orderBy", "\"instagram\"".to_string()),
                ("equalTo", "\"null\"".to_string()),
            ]
        );

        let params = Query::order_by("num_followers")
            .limit_to_last(5)
            .to_params();
        assert_eq!(
            params,
            vec![
                ("orderBy", "\"num_followers\"".to_string()),
                ("limitToLast", "5".to_string()),
            ]
        );

        let params = Query::order_by("user_id").equal_to(42).to_params();
        assert_eq!(params[1], ("equalTo", "42".to_string()));
    }

    #[test]
    fn test_full_scan_has_no_params() {
        assert!(Query::all().to_params().is_empty());
        assert_eq!(Query::all().to_remote(), Query::all());
    }

    #[test]
    fn test_remote_unset_query_covers_missing_fields() {
        let query = Query::order_by("twitter").is_unset();
        let remote = query.to_remote();
        assert_eq!(
            remote.to_params(),
            vec![
                ("orderBy", "\"twitter\"".to_string()),
                ("endAt", "\"null\"".to_string()),
            ]
        );

        // what the server returns for the widened query, narrowed locally
        let mut entries = collection();
        entries.push(entry("e", json!({"followers": 5, "twitter": "zed"})));
        entries.push(entry("f", json!({"followers": 5, "twitter": 12})));
        let served = remote.evaluate(entries);
        assert_eq!(keys(&served), vec!["b", "c", "d", "f", "a"]);

        let result = query.evaluate(served);
        assert_eq!(keys(&result), vec!["b", "c", "d"]);
    }

    #[test]
    fn test_remote_keeps_other_queries() {
        let limited = Query::order_by("twitter").is_unset().limit_to_first(1);
        assert_eq!(limited.to_remote(), limited);

        let handle = Query::order_by("twitter").equal_to("bob");
        assert_eq!(handle.to_remote(), handle);
    }
}
