//! Rich-query engine of the in-memory world state
//!
//! Interprets a CouchDB-style query document:
//!
//! ```text
//! {"selector": {"key": "dev-1", "index": "Subkey", "timestamp": {"$gt": 10}}, "limit": 5}
//! ```
//!
//! Supported: implicit equality, dotted field paths, `$eq $ne $gt $gte $lt
//! $lte $in $nin $exists`, and the combinators `$and` / `$or`. Documents that
//! are not JSON never match.

use std::cmp::Ordering;

use serde_json::{Map, Value};

use crate::error::{CoreError, Result};

#[derive(Debug, Clone, PartialEq)]
enum Condition {
    Eq(Value),
    Ne(Value),
    Gt(Value),
    Gte(Value),
    Lt(Value),
    Lte(Value),
    In(Vec<Value>),
    Nin(Vec<Value>),
    Exists(bool),
}

#[derive(Debug, Clone, PartialEq)]
enum Selector {
    And(Vec<Selector>),
    Or(Vec<Selector>),
    Field(Vec<String>, Condition),
}

/// A parsed rich query
#[derive(Debug, Clone, PartialEq)]
pub struct RichQuery {
    selector: Selector,
    limit: Option<usize>,
}

fn invalid(msg: impl Into<String>) -> CoreError {
    CoreError::InvalidArgument(msg.into())
}

impl RichQuery {
    /// Parse a query string
    pub fn parse(query: &str) -> Result<Self> {
        let document: Value = serde_json::from_str(query)
            .map_err(|e| invalid(format!("query is not valid JSON: {}", e)))?;

        let selector = document
            .get("selector")
            .ok_or_else(|| invalid("query must contain a selector"))?;
        let selector = parse_selector(selector)?;

        let limit = match document.get("limit") {
            None => None,
            Some(limit) => Some(
                limit
                    .as_u64()
                    .ok_or_else(|| invalid("limit must be a non-negative integer"))?
                    as usize,
            ),
        };

        Ok(RichQuery { selector, limit })
    }

    /// Maximum number of results requested by the query itself
    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// Whether a stored payload satisfies the selector
    pub fn matches_payload(&self, payload: &[u8]) -> bool {
        match serde_json::from_slice::<Value>(payload) {
            Ok(document) => self.matches(&document),
            Err(_) => false,
        }
    }

    /// Whether a JSON document satisfies the selector
    pub fn matches(&self, document: &Value) -> bool {
        evaluate(&self.selector, document)
    }
}

fn parse_selector(value: &Value) -> Result<Selector> {
    let object = value
        .as_object()
        .ok_or_else(|| invalid("selector must be a JSON object"))?;

    let mut clauses = Vec::with_capacity(object.len());
    for (name, operand) in object {
        match name.as_str() {
            "$and" => clauses.push(Selector::And(parse_selector_list(name, operand)?)),
            "$or" => clauses.push(Selector::Or(parse_selector_list(name, operand)?)),
            op if op.starts_with('$') => return Err(invalid(format!("unsupported combinator {}", op))),
            field => {
                let path: Vec<String> = field.split('.').map(str::to_string).collect();
                for condition in parse_conditions(operand)? {
                    clauses.push(Selector::Field(path.clone(), condition));
                }
            }
        }
    }

    Ok(match clauses.len() {
        1 => clauses.remove(0),
        _ => Selector::And(clauses),
    })
}

fn parse_selector_list(name: &str, operand: &Value) -> Result<Vec<Selector>> {
    operand
        .as_array()
        .ok_or_else(|| invalid(format!("{} expects an array of selectors", name)))?
        .iter()
        .map(parse_selector)
        .collect()
}

fn is_operator_object(object: &Map<String, Value>) -> bool {
    !object.is_empty() && object.keys().all(|k| k.starts_with('$'))
}

fn parse_conditions(operand: &Value) -> Result<Vec<Condition>> {
    let object = match operand {
        Value::Object(object) if is_operator_object(object) => object,
        literal => return Ok(vec![Condition::Eq(literal.clone())]),
    };

    object
        .iter()
        .map(|(op, arg)| {
            Ok(match op.as_str() {
                "$eq" => Condition::Eq(arg.clone()),
                "$ne" => Condition::Ne(arg.clone()),
                "$gt" => Condition::Gt(arg.clone()),
                "$gte" => Condition::Gte(arg.clone()),
                "$lt" => Condition::Lt(arg.clone()),
                "$lte" => Condition::Lte(arg.clone()),
                "$in" => Condition::In(operand_array(op, arg)?),
                "$nin" => Condition::Nin(operand_array(op, arg)?),
                "$exists" => Condition::Exists(
                    arg.as_bool().ok_or_else(|| invalid("$exists expects a boolean"))?,
                ),
                other => return Err(invalid(format!("unsupported operator {}", other))),
            })
        })
        .collect()
}

fn operand_array(op: &str, arg: &Value) -> Result<Vec<Value>> {
    arg.as_array()
        .cloned()
        .ok_or_else(|| invalid(format!("{} expects an array", op)))
}

fn lookup<'a>(document: &'a Value, path: &[String]) -> Option<&'a Value> {
    path.iter().try_fold(document, |current, segment| current.get(segment))
}

fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        _ => None,
    }
}

fn equals(left: &Value, right: &Value) -> bool {
    match compare(left, right) {
        Some(ordering) => ordering == Ordering::Equal,
        None => left == right,
    }
}

fn holds(condition: &Condition, field: Option<&Value>) -> bool {
    let ordered = |operand: &Value, accept: fn(Ordering) -> bool| {
        field
            .and_then(|value| compare(value, operand))
            .map(accept)
            .unwrap_or(false)
    };

    match condition {
        Condition::Exists(expected) => field.is_some() == *expected,
        Condition::Eq(operand) => field.map(|v| equals(v, operand)).unwrap_or(false),
        Condition::Ne(operand) => field.map(|v| !equals(v, operand)).unwrap_or(false),
        Condition::Gt(operand) => ordered(operand, |o| o == Ordering::Greater),
        Condition::Gte(operand) => ordered(operand, |o| o != Ordering::Less),
        Condition::Lt(operand) => ordered(operand, |o| o == Ordering::Less),
        Condition::Lte(operand) => ordered(operand, |o| o != Ordering::Greater),
        Condition::In(options) => field
            .map(|v| options.iter().any(|option| equals(v, option)))
            .unwrap_or(false),
        Condition::Nin(options) => field
            .map(|v| !options.iter().any(|option| equals(v, option)))
            .unwrap_or(false),
    }
}

fn evaluate(selector: &Selector, document: &Value) -> bool {
    match selector {
        Selector::And(clauses) => clauses.iter().all(|c| evaluate(c, document)),
        Selector::Or(clauses) => clauses.iter().any(|c| evaluate(c, document)),
        Selector::Field(path, condition) => holds(condition, lookup(document, path)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn datum() -> Value {
        json!({
            "key": "dev-1",
            "subKey": "a",
            "index": "Subkey",
            "dataType": "ecg",
            "timestamp": 1500,
            "meta": {"site": "north"}
        })
    }

    #[rstest]
    #[case::implicit_eq(r#"{"selector":{"key":"dev-1"}}"#, true)]
    #[case::two_fields(r#"{"selector":{"key":"dev-1","dataType":"ecg"}}"#, true)]
    #[case::mismatch(r#"{"selector":{"key":"dev-1","dataType":"xray"}}"#, false)]
    #[case::nested_path(r#"{"selector":{"meta.site":"north"}}"#, true)]
    #[case::gt(r#"{"selector":{"timestamp":{"$gt":1000}}}"#, true)]
    #[case::range(r#"{"selector":{"timestamp":{"$gte":1500,"$lt":1500}}}"#, false)]
    #[case::in_list(r#"{"selector":{"subKey":{"$in":["a","b"]}}}"#, true)]
    #[case::nin_list(r#"{"selector":{"subKey":{"$nin":["a","b"]}}}"#, false)]
    #[case::ne_missing_field(r#"{"selector":{"owner":{"$ne":"x"}}}"#, false)]
    #[case::exists_false(r#"{"selector":{"owner":{"$exists":false}}}"#, true)]
    #[case::or(r#"{"selector":{"$or":[{"key":"dev-2"},{"subKey":"a"}]}}"#, true)]
    #[case::and(r#"{"selector":{"$and":[{"key":"dev-1"},{"subKey":"b"}]}}"#, false)]
    #[case::type_mismatch(r#"{"selector":{"timestamp":{"$gt":"1000"}}}"#, false)]
    fn test_selector_matching(#[case] query: &str, #[case] expected: bool) {
        let query = RichQuery::parse(query).unwrap();
        assert_eq!(query.matches(&datum()), expected);
    }

    #[rstest]
    #[case::not_json("selector")]
    #[case::missing_selector(r#"{"limit":3}"#)]
    #[case::selector_not_object(r#"{"selector":[1]}"#)]
    #[case::unknown_operator(r#"{"selector":{"key":{"$regex":"^dev"}}}"#)]
    #[case::bad_limit(r#"{"selector":{},"limit":-1}"#)]
    fn test_rejects_malformed_queries(#[case] query: &str) {
        assert!(matches!(RichQuery::parse(query), Err(CoreError::InvalidArgument(_))));
    }

    #[test]
    fn test_limit_and_non_json_payloads() {
        let query = RichQuery::parse(r#"{"selector":{},"limit":2}"#).unwrap();
        assert_eq!(query.limit(), Some(2));
        assert!(query.matches_payload(br#"{"any":"doc"}"#));
        assert!(!query.matches_payload(b"raw bytes"));
    }
}
