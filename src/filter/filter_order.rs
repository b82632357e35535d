use std::cmp::Ordering;

use serde_json::{Map, Value};

use super::types::{FilterOrderInfo, SortDirection, SqlParam};

pub struct FilterOrder;

impl FilterOrder {
    /// Documents lacking the sort field go last in either direction, and ties
    /// keep insertion order (`seq`).
    pub fn generate(order: Option<&FilterOrderInfo>, params: &mut Vec<SqlParam>) -> String {
        match order {
            Some(info) => {
                params.push(SqlParam::Text(info.field.clone()));
                format!(
                    "ORDER BY doc -> ${}::text {} NULLS LAST, seq ASC",
                    params.len(),
                    info.sort.to_sql()
                )
            }
            None => "ORDER BY seq ASC".to_string(),
        }
    }

    /// Stable in-memory sort with the same semantics as `generate`.
    pub fn sort(docs: &mut [Map<String, Value>], info: &FilterOrderInfo) {
        docs.sort_by(|a, b| match (a.get(&info.field), b.get(&info.field)) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(x), Some(y)) => match info.sort {
                SortDirection::Asc => compare_values(x, y),
                SortDirection::Desc => compare_values(y, x),
            },
        });
    }
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::String(_) => 1,
        Value::Number(_) => 2,
        Value::Bool(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

/// Total order over JSON values using the JSONB type ranks:
/// object > array > boolean > number > string > null. Containers compare by
/// length first, then element-wise. Strings compare bytewise, so results
/// differ from a Postgres database running a locale collation.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Array(x), Value::Array(y)) => x.len().cmp(&y.len()).then_with(|| {
            x.iter()
                .zip(y)
                .map(|(l, r)| compare_values(l, r))
                .find(|o| *o != Ordering::Equal)
                .unwrap_or(Ordering::Equal)
        }),
        (Value::Object(x), Value::Object(y)) => x.len().cmp(&y.len()).then_with(|| {
            let mut xs: Vec<_> = x.iter().collect();
            let mut ys: Vec<_> = y.iter().collect();
            xs.sort_by(|l, r| l.0.cmp(r.0));
            ys.sort_by(|l, r| l.0.cmp(r.0));
            xs.iter()
                .zip(ys.iter())
                .map(|((lk, lv), (rk, rv))| lk.cmp(rk).then_with(|| compare_values(lv, rv)))
                .find(|o| *o != Ordering::Equal)
                .unwrap_or(Ordering::Equal)
        }),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}
