use serde_json::{Map, Value};

use super::types::{FilterWhereInfo, SqlParam};

pub struct FilterWhere;

impl FilterWhere {
    /// Render equality conditions against the `doc` JSONB column. Each
    /// condition pushes two params: the field name and the expected value.
    pub fn generate(conditions: &[FilterWhereInfo], params: &mut Vec<SqlParam>) -> String {
        let mut parts = Vec::with_capacity(conditions.len());
        for condition in conditions {
            params.push(SqlParam::Text(condition.field.clone()));
            let field_index = params.len();
            params.push(SqlParam::Json(condition.data.clone()));
            let value_index = params.len();
            parts.push(format!("doc -> ${}::text = ${}::jsonb", field_index, value_index));
        }
        if parts.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", parts.join(" AND "))
        }
    }

    /// A missing field never equals anything, including JSON null.
    pub fn matches(conditions: &[FilterWhereInfo], doc: &Map<String, Value>) -> bool {
        conditions
            .iter()
            .all(|c| doc.get(&c.field).map_or(false, |v| *v == c.data))
    }
}
