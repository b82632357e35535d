use serde_json::{Map, Value};

use super::error::FilterError;
use super::filter_order::FilterOrder;
use super::filter_where::FilterWhere;
use super::types::{FilterOrderInfo, FilterWhereInfo, SortDirection, SqlParam, SqlResult};

/// Query description shared by every store backend: equality conditions,
/// an optional sort and an optional limit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<FilterWhereInfo>,
    order: Option<FilterOrderInfo>,
    limit: Option<i64>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `field` to equal `value`. A second condition on the same field
    /// replaces the first.
    pub fn where_eq(&mut self, field: &str, value: impl Into<Value>) -> Result<&mut Self, FilterError> {
        Self::validate_field(field)?;
        let data = value.into();
        match self.conditions.iter_mut().find(|c| c.field == field) {
            Some(existing) => existing.data = data,
            None => self.conditions.push(FilterWhereInfo { field: field.to_string(), data }),
        }
        Ok(self)
    }

    /// Like `where_eq`, but only when a value was supplied. Empty strings
    /// count as absent, matching how an empty query parameter behaves.
    pub fn where_eq_optional(&mut self, field: &str, value: Option<&str>) -> Result<&mut Self, FilterError> {
        match value {
            Some(v) if !v.is_empty() => self.where_eq(field, v),
            _ => {
                Self::validate_field(field)?;
                Ok(self)
            }
        }
    }

    pub fn order(&mut self, field: &str, sort: SortDirection) -> Result<&mut Self, FilterError> {
        Self::validate_field(field)?;
        self.order = Some(FilterOrderInfo { field: field.to_string(), sort });
        Ok(self)
    }

    pub fn limit(&mut self, limit: i64) -> Result<&mut Self, FilterError> {
        if limit < 0 {
            return Err(FilterError::InvalidLimit("Limit must be non-negative".to_string()));
        }
        self.limit = Some(limit);
        Ok(self)
    }

    pub fn conditions(&self) -> &[FilterWhereInfo] {
        &self.conditions
    }

    pub fn matches(&self, doc: &Map<String, Value>) -> bool {
        FilterWhere::matches(&self.conditions, doc)
    }

    /// Apply the filter to in-memory documents: match, sort, then truncate.
    pub fn apply(&self, docs: impl IntoIterator<Item = Map<String, Value>>) -> Vec<Map<String, Value>> {
        let mut out: Vec<_> = docs.into_iter().filter(|d| self.matches(d)).collect();
        if let Some(ref order) = self.order {
            FilterOrder::sort(&mut out, order);
        }
        if let Some(limit) = self.limit {
            out.truncate(limit as usize);
        }
        out
    }

    /// Render a SELECT over a document table with `id`, `seq` and `doc` columns.
    pub fn to_sql(&self, table_name: &str) -> Result<SqlResult, FilterError> {
        Self::validate_table_name(table_name)?;
        let mut params = Vec::new();
        let where_clause = FilterWhere::generate(&self.conditions, &mut params);
        let order_clause = FilterOrder::generate(self.order.as_ref(), &mut params);
        let limit_clause = match self.limit {
            Some(limit) => {
                params.push(SqlParam::Int(limit));
                format!("LIMIT ${}", params.len())
            }
            None => String::new(),
        };

        let query = [
            "SELECT id, doc".to_string(),
            format!("FROM \"{}\"", table_name),
            where_clause,
            order_clause,
            limit_clause,
        ]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

        Ok(SqlResult { query, params })
    }

    fn validate_table_name(name: &str) -> Result<(), FilterError> {
        if !Self::is_identifier(name) {
            return Err(FilterError::InvalidTableName(format!("Invalid table name format: {}", name)));
        }
        Ok(())
    }

    fn validate_field(field: &str) -> Result<(), FilterError> {
        if field.is_empty() {
            return Err(FilterError::InvalidField("Field name cannot be empty".to_string()));
        }
        if !Self::is_identifier(field) {
            return Err(FilterError::InvalidField(format!("Invalid field name format: {}", field)));
        }
        Ok(())
    }

    fn is_identifier(name: &str) -> bool {
        let mut chars = name.chars();
        match chars.next() {
            Some(first) if first.is_alphabetic() || first == '_' => {
                chars.all(|c| c.is_alphanumeric() || c == '_')
            }
            _ => false,
        }
    }
}
