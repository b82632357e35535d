use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn to_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterWhereInfo {
    pub field: String,
    pub data: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterOrderInfo {
    pub field: String,
    pub sort: SortDirection,
}

/// A bind parameter for rendered SQL. Field names travel as text so they are
/// never interpolated into the statement.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Text(String),
    Json(Value),
    Int(i64),
}

#[derive(Debug, Clone)]
pub struct SqlResult {
    pub query: String,
    pub params: Vec<SqlParam>,
}
