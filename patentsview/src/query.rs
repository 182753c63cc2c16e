//! Composes queries in the PatentsView query language.
//!
//! ```rust,ignore
//! let query = Query::by_assignee("Apple Inc", Some(2020));
//! // {"_and":[{"_contains":{"assignee_organization":"Apple Inc"}},{"_gte":{"patent_date":"2020-01-01"}}]}
//! println!("{query}");
//! ```
use std::fmt::{self, Formatter};

use serde_json::{json, Value};

pub const FIELD_ABSTRACT: &str = "patent_abstract";
pub const FIELD_PATENT_NUMBER: &str = "patent_number";
pub const FIELD_PATENT_DATE: &str = "patent_date";
pub const FIELD_IPC_CLASS: &str = "ipc_class";
pub const FIELD_ASSIGNEE_ORGANIZATION: &str = "assignee_organization";

#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    /// Full text match on any of the words
    TextAny { field: String, text: String },
    Contains { field: String, value: String },
    In { field: String, values: Vec<String> },
    Gte { field: String, value: String },
    Eq { field: String, value: String },
    And(Vec<Query>),
}

impl Query {
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Query::TextAny { field, text } => json!({ "_text_any": { field.as_str(): text } }),
            Query::Contains { field, value } => json!({ "_contains": { field.as_str(): value } }),
            Query::In { field, values } => json!({ "_in": { field.as_str(): values } }),
            Query::Gte { field, value } => json!({ "_gte": { field.as_str(): value } }),
            Query::Eq { field, value } => json!({ field.as_str(): value }),
            Query::And(queries) => {
                json!({ "_and": queries.iter().map(Query::to_json).collect::<Vec<_>>() })
            }
        }
    }

    /// Patents whose abstract holds any of the space separated `keywords`
    #[must_use]
    pub fn by_user_idea(keywords: &str) -> Self {
        Query::TextAny {
            field: FIELD_ABSTRACT.to_string(),
            text: keywords.to_string(),
        }
    }

    /// Patents in the IPC class granted from the start of `year`
    #[must_use]
    pub fn by_technology_area(ipc_code: &str, year: i32) -> Self {
        Query::And(vec![
            Query::Eq {
                field: FIELD_IPC_CLASS.to_string(),
                value: ipc_code.to_string(),
            },
            Self::granted_since(year),
        ])
    }

    #[must_use]
    pub fn by_patent_numbers(patent_numbers: &[String]) -> Self {
        Query::In {
            field: FIELD_PATENT_NUMBER.to_string(),
            values: patent_numbers.to_vec(),
        }
    }

    #[must_use]
    pub fn by_assignee(assignee_name: &str, start_year: Option<i32>) -> Self {
        let contains = Query::Contains {
            field: FIELD_ASSIGNEE_ORGANIZATION.to_string(),
            value: assignee_name.to_string(),
        };
        match start_year {
            Some(year) => Query::And(vec![contains, Self::granted_since(year)]),
            None => contains,
        }
    }

    fn granted_since(year: i32) -> Self {
        Query::Gte {
            field: FIELD_PATENT_DATE.to_string(),
            value: format!("{year}-01-01"),
        }
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idea_query_searches_abstract() {
        assert_eq!(
            Query::by_user_idea("mobile touchscreen").to_json(),
            json!({"_text_any": {"patent_abstract": "mobile touchscreen"}})
        );
    }

    #[test]
    fn technology_area_query() {
        assert_eq!(
            Query::by_technology_area("H04L", 2023).to_json(),
            json!({"_and": [
                {"ipc_class": "H04L"},
                {"_gte": {"patent_date": "2023-01-01"}}
            ]})
        );
    }

    #[test]
    fn assignee_query_with_and_without_year() {
        assert_eq!(
            Query::by_assignee("IBM", None).to_json(),
            json!({"_contains": {"assignee_organization": "IBM"}})
        );
        assert_eq!(
            Query::by_assignee("Apple Inc", Some(2020)).to_string(),
            r#"{"_and":[{"_contains":{"assignee_organization":"Apple Inc"}},{"_gte":{"patent_date":"2020-01-01"}}]}"#
        );
    }

    #[test]
    fn patent_numbers_query() {
        let numbers = vec!["10000000".to_string(), "9999999".to_string()];
        assert_eq!(
            Query::by_patent_numbers(&numbers).to_json(),
            json!({"_in": {"patent_number": ["10000000", "9999999"]}})
        );
    }
}
