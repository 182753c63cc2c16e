use std::fmt::{self, Formatter};

use serde::{
    de::{self, Visitor},
    Deserialize, Deserializer, Serialize, Serializer,
};
use serde_json::{Map, Value};

/// A patent record as PatentsView returns it.
///
/// Every field is optional since PatentsView only returns the fields asked for. Unknown
/// top level fields (classifications and the like) are collected in `other`, and the
/// untouched JSON object is kept in `record` so it can be stored verbatim.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(remote = "Self")]
pub struct RawPatent {
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub patent_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patent_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patent_abstract: Option<String>,
    /// Grant date
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patent_date: Option<String>,
    /// Application (filing) date
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_date: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty", skip_serializing_if = "Vec::is_empty")]
    pub assignees: Vec<RawAssignee>,
    #[serde(default, deserialize_with = "null_as_empty", skip_serializing_if = "Vec::is_empty")]
    pub inventors: Vec<RawInventor>,
    #[serde(default, deserialize_with = "null_as_empty", skip_serializing_if = "Vec::is_empty")]
    pub claims: Vec<RawClaim>,
    #[serde(default, deserialize_with = "null_as_empty", skip_serializing_if = "Vec::is_empty")]
    pub cited_patents: Vec<CitedPatent>,
    #[serde(default, deserialize_with = "null_as_empty", skip_serializing_if = "Vec::is_empty")]
    pub citedby_patents: Vec<CitedByPatent>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
    /// The record as received, `Null` for records built in code
    #[serde(skip)]
    pub record: Value,
}

impl RawPatent {
    /// The record as a JSON value, suitable for storing as raw data
    #[must_use]
    pub fn to_value(&self) -> Value {
        if self.record.is_null() {
            RawPatent::serialize(self, serde_json::value::Serializer).unwrap_or(Value::Null)
        } else {
            self.record.clone()
        }
    }
}

impl<'de> Deserialize<'de> for RawPatent {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let record = Value::deserialize(deserializer)?;
        let mut patent = RawPatent::deserialize(&record).map_err(de::Error::custom)?;
        patent.record = record;
        Ok(patent)
    }
}

impl Serialize for RawPatent {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if self.record.is_null() {
            RawPatent::serialize(self, serializer)
        } else {
            self.record.serialize(serializer)
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct RawAssignee {
    #[serde(default)]
    pub assignee_organization: Option<String>,
    #[serde(default)]
    pub assignee_first_name: Option<String>,
    #[serde(default)]
    pub assignee_last_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct RawInventor {
    #[serde(default)]
    pub inventor_name_first: Option<String>,
    #[serde(default)]
    pub inventor_name_last: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct RawClaim {
    #[serde(default, deserialize_with = "lenient_claim_number")]
    pub claim_number: Option<i32>,
    #[serde(default)]
    pub claim_text: Option<String>,
}

/// A patent cited by the enclosing patent (backward citation)
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct CitedPatent {
    #[serde(default, deserialize_with = "lenient_string")]
    pub cited_patent_number: Option<String>,
}

/// A patent citing the enclosing patent (forward citation)
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct CitedByPatent {
    #[serde(default, deserialize_with = "lenient_string")]
    pub citedby_patent_number: Option<String>,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// PatentsView is not consistent about numbers vs. strings for identifiers
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(LenientStringVisitor)
}

fn lenient_claim_number<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = deserializer.deserialize_any(LenientStringVisitor)?;
    Ok(value.and_then(|s| s.trim().parse::<i32>().ok()))
}

struct LenientStringVisitor;

impl<'de> Visitor<'de> for LenientStringVisitor {
    type Value = Option<String>;

    fn expecting(&self, formatter: &mut Formatter) -> fmt::Result {
        formatter.write_str("a string or a number")
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(Some(v.to_string()))
    }

    fn visit_string<E>(self, v: String) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(Some(v))
    }

    fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(Some(v.to_string()))
    }

    fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(Some(v.to_string()))
    }

    #[allow(clippy::cast_possible_truncation)]
    fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        if v.fract() == 0.0 {
            Ok(Some(format!("{}", v as i64)))
        } else {
            Ok(Some(v.to_string()))
        }
    }

    fn visit_unit<E>(self) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(None)
    }

    fn visit_none<E>(self) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(None)
    }

    fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(LenientStringVisitor)
    }
}
