//! Caller-supplied description of an outbound request.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::GatewayError;

/// An outbound call described as data.
///
/// Every field is optional in the JSON form and takes its zero value when
/// absent or `null`. Field names also accept their capitalized spelling (`URL`,
/// `Method`, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestSpec {
    #[serde(alias = "URL", alias = "Url", deserialize_with = "null_as_default")]
    pub url: String,

    /// HTTP method token. Empty means GET.
    #[serde(alias = "Method", deserialize_with = "null_as_default")]
    pub method: String,

    #[serde(
        alias = "Headers",
        deserialize_with = "null_as_default",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub headers: BTreeMap<String, String>,

    #[serde(
        alias = "Cookies",
        deserialize_with = "null_as_default",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub cookies: BTreeMap<String, String>,

    /// Sent verbatim when non-empty.
    #[serde(
        alias = "Body",
        deserialize_with = "null_as_default",
        skip_serializing_if = "String::is_empty"
    )]
    pub body: String,
}

impl RequestSpec {
    /// A bare GET of `url`.
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: "GET".to_string(),
            ..Self::default()
        }
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Decode the raw `request` query value.
pub fn decode(raw: Option<&str>) -> Result<RequestSpec, GatewayError> {
    let raw = raw
        .filter(|value| !value.is_empty())
        .ok_or(GatewayError::MissingParameter("request"))?;

    serde_json::from_str(raw).map_err(GatewayError::Decode)
}
