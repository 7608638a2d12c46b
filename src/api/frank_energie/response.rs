use serde::{Deserialize, de::DeserializeOwned};
use serde_json::Value;
use serde_with::serde_as;

use crate::api::frank_energie::error::{ApiError, NOT_AUTHORISED};

/// GraphQL response with the `data` left untyped.
///
/// The data is parsed node by node, so that one unexpected field does not throw away the rest.
#[serde_as]
#[derive(Debug, Default, Deserialize)]
pub struct RawResponse {
    #[serde(default)]
    pub data: Option<Value>,

    #[serde_as(as = "serde_with::DefaultOnNull")]
    #[serde(default)]
    pub errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
pub struct GraphQlError {
    pub message: Option<String>,
}

impl RawResponse {
    pub fn is_not_authorised(&self) -> bool {
        self.errors.iter().any(|error| error.message.as_deref() == Some(NOT_AUTHORISED))
    }

    /// Deserialize the top-level `data` field.
    ///
    /// Absent `data`, absent field, `null`, and `{}` all mean «no data»,
    /// whereas a value of an unexpected shape is an error.
    pub fn node<T: DeserializeOwned>(&self, field: &str) -> Result<Option<T>, ApiError> {
        let Some(node) = self.data.as_ref().and_then(|data| data.get(field)) else {
            return Ok(None);
        };
        if node.is_null() || node.as_object().is_some_and(serde_json::Map::is_empty) {
            return Ok(None);
        }
        T::deserialize(node)
            .map(Some)
            .map_err(|error| ApiError::MalformedResponse(format!("`{field}`: {error}")))
    }

    /// First error message, if any.
    pub fn first_error(&self) -> Option<&GraphQlError> {
        self.errors.first()
    }
}
