//! query composers: build graphql requests from discovered routes and hand
//! the responses to the timeline normalizer

pub mod detail;
pub mod query;
pub mod users;

use serde_json::{Map, Value};

use crate::error::Result;
use crate::routes::Route;

/// feature switches a composer sends, by name
pub type FeatureSet = &'static [(&'static str, bool)];

pub(crate) fn features_json(features: FeatureSet) -> Value {
  Value::Object(
    features
      .iter()
      .map(|(name, enabled)| (name.to_string(), Value::Bool(*enabled)))
      .collect::<Map<String, Value>>(),
  )
}

/// switches the route asks for that `features` does not send
pub(crate) fn missing_features(route: &Route, features: FeatureSet) -> Vec<String> {
  route.missing_features(features.iter().map(|(name, _)| *name))
}

/// `variables` / `features` query parameters as compact JSON
pub(crate) fn graphql_params(variables: &Value, features: FeatureSet) -> Result<Vec<(String, String)>> {
  Ok(vec![
    ("variables".to_string(), serde_json::to_string(variables)?),
    ("features".to_string(), serde_json::to_string(&features_json(features))?),
  ])
}
