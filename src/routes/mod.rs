//! route registry: mines the host's script bundles for the current
//! graphql query ids and the feature switches each operation requires

mod literal;
mod manifest;

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

pub use literal::{JsLiteralParser, LiteralParser, ParsedLiteral};
pub use manifest::{
  export_literals, is_manifest_script, scan_manifest, BundleRef, Manifest, RegexScriptExtractor,
  ScriptExtractor, MANIFEST_MARKER,
};

use crate::error::{Error, Result};
use crate::session::{CredentialManager, RequestOptions};
use crate::transport::HttpRequest;

/// operation metadata as exported by the bundle
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteMetadata {
  #[serde(rename = "featureSwitches", default)]
  pub feature_switches: Vec<String>,
  /// anything else the bundle exported (`fieldToggles`, ...)
  #[serde(flatten)]
  pub extra: Map<String, Value>,
}

/// a named operation resolved to its endpoint; (de)serializes as
/// `[url, metadata]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "(String, RouteMetadata)", into = "(String, RouteMetadata)")]
pub struct Route {
  pub url: String,
  pub metadata: RouteMetadata,
}

impl From<(String, RouteMetadata)> for Route {
  fn from((url, metadata): (String, RouteMetadata)) -> Self {
    Self { url, metadata }
  }
}

impl From<Route> for (String, RouteMetadata) {
  fn from(route: Route) -> Self {
    (route.url, route.metadata)
  }
}

impl Route {
  pub fn feature_switches(&self) -> &[String] {
    &self.metadata.feature_switches
  }

  /// switches the route requires that are absent from `provided`
  pub fn missing_features<'a>(&self, provided: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let provided: Vec<&str> = provided.into_iter().collect();
    self
      .metadata
      .feature_switches
      .iter()
      .filter(|switch| !provided.contains(&switch.as_str()))
      .cloned()
      .collect()
  }
}

/// operation name -> route
pub type RouteMap = BTreeMap<String, Route>;

/// `{ operationName: [url, { featureSwitches: [...], ... }] }`
pub fn routes_to_json(routes: &RouteMap) -> Result<Value> {
  Ok(serde_json::to_value(routes)?)
}

/// build the routes exported by one bundle's source text
pub fn routes_from_bundle(
  bundle: &str,
  source: &str,
  parser: &dyn LiteralParser,
  graphql_base: &str,
) -> Result<RouteMap> {
  let mut routes = RouteMap::new();
  for literal in export_literals(source) {
    let object = match parser.parse(literal)? {
      ParsedLiteral::Object(object) => object,
      ParsedLiteral::NotAnObject(found) => {
        return Err(Error::BundleFormatChanged {
          bundle: bundle.to_string(),
          found: found.to_string(),
        })
      }
    };

    let (Some(query_id), Some(operation)) =
      (str_field(&object, "queryId"), str_field(&object, "operationName"))
    else {
      return Err(Error::BundleFormatChanged {
        bundle: bundle.to_string(),
        found: Value::Object(object.clone()).to_string(),
      });
    };
    let metadata: RouteMetadata = match object.get("metadata") {
      Some(meta @ Value::Object(_)) => serde_json::from_value(meta.clone())?,
      _ => {
        return Err(Error::BundleFormatChanged {
          bundle: bundle.to_string(),
          found: format!("{operation} without metadata"),
        })
      }
    };

    let url = format!("{}/{query_id}/{operation}", graphql_base.trim_end_matches('/'));
    routes.insert(operation.to_string(), Route { url, metadata });
  }
  Ok(routes)
}

fn str_field<'a>(object: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
  object.get(key).and_then(Value::as_str)
}

/// discovers and memoizes the host's graphql routes
pub struct RouteRegistry {
  session: Arc<CredentialManager>,
  scripts: Arc<dyn ScriptExtractor>,
  parser: Arc<dyn LiteralParser>,
  cached: Mutex<Option<Arc<RouteMap>>>,
}

impl RouteRegistry {
  pub fn new(session: Arc<CredentialManager>) -> Self {
    Self {
      session,
      scripts: Arc::new(RegexScriptExtractor),
      parser: Arc::new(JsLiteralParser),
      cached: Mutex::new(None),
    }
  }

  #[must_use]
  pub fn with_script_extractor(mut self, scripts: Arc<dyn ScriptExtractor>) -> Self {
    self.scripts = scripts;
    self
  }

  #[must_use]
  pub fn with_literal_parser(mut self, parser: Arc<dyn LiteralParser>) -> Self {
    self.parser = parser;
    self
  }

  /// routes from the first successful discovery, mined on first use
  pub async fn routes(&self) -> Result<Arc<RouteMap>> {
    let mut cached = self.cached.lock().await;
    if let Some(routes) = cached.as_ref() {
      return Ok(routes.clone());
    }
    let routes = Arc::new(self.discover_routes().await?);
    *cached = Some(routes.clone());
    Ok(routes)
  }

  /// a single route, or `RouteNotFound`
  pub async fn route(&self, operation: &str) -> Result<Route> {
    self
      .routes()
      .await?
      .get(operation)
      .cloned()
      .ok_or_else(|| Error::RouteNotFound {
        operation: operation.to_string(),
      })
  }

  /// forget memoized routes so the next lookup mines again
  pub async fn invalidate(&self) {
    *self.cached.lock().await = None;
  }

  /// fetch the host page, walk its manifest and mine every allowed bundle
  #[instrument(skip(self))]
  pub async fn discover_routes(&self) -> Result<RouteMap> {
    let config = self.session.config();
    let page = self
      .session
      .request(
        HttpRequest::get(&config.host_url),
        &RequestOptions::unauthenticated().with_referer(&config.host_url),
      )
      .await
      .map_err(|e| Error::DiscoveryFailure {
        status: None,
        source: Some(Box::new(e)),
      })?;
    if !page.is_success() {
      return Err(Error::DiscoveryFailure {
        status: Some(page.status),
        source: None,
      });
    }

    let mut routes = RouteMap::new();
    let mut root_path: Option<String> = None;
    for script in self.scripts.scripts(&page.body) {
      if !is_manifest_script(&script) {
        continue;
      }
      let manifest = scan_manifest(&script, &config.cdn_root);
      if manifest.root_path.is_some() {
        root_path = manifest.root_path;
      }
      let Some(root) = root_path.as_deref() else {
        debug!("manifest script without a bundle root, skipping");
        continue;
      };

      for bundle in manifest.bundles {
        if !bundle.is_allowed(&config.bundle_suffixes) {
          continue;
        }
        let url = bundle.url(&config.cdn_root, root, &config.build_tag);
        if let Some(found) = self.process_bundle(&bundle, &url).await? {
          routes.extend(found);
        }
      }
    }

    info!(count = routes.len(), "discovered routes");
    Ok(routes)
  }

  async fn process_bundle(&self, bundle: &BundleRef, url: &str) -> Result<Option<RouteMap>> {
    debug!(url, "fetching bundle");
    let response = self
      .session
      .request(HttpRequest::get(url), &RequestOptions::unauthenticated())
      .await?;
    if !response.is_success() {
      warn!(url, status = response.status, "bundle fetch failed, skipping");
      return Ok(None);
    }
    let config = self.session.config();
    routes_from_bundle(&bundle.name, &response.body, self.parser.as_ref(), &config.graphql_base)
      .map(Some)
  }
}

#[cfg(test)]
mod literal_test;
