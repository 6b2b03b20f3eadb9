//! scripted transport used by the unit tests

use std::collections::VecDeque;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::Result;
use crate::session::Clock;
use crate::transport::{HttpRequest, HttpResponse, Transport};

struct Rule {
  needle: String,
  responses: VecDeque<HttpResponse>,
}

/// answers requests whose url contains a registered needle, replaying the
/// queued responses in order (the last one repeats forever)
#[derive(Default)]
pub struct ScriptedTransport {
  rules: Mutex<Vec<Rule>>,
  log: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
  pub fn new() -> Arc<Self> {
    Arc::new(Self::default())
  }

  pub fn on(&self, needle: &str, responses: Vec<HttpResponse>) {
    self.rules.lock().unwrap().push(Rule {
      needle: needle.to_string(),
      responses: responses.into(),
    });
  }

  pub fn requests(&self) -> Vec<HttpRequest> {
    self.log.lock().unwrap().clone()
  }

  /// number of requests whose url contains `needle`
  pub fn count(&self, needle: &str) -> usize {
    self
      .log
      .lock()
      .unwrap()
      .iter()
      .filter(|r| r.url.contains(needle))
      .count()
  }
}

#[async_trait]
impl Transport for ScriptedTransport {
  async fn request(&self, request: HttpRequest) -> Result<HttpResponse> {
    let url = request.url.clone();
    self.log.lock().unwrap().push(request);
    let mut rules = self.rules.lock().unwrap();
    // the longest matching needle wins
    let index = rules
      .iter()
      .enumerate()
      .filter(|(_, rule)| url.contains(&rule.needle))
      .max_by_key(|(_, rule)| rule.needle.len())
      .map(|(i, _)| i);
    let response = index
      .and_then(|i| {
        let rule = &mut rules[i];
        if rule.responses.len() > 1 {
          rule.responses.pop_front()
        } else {
          rule.responses.front().cloned()
        }
      })
      .unwrap_or_else(|| HttpResponse::new(404, "not scripted"));
    Ok(response)
  }
}

pub fn ok_json(body: serde_json::Value) -> HttpResponse {
  HttpResponse::new(200, body.to_string())
}

pub fn guest_token_response(token: &str) -> HttpResponse {
  ok_json(serde_json::json!({ "guest_token": token }))
}

/// scripts the default host page and a single `api` bundle exporting each
/// operation as `https://api.twitter.com/graphql/q<index>/<operation>`
pub fn script_routes(transport: &ScriptedTransport, routes: &[(&str, &[&str])]) {
  let exports: Vec<String> = routes
    .iter()
    .enumerate()
    .map(|(i, (operation, features))| {
      let switches: Vec<String> = features.iter().map(|f| format!("\"{f}\"")).collect();
      format!(
        "{i}:e=>{{e.exports={{queryId:\"q{i}\",operationName:\"{operation}\",operationType:\"query\",\
         metadata:{{featureSwitches:[{}]}}}}}}",
        switches.join(",")
      )
    })
    .collect();
  let bundle = format!(
    "(self.webpackChunk=self.webpackChunk||[]).push([[\"api\"],{{{}}}]);",
    exports.join(",")
  );
  let manifest = r#"e.p="https://abs.twimg.com/responsive-web/client-web/",e.u=e=>e+"."+{"vendor":"f5e1a2b",api:"1a2b3c4","endpoints.Tweets":"ccccccc"}[e]+"a.js""#;

  transport.on("https://twitter.com/", vec![HttpResponse::new(200, format!("<script>{manifest}</script>"))]);
  transport.on("api.1a2b3c4a.js", vec![HttpResponse::new(200, bundle)]);
}

/// clock the tests move by hand
#[derive(Clone, Default)]
pub struct ManualClock(Arc<AtomicI64>);

impl ManualClock {
  pub fn at(secs: i64) -> Self {
    Self(Arc::new(AtomicI64::new(secs)))
  }

  pub fn advance(&self, secs: i64) {
    self.0.fetch_add(secs, Ordering::SeqCst);
  }
}

impl Clock for ManualClock {
  fn now(&self) -> i64 {
    self.0.load(Ordering::SeqCst)
  }
}
