//! scanning the host page for the webpack manifest and the bundles it names

use once_cell::sync::Lazy;
use regex::Regex;

/// inline scripts mentioning this are webpack manifest chunks
pub const MANIFEST_MARKER: &str = "endpoints.";

static SCRIPT_TAG: Lazy<Regex> =
  Lazy::new(|| Regex::new(r"(?is)<script\b[^>]*>(.*?)</script\s*>").expect("valid script regex"));
// `,api:"1a2b3c4"` style entries
static API_PAIR: Lazy<Regex> = Lazy::new(|| Regex::new(r#",([^,:"]*):"([^"]*)""#).expect("valid pair regex"));
// `"endpoints.UsersGraphQL":"1a2b3c4"` style entries
static NAMED_PAIR: Lazy<Regex> =
  Lazy::new(|| Regex::new(r#""([^"]*)":"([^"]*)""#).expect("valid pair regex"));
static EXPORT_START: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{e\.exports=\{").expect("valid export regex"));

/// capability: text content of every `<script>` element in a page
pub trait ScriptExtractor: Send + Sync {
  fn scripts(&self, html: &str) -> Vec<String>;
}

/// good enough for the host page, which only needs inline script bodies
#[derive(Debug, Clone, Copy, Default)]
pub struct RegexScriptExtractor;

impl ScriptExtractor for RegexScriptExtractor {
  fn scripts(&self, html: &str) -> Vec<String> {
    SCRIPT_TAG
      .captures_iter(html)
      .filter_map(|c| c.get(1))
      .map(|m| m.as_str().to_string())
      .collect()
  }
}

pub fn is_manifest_script(script: &str) -> bool {
  script.to_lowercase().contains(MANIFEST_MARKER)
}

/// a bundle listed in the manifest
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BundleRef {
  pub name: String,
  pub hash: String,
}

impl BundleRef {
  pub fn new(name: impl Into<String>, hash: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      hash: hash.into(),
    }
  }

  pub fn is_allowed(&self, suffixes: &[String]) -> bool {
    suffixes.iter().any(|suffix| self.name.ends_with(suffix.as_str()))
  }

  /// `<cdn root><root path>/<name>.<hash><tag>.js`
  pub fn url(&self, cdn_root: &str, root_path: &str, build_tag: &str) -> String {
    format!("{cdn_root}{root_path}/{}.{}{build_tag}.js", self.name, self.hash)
  }
}

/// what one manifest script tells us
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
  /// path under the cdn root, only set when the script names exactly one
  pub root_path: Option<String>,
  pub bundles: Vec<BundleRef>,
}

pub fn scan_manifest(script: &str, cdn_root: &str) -> Manifest {
  let root = Regex::new(&format!(r#""{}(.*?)/""#, regex::escape(cdn_root)));
  let roots: Vec<&str> = match &root {
    Ok(re) => re
      .captures_iter(script)
      .filter_map(|c| c.get(1))
      .map(|m| m.as_str())
      .collect(),
    Err(_) => Vec::new(),
  };
  let root_path = match roots.as_slice() {
    [single] => Some((*single).to_string()),
    _ => None,
  };

  let mut bundles: Vec<BundleRef> = Vec::new();
  let mut push = |bundle: BundleRef| {
    if !bundles.contains(&bundle) {
      bundles.push(bundle);
    }
  };
  for c in API_PAIR.captures_iter(script) {
    let (name, hash) = (&c[1], &c[2]);
    if name == "api" && hash.len() == 7 {
      push(BundleRef::new(name, hash));
    }
  }
  for c in NAMED_PAIR.captures_iter(script) {
    let (name, hash) = (&c[1], &c[2]);
    if name.to_lowercase().contains("endpoints") {
      push(BundleRef::new(name, hash));
    }
  }

  Manifest { root_path, bundles }
}

/// every `{e.exports={...}` object literal in a bundle, brace balanced
pub fn export_literals(bundle: &str) -> Vec<&str> {
  EXPORT_START
    .find_iter(bundle)
    .filter_map(|m| {
      // the match ends on the literal's opening brace
      let start = m.end() - 1;
      balanced_end(&bundle[start..]).map(|len| &bundle[start..start + len])
    })
    .collect()
}

/// length of the brace-balanced prefix of `text`, skipping braces in strings
fn balanced_end(text: &str) -> Option<usize> {
  let mut depth = 0usize;
  let mut quote: Option<char> = None;
  let mut escaped = false;
  for (i, c) in text.char_indices() {
    if let Some(q) = quote {
      if escaped {
        escaped = false;
      } else if c == '\\' {
        escaped = true;
      } else if c == q {
        quote = None;
      }
      continue;
    }
    match c {
      '"' | '\'' | '`' => quote = Some(c),
      '{' => depth += 1,
      '}' => {
        depth = depth.checked_sub(1)?;
        if depth == 0 {
          return Some(i + 1);
        }
      }
      _ => {}
    }
  }
  None
}
