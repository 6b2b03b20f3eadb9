use serde_json::json;

use super::{JsLiteralParser, LiteralParser, ParsedLiteral};
use crate::error::Error;

fn parse(src: &str) -> ParsedLiteral {
  JsLiteralParser.parse(src).unwrap()
}

#[test]
fn minified_route_export() {
  let src = r#"{queryId:"nK1dw4oV3k4w5TdtcAdSww",operationName:"SearchTimeline",operationType:"query",metadata:{featureSwitches:["a_enabled","b_enabled"],fieldToggles:[]}}"#;
  let expected = json!({
    "queryId": "nK1dw4oV3k4w5TdtcAdSww",
    "operationName": "SearchTimeline",
    "operationType": "query",
    "metadata": { "featureSwitches": ["a_enabled", "b_enabled"], "fieldToggles": [] },
  });
  assert_eq!(parse(src), ParsedLiteral::from_value(expected));
}

#[test]
fn minified_booleans_numbers_and_quotes() {
  let src = "{a:!0,b:!1,'c d':'it\\'s',\"e\":-1.5,f:0x1F,g:void 0,h:null,i:[1,2,],}";
  let expected = json!({
    "a": true, "b": false, "c d": "it's", "e": -1.5, "f": 31, "g": null, "h": null, "i": [1, 2],
  });
  assert_eq!(parse(src), ParsedLiteral::from_value(expected));
}

#[test]
fn comments_and_whitespace_are_ignored() {
  let src = "{\n  // route\n  queryId: \"x\", /* inline */ n: 2e3\n};";
  assert_eq!(parse(src), ParsedLiteral::from_value(json!({ "queryId": "x", "n": 2000.0 })));
}

#[test]
fn unicode_escapes() {
  let src = r#"{s:"é\u{1F600}\x41"}"#;
  assert_eq!(parse(src), ParsedLiteral::from_value(json!({ "s": "é😀A" })));
}

#[test]
fn non_objects_are_tagged() {
  assert_eq!(parse("[1,2]"), ParsedLiteral::NotAnObject(json!([1, 2])));
  assert_eq!(parse("\"text\""), ParsedLiteral::NotAnObject(json!("text")));
}

#[test]
fn references_need_evaluation() {
  match JsLiteralParser.parse("{queryId:n.id}") {
    Err(Error::LiteralParse { offset, reason }) => {
      assert_eq!(offset, 9);
      assert!(reason.contains("`n`"), "{reason}");
    }
    other => panic!("expected a parse error, got {other:?}"),
  }
}

#[test]
fn unbalanced_input_is_rejected() {
  assert!(matches!(
    JsLiteralParser.parse("{a:{b:1}"),
    Err(Error::LiteralParse { .. })
  ));
  assert!(matches!(
    JsLiteralParser.parse("{a:1} trailing"),
    Err(Error::LiteralParse { .. })
  ));
}
