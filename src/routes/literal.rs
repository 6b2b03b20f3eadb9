//! turning the object literals found in minified bundles into JSON
//!
//! the bundles are not JSON: keys are bare identifiers, strings may use
//! single quotes and booleans are minified to `!0` / `!1`. the parser
//! accepts exactly that data subset and rejects anything that would need
//! evaluation (identifiers, calls, operators).

use serde_json::{Map, Number, Value};

use crate::error::{Error, Result};

/// outcome of parsing an export literal
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedLiteral {
  Object(Map<String, Value>),
  NotAnObject(Value),
}

impl ParsedLiteral {
  pub fn from_value(value: Value) -> Self {
    match value {
      Value::Object(map) => Self::Object(map),
      other => Self::NotAnObject(other),
    }
  }
}

/// capability: parse a JS object literal into an equivalent JSON value
pub trait LiteralParser: Send + Sync {
  fn parse(&self, source: &str) -> Result<ParsedLiteral>;
}

/// parser for the data-only literals webpack emits
#[derive(Debug, Clone, Copy, Default)]
pub struct JsLiteralParser;

impl LiteralParser for JsLiteralParser {
  fn parse(&self, source: &str) -> Result<ParsedLiteral> {
    let mut cursor = Cursor::new(source);
    let value = cursor.value()?;
    cursor.skip_trivia();
    while cursor.eat(';') {
      cursor.skip_trivia();
    }
    if cursor.peek().is_some() {
      return Err(cursor.error("trailing characters after literal"));
    }
    Ok(ParsedLiteral::from_value(value))
  }
}

struct Cursor<'a> {
  src: &'a str,
  pos: usize,
}

impl<'a> Cursor<'a> {
  fn new(src: &'a str) -> Self {
    Self { src, pos: 0 }
  }

  fn error(&self, reason: impl Into<String>) -> Error {
    Error::LiteralParse {
      offset: self.pos,
      reason: reason.into(),
    }
  }

  fn rest(&self) -> &'a str {
    &self.src[self.pos..]
  }

  fn peek(&self) -> Option<char> {
    self.rest().chars().next()
  }

  fn bump(&mut self) -> Option<char> {
    let c = self.peek()?;
    self.pos += c.len_utf8();
    Some(c)
  }

  fn eat(&mut self, expected: char) -> bool {
    if self.peek() == Some(expected) {
      self.pos += expected.len_utf8();
      true
    } else {
      false
    }
  }

  fn expect(&mut self, expected: char) -> Result<()> {
    if self.eat(expected) {
      Ok(())
    } else {
      Err(self.error(format!("expected `{expected}`")))
    }
  }

  fn skip_trivia(&mut self) {
    loop {
      let rest = self.rest();
      if rest.starts_with("//") {
        self.pos += rest.find('\n').unwrap_or(rest.len());
      } else if rest.starts_with("/*") {
        self.pos += rest[2..].find("*/").map_or(rest.len(), |end| end + 4);
      } else if self.peek().map_or(false, char::is_whitespace) {
        self.bump();
      } else {
        break;
      }
    }
  }

  fn value(&mut self) -> Result<Value> {
    self.skip_trivia();
    match self.peek() {
      Some('{') => self.object(),
      Some('[') => self.array(),
      Some(q @ ('"' | '\'' | '`')) => self.string(q).map(Value::String),
      Some('!') => self.negation(),
      Some(c) if c == '-' || c == '+' || c == '.' || c.is_ascii_digit() => self.number(),
      Some(c) if is_ident_start(c) => self.keyword(),
      Some(c) => Err(self.error(format!("unexpected character `{c}`"))),
      None => Err(self.error("unexpected end of input")),
    }
  }

  fn object(&mut self) -> Result<Value> {
    self.expect('{')?;
    let mut map = Map::new();
    loop {
      self.skip_trivia();
      if self.eat('}') {
        return Ok(Value::Object(map));
      }
      let key = self.key()?;
      self.skip_trivia();
      self.expect(':')?;
      let value = self.value()?;
      map.insert(key, value);
      self.skip_trivia();
      if !self.eat(',') {
        self.skip_trivia();
        self.expect('}')?;
        return Ok(Value::Object(map));
      }
    }
  }

  fn key(&mut self) -> Result<String> {
    match self.peek() {
      Some(q @ ('"' | '\'')) => self.string(q),
      Some(c) if is_ident_start(c) => Ok(self.ident().to_string()),
      Some(c) if c.is_ascii_digit() => {
        let start = self.pos;
        while self.peek().map_or(false, |c| c.is_ascii_alphanumeric() || c == '.') {
          self.bump();
        }
        Ok(self.src[start..self.pos].to_string())
      }
      _ => Err(self.error("expected an object key")),
    }
  }

  fn array(&mut self) -> Result<Value> {
    self.expect('[')?;
    let mut items = Vec::new();
    loop {
      self.skip_trivia();
      if self.eat(']') {
        return Ok(Value::Array(items));
      }
      items.push(self.value()?);
      self.skip_trivia();
      if !self.eat(',') {
        self.skip_trivia();
        self.expect(']')?;
        return Ok(Value::Array(items));
      }
    }
  }

  fn string(&mut self, quote: char) -> Result<String> {
    self.expect(quote)?;
    let mut out = String::new();
    loop {
      let c = self
        .bump()
        .ok_or_else(|| self.error("unterminated string"))?;
      match c {
        c if c == quote => return Ok(out),
        '$' if quote == '`' && self.peek() == Some('{') => {
          return Err(self.error("template interpolation needs evaluation"));
        }
        '\\' => self.escape(&mut out)?,
        c => out.push(c),
      }
    }
  }

  fn escape(&mut self, out: &mut String) -> Result<()> {
    let c = self
      .bump()
      .ok_or_else(|| self.error("unterminated escape"))?;
    match c {
      'n' => out.push('\n'),
      't' => out.push('\t'),
      'r' => out.push('\r'),
      'b' => out.push('\u{8}'),
      'f' => out.push('\u{c}'),
      'v' => out.push('\u{b}'),
      '0' => out.push('\0'),
      // line continuation
      '\n' => {}
      'x' => {
        let code = self.hex_digits(2)?;
        out.push(char::from_u32(code).ok_or_else(|| self.error("bad \\x escape"))?);
      }
      'u' => {
        let code = if self.eat('{') {
          let start = self.pos;
          while self.peek().map_or(false, |c| c.is_ascii_hexdigit()) {
            self.bump();
          }
          let src = self.src;
          let digits = &src[start..self.pos];
          self.expect('}')?;
          u32::from_str_radix(digits, 16).map_err(|_| self.error("bad \\u{} escape"))?
        } else {
          let high = self.hex_digits(4)?;
          if (0xD800..0xDC00).contains(&high) && self.rest().starts_with("\\u") {
            self.pos += 2;
            let low = self.hex_digits(4)?;
            0x10000 + ((high - 0xD800) << 10) + (low.wrapping_sub(0xDC00) & 0x3FF)
          } else {
            high
          }
        };
        out.push(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER));
      }
      other => out.push(other),
    }
    Ok(())
  }

  fn hex_digits(&mut self, count: usize) -> Result<u32> {
    let digits = self
      .rest()
      .get(..count)
      .ok_or_else(|| self.error("truncated hex escape"))?;
    let code = u32::from_str_radix(digits, 16).map_err(|_| self.error("bad hex escape"))?;
    self.pos += count;
    Ok(code)
  }

  /// minified booleans: `!0` is true, `!1` is false
  fn negation(&mut self) -> Result<Value> {
    self.expect('!')?;
    match self.value()? {
      Value::Number(n) => Ok(Value::Bool(n.as_f64() == Some(0.0))),
      Value::Bool(b) => Ok(Value::Bool(!b)),
      Value::Null => Ok(Value::Bool(true)),
      _ => Err(self.error("negation of a non-primitive")),
    }
  }

  fn number(&mut self) -> Result<Value> {
    let start = self.pos;
    let negative = self.eat('-');
    if !negative {
      self.eat('+');
    }
    let rest = self.rest();
    if rest.starts_with("0x") || rest.starts_with("0X") {
      self.pos += 2;
      let digits_start = self.pos;
      while self.peek().map_or(false, |c| c.is_ascii_hexdigit()) {
        self.bump();
      }
      let n = i64::from_str_radix(&self.src[digits_start..self.pos], 16)
        .map_err(|_| self.error("bad hex number"))?;
      return Ok(Value::Number(Number::from(if negative { -n } else { n })));
    }
    while self
      .peek()
      .map_or(false, |c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E'))
    {
      self.bump();
      if matches!(self.src[..self.pos].chars().last(), Some('e' | 'E')) {
        if !self.eat('-') {
          self.eat('+');
        }
      }
    }
    let text = &self.src[start..self.pos];
    if let Ok(n) = text.parse::<i64>() {
      return Ok(Value::Number(Number::from(n)));
    }
    text
      .parse::<f64>()
      .ok()
      .and_then(Number::from_f64)
      .map(Value::Number)
      .ok_or_else(|| self.error(format!("bad number `{text}`")))
  }

  fn ident(&mut self) -> &'a str {
    let start = self.pos;
    while self.peek().map_or(false, is_ident_continue) {
      self.bump();
    }
    &self.src[start..self.pos]
  }

  fn keyword(&mut self) -> Result<Value> {
    let start = self.pos;
    match self.ident() {
      "true" => Ok(Value::Bool(true)),
      "false" => Ok(Value::Bool(false)),
      "null" | "undefined" => Ok(Value::Null),
      "void" => {
        // `void 0`
        self.skip_trivia();
        self.number()?;
        Ok(Value::Null)
      }
      other => {
        let reason = format!("identifier `{other}` needs evaluation");
        self.pos = start;
        Err(self.error(reason))
      }
    }
  }
}

fn is_ident_start(c: char) -> bool {
  c.is_alphabetic() || c == '_' || c == '$'
}

fn is_ident_continue(c: char) -> bool {
  c.is_alphanumeric() || c == '_' || c == '$'
}
