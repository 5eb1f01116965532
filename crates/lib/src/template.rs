//! `@TOKEN@` substitution for autoconf-style templates.
//!
//! Templates such as `cairo.pc.in` mark values with `@NAME@`, where `NAME`
//! starts with a letter or underscore and continues with letters, digits or
//! underscores. Any other `@` is literal text, so e-mail addresses and
//! stray at-signs pass through unchanged.
//!
//! # Example
//!
//! ```
//! use cairokit_lib::template::{parse, Segment};
//!
//! let segments = parse("prefix=@prefix@ (bugs@example)").unwrap();
//! assert_eq!(segments, vec![
//!     Segment::Literal("prefix=".to_string()),
//!     Segment::Token("prefix".to_string()),
//!     Segment::Literal(" (bugs@example)".to_string()),
//! ]);
//! ```

use std::collections::BTreeMap;

use thiserror::Error;

/// A segment of parsed text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
  Literal(String),
  Token(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
  #[error("unresolved template token @{0}@")]
  Unresolved(String),
}

/// Supplies values for tokens.
pub trait Resolver {
  fn resolve(&self, token: &str) -> Option<&str>;
}

impl Resolver for BTreeMap<String, String> {
  fn resolve(&self, token: &str) -> Option<&str> {
    self.get(token).map(String::as_str)
  }
}

fn is_token_start(c: char) -> bool {
  c.is_ascii_alphabetic() || c == '_'
}

fn is_token_char(c: char) -> bool {
  c.is_ascii_alphanumeric() || c == '_'
}

/// Parse a template into literal and token segments.
///
/// Parsing never fails today; the `Result` leaves room for stricter syntax.
pub fn parse(input: &str) -> Result<Vec<Segment>, TemplateError> {
  let mut segments = Vec::new();
  let mut literal = String::new();
  let mut rest = input;

  while let Some(at) = rest.find('@') {
    literal.push_str(&rest[..at]);
    let after = &rest[at + 1..];

    let token_len = after
      .char_indices()
      .take_while(|(i, c)| if *i == 0 { is_token_start(*c) } else { is_token_char(*c) })
      .count();

    if token_len > 0 && after[token_len..].starts_with('@') {
      if !literal.is_empty() {
        segments.push(Segment::Literal(std::mem::take(&mut literal)));
      }
      segments.push(Segment::Token(after[..token_len].to_string()));
      rest = &after[token_len + 1..];
    } else {
      literal.push('@');
      rest = after;
    }
  }

  literal.push_str(rest);
  if !literal.is_empty() {
    segments.push(Segment::Literal(literal));
  }
  Ok(segments)
}

/// Substitute every token in `input`.
///
/// # Errors
///
/// Returns [`TemplateError::Unresolved`] for the first token the resolver does not know.
pub fn substitute(input: &str, resolver: &impl Resolver) -> Result<String, TemplateError> {
  let segments = parse(input)?;
  substitute_segments(&segments, resolver)
}

/// Substitute tokens in pre-parsed segments.
pub fn substitute_segments(segments: &[Segment], resolver: &impl Resolver) -> Result<String, TemplateError> {
  let mut result = String::new();
  for segment in segments {
    match segment {
      Segment::Literal(s) => result.push_str(s),
      Segment::Token(name) => {
        let value = resolver
          .resolve(name)
          .ok_or_else(|| TemplateError::Unresolved(name.clone()))?;
        result.push_str(value);
      }
    }
  }
  Ok(result)
}
