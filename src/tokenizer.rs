//! Lexical analysis: turns the raw source text into a vector of tokens.
//!
//! The scanner works in two passes over the whole text. The first pass
//! strips `/* ... */` block comments. The second strips `//` line comments
//! (unless inside a string constant), injects explicit separators around
//! punctuation and quotes so a final whitespace split yields correct word
//! boundaries even when the source has no spaces around operators, and
//! substitutes spaces inside string constants with a sentinel so a literal
//! containing spaces survives the split as one word.

use crate::error::{CompileError, CompileResult};
use std::fmt::{self, Display, Formatter};

/// Kinds of tokens recognised by the front-end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
  IntegerConstant,
  StringConstant,
  Keyword,
  Symbol,
  Identifier,
}

/// A classified lexical unit. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
  pub kind: TokenKind,
  pub text: String,
}

impl Token {
  fn new(kind: TokenKind, text: impl Into<String>) -> Self {
    Self {
      kind,
      text: text.into(),
    }
  }

  /// True when this token is exactly the given literal text.
  pub fn is(&self, text: &str) -> bool {
    self.text == text
  }
}

impl Display for Token {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    match self.kind {
      TokenKind::IntegerConstant => write!(f, "integer constant '{}'", self.text),
      TokenKind::StringConstant => write!(f, "string constant \"{}\"", self.text),
      TokenKind::Keyword => write!(f, "keyword '{}'", self.text),
      TokenKind::Symbol => write!(f, "symbol '{}'", self.text),
      TokenKind::Identifier => write!(f, "identifier '{}'", self.text),
    }
  }
}

const SYMBOLS: &str = "{}()[].,;+-*/&|<>=~";

const KEYWORDS: [&str; 21] = [
  "class",
  "constructor",
  "function",
  "method",
  "field",
  "static",
  "var",
  "int",
  "char",
  "boolean",
  "void",
  "true",
  "false",
  "null",
  "this",
  "let",
  "do",
  "if",
  "else",
  "while",
  "return",
];

/// Stand-in for a space inside a string constant while words are split.
const SPACE_SENTINEL: char = '@';

fn is_symbol(c: char) -> bool {
  SYMBOLS.contains(c)
}

/// Lex the full input into a flat vector of tokens.
pub fn tokenize(input: &str) -> CompileResult<Vec<Token>> {
  let text = strip_block_comments(input);
  split_words(&text).iter().map(|word| classify(word)).collect()
}

/// Remove `/* ... */` comments. Comments do not nest; the first matching
/// `*/` terminates. An unterminated comment swallows the rest of the text.
fn strip_block_comments(text: &str) -> String {
  let mut out = String::with_capacity(text.len());
  let mut rest = text;
  while let Some(open) = rest.find("/*") {
    out.push_str(&rest[..open]);
    match rest[open + 2..].find("*/") {
      Some(close) => rest = &rest[open + 2 + close + 2..],
      None => return out,
    }
  }
  out.push_str(rest);
  out
}

/// Strip line comments, inject separators, and split into words.
///
/// Separators go around every symbol and quote outside a string constant,
/// and between a digit adjacent to a symbol in either order. Spaces inside
/// a string constant become the sentinel so the literal stays one word.
fn split_words(text: &str) -> Vec<String> {
  let chars: Vec<char> = text.chars().collect();
  let mut out = String::with_capacity(text.len());
  let mut in_string = false;
  let mut i = 0;
  while i < chars.len() {
    let c = chars[i];
    if !in_string && c == '/' && chars.get(i + 1) == Some(&'/') {
      while i < chars.len() && chars[i] != '\n' {
        i += 1;
      }
      // The terminating newline is processed as ordinary whitespace.
      continue;
    }

    if !in_string && (c == '"' || is_symbol(c)) {
      out.push(' ');
    }
    if c == '"' {
      in_string = !in_string;
    }
    if c == ' ' && in_string {
      out.push(SPACE_SENTINEL);
    } else {
      out.push(c);
    }
    if !in_string && let Some(&next) = chars.get(i + 1) {
      if c == '"' || is_symbol(c) {
        out.push(' ');
      }
      if (c.is_ascii_digit() && is_symbol(next)) || (next.is_ascii_digit() && is_symbol(c)) {
        out.push(' ');
      }
    }
    i += 1;
  }
  out.split_whitespace().map(str::to_owned).collect()
}

/// Classify one word. The checks run in a fixed order so a purely numeric
/// word can never be mistaken for an identifier and vice versa.
fn classify(word: &str) -> CompileResult<Token> {
  if word.chars().all(|c| c.is_ascii_digit()) {
    if word.parse::<i32>().is_err() {
      return Err(CompileError::lex(format!(
        "integer constant '{word}' is out of range"
      )));
    }
    return Ok(Token::new(TokenKind::IntegerConstant, word));
  }
  if word.starts_with(|c: char| c.is_ascii_digit()) {
    return Err(CompileError::lex(format!("malformed numeral '{word}'")));
  }
  if word.len() == 1 && word.chars().all(is_symbol) {
    return Ok(Token::new(TokenKind::Symbol, word));
  }
  if KEYWORDS.contains(&word) {
    return Ok(Token::new(TokenKind::Keyword, word));
  }
  if let Some(rest) = word.strip_prefix('"') {
    let Some(inner) = rest.strip_suffix('"') else {
      return Err(CompileError::lex(format!(
        "unterminated string constant {word}"
      )));
    };
    let restored = inner.replace(SPACE_SENTINEL, " ");
    return Ok(Token::new(TokenKind::StringConstant, restored));
  }
  Ok(Token::new(TokenKind::Identifier, word))
}

#[cfg(test)]
mod tests {
  use super::*;

  fn texts(input: &str) -> Vec<String> {
    tokenize(input)
      .unwrap()
      .into_iter()
      .map(|t| t.text)
      .collect()
  }

  #[test]
  fn splits_symbols_without_surrounding_spaces() {
    assert_eq!(texts("let x=a<b;"), ["let", "x", "=", "a", "<", "b", ";"]);
  }

  #[test]
  fn splits_digits_glued_to_symbols() {
    assert_eq!(texts("x[1]=-42;"), ["x", "[", "1", "]", "=", "-", "42", ";"]);
  }

  #[test]
  fn string_constant_with_spaces_is_one_token() {
    let tokens = tokenize("\"int true\";").unwrap();
    assert_eq!(tokens.len(), 2);
    assert_eq!(tokens[0].kind, TokenKind::StringConstant);
    assert_eq!(tokens[0].text, "int true");
    assert!(tokens[1].is(";"));
  }

  #[test]
  fn classifies_keywords_and_identifiers() {
    let tokens = tokenize("class Point").unwrap();
    assert_eq!(tokens[0].kind, TokenKind::Keyword);
    assert_eq!(tokens[1].kind, TokenKind::Identifier);
  }

  #[test]
  fn strips_line_comments() {
    assert_eq!(texts("let // comment with let\nx"), ["let", "x"]);
  }

  #[test]
  fn keeps_double_slash_inside_string_constant() {
    let tokens = tokenize("\"http://x\"").unwrap();
    assert_eq!(tokens.len(), 1);
    assert_eq!(tokens[0].text, "http://x");
  }

  #[test]
  fn strips_block_comments_across_lines() {
    assert_eq!(texts("a /* b\nc */ d"), ["a", "d"]);
  }

  #[test]
  fn unterminated_block_comment_swallows_the_rest() {
    assert_eq!(texts("a /* b c"), ["a"]);
  }

  #[test]
  fn rejects_malformed_numeral() {
    let err = tokenize("12ab").unwrap_err();
    assert!(matches!(err, CompileError::Lex { .. }));
    assert!(err.to_string().contains("12ab"));
  }

  #[test]
  fn rejects_out_of_range_integer() {
    let err = tokenize("99999999999").unwrap_err();
    assert!(matches!(err, CompileError::Lex { .. }));
  }

  #[test]
  fn rejects_unterminated_string_constant() {
    let err = tokenize("\"abc").unwrap_err();
    assert!(matches!(err, CompileError::Lex { .. }));
  }
}
