//! Declaration value tokens, read with cssparser.

use cssparser::Parser;
use cssparser::ParserInput;
use cssparser::ToCss;
use cssparser::Token;

/// A top-level component of a declaration value
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ValueToken {
  /// An identifier such as `from` or `global`
  Word(String),
  /// A quoted string, without its quotes
  String(String),
  /// The argument of an unquoted `url()`
  Url(String),
  /// A function call, by name. Its arguments are skipped.
  Function(String),
  /// Anything else, serialized
  Other(String),
}

/// Split `value` into its top-level tokens, skipping whitespace and comments
pub fn tokenize(value: &str) -> Vec<ValueToken> {
  let mut input = ParserInput::new(value);
  let mut parser = Parser::new(&mut input);
  let mut tokens = Vec::new();

  while let Ok(token) = parser.next() {
    tokens.push(match token {
      Token::Ident(ident) => ValueToken::Word(ident.to_string()),
      Token::QuotedString(string) => ValueToken::String(string.to_string()),
      Token::UnquotedUrl(url) => ValueToken::Url(url.to_string()),
      Token::Function(name) => ValueToken::Function(name.to_string()),
      other => ValueToken::Other(other.to_css_string()),
    });
  }

  tokens
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn reads_words_and_strings() {
    assert_eq!(
      tokenize("a  b from \"./b\" /* c */"),
      vec![
        ValueToken::Word(String::from("a")),
        ValueToken::Word(String::from("b")),
        ValueToken::Word(String::from("from")),
        ValueToken::String(String::from("./b")),
      ]
    );
  }

  #[test]
  fn skips_function_arguments() {
    assert_eq!(
      tokenize("url(./x.png) calc(1px + 2px) 'y'"),
      vec![
        ValueToken::Url(String::from("./x.png")),
        ValueToken::Function(String::from("calc")),
        ValueToken::String(String::from("y")),
      ]
    );
  }

  #[test]
  fn keeps_other_tokens_as_written() {
    assert_eq!(
      tokenize("1px, #fff"),
      vec![
        ValueToken::Other(String::from("1px")),
        ValueToken::Other(String::from(",")),
        ValueToken::Other(String::from("#fff")),
      ]
    );
  }
}
