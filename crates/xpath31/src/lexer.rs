//! Splits expression source into [`Token`]s.

use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{char, digit1, one_of, satisfy},
    combinator::{map, recognize},
    sequence::pair,
};

use crate::chars::{is_name_char, is_name_start_char};
use crate::error::TokenizeError;
use crate::token::Token;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lexeme<'a> {
    Space,
    Text(&'a str),
}

fn whitespace(input: &str) -> IResult<&str, Lexeme<'_>> {
    map(
        take_while1(|c: char| matches!(c, '\t' | '\n' | '\r' | ' ')),
        |_| Lexeme::Space,
    )
    .parse(input)
}

/// Operators lexed as maximal runs of their characters.
fn operator_run(input: &str) -> IResult<&str, &str> {
    alt((
        tag("!="),
        tag("!"),
        take_while1(|c: char| c == '.'),
        take_while1(|c: char| c == '/'),
        digit1,
        recognize(pair(char(':'), take_while(|c: char| c == ':' || c == '='))),
        take_while1(|c: char| matches!(c, '<' | '=' | '>')),
        take_while1(|c: char| c == '|'),
    ))
    .parse(input)
}

fn punctuation(input: &str) -> IResult<&str, &str> {
    recognize(one_of("#$%&()*+,-;?@[\\]^`{}~")).parse(input)
}

fn name(input: &str) -> IResult<&str, &str> {
    recognize(pair(satisfy(is_name_start_char), take_while(is_name_char))).parse(input)
}

fn lexeme(input: &str) -> IResult<&str, Lexeme<'_>> {
    alt((
        whitespace,
        map(alt((operator_run, punctuation, name)), Lexeme::Text),
    ))
    .parse(input)
}

/// Reads a quoted literal whose quote is escaped by doubling it.
///
/// Returns the unescaped content and the input after the closing quote.
fn string_literal(input: &str, quote: char) -> Option<(String, &str)> {
    let mut content = String::new();
    let mut rest = &input[quote.len_utf8()..];
    loop {
        let end = rest.find(quote)?;
        content.push_str(&rest[..end]);
        let after = &rest[end + quote.len_utf8()..];
        match after.strip_prefix(quote) {
            Some(remaining) => {
                content.push(quote);
                rest = remaining;
            }
            None => return Some((content, after)),
        }
    }
}

/// Converts source text into a flat token sequence.
///
/// Whitespace runs become one [`Token::SPACE`]. A string literal becomes
/// three tokens: the opening quote, the unescaped content and the closing
/// quote.
pub fn tokenize(source: &str) -> Result<Vec<Token>, TokenizeError> {
    let mut tokens = Vec::new();
    let mut rest = source;
    while let Some(first) = rest.chars().next() {
        let offset = source.len() - rest.len();
        if first == '\'' || first == '"' {
            let (content, after) = string_literal(rest, first)
                .ok_or(TokenizeError::UnterminatedString { quote: first, offset })?;
            let quote = Token::from(&rest[..first.len_utf8()]);
            tokens.push(quote.clone());
            tokens.push(Token::from(content));
            tokens.push(quote);
            rest = after;
            continue;
        }
        let (after, lexeme) = lexeme(rest)
            .map_err(|_| TokenizeError::UnexpectedCharacter { ch: first, offset })?;
        tokens.push(match lexeme {
            Lexeme::Space => Token::space(),
            Lexeme::Text(text) => Token::from(text),
        });
        rest = after;
    }
    log::trace!("tokenized {} bytes into {} tokens", source.len(), tokens.len());
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(source: &str) -> Vec<String> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|t| t.to_string())
            .collect()
    }

    #[test]
    fn test_doubled_quote_escape() {
        assert_eq!(lex("'it''s'"), ["'", "it's", "'"]);
        assert_eq!(lex("\"a\"\"b\""), ["\"", "a\"b", "\""]);
        assert_eq!(lex("''"), ["'", "", "'"]);
        assert_eq!(lex("'say \"hi\"'"), ["'", "say \"hi\"", "'"]);
    }

    #[test]
    fn test_whitespace_collapses() {
        assert_eq!(lex("a \t\r\n  b"), ["a", " ", "b"]);
        assert_eq!(lex(" 1 "), [" ", "1", " "]);
    }

    #[test]
    fn test_operator_runs() {
        assert_eq!(lex("x!=y"), ["x", "!=", "y"]);
        assert_eq!(lex("a!b"), ["a", "!", "b"]);
        assert_eq!(lex("..//."), ["..", "//", "."]);
        assert_eq!(lex("a<<b>=c"), ["a", "<<", "b", ">=", "c"]);
        assert_eq!(lex("f=>g"), ["f", "=>", "g"]);
        assert_eq!(lex("a||b|c"), ["a", "||", "b", "|", "c"]);
        assert_eq!(lex("$x:=1"), ["$", "x", ":=", "1"]);
        assert_eq!(lex("child::a"), ["child", "::", "a"]);
    }

    #[test]
    fn test_names_and_numbers() {
        assert_eq!(lex("fn:concat"), ["fn", ":", "concat"]);
        assert_eq!(lex("_private-name.x"), ["_private-name.x"]);
        assert_eq!(lex("1.5e-3"), ["1", ".", "5", "e-3"]);
        assert_eq!(lex("12E+4"), ["12", "E", "+", "4"]);
        assert_eq!(lex("élément"), ["élément"]);
    }

    #[test]
    fn test_braces_and_punctuation() {
        assert_eq!(
            lex("Q{http://a}b"),
            ["Q", "{", "http", ":", "//", "a", "}", "b"]
        );
        assert_eq!(lex("map{1:2}"), ["map", "{", "1", ":", "2", "}"]);
        assert_eq!(lex("f#2"), ["f", "#", "2"]);
        assert_eq!(lex("$a?*"), ["$", "a", "?", "*"]);
    }

    #[test]
    fn test_unterminated_string() {
        assert_eq!(
            tokenize("1 + 'abc"),
            Err(TokenizeError::UnterminatedString {
                quote: '\'',
                offset: 4
            })
        );
        assert_eq!(tokenize("\"a\"\"").unwrap_err().code(), "tokenize-strlit");
    }

    #[test]
    fn test_unexpected_character() {
        assert_eq!(
            tokenize("1 ¬ 2"),
            Err(TokenizeError::UnexpectedCharacter { ch: '¬', offset: 2 })
        );
    }
}
