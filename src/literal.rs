//! Tolerant parser for list-literal text.
//!
//! The credits and metadata files embed lists of records written in a
//! literal syntax that is close to, but not, JSON: strings may be single
//! quoted, `None`/`True`/`False` replace `null`/`true`/`false`, tuples may
//! appear and trailing commas are allowed. Parsed values are represented as
//! `serde_json::Value` so they can be re-encoded as strict JSON directly.

use nom::branch::alt;
use nom::bytes::complete::{tag, take_till1, take_while_m_n};
use nom::character::complete::{anychar, char, digit0, digit1, multispace0, one_of};
use nom::combinator::{all_consuming, map, map_opt, opt, recognize, value};
use nom::multi::{fold_many0, separated_list0};
use nom::sequence::{delimited, preceded, separated_pair, terminated};
use nom::{IResult, Parser};
use serde_json::{Map, Number, Value};
use thiserror::Error;

/// One mapping from a parsed list, keys in source order.
pub type Record = Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LiteralError {
    #[error("invalid literal syntax at byte {offset} near {snippet:?}")]
    Syntax { offset: usize, snippet: String },

    #[error("expected a list of mappings, found {found}")]
    NotAList { found: &'static str },

    #[error("element {index} of the list is {found}, expected a mapping")]
    NotAMapping { index: usize, found: &'static str },
}

impl LiteralError {
    fn from_nom(text: &str, err: nom::Err<nom::error::Error<&str>>) -> Self {
        let rest = match err {
            nom::Err::Error(e) | nom::Err::Failure(e) => e.input,
            nom::Err::Incomplete(_) => "",
        };
        LiteralError::Syntax {
            offset: text.len() - rest.len(),
            snippet: rest.chars().take(24).collect(),
        }
    }
}

/// Parses `text` as a list of mappings, e.g. `[{'id': 1, 'name': 'Action'}]`.
///
/// The whole input must be consumed; anything else (unbalanced brackets,
/// stray characters, a scalar at the top level, a list holding non-mappings)
/// is rejected.
pub fn parse_record_list(text: &str) -> Result<Vec<Record>, LiteralError> {
    let (_, parsed) = all_consuming(padded(literal_value))
        .parse(text)
        .map_err(|e| LiteralError::from_nom(text, e))?;

    match parsed {
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(index, item)| match item {
                Value::Object(record) => Ok(record),
                other => Err(LiteralError::NotAMapping {
                    index,
                    found: kind_of(&other),
                }),
            })
            .collect(),
        other => Err(LiteralError::NotAList {
            found: kind_of(&other),
        }),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "None",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a mapping",
    }
}

fn padded<'a, O, F>(inner: F) -> impl Parser<&'a str, Output = O, Error = nom::error::Error<&'a str>>
where
    F: Parser<&'a str, Output = O, Error = nom::error::Error<&'a str>>,
{
    delimited(multispace0, inner, multispace0)
}

fn comma(input: &str) -> IResult<&str, char> {
    char(',').parse(input)
}

fn literal_value(input: &str) -> IResult<&str, Value> {
    alt((
        map(dict, Value::Object),
        map(sequence('[', ']'), Value::Array),
        map(sequence('(', ')'), Value::Array),
        map(string_literal, Value::String),
        number,
        value(Value::Null, tag("None")),
        value(Value::Bool(true), tag("True")),
        value(Value::Bool(false), tag("False")),
    ))
    .parse(input)
}

/// Comma separated values between `open` and `close`, trailing comma allowed.
fn sequence<'a>(open: char, close: char) -> impl FnMut(&'a str) -> IResult<&'a str, Vec<Value>> {
    move |input| {
        delimited(
            char(open),
            terminated(separated_list0(comma, padded(literal_value)), opt(comma)),
            preceded(multispace0, char(close)),
        )
        .parse(input)
    }
}

fn dict(input: &str) -> IResult<&str, Record> {
    delimited(
        char('{'),
        terminated(separated_list0(comma, padded(dict_entry)), opt(comma)),
        preceded(multispace0, char('}')),
    )
    .map(|entries| entries.into_iter().collect())
    .parse(input)
}

fn dict_entry(input: &str) -> IResult<&str, (String, Value)> {
    separated_pair(map_opt(literal_value, key_text), padded(char(':')), literal_value).parse(input)
}

/// JSON object keys are text; scalar keys are rendered the way a JSON
/// encoder would render them. Containers cannot be keys.
fn key_text(key: Value) -> Option<String> {
    match key {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => Some("null".to_string()),
        Value::Array(_) | Value::Object(_) => None,
    }
}

fn number(input: &str) -> IResult<&str, Value> {
    map_opt(
        recognize((
            opt(one_of("+-")),
            digit1,
            opt((char('.'), digit0)),
            opt((one_of("eE"), opt(one_of("+-")), digit1)),
        )),
        number_value,
    )
    .parse(input)
}

fn number_value(text: &str) -> Option<Value> {
    if text.contains(['.', 'e', 'E']) {
        return text
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number);
    }
    text.parse::<i64>()
        .map(Value::from)
        .ok()
        .or_else(|| text.parse::<u64>().ok().map(Value::from))
}

enum Fragment<'a> {
    Literal(&'a str),
    Escaped(char),
    Unrecognized(char),
}

fn string_literal(input: &str) -> IResult<&str, String> {
    alt((|i| quoted(i, '\''), |i| quoted(i, '"'))).parse(input)
}

fn quoted(input: &str, quote: char) -> IResult<&str, String> {
    let literal = take_till1(move |c: char| c == quote || c == '\\');
    let body = fold_many0(
        alt((map(literal, Fragment::Literal), escape_sequence)),
        String::new,
        |mut acc, fragment| {
            match fragment {
                Fragment::Literal(s) => acc.push_str(s),
                Fragment::Escaped(c) => acc.push(c),
                Fragment::Unrecognized(c) => {
                    acc.push('\\');
                    acc.push(c);
                }
            }
            acc
        },
    );
    delimited(char(quote), body, char(quote)).parse(input)
}

fn escape_sequence(input: &str) -> IResult<&str, Fragment<'_>> {
    preceded(
        char('\\'),
        alt((
            map(
                alt((
                    value('\n', char('n')),
                    value('\t', char('t')),
                    value('\r', char('r')),
                    value('\\', char('\\')),
                    value('\'', char('\'')),
                    value('"', char('"')),
                    value('\u{07}', char('a')),
                    value('\u{08}', char('b')),
                    value('\u{0C}', char('f')),
                    value('\u{0B}', char('v')),
                    value('\0', char('0')),
                    preceded(char('x'), hex_char(2)),
                    preceded(char('u'), hex_char(4)),
                    preceded(char('U'), hex_char(8)),
                )),
                Fragment::Escaped,
            ),
            map(anychar, Fragment::Unrecognized),
        )),
    )
    .parse(input)
}

fn hex_char<'a>(digits: usize) -> impl FnMut(&'a str) -> IResult<&'a str, char> {
    move |input| {
        map_opt(
            take_while_m_n(digits, digits, |c: char| c.is_ascii_hexdigit()),
            |hex: &str| u32::from_str_radix(hex, 16).ok().and_then(char::from_u32),
        )
        .parse(input)
    }
}
