//! Reader for Sphinx `searchindex.js` files.
//!
//! The file is a single `Search.setIndex({...})` call whose argument is a JS
//! object literal. Older Sphinx releases write bare identifier keys
//! (`docnames:[...]`, `A:[7,16]`), which are quoted here before the body is
//! handed to serde.

use crate::error::{Error, Result};
use crate::raw::RawIndex;

const WRAPPER: &str = "Search.setIndex(";

/// Parse the contents of a `searchindex.js` file. A bare object literal
/// without the wrapper call is accepted too.
pub fn parse(text: &str) -> Result<RawIndex> {
    let body = strip_wrapper(text)?;
    RawIndex::from_json_str(&quote_bare_keys(body))
}

fn strip_wrapper(text: &str) -> Result<&str> {
    let trimmed = text.trim();
    let trimmed = trimmed.strip_suffix(';').unwrap_or(trimmed).trim_end();
    match trimmed.strip_prefix(WRAPPER) {
        Some(rest) => rest
            .strip_suffix(')')
            .ok_or_else(|| Error::malformed("unterminated `Search.setIndex(` call")),
        None if trimmed.starts_with('{') => Ok(trimmed),
        None => Err(Error::malformed("expected `Search.setIndex({...})`")),
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

/// Wrap every unquoted object key in double quotes. String literals are
/// copied verbatim; anything that is not followed by `:` is left alone.
fn quote_bare_keys(src: &str) -> String {
    let mut out = String::with_capacity(src.len() + src.len() / 8);
    let mut chars = src.char_indices().peekable();
    let mut in_string = false;
    let mut escaped = false;
    let mut expect_key = false;

    while let Some((i, c)) = chars.next() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => {
                in_string = true;
                expect_key = false;
                out.push(c);
            }
            '{' | ',' => {
                expect_key = true;
                out.push(c);
            }
            c if c.is_whitespace() => out.push(c),
            c if expect_key && is_ident_char(c) => {
                let mut end = i + c.len_utf8();
                while let Some(&(j, d)) = chars.peek() {
                    if !is_ident_char(d) {
                        break;
                    }
                    end = j + d.len_utf8();
                    chars.next();
                }
                let ident = &src[i..end];
                if src[end..].trim_start().starts_with(':') {
                    out.push('"');
                    out.push_str(ident);
                    out.push('"');
                } else {
                    out.push_str(ident);
                }
                expect_key = false;
            }
            _ => {
                expect_key = false;
                out.push(c);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"Search.setIndex({docnames:["Analysis/Poultry analysis details","intro"],envversion:{"sphinx.domains.c":2,sphinx:56},filenames:["Analysis\\Poultry analysis details.md","intro.md"],objects:{},objnames:{},objtypes:{},terms:{"2022":[0,1],"case":1,The:[0,1],feed:0,"20annual_beijing_china":[]},titles:["Poultry analysis details","Welcome"],titleterms:{analysi:0,detail:0,poultri:0,welcom:1}})"#;

    #[test]
    fn parses_sphinx_literal() {
        let raw = parse(SAMPLE).unwrap();
        assert_eq!(raw.docnames.as_ref().unwrap().len(), 2);
        assert_eq!(raw.filenames.as_ref().unwrap()[0], "Analysis\\Poultry analysis details.md");
        let terms = raw.terms.as_ref().unwrap();
        assert!(terms.contains_key("The"));
        assert!(terms.contains_key("2022"));
        assert_eq!(raw.titleterms.as_ref().unwrap().len(), 4);
    }

    #[test]
    fn quoting_leaves_strings_and_values_alone() {
        let src = r#"{a:"x, b: y",n:[1,2,true],"q":{c:-1}}"#;
        assert_eq!(quote_bare_keys(src), r#"{"a":"x, b: y","n":[1,2,true],"q":{"c":-1}}"#);
    }

    #[test]
    fn escaped_quotes_do_not_end_strings() {
        let src = r#"{t:["say \"k:\" now"]}"#;
        assert_eq!(quote_bare_keys(src), r#"{"t":["say \"k:\" now"]}"#);
    }

    #[test]
    fn numeric_keys_are_quoted() {
        assert_eq!(quote_bare_keys(r#"{0:"py:module"}"#), r#"{"0":"py:module"}"#);
    }

    #[test]
    fn bare_object_and_trailing_semicolon_are_accepted() {
        assert!(parse(r#"{"docnames":[]}"#).is_ok());
        assert!(parse("Search.setIndex({docnames:[]});\n").is_ok());
    }

    #[test]
    fn garbage_is_malformed() {
        assert!(matches!(parse("var x = 1;"), Err(Error::MalformedIndex(_))));
        assert!(matches!(parse("Search.setIndex({docnames:["), Err(Error::MalformedIndex(_))));
    }
}
