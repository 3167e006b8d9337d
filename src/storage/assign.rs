//! Assign filters.
//!
//! Apply rules and applied service sets carry an assign filter in the
//! Director's URL-style syntax:
//!
//! ```text
//! host.vars.os=%22Linux%22&(host.zone=master|!host.address=*)
//! ```
//!
//! Columns and values may be percent-encoded; values may be double quoted.
//! `&` binds tighter than `|`, `!` negates the following term. `=` on a list
//! property means "contains", and `*` in a value is a wildcard. Comparison
//! ignores case.

use serde_json::Value;

use crate::error::{Error, Result};

/// A parsed assign filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssignFilter {
    Match { column: String, expected: String },
    NotMatch { column: String, expected: String },
    Not(Box<AssignFilter>),
    And(Vec<AssignFilter>),
    Or(Vec<AssignFilter>),
}

impl AssignFilter {
    /// Parse a filter string.
    ///
    /// # Errors
    ///
    /// Returns `InvalidFilter` for unbalanced parentheses, missing operators
    /// or trailing input.
    pub fn parse(filter: &str) -> Result<Self> {
        let mut parser = Parser {
            source: filter,
            chars: filter.chars().collect(),
            pos: 0,
        };
        let parsed = parser.or_expr()?;
        if parser.pos < parser.chars.len() {
            return Err(parser.error(format!("unexpected '{}'", parser.chars[parser.pos])));
        }
        Ok(parsed)
    }

    /// Evaluate against a host context.
    ///
    /// The context is a map of the host's resolved properties; columns are
    /// looked up with an optional `host.` prefix and dotted paths descend
    /// into nested maps (`host.vars.os`).
    #[must_use]
    pub fn matches(&self, context: &Value) -> bool {
        match self {
            Self::Match { column, expected } => value_matches(lookup(context, column), expected),
            Self::NotMatch { column, expected } => {
                !value_matches(lookup(context, column), expected)
            }
            Self::Not(inner) => !inner.matches(context),
            Self::And(all) => all.iter().all(|f| f.matches(context)),
            Self::Or(any) => any.iter().any(|f| f.matches(context)),
        }
    }
}

struct Parser<'a> {
    source: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl Parser<'_> {
    fn error(&self, message: impl Into<String>) -> Error {
        Error::InvalidFilter {
            filter: self.source.to_string(),
            message: message.into(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn or_expr(&mut self) -> Result<AssignFilter> {
        let mut terms = vec![self.and_expr()?];
        while self.peek() == Some('|') {
            self.pos += 1;
            terms.push(self.and_expr()?);
        }
        Ok(collapse(terms, AssignFilter::Or))
    }

    fn and_expr(&mut self) -> Result<AssignFilter> {
        let mut terms = vec![self.unary()?];
        while self.peek() == Some('&') {
            self.pos += 1;
            terms.push(self.unary()?);
        }
        Ok(collapse(terms, AssignFilter::And))
    }

    fn unary(&mut self) -> Result<AssignFilter> {
        match self.peek() {
            Some('!') => {
                self.pos += 1;
                Ok(AssignFilter::Not(Box::new(self.unary()?)))
            }
            Some('(') => {
                self.pos += 1;
                let inner = self.or_expr()?;
                if self.peek() != Some(')') {
                    return Err(self.error("missing ')'"));
                }
                self.pos += 1;
                Ok(inner)
            }
            Some(_) => self.comparison(),
            None => Err(self.error("unexpected end of filter")),
        }
    }

    fn comparison(&mut self) -> Result<AssignFilter> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if matches!(c, '=' | '!' | '&' | '|' | '(' | ')') {
                break;
            }
            self.pos += 1;
        }
        let column = percent_decode(&self.chars[start..self.pos].iter().collect::<String>());
        let column = column.trim().to_string();
        if column.is_empty() {
            return Err(self.error(format!("expected a column at position {start}")));
        }

        let negated = match (self.peek(), self.chars.get(self.pos + 1)) {
            (Some('='), _) => {
                self.pos += 1;
                false
            }
            (Some('!'), Some('=')) => {
                self.pos += 2;
                true
            }
            _ => return Err(self.error(format!("expected '=' or '!=' after '{column}'"))),
        };

        let expected = self.value()?;
        Ok(if negated {
            AssignFilter::NotMatch { column, expected }
        } else {
            AssignFilter::Match { column, expected }
        })
    }

    fn value(&mut self) -> Result<String> {
        let start = self.pos;
        let mut quoted = false;
        while let Some(c) = self.peek() {
            if c == '"' {
                quoted = !quoted;
            } else if !quoted && matches!(c, '&' | '|' | ')') {
                break;
            }
            self.pos += 1;
        }
        if quoted {
            return Err(self.error("unterminated quote"));
        }

        let raw = percent_decode(&self.chars[start..self.pos].iter().collect::<String>());
        Ok(unquote(raw.trim()))
    }
}

fn collapse(mut terms: Vec<AssignFilter>, wrap: fn(Vec<AssignFilter>) -> AssignFilter) -> AssignFilter {
    if terms.len() == 1 {
        terms.remove(0)
    } else {
        wrap(terms)
    }
}

fn percent_decode(raw: &str) -> String {
    let bytes = raw.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hex = (hex_digit(bytes[i + 1]), hex_digit(bytes[i + 2]));
            if let (Some(high), Some(low)) = hex {
                out.push((high << 4) | low);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

const fn hex_digit(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

fn unquote(raw: &str) -> String {
    match raw.strip_prefix('"').and_then(|s| s.strip_suffix('"')) {
        Some(inner) => inner.replace("\\\"", "\""),
        None => raw.to_string(),
    }
}

fn lookup<'v>(context: &'v Value, column: &str) -> Option<&'v Value> {
    let path = column.strip_prefix("host.").unwrap_or(column);
    if let Some(value) = context.get(path) {
        return Some(value);
    }
    path.split('.').try_fold(context, |node, key| node.get(key))
}

fn value_matches(actual: Option<&Value>, expected: &str) -> bool {
    match actual {
        None | Some(Value::Null) => false,
        Some(Value::Array(items)) => items.iter().any(|item| value_matches(Some(item), expected)),
        Some(Value::String(s)) => text_matches(s, expected),
        Some(Value::Bool(b)) => text_matches(if *b { "true" } else { "false" }, expected),
        Some(Value::Number(n)) => text_matches(&n.to_string(), expected),
        Some(Value::Object(_)) => expected == "*",
    }
}

fn text_matches(actual: &str, expected: &str) -> bool {
    let actual = actual.to_lowercase();
    let expected = expected.to_lowercase();
    if expected.contains('*') {
        wildcard_matches(&actual, &expected)
    } else {
        actual == expected
    }
}

/// Glob match where `*` matches any (possibly empty) run of characters.
fn wildcard_matches(text: &str, pattern: &str) -> bool {
    let parts: Vec<&str> = pattern.split('*').collect();
    let (first, rest) = match parts.split_first() {
        Some(split) => split,
        None => return text.is_empty(),
    };
    let Some(mut remaining) = text.strip_prefix(first) else {
        return false;
    };

    let Some((last, middle)) = rest.split_last() else {
        return remaining.is_empty();
    };
    for part in middle {
        match remaining.find(part) {
            Some(at) => remaining = &remaining[at + part.len()..],
            None => return false,
        }
    }
    remaining.len() >= last.len() && remaining.ends_with(last)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn host() -> Value {
        json!({
            "name": "web1",
            "object_name": "web1",
            "address": "10.0.0.1",
            "zone": "master",
            "templates": ["generic-host", "linux-host"],
            "vars": {"os": "Linux", "roles": ["web", "db"], "tier": 2}
        })
    }

    fn check(filter: &str) -> bool {
        AssignFilter::parse(filter).unwrap().matches(&host())
    }

    #[test]
    fn test_simple_equality() {
        assert!(check("host.name=web1"));
        assert!(check("host.vars.os=linux"));
        assert!(!check("host.vars.os=Windows"));
        assert!(check("host.vars.tier=2"));
    }

    #[test]
    fn test_quoted_and_encoded_values() {
        assert!(check("host.vars.os=%22Linux%22"));
        assert!(check("host.vars.os=\"Linux\""));
        assert!(check("host%2Evars%2Eos=Linux"));
    }

    #[test]
    fn test_list_contains() {
        assert!(check("host.templates=linux-host"));
        assert!(check("host.vars.roles=db"));
        assert!(!check("host.vars.roles=mail"));
    }

    #[test]
    fn test_wildcards() {
        assert!(check("host.address=*"));
        assert!(check("host.address=10.*"));
        assert!(check("host.name=*b*"));
        assert!(!check("host.address6=*"));
        assert!(!check("host.name=*x"));
    }

    #[test]
    fn test_boolean_operators() {
        assert!(check("host.zone=master&host.vars.os=Linux"));
        assert!(!check("host.zone=satellite&host.vars.os=Linux"));
        assert!(check("host.zone=satellite|host.vars.os=Linux"));
        assert!(check("!host.zone=satellite"));
        assert!(check("host.zone!=satellite"));
        assert!(check("(host.zone=satellite|host.name=web1)&host.vars.tier=2"));
    }

    #[test]
    fn test_and_binds_tighter_than_or() {
        let parsed = AssignFilter::parse("a=1|b=2&c=3").unwrap();
        assert!(matches!(parsed, AssignFilter::Or(ref terms) if terms.len() == 2));
    }

    #[test]
    fn test_quoted_value_may_contain_operators() {
        let ctx = json!({"vars": {"motto": "a&b|c"}});
        let parsed = AssignFilter::parse("host.vars.motto=\"a&b|c\"").unwrap();
        assert!(parsed.matches(&ctx));
    }

    #[test]
    fn test_malformed_filters() {
        for bad in ["", "host.name", "(host.name=a", "host.name=a)", "=a", "host.name=\"a"] {
            let err = AssignFilter::parse(bad).unwrap_err();
            assert!(matches!(err, Error::InvalidFilter { .. }), "accepted {bad:?}");
        }
    }
}
