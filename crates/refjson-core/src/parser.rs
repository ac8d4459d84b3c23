//! Recursive-descent parser for strict JSON and dynamic path
//! expressions.
//!
//! One parser serves both modes. Strict mode accepts RFC-shaped JSON
//! narrowed to `i32`/`f32` numbers (plus `//` line comments). Dynamic
//! mode adds the path-expression atoms (`@`, `$`, bare identifiers,
//! function calls, parenthesized sub-expressions) and tail accessors
//! (`.key`, `[expr]`, `[e1,…,en]`, `{path, …}`), building reference
//! nodes and simplifying them opportunistically as context becomes
//! available, so most references collapse to plain values before
//! parsing finishes.

use std::rc::Rc;

use crate::error::{RefJsonError, Result};
use crate::options::EvalOptions;
use crate::reference::{RefNode, SetKind};
use crate::scanner::Scanner;
use crate::value::Value;

/// The parser: a scanner plus the evaluation options threaded into
/// the reference engine during opportunistic simplification.
pub struct Parser {
    scanner: Scanner,
    options: EvalOptions,
}

impl Parser {
    /// Parser with default options.
    pub fn new(scanner: Scanner) -> Self {
        Self::with_options(scanner, EvalOptions::default())
    }

    /// Parser with explicit evaluation options.
    pub fn with_options(scanner: Scanner, options: EvalOptions) -> Self {
        Parser { scanner, options }
    }

    /// Parse one complete expression. Trailing nonessential input is
    /// consumed; anything else left over is an error, as is empty
    /// input.
    pub fn parse_all(&mut self, dynamic: bool) -> Result<Value> {
        let value = self.parse_value(dynamic)?;
        self.scanner.nonessential();
        if self.scanner.valid() {
            return Err(self.error_at("unexpected trailing characters"));
        }
        Ok(value)
    }

    fn error_at(&self, message: impl Into<String>) -> RefJsonError {
        RefJsonError::Parse {
            line: self.scanner.line() + 1,
            column: self.scanner.column() + 1,
            message: message.into(),
        }
    }

    fn parse_value(&mut self, dynamic: bool) -> Result<Value> {
        self.scanner.nonessential();
        let Some(current) = self.scanner.peek() else {
            return Err(self.error_at("unexpected end of input"));
        };
        let value = match current {
            b'@' if dynamic => {
                self.scanner.next();
                RefNode::local().into_value()
            }
            b'$' if dynamic => {
                self.scanner.next();
                RefNode::root().into_value()
            }
            c if c.is_ascii_alphabetic() || c == b'_' => self.parse_keyword_value(dynamic)?,
            b'-' | b'0'..=b'9' => self.parse_number_value()?,
            b'"' => Value::string(self.parse_string()?),
            b'[' => {
                self.scanner.next();
                let mut items = Vec::new();
                self.parse_collection(b']', |parser| {
                    items.push(parser.parse_value(dynamic)?);
                    Ok(())
                })?;
                let value = Value::array(items);
                if dynamic {
                    value.bind_children(&self.options)?;
                }
                value.touch();
                value
            }
            b'{' => {
                self.scanner.next();
                let mut entries = Vec::new();
                self.parse_collection(b'}', |parser| {
                    if parser.scanner.peek() != Some(b'"') {
                        return Err(parser.error_at("expected string key"));
                    }
                    let key = parser.parse_string()?;
                    if !parser.scanner.separator(b':') {
                        return Err(parser.error_at("expected `:` after object key"));
                    }
                    let value = parser.parse_value(dynamic)?;
                    entries.push((key, value));
                    Ok(())
                })?;
                let value = Value::object(entries)?;
                if dynamic {
                    value.bind_children(&self.options)?;
                }
                value.touch();
                value
            }
            b'(' if dynamic => {
                self.scanner.next();
                let inner = self.parse_value(true)?;
                self.scanner.nonessential();
                if self.scanner.peek() != Some(b')') {
                    return Err(self.error_at("expected `)`"));
                }
                self.scanner.next();
                inner
            }
            c => return Err(self.error_at(format!("unexpected character `{}`", c as char))),
        };
        if dynamic {
            self.parse_trailing(value)
        } else {
            Ok(value)
        }
    }

    /// Comma-separated elements up to `halt`. A trailing comma and an
    /// unclosed group are errors.
    fn parse_collection(
        &mut self,
        halt: u8,
        mut element: impl FnMut(&mut Self) -> Result<()>,
    ) -> Result<()> {
        self.scanner.nonessential();
        let mut closed = true;
        while self.scanner.valid() && self.scanner.peek() != Some(halt) {
            element(self)?;
            closed = !self.scanner.separator(b',');
        }
        if !closed {
            return Err(self.error_at("expected another item after `,`"));
        }
        if self.scanner.peek() != Some(halt) {
            return Err(self.error_at(format!("expected `{}`", halt as char)));
        }
        self.scanner.next();
        Ok(())
    }

    fn parse_keyword(&mut self) -> String {
        let mut keyword = String::new();
        while let Some(c) = self.scanner.peek() {
            if c.is_ascii_alphanumeric() || c == b'_' {
                keyword.push(c as char);
                self.scanner.next();
            } else {
                break;
            }
        }
        keyword
    }

    fn parse_keyword_value(&mut self, dynamic: bool) -> Result<Value> {
        let keyword = self.parse_keyword();
        match keyword.as_str() {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            "null" => Ok(Value::Null),
            _ if dynamic => {
                if self.scanner.peek() == Some(b'(') {
                    self.scanner.next();
                    let args = self.parse_arguments()?;
                    Ok(RefNode::function(keyword, args)?.into_value())
                } else {
                    // A bare identifier is sugar for `$.IDENT`.
                    let reference = RefNode::root();
                    reference.emplace_back(Value::string(&keyword), &self.options)?;
                    Ok(reference.into_value())
                }
            }
            _ => Err(self.error_at(format!("unexpected keyword `{keyword}`"))),
        }
    }

    fn parse_arguments(&mut self) -> Result<Vec<Value>> {
        let mut args = Vec::new();
        self.parse_collection(b')', |parser| {
            args.push(parser.parse_value(true)?);
            Ok(())
        })?;
        Ok(args)
    }

    fn parse_number_value(&mut self) -> Result<Value> {
        let (text, is_real) = self.parse_number()?;
        if is_real {
            Value::real_from_text(&text)
                .map_err(|_| self.error_at(format!("real literal `{text}` is out of range")))
        } else {
            text.parse::<i32>()
                .map(Value::Int)
                .map_err(|_| self.error_at(format!("integer literal `{text}` is out of range")))
        }
    }

    /// Number grammar: optional `-`; a single `0` or nonzero-led
    /// digits; an optional fraction and exponent, either of which
    /// makes the number a real. The text is returned for round-trip
    /// preservation.
    fn parse_number(&mut self) -> Result<(String, bool)> {
        let mut number = String::new();
        let mut is_real = false;
        if self.scanner.peek() == Some(b'-') {
            number.push('-');
            self.scanner.next();
        }
        match self.scanner.peek() {
            Some(b'0') => {
                number.push('0');
                self.scanner.next();
                if self.scanner.peek().is_some_and(|c| c.is_ascii_digit()) {
                    return Err(self.error_at("leading zeros are not allowed"));
                }
            }
            Some(c) if c.is_ascii_digit() => {
                while let Some(c) = self.scanner.peek() {
                    if !c.is_ascii_digit() {
                        break;
                    }
                    number.push(c as char);
                    self.scanner.next();
                }
            }
            _ => return Err(self.error_at("expected digit")),
        }
        if self.scanner.peek() == Some(b'.') {
            is_real = true;
            number.push('.');
            self.scanner.next();
            if !self.scanner.peek().is_some_and(|c| c.is_ascii_digit()) {
                return Err(self.error_at("expected digit after decimal point"));
            }
            while let Some(c) = self.scanner.peek() {
                if !c.is_ascii_digit() {
                    break;
                }
                number.push(c as char);
                self.scanner.next();
            }
        }
        if matches!(self.scanner.peek(), Some(b'e' | b'E')) {
            is_real = true;
            if let Some(c) = self.scanner.get() {
                number.push(c as char);
            }
            if matches!(self.scanner.peek(), Some(b'+' | b'-')) {
                if let Some(c) = self.scanner.get() {
                    number.push(c as char);
                }
            }
            if !self.scanner.peek().is_some_and(|c| c.is_ascii_digit()) {
                return Err(self.error_at("expected digit after exponent"));
            }
            while let Some(c) = self.scanner.peek() {
                if !c.is_ascii_digit() {
                    break;
                }
                number.push(c as char);
                self.scanner.next();
            }
        }
        Ok((number, is_real))
    }

    /// String body after the opening quote: the eight named escapes,
    /// `\uXXXX` with surrogate pairs, no raw control characters, and
    /// the result must be valid UTF-8.
    fn parse_string(&mut self) -> Result<String> {
        self.scanner.next();
        let mut bytes: Vec<u8> = Vec::new();
        loop {
            let Some(current) = self.scanner.peek() else {
                return Err(self.error_at("unterminated string"));
            };
            match current {
                b'"' => break,
                b'\\' => {
                    self.scanner.next();
                    self.parse_escape(&mut bytes)?;
                }
                c if c < 0x20 => return Err(self.error_at("control character in string")),
                c => {
                    bytes.push(c);
                    self.scanner.next();
                }
            }
        }
        self.scanner.next();
        String::from_utf8(bytes).map_err(|_| self.error_at("string is not valid UTF-8"))
    }

    fn parse_escape(&mut self, out: &mut Vec<u8>) -> Result<()> {
        let Some(escape) = self.scanner.get() else {
            return Err(self.error_at("unterminated string"));
        };
        let decoded = match escape {
            b'"' => '"',
            b'\\' => '\\',
            b'/' => '/',
            b'b' => '\u{8}',
            b'f' => '\u{c}',
            b'n' => '\n',
            b'r' => '\r',
            b't' => '\t',
            b'u' => return self.parse_unicode_escape(out),
            _ => return Err(self.error_at("invalid escape sequence in string")),
        };
        push_char(out, decoded);
        Ok(())
    }

    fn parse_unicode_escape(&mut self, out: &mut Vec<u8>) -> Result<()> {
        let unit = self.parse_hex4()?;
        let decoded = if (0xD800..=0xDBFF).contains(&unit) {
            // A high surrogate must be followed by an escaped low half.
            if self.scanner.get() != Some(b'\\') || self.scanner.get() != Some(b'u') {
                return Err(self.error_at("unpaired surrogate in unicode escape"));
            }
            let low = self.parse_hex4()?;
            if !(0xDC00..=0xDFFF).contains(&low) {
                return Err(self.error_at("unpaired surrogate in unicode escape"));
            }
            let combined = 0x10000 + ((unit as u32 - 0xD800) << 10) + (low as u32 - 0xDC00);
            char::from_u32(combined)
                .ok_or_else(|| self.error_at("invalid unicode escape"))?
        } else if (0xDC00..=0xDFFF).contains(&unit) {
            return Err(self.error_at("unpaired surrogate in unicode escape"));
        } else {
            char::from_u32(unit as u32).ok_or_else(|| self.error_at("invalid unicode escape"))?
        };
        push_char(out, decoded);
        Ok(())
    }

    fn parse_hex4(&mut self) -> Result<u16> {
        let mut value: u16 = 0;
        for _ in 0..4 {
            let Some(c) = self.scanner.get() else {
                return Err(self.error_at("truncated unicode escape"));
            };
            let digit = match c {
                b'0'..=b'9' => c - b'0',
                b'a'..=b'f' => c - b'a' + 10,
                b'A'..=b'F' => c - b'A' + 10,
                _ => return Err(self.error_at("invalid unicode escape")),
            };
            value = (value << 4) | digit as u16;
        }
        Ok(value)
    }

    /// One tail accessor, if the input continues with one.
    ///
    /// `.key` is a literal string key (or a function call when a `(`
    /// follows immediately); `[…]` with one expression is that
    /// expression, with several it becomes an accessor-set of
    /// single-accessor paths; `{…}` is a set of non-empty paths.
    fn parse_accessor(&mut self) -> Result<Option<Value>> {
        self.scanner.nonessential();
        match self.scanner.peek() {
            Some(b'.') => {
                self.scanner.next();
                if !self
                    .scanner
                    .peek()
                    .is_some_and(|c| c.is_ascii_alphabetic() || c == b'_')
                {
                    return Err(self.error_at("expected identifier after `.`"));
                }
                let keyword = self.parse_keyword();
                if self.scanner.peek() == Some(b'(') {
                    self.scanner.next();
                    let args = self.parse_arguments()?;
                    Ok(Some(RefNode::function(keyword, args)?.into_value()))
                } else {
                    Ok(Some(Value::string(&keyword)))
                }
            }
            Some(b'[') => {
                self.scanner.next();
                let mut exprs = Vec::new();
                self.parse_collection(b']', |parser| {
                    exprs.push(parser.parse_value(true)?);
                    Ok(())
                })?;
                if exprs.len() > 1 {
                    let options = self.options;
                    let elements = exprs
                        .into_iter()
                        .map(|key| {
                            let element = RefNode::accessor();
                            element.emplace_back(key, &options)?;
                            Ok(element.into_value())
                        })
                        .collect::<Result<Vec<_>>>()?;
                    Ok(Some(RefNode::set(elements, SetKind::Accessor).into_value()))
                } else {
                    match exprs.pop() {
                        Some(expr) => Ok(Some(expr)),
                        None => Err(self.error_at("expected expression in accessor")),
                    }
                }
            }
            Some(b'{') => {
                self.scanner.next();
                let mut paths = Vec::new();
                self.parse_collection(b'}', |parser| {
                    let element = RefNode::accessor();
                    parser.parse_tail(&element)?;
                    if element.length() == 0 {
                        return Err(parser.error_at("expected path"));
                    }
                    paths.push(element.into_value());
                    Ok(())
                })?;
                Ok(Some(RefNode::set(paths, SetKind::Accessor).into_value()))
            }
            _ => Ok(None),
        }
    }

    fn parse_tail(&mut self, reference: &Rc<RefNode>) -> Result<()> {
        while let Some(accessor) = self.parse_accessor()? {
            reference.emplace_back(accessor, &self.options)?;
        }
        Ok(())
    }

    /// Absorb tail accessors after a dynamic atom, wrapping the atom
    /// into a path reference if it is not one already, and return the
    /// reduced value.
    fn parse_trailing(&mut self, value: Value) -> Result<Value> {
        let reference = match value {
            Value::Ref(node) => node,
            other => RefNode::with_head(other),
        };
        self.parse_tail(&reference)?;
        reference.value()
    }
}

fn push_char(out: &mut Vec<u8>, ch: char) {
    let mut buffer = [0u8; 4];
    out.extend_from_slice(ch.encode_utf8(&mut buffer).as_bytes());
}
