//! Display templates: literal text with `@Name(value)` macros

use std::fmt::{self, Write};

use crate::cursor::Cursor;
use crate::error::Result;
use crate::format::Format;
use crate::memory::Peek;
use crate::options::ParseOptions;
use crate::state::{Layout, State};
use crate::value::ValueExpr;

use super::Lookup;

/// What a macro name refers to, known once the whole script is parsed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Target {
    Lookup(usize),
    Format(Format),
    Unknown,
}

#[derive(Debug, Clone)]
pub(crate) struct Macro {
    pub name: String,
    /// `Name(expr)` as written, for unknown macros
    pub source: String,
    pub value: ValueExpr,
    pub target: Target,
}

#[derive(Debug, Clone)]
pub(crate) enum Part {
    Text(String),
    Macro(Macro),
}

/// A parsed display line
#[derive(Debug, Clone, Default)]
pub struct Template {
    parts: Vec<Part>,
}

impl Template {
    /// Parse display text. `\` escapes the next character and an unescaped
    /// `//` ends the line.
    pub(crate) fn parse(text: &str, layout: &mut Layout, options: &ParseOptions) -> Result<Self> {
        let mut parts = Vec::new();
        let mut literal = String::new();
        let mut chars = text.char_indices().peekable();

        while let Some((index, c)) = chars.next() {
            match c {
                '\\' => {
                    if let Some((_, escaped)) = chars.next() {
                        literal.push(escaped);
                    }
                }
                '/' if chars.peek().is_some_and(|&(_, next)| next == '/') => break,
                '@' => match split_macro(&text[index + 1..]) {
                    Some((name, expr, consumed)) => {
                        let mut cur = Cursor::new(expr);
                        let value = ValueExpr::parse(&mut cur, layout, options)?;
                        cur.expect_eof()?;

                        if !literal.is_empty() {
                            parts.push(Part::Text(std::mem::take(&mut literal)));
                        }
                        parts.push(Part::Macro(Macro {
                            name: name.to_string(),
                            source: text[index + 1..index + 1 + consumed].to_string(),
                            value,
                            target: Target::Unknown,
                        }));

                        // skip past the closing ')'
                        while chars.peek().is_some_and(|&(i, _)| i <= index + consumed) {
                            chars.next();
                        }
                    }
                    None => literal.push('@'),
                },
                _ => literal.push(c),
            }
        }

        if !literal.is_empty() {
            parts.push(Part::Text(literal));
        }
        Ok(Self { parts })
    }

    /// Bind macro names to lookups and formats
    pub(crate) fn resolve(&mut self, resolve: impl Fn(&str) -> Target) {
        for part in &mut self.parts {
            if let Part::Macro(mac) = part {
                mac.target = resolve(&mac.name);
            }
        }
    }

    /// Names of macros that match neither a lookup nor a format
    pub fn unknown_macros(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().filter_map(|part| match part {
            Part::Macro(mac) if mac.target == Target::Unknown => Some(mac.name.as_str()),
            _ => None,
        })
    }

    pub(crate) fn render<P: Peek + ?Sized, W: Write>(
        &self,
        state: &mut State<'_>,
        peek: &mut P,
        lookups: &[Lookup],
        fps: u32,
        out: &mut W,
    ) -> fmt::Result {
        for part in &self.parts {
            match part {
                Part::Text(text) => out.write_str(text)?,
                Part::Macro(mac) => {
                    let value = mac.value.evaluate(state, peek);
                    match mac.target {
                        Target::Lookup(index) => {
                            let text = lookups.get(index).map_or("", |lookup| lookup.get(value));
                            out.write_str(text)?;
                        }
                        Target::Format(format) => write!(out, "{}", format.display(value, fps))?,
                        Target::Unknown => write!(out, "[Unknown macro]{}", mac.source)?,
                    }
                }
            }
        }
        Ok(())
    }
}

/// Split `Name(expr)...` into name, expr and the byte length of `Name(expr)`
fn split_macro(rest: &str) -> Option<(&str, &str, usize)> {
    let open = rest.find('(')?;
    let name = &rest[..open];
    if name.is_empty() || !name.bytes().all(|c| c.is_ascii_alphanumeric() || c == b'_') {
        return None;
    }
    let close = open + rest[open..].find(')')?;
    Some((name, &rest[open + 1..close], close + 1))
}

/// `fmt::Write` over a fixed buffer that drops whatever does not fit,
/// never splitting a UTF-8 character
pub(crate) struct TruncatingWriter<'a> {
    buf: &'a mut [u8],
    len: usize,
    full: bool,
}

impl<'a> TruncatingWriter<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self {
            buf,
            len: 0,
            full: false,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }
}

impl Write for TruncatingWriter<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        if self.full {
            return Ok(());
        }

        let room = self.buf.len() - self.len;
        let take = if s.len() <= room {
            s.len()
        } else {
            self.full = true;
            (0..=room).rev().find(|&i| s.is_char_boundary(i)).unwrap_or(0)
        };

        self.buf[self.len..self.len + take].copy_from_slice(&s.as_bytes()[..take]);
        self.len += take;
        Ok(())
    }
}
