//! Value expressions: `term_term$term_term`
//!
//! Terms joined by `_` are summed into a clause; clauses joined by `$`
//! compete and the largest sum wins.

use crate::cursor::Cursor;
use crate::error::{Error, Result};
use crate::memory::Peek;
use crate::options::ParseOptions;
use crate::state::{self, Definition, Handle, Layout, State};
use crate::term::Term;

/// A parsed value expression, without state of its own
#[derive(Debug, Clone)]
pub struct ValueExpr {
    clauses: Vec<Vec<Term>>,
}

impl ValueExpr {
    pub(crate) fn parse(
        cur: &mut Cursor<'_>,
        layout: &mut Layout,
        options: &ParseOptions,
    ) -> Result<Self> {
        if cur.is_eof() {
            return Err(Error::UnexpectedEnd);
        }

        let mut clauses = Vec::new();
        loop {
            let mut terms = vec![Term::parse(cur, layout, options)?];
            while cur.eat(b'_') {
                terms.push(Term::parse(cur, layout, options)?);
            }
            clauses.push(terms);

            if !cur.eat(b'$') {
                return Ok(Self { clauses });
            }
        }
    }

    pub fn clauses(&self) -> &[Vec<Term>] {
        &self.clauses
    }

    pub(crate) fn evaluate<P: Peek + ?Sized>(&self, state: &mut State<'_>, peek: &mut P) -> u32 {
        // every clause runs so delta caches advance together
        self.clauses
            .iter()
            .map(|terms| {
                terms
                    .iter()
                    .fold(0u32, |sum, term| sum.wrapping_add(term.evaluate(state, peek)))
            })
            .fold(None, |max: Option<u32>, sum| Some(max.map_or(sum, |max| max.max(sum))))
            .unwrap_or(0)
    }
}

/// Standalone value definition
#[derive(Debug)]
pub struct ValueDef {
    expr: ValueExpr,
    len: usize,
}

impl ValueDef {
    pub fn expr(&self) -> &ValueExpr {
        &self.expr
    }
}

impl Definition for ValueDef {
    const MAGIC: [u8; 4] = *b"CVAL";

    fn parse_with(script: &str, options: &ParseOptions) -> Result<Self> {
        let mut layout = Layout::new();
        let mut cur = Cursor::new(script);
        let expr = ValueExpr::parse(&mut cur, &mut layout, options)?;
        cur.expect_eof()?;
        Ok(Self {
            expr,
            len: layout.len(),
        })
    }

    fn state_len(&self) -> usize {
        self.len
    }
}

/// A value expression bound to its state buffer
pub type Value<B = Vec<u8>> = Handle<ValueDef, B>;

impl<B: AsRef<[u8]> + AsMut<[u8]>> Handle<ValueDef, B> {
    pub fn evaluate<P: Peek + ?Sized>(&mut self, peek: &mut P) -> u32 {
        let (def, mut state) = self.split();
        def.expr.evaluate(&mut state, peek)
    }
}

/// Bytes of state needed to run `script`
pub fn size(script: &str) -> Result<usize> {
    size_with(script, &ParseOptions::default())
}

pub fn size_with(script: &str, options: &ParseOptions) -> Result<usize> {
    state::size::<ValueDef>(script, options)
}

/// Parse `script` into `buffer`
pub fn parse<B: AsRef<[u8]> + AsMut<[u8]>>(buffer: B, script: &str) -> Result<Value<B>> {
    parse_with(buffer, script, &ParseOptions::default())
}

pub fn parse_with<B: AsRef<[u8]> + AsMut<[u8]>>(
    buffer: B,
    script: &str,
    options: &ParseOptions,
) -> Result<Value<B>> {
    state::parse::<ValueDef, B>(buffer, script, options)
}
