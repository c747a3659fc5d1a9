//! Terms: `operand1[*[~]operand2]`

use crate::cursor::Cursor;
use crate::error::Result;
use crate::memory::Peek;
use crate::operand::{Operand, Position};
use crate::options::ParseOptions;
use crate::state::{Layout, State};

/// An operand, optionally scaled by a second operand
#[derive(Debug, Clone)]
pub struct Term {
    pub operand1: Operand,
    pub operand2: Option<Operand>,
    /// Bitwise-invert `operand2` within its size before multiplying
    pub invert: bool,
}

impl Term {
    pub(crate) fn parse(
        cur: &mut Cursor<'_>,
        layout: &mut Layout,
        options: &ParseOptions,
    ) -> Result<Self> {
        let operand1 = Operand::parse(cur, Position::TermLeft, layout, options)?;
        if !cur.eat(b'*') {
            return Ok(Self {
                operand1,
                operand2: None,
                invert: false,
            });
        }

        let invert = cur.eat(b'~');
        let operand2 = Operand::parse(cur, Position::TermRight, layout, options)?;
        Ok(Self {
            operand1,
            operand2: Some(operand2),
            invert,
        })
    }

    pub(crate) fn evaluate<P: Peek + ?Sized>(&self, state: &mut State<'_>, peek: &mut P) -> u32 {
        let value = self.operand1.evaluate(state, peek);
        match &self.operand2 {
            None => value,
            Some(Operand::Float(fp)) => (value as f64 * fp).floor() as i64 as u32,
            Some(operand2) => {
                let mut factor = operand2.evaluate(state, peek);
                if self.invert {
                    factor = !factor & operand2.invert_mask();
                }
                value.wrapping_mul(factor)
            }
        }
    }
}
