//! Conditions: `[flag:]operand1[op operand2][(hits)]`

use crate::cursor::Cursor;
use crate::error::{Error, Result};
use crate::operand::{Operand, Position};
use crate::options::ParseOptions;
use crate::state::{Layout, Word};

/// Behaviour of a condition within its set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionFlag {
    /// No prefix
    Standard,
    /// `P:`
    PauseIf,
    /// `R:`
    ResetIf,
    /// `A:`
    AddSource,
    /// `B:`
    SubSource,
    /// `C:`
    AddHits,
    /// `N:`
    AndNext,
    /// `O:`
    OrNext,
    /// `M:`
    Measured,
    /// `T:`
    Trigger,
}

impl ConditionFlag {
    fn from_prefix(c: u8) -> Option<Self> {
        Some(match c.to_ascii_lowercase() {
            b'p' => Self::PauseIf,
            b'r' => Self::ResetIf,
            b'a' => Self::AddSource,
            b'b' => Self::SubSource,
            b'c' => Self::AddHits,
            b'n' => Self::AndNext,
            b'o' => Self::OrNext,
            b'm' => Self::Measured,
            b't' => Self::Trigger,
            _ => return None,
        })
    }

    /// Flags whose result feeds the next condition instead of the set
    pub fn is_chaining(self) -> bool {
        matches!(
            self,
            Self::AddSource | Self::SubSource | Self::AddHits | Self::AndNext | Self::OrNext
        )
    }

    /// Flags whose truth makes up the truth of the set
    pub fn is_required(self) -> bool {
        matches!(self, Self::Standard | Self::Measured | Self::Trigger)
    }
}

/// Comparison between the two operands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    /// =
    Eq,
    /// !=
    Ne,
    /// <
    Lt,
    /// <=
    Le,
    /// >
    Gt,
    /// >=
    Ge,
    /// Source modifiers without a comparison
    None,
}

impl Comparator {
    fn parse(cur: &mut Cursor<'_>) -> Option<Result<Self>> {
        let op = match cur.peek()? {
            b'=' => {
                cur.bump();
                cur.eat(b'=');
                Self::Eq
            }
            b'!' => {
                cur.bump();
                if !cur.eat(b'=') {
                    return Some(Err(Error::InvalidOperator));
                }
                Self::Ne
            }
            b'<' => {
                cur.bump();
                if cur.eat(b'=') { Self::Le } else { Self::Lt }
            }
            b'>' => {
                cur.bump();
                if cur.eat(b'=') { Self::Ge } else { Self::Gt }
            }
            _ => return None,
        };
        Some(Ok(op))
    }

    #[inline]
    pub fn compare(self, left: u32, right: u32) -> bool {
        match self {
            Self::Eq => left == right,
            Self::Ne => left != right,
            Self::Lt => left < right,
            Self::Le => left <= right,
            Self::Gt => left > right,
            Self::Ge => left >= right,
            Self::None => true,
        }
    }
}

impl std::fmt::Display for Comparator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Comparator::Eq => write!(f, "="),
            Comparator::Ne => write!(f, "!="),
            Comparator::Lt => write!(f, "<"),
            Comparator::Le => write!(f, "<="),
            Comparator::Gt => write!(f, ">"),
            Comparator::Ge => write!(f, ">="),
            Comparator::None => Ok(()),
        }
    }
}

/// A single comparison with its flag and hit target
#[derive(Debug, Clone)]
pub struct Condition {
    pub flag: ConditionFlag,
    pub operand1: Operand,
    pub comparator: Comparator,
    pub operand2: Operand,
    pub required_hits: u32,
    pub(crate) hits: Word,
}

impl Condition {
    pub(crate) fn parse(
        cur: &mut Cursor<'_>,
        layout: &mut Layout,
        options: &ParseOptions,
    ) -> Result<Self> {
        let flag = if cur.peek_at(1) == Some(b':') {
            let c = cur.peek().ok_or(Error::UnexpectedEnd)?;
            let flag = ConditionFlag::from_prefix(c).ok_or(Error::InvalidConditionType)?;
            cur.advance(2);
            flag
        } else {
            ConditionFlag::Standard
        };

        let operand1 = Operand::parse(cur, Position::Condition, layout, options)?;

        let (comparator, operand2) = match Comparator::parse(cur) {
            Some(comparator) => {
                let comparator = comparator?;
                let operand2 = Operand::parse(cur, Position::Condition, layout, options)?;
                (comparator, operand2)
            }
            None if matches!(flag, ConditionFlag::AddSource | ConditionFlag::SubSource) => {
                (Comparator::None, Operand::Const(0))
            }
            None if cur.is_eof() => return Err(Error::UnexpectedEnd),
            None => return Err(Error::InvalidOperator),
        };

        let required_hits = parse_hits(cur)?;

        Ok(Self {
            flag,
            operand1,
            comparator,
            operand2,
            required_hits,
            hits: layout.word(),
        })
    }
}

/// `(n)` or the legacy `.n.`; absent means no target
fn parse_hits(cur: &mut Cursor<'_>) -> Result<u32> {
    let close = match cur.peek() {
        Some(b'(') => b')',
        Some(b'.') => b'.',
        _ => return Ok(0),
    };
    cur.bump();

    let hits = cur.decimal_u64().ok_or(Error::InvalidRequiredHits)?;
    if !cur.eat(close) {
        return Err(Error::InvalidRequiredHits);
    }
    Ok(hits.min(u32::MAX as u64) as u32)
}
