//! Operands: the leaves of every expression
//!
//! ```text
//! 0xH1234    8-bit read at 0x1234        d0xH1234   previous frame's value
//! 0x 1234    16-bit read (also 0x1234)   p0xH1234   last distinct value
//! 0xW1234    24-bit read                 b0xH1234   BCD decoded
//! 0xX1234    32-bit read                 H1F        hex constant
//! 0xL/0xU    low/high nibble             123, -1    decimal constant
//! 0xM..0xT   bit 0..7                    V-2        signed value (terms)
//! @name      custom operand              0.5        float multiplier (terms)
//! ```

use std::fmt;
use std::sync::Arc;

use crate::custom::CustomOperandEvaluator;
use crate::cursor::Cursor;
use crate::error::{Error, Result};
use crate::memory::Peek;
use crate::options::ParseOptions;
use crate::state::{Layout, State, Word};

/// Width or sub-byte field of a memory read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemSize {
    Bit0,
    Bit1,
    Bit2,
    Bit3,
    Bit4,
    Bit5,
    Bit6,
    Bit7,
    /// Low nibble
    Low,
    /// High nibble
    High,
    Byte,
    Word16,
    Word24,
    Word32,
}

impl MemSize {
    /// Bytes requested from [`Peek`]
    pub fn num_bytes(self) -> u8 {
        match self {
            Self::Word16 => 2,
            Self::Word24 | Self::Word32 => 4,
            _ => 1,
        }
    }

    /// Largest value the field can hold
    pub fn mask(self) -> u32 {
        match self {
            Self::Bit0
            | Self::Bit1
            | Self::Bit2
            | Self::Bit3
            | Self::Bit4
            | Self::Bit5
            | Self::Bit6
            | Self::Bit7 => 0x1,
            Self::Low | Self::High => 0xF,
            Self::Byte => 0xFF,
            Self::Word16 => 0xFFFF,
            Self::Word24 => 0xFF_FFFF,
            Self::Word32 => 0xFFFF_FFFF,
        }
    }

    /// Pull this field out of a raw little-endian read
    pub fn extract(self, raw: u32) -> u32 {
        let shift = match self {
            Self::Bit0 => 0,
            Self::Bit1 => 1,
            Self::Bit2 => 2,
            Self::Bit3 => 3,
            Self::Bit4 => 4,
            Self::Bit5 => 5,
            Self::Bit6 => 6,
            Self::Bit7 => 7,
            Self::High => 4,
            _ => 0,
        };
        (raw >> shift) & self.mask()
    }

    fn from_prefix(c: u8) -> Option<Self> {
        Some(match c.to_ascii_lowercase() {
            b'h' => Self::Byte,
            b' ' => Self::Word16,
            b'w' => Self::Word24,
            b'x' => Self::Word32,
            b'l' => Self::Low,
            b'u' => Self::High,
            b'm' => Self::Bit0,
            b'n' => Self::Bit1,
            b'o' => Self::Bit2,
            b'p' => Self::Bit3,
            b'q' => Self::Bit4,
            b'r' => Self::Bit5,
            b's' => Self::Bit6,
            b't' => Self::Bit7,
            _ => return None,
        })
    }
}

/// How a memory operand relates to earlier frames
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum History {
    Current,
    /// Cache of the previous evaluation
    Delta(Word),
    /// Last distinct value and the one before it
    Prior { last: Word, prior: Word },
}

/// Operand type, as reported by [`Operand::kind`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandKind {
    Address,
    Delta,
    Prior,
    Const,
    Float,
    Custom,
}

/// A memory read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryRef {
    pub(crate) address: u32,
    pub(crate) size: MemSize,
    pub(crate) bcd: bool,
    pub(crate) history: History,
}

/// A `@name` operand bound to its evaluator
#[derive(Clone)]
pub struct CustomRef {
    pub(crate) name: String,
    pub(crate) evaluator: Arc<dyn CustomOperandEvaluator>,
}

impl fmt::Debug for CustomRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.name)
    }
}

/// A single readable value
#[derive(Debug, Clone)]
pub enum Operand {
    Memory(MemoryRef),
    Const(u32),
    Float(f64),
    Custom(CustomRef),
}

/// Where an operand appears; decides how bare numbers are read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Position {
    /// Either side of a comparison
    Condition,
    /// First operand of a term
    TermLeft,
    /// Multiplier of a term
    TermRight,
}

impl Operand {
    pub fn kind(&self) -> OperandKind {
        match self {
            Self::Memory(mem) => match mem.history {
                History::Current => OperandKind::Address,
                History::Delta(_) => OperandKind::Delta,
                History::Prior { .. } => OperandKind::Prior,
            },
            Self::Const(_) => OperandKind::Const,
            Self::Float(_) => OperandKind::Float,
            Self::Custom(_) => OperandKind::Custom,
        }
    }

    /// Memory size, `None` for non-memory operands
    pub fn size(&self) -> Option<MemSize> {
        match self {
            Self::Memory(mem) => Some(mem.size),
            _ => None,
        }
    }

    /// Address for memory operands, literal for constants
    pub fn value(&self) -> u32 {
        match self {
            Self::Memory(mem) => mem.address,
            Self::Const(value) => *value,
            Self::Float(fp) => *fp as u32,
            Self::Custom(_) => 0,
        }
    }

    pub fn is_bcd(&self) -> bool {
        matches!(self, Self::Memory(mem) if mem.bcd)
    }

    pub fn is_float(&self) -> bool {
        matches!(self, Self::Float(_))
    }

    /// Mask used by `~` inversion
    pub(crate) fn invert_mask(&self) -> u32 {
        match self {
            Self::Memory(mem) => mem.size.mask(),
            _ => u32::MAX,
        }
    }

    pub(crate) fn parse(
        cur: &mut Cursor<'_>,
        position: Position,
        layout: &mut Layout,
        options: &ParseOptions,
    ) -> Result<Self> {
        let c = cur.peek().ok_or(Error::UnexpectedEnd)?;
        match c.to_ascii_lowercase() {
            b'd' => {
                cur.bump();
                let bcd = cur.eat_ignore_case(b'b');
                Self::parse_memory(cur, bcd, History::Delta(layout.word()))
            }
            b'p' => {
                cur.bump();
                let bcd = cur.eat_ignore_case(b'b');
                let history = History::Prior {
                    last: layout.word(),
                    prior: layout.word(),
                };
                Self::parse_memory(cur, bcd, history)
            }
            b'b' => {
                cur.bump();
                Self::parse_memory(cur, true, History::Current)
            }
            b'0' if matches!(cur.peek_at(1), Some(b'x' | b'X')) => {
                Self::parse_memory(cur, false, History::Current)
            }
            b'h' => {
                cur.bump();
                cur.hex_u32()
                    .map(Self::Const)
                    .ok_or(Error::InvalidConstOperand)
            }
            b'v' if position != Position::Condition => {
                cur.bump();
                parse_signed(cur).map(Self::Const)
            }
            b'@' => {
                cur.bump();
                Self::parse_custom(cur, options)
            }
            b'0'..=b'9' | b'+' | b'-' | b'.' if position == Position::TermRight => {
                parse_float(cur).map(Self::Float)
            }
            b'0'..=b'9' | b'+' | b'-' => parse_signed(cur).map(Self::Const),
            _ => Err(Error::InvalidMemoryOperand),
        }
    }

    fn parse_memory(cur: &mut Cursor<'_>, bcd: bool, history: History) -> Result<Self> {
        if !cur.eat(b'0') || !cur.eat_ignore_case(b'x') {
            return Err(Error::InvalidMemoryOperand);
        }

        let size = match cur.peek().and_then(MemSize::from_prefix) {
            Some(size) => {
                cur.bump();
                size
            }
            None => MemSize::Word16,
        };

        // Some scripts repeat the prefix: 0xL0x0004
        if cur.peek() == Some(b'0') && matches!(cur.peek_at(1), Some(b'x' | b'X')) {
            cur.advance(2);
        }

        let address = cur.hex_u32().ok_or(Error::InvalidMemoryOperand)?;
        Ok(Self::Memory(MemoryRef {
            address,
            size,
            bcd,
            history,
        }))
    }

    fn parse_custom(cur: &mut Cursor<'_>, options: &ParseOptions) -> Result<Self> {
        let name = cur.take_while(|c| c.is_ascii_alphanumeric() || c == b'_');
        let name = std::str::from_utf8(name).map_err(|_| Error::InvalidCustomOperand)?;
        match &options.custom {
            Some(evaluator) if !name.is_empty() && evaluator.has_function(name) => {
                Ok(Self::Custom(CustomRef {
                    name: name.to_string(),
                    evaluator: Arc::clone(evaluator),
                }))
            }
            _ => Err(Error::InvalidCustomOperand),
        }
    }

    /// Read this operand for the current frame
    pub(crate) fn evaluate<P: Peek + ?Sized>(&self, state: &mut State<'_>, peek: &mut P) -> u32 {
        match self {
            Self::Memory(mem) => {
                let raw = peek.peek(mem.address, mem.size.num_bytes());
                let mut value = mem.size.extract(raw);
                if mem.bcd {
                    value = decode_bcd(value);
                }
                match mem.history {
                    History::Current => value,
                    History::Delta(slot) => {
                        let previous = state.get(slot);
                        state.set(slot, value);
                        previous
                    }
                    History::Prior { last, prior } => {
                        if state.get(last) != value {
                            state.set(prior, state.get(last));
                            state.set(last, value);
                        }
                        state.get(prior)
                    }
                }
            }
            Self::Const(value) => *value,
            Self::Float(fp) => *fp as u32,
            Self::Custom(custom) => {
                let mut read = |address: u32, num_bytes: u8| peek.peek(address, num_bytes);
                custom.evaluator.evaluate(&custom.name, &mut read)
            }
        }
    }
}

/// Decode each nibble as one decimal digit
pub fn decode_bcd(value: u32) -> u32 {
    (0..8).rev().fold(0u32, |acc, nibble| {
        let digit = (value >> (nibble * 4)) & 0xF;
        acc.wrapping_mul(10).wrapping_add(digit)
    })
}

/// Signed decimal, wrapped to 32 bits; magnitudes past `u32::MAX` clamp
fn parse_signed(cur: &mut Cursor<'_>) -> Result<u32> {
    let negative = if cur.eat(b'-') {
        true
    } else {
        cur.eat(b'+');
        false
    };
    let magnitude = cur.decimal_u64().ok_or(Error::InvalidConstOperand)?;
    let magnitude = magnitude.min(u32::MAX as u64) as u32;
    Ok(if negative {
        magnitude.wrapping_neg()
    } else {
        magnitude
    })
}

fn parse_float(cur: &mut Cursor<'_>) -> Result<f64> {
    let start = cur.pos();
    let sign = if cur.eat(b'-') {
        -1.0
    } else {
        cur.eat(b'+');
        1.0
    };
    let int = cur.take_while(|c| c.is_ascii_digit());
    let mut text = String::from_utf8_lossy(int).into_owned();
    if cur.eat(b'.') {
        text.push('.');
        text.push_str(&String::from_utf8_lossy(cur.take_while(|c| c.is_ascii_digit())));
    }
    if text.is_empty() || text == "." {
        tracing::debug!(offset = start, "bad float operand");
        return Err(Error::InvalidFpOperand);
    }
    text.parse::<f64>()
        .map(|fp| sign * fp)
        .map_err(|_| Error::InvalidFpOperand)
}
