//! Byte cursor shared by the script parsers

use crate::error::{Error, Result};

/// Forward-only reader over an ASCII script.
#[derive(Debug, Clone)]
pub(crate) struct Cursor<'a> {
    src: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            src: src.as_bytes(),
            pos: 0,
        }
    }

    #[inline]
    pub fn pos(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn is_eof(&self) -> bool {
        self.pos >= self.src.len()
    }

    #[inline]
    pub fn peek(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }

    #[inline]
    pub fn peek_at(&self, offset: usize) -> Option<u8> {
        self.src.get(self.pos + offset).copied()
    }

    /// Peek, lowercased
    #[inline]
    pub fn peek_lower(&self) -> Option<u8> {
        self.peek().map(|c| c.to_ascii_lowercase())
    }

    #[inline]
    pub fn bump(&mut self) {
        if self.pos < self.src.len() {
            self.pos += 1;
        }
    }

    pub fn advance(&mut self, n: usize) {
        self.pos = (self.pos + n).min(self.src.len());
    }

    /// Consume `c` if it is next
    pub fn eat(&mut self, c: u8) -> bool {
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Consume `c` in either case if it is next
    pub fn eat_ignore_case(&mut self, c: u8) -> bool {
        if self.peek_lower() == Some(c.to_ascii_lowercase()) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    pub fn starts_with_ignore_case(&self, prefix: &str) -> bool {
        self.src[self.pos..]
            .get(..prefix.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(prefix.as_bytes()))
    }

    /// Consume `prefix` (case-insensitive) if it is next
    pub fn eat_str_ignore_case(&mut self, prefix: &str) -> bool {
        if self.starts_with_ignore_case(prefix) {
            self.pos += prefix.len();
            true
        } else {
            false
        }
    }

    /// Consume bytes while `pred` holds and return them
    pub fn take_while(&mut self, pred: impl Fn(u8) -> bool) -> &'a [u8] {
        let start = self.pos;
        while self.peek().is_some_and(&pred) {
            self.pos += 1;
        }
        &self.src[start..self.pos]
    }

    /// Read a hexadecimal number, saturating at `u32::MAX`
    pub fn hex_u32(&mut self) -> Option<u32> {
        let digits = self.take_while(|c| c.is_ascii_hexdigit());
        if digits.is_empty() {
            return None;
        }
        let value = digits.iter().fold(0u64, |acc, &c| {
            let digit = (c as char).to_digit(16).unwrap_or(0) as u64;
            acc.saturating_mul(16).saturating_add(digit)
        });
        Some(value.min(u32::MAX as u64) as u32)
    }

    /// Read a decimal number, saturating at `u64::MAX`
    pub fn decimal_u64(&mut self) -> Option<u64> {
        let digits = self.take_while(|c| c.is_ascii_digit());
        if digits.is_empty() {
            return None;
        }
        Some(digits.iter().fold(0u64, |acc, &c| {
            acc.saturating_mul(10).saturating_add((c - b'0') as u64)
        }))
    }

    /// Fail unless the whole script has been consumed
    pub fn expect_eof(&self) -> Result<()> {
        if self.is_eof() {
            Ok(())
        } else {
            Err(Error::UnexpectedInput(self.pos))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_saturates() {
        let mut cur = Cursor::new("123456789ABC");
        assert_eq!(cur.hex_u32(), Some(u32::MAX));
        assert!(cur.is_eof());
    }

    #[test]
    fn test_eat_ignore_case() {
        let mut cur = Cursor::new("sta:1");
        assert!(cur.eat_str_ignore_case("STA:"));
        assert_eq!(cur.decimal_u64(), Some(1));
        assert!(cur.expect_eof().is_ok());
    }

    #[test]
    fn test_expect_eof_reports_offset() {
        let mut cur = Cursor::new("12x");
        cur.decimal_u64();
        assert_eq!(cur.expect_eof(), Err(Error::UnexpectedInput(2)));
    }
}
