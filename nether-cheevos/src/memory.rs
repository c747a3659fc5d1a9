//! Emulated memory access
//!
//! The engine never owns console memory. Every read goes through [`Peek`],
//! which the host implements over whatever memory map it has. Reads are
//! little-endian and must not fail: an unmapped address reads as 0.

/// Memory read capability supplied by the host.
///
/// `num_bytes` is 1, 2 or 4. Bytes are assembled little-endian. Any byte
/// outside the host's memory map contributes 0.
pub trait Peek {
    fn peek(&mut self, address: u32, num_bytes: u8) -> u32;
}

/// Closures are the usual way to hand the engine a memory reader; whatever
/// the host needs (its user data) is captured by the closure.
impl<F> Peek for F
where
    F: FnMut(u32, u8) -> u32,
{
    #[inline]
    fn peek(&mut self, address: u32, num_bytes: u8) -> u32 {
        self(address, num_bytes)
    }
}

/// A flat block of RAM starting at address 0.
#[derive(Debug, Clone, Copy)]
pub struct MemoryBlock<'a> {
    ram: &'a [u8],
}

impl<'a> MemoryBlock<'a> {
    pub fn new(ram: &'a [u8]) -> Self {
        Self { ram }
    }

    /// Read a single byte, 0 when out of range
    #[inline]
    pub fn byte(&self, address: u32) -> u8 {
        usize::try_from(address)
            .ok()
            .and_then(|index| self.ram.get(index))
            .copied()
            .unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.ram.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ram.is_empty()
    }
}

impl Peek for MemoryBlock<'_> {
    fn peek(&mut self, address: u32, num_bytes: u8) -> u32 {
        (0..num_bytes.min(4)).fold(0u32, |value, i| match address.checked_add(i as u32) {
            Some(addr) => value | (self.byte(addr) as u32) << (8 * i as u32),
            None => value,
        })
    }
}
