//! Runtime state arena
//!
//! A parsed script is split in two halves:
//!
//! - the **definition**: immutable, shareable behind an `Arc`, produced by
//!   parsing the script text;
//! - the **state**: a flat byte buffer holding every mutable field (hit
//!   counts, delta and prior caches, pause and activation flags).
//!
//! While parsing, a [`Layout`] hands out typed slots (byte offsets) into the
//! state buffer. Sizing a script is simply parsing it and reading the final
//! layout length, so every error a parse can produce is found before a
//! caller's buffer is touched.
//!
//! # Buffer format
//!
//! ```text
//! [magic: 4 bytes][length: u32 LE][slots...]
//! ```
//!
//! Only `length` bytes are ever written; a larger buffer keeps its tail.

mod snapshot;

pub use snapshot::StateSnapshot;

use std::sync::Arc;

use bytemuck::{Pod, Zeroable};

use crate::error::{Error, Result};
use crate::options::ParseOptions;

/// Size of the buffer header in bytes
pub const HEADER_SIZE: usize = std::mem::size_of::<StateHeader>();

/// Header written at the start of every state buffer
#[derive(Clone, Copy, Debug, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
struct StateHeader {
    magic: [u8; 4],
    len: [u8; 4],
}

impl StateHeader {
    fn new(magic: [u8; 4], len: usize) -> Self {
        Self {
            magic,
            len: (len as u32).to_le_bytes(),
        }
    }

    fn read(bytes: &[u8]) -> Option<Self> {
        bytes
            .get(..HEADER_SIZE)
            .map(bytemuck::pod_read_unaligned::<StateHeader>)
    }
}

/// 32-bit state slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Word(usize);

/// Boolean state slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Flag(usize);

/// Slot allocator used while parsing
#[derive(Debug)]
pub(crate) struct Layout {
    next: usize,
}

impl Layout {
    pub fn new() -> Self {
        Self { next: HEADER_SIZE }
    }

    pub fn word(&mut self) -> Word {
        let slot = Word(self.next);
        self.next += 4;
        slot
    }

    pub fn flag(&mut self) -> Flag {
        let slot = Flag(self.next);
        self.next += 1;
        slot
    }

    /// Total bytes needed, header included
    pub fn len(&self) -> usize {
        self.next
    }
}

/// Mutable view over a state buffer, exactly `state_len` bytes long
pub(crate) struct State<'a> {
    bytes: &'a mut [u8],
}

impl<'a> State<'a> {
    pub fn new(bytes: &'a mut [u8]) -> Self {
        Self { bytes }
    }

    #[inline]
    pub fn get(&self, slot: Word) -> u32 {
        let mut word = [0u8; 4];
        word.copy_from_slice(&self.bytes[slot.0..slot.0 + 4]);
        u32::from_le_bytes(word)
    }

    #[inline]
    pub fn set(&mut self, slot: Word, value: u32) {
        self.bytes[slot.0..slot.0 + 4].copy_from_slice(&value.to_le_bytes());
    }

    #[inline]
    pub fn flag(&self, slot: Flag) -> bool {
        self.bytes[slot.0] != 0
    }

    #[inline]
    pub fn set_flag(&mut self, slot: Flag, value: bool) {
        self.bytes[slot.0] = value as u8;
    }
}

/// A parsed script kind that owns a runtime state layout.
pub trait Definition: Send + Sync + Sized {
    /// Tag identifying state buffers of this kind
    const MAGIC: [u8; 4];

    /// Parse `script` into a definition
    fn parse_with(script: &str, options: &ParseOptions) -> Result<Self>;

    /// Bytes of state needed, header included
    fn state_len(&self) -> usize;
}

/// Bytes of state needed to run `script`
pub fn size<D: Definition>(script: &str, options: &ParseOptions) -> Result<usize> {
    let len = D::parse_with(script, options)?.state_len();
    tracing::debug!(len, "sized script");
    Ok(len)
}

/// Parse `script` and lay its state out in `buffer`
pub fn parse<D: Definition, B>(buffer: B, script: &str, options: &ParseOptions) -> Result<Handle<D, B>>
where
    B: AsRef<[u8]> + AsMut<[u8]>,
{
    let def = D::parse_with(script, options)?;
    Handle::new(Arc::new(def), buffer)
}

/// A definition paired with the buffer holding its runtime state.
///
/// `B` is anything that derefs to bytes: `&mut [u8]` for a caller-owned
/// buffer, `Vec<u8>` for an owned one.
pub struct Handle<D, B = Vec<u8>> {
    def: Arc<D>,
    buffer: B,
}

impl<D: Definition, B: AsRef<[u8]> + AsMut<[u8]>> Handle<D, B> {
    /// Attach `buffer` to `def`, initializing exactly `def.state_len()` bytes
    pub fn new(def: Arc<D>, mut buffer: B) -> Result<Self> {
        let len = def.state_len();
        let got = buffer.as_ref().len();
        if got < len {
            return Err(Error::BufferTooSmall { needed: len, got });
        }

        let bytes = &mut buffer.as_mut()[..len];
        bytes.fill(0);
        bytes[..HEADER_SIZE].copy_from_slice(bytemuck::bytes_of(&StateHeader::new(D::MAGIC, len)));

        Ok(Self { def, buffer })
    }

    pub fn definition(&self) -> &Arc<D> {
        &self.def
    }

    /// The state bytes, header included
    pub fn state(&self) -> &[u8] {
        &self.buffer.as_ref()[..self.def.state_len()]
    }

    /// Zero every state slot, as if freshly parsed
    pub fn clear(&mut self) {
        let len = self.def.state_len();
        self.buffer.as_mut()[HEADER_SIZE..len].fill(0);
    }

    /// Capture the current state
    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot::capture(self.state())
    }

    /// Restore a snapshot taken from a handle of the same definition
    pub fn restore(&mut self, snapshot: &StateSnapshot) -> Result<()> {
        let len = self.def.state_len();
        let expected = StateHeader::new(D::MAGIC, len);
        if snapshot.len() != len
            || StateHeader::read(snapshot.data()) != Some(expected)
            || !snapshot.verify()
        {
            return Err(Error::InvalidState);
        }
        self.buffer.as_mut()[..len].copy_from_slice(snapshot.data());
        Ok(())
    }

    pub fn into_buffer(self) -> B {
        self.buffer
    }

    /// Borrow the definition and a state view at once
    pub(crate) fn split(&mut self) -> (&D, State<'_>) {
        let len = self.def.state_len();
        (&*self.def, State::new(&mut self.buffer.as_mut()[..len]))
    }

    /// Read-only access for inspection helpers
    pub(crate) fn with_state<R>(&self, f: impl FnOnce(&D, &[u8]) -> R) -> R {
        f(&self.def, self.state())
    }
}

impl<D: Definition> Handle<D, Vec<u8>> {
    /// A fresh owned state for a shared definition
    pub fn instantiate(def: Arc<D>) -> Self {
        let len = def.state_len();
        let mut buffer = vec![0u8; len];
        buffer[..HEADER_SIZE].copy_from_slice(bytemuck::bytes_of(&StateHeader::new(D::MAGIC, len)));
        Self { def, buffer }
    }
}

impl<D, B> std::fmt::Debug for Handle<D, B>
where
    D: Definition + std::fmt::Debug,
    B: AsRef<[u8]> + AsMut<[u8]>,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Handle")
            .field("def", &self.def)
            .field("state_len", &self.def.state_len())
            .finish()
    }
}

/// Read a word slot from an immutable state slice
pub(crate) fn read_word(bytes: &[u8], slot: Word) -> u32 {
    let mut word = [0u8; 4];
    word.copy_from_slice(&bytes[slot.0..slot.0 + 4]);
    u32::from_le_bytes(word)
}

/// Read a flag slot from an immutable state slice
pub(crate) fn read_flag(bytes: &[u8], slot: Flag) -> bool {
    bytes[slot.0] != 0
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Counter {
        count: Word,
        flag: Flag,
        len: usize,
    }

    impl Definition for Counter {
        const MAGIC: [u8; 4] = *b"TEST";

        fn parse_with(script: &str, _options: &ParseOptions) -> Result<Self> {
            if script.is_empty() {
                return Err(Error::UnexpectedEnd);
            }
            let mut layout = Layout::new();
            let count = layout.word();
            let flag = layout.flag();
            Ok(Self {
                count,
                flag,
                len: layout.len(),
            })
        }

        fn state_len(&self) -> usize {
            self.len
        }
    }

    #[test]
    fn test_layout_sizes_include_header() {
        assert_eq!(size::<Counter>("x", &ParseOptions::default()), Ok(HEADER_SIZE + 5));
    }

    #[test]
    fn test_parse_writes_exactly_sized_bytes() {
        let mut buffer = [0xAAu8; 32];
        let needed = size::<Counter>("x", &ParseOptions::default()).unwrap();
        {
            let handle = parse::<Counter, _>(&mut buffer[..needed], "x", &ParseOptions::default());
            assert!(handle.is_ok());
        }
        assert_eq!(&buffer[..4], b"TEST");
        assert_eq!(&buffer[4..8], &(needed as u32).to_le_bytes());
        assert!(buffer[HEADER_SIZE..needed].iter().all(|&b| b == 0));
        assert!(buffer[needed..].iter().all(|&b| b == 0xAA));
    }

    #[test]
    fn test_parse_rejects_small_buffer_without_writing() {
        let mut buffer = [0xAAu8; 8];
        let result = parse::<Counter, _>(&mut buffer[..], "x", &ParseOptions::default());
        assert!(matches!(
            result,
            Err(Error::BufferTooSmall { needed: 13, got: 8 })
        ));
        assert!(buffer.iter().all(|&b| b == 0xAA));
    }

    #[test]
    fn test_snapshot_restore() {
        let def = Arc::new(Counter::parse_with("x", &ParseOptions::default()).unwrap());
        let mut handle = Handle::instantiate(Arc::clone(&def));

        {
            let (def, mut state) = handle.split();
            state.set(def.count, 7);
            state.set_flag(def.flag, true);
        }
        let snapshot = handle.snapshot();

        {
            let (def, mut state) = handle.split();
            state.set(def.count, 9);
        }
        handle.restore(&snapshot).unwrap();

        assert_eq!(read_word(handle.state(), def.count), 7);
        assert!(read_flag(handle.state(), def.flag));
    }

    #[test]
    fn test_restore_rejects_corrupted_snapshot() {
        let def = Arc::new(Counter::parse_with("x", &ParseOptions::default()).unwrap());
        let mut handle = Handle::instantiate(def);
        let snapshot = StateSnapshot::from_parts(vec![0; 3], 0);
        assert_eq!(handle.restore(&snapshot), Err(Error::InvalidState));
    }

    #[test]
    fn test_clear_keeps_header() {
        let def = Arc::new(Counter::parse_with("x", &ParseOptions::default()).unwrap());
        let mut handle = Handle::instantiate(Arc::clone(&def));
        {
            let (def, mut state) = handle.split();
            state.set(def.count, 3);
        }
        handle.clear();
        assert_eq!(read_word(handle.state(), def.count), 0);
        assert_eq!(&handle.state()[..4], b"TEST");
    }
}
