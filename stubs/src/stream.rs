//! Binary primitives of the stub stream.
//!
//! Integers are unsigned LEB128 varints. Strings are written as slots into a
//! string table that is emitted once at the end of the stream: slot `0` is the
//! null string, slots `1..` index the table in first-use order.
//!
//! Decoding accepts only the canonical encoding: minimal varints, slots that
//! appear in first-use order and a table without duplicate or unused entries.
//! Any stream that decodes therefore re-encodes to the same bytes.

use crate::error::StubError;
use crate::error::StubResult;
use bytes::BufMut;
use bytes::BytesMut;
use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::Arc;

/// Longest encoding of a `u64` varint.
const MAX_VARUINT_LEN: usize = 10;

/// Number of bytes `value` occupies as a varint.
pub const fn varuint_len(mut value: u64) -> usize {
    let mut len = 1;
    while value >= 0x80 {
        value >>= 7;
        len += 1;
    }
    len
}

/// Append `value` as a varint.
pub fn put_varuint(buf: &mut BytesMut, mut value: u64) {
    while value >= 0x80 {
        buf.put_u8((value as u8 & 0x7f) | 0x80);
        value >>= 7;
    }
    buf.put_u8(value as u8);
}

/// Decode a varint from the front of `bytes`, returning it with its length.
pub fn read_varuint_at(bytes: &[u8], offset: usize) -> StubResult<(u64, usize)> {
    let mut value = 0u64;
    for i in 0..MAX_VARUINT_LEN {
        let byte = *bytes
            .get(offset + i)
            .ok_or(StubError::TruncatedStream { offset: offset + i })?;
        let bits = u64::from(byte & 0x7f);
        if i == MAX_VARUINT_LEN - 1 && bits > 1 {
            return Err(StubError::PayloadMismatch(format!(
                "varint overflow at offset {offset}"
            )));
        }
        value |= bits << (7 * i);
        if byte & 0x80 == 0 {
            if i > 0 && byte == 0 {
                return Err(StubError::PayloadMismatch(format!(
                    "overlong varint at offset {offset}"
                )));
            }
            return Ok((value, i + 1));
        }
    }
    Err(StubError::PayloadMismatch(format!(
        "varint too long at offset {offset}"
    )))
}

/// Write side of the stub stream.
#[derive(Debug, Default)]
pub struct StubOutputStream {
    buf: BytesMut,
    slots: HashMap<Arc<str>, u32>,
    strings: Vec<Arc<str>>,
}

impl StubOutputStream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_varuint(&mut self, value: u64) {
        put_varuint(&mut self.buf, value);
    }

    pub fn write_u32(&mut self, value: u32) {
        self.write_varuint(u64::from(value));
    }

    pub fn write_bool(&mut self, value: bool) {
        self.buf.put_u8(u8::from(value));
    }

    /// Write a nullable string as a string-table slot.
    pub fn write_name(&mut self, value: Option<&Arc<str>>) {
        let slot = match value {
            None => 0,
            Some(text) => self.slot_for(text),
        };
        self.write_u32(slot);
    }

    pub fn write_str(&mut self, value: &Arc<str>) {
        self.write_name(Some(value));
    }

    fn slot_for(&mut self, text: &Arc<str>) -> u32 {
        if let Some(slot) = self.slots.get(text) {
            return *slot;
        }
        self.strings.push(Arc::clone(text));
        let slot = self.strings.len() as u32;
        self.slots.insert(Arc::clone(text), slot);
        slot
    }

    /// Bytes written so far, string table excluded.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Split into the frame bytes and the encoded string table.
    pub fn into_parts(self) -> (BytesMut, BytesMut) {
        let mut table = BytesMut::new();
        put_varuint(&mut table, self.strings.len() as u64);
        for text in &self.strings {
            put_varuint(&mut table, text.len() as u64);
            table.put_slice(text.as_bytes());
        }
        (self.buf, table)
    }
}

/// Read side of the stub stream over a frame region.
#[derive(Debug)]
pub struct StubInputStream<'a> {
    bytes: &'a [u8],
    pos: usize,
    end: usize,
    strings: Vec<Arc<str>>,
    /// Highest slot read so far; a new slot has to be exactly one above it.
    last_slot: u32,
}

impl<'a> StubInputStream<'a> {
    /// Reader over `bytes[start..end]` with an already loaded string table.
    pub fn new(bytes: &'a [u8], start: usize, end: usize, strings: Vec<Arc<str>>) -> Self {
        Self {
            bytes,
            pos: start,
            end: end.min(bytes.len()),
            strings,
            last_slot: 0,
        }
    }

    /// Decode the string table found at `bytes[offset..]`.
    ///
    /// The table has to end exactly at the end of the buffer.
    pub fn read_string_table(bytes: &[u8], offset: usize) -> StubResult<Vec<Arc<str>>> {
        let (count, used) = read_varuint_at(bytes, offset)?;
        let mut pos = offset + used;
        // Every entry takes at least its one-byte length.
        if count > (bytes.len() - pos.min(bytes.len())) as u64 {
            return Err(StubError::TruncatedStream { offset: pos });
        }
        let mut strings = Vec::with_capacity(count as usize);
        let mut seen = HashSet::with_capacity(count as usize);
        for _ in 0..count {
            let (len, n) = read_varuint_at(bytes, pos)?;
            pos += n;
            let end = pos
                .checked_add(len as usize)
                .filter(|end| *end <= bytes.len())
                .ok_or(StubError::TruncatedStream { offset: pos })?;
            let text = std::str::from_utf8(&bytes[pos..end]).map_err(|e| {
                StubError::PayloadMismatch(format!("string table entry at {pos}: {e}"))
            })?;
            if !seen.insert(text) {
                return Err(StubError::PayloadMismatch(format!(
                    "duplicate string table entry at {pos}"
                )));
            }
            strings.push(Arc::from(text));
            pos = end;
        }
        if pos != bytes.len() {
            return Err(StubError::PayloadMismatch(format!(
                "{} trailing bytes after string table",
                bytes.len() - pos
            )));
        }
        Ok(strings)
    }

    pub const fn position(&self) -> usize {
        self.pos
    }

    pub const fn remaining(&self) -> usize {
        self.end.saturating_sub(self.pos)
    }

    /// Table entries that no slot read so far has referenced.
    pub fn unreferenced_strings(&self) -> usize {
        self.strings.len() - self.last_slot as usize
    }

    pub fn read_varuint(&mut self) -> StubResult<u64> {
        let region = &self.bytes[..self.end];
        let (value, len) = read_varuint_at(region, self.pos)?;
        self.pos += len;
        Ok(value)
    }

    pub fn read_u32(&mut self) -> StubResult<u32> {
        let offset = self.pos;
        let value = self.read_varuint()?;
        u32::try_from(value)
            .map_err(|_| StubError::PayloadMismatch(format!("value {value} at {offset} exceeds u32")))
    }

    pub fn read_bool(&mut self) -> StubResult<bool> {
        let byte = *self
            .bytes
            .get(self.pos)
            .filter(|_| self.pos < self.end)
            .ok_or(StubError::TruncatedStream { offset: self.pos })?;
        self.pos += 1;
        match byte {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(StubError::PayloadMismatch(format!(
                "invalid bool {other} at {}",
                self.pos - 1
            ))),
        }
    }

    /// Read a nullable string slot.
    pub fn read_name(&mut self) -> StubResult<Option<Arc<str>>> {
        let offset = self.pos;
        let slot = self.read_u32()?;
        if slot == 0 {
            return Ok(None);
        }
        let text = self.strings.get(slot as usize - 1).cloned().ok_or_else(|| {
            StubError::PayloadMismatch(format!("string slot {slot} at {offset} out of range"))
        })?;
        if slot > self.last_slot {
            if slot != self.last_slot + 1 {
                return Err(StubError::PayloadMismatch(format!(
                    "string slot {slot} at {offset} skips slot {}",
                    self.last_slot + 1
                )));
            }
            self.last_slot = slot;
        }
        Ok(Some(text))
    }

    /// Read a string slot that must not be null.
    pub fn read_str(&mut self) -> StubResult<Arc<str>> {
        let offset = self.pos;
        self.read_name()?.ok_or_else(|| {
            StubError::PayloadMismatch(format!("unexpected null string at {offset}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_varuint_lengths() {
        for (value, len) in [(0u64, 1), (127, 1), (128, 2), (16_383, 2), (16_384, 3), (u64::MAX, 10)] {
            let mut buf = BytesMut::new();
            put_varuint(&mut buf, value);
            assert_eq!(buf.len(), len);
            assert_eq!(varuint_len(value), len);
            assert_eq!(read_varuint_at(&buf, 0).unwrap(), (value, len));
        }
    }

    #[test]
    fn test_overlong_varint_rejected() {
        assert!(matches!(
            read_varuint_at(&[0x81, 0x00], 0),
            Err(StubError::PayloadMismatch(_))
        ));
        assert!(matches!(
            read_varuint_at(&[0x80, 0x80, 0x00], 0),
            Err(StubError::PayloadMismatch(_))
        ));
        assert_eq!(read_varuint_at(&[0x00], 0).unwrap(), (0, 1));
        assert_eq!(read_varuint_at(&[0x80, 0x01], 0).unwrap(), (128, 2));
    }

    #[test]
    fn test_truncated_varint() {
        assert!(matches!(
            read_varuint_at(&[0x80, 0x80], 0),
            Err(StubError::TruncatedStream { offset: 2 })
        ));
    }

    #[test]
    fn test_string_slots_are_shared() {
        let mut out = StubOutputStream::new();
        let a: Arc<str> = Arc::from("value");
        let b: Arc<str> = Arc::from("other");
        out.write_name(Some(&a));
        out.write_name(None);
        out.write_name(Some(&b));
        out.write_name(Some(&a));
        let (frames, table) = out.into_parts();
        assert_eq!(&frames[..], &[1, 0, 2, 1]);

        let mut all = frames.to_vec();
        let offset = all.len();
        all.extend_from_slice(&table);
        let strings = StubInputStream::read_string_table(&all, offset).unwrap();
        let mut input = StubInputStream::new(&all, 0, offset, strings);
        assert_eq!(input.read_name().unwrap().as_deref(), Some("value"));
        assert_eq!(input.read_name().unwrap(), None);
        assert_eq!(input.read_str().unwrap().as_ref(), "other");
        assert_eq!(input.read_name().unwrap().as_deref(), Some("value"));
        assert_eq!(input.remaining(), 0);
    }

    #[test]
    fn test_string_slot_out_of_range() {
        let bytes = [5u8];
        let mut input = StubInputStream::new(&bytes, 0, 1, Vec::new());
        assert!(matches!(input.read_name(), Err(StubError::PayloadMismatch(_))));
    }

    #[test]
    fn test_slots_follow_first_use_order() {
        let strings: Vec<Arc<str>> = vec![Arc::from("a"), Arc::from("b")];

        let bytes = [2u8, 1];
        let mut input = StubInputStream::new(&bytes, 0, 2, strings.clone());
        assert!(matches!(input.read_name(), Err(StubError::PayloadMismatch(_))));

        let bytes = [1u8, 1, 2, 1];
        let mut input = StubInputStream::new(&bytes, 0, 4, strings.clone());
        for expected in ["a", "a", "b", "a"] {
            assert_eq!(input.read_str().unwrap().as_ref(), expected);
        }
        assert_eq!(input.unreferenced_strings(), 0);

        let bytes = [1u8];
        let mut input = StubInputStream::new(&bytes, 0, 1, strings);
        input.read_name().unwrap();
        assert_eq!(input.unreferenced_strings(), 1);
    }

    #[test]
    fn test_duplicate_table_entries_rejected() {
        let bytes = [2u8, 1, b'a', 1, b'a'];
        assert!(matches!(
            StubInputStream::read_string_table(&bytes, 0),
            Err(StubError::PayloadMismatch(_))
        ));
    }

    #[test]
    fn test_reads_stop_at_region_end() {
        let bytes = [1u8, 1];
        let mut input = StubInputStream::new(&bytes, 0, 1, Vec::new());
        assert!(input.read_bool().unwrap());
        assert!(matches!(
            input.read_bool(),
            Err(StubError::TruncatedStream { offset: 1 })
        ));
    }
}
