//! Byte-level decoders for the chatsync format
//!
//! All multi-byte integers are little-endian. Every read advances [`ByteReader::position`], which
//! the scanner uses to tag warnings with a stream offset.

use std::io::{self, Read};

use super::error::ChatSyncError;

/// Longest 7-bit integer that can still fit in a u64
const MAX_7BIT_INT_BYTES: usize = 10;

pub struct ByteReader<R> {
    inner: R,
    position: u64,
}

impl<R: Read> ByteReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, position: 0 }
    }

    /// Number of bytes consumed so far
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Read as many bytes as fit in `buf`, stopping early only at end of stream
    fn fill(&mut self, buf: &mut [u8]) -> Result<usize, ChatSyncError> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        self.position += filled as u64;
        Ok(filled)
    }

    /// Read a fixed-width block of exactly `N` bytes
    pub fn read_array<const N: usize>(
        &mut self,
        what: &'static str,
    ) -> Result<[u8; N], ChatSyncError> {
        let mut buf = [0u8; N];
        let actual = self.fill(&mut buf)?;
        if actual != N {
            return Err(ChatSyncError::ShortRead { what, expected: N, actual });
        }
        Ok(buf)
    }

    pub fn try_read_u8(&mut self) -> Result<Option<u8>, ChatSyncError> {
        let mut buf = [0u8; 1];
        Ok(if self.fill(&mut buf)? == 1 { Some(buf[0]) } else { None })
    }

    pub fn read_u8(&mut self, what: &'static str) -> Result<u8, ChatSyncError> {
        self.try_read_u8()?.ok_or(ChatSyncError::UnexpectedEof { what })
    }

    /// Read exactly `len` bytes without trusting `len` for the allocation size
    pub fn read_bytes(&mut self, len: u64, what: &'static str) -> Result<Vec<u8>, ChatSyncError> {
        let mut buf = Vec::new();
        let actual = (&mut self.inner).take(len).read_to_end(&mut buf)?;
        self.position += actual as u64;
        if actual as u64 != len {
            return Err(ChatSyncError::ShortRead {
                what,
                expected: usize::try_from(len).unwrap_or(usize::MAX),
                actual,
            });
        }
        Ok(buf)
    }

    /// Discard `len` bytes
    pub fn skip(&mut self, len: u64, what: &'static str) -> Result<(), ChatSyncError> {
        let skipped = io::copy(&mut (&mut self.inner).take(len), &mut io::sink())?;
        self.position += skipped;
        if skipped != len {
            return Err(ChatSyncError::ShortRead {
                what,
                expected: usize::try_from(len).unwrap_or(usize::MAX),
                actual: usize::try_from(skipped).unwrap_or(usize::MAX),
            });
        }
        Ok(())
    }

    /// Decode a 7-bit chunked integer: low 7 bits carry data, the high bit flags a
    /// continuation byte. Returns `(bytes consumed, value)`.
    pub fn read_7bit_int(&mut self) -> Result<(usize, u64), ChatSyncError> {
        let mut value = 0u64;
        let mut shift = 0u32;
        let mut size = 0usize;
        loop {
            let byte = self.read_u8("7-bit integer")?;
            size += 1;
            if size > MAX_7BIT_INT_BYTES {
                return Err(ChatSyncError::VarIntOverflow);
            }

            let chunk = u64::from(byte & 0x7f);
            let part = chunk << shift;
            if part >> shift != chunk {
                return Err(ChatSyncError::VarIntOverflow);
            }
            value |= part;

            if byte & 0x80 == 0 {
                return Ok((size, value));
            }
            shift += 7;
        }
    }

    /// Read up to and including a 0x00 terminator, or to end of stream.
    /// The reported size always counts one terminator byte.
    pub fn read_cstring(&mut self) -> Result<(usize, Vec<u8>), ChatSyncError> {
        let mut content = Vec::new();
        while let Some(byte) = self.try_read_u8()? {
            if byte == 0 {
                break;
            }
            content.push(byte);
        }
        Ok((content.len() + 1, content))
    }

    /// Read a 7-bit length followed by that many raw bytes
    pub fn read_blob(&mut self) -> Result<(usize, Vec<u8>), ChatSyncError> {
        let (prefix_size, len) = self.read_7bit_int()?;
        let data = self.read_bytes(len, "blob")?;
        Ok((prefix_size + data.len(), data))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use proptest::prelude::*;

    use super::*;

    fn reader(bytes: &[u8]) -> ByteReader<Cursor<Vec<u8>>> {
        ByteReader::new(Cursor::new(bytes.to_vec()))
    }

    fn encode_7bit_int(mut value: u64) -> Vec<u8> {
        let mut out = Vec::new();
        loop {
            let chunk = (value & 0x7f) as u8;
            value >>= 7;
            if value == 0 {
                out.push(chunk);
                return out;
            }
            out.push(chunk | 0x80);
        }
    }

    #[test]
    fn test_read_7bit_int_single_byte() {
        let mut r = reader(&[0x05, 0xff]);
        assert_eq!(r.read_7bit_int().unwrap(), (1, 5));
        assert_eq!(r.position(), 1);
    }

    #[test]
    fn test_read_7bit_int_multi_byte() {
        // 0x96 0x01 -> 22 + 1 * 128
        let mut r = reader(&[0x96, 0x01]);
        assert_eq!(r.read_7bit_int().unwrap(), (2, 150));
    }

    #[test]
    fn test_read_7bit_int_eof_mid_sequence() {
        let mut r = reader(&[0x80, 0x80]);
        let err = r.read_7bit_int().unwrap_err();
        assert!(matches!(err, ChatSyncError::UnexpectedEof { .. }));
    }

    #[test]
    fn test_read_7bit_int_empty_stream() {
        let mut r = reader(&[]);
        assert!(matches!(r.read_7bit_int(), Err(ChatSyncError::UnexpectedEof { .. })));
    }

    #[test]
    fn test_read_7bit_int_overflow() {
        let mut bytes = vec![0xff; 10];
        bytes.push(0x7f);
        let mut r = reader(&bytes);
        assert!(matches!(r.read_7bit_int(), Err(ChatSyncError::VarIntOverflow)));
    }

    #[test]
    fn test_read_7bit_int_rejects_endless_continuation() {
        let mut bytes = vec![0x80; 20];
        bytes.push(0x00);
        let mut r = reader(&bytes);
        assert!(matches!(r.read_7bit_int(), Err(ChatSyncError::VarIntOverflow)));
        // Stops right after the byte that exceeds the limit
        assert_eq!(r.position(), 11);
    }

    #[test]
    fn test_read_7bit_int_u64_max() {
        let mut r = reader(&encode_7bit_int(u64::MAX));
        assert_eq!(r.read_7bit_int().unwrap(), (10, u64::MAX));
    }

    #[test]
    fn test_read_array_short_read() {
        let mut r = reader(&[1, 2, 3]);
        let err = r.read_array::<16>("BlockHeader").unwrap_err();
        match err {
            ChatSyncError::ShortRead { what, expected, actual } => {
                assert_eq!(what, "BlockHeader");
                assert_eq!(expected, 16);
                assert_eq!(actual, 3);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_read_array_exact() {
        let mut r = reader(&[1, 2, 3, 4, 5]);
        assert_eq!(r.read_array::<4>("x").unwrap(), [1, 2, 3, 4]);
        assert_eq!(r.position(), 4);
    }

    #[test]
    fn test_read_cstring() {
        let mut r = reader(b"alice\0bob");
        assert_eq!(r.read_cstring().unwrap(), (6, b"alice".to_vec()));
        // Unterminated at end of stream still counts a terminator byte
        assert_eq!(r.read_cstring().unwrap(), (4, b"bob".to_vec()));
        assert_eq!(r.position(), 9);
    }

    #[test]
    fn test_read_cstring_empty() {
        let mut r = reader(&[0]);
        assert_eq!(r.read_cstring().unwrap(), (1, Vec::new()));
    }

    #[test]
    fn test_read_blob() {
        let mut r = reader(&[3, b'a', b'b', b'c', b'd']);
        assert_eq!(r.read_blob().unwrap(), (4, b"abc".to_vec()));
    }

    #[test]
    fn test_read_blob_short() {
        let mut r = reader(&[5, b'a', b'b']);
        let err = r.read_blob().unwrap_err();
        assert!(matches!(err, ChatSyncError::ShortRead { expected: 5, actual: 2, .. }));
    }

    #[test]
    fn test_read_blob_huge_length_does_not_allocate() {
        let mut bytes = encode_7bit_int(u64::from(u32::MAX));
        bytes.extend_from_slice(b"tiny");
        let mut r = reader(&bytes);
        assert!(r.read_blob().unwrap_err().is_truncation());
    }

    #[test]
    fn test_skip() {
        let mut r = reader(&[1, 2, 3, 4]);
        r.skip(3, "padding").unwrap();
        assert_eq!(r.read_u8("x").unwrap(), 4);
        assert!(r.skip(1, "padding").unwrap_err().is_truncation());
    }

    proptest! {
        #[test]
        fn prop_7bit_int_roundtrip(n in any::<u64>()) {
            let encoded = encode_7bit_int(n);
            let bits = (u64::BITS - n.leading_zeros()) as usize;
            let expected_len = bits.div_ceil(7).max(1);
            prop_assert_eq!(encoded.len(), expected_len);

            let mut r = reader(&encoded);
            prop_assert_eq!(r.read_7bit_int().unwrap(), (expected_len, n));
        }
    }
}
