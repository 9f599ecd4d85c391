#![forbid(unsafe_code)]
//! Varint and fixed-width integer codecs shared by the huge arrays and the adjacency decoder.

pub mod be {
    //! Big-endian fixed-width helpers.

    use core::convert::TryInto;

    const U32_LEN: usize = core::mem::size_of::<u32>();

    /// Big-endian encoding of a u32.
    pub fn put_u32(dst: &mut [u8], v: u32) {
        assert!(dst.len() >= U32_LEN, "destination too small");
        dst[..U32_LEN].copy_from_slice(&v.to_be_bytes());
    }

    /// Decodes a u32 from big-endian byte order.
    pub fn get_u32(src: &[u8]) -> u32 {
        let head = src
            .get(..U32_LEN)
            .unwrap_or_else(|| panic!("u32 source shorter than 4 bytes (have {})", src.len()));
        let bytes: [u8; U32_LEN] = head.try_into().unwrap();
        u32::from_be_bytes(bytes)
    }
}

pub mod var {
    //! Unsigned LEB128-style varints: low seven bits first, high bit marks continuation.

    /// Largest number of bytes a u64 varint occupies.
    pub const MAX_LEN: usize = 10;

    /// Returns the number of bytes `encode_u64` emits for `v`.
    #[inline]
    pub fn vsize(v: u64) -> usize {
        let bits = 64 - (v | 1).leading_zeros() as usize;
        bits.div_ceil(7)
    }

    /// Encodes `v`, handing each output byte to `emit` in order.
    #[inline]
    pub fn encode_u64_with(mut v: u64, mut emit: impl FnMut(u8)) {
        loop {
            let byte = (v & 0x7f) as u8;
            v >>= 7;
            if v == 0 {
                emit(byte);
                break;
            } else {
                emit(byte | 0x80);
            }
        }
    }

    /// Encodes a u64 as an unsigned varint.
    pub fn encode_u64(v: u64, out: &mut Vec<u8>) {
        encode_u64_with(v, |byte| out.push(byte));
    }

    /// Decodes a varint pulling bytes from `next`; `None` means the input ended.
    pub fn decode_u64_with(mut next: impl FnMut() -> Option<u8>) -> u64 {
        let mut result = 0u64;
        let mut shift = 0u32;
        for i in 0..MAX_LEN {
            let byte = match next() {
                Some(byte) => byte,
                None => panic!("varint decode truncated at byte {}", i),
            };
            let payload = (byte & 0x7f) as u64;
            result |= payload << shift;
            if (byte & 0x80) == 0 {
                if i == MAX_LEN - 1 && payload > 1 {
                    panic!("varint overflow (more than 64 bits)");
                }
                return result;
            }
            shift += 7;
            if shift >= 64 {
                panic!("varint too long (exceeds 64 bits)");
            }
        }
        panic!("varint too long (exceeded 10 bytes)");
    }

    /// Decodes a u64 varint from a slice, updating the offset.
    pub fn decode_u64(src: &[u8], off: &mut usize) -> u64 {
        decode_u64_with(|| {
            let byte = src.get(*off).copied();
            if byte.is_some() {
                *off += 1;
            }
            byte
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{be, var};
    use proptest::prelude::*;

    #[test]
    fn u32_roundtrip() {
        let mut dst = [0u8; 4];
        be::put_u32(&mut dst, 0xdead_beef);
        assert_eq!(dst, [0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(be::get_u32(&dst), 0xdead_beef);
    }

    #[test]
    fn vsize_matches_encoding_at_boundaries() {
        for v in [0u64, 1, 127, 128, 16_383, 16_384, (1 << 56) - 1, 1 << 56, (1 << 63) - 1] {
            let mut buf = Vec::new();
            var::encode_u64(v, &mut buf);
            assert_eq!(var::vsize(v), buf.len(), "value {v}");
        }
        assert_eq!(var::vsize(0), 1);
        assert_eq!(var::vsize((1 << 63) - 1), 9);
        assert_eq!(var::vsize(u64::MAX), 10);
    }

    #[test]
    fn varint_layout_is_low_bits_first() {
        let mut buf = Vec::new();
        var::encode_u64(300, &mut buf);
        assert_eq!(buf, vec![0xac, 0x02]);
    }

    #[test]
    fn varint_roundtrip_edges() {
        let mut buf = Vec::new();
        var::encode_u64(0, &mut buf);
        let mut off = 0;
        assert_eq!(var::decode_u64(&buf, &mut off), 0);
        assert_eq!(off, buf.len());

        buf.clear();
        var::encode_u64(u64::MAX, &mut buf);
        off = 0;
        assert_eq!(var::decode_u64(&buf, &mut off), u64::MAX);
        assert_eq!(off, buf.len());
    }

    #[test]
    #[should_panic(expected = "varint decode truncated")]
    fn varint_decode_rejects_truncated() {
        let data = vec![0x80]; // continuation bit without payload
        let mut off = 0;
        let _ = var::decode_u64(&data, &mut off);
    }

    #[test]
    #[should_panic(expected = "varint too long")]
    fn varint_decode_rejects_too_long() {
        let data = vec![0x81; 11];
        let mut off = 0;
        let _ = var::decode_u64(&data, &mut off);
    }

    proptest! {
        #[test]
        fn varint_roundtrip_u64_prop(v in any::<u64>()) {
            let mut buf = Vec::new();
            var::encode_u64(v, &mut buf);
            prop_assert_eq!(buf.len(), var::vsize(v));
            let mut off = 0;
            let decoded = var::decode_u64(&buf, &mut off);
            prop_assert_eq!(decoded, v);
            prop_assert_eq!(off, buf.len());
        }
    }
}
