//! Little-endian packing helpers for the snapshot codec.

/// Appends `v` to `buf` as four little-endian bytes.
#[inline]
pub(crate) fn pack_i32(buf: &mut Vec<u8>, v: i32) {
    buf.extend_from_slice(&v.to_le_bytes());
}

/// Reads the `i32` stored at `pos`.
///
/// The caller must have validated that `slice[pos..pos + 4]` is in
/// bounds.
#[inline]
pub(crate) fn unpack_i32(slice: &[u8], pos: usize) -> i32 {
    i32::from_le_bytes(slice[pos..pos + 4].try_into().unwrap())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let mut buf = vec![];
        for v in [0, 1, -1, i32::MAX, i32::MIN, 256, -(1 << 20)] {
            pack_i32(&mut buf, v);
        }
        for (i, v) in [0, 1, -1, i32::MAX, i32::MIN, 256, -(1 << 20)]
            .iter()
            .enumerate()
        {
            assert_eq!(unpack_i32(&buf, i * 4), *v);
        }
    }
}
