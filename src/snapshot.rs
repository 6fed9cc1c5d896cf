//! Snapshot encoding of the whole trie record.
//!
//! The codec walks the plain-data arrays directly: a fixed header, the
//! global reject table, then the live prefix of the slot, sibling-info,
//! and block arrays, all little-endian. Restores are byte-for-byte:
//! a restored trie compares equal to its source and answers every query
//! identically.
use crate::bytes::{pack_i32, unpack_i32};
use crate::errors::{Result, TrieError};
use crate::node::{Block, Node, NodeInfo};
use crate::trie::Trie;

const MAGIC: &[u8; 4] = b"DART";
const VERSION: u8 = 1;
const HEADER_SIZE: usize = 32;
const REJECT_SIZE: usize = 257 * 4;

impl Trie {
    /// Serializes the trie into a self-describing byte buffer.
    ///
    /// # Examples
    ///
    /// ```
    /// use dartrie::Trie;
    ///
    /// let mut trie = Trie::new();
    /// trie.insert(b"ab", 23).unwrap();
    ///
    /// let restored = Trie::from_bytes(&trie.to_bytes()).unwrap();
    /// assert_eq!(restored.get(b"ab"), Ok(23));
    /// ```
    pub fn to_bytes(&self) -> Vec<u8> {
        let size = self.size as usize;
        let nblocks = size >> 8;
        let mut buf =
            Vec::with_capacity(HEADER_SIZE + REJECT_SIZE + size * 10 + nblocks * 24);

        buf.extend_from_slice(MAGIC);
        buf.push(VERSION);
        buf.push(u8::from(self.ordered));
        buf.extend_from_slice(&[0u8; 2]);
        pack_i32(&mut buf, self.max_trial);
        pack_i32(&mut buf, self.capacity);
        pack_i32(&mut buf, self.size);
        pack_i32(&mut buf, self.bhead_full);
        pack_i32(&mut buf, self.bhead_closed);
        pack_i32(&mut buf, self.bhead_open);

        for &r in self.reject.iter() {
            pack_i32(&mut buf, r);
        }
        for n in &self.nodes[..size] {
            pack_i32(&mut buf, n.value);
            pack_i32(&mut buf, n.check);
        }
        for i in &self.ninfos[..size] {
            buf.push(i.sibling);
            buf.push(i.child);
        }
        for b in &self.blocks[..nblocks] {
            pack_i32(&mut buf, b.prev);
            pack_i32(&mut buf, b.next);
            pack_i32(&mut buf, b.num);
            pack_i32(&mut buf, b.reject);
            pack_i32(&mut buf, b.trial);
            pack_i32(&mut buf, b.ehead);
        }
        buf
    }

    /// Reconstructs a trie from bytes produced by [`Trie::to_bytes`].
    ///
    /// # Errors
    ///
    /// [`TrieError::InvalidDataType`] when the magic, version, structural
    /// header fields, or the total length do not line up.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_SIZE || &bytes[0..4] != MAGIC {
            return Err(TrieError::InvalidDataType);
        }
        if bytes[4] != VERSION || bytes[5] > 1 {
            return Err(TrieError::InvalidDataType);
        }
        let ordered = bytes[5] == 1;
        let max_trial = unpack_i32(bytes, 8);
        let capacity = unpack_i32(bytes, 12);
        let size = unpack_i32(bytes, 16);
        let bhead_full = unpack_i32(bytes, 20);
        let bhead_closed = unpack_i32(bytes, 24);
        let bhead_open = unpack_i32(bytes, 28);

        if max_trial < 1
            || capacity < 256
            || (capacity as u32).count_ones() != 1
            || size < 256
            || size % 256 != 0
            || size > capacity
        {
            return Err(TrieError::InvalidDataType);
        }
        let nblocks = (size >> 8) as usize;
        for head in [bhead_full, bhead_closed, bhead_open] {
            if head < 0 || head as usize >= nblocks {
                return Err(TrieError::InvalidDataType);
            }
        }

        let size = size as usize;
        let expected = HEADER_SIZE + REJECT_SIZE + size * 10 + nblocks * 24;
        if bytes.len() != expected {
            return Err(TrieError::InvalidDataType);
        }

        let mut pos = HEADER_SIZE;
        let mut reject = [0i32; 257];
        for r in reject.iter_mut() {
            *r = unpack_i32(bytes, pos);
            pos += 4;
        }

        let mut nodes = Vec::with_capacity(capacity as usize);
        for _ in 0..size {
            nodes.push(Node {
                value: unpack_i32(bytes, pos),
                check: unpack_i32(bytes, pos + 4),
            });
            pos += 8;
        }
        let mut ninfos = Vec::with_capacity(capacity as usize);
        for _ in 0..size {
            ninfos.push(NodeInfo {
                sibling: bytes[pos],
                child: bytes[pos + 1],
            });
            pos += 2;
        }
        let mut blocks = Vec::with_capacity((capacity >> 8) as usize);
        for _ in 0..nblocks {
            blocks.push(Block {
                prev: unpack_i32(bytes, pos),
                next: unpack_i32(bytes, pos + 4),
                num: unpack_i32(bytes, pos + 8),
                reject: unpack_i32(bytes, pos + 12),
                trial: unpack_i32(bytes, pos + 16),
                ehead: unpack_i32(bytes, pos + 20),
            });
            pos += 24;
        }

        // Slots past `size` were never touched by the source trie; fresh
        // zeroed tails reproduce its allocator state exactly.
        nodes.resize(capacity as usize, Node::default());
        ninfos.resize(capacity as usize, NodeInfo::default());
        blocks.resize((capacity >> 8) as usize, Block::default());

        Ok(Self {
            nodes,
            ninfos,
            blocks,
            reject,
            bhead_full,
            bhead_closed,
            bhead_open,
            capacity,
            size: size as i32,
            ordered,
            max_trial,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::VALUE_LIMIT;

    fn sample() -> Trie {
        let mut trie = Trie::new();
        trie.insert(b"ab", 23).unwrap();
        trie.insert(b"abc", 19).unwrap();
        trie.insert(b"abcd", 37).unwrap();
        trie
    }

    #[test]
    fn round_trip_answers_identically() {
        let trie = sample();
        let restored = Trie::from_bytes(&trie.to_bytes()).unwrap();
        assert_eq!(restored, trie);

        assert_eq!(restored.get(b"ab"), Ok(23));
        assert_eq!(restored.get(b"abc"), Ok(19));
        assert_eq!(restored.get(b"abcd"), Ok(37));
        assert!(restored.get(b"a").is_err());

        let id = restored.jump(b"ab", 0).unwrap();
        assert_eq!(id, trie.jump(b"ab", 0).unwrap());
        assert_eq!(restored.key(id), Ok(b"ab".to_vec()));

        let matched: Vec<_> = restored.common_prefix_search(b"abcd").collect();
        assert_eq!(matched, trie.common_prefix_search(b"abcd").collect::<Vec<_>>());
        let predicted: Vec<_> = restored.predictive_search(b"ab").take(2).collect();
        assert_eq!(predicted, trie.predictive_search(b"ab").take(2).collect::<Vec<_>>());
        assert_eq!(restored.status(), trie.status());
    }

    #[test]
    fn restored_trie_accepts_further_writes() {
        let trie = sample();
        let mut restored = Trie::from_bytes(&trie.to_bytes()).unwrap();
        restored.remove(b"abc").unwrap();
        restored.insert(b"abx", 5).unwrap();
        assert_eq!(restored.get(b"abx"), Ok(5));
        assert_eq!(restored.get(b"abcd"), Ok(37));
    }

    #[test]
    fn round_trip_after_growth_and_deletes() {
        let mut trie = Trie::new();
        for i in 0..500u32 {
            trie.insert(format!("{:04}", i).as_bytes(), i as i32).unwrap();
        }
        for i in (0..500u32).step_by(3) {
            trie.remove(format!("{:04}", i).as_bytes()).unwrap();
        }
        let restored = Trie::from_bytes(&trie.to_bytes()).unwrap();
        assert_eq!(restored, trie);
        for i in 0..500u32 {
            assert_eq!(
                restored.get(format!("{:04}", i).as_bytes()),
                trie.get(format!("{:04}", i).as_bytes())
            );
        }
    }

    #[test]
    fn snapshot_encodes_the_configuration() {
        let trie = crate::Builder::new().ordered(false).max_trial(3).build();
        let restored = Trie::from_bytes(&trie.to_bytes()).unwrap();
        assert!(!restored.is_ordered());
        assert_eq!(restored.max_trial(), 3);
    }

    #[test]
    fn rejects_bad_magic() {
        let mut bytes = sample().to_bytes();
        bytes[0] = b'X';
        assert_eq!(Trie::from_bytes(&bytes), Err(TrieError::InvalidDataType));
    }

    #[test]
    fn rejects_unknown_version() {
        let mut bytes = sample().to_bytes();
        bytes[4] = 99;
        assert_eq!(Trie::from_bytes(&bytes), Err(TrieError::InvalidDataType));
    }

    #[test]
    fn rejects_truncation() {
        let bytes = sample().to_bytes();
        assert_eq!(Trie::from_bytes(&bytes[..10]), Err(TrieError::InvalidDataType));
        assert_eq!(
            Trie::from_bytes(&bytes[..bytes.len() - 1]),
            Err(TrieError::InvalidDataType)
        );
    }

    #[test]
    fn rejects_implausible_header() {
        let mut bytes = sample().to_bytes();
        // A size that is not a block multiple cannot be a real record.
        let bad = 257i32.to_le_bytes();
        bytes[16..20].copy_from_slice(&bad);
        assert_eq!(Trie::from_bytes(&bytes), Err(TrieError::InvalidDataType));
    }

    #[test]
    fn value_limit_is_stable_across_the_wire() {
        // The codec fixes slots at 32 bits, so the sentinel is pinned.
        assert_eq!(VALUE_LIMIT, i32::MAX);
    }
}
