//! Slot allocation: per-block empty rings and the Full/Closed/Open lists.
use crate::node::{Block, Node, NodeInfo};
use crate::trie::Trie;
use crate::VALUE_LIMIT;

/// Which circular block list a block belongs to.
///
/// Full blocks have no empty slots, Closed blocks serve single-slot
/// placement only, Open blocks remain eligible for multi-slot placement.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum BlockClass {
    Full,
    Closed,
    Open,
}

impl Trie {
    fn bhead(&self, class: BlockClass) -> i32 {
        match class {
            BlockClass::Full => self.bhead_full,
            BlockClass::Closed => self.bhead_closed,
            BlockClass::Open => self.bhead_open,
        }
    }

    fn set_bhead(&mut self, class: BlockClass, bi: i32) {
        match class {
            BlockClass::Full => self.bhead_full = bi,
            BlockClass::Closed => self.bhead_closed = bi,
            BlockClass::Open => self.bhead_open = bi,
        }
    }

    /// Unlinks block `bi` from `class`; `last` means it was the sole
    /// member.
    fn pop_block(&mut self, bi: i32, class: BlockClass, last: bool) {
        if last {
            self.set_bhead(class, 0);
        } else {
            let prev = self.blocks[bi as usize].prev;
            let next = self.blocks[bi as usize].next;
            self.blocks[prev as usize].next = next;
            self.blocks[next as usize].prev = prev;
            if bi == self.bhead(class) {
                self.set_bhead(class, next);
            }
        }
    }

    /// Links block `bi` into `class`; `empty` means the list had no
    /// members.
    fn push_block(&mut self, bi: i32, class: BlockClass, empty: bool) {
        if empty {
            self.set_bhead(class, bi);
            self.blocks[bi as usize].prev = bi;
            self.blocks[bi as usize].next = bi;
        } else {
            let head = self.bhead(class);
            let tail = self.blocks[head as usize].prev;
            self.blocks[bi as usize].prev = tail;
            self.blocks[bi as usize].next = head;
            self.set_bhead(class, bi);
            self.blocks[head as usize].prev = bi;
            self.blocks[tail as usize].next = bi;
        }
    }

    fn transfer_block(&mut self, bi: i32, from: BlockClass, to: BlockClass) {
        let last = bi == self.blocks[bi as usize].next;
        self.pop_block(bi, from, last);
        let empty = self.bhead(to) == 0 && self.blocks[bi as usize].num != 0;
        self.push_block(bi, to, empty);
    }

    /// Appends one fully empty block, doubling the backing arrays when
    /// the allocated capacity is exhausted. Returns the new block index.
    pub(crate) fn add_block(&mut self) -> i32 {
        if self.size == self.capacity {
            self.capacity *= 2;
            self.nodes.resize(self.capacity as usize, Node::default());
            self.ninfos
                .resize(self.capacity as usize, NodeInfo::default());
            self.blocks
                .resize((self.capacity >> 8) as usize, Block::default());
        }

        let bi = self.size >> 8;
        self.blocks[bi as usize] = Block::new();
        self.blocks[bi as usize].ehead = self.size;

        // Thread the 256 new slots into one circular empty ring.
        self.nodes[self.size as usize] = Node {
            value: -(self.size + 255),
            check: -(self.size + 1),
        };
        for i in self.size + 1..self.size + 255 {
            self.nodes[i as usize] = Node {
                value: -(i - 1),
                check: -(i + 1),
            };
        }
        self.nodes[(self.size + 255) as usize] = Node {
            value: -(self.size + 254),
            check: -self.size,
        };

        let empty = self.bhead_open == 0;
        self.push_block(bi, BlockClass::Open, empty);
        self.size += 256;
        bi
    }

    /// Takes one empty slot out of its block's ring and marks it occupied
    /// under `from`.
    ///
    /// With `base >= 0` the caller demands the specific slot
    /// `base ^ label`; otherwise any slot is chosen and `from`'s base is
    /// set to reach it.
    pub(crate) fn pop_enode(&mut self, base: i32, label: u8, from: i32) -> i32 {
        let e = if base < 0 {
            self.find_place()
        } else {
            base ^ i32::from(label)
        };
        let bi = e >> 8;
        let n = self.nodes[e as usize];

        self.blocks[bi as usize].num -= 1;
        if self.blocks[bi as usize].num == 0 {
            if bi != 0 {
                self.transfer_block(bi, BlockClass::Closed, BlockClass::Full);
            }
        } else {
            // Splice `e` out of the ring; the links of an empty slot are
            // its negated neighbors.
            self.nodes[(-n.value) as usize].check = n.check;
            self.nodes[(-n.check) as usize].value = n.value;
            if e == self.blocks[bi as usize].ehead {
                self.blocks[bi as usize].ehead = -n.check;
            }
            if bi != 0
                && self.blocks[bi as usize].num == 1
                && self.blocks[bi as usize].trial != self.max_trial
            {
                self.transfer_block(bi, BlockClass::Open, BlockClass::Closed);
            }
        }

        self.nodes[e as usize] = Node {
            value: VALUE_LIMIT,
            check: from,
        };
        if base < 0 {
            self.nodes[from as usize].value = -(e ^ i32::from(label)) - 1;
        }
        e
    }

    /// Returns slot `e` to its block's empty ring and clears its sibling
    /// bookkeeping.
    pub(crate) fn push_enode(&mut self, e: i32) {
        let bi = e >> 8;
        self.blocks[bi as usize].num += 1;
        if self.blocks[bi as usize].num == 1 {
            self.blocks[bi as usize].ehead = e;
            self.nodes[e as usize] = Node {
                value: -e,
                check: -e,
            };
            if bi != 0 {
                self.transfer_block(bi, BlockClass::Full, BlockClass::Closed);
            }
        } else {
            let prev = self.blocks[bi as usize].ehead;
            let next = -self.nodes[prev as usize].check;
            self.nodes[e as usize] = Node {
                value: -prev,
                check: -next,
            };
            self.nodes[prev as usize].check = -e;
            self.nodes[next as usize].value = -e;
            if self.blocks[bi as usize].num == 2
                || self.blocks[bi as usize].trial == self.max_trial
            {
                if bi != 0 {
                    self.transfer_block(bi, BlockClass::Closed, BlockClass::Open);
                }
            }
            self.blocks[bi as usize].trial = 0;
        }

        let num = self.blocks[bi as usize].num as usize;
        if self.blocks[bi as usize].reject < self.reject[num] {
            self.blocks[bi as usize].reject = self.reject[num];
        }
        self.ninfos[e as usize] = NodeInfo::default();
    }

    /// Returns any single empty slot, preferring Closed blocks so that
    /// Open capacity stays available for sibling groups.
    pub(crate) fn find_place(&mut self) -> i32 {
        if self.bhead_closed != 0 {
            return self.blocks[self.bhead_closed as usize].ehead;
        }
        if self.bhead_open != 0 {
            return self.blocks[self.bhead_open as usize].ehead;
        }
        self.add_block() << 8
    }

    /// Returns a slot `e` such that `e ^ children[0] ^ c` is empty for
    /// every label `c` in `children`, scanning the Open list once and
    /// growing when nothing fits.
    ///
    /// Blocks that fail the scan remember the group size in their reject
    /// bound and burn one trial; a block out of trials is retired to the
    /// Closed list.
    pub(crate) fn find_places(&mut self, children: &[u8]) -> i32 {
        let mut bi = self.bhead_open;
        if bi != 0 {
            let tail = self.blocks[self.bhead_open as usize].prev;
            let nc = children.len() as i32;
            loop {
                if self.blocks[bi as usize].num >= nc && nc < self.blocks[bi as usize].reject {
                    let mut e = self.blocks[bi as usize].ehead;
                    loop {
                        let base = e ^ i32::from(children[0]);
                        let mut i = 0;
                        while self.nodes[(base ^ i32::from(children[i])) as usize].check < 0 {
                            if i == children.len() - 1 {
                                self.blocks[bi as usize].ehead = e;
                                return e;
                            }
                            i += 1;
                        }
                        e = -self.nodes[e as usize].check;
                        if e == self.blocks[bi as usize].ehead {
                            break;
                        }
                    }
                }

                self.blocks[bi as usize].reject = nc;
                let num = self.blocks[bi as usize].num as usize;
                if self.blocks[bi as usize].reject < self.reject[num] {
                    self.reject[num] = self.blocks[bi as usize].reject;
                }

                let next = self.blocks[bi as usize].next;
                self.blocks[bi as usize].trial += 1;
                if self.blocks[bi as usize].trial == self.max_trial {
                    self.transfer_block(bi, BlockClass::Open, BlockClass::Closed);
                }
                if bi == tail {
                    break;
                }
                bi = next;
            }
        }
        self.add_block() << 8
    }
}

#[cfg(test)]
mod tests {
    use crate::{Statistics, Trie};

    #[test]
    fn fresh_trie_charges_one_block() {
        let trie = Trie::new();
        assert_eq!(trie.blocks().len(), 1);
        assert_eq!(trie.blocks()[0].num, 256);
        assert_eq!(trie.blocks()[0].ehead, 1);
        assert_eq!(trie.num_vacants(), 255);
    }

    #[test]
    fn growth_doubles_capacity() {
        let mut trie = Trie::new();
        // Two-byte keys over a wide alphabet overflow block 0.
        for a in 1..=200u8 {
            for b in 1..=2u8 {
                trie.insert(&[a, b], i32::from(a)).unwrap();
            }
        }
        let status = trie.status();
        assert!(status.capacity >= 512);
        assert_eq!(status.capacity.count_ones(), 1);
        assert_eq!(status.size % 256, 0);
        assert!(status.size <= status.capacity);
    }

    #[test]
    fn released_slots_are_recycled() {
        let mut trie = Trie::new();
        for a in b'a'..=b'z' {
            trie.insert(&[a, a, a], i32::from(a)).unwrap();
        }
        let grown = trie.status().size;
        for a in b'a'..=b'z' {
            trie.remove(&[a, a, a]).unwrap();
        }
        for a in b'a'..=b'z' {
            trie.insert(&[a, a, a], i32::from(a)).unwrap();
        }
        // Reinsertion draws on the recycled rings; at most one extra block
        // of growth is tolerated.
        assert!(trie.status().size <= grown + 256);
        for a in b'a'..=b'z' {
            assert_eq!(trie.get(&[a, a, a]), Ok(i32::from(a)));
        }
    }
}
