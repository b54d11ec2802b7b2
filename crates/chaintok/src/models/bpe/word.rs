//! # BPE Word
//!
//! A pre-token as a doubly-linked list of symbols, merged in place.

use crate::types::{Rank, TokenType};
use crate::vocab::MergeRanks;
use core::cmp::Reverse;
use dary_heap::OctonaryHeap;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Symbol<T: TokenType> {
    id: T,
    prev: Option<usize>,
    next: Option<usize>,
    /// Byte length; `0` once merged away.
    len: usize,
}

/// Heap entry; ordered by rank, then by position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct MergeJob<T: TokenType> {
    rank: Rank,
    pos: usize,
    merged: T,
}

/// A word being merged.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Word<T: TokenType> {
    symbols: Vec<Symbol<T>>,
}

impl<T: TokenType> Word<T> {
    /// Create an empty word.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            symbols: Vec::with_capacity(capacity),
        }
    }

    /// Append a symbol covering `len` bytes.
    pub fn add(
        &mut self,
        id: T,
        len: usize,
    ) {
        let idx = self.symbols.len();
        let prev = idx.checked_sub(1);
        if let Some(p) = prev {
            self.symbols[p].next = Some(idx);
        }
        self.symbols.push(Symbol {
            id,
            prev,
            next: None,
            len,
        });
    }

    /// The number of live symbols.
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Returns `true` if the word has no symbols.
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// The symbol ids, in order.
    pub fn ids(&self) -> impl Iterator<Item = T> + '_ {
        self.symbols.iter().map(|s| s.id)
    }

    /// Apply merges, lowest rank first and leftmost first on ties, until
    /// no adjacent pair has a merge.
    pub fn merge_all(
        &mut self,
        merges: &MergeRanks<T>,
    ) {
        let job_at = |symbols: &[Symbol<T>], pos: usize, next: usize| {
            merges
                .get(&(symbols[pos].id, symbols[next].id))
                .map(|(rank, merged)| Reverse(MergeJob { rank, pos, merged }))
        };

        let mut queue = OctonaryHeap::with_capacity(self.symbols.len());
        for pos in 1..self.symbols.len() {
            if let Some(job) = job_at(&self.symbols, pos - 1, pos) {
                queue.push(job);
            }
        }

        while let Some(Reverse(job)) = queue.pop() {
            let current = self.symbols[job.pos];
            if current.len == 0 {
                continue;
            }
            let Some(next_pos) = current.next else {
                continue;
            };
            let right = self.symbols[next_pos];

            // Stale entry: the pair changed since the job was queued.
            match merges.get(&(current.id, right.id)) {
                Some((_, merged)) if merged == job.merged => {}
                _ => continue,
            }

            self.symbols[job.pos] = Symbol {
                id: job.merged,
                prev: current.prev,
                next: right.next,
                len: current.len + right.len,
            };
            self.symbols[next_pos].len = 0;
            if let Some(after) = right.next {
                self.symbols[after].prev = Some(job.pos);
            }

            if let Some(prev) = current.prev
                && let Some(left_job) = job_at(&self.symbols, prev, job.pos)
            {
                queue.push(left_job);
            }
            if let Some(after) = right.next
                && let Some(right_job) = job_at(&self.symbols, job.pos, after)
            {
                queue.push(right_job);
            }
        }

        self.compact();
    }

    /// Drop merged-away symbols and relink.
    fn compact(&mut self) {
        self.symbols.retain(|s| s.len != 0);
        let n = self.symbols.len();
        for (i, s) in self.symbols.iter_mut().enumerate() {
            s.prev = i.checked_sub(1);
            s.next = (i + 1 < n).then_some(i + 1);
        }
    }
}
