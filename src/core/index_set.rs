//! Sparse set of list positions stored as sorted, disjoint runs.
//!
//! Bulk invalidation of a whole series is a single run, so marking `n`
//! positions costs O(1) and walking them in ascending order costs O(runs)
//! bookkeeping. Runs are half-open and never adjacent: touching runs are
//! merged on insert.

use std::ops::Range;

use smallvec::SmallVec;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Run {
    start: usize,
    end: usize,
}

impl Run {
    const fn len(self) -> usize {
        self.end - self.start
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexSet {
    runs: Vec<Run>,
}

impl IndexSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Number of positions in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.runs.iter().map(|run| run.len()).sum()
    }

    #[must_use]
    pub fn run_count(&self) -> usize {
        self.runs.len()
    }

    #[must_use]
    pub fn first(&self) -> Option<usize> {
        self.runs.first().map(|run| run.start)
    }

    #[must_use]
    pub fn contains(&self, position: usize) -> bool {
        let index = self.runs.partition_point(|run| run.end <= position);
        self.runs
            .get(index)
            .is_some_and(|run| run.start <= position)
    }

    pub fn clear(&mut self) {
        self.runs.clear();
    }

    /// Inserts `[start, start + count)`.
    pub fn add_range(&mut self, start: usize, count: usize) {
        if count == 0 {
            return;
        }

        let mut merged = Run {
            start,
            end: start + count,
        };
        let lo = self.runs.partition_point(|run| run.end < merged.start);
        let mut hi = lo;
        while hi < self.runs.len() && self.runs[hi].start <= merged.end {
            merged.start = merged.start.min(self.runs[hi].start);
            merged.end = merged.end.max(self.runs[hi].end);
            hi += 1;
        }
        self.runs.splice(lo..hi, std::iter::once(merged));
    }

    pub fn add(&mut self, position: usize) {
        self.add_range(position, 1);
    }

    /// Removes a single position; returns whether it was present.
    pub fn remove(&mut self, position: usize) -> bool {
        let index = self.runs.partition_point(|run| run.end <= position);
        let Some(run) = self.runs.get(index).copied() else {
            return false;
        };
        if run.start > position {
            return false;
        }

        match (run.start == position, run.end == position + 1) {
            (true, true) => {
                self.runs.remove(index);
            }
            (true, false) => self.runs[index].start += 1,
            (false, true) => self.runs[index].end -= 1,
            (false, false) => {
                self.runs[index].end = position;
                self.runs.insert(
                    index + 1,
                    Run {
                        start: position + 1,
                        end: run.end,
                    },
                );
            }
        }
        true
    }

    /// Removes and returns the smallest position.
    pub fn pop_first(&mut self) -> Option<usize> {
        let first = self.first()?;
        self.remove(first);
        Some(first)
    }

    /// Removes every position inside `[start, start + count)`.
    pub fn remove_range(&mut self, start: usize, count: usize) {
        if count == 0 {
            return;
        }

        let end = start + count;
        let lo = self.runs.partition_point(|run| run.end <= start);
        let hi = self.runs.partition_point(|run| run.start < end);
        if lo >= hi {
            return;
        }

        let first = self.runs[lo];
        let last = self.runs[hi - 1];
        let mut kept: SmallVec<[Run; 2]> = SmallVec::new();
        if first.start < start {
            kept.push(Run {
                start: first.start,
                end: start,
            });
        }
        if last.end > end {
            kept.push(Run {
                start: end,
                end: last.end,
            });
        }
        self.runs.splice(lo..hi, kept);
    }

    /// Mirrors a list splice: drops `[position, position + removed)` and
    /// shifts every later position by `added - removed`.
    ///
    /// The `added` positions themselves are not inserted.
    pub fn splice(&mut self, position: usize, removed: usize, added: usize) {
        self.remove_range(position, removed);

        let tail = self.runs.partition_point(|run| run.start < position);
        if tail > 0 && self.runs[tail - 1].end > position {
            let end = self.runs[tail - 1].end;
            self.runs[tail - 1].end = position;
            self.runs.insert(tail, Run { start: position, end });
        }
        if added != removed {
            for run in &mut self.runs[tail..] {
                run.start = run.start - removed + added;
                run.end = run.end - removed + added;
            }
        }

        if tail > 0 && tail < self.runs.len() && self.runs[tail - 1].end == self.runs[tail].start {
            self.runs[tail - 1].end = self.runs[tail].end;
            self.runs.remove(tail);
        }
    }

    /// Iterates the contiguous runs in ascending order.
    pub fn runs(&self) -> impl Iterator<Item = Range<usize>> + '_ {
        self.runs.iter().map(|run| run.start..run.end)
    }

    /// Iterates every position in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.runs.iter().flat_map(|run| run.start..run.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(set: &IndexSet) -> Vec<usize> {
        set.iter().collect()
    }

    #[test]
    fn add_range_merges_touching_runs() {
        let mut set = IndexSet::new();
        set.add_range(0, 3);
        set.add_range(5, 2);
        assert_eq!(set.run_count(), 2);

        set.add_range(3, 2);
        assert_eq!(set.run_count(), 1);
        assert_eq!(collect(&set), vec![0, 1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn remove_splits_run() {
        let mut set = IndexSet::new();
        set.add_range(10, 5);
        assert!(set.remove(12));
        assert!(!set.remove(12));
        assert_eq!(collect(&set), vec![10, 11, 13, 14]);
        assert_eq!(set.run_count(), 2);
        assert_eq!(set.pop_first(), Some(10));
        assert_eq!(set.first(), Some(11));
    }

    #[test]
    fn splice_shifts_tail_and_drops_removed() {
        let mut set = IndexSet::new();
        set.add_range(0, 2);
        set.add_range(4, 2);
        set.add(9);

        // remove [1, 5) and insert 1 item in its place
        set.splice(1, 4, 1);
        assert_eq!(collect(&set), vec![0, 2, 6]);

        set.splice(0, 0, 3);
        assert_eq!(collect(&set), vec![3, 5, 9]);
    }

    #[test]
    fn splice_with_pure_removal_merges_neighbours() {
        let mut set = IndexSet::new();
        set.add_range(0, 2);
        set.add_range(4, 2);

        set.splice(2, 2, 0);
        assert_eq!(set.run_count(), 1);
        assert_eq!(collect(&set), vec![0, 1, 2, 3]);
    }

    #[test]
    fn splice_inside_a_run_shifts_its_tail() {
        let mut set = IndexSet::new();
        set.add_range(0, 10);

        set.splice(5, 0, 3);
        assert_eq!(collect(&set), vec![0, 1, 2, 3, 4, 8, 9, 10, 11, 12]);

        set.splice(5, 0, 0);
        assert_eq!(set.run_count(), 2);
    }

    #[test]
    fn contains_and_len() {
        let mut set = IndexSet::new();
        set.add_range(100, 1_000_000);
        assert!(set.contains(100));
        assert!(set.contains(1_000_099));
        assert!(!set.contains(99));
        assert!(!set.contains(1_000_100));
        assert_eq!(set.len(), 1_000_000);

        set.remove_range(0, 200);
        assert_eq!(set.first(), Some(200));
    }
}
