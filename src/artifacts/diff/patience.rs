use crate::artifacts::diff::Change;
use crate::artifacts::diff::myers::MyersDiff;
use derive_new::new;
use std::collections::HashMap;

/// Patience diff
///
/// Anchors on lines that occur exactly once in both inputs, keeps the
/// longest increasing run of those anchors (patience sorting), and recurses
/// into the gaps with the Myers search. Produces more readable scripts than
/// plain Myers when the inputs share duplicated boilerplate lines. Without
/// any unique common line the whole range degrades to Myers.
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct PatienceDiff<'d> {
    a: &'d [String],
    b: &'d [String],
}

impl<'d> PatienceDiff<'d> {
    pub fn script(&self) -> anyhow::Result<Vec<Change>> {
        let mut script = Vec::new();
        self.diff_range(0, self.a.len(), 0, self.b.len(), &mut script)?;
        Ok(script)
    }

    fn diff_range(
        &self,
        a_lo: usize,
        a_hi: usize,
        b_lo: usize,
        b_hi: usize,
        out: &mut Vec<Change>,
    ) -> anyhow::Result<()> {
        if a_lo == a_hi && b_lo == b_hi {
            return Ok(());
        }

        let anchors = longest_increasing_run(&self.unique_anchors(a_lo, a_hi, b_lo, b_hi));
        if anchors.is_empty() {
            return self.myers_range(a_lo, a_hi, b_lo, b_hi, out);
        }

        let (mut prev_a, mut prev_b) = (a_lo, b_lo);
        for (a_pos, b_pos) in anchors {
            self.diff_range(prev_a, a_pos, prev_b, b_pos, out)?;
            out.push(Change::Equal {
                old_index: a_pos,
                new_index: b_pos,
                lines: vec![self.a[a_pos].clone()],
            });
            prev_a = a_pos + 1;
            prev_b = b_pos + 1;
        }

        self.diff_range(prev_a, a_hi, prev_b, b_hi, out)
    }

    fn myers_range(
        &self,
        a_lo: usize,
        a_hi: usize,
        b_lo: usize,
        b_hi: usize,
        out: &mut Vec<Change>,
    ) -> anyhow::Result<()> {
        let script = MyersDiff::new(&self.a[a_lo..a_hi], &self.b[b_lo..b_hi]).script()?;
        out.extend(script.into_iter().map(|change| shift(change, a_lo, b_lo)));
        Ok(())
    }

    /// Lines occurring exactly once on both sides of the range, as
    /// `(a_pos, b_pos)` pairs ordered by `a_pos`
    fn unique_anchors(
        &self,
        a_lo: usize,
        a_hi: usize,
        b_lo: usize,
        b_hi: usize,
    ) -> Vec<(usize, usize)> {
        let mut occurrences: HashMap<&str, (usize, usize)> = HashMap::new();
        for pos in a_lo..a_hi {
            let entry = occurrences.entry(self.a[pos].as_str()).or_insert((0, pos));
            entry.0 += 1;
            entry.1 = pos;
        }

        let mut matches: HashMap<&str, (usize, usize)> = HashMap::new();
        for pos in b_lo..b_hi {
            if matches!(occurrences.get(self.b[pos].as_str()), Some((1, _))) {
                let entry = matches.entry(self.b[pos].as_str()).or_insert((0, pos));
                entry.0 += 1;
                entry.1 = pos;
            }
        }

        let mut anchors = occurrences
            .iter()
            .filter(|(_, (count_a, _))| *count_a == 1)
            .filter_map(|(line, (_, pos_a))| match matches.get(line) {
                Some((1, pos_b)) => Some((*pos_a, *pos_b)),
                _ => None,
            })
            .collect::<Vec<_>>();
        anchors.sort_unstable();
        anchors
    }
}

fn shift(change: Change, a_off: usize, b_off: usize) -> Change {
    match change {
        Change::Equal {
            old_index,
            new_index,
            lines,
        } => Change::Equal {
            old_index: old_index + a_off,
            new_index: new_index + b_off,
            lines,
        },
        Change::Insert { new_index, lines } => Change::Insert {
            new_index: new_index + b_off,
            lines,
        },
        Change::Delete { old_index, lines } => Change::Delete {
            old_index: old_index + a_off,
            lines,
        },
    }
}

/// Longest increasing run of anchors by b-position, via patience sorting
///
/// Anchors arrive ordered by a-position. Each anchor is binary-inserted onto
/// the leftmost pile whose top has a b-position not below its own, keeping a
/// backpointer to the top of the previous pile; walking backpointers from
/// the last pile yields the run.
fn longest_increasing_run(anchors: &[(usize, usize)]) -> Vec<(usize, usize)> {
    let mut piles: Vec<usize> = Vec::new();
    let mut back: Vec<Option<usize>> = vec![None; anchors.len()];

    for (index, &(_, b_pos)) in anchors.iter().enumerate() {
        let pile = piles.partition_point(|&top| anchors[top].1 < b_pos);
        if pile > 0 {
            back[index] = Some(piles[pile - 1]);
        }
        if pile == piles.len() {
            piles.push(index);
        } else {
            piles[pile] = index;
        }
    }

    let mut run = Vec::new();
    let mut current = piles.last().copied();
    while let Some(index) = current {
        run.push(anchors[index]);
        current = back[index];
    }
    run.reverse();
    run
}
