use crate::artifacts::diff::Change;
use anyhow::Context;
use derive_new::new;

/// Myers' greedy O(N*D) shortest-edit-script search
///
/// `compute_shortest_edit` records the furthest-reaching `v` array per edit
/// distance `d` (the trace); `backtrack` walks the trace backwards to
/// recover the edit path as `(prev_x, prev_y, x, y)` moves; `script` maps
/// the path to line changes carrying both-side indices.
///
/// All diagonal lookups are bounds-checked and surface as errors instead of
/// panicking; the engine degrades to a positional diff when that happens.
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct MyersDiff<'d> {
    a: &'d [String],
    b: &'d [String],
}

type Trace = Vec<Vec<isize>>;
type EditPath = Vec<(isize, isize, isize, isize)>;

/// Read the furthest-reaching x for diagonal `k`
fn v_at(v: &[isize], offset: usize, k: isize) -> anyhow::Result<isize> {
    usize::try_from(offset as isize + k)
        .ok()
        .and_then(|idx| v.get(idx).copied())
        .with_context(|| format!("diagonal {k} out of range"))
}

fn v_set(v: &mut [isize], offset: usize, k: isize, x: isize) -> anyhow::Result<()> {
    let idx = usize::try_from(offset as isize + k)
        .ok()
        .filter(|idx| *idx < v.len())
        .with_context(|| format!("diagonal {k} out of range"))?;
    v[idx] = x;
    Ok(())
}

impl<'d> MyersDiff<'d> {
    fn compute_shortest_edit(&self) -> anyhow::Result<Trace> {
        let (n, m) = (self.a.len() as isize, self.b.len() as isize);
        let offset = (n + m) as usize;

        let mut v = vec![0; 2 * offset + 1];
        let mut trace = Vec::new();

        for d in 0..=(n + m) {
            trace.push(v.clone());

            for k in (-d..=d).step_by(2) {
                let mut x = if k == -d {
                    // we could have only come from k+1, thus an insertion
                    v_at(&v, offset, k + 1)?
                } else if k == d {
                    // we could have only come from k-1, thus a deletion
                    v_at(&v, offset, k - 1)? + 1
                } else {
                    // we could have come from either k-1 (deletion) or k+1 (insertion)
                    let x_del = v_at(&v, offset, k - 1)? + 1;
                    let x_ins = v_at(&v, offset, k + 1)?;
                    if x_del > x_ins { x_del } else { x_ins }
                };

                let mut y = x - k;
                while x < n && y < m && self.a[x as usize] == self.b[y as usize] {
                    // snake
                    x += 1;
                    y += 1;
                }

                v_set(&mut v, offset, k, x)?;

                if x >= n && y >= m {
                    return Ok(trace);
                }
            }
        }

        Ok(trace)
    }

    fn backtrack(&self) -> anyhow::Result<EditPath> {
        let (mut x, mut y) = (self.a.len() as isize, self.b.len() as isize);
        let offset = (x + y) as usize;
        let mut edit_path = Vec::new();

        let trace = self.compute_shortest_edit()?;

        for (d, v) in trace.iter().enumerate().rev() {
            let k = x - y;

            let prev_k = if k == -(d as isize) {
                k + 1
            } else if k == (d as isize) {
                k - 1
            } else {
                let k_del = k - 1;
                let k_ins = k + 1;
                if v_at(v, offset, k_del)? + 1 > v_at(v, offset, k_ins)? {
                    k_del
                } else {
                    k_ins
                }
            };

            let prev_x = v_at(v, offset, prev_k)?;
            let prev_y = prev_x - prev_k;

            while x > prev_x && y > prev_y {
                edit_path.push((x - 1, y - 1, x, y));
                x -= 1;
                y -= 1;
            }

            if d > 0 {
                edit_path.push((prev_x, prev_y, x, y));
            }

            (x, y) = (prev_x, prev_y);
        }

        Ok(edit_path)
    }

    /// Produce the edit script in original order, one line per change
    pub fn script(&self) -> anyhow::Result<Vec<Change>> {
        if self.a.is_empty() && self.b.is_empty() {
            return Ok(Vec::new());
        }

        let mut script = Vec::new();
        let path = self.backtrack()?;

        for (prev_x, prev_y, x, y) in path {
            if x == prev_x {
                // Insert: only y increased
                if prev_y < self.b.len() as isize {
                    script.push(Change::Insert {
                        new_index: prev_y as usize,
                        lines: vec![self.b[prev_y as usize].clone()],
                    });
                }
            } else if y == prev_y {
                // Delete: only x increased
                if prev_x < self.a.len() as isize {
                    script.push(Change::Delete {
                        old_index: prev_x as usize,
                        lines: vec![self.a[prev_x as usize].clone()],
                    });
                }
            } else {
                // Equal: both increased (diagonal move)
                if prev_x < self.a.len() as isize {
                    script.push(Change::Equal {
                        old_index: prev_x as usize,
                        new_index: prev_y as usize,
                        lines: vec![self.a[prev_x as usize].clone()],
                    });
                }
            }
        }

        script.reverse();
        Ok(script)
    }
}
