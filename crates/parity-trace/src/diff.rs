//! Token-level diff for frame sequences
//!
//! Longest-common-subsequence alignment over whole frames. Used only to
//! explain a mismatch; equality is decided elsewhere.

use std::fmt::Write;

/// Edit operation for one token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffOp {
    /// Present on both sides
    Equal,
    /// Only in the expected (reference) sequence
    Delete,
    /// Only in the actual (candidate) sequence
    Insert,
}

/// One aligned token with its position on each side it appears on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffEntry {
    pub op: DiffOp,
    pub expected_index: Option<usize>,
    pub actual_index: Option<usize>,
    pub token: String,
}

/// Align `expected` against `actual`
pub fn diff_tokens<S: AsRef<str>>(expected: &[S], actual: &[S]) -> Vec<DiffEntry> {
    let n = expected.len();
    let m = actual.len();
    let eq = |i: usize, j: usize| expected[i].as_ref() == actual[j].as_ref();

    // lcs[i][j] = LCS length of expected[i..] and actual[j..]
    let mut lcs = vec![vec![0usize; m + 1]; n + 1];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            lcs[i][j] = if eq(i, j) {
                lcs[i + 1][j + 1] + 1
            } else {
                lcs[i + 1][j].max(lcs[i][j + 1])
            };
        }
    }

    let delete = |i: usize| DiffEntry {
        op: DiffOp::Delete,
        expected_index: Some(i),
        actual_index: None,
        token: expected[i].as_ref().to_string(),
    };
    let insert = |j: usize| DiffEntry {
        op: DiffOp::Insert,
        expected_index: None,
        actual_index: Some(j),
        token: actual[j].as_ref().to_string(),
    };

    let mut entries = Vec::with_capacity(n.max(m));
    let (mut i, mut j) = (0, 0);
    while i < n && j < m {
        if eq(i, j) {
            entries.push(DiffEntry {
                op: DiffOp::Equal,
                expected_index: Some(i),
                actual_index: Some(j),
                token: expected[i].as_ref().to_string(),
            });
            i += 1;
            j += 1;
        } else if lcs[i + 1][j] >= lcs[i][j + 1] {
            entries.push(delete(i));
            i += 1;
        } else {
            entries.push(insert(j));
            j += 1;
        }
    }
    entries.extend((i..n).map(delete));
    entries.extend((j..m).map(insert));

    entries
}

/// Render aligned entries as annotated text
///
/// Each line is `<op> [<expected index>,<actual index>] <token>`, with `-`
/// for a side the token is absent from.
pub fn render(entries: &[DiffEntry], expected_label: &str, actual_label: &str) -> String {
    let index = |i: Option<usize>| i.map_or_else(|| "-".to_string(), |i| i.to_string());

    let mut out = String::new();
    let _ = writeln!(out, "--- {}", expected_label);
    let _ = writeln!(out, "+++ {}", actual_label);
    for entry in entries {
        let marker = match entry.op {
            DiffOp::Equal => ' ',
            DiffOp::Delete => '-',
            DiffOp::Insert => '+',
        };
        let _ = writeln!(
            out,
            "{} [{},{}] {}",
            marker,
            index(entry.expected_index),
            index(entry.actual_index),
            entry.token
        );
    }
    out
}
