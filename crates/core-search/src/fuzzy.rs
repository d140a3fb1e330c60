//! Token-level fuzzy matching.
//!
//! A line is split at Unicode word boundaries; whitespace tokens are
//! ignored. For every token two strategies are tried in order:
//! *sequential* (all query letters appear in order) and *chunk* (the query
//! split in two halves, each found as a substring). Both compare
//! case-insensitively and report the matched columns.

use smallvec::SmallVec;
use unicode_segmentation::UnicodeSegmentation;

pub(crate) const SCORE_EXACT: i32 = 1000;
const SCORE_SEQUENTIAL: i32 = 500;
const SCORE_CHUNK: i32 = 250;

pub(crate) type Cols = SmallVec<[usize; 16]>;

/// A token `[start, start + len)` in code points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Token {
    pub start: usize,
    pub len: usize,
}

pub(crate) fn tokens(line: &str) -> Vec<Token> {
    let mut out = Vec::new();
    let mut col = 0;
    for piece in line.split_word_bounds() {
        let len = piece.chars().count();
        if !piece.chars().all(char::is_whitespace) {
            out.push(Token { start: col, len });
        }
        col += len;
    }
    out
}

pub(crate) fn eq_fold(a: char, b: char) -> bool {
    a == b || a.to_lowercase().eq(b.to_lowercase())
}

/// Columns (token-relative) of an in-order subsequence match.
fn sequential(token: &[char], query: &[char]) -> Option<Cols> {
    let mut cols = Cols::new();
    let mut qi = 0;
    for (i, c) in token.iter().enumerate() {
        if qi < query.len() && eq_fold(*c, query[qi]) {
            cols.push(i);
            qi += 1;
        }
    }
    (qi == query.len()).then_some(cols)
}

fn find_sub(hay: &[char], needle: &[char]) -> Option<usize> {
    if needle.is_empty() || needle.len() > hay.len() {
        return None;
    }
    (0..=hay.len() - needle.len())
        .find(|&i| hay[i..i + needle.len()].iter().zip(needle).all(|(a, b)| eq_fold(*a, *b)))
}

/// Both halves of the query present as substrings.
fn chunk(token: &[char], query: &[char]) -> Option<Cols> {
    if query.len() < 2 {
        return None;
    }
    let (left, right) = query.split_at(query.len() / 2);
    let a = find_sub(token, left)?;
    let b = find_sub(token, right)?;
    let mut cols: Cols = (a..a + left.len()).chain(b..b + right.len()).collect();
    cols.sort_unstable();
    cols.dedup();
    Some(cols)
}

/// Score and token-relative columns for one token.
pub(crate) fn match_token(token: &[char], query: &[char]) -> Option<(i32, Cols)> {
    if query.is_empty() {
        return None;
    }
    if let Some(cols) = sequential(token, query) {
        let spread = cols.last().copied().unwrap_or(0) - cols.first().copied().unwrap_or(0);
        return Some((SCORE_SEQUENTIAL - spread as i32, cols));
    }
    chunk(token, query).map(|cols| (SCORE_CHUNK - token.len() as i32, cols))
}
