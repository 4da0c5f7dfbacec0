//! Token-level text diff for comparison reports.
//!
//! Text is split into word runs, whitespace runs and single punctuation
//! characters, then aligned by longest common subsequence.

/// What a span of text does between the old and the new side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffOp {
    Equal,
    Insert,
    Delete,
}

/// A run of text with one operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffSpan {
    pub op: DiffOp,
    pub text: String,
}

impl DiffSpan {
    fn new(op: DiffOp, text: impl Into<String>) -> Self {
        Self {
            op,
            text: text.into(),
        }
    }
}

/// Largest LCS table built before falling back to a whole-text replace.
const MAX_TABLE_CELLS: usize = 4_000_000;

/// Whether any span is an insertion or deletion.
pub fn has_changes(spans: &[DiffSpan]) -> bool {
    spans.iter().any(|s| s.op != DiffOp::Equal)
}

/// Diffs `old` against `new`.
///
/// Concatenating the `Equal` and `Delete` spans yields `old`; the `Equal`
/// and `Insert` spans yield `new`. Adjacent spans never share an op.
pub fn diff_tokens(old: &str, new: &str) -> Vec<DiffSpan> {
    let a = tokenize(old);
    let b = tokenize(new);

    let prefix = a.iter().zip(&b).take_while(|(x, y)| x == y).count();
    let suffix = a[prefix..]
        .iter()
        .rev()
        .zip(b[prefix..].iter().rev())
        .take_while(|(x, y)| x == y)
        .count();

    let mut spans = Vec::new();
    push(&mut spans, DiffOp::Equal, &a[..prefix]);
    let (mid_a, mid_b) = (&a[prefix..a.len() - suffix], &b[prefix..b.len() - suffix]);

    if (mid_a.len() + 1).saturating_mul(mid_b.len() + 1) > MAX_TABLE_CELLS {
        push(&mut spans, DiffOp::Delete, mid_a);
        push(&mut spans, DiffOp::Insert, mid_b);
    } else {
        align(&mut spans, mid_a, mid_b);
    }

    push(&mut spans, DiffOp::Equal, &a[a.len() - suffix..]);
    spans
}

fn align(spans: &mut Vec<DiffSpan>, a: &[&str], b: &[&str]) {
    let (n, m) = (a.len(), b.len());
    let width = m + 1;
    // lcs[i * width + j] = LCS length of a[i..] and b[j..]
    let mut lcs = vec![0u32; (n + 1) * width];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            lcs[i * width + j] = if a[i] == b[j] {
                lcs[(i + 1) * width + j + 1] + 1
            } else {
                lcs[(i + 1) * width + j].max(lcs[i * width + j + 1])
            };
        }
    }

    let (mut i, mut j) = (0, 0);
    while i < n && j < m {
        if a[i] == b[j] {
            push(spans, DiffOp::Equal, &a[i..=i]);
            i += 1;
            j += 1;
        } else if lcs[(i + 1) * width + j] >= lcs[i * width + j + 1] {
            push(spans, DiffOp::Delete, &a[i..=i]);
            i += 1;
        } else {
            push(spans, DiffOp::Insert, &b[j..=j]);
            j += 1;
        }
    }
    push(spans, DiffOp::Delete, &a[i..]);
    push(spans, DiffOp::Insert, &b[j..]);
}

fn push(spans: &mut Vec<DiffSpan>, op: DiffOp, tokens: &[&str]) {
    if tokens.is_empty() {
        return;
    }
    let text: String = tokens.concat();
    match spans.last_mut() {
        Some(last) if last.op == op => last.text.push_str(&text),
        _ => spans.push(DiffSpan::new(op, text)),
    }
}

#[derive(PartialEq, Clone, Copy)]
enum Class {
    Word,
    Space,
    Other,
}

fn class_of(c: char) -> Class {
    if c.is_alphanumeric() || c == '_' {
        Class::Word
    } else if c.is_whitespace() {
        Class::Space
    } else {
        Class::Other
    }
}

fn tokenize(text: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut start = 0;
    let mut current: Option<Class> = None;

    for (pos, c) in text.char_indices() {
        let class = class_of(c);
        let continues = current == Some(class) && class != Class::Other;
        if !continues && pos > start {
            tokens.push(&text[start..pos]);
            start = pos;
        }
        current = Some(class);
    }
    if start < text.len() {
        tokens.push(&text[start..]);
    }
    tokens
}
