// Edit-distance based name matching.

use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

pub const SIMILARITY_THRESHOLD: f64 = 0.7;

/// Levenshtein distance over Unicode scalar values, full O(n*m) table.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    let mut table = vec![vec![0usize; b.len() + 1]; a.len() + 1];
    for (i, row) in table.iter_mut().enumerate() {
        row[0] = i;
    }
    for j in 0..=b.len() {
        table[0][j] = j;
    }

    for i in 1..=a.len() {
        for j in 1..=b.len() {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            table[i][j] = (table[i - 1][j] + 1)
                .min(table[i][j - 1] + 1)
                .min(table[i - 1][j - 1] + cost);
        }
    }

    table[a.len()][b.len()]
}

/// `(max_len - distance) / max_len`, with two empty strings counting as identical.
pub fn similarity(a: &str, b: &str) -> f64 {
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    (max_len - levenshtein(a, b)) as f64 / max_len as f64
}

pub fn is_similar(a: &str, b: &str) -> bool {
    similarity(a, b) > SIMILARITY_THRESHOLD
}

/// Lowercase, strip accents and collapse whitespace: "  São   Paulo" -> "sao paulo".
pub fn fold(name: &str) -> String {
    let stripped: String = name
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Compare two place names after folding case, accents and spacing.
pub fn same_place(a: &str, b: &str) -> bool {
    let (a, b) = (fold(a), fold(b));
    a == b || is_similar(&a, &b)
}
