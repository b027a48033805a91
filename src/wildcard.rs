//! Wildcard expansion for fuzzy search.
//!
//! A keyword of `n` characters expands into `2n + 1` variants: a `*` inserted
//! at each of the `n + 1` positions, and each of the `n` characters replaced
//! by `*`. Two words within one insertion, deletion or substitution of each
//! other share at least one variant, so indexing and querying the expanded
//! lists turns exact token matching into approximate keyword matching.

const WILDCARD: char = '*';

/// Expands a single word, in position order.
///
/// # Example
///
/// ```rust
/// use searchable_vault::wildcard::expand;
///
/// assert_eq!(expand("ab"), vec!["*ab", "*b", "a*b", "a*", "ab*"]);
/// ```
pub fn expand(word: &str) -> Vec<String> {
    let chars: Vec<char> = word.chars().collect();
    let n = chars.len();

    let mut variants = Vec::with_capacity(2 * n + 1);
    for i in 0..=n {
        variants.push(splice(&chars, i, i));
        if i < n {
            variants.push(splice(&chars, i, i + 1));
        }
    }
    variants
}

/// Expands every word, keeping one list per word in input order.
pub fn expand_all<S: AsRef<str>>(words: &[S]) -> Vec<Vec<String>> {
    words.iter().map(|w| expand(w.as_ref())).collect()
}

// chars[..start] + '*' + chars[end..]
fn splice(chars: &[char], start: usize, end: usize) -> String {
    chars[..start]
        .iter()
        .chain(std::iter::once(&WILDCARD))
        .chain(chars[end..].iter())
        .collect()
}
