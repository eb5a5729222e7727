//! Benchmark utilities.

use rand::seq::SliceRandom;
use rand::Rng;

const ALPHABET: &[char] = &['a', 'b', 'c', 'd', 'e', ' ', '\n', 'é', '🙂'];

/// Generate random text of `len` characters.
pub fn random_text(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| *ALPHABET.choose(&mut rng).unwrap_or(&'a'))
        .collect()
}

/// Replace a random span of up to `max_span` characters with fresh text.
pub fn random_edit(text: &str, max_span: usize) -> String {
    let mut rng = rand::thread_rng();
    let chars: Vec<char> = text.chars().collect();
    let at = rng.gen_range(0..=chars.len());
    let end = (at + rng.gen_range(0..=max_span)).min(chars.len());

    let mut edited: String = chars[..at].iter().collect();
    edited.push_str(&random_text(rng.gen_range(0..=max_span)));
    edited.extend(&chars[end..]);
    edited
}

/// Generate a chain of `count` edits starting from `base`.
pub fn edit_chain(base: &str, count: usize, max_span: usize) -> Vec<String> {
    let mut texts = Vec::with_capacity(count + 1);
    texts.push(base.to_string());
    for _ in 0..count {
        let next = random_edit(texts.last().map_or(base, String::as_str), max_span);
        texts.push(next);
    }
    texts
}
