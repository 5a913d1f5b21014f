//! "Did you mean" suggestions for unrecognized flags.

use crate::types::SEPARATORS;

const SIMILARITY_THRESHOLD: f64 = 0.6;
const MAX_SUGGESTIONS: usize = 3;

fn segments(flag: &str) -> impl Iterator<Item = &str> {
    flag.split(|c: char| SEPARATORS.contains(c))
}

fn shared_segments(a: &str, b: &str) -> usize {
    segments(a)
        .zip(segments(b))
        .take_while(|(x, y)| x == y)
        .count()
}

/// Up to three known flags closest to `unknown`, best first, each with its
/// `--` prefix.
///
/// Candidates are first narrowed to the flags sharing the most leading
/// path segments with `unknown`, so a typo deep in one subtree is
/// not matched against another subtree.
pub(crate) fn nearest<'a>(unknown: &str, known: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let unknown = unknown.trim_start_matches('-');
    let known: Vec<&str> = known.into_iter().collect();

    let best_prefix = known
        .iter()
        .map(|flag| shared_segments(unknown, flag))
        .max()
        .unwrap_or(0);
    let mut scored: Vec<(f64, &str)> = known
        .iter()
        .filter(|flag| shared_segments(unknown, flag) == best_prefix)
        .map(|flag| (strsim::jaro_winkler(unknown, flag), *flag))
        .filter(|(similarity, _)| *similarity >= SIMILARITY_THRESHOLD)
        .collect();
    scored.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| a.1.cmp(b.1)));
    scored.dedup_by(|a, b| a.1 == b.1);

    scored
        .into_iter()
        .take(MAX_SUGGESTIONS)
        .map(|(_, flag)| format!("--{flag}"))
        .collect()
}
