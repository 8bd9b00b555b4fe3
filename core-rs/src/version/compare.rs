//! Dotted version comparison
//!
//! Versions are canonicalized before comparison: `-`, `_` and `+` act as
//! separators like `.`, and a switch between digits and letters starts a new
//! segment, so `1.0rc1` compares as `1.0.rc.1`.
//!
//! Segment order: `dev` < `alpha`/`a` < `beta`/`b` < `rc` < number < `pl`/`p`.
//! When one version runs out of segments, a trailing number on the other
//! makes the other greater (`1.0` < `1.0.0`), while a trailing tag compares
//! against the release: `1.0.0-beta` < `1.0.0` < `1.0.0pl1`.

use std::cmp::Ordering;

/// One canonical version segment. Variant order is the comparison order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Segment {
    Dev,
    Alpha,
    Beta,
    ReleaseCandidate,
    Number(u64),
    Patch,
}

impl Segment {
    fn from_word(word: &str) -> Option<Self> {
        match word.to_ascii_lowercase().as_str() {
            "dev" => Some(Segment::Dev),
            "alpha" | "a" => Some(Segment::Alpha),
            "beta" | "b" => Some(Segment::Beta),
            "rc" => Some(Segment::ReleaseCandidate),
            "pl" | "p" => Some(Segment::Patch),
            _ => None,
        }
    }
}

/// Split a version string into canonical segments.
///
/// Returns `None` for an empty version or when any segment is neither a
/// number nor a known pre-release/patch word. A single leading `v` before a
/// digit is accepted (`v1.2` == `1.2`).
pub fn canonicalize(version: &str) -> Option<Vec<Segment>> {
    let mut text = version.trim();
    if let Some(rest) = text.strip_prefix(['v', 'V']) {
        if rest.starts_with(|c: char| c.is_ascii_digit()) {
            text = rest;
        }
    }
    if text.is_empty() {
        return None;
    }

    let mut segments = Vec::new();
    let mut token = String::new();

    let flush = |token: &mut String, segments: &mut Vec<Segment>| -> Option<()> {
        if token.is_empty() {
            return Some(());
        }
        let segment = if token.chars().all(|c| c.is_ascii_digit()) {
            Segment::Number(token.parse().ok()?)
        } else {
            Segment::from_word(token)?
        };
        segments.push(segment);
        token.clear();
        Some(())
    };

    for c in text.chars() {
        match c {
            '.' | '-' | '_' | '+' => flush(&mut token, &mut segments)?,
            c if c.is_ascii_alphanumeric() => {
                let boundary = token
                    .chars()
                    .last()
                    .map(|prev| prev.is_ascii_digit() != c.is_ascii_digit())
                    .unwrap_or(false);
                if boundary {
                    flush(&mut token, &mut segments)?;
                }
                token.push(c);
            }
            _ => return None,
        }
    }
    flush(&mut token, &mut segments)?;

    if segments.is_empty() {
        None
    } else {
        Some(segments)
    }
}

/// Stand-in for the end of a version when a pre-release or patch tag trails
const RELEASE: Segment = Segment::Number(0);

/// Compare two version strings.
///
/// Returns `None` when either side cannot be canonicalized.
pub fn compare_versions(left: &str, right: &str) -> Option<Ordering> {
    let left = canonicalize(left)?;
    let right = canonicalize(right)?;

    for i in 0..left.len().max(right.len()) {
        let ordering = match (left.get(i), right.get(i)) {
            (Some(a), Some(b)) => a.cmp(b),
            (Some(Segment::Number(_)), None) => Ordering::Greater,
            (None, Some(Segment::Number(_))) => Ordering::Less,
            (Some(tag), None) => tag.cmp(&RELEASE),
            (None, Some(tag)) => RELEASE.cmp(tag),
            (None, None) => Ordering::Equal,
        };
        if ordering != Ordering::Equal {
            return Some(ordering);
        }
    }
    Some(Ordering::Equal)
}
