//! Canonical metric naming.
//!
//! Display names are arbitrary user text; the canonical form is the
//! identifier-safe derivation used for uniqueness checks and for the text
//! exposition endpoint. Both functions here are pure and deterministic.

use std::collections::HashSet;

/// Canonical name used when normalization consumes the whole input.
pub const FALLBACK_NAME: &str = "unnamed_metric";

/// Derive the identifier-safe canonical form of a display name.
///
/// Every character outside `[A-Za-z0-9_]` becomes `_`, runs of `_` collapse
/// to one, leading/trailing `_` are trimmed. An empty result falls back to
/// [`FALLBACK_NAME`].
pub fn normalize(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut prev_underscore = false;
    for ch in raw.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch);
            prev_underscore = false;
        } else if !prev_underscore {
            out.push('_');
            prev_underscore = true;
        }
    }
    let trimmed = out.trim_matches('_');
    if trimmed.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Pick a display name whose canonical form does not collide with `taken`
/// (a set of canonical names of live metrics).
///
/// Returns `base` unchanged when it is free; otherwise probes `base_1`,
/// `base_2`, ... (normalizing each candidate before the check) and returns
/// the first free candidate. The returned value is a *display* name, not yet
/// normalized.
pub fn unique_display_name(base: &str, taken: &HashSet<String>) -> String {
    if !taken.contains(&normalize(base)) {
        return base.to_string();
    }
    let mut n: u64 = 1;
    loop {
        let candidate = format!("{base}_{n}");
        if !taken.contains(&normalize(&candidate)) {
            return candidate;
        }
        n += 1;
    }
}
