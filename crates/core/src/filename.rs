//! Output filename derivation.

use once_cell::sync::Lazy;
use regex_lite::Regex;

use crate::settings::Settings;

static TRAILING_EXTENSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\.[^/.]+$").expect("valid extension regex"));
static UNSAFE_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\w\s.-]+").expect("valid unsafe-chars regex"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// Base name used when nothing is left of the original name.
const FALLBACK_BASE: &str = "audio";

/// Maps an original filename to a filesystem-safe output name for `settings`.
///
/// Strips the trailing extension, replaces each run of characters outside
/// `[word, whitespace, '.', '-']` with `_`, turns whitespace runs into `_` and
/// appends the target extension. Re-applying it to its own output is a no-op.
pub fn derive_output_name(original_name: &str, settings: &Settings) -> String {
    let base = TRAILING_EXTENSION.replace(original_name, "");
    let base = UNSAFE_CHARS.replace_all(&base, "_");
    let base = WHITESPACE.replace_all(&base, "_");
    let base = if base.is_empty() {
        FALLBACK_BASE
    } else {
        base.as_ref()
    };
    format!("{}.{}", base, settings.extension())
}
