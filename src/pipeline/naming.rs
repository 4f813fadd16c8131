//! Output file naming.
//!
//! The uploaded PDF is named after the original book, normalised so that
//! runs of whitespace and underscores become single underscores, followed
//! by the branding suffix:
//!
//! ```text
//! "My Book_Test.epub"  →  "My Book Test"  →  "My_Book_Test_OldTown.pdf"
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

/// Used when the declared name has no usable base.
const FALLBACK_BASE: &str = "book";

static RE_SEPARATOR_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\s_]+").unwrap());

/// Base name with its extension removed and separator runs collapsed to one
/// space: `"My Book_Test.epub"` → `"My Book Test"`.
pub fn normalized_base(file_name: &str) -> String {
    let last = Path::new(file_name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("");
    let stem = match last.rsplit_once('.') {
        Some((stem, _)) => stem,
        None => last,
    };

    let collapsed = RE_SEPARATOR_RUNS.replace_all(stem, " ");
    let trimmed = collapsed.trim();
    if trimmed.is_empty() {
        FALLBACK_BASE.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Final upload name: normalised base, spaces → underscores, `_<suffix>.pdf`.
pub fn output_file_name(file_name: &str, suffix: &str) -> String {
    let base = normalized_base(file_name).replace(' ', "_");
    let suffix = suffix.trim();
    if suffix.is_empty() {
        format!("{base}.pdf")
    } else {
        format!("{base}_{suffix}.pdf")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn branded_name_from_mixed_separators() {
        assert_eq!(normalized_base("My Book_Test.epub"), "My Book Test");
        assert_eq!(
            output_file_name("My Book_Test.epub", "OldTown"),
            "My_Book_Test_OldTown.pdf"
        );
    }

    #[test]
    fn separator_runs_collapse() {
        assert_eq!(
            output_file_name("  a__b \t c_ .epub", "OldTown"),
            "a_b_c_OldTown.pdf"
        );
    }

    #[test]
    fn only_last_extension_is_removed() {
        assert_eq!(normalized_base("vol.2.epub"), "vol.2");
        assert_eq!(normalized_base("no-extension"), "no-extension");
    }

    #[test]
    fn unicode_names_survive() {
        assert_eq!(
            output_file_name("הארי פוטר_1.epub", "OldTown"),
            "הארי_פוטר_1_OldTown.pdf"
        );
    }

    #[test]
    fn empty_base_falls_back() {
        assert_eq!(output_file_name(".epub", "OldTown"), "book_OldTown.pdf");
        assert_eq!(output_file_name("___.epub", "OldTown"), "book_OldTown.pdf");
        assert_eq!(output_file_name("", "OldTown"), "book_OldTown.pdf");
    }

    #[test]
    fn empty_suffix_is_omitted() {
        assert_eq!(output_file_name("a b.epub", ""), "a_b.pdf");
    }
}
