pub mod browse;
pub mod categories;
pub mod error;
pub mod export;
pub mod import;
pub mod products;
pub mod reviews;
pub mod seed;
pub mod tree;

pub use error::CatalogError;

use once_cell::sync::Lazy;
use regex::Regex;
use sea_orm::sea_query::{Expr, Func, IntoColumnRef, LikeExpr, SimpleExpr};
use unicode_normalization::UnicodeNormalization;

static NON_SLUG_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9_\s-]").unwrap());
static SLUG_SEPARATORS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[-\s]+").unwrap());

/// Lowercase ASCII slug: accents folded to their base letters (NFKD),
/// other punctuation dropped, runs of spaces and dashes collapsed into a
/// single dash.
pub fn slugify(value: &str) -> String {
    let ascii: String = value
        .nfkd()
        .filter(char::is_ascii)
        .collect::<String>()
        .to_lowercase();
    let cleaned = NON_SLUG_CHARS.replace_all(&ascii, "");
    SLUG_SEPARATORS
        .replace_all(cleaned.trim(), "-")
        .trim_matches(|c| c == '-' || c == '_')
        .to_owned()
}

const LIKE_ESCAPE: char = '\\';

/// Case-insensitive substring match on a column. `%` and `_` in `needle`
/// match literally.
pub(crate) fn icontains<C: IntoColumnRef>(column: C, needle: &str) -> SimpleExpr {
    Expr::expr(Func::lower(Expr::col(column)))
        .like(LikeExpr::new(contains_pattern(needle)).escape(LIKE_ESCAPE))
}

/// SQLite's `lower()` only folds ASCII, so the needle is folded the same way.
fn contains_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | LIKE_ESCAPE) {
            pattern.push(LIKE_ESCAPE);
        }
        pattern.push(c.to_ascii_lowercase());
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use super::{contains_pattern, slugify};

    #[test]
    fn slugify_collapses_punctuation_and_spaces() {
        assert_eq!(slugify("Rice & Flour"), "rice-flour");
        assert_eq!(slugify("Chapati Atta (Indian Flour)"), "chapati-atta-indian-flour");
        assert_eq!(slugify("Poha, Mamra & Vermicelli"), "poha-mamra-vermicelli");
        assert_eq!(slugify("  Roti/Parathas/Naan "), "rotiparathasnaan");
    }

    #[test]
    fn slugify_folds_accents() {
        assert_eq!(slugify("Crème brûlée"), "creme-brulee");
        assert_eq!(slugify("Crème brûlée Jalapeño"), "creme-brulee-jalapeno");
        assert_eq!(slugify("Chai 茶"), "chai");
        assert_eq!(slugify("---"), "");
    }

    #[test]
    fn contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("Tea"), "%tea%");
        assert_eq!(contains_pattern("%"), r"%\%%");
        assert_eq!(contains_pattern("50%_off"), r"%50\%\_off%");
        assert_eq!(contains_pattern(r"a\b"), r"%a\\b%");
        assert_eq!(contains_pattern("ÉPICES"), "%Épices%");
    }
}
