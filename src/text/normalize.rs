//! Perso-Arabic glyph normalization
//!
//! Translation services frequently emit Arabic-script codepoints that
//! Persian fonts and voices render poorly. Persian text uses FARSI YEH
//! (U+06CC) and KEHEH (U+06A9) where Arabic uses YEH (U+064A) and KAF
//! (U+0643).

/// Replaces Arabic YEH and KAF with their Persian equivalents.
#[must_use]
pub fn normalize_farsi(input: &str) -> String {
    input
        .chars()
        .map(|c| match c {
            'ي' => 'ی',
            'ك' => 'ک',
            other => other,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replaces_arabic_yeh_and_kaf() {
        assert_eq!(normalize_farsi("كيف"), "کیف");
    }

    #[test]
    fn test_persian_text_unchanged() {
        let text = "سلام دنیا چطوری";
        assert_eq!(normalize_farsi(text), text);
    }

    #[test]
    fn test_latin_text_unchanged() {
        assert_eq!(normalize_farsi("hello world"), "hello world");
    }
}
