//! Line splitting for extracted page text.

/// Page separator written by text extractors between pages.
pub const PAGE_BREAK: char = '\x0c';

/// Splits a page into its non-blank lines, trailing whitespace removed.
///
/// Blank lines carry no roster content, and keeping them would shrink the
/// effective occupant lookahead window.
#[must_use]
pub fn page_lines(page: &str) -> Vec<String> {
    page.lines()
        .map(str::trim_end)
        .filter(|line| !line.trim().is_empty())
        .map(str::to_owned)
        .collect()
}

/// Splits a multi-page text dump on form feeds. A trailing form feed does
/// not open an extra page.
#[must_use]
pub fn split_pages(text: &str) -> Vec<&str> {
    let mut pages: Vec<&str> = text.split(PAGE_BREAK).collect();
    if pages.len() > 1 && pages.last().is_some_and(|page| page.trim().is_empty()) {
        pages.pop();
    }
    pages
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_lines_are_dropped() {
        assert_eq!(page_lines("A  \n\n   \nB\r\n"), vec!["A", "B"]);
    }

    #[test]
    fn leading_whitespace_is_kept() {
        assert_eq!(page_lines("  1 0111111JEFE"), vec!["  1 0111111JEFE"]);
    }

    #[test]
    fn trailing_form_feed_does_not_add_a_page() {
        assert_eq!(split_pages("one\x0ctwo\x0c"), vec!["one", "two"]);
        assert_eq!(split_pages("one"), vec!["one"]);
        assert_eq!(split_pages(""), vec![""]);
    }
}
