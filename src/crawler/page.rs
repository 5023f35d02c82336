//! Tolerant selector layer over parsed HTML
//!
//! Every accessor returns empty results instead of errors: a selector that
//! matches nothing is an optional field, never a reason to drop the task.
//! Handlers stay free of scraper details and work against this surface only.

use scraper::{Html, Selector};

/// A parsed HTML document with tolerant field access
pub struct Page {
    document: Html,
}

impl Page {
    /// Parses an HTML body; malformed markup still yields a best-effort tree
    pub fn parse(body: &str) -> Self {
        Self {
            document: Html::parse_document(body),
        }
    }

    /// Collects the trimmed text content of every match
    pub fn texts(&self, selector: &str) -> Vec<String> {
        let Ok(selector) = Selector::parse(selector) else {
            return Vec::new();
        };
        self.document
            .select(&selector)
            .map(|element| element.text().collect::<String>().trim().to_string())
            .filter(|text| !text.is_empty())
            .collect()
    }

    /// Collects the given attribute from every match
    pub fn attrs(&self, selector: &str, attr: &str) -> Vec<String> {
        let Ok(selector) = Selector::parse(selector) else {
            return Vec::new();
        };
        self.document
            .select(&selector)
            .filter_map(|element| element.value().attr(attr))
            .map(|value| value.to_string())
            .collect()
    }

    /// First non-empty text match, if any
    pub fn first_text(&self, selector: &str) -> Option<String> {
        self.texts(selector).into_iter().next()
    }

    /// First attribute match, if any
    pub fn first_attr(&self, selector: &str, attr: &str) -> Option<String> {
        self.attrs(selector, attr).into_iter().next()
    }

    /// Whether the selector matches at all
    pub fn has(&self, selector: &str) -> bool {
        let Ok(selector) = Selector::parse(selector) else {
            return false;
        };
        self.document.select(&selector).next().is_some()
    }

    /// Whether the page carries a "load more" pagination affordance
    pub fn has_continuation(&self) -> bool {
        self.has("button.ajax-pagination-btn")
    }

    /// File/directory listing rows, as (icon classes, link href, link text)
    ///
    /// Returns the raw structural signals; classification happens in the
    /// handlers where skips can be logged with task context.
    pub fn listing_rows(&self) -> Vec<ListingRow> {
        let Ok(row_selector) = Selector::parse("div.js-navigation-item") else {
            return Vec::new();
        };
        let Ok(icon_selector) = Selector::parse("svg") else {
            return Vec::new();
        };
        let Ok(link_selector) = Selector::parse("a.js-navigation-open") else {
            return Vec::new();
        };

        self.document
            .select(&row_selector)
            .map(|row| {
                let icon_classes = row
                    .select(&icon_selector)
                    .next()
                    .and_then(|icon| icon.value().attr("class"))
                    .unwrap_or("")
                    .to_string();

                let link = row.select(&link_selector).next();
                let href = link
                    .and_then(|a| a.value().attr("href"))
                    .map(|href| href.to_string());
                let name = link
                    .map(|a| a.text().collect::<String>().trim().to_string())
                    .filter(|name| !name.is_empty());

                ListingRow {
                    icon_classes,
                    href,
                    name,
                }
            })
            .collect()
    }
}

/// One row of a file/directory listing before classification
#[derive(Debug, Clone)]
pub struct ListingRow {
    /// Class attribute of the row's leading icon (the octicon type marker)
    pub icon_classes: String,

    /// Link target, when the row carries a navigation link
    pub href: Option<String>,

    /// Display name, when present
    pub name: Option<String>,
}

/// Parses a listing counter like `42`, `1,204`, `1.2k`, or `3.4m`
pub fn parse_count(raw: &str) -> Option<u64> {
    let cleaned = raw.trim().replace(',', "");
    if cleaned.is_empty() {
        return None;
    }

    let lower = cleaned.to_ascii_lowercase();
    let (digits, multiplier) = match lower.strip_suffix('k') {
        Some(rest) => (rest, 1_000.0),
        None => match lower.strip_suffix('m') {
            Some(rest) => (rest, 1_000_000.0),
            None => (lower.as_str(), 1.0),
        },
    };

    let value: f64 = digits.trim().parse().ok()?;
    if value < 0.0 {
        return None;
    }
    Some((value * multiplier).round() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_texts_and_first_text() {
        let page = Page::parse("<h1 class=\"title\"> Hello </h1><h1 class=\"title\">World</h1>");
        assert_eq!(page.texts("h1.title"), vec!["Hello", "World"]);
        assert_eq!(page.first_text("h1.title").as_deref(), Some("Hello"));
        assert_eq!(page.first_text("h2"), None);
    }

    #[test]
    fn test_attrs() {
        let page = Page::parse(r#"<article><a href="/collections/a">A</a></article>"#);
        assert_eq!(page.attrs("article a", "href"), vec!["/collections/a"]);
        assert!(page.attrs("article a", "missing").is_empty());
    }

    #[test]
    fn test_invalid_selector_is_empty_not_fatal() {
        let page = Page::parse("<p>text</p>");
        assert!(page.texts(":::not-a-selector").is_empty());
        assert!(!page.has(":::not-a-selector"));
    }

    #[test]
    fn test_has_continuation() {
        let with_button = Page::parse(r#"<button class="ajax-pagination-btn">Load more</button>"#);
        let without = Page::parse("<button class=\"other\">Load more</button>");
        assert!(with_button.has_continuation());
        assert!(!without.has_continuation());
    }

    #[test]
    fn test_listing_rows() {
        let page = Page::parse(
            r#"
            <div class="js-navigation-item">
                <svg class="octicon octicon-file-directory-fill"></svg>
                <a class="js-navigation-open" href="/o/r/tree/main/src">src</a>
            </div>
            <div class="js-navigation-item">
                <svg class="octicon octicon-file"></svg>
                <a class="js-navigation-open" href="/o/r/blob/main/README.md">README.md</a>
            </div>
            "#,
        );

        let rows = page.listing_rows();
        assert_eq!(rows.len(), 2);
        assert!(rows[0].icon_classes.contains("octicon-file-directory"));
        assert_eq!(rows[0].name.as_deref(), Some("src"));
        assert_eq!(rows[1].href.as_deref(), Some("/o/r/blob/main/README.md"));
    }

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count("42"), Some(42));
        assert_eq!(parse_count(" 1,204 "), Some(1204));
        assert_eq!(parse_count("1.2k"), Some(1200));
        assert_eq!(parse_count("3.4m"), Some(3_400_000));
        assert_eq!(parse_count(""), None);
        assert_eq!(parse_count("n/a"), None);
    }
}
