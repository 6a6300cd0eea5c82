//! Reader-mode article extraction
//!
//! Extraction runs in two passes:
//!
//! 1. [`ArticleExtractor::is_probably_readerable`]: a cheap scan that
//!    scores `<p>`, `<pre>` and `<article>` nodes by text length. Pages
//!    dominated by navigation and chrome score near zero and are skipped
//!    before any expensive work happens.
//! 2. [`ArticleExtractor::extract`]: the full reader-mode pass. The main
//!    content block is isolated and cleaned, then title, excerpt, byline
//!    and site name are filled in from the document's metadata.
//!
//! Both functions are pure given their inputs and never panic or return an
//! error past this boundary; extraction failure is `None`.

use scraper::{Html, Selector};
use tracing::debug;
use url::Url;

use crate::error::ExtractError;
use crate::models::Article;

/// Minimum visible text length for a node to count toward the
/// readerable score. Below this a paragraph is treated as chrome.
const MIN_CONTENT_LENGTH: usize = 140;

/// Score threshold above which a page is considered probably readerable
const MIN_SCORE: f64 = 20.0;

/// Maximum excerpt length when falling back to leading text content
const EXCERPT_FALLBACK_CHARS: usize = 200;

/// Reader-mode extractor with precompiled selectors
pub struct ArticleExtractor {
    candidates: Selector,
    meta_byline: Selector,
    meta_site_name: Selector,
    meta_description: Selector,
}

impl Default for ArticleExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl ArticleExtractor {
    /// Create an extractor; selectors are static and known-valid
    #[must_use]
    pub fn new() -> Self {
        Self {
            candidates: Selector::parse("p, pre, article").unwrap(),
            meta_byline: Selector::parse(r#"meta[name="author"]"#).unwrap(),
            meta_site_name: Selector::parse(r#"meta[property="og:site_name"]"#).unwrap(),
            meta_description: Selector::parse(
                r#"meta[name="description"], meta[property="og:description"]"#,
            )
            .unwrap(),
        }
    }

    /// Heuristic pre-check: is this page probably a readable article?
    ///
    /// Each candidate node whose trimmed text is at least
    /// `MIN_CONTENT_LENGTH` characters contributes
    /// `sqrt(len - MIN_CONTENT_LENGTH)` to a running score; the page is
    /// readerable once the score exceeds `MIN_SCORE`. A bare `<nav>` list
    /// with no paragraph text never accumulates a score.
    #[must_use]
    pub fn is_probably_readerable(&self, html: &str) -> bool {
        let document = Html::parse_document(html);
        let mut score = 0.0_f64;

        for node in document.select(&self.candidates) {
            let text: String = node.text().collect();
            let len = text.trim().chars().count();
            if len < MIN_CONTENT_LENGTH {
                continue;
            }

            score += ((len - MIN_CONTENT_LENGTH) as f64).sqrt();
            if score > MIN_SCORE {
                return true;
            }
        }

        false
    }

    /// Run the full reader-mode extraction
    ///
    /// Returns `None` when the URL does not parse or the extraction pass
    /// fails internally. The returned article's `content` is the cleaned
    /// main-content HTML fragment, never the raw page.
    #[must_use]
    pub fn extract(&self, url: &str, html: &str) -> Option<Article> {
        match self.try_extract(url, html) {
            Ok(article) => Some(article),
            Err(e) => {
                debug!(url = %url, error = %e, "Extraction failed");
                None
            }
        }
    }

    fn try_extract(&self, url: &str, html: &str) -> Result<Article, ExtractError> {
        let parsed_url =
            Url::parse(url).map_err(|e| ExtractError::InvalidUrl(e.to_string()))?;

        let product = readability::extractor::extract(&mut html.as_bytes(), &parsed_url)
            .map_err(|e| ExtractError::ExtractionFailed(e.to_string()))?;

        let document = Html::parse_document(html);
        let byline = self.meta_content(&document, &self.meta_byline);
        let site_name = self.meta_content(&document, &self.meta_site_name);
        let excerpt = self
            .meta_content(&document, &self.meta_description)
            .unwrap_or_else(|| leading_excerpt(&product.text));

        let length = product.text.chars().count();

        Ok(Article {
            title: product.title,
            excerpt,
            content: product.content,
            text_content: product.text,
            byline,
            site_name,
            length,
        })
    }

    /// First non-empty `content` attribute matching the selector
    fn meta_content(&self, document: &Html, selector: &Selector) -> Option<String> {
        document
            .select(selector)
            .filter_map(|el| el.value().attr("content"))
            .map(str::trim)
            .find(|c| !c.is_empty())
            .map(String::from)
    }
}

/// Fallback excerpt: the leading text content, truncated on a char boundary
fn leading_excerpt(text: &str) -> String {
    text.trim().chars().take(EXCERPT_FALLBACK_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article_page() -> String {
        let para = "This paragraph carries enough prose to look like real article text. \
                    It keeps going for a while so that the readerable scoring pass sees \
                    a node well past the minimum content length threshold and counts it.";
        format!(
            r#"<!DOCTYPE html>
<html>
<head>
  <title>A Real Article</title>
  <meta name="author" content="Jo Writer">
  <meta property="og:site_name" content="Example News">
  <meta name="description" content="A short summary.">
</head>
<body>
  <nav><ul><li><a href="/home">Home</a></li><li><a href="/about">About</a></li></ul></nav>
  <article>
    <h1>A Real Article</h1>
    <p>{para}</p>
    <p>{para}</p>
    <p>{para}</p>
    <p>{para}</p>
  </article>
</body>
</html>"#
        )
    }

    fn nav_only_page() -> &'static str {
        r#"<!DOCTYPE html>
<html>
<head><title>Links</title></head>
<body>
  <nav>
    <ul>
      <li><a href="/a">One</a></li>
      <li><a href="/b">Two</a></li>
      <li><a href="/c">Three</a></li>
    </ul>
  </nav>
</body>
</html>"#
    }

    #[test]
    fn test_article_page_is_readerable() {
        let extractor = ArticleExtractor::new();
        assert!(extractor.is_probably_readerable(&article_page()));
    }

    #[test]
    fn test_nav_only_page_is_not_readerable() {
        let extractor = ArticleExtractor::new();
        assert!(!extractor.is_probably_readerable(nav_only_page()));
    }

    #[test]
    fn test_short_paragraphs_do_not_score() {
        let extractor = ArticleExtractor::new();
        let html = "<html><body><p>short</p><p>also short</p></body></html>";
        assert!(!extractor.is_probably_readerable(html));
    }

    #[test]
    fn test_extract_fills_metadata() {
        let extractor = ArticleExtractor::new();
        let article = extractor
            .extract("https://allowed.example/article-1", &article_page())
            .expect("extraction should succeed");

        assert_eq!(article.byline.as_deref(), Some("Jo Writer"));
        assert_eq!(article.site_name.as_deref(), Some("Example News"));
        assert_eq!(article.excerpt, "A short summary.");
        assert!(article.length > 0);
        assert_eq!(article.length, article.text_content.chars().count());
        assert!(article.content.contains("readerable scoring pass"));
    }

    #[test]
    fn test_extract_rejects_invalid_url() {
        let extractor = ArticleExtractor::new();
        assert!(extractor.extract("not a url", &article_page()).is_none());
    }

    #[test]
    fn test_invalid_url_maps_to_extract_error() {
        let extractor = ArticleExtractor::new();
        let err = extractor
            .try_extract("not a url", &article_page())
            .unwrap_err();
        assert!(matches!(err, ExtractError::InvalidUrl(_)));
    }

    #[test]
    fn test_leading_excerpt_truncates_on_char_boundary() {
        let text = "α".repeat(500);
        let excerpt = leading_excerpt(&text);
        assert_eq!(excerpt.chars().count(), EXCERPT_FALLBACK_CHARS);
    }
}
