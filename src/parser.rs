use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::helpers::{normalize_whitespace, truncate_chars};
use crate::models::{DetailFields, ListingStub, MAX_SCREENSHOTS};

pub const MAX_DESCRIPTION_CHARS: usize = 500;
const MOD_FEATURE_LABEL: &str = "MOD feature";

/// Field extraction from fetched documents. Parsing never fails: missing
/// markup simply yields missing fields.
pub trait PageParser: Send + Sync {
    fn parse_list_page(&self, html: &str) -> Vec<ListingStub>;
    fn parse_detail_page(&self, html: &str) -> DetailFields;
}

/// Parser for WordPress-style catalog themes
pub struct HtmlCatalogParser {
    post: Selector,
    title_link: Selector,
    thumbnail: Selector,
    content_paragraph: Selector,
    info_row: Selector,
    th: Selector,
    td: Selector,
    strong: Selector,
    entry_title: Selector,
    screenshot: Selector,
    parenthetical: Regex,
}

fn selector(css: &str) -> Selector {
    Selector::parse(css).unwrap()
}

impl HtmlCatalogParser {
    pub fn new() -> Self {
        Self {
            post: selector(".post"),
            title_link: selector(".entry-title a"),
            thumbnail: selector(".post-thumbnail img"),
            content_paragraph: selector(".entry-content p"),
            info_row: selector("table.apk-info tr"),
            th: selector("th"),
            td: selector("td"),
            strong: selector("strong"),
            entry_title: selector(".entry-title"),
            screenshot: selector(".gallery-item img, .wp-block-image img"),
            parenthetical: Regex::new(r"\(([^)]+)\)").unwrap(),
        }
    }

    /// Lazy-loading themes move the real URL out of `src`
    fn image_source(img: ElementRef) -> Option<String> {
        ["src", "data-src", "data-srcset"]
            .iter()
            .filter_map(|attr| img.value().attr(attr))
            .map(str::trim)
            .find(|v| !v.is_empty())
            .map(str::to_string)
    }

    fn text_of(element: ElementRef) -> String {
        normalize_whitespace(&element.text().collect::<String>())
    }

    fn mod_features(&self, document: &Html) -> Option<String> {
        let labelled = document
            .select(&self.strong)
            .find(|s| Self::text_of(*s).contains(MOD_FEATURE_LABEL))
            .and_then(|s| s.parent().and_then(ElementRef::wrap))
            .map(|parent| {
                Self::text_of(parent)
                    .replacen(MOD_FEATURE_LABEL, "", 1)
                    .trim()
                    .trim_start_matches(':')
                    .trim()
                    .to_string()
            })
            .filter(|text| !text.is_empty());
        if labelled.is_some() {
            return labelled;
        }

        let title = document
            .select(&self.entry_title)
            .map(Self::text_of)
            .collect::<Vec<_>>()
            .join(" ");
        self.parenthetical
            .captures(&title)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim().to_string())
            .filter(|text| !text.is_empty())
    }
}

impl Default for HtmlCatalogParser {
    fn default() -> Self {
        Self::new()
    }
}

impl PageParser for HtmlCatalogParser {
    fn parse_list_page(&self, html: &str) -> Vec<ListingStub> {
        let document = Html::parse_document(html);

        document
            .select(&self.post)
            .map(|post| {
                let link = post.select(&self.title_link).next();
                ListingStub {
                    title: link.map(Self::text_of).filter(|t| !t.is_empty()),
                    detail_url: link
                        .and_then(|a| a.value().attr("href"))
                        .map(|href| href.trim().to_string())
                        .filter(|href| !href.is_empty()),
                    icon_url: post.select(&self.thumbnail).next().and_then(Self::image_source),
                    type_hint: None,
                }
            })
            .collect()
    }

    fn parse_detail_page(&self, html: &str) -> DetailFields {
        let document = Html::parse_document(html);
        let mut fields = DetailFields::default();

        fields.description = document
            .select(&self.content_paragraph)
            .next()
            .map(|p| truncate_chars(&Self::text_of(p), MAX_DESCRIPTION_CHARS));

        for row in document.select(&self.info_row) {
            let key = row
                .select(&self.th)
                .map(Self::text_of)
                .collect::<String>()
                .to_lowercase();
            let value = row.select(&self.td).map(Self::text_of).collect::<String>();
            if value.is_empty() {
                continue;
            }
            if key.contains("version") {
                fields.version = Some(value.clone());
            }
            if key.contains("size") {
                fields.size = Some(value);
            }
        }

        fields.mod_features = self.mod_features(&document);

        // Only the first few images count, even if some of them lack a URL
        fields.screenshots = document
            .select(&self.screenshot)
            .take(MAX_SCREENSHOTS)
            .filter_map(Self::image_source)
            .collect();

        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIST_PAGE: &str = r#"
        <html><body>
          <article class="post">
            <div class="post-thumbnail"><img src="https://cdn.example.com/spotify.png"></div>
            <h2 class="entry-title"><a href="https://example.com/apps/spotify-premium.html"> Spotify   Premium </a></h2>
          </article>
          <article class="post">
            <div class="post-thumbnail"><img src="" data-src="https://cdn.example.com/racer.png"></div>
            <h2 class="entry-title"><a href="https://example.com/games/sky-racer.html">Sky Racer</a></h2>
          </article>
          <article class="post">
            <h2 class="entry-title"><a>Missing link</a></h2>
          </article>
          <div class="sidebar"><a href="https://example.com/about">About</a></div>
        </body></html>
    "#;

    const DETAIL_PAGE: &str = r#"
        <html><body>
          <h1 class="entry-title">Sky Racer (Unlimited Money)</h1>
          <div class="entry-content">
            <p>  Race across   the sky. </p>
            <p>Second paragraph.</p>
            <p><strong>MOD feature</strong>: Unlimited Money, No Ads</p>
          </div>
          <table class="apk-info">
            <tr><th>Version</th><td>2.4.1</td></tr>
            <tr><th>Size</th><td>128 MB</td></tr>
            <tr><th>Developer</th><td>Sky Studio</td></tr>
          </table>
          <figure class="wp-block-image"><img src="https://cdn.example.com/s1.jpg"></figure>
          <figure class="wp-block-image"><img data-srcset="https://cdn.example.com/s2.jpg 2x"></figure>
          <div class="gallery-item"><img src="https://cdn.example.com/s3.jpg"></div>
          <div class="gallery-item"><img></div>
          <div class="gallery-item"><img src="https://cdn.example.com/s5.jpg"></div>
          <div class="gallery-item"><img src="https://cdn.example.com/s6.jpg"></div>
        </body></html>
    "#;

    #[test]
    fn test_parse_list_page() {
        let parser = HtmlCatalogParser::new();
        let stubs = parser.parse_list_page(LIST_PAGE);

        assert_eq!(stubs.len(), 3);
        assert_eq!(stubs[0].title.as_deref(), Some("Spotify Premium"));
        assert_eq!(
            stubs[0].detail_url.as_deref(),
            Some("https://example.com/apps/spotify-premium.html")
        );
        assert_eq!(stubs[0].icon_url.as_deref(), Some("https://cdn.example.com/spotify.png"));
        assert_eq!(stubs[1].icon_url.as_deref(), Some("https://cdn.example.com/racer.png"));
        assert_eq!(stubs[2].title.as_deref(), Some("Missing link"));
        assert_eq!(stubs[2].detail_url, None);
    }

    #[test]
    fn test_parse_list_page_without_posts() {
        let parser = HtmlCatalogParser::new();
        assert!(parser.parse_list_page("<html><body><p>nothing</p></body></html>").is_empty());
    }

    #[test]
    fn test_parse_detail_page() {
        let parser = HtmlCatalogParser::new();
        let fields = parser.parse_detail_page(DETAIL_PAGE);

        assert_eq!(fields.description.as_deref(), Some("Race across the sky."));
        assert_eq!(fields.version.as_deref(), Some("2.4.1"));
        assert_eq!(fields.size.as_deref(), Some("128 MB"));
        assert_eq!(fields.mod_features.as_deref(), Some("Unlimited Money, No Ads"));
        assert_eq!(
            fields.screenshots,
            vec![
                "https://cdn.example.com/s1.jpg",
                "https://cdn.example.com/s2.jpg 2x",
                "https://cdn.example.com/s3.jpg",
                "https://cdn.example.com/s5.jpg",
            ]
        );
    }

    #[test]
    fn test_mod_features_fall_back_to_title_parenthetical() {
        let parser = HtmlCatalogParser::new();
        let html = r#"<h1 class="entry-title">Turbo VPN (Premium Unlocked, No Ads)</h1>"#;
        let fields = parser.parse_detail_page(html);
        assert_eq!(fields.mod_features.as_deref(), Some("Premium Unlocked, No Ads"));
    }

    #[test]
    fn test_bare_detail_page_yields_nothing() {
        let parser = HtmlCatalogParser::new();
        let fields = parser.parse_detail_page("<html><body></body></html>");
        assert_eq!(fields, DetailFields::default());
    }

    #[test]
    fn test_description_is_truncated() {
        let parser = HtmlCatalogParser::new();
        let long = "x".repeat(800);
        let html = format!(r#"<div class="entry-content"><p>{}</p></div>"#, long);
        let fields = parser.parse_detail_page(&html);
        assert_eq!(fields.description.map(|d| d.chars().count()), Some(MAX_DESCRIPTION_CHARS));
    }
}
