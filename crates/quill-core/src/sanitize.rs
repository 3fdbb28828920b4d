//! Allow-list HTML sanitization.
//!
//! Three profiles are provided:
//! - [`sanitize_html`] for article bodies written in the editor,
//! - [`sanitize_comment`] for reader comments,
//! - [`sanitize_text`] for fields that must never carry markup.
//!
//! Every profile removes `<script>`/`<style>` with their contents and rejects
//! URL schemes other than http(s). Event-handler attributes are never allowed.
//! Malformed input degrades to whatever text survives parsing.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use ammonia::{Builder, Url};

const URL_SCHEMES: [&str; 2] = ["http", "https"];
const STRIPPED_WITH_CONTENT: [&str; 2] = ["script", "style"];

const RICH_TAGS: [&str; 19] = [
    "p", "br", "strong", "em", "u", "h1", "h2", "h3", "h4", "h5", "h6", "ul", "ol", "li", "a",
    "img", "blockquote", "code", "pre",
];
const RICH_ATTRIBUTES: [&str; 5] = ["href", "src", "alt", "title", "class"];

const COMMENT_TAGS: [&str; 7] = ["p", "br", "strong", "em", "u", "a", "code"];
const COMMENT_ATTRIBUTES: [&str; 2] = ["href", "title"];

static RICH: LazyLock<Builder<'static>> = LazyLock::new(|| {
    let mut builder = Builder::default();
    builder
        .tags(RICH_TAGS.into_iter().collect())
        .tag_attributes(HashMap::new())
        .generic_attributes(RICH_ATTRIBUTES.into_iter().collect())
        .url_schemes(URL_SCHEMES.into_iter().collect())
        .clean_content_tags(STRIPPED_WITH_CONTENT.into_iter().collect());
    builder
});

static COMMENT: LazyLock<Builder<'static>> = LazyLock::new(|| {
    let mut builder = Builder::default();
    builder
        .tags(COMMENT_TAGS.into_iter().collect())
        .tag_attributes(HashMap::new())
        .generic_attributes(COMMENT_ATTRIBUTES.into_iter().collect())
        .url_schemes(URL_SCHEMES.into_iter().collect())
        .clean_content_tags(STRIPPED_WITH_CONTENT.into_iter().collect());
    builder
});

static TEXT: LazyLock<Builder<'static>> = LazyLock::new(|| {
    let mut builder = Builder::empty();
    builder.clean_content_tags(STRIPPED_WITH_CONTENT.into_iter().collect::<HashSet<_>>());
    builder
});

/// Rich profile for article content.
pub fn sanitize_html(dirty: &str) -> String {
    RICH.clean(dirty).to_string()
}

/// Minimal profile for comments: basic emphasis, links and inline code.
pub fn sanitize_comment(dirty: &str) -> String {
    COMMENT.clean(dirty).to_string()
}

/// Strip every tag, keeping text content. Text is HTML-escaped.
pub fn sanitize_text(dirty: &str) -> String {
    TEXT.clean(dirty).to_string()
}

/// Return the normalized URL when it is an absolute http(s) URL.
pub fn sanitize_url(raw: &str) -> Option<String> {
    let url = Url::parse(raw.trim()).ok()?;
    URL_SCHEMES
        .contains(&url.scheme())
        .then(|| url.to_string())
}
