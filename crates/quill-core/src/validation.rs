//! Input validation for author, admin and reader submissions.
//!
//! Lengths are counted in characters, not bytes.

use crate::domain::{ArticleDraft, ArticleKind, CategoryDraft};
use crate::error::DomainError;

pub const TITLE_MAX: usize = 200;
pub const SLUG_MAX: usize = 200;
pub const CONTENT_MAX: usize = 50_000;
pub const EXCERPT_MAX: usize = 500;
pub const TAGS_MAX: usize = 10;
pub const TAG_MAX: usize = 30;

pub const CATEGORY_NAME_MAX: usize = 50;
pub const CATEGORY_SLUG_MAX: usize = 50;
pub const CATEGORY_DESCRIPTION_MAX: usize = 200;
pub const ICON_MAX: usize = 10;

pub const COMMENT_MAX: usize = 1_000;
pub const USER_NAME_MAX: usize = 100;

pub const PROMPT_MAX: usize = 2_000;
pub const CONTEXT_MAX: usize = 5_000;
pub const SUMMARY_SOURCE_MAX: usize = 50_000;

/// Collects every problem with a submission before failing.
#[derive(Debug, Default)]
pub struct Violations(Vec<String>);

impl Violations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: impl Into<String>) {
        self.0.push(message.into());
    }

    /// Require `1..=max` characters after trimming.
    pub fn required(&mut self, field: &str, value: &str, max: usize) {
        let len = value.trim().chars().count();
        if len == 0 {
            self.push(format!("{field} is required"));
        } else if len > max {
            self.push(format!("{field} must be at most {max} characters"));
        }
    }

    pub fn at_most(&mut self, field: &str, value: &str, max: usize) {
        if value.chars().count() > max {
            self.push(format!("{field} must be at most {max} characters"));
        }
    }

    pub fn into_result(self) -> Result<(), DomainError> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(DomainError::Validation(self.0))
        }
    }
}

/// Lowercase ASCII words joined by single hyphens.
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug
            .split('-')
            .all(|part| !part.is_empty() && part.bytes().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit()))
}

/// `#RRGGBB`.
pub fn is_hex_color(color: &str) -> bool {
    color.len() == 7
        && color.starts_with('#')
        && color[1..].bytes().all(|b| b.is_ascii_hexdigit())
}

/// Derive a slug from a title: ASCII alphanumerics lowercased, everything else collapsed to `-`.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// Trim tags, drop empties and duplicates, keep first-seen order.
pub fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim().to_string();
        if !tag.is_empty() && !out.contains(&tag) {
            out.push(tag);
        }
    }
    out
}

pub fn validate_article(kind: ArticleKind, draft: &ArticleDraft) -> Result<(), DomainError> {
    let mut v = Violations::new();
    v.required("title", &draft.title, TITLE_MAX);
    v.required("slug", &draft.slug, SLUG_MAX);
    if !draft.slug.is_empty() && !is_valid_slug(&draft.slug) {
        v.push("slug may only contain lowercase letters, digits and single hyphens");
    }
    v.required("content", &draft.content, CONTENT_MAX);
    v.required("excerpt", &draft.excerpt, EXCERPT_MAX);
    if draft.category.trim().is_empty() {
        v.push("category is required");
    }
    if draft.tags.len() > TAGS_MAX {
        v.push(format!("at most {TAGS_MAX} tags are allowed"));
    }
    for tag in &draft.tags {
        v.at_most("tag", tag, TAG_MAX);
    }
    if kind == ArticleKind::Tutorial && draft.difficulty.is_none() {
        v.push("difficulty is required for tutorials");
    }
    v.into_result()
}

pub fn validate_category(draft: &CategoryDraft) -> Result<(), DomainError> {
    let mut v = Violations::new();
    v.required("name", &draft.name, CATEGORY_NAME_MAX);
    v.required("slug", &draft.slug, CATEGORY_SLUG_MAX);
    if !draft.slug.is_empty() && !is_valid_slug(&draft.slug) {
        v.push("slug may only contain lowercase letters, digits and single hyphens");
    }
    if let Some(description) = &draft.description {
        v.at_most("description", description, CATEGORY_DESCRIPTION_MAX);
    }
    if !is_hex_color(&draft.color) {
        v.push("color must be a hex color like #1a2b3c");
    }
    v.at_most("icon", &draft.icon, ICON_MAX);
    v.into_result()
}

pub fn validate_comment(content: &str, user_name: &str) -> Result<(), DomainError> {
    let mut v = Violations::new();
    v.required("content", content, COMMENT_MAX);
    v.required("userName", user_name, USER_NAME_MAX);
    v.into_result()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Difficulty;

    fn valid_draft() -> ArticleDraft {
        ArticleDraft {
            title: "Ownership in Rust".into(),
            slug: "ownership-in-rust".into(),
            content: "<p>Borrowing explained</p>".into(),
            excerpt: "Borrowing explained".into(),
            category: "rust".into(),
            tags: vec!["rust".into()],
            ..ArticleDraft::default()
        }
    }

    #[test]
    fn slugs() {
        assert!(is_valid_slug("hello-world-2"));
        assert!(!is_valid_slug("Hello"));
        assert!(!is_valid_slug("-leading"));
        assert!(!is_valid_slug("double--dash"));
        assert!(!is_valid_slug(""));
    }

    #[test]
    fn colors() {
        assert!(is_hex_color("#A1b2C3"));
        assert!(!is_hex_color("A1B2C3"));
        assert!(!is_hex_color("#abc"));
        assert!(!is_hex_color("#ggghhh"));
    }

    #[test]
    fn slugify_collapses_separators() {
        assert_eq!(slugify("  Hello, World! 2024 "), "hello-world-2024");
        assert_eq!(slugify("Rust & WebAssembly"), "rust-webassembly");
    }

    #[test]
    fn tags_are_trimmed_and_deduplicated() {
        let tags = normalize_tags(vec![" rust ".into(), "".into(), "rust".into(), "web".into()]);
        assert_eq!(tags, vec!["rust".to_string(), "web".to_string()]);
    }

    #[test]
    fn valid_post_passes() {
        assert!(validate_article(ArticleKind::Post, &valid_draft()).is_ok());
    }

    #[test]
    fn every_problem_is_reported() {
        let draft = ArticleDraft {
            title: String::new(),
            slug: "Bad Slug".into(),
            tags: (0..11).map(|i| format!("t{i}")).collect(),
            ..valid_draft()
        };
        match validate_article(ArticleKind::Post, &draft) {
            Err(DomainError::Validation(errors)) => assert_eq!(errors.len(), 3),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn tutorials_need_a_difficulty() {
        assert!(validate_article(ArticleKind::Tutorial, &valid_draft()).is_err());
        let draft = ArticleDraft {
            difficulty: Some(Difficulty::Beginner),
            ..valid_draft()
        };
        assert!(validate_article(ArticleKind::Tutorial, &draft).is_ok());
    }

    #[test]
    fn content_limit_counts_characters() {
        let draft = ArticleDraft {
            content: "é".repeat(CONTENT_MAX),
            ..valid_draft()
        };
        assert!(validate_article(ArticleKind::Post, &draft).is_ok());
    }

    #[test]
    fn category_checks() {
        let draft = CategoryDraft {
            name: "Tech".into(),
            slug: "tech".into(),
            description: Some("x".repeat(201)),
            color: "blue".into(),
            icon: "💻".into(),
        };
        match validate_category(&draft) {
            Err(DomainError::Validation(errors)) => assert_eq!(errors.len(), 2),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn comment_bounds() {
        assert!(validate_comment("Great read", "Ada").is_ok());
        assert!(validate_comment("   ", "Ada").is_err());
        assert!(validate_comment(&"a".repeat(COMMENT_MAX + 1), "Ada").is_err());
    }
}
