use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Site-wide settings, stored as a single document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteSettings {
    pub site_name: String,
    pub tagline: String,
    pub description: String,
    #[serde(default)]
    pub logo_url: Option<String>,
    pub author: AuthorProfile,
    pub social: SocialLinks,
    pub seo: SeoSettings,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorProfile {
    pub name: String,
    pub email: String,
    pub bio: String,
    #[serde(default)]
    pub photo: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SocialLinks {
    #[serde(default)]
    pub github: Option<String>,
    #[serde(default)]
    pub linkedin: Option<String>,
    #[serde(default)]
    pub twitter: Option<String>,
    #[serde(default)]
    pub instagram: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeoSettings {
    pub meta_description: String,
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            site_name: "Quill".to_string(),
            tagline: "Tech & Lifestyle Blog".to_string(),
            description: "Articles and tutorials on software, tooling and the craft of building things."
                .to_string(),
            logo_url: None,
            author: AuthorProfile {
                name: "Quill Editors".to_string(),
                email: "contact@example.com".to_string(),
                bio: "Writing about software, tooling and everything in between.".to_string(),
                photo: None,
            },
            social: SocialLinks::default(),
            seo: SeoSettings {
                meta_description: "Tech and lifestyle articles and hands-on tutorials.".to_string(),
                keywords: ["technology", "programming", "tutorials", "web development"]
                    .into_iter()
                    .map(String::from)
                    .collect(),
            },
            updated_at: None,
        }
    }
}

impl SiteSettings {
    /// Apply a JSON merge patch (RFC 7396): objects merge recursively, `null` clears a field.
    pub fn merged(&self, patch: &Value) -> Result<Self, serde_json::Error> {
        let mut current = serde_json::to_value(self)?;
        merge_patch(&mut current, patch);
        serde_json::from_value(current)
    }
}

fn merge_patch(target: &mut Value, patch: &Value) {
    let Value::Object(patch_map) = patch else {
        *target = patch.clone();
        return;
    };
    if !target.is_object() {
        *target = Value::Object(serde_json::Map::new());
    }
    if let Value::Object(target_map) = target {
        for (key, value) in patch_map {
            if value.is_null() {
                target_map.remove(key);
            } else {
                merge_patch(target_map.entry(key.clone()).or_insert(Value::Null), value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nested_patch_keeps_siblings() {
        let settings = SiteSettings::default();
        let merged = settings
            .merged(&json!({ "author": { "name": "Grace" }, "social": { "github": "https://github.com/quill" } }))
            .unwrap();

        assert_eq!(merged.author.name, "Grace");
        assert_eq!(merged.author.email, settings.author.email);
        assert_eq!(merged.social.github.as_deref(), Some("https://github.com/quill"));
        assert_eq!(merged.site_name, settings.site_name);
    }

    #[test]
    fn null_clears_optional_field() {
        let mut settings = SiteSettings::default();
        settings.logo_url = Some("https://cdn.example.com/logo.png".into());
        let merged = settings.merged(&json!({ "logoUrl": null })).unwrap();
        assert!(merged.logo_url.is_none());
    }

    #[test]
    fn type_mismatch_is_rejected() {
        let result = SiteSettings::default().merged(&json!({ "siteName": 42 }));
        assert!(result.is_err());
    }
}
