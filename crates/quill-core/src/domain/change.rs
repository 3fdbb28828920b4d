use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Collections that publish change events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Posts,
    Tutorials,
    Categories,
    Comments,
    Settings,
}

impl Collection {
    pub fn as_str(self) -> &'static str {
        match self {
            Collection::Posts => "posts",
            Collection::Tutorials => "tutorials",
            Collection::Categories => "categories",
            Collection::Comments => "comments",
            Collection::Settings => "settings",
        }
    }
}

impl From<super::ArticleKind> for Collection {
    fn from(kind: super::ArticleKind) -> Self {
        match kind {
            super::ArticleKind::Post => Collection::Posts,
            super::ArticleKind::Tutorial => Collection::Tutorials,
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Collection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "posts" => Ok(Collection::Posts),
            "tutorials" => Ok(Collection::Tutorials),
            "categories" => Ok(Collection::Categories),
            "comments" => Ok(Collection::Comments),
            "settings" => Ok(Collection::Settings),
            other => Err(format!("unknown collection '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Created,
    Updated,
    Deleted,
}

/// A single document change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEvent {
    pub collection: Collection,
    pub kind: ChangeKind,
    pub id: String,
    pub at: DateTime<Utc>,
}

impl ChangeEvent {
    pub fn new(collection: Collection, kind: ChangeKind, id: impl ToString) -> Self {
        Self {
            collection,
            kind,
            id: id.to_string(),
            at: Utc::now(),
        }
    }
}
