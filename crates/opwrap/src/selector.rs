//! Lookup criteria and their resolution into a single selector

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;
use serde_json::Value;

use crate::error::{OpError, Result};

/// Prefix of links produced by 1Password's item sharing
pub const SHARE_URL_PREFIX: &str = "https://share.1password.com/";

/// Marker present in private links copied from the 1Password apps
pub const PRIVATE_LINK_MARKER: &str = "/open/i?";

const MISSING: &str = "must provide one of: title, id, or url";
const AMBIGUOUS: &str = "must provide exactly one of: title, id, or url";
const BAD_URL: &str = "URL must be a valid share URL or private link";

/// Named lookup inputs supplied by a caller.
///
/// Exactly one of `title`, `id` or `url` must be set for a lookup to be
/// valid. `vault` is not a lookup key; it overrides the client's vault for
/// title lookups.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "CriteriaFields")]
pub struct Criteria {
    pub title: Option<String>,
    pub id: Option<String>,
    pub url: Option<String>,
    pub vault: Option<String>,
    /// Keys that are not recognized lookup inputs
    pub unknown: Vec<String>,
}

/// Wire shape of [`Criteria`]; extra keys are kept so parsing can reject them
#[derive(Deserialize)]
struct CriteriaFields {
    title: Option<String>,
    id: Option<String>,
    url: Option<String>,
    vault: Option<String>,
    #[serde(flatten)]
    extra: BTreeMap<String, Value>,
}

impl From<CriteriaFields> for Criteria {
    fn from(fields: CriteriaFields) -> Self {
        Self {
            title: fields.title,
            id: fields.id,
            url: fields.url,
            vault: fields.vault,
            unknown: fields.extra.into_keys().collect(),
        }
    }
}

impl Criteria {
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    pub fn id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    pub fn url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }

    /// Override the client's vault for this lookup
    pub fn in_vault(mut self, vault: impl Into<String>) -> Self {
        self.vault = Some(vault.into());
        self
    }

    /// Set a criterion by name. Unrecognized names are kept so that
    /// [`Selector::parse`] can reject them.
    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        let value = value.into();
        match key {
            "title" => self.title = Some(value),
            "id" => self.id = Some(value),
            "url" => self.url = Some(value),
            "vault" => self.vault = Some(value),
            other => self.unknown.push(other.to_string()),
        }
        self
    }

    /// Build criteria from `(key, value)` pairs
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        pairs
            .into_iter()
            .fold(Self::default(), |criteria, (k, v)| criteria.with(k.as_ref(), v))
    }
}

/// The single lookup a `get` resolves to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    Title(String),
    Id(String),
    /// `https://share.1password.com/...`
    UrlShare(String),
    /// Private link containing `/open/i?`
    UrlPrivate(String),
}

impl Selector {
    /// Resolve criteria into exactly one selector
    pub fn parse(criteria: &Criteria) -> Result<Self> {
        let provided: Vec<(&str, &str)> = [
            ("title", &criteria.title),
            ("id", &criteria.id),
            ("url", &criteria.url),
        ]
        .into_iter()
        .filter_map(|(key, value)| match value.as_deref() {
            Some(v) if !v.is_empty() => Some((key, v)),
            _ => None,
        })
        .collect();

        let total = provided.len() + criteria.unknown.len();
        if total == 0 {
            return Err(OpError::invalid_selector(MISSING));
        }
        if total > 1 {
            return Err(OpError::invalid_selector(AMBIGUOUS));
        }

        match provided.first() {
            Some(("title", value)) => Ok(Selector::Title(value.to_string())),
            Some(("id", value)) => Ok(Selector::Id(value.to_string())),
            Some(("url", value)) => parse_url(value),
            _ => Err(OpError::invalid_selector(MISSING)),
        }
    }

    /// The lookup value exactly as supplied
    pub fn value(&self) -> &str {
        match self {
            Selector::Title(v)
            | Selector::Id(v)
            | Selector::UrlShare(v)
            | Selector::UrlPrivate(v) => v,
        }
    }

    /// Short name for logging
    pub fn kind(&self) -> &'static str {
        match self {
            Selector::Title(_) => "title",
            Selector::Id(_) => "id",
            Selector::UrlShare(_) => "url_share",
            Selector::UrlPrivate(_) => "url_private",
        }
    }

    /// `op` arguments selecting this item. `vault` only applies to titles.
    pub fn item_get_args(&self, vault: &str) -> Vec<String> {
        let mut args = vec!["item".to_string(), "get".to_string()];
        match self {
            Selector::Title(title) => {
                args.extend([title.clone(), "--vault".to_string(), vault.to_string()]);
            }
            Selector::Id(id) => {
                args.extend(["--id".to_string(), id.clone()]);
            }
            Selector::UrlShare(url) | Selector::UrlPrivate(url) => {
                args.extend(["--share-link".to_string(), url.clone()]);
            }
        }
        args
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind(), self.value())
    }
}

fn parse_url(url: &str) -> Result<Selector> {
    if url.starts_with(SHARE_URL_PREFIX) {
        Ok(Selector::UrlShare(url.to_string()))
    } else if url.contains(PRIVATE_LINK_MARKER) {
        Ok(Selector::UrlPrivate(url.to_string()))
    } else {
        Err(OpError::invalid_selector(BAD_URL))
    }
}
