use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};

/// Category of remote API resource. Each category carries its own cache
/// freshness and retention horizons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ResourceKind {
    /// Paged post listings.
    Posts,
    /// Tag / text searches.
    Search,
    /// A single entity looked up by id.
    Entity,
    /// Site-wide metadata.
    SiteInfo,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 4] = [
        ResourceKind::Posts,
        ResourceKind::Search,
        ResourceKind::Entity,
        ResourceKind::SiteInfo,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Posts => "posts",
            ResourceKind::Search => "search",
            ResourceKind::Entity => "entity",
            ResourceKind::SiteInfo => "site_info",
        }
    }
}

impl Display for ResourceKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured response cache key: `[namespace, kind, id?, params?]`.
///
/// Parameters live in a `BTreeMap`, so two keys built with the same
/// parameters in a different order are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QueryKey {
    pub namespace: String,
    pub kind: ResourceKind,
    pub id: Option<String>,
    pub params: BTreeMap<String, String>,
}

impl QueryKey {
    pub fn new(namespace: impl Into<String>, kind: ResourceKind) -> Self {
        Self {
            namespace: namespace.into(),
            kind,
            id: None,
            params: BTreeMap::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_param(
        mut self,
        name: impl Into<String>,
        value: impl ToString,
    ) -> Self {
        self.params.insert(name.into(), value.to_string());
        self
    }

    /// Flat textual form, `namespace:kind[:id][:k=v&k=v]`.
    pub fn render(&self) -> String {
        let mut out = format!("{}:{}", self.namespace, self.kind);
        if let Some(id) = &self.id {
            out.push(':');
            out.push_str(id);
        }
        if !self.params.is_empty() {
            out.push(':');
            let pairs: Vec<String> = self
                .params
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect();
            out.push_str(&pairs.join("&"));
        }
        out
    }
}

impl Display for QueryKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}
