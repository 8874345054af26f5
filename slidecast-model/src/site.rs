/// Site-wide metadata advertised by the content API.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SiteInfo {
    pub name: String,
    pub post_count: u64,
    /// Page size the API uses when `limit` is omitted.
    pub default_limit: Option<u32>,
}

/// A tag search result.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TagSummary {
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub post_count: u64,
}
