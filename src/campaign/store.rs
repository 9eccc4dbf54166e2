use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::campaign::model::Campaign;
use crate::foundation::error::{TwibbonError, TwibbonResult};

/// Read-only campaign lookup by slug.
pub trait CampaignSource {
    fn fetch_campaign(&self, slug: &str) -> TwibbonResult<Campaign>;
}

/// Campaigns held in memory, keyed by slug.
#[derive(Clone, Debug, Default)]
pub struct InMemoryCampaigns {
    by_slug: BTreeMap<String, Campaign>,
}

impl InMemoryCampaigns {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a campaign. Invalid records are rejected.
    pub fn insert(&mut self, campaign: Campaign) -> TwibbonResult<()> {
        campaign.validate()?;
        self.by_slug.insert(campaign.slug.clone(), campaign);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.by_slug.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_slug.is_empty()
    }

    pub fn slugs(&self) -> impl Iterator<Item = &str> {
        self.by_slug.keys().map(String::as_str)
    }
}

impl FromIterator<Campaign> for InMemoryCampaigns {
    fn from_iter<I: IntoIterator<Item = Campaign>>(iter: I) -> Self {
        Self {
            by_slug: iter.into_iter().map(|c| (c.slug.clone(), c)).collect(),
        }
    }
}

impl CampaignSource for InMemoryCampaigns {
    fn fetch_campaign(&self, slug: &str) -> TwibbonResult<Campaign> {
        self.by_slug
            .get(slug)
            .cloned()
            .ok_or_else(|| TwibbonError::not_found(format!("campaign '{slug}'")))
    }
}

/// JSON file holding an array of campaign records.
///
/// The file is parsed once on open. Relative `frame_url` paths resolve against [`Self::root`].
#[derive(Clone, Debug)]
pub struct JsonCampaignStore {
    path: PathBuf,
    campaigns: InMemoryCampaigns,
}

impl JsonCampaignStore {
    #[tracing::instrument]
    pub fn open(path: impl AsRef<Path> + std::fmt::Debug) -> TwibbonResult<Self> {
        let path = path.as_ref().to_path_buf();
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("read campaigns '{}'", path.display()))?;
        let records: Vec<Campaign> = serde_json::from_str(&text)
            .map_err(|e| TwibbonError::serde(format!("parse '{}': {e}", path.display())))?;

        let mut campaigns = InMemoryCampaigns::new();
        for c in records {
            if campaigns.by_slug.contains_key(&c.slug) {
                return Err(TwibbonError::validation(format!(
                    "duplicate campaign slug '{}' in '{}'",
                    c.slug,
                    path.display()
                )));
            }
            campaigns.insert(c)?;
        }
        tracing::debug!(count = campaigns.len(), "loaded campaigns");
        Ok(Self { path, campaigns })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory containing the store file.
    pub fn root(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }

    pub fn campaigns(&self) -> &InMemoryCampaigns {
        &self.campaigns
    }
}

impl CampaignSource for JsonCampaignStore {
    fn fetch_campaign(&self, slug: &str) -> TwibbonResult<Campaign> {
        self.campaigns.fetch_campaign(slug)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/campaign/store.rs"]
mod tests;
