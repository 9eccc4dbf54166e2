use crate::foundation::error::{TwibbonError, TwibbonResult};

/// Campaign record as stored by the campaign service. Other storage columns are ignored.
///
/// The frame dimensions fix the editor's aspect ratio for the whole session.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Campaign {
    pub slug: String,
    pub frame_url: String,
    pub frame_width: u32,
    pub frame_height: u32,
    #[serde(default)]
    pub campaign_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Campaign {
    pub fn new(
        slug: impl Into<String>,
        frame_url: impl Into<String>,
        frame_width: u32,
        frame_height: u32,
    ) -> Self {
        let slug = slug.into();
        Self {
            campaign_name: slug.clone(),
            slug,
            frame_url: frame_url.into(),
            frame_width,
            frame_height,
            description: None,
        }
    }

    /// `frame_height / frame_width`.
    pub fn aspect_ratio(&self) -> f64 {
        f64::from(self.frame_height) / f64::from(self.frame_width)
    }

    pub fn validate(&self) -> TwibbonResult<()> {
        if self.slug.trim().is_empty() {
            return Err(TwibbonError::validation("campaign slug must be non-empty"));
        }
        if self.frame_url.trim().is_empty() {
            return Err(TwibbonError::validation(format!(
                "campaign '{}' has no frame_url",
                self.slug
            )));
        }
        if self.frame_width == 0 || self.frame_height == 0 {
            return Err(TwibbonError::validation(format!(
                "campaign '{}' frame must be non-zero, got {}x{}",
                self.slug, self.frame_width, self.frame_height
            )));
        }
        Ok(())
    }
}

/// Slug as typed into the campaign form: lowercase, whitespace runs become `-`.
pub fn normalize_slug(raw: &str) -> String {
    raw.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
#[path = "../../tests/unit/campaign/model.rs"]
mod tests;
