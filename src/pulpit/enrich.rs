//! Best-effort sermon metadata enrichment.
//!
//! A generative-text collaborator turns (title, scripture, preacher) into a
//! short summary and a handful of tags. It is never required for
//! correctness: any failure collapses to a fixed fallback pair.

use tracing::warn;

use crate::error::Result;

pub const FALLBACK_SUMMARY: &str = "Could not generate summary at this time.";
pub const FALLBACK_TAGS: [&str; 2] = ["Sermon", "Church"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedMetadata {
    pub summary: String,
    pub tags: Vec<String>,
}

impl GeneratedMetadata {
    pub fn fallback() -> Self {
        Self {
            summary: FALLBACK_SUMMARY.to_string(),
            tags: FALLBACK_TAGS.iter().map(|t| t.to_string()).collect(),
        }
    }
}

/// External collaborator producing sermon metadata. Implementations wrap a
/// real generative-text service; none is bundled here.
pub trait MetadataGenerator {
    fn generate(&self, title: &str, scripture: &str, preacher: &str) -> Result<GeneratedMetadata>;
}

/// Run the generator, collapsing any failure to the fixed fallback pair.
pub fn generate_or_fallback<G: MetadataGenerator>(
    generator: &G,
    title: &str,
    scripture: &str,
    preacher: &str,
) -> GeneratedMetadata {
    match generator.generate(title, scripture, preacher) {
        Ok(metadata) => metadata,
        Err(e) => {
            warn!(error = %e, "metadata generation failed, using fallback");
            GeneratedMetadata::fallback()
        }
    }
}

/// The prompt real generator implementations agree on.
pub fn build_prompt(title: &str, scripture: &str, preacher: &str) -> String {
    format!(
        "Generate a short, engaging summary (max 2 sentences) and 3 relevant tags \
         for a church sermon.\nTitle: {title}\nScripture: {scripture}\nPreacher: {preacher}"
    )
}
