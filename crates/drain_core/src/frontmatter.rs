use serde::Serialize;

use crate::{Broadcast, DocumentSettings};

/// Metadata header consumed by the static-site generator. Field order is the
/// serialization order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrontMatter {
    pub title: String,
    pub layout: String,
    pub published: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

impl FrontMatter {
    pub fn for_broadcast(broadcast: &Broadcast, settings: &DocumentSettings) -> Self {
        Self {
            title: broadcast.subject.clone(),
            layout: settings.layout.clone(),
            published: settings.published,
            date: broadcast.send_at.clone(),
        }
    }

    /// YAML mapping between `---` fences, ending with a newline.
    pub fn to_block(&self) -> Result<String, serde_yaml::Error> {
        let yaml = serde_yaml::to_string(self)?;
        Ok(format!("---\n{yaml}---\n"))
    }
}
