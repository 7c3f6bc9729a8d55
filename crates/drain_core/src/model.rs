pub const DEFAULT_LAYOUT: &str = "newsletter";

/// A broadcast as handed over by the fetcher. Read-only for the rest of the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Broadcast {
    pub subject: String,
    /// Absent for broadcasts that were never sent (drafts, scheduled).
    pub send_at: Option<String>,
    pub html_body: String,
}

impl Broadcast {
    pub fn new(
        subject: impl Into<String>,
        send_at: Option<&str>,
        html_body: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            send_at: send_at.map(ToOwned::to_owned),
            html_body: html_body.into(),
        }
    }
}

/// Per-run values copied into every document's front matter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSettings {
    pub layout: String,
    pub published: bool,
}

impl Default for DocumentSettings {
    fn default() -> Self {
        Self {
            layout: DEFAULT_LAYOUT.to_string(),
            published: true,
        }
    }
}
