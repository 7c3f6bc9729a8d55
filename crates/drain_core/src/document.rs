use crate::{derive_slug, strip_template_tail, Broadcast, Converter, DocumentSettings, FrontMatter};

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("failed to serialize front matter: {0}")]
    FrontMatter(#[from] serde_yaml::Error),
}

/// A rendered broadcast, ready to be written as `{slug}.md`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub slug: String,
    pub front_matter: FrontMatter,
    pub content: String,
}

impl Document {
    pub fn filename(&self) -> String {
        format!("{}.md", self.slug)
    }
}

/// Build the full document text: front matter block, blank line, then the
/// Markdown conversion of the body up to the first template marker.
pub fn render_document(
    broadcast: &Broadcast,
    settings: &DocumentSettings,
    converter: &dyn Converter,
) -> Result<Document, DocumentError> {
    let slug = derive_slug(&broadcast.subject);
    let front_matter = FrontMatter::for_broadcast(broadcast, settings);
    let block = front_matter.to_block()?;
    let body = converter.to_markdown(strip_template_tail(&broadcast.html_body));
    let content = format!("{block}\n{body}");
    Ok(Document {
        slug,
        front_matter,
        content,
    })
}
