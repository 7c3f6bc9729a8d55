//! Drain core: pure broadcast model and document transformation.
mod convert;
mod document;
mod frontmatter;
mod model;
mod slug;
mod template;

pub use convert::Converter;
pub use document::{render_document, Document, DocumentError};
pub use frontmatter::FrontMatter;
pub use model::{Broadcast, DocumentSettings, DEFAULT_LAYOUT};
pub use slug::{derive_slug, slugify};
pub use template::{strip_template_tail, TEMPLATE_MARKER};
