/// HTML to Markdown conversion seam. Implementations must be pure.
pub trait Converter: Send + Sync {
    fn to_markdown(&self, html: &str) -> String;
}
