/// Opening delimiter of a templating directive. Everything from the first
/// occurrence onwards is dropped before conversion.
pub const TEMPLATE_MARKER: &str = "{%";

pub fn strip_template_tail(html: &str) -> &str {
    match html.find(TEMPLATE_MARKER) {
        Some(idx) => &html[..idx],
        None => html,
    }
}
