//! Query template rendering
//!
//! Field queries are stored as templates with a subject placeholder. Two
//! placeholder spellings are honored because both occur in existing
//! field-definition files: `$subject` and `?subject`. Rendering substitutes
//! the subject wrapped as an absolute reference (`<subject>`) and prepends a
//! `PREFIX` declaration line for every namespace entry.
//!
//! Rendering is a pure string transformation. Placeholders other than the
//! subject placeholder are passed through untouched; a template with a typo
//! surfaces as a query failure at execution time, not as a render error.

use std::collections::BTreeMap;

/// Namespace prefix table: prefix -> full URI
pub type NamespaceTable = BTreeMap<String, String>;

/// Subject placeholder, template-variable spelling
pub const PLACEHOLDER_DOLLAR: &str = "$subject";

/// Subject placeholder, query-variable spelling
pub const PLACEHOLDER_QUESTION: &str = "?subject";

/// Render one `PREFIX` declaration line per namespace entry
///
/// # Example
/// ```
/// use cicerone_sparql::template::{prefix_block, NamespaceTable};
///
/// let mut namespaces = NamespaceTable::new();
/// namespaces.insert("rdfs".to_string(), "http://www.w3.org/2000/01/rdf-schema#".to_string());
/// let block = prefix_block(&namespaces);
/// assert_eq!(block, "PREFIX rdfs: <http://www.w3.org/2000/01/rdf-schema#>\n");
/// ```
pub fn prefix_block(namespaces: &NamespaceTable) -> String {
    let mut block = String::new();
    for (prefix, uri) in namespaces {
        block.push_str("PREFIX ");
        block.push_str(prefix);
        block.push_str(": <");
        block.push_str(uri);
        block.push_str(">\n");
    }
    block
}

/// Substitute every occurrence of the subject placeholder with `<subject>`
///
/// Both placeholder spellings are replaced. Everything else in the template,
/// including unknown placeholders, is left unchanged.
pub fn substitute_subject(template: &str, subject: &str) -> String {
    let reference = format!("<{}>", subject);
    template
        .replace(PLACEHOLDER_DOLLAR, &reference)
        .replace(PLACEHOLDER_QUESTION, &reference)
}

/// Render a complete query: prefix declarations followed by the substituted template
pub fn render(template: &str, subject: &str, namespaces: &NamespaceTable) -> String {
    let mut query = prefix_block(namespaces);
    query.push_str(&substitute_subject(template, subject));
    query
}

/// Check whether a template contains a subject placeholder in either spelling
pub fn has_subject_placeholder(template: &str) -> bool {
    template.contains(PLACEHOLDER_DOLLAR) || template.contains(PLACEHOLDER_QUESTION)
}
