//! Doc comment parsing.
//!
//! Handles the tags the analyzers read:
//!
//! ```text
//! /**
//!  * Free text description.
//!  * @param {string} name  what it is
//!  * @param {number} [count=1] optional, with default
//!  * @returns {Array<string>}
//!  * @type {JSFoundSet<db:/crm/orders>}
//!  * @extends {Base}
//!  * @deprecated use something else
//!  */
//! ```
//!
//! Unknown tags are kept but ignored. Parsing never fails; malformed tags
//! degrade to missing pieces.

use crate::typesys::parse_doc_type;
use crate::types::{placeholder, Param, TypeInfo};

/// Tags whose first word after the type is a parameter name.
const NAMED_TAGS: &[&str] = &["param", "arg", "argument", "property", "prop"];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocTag {
    /// Tag title without `@`, lower-cased
    pub title: String,
    /// Text between the braces, if any
    pub type_expr: Option<String>,
    pub name: Option<String>,
    /// Name was written as `[name]` or `[name=default]`
    pub optional: bool,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocComment {
    pub description: String,
    pub tags: Vec<DocTag>,
}

impl DocComment {
    /// Parse a raw comment, delimiters included.
    pub fn parse(raw: &str) -> Self {
        let body = unwrap_comment(raw);

        let mut description = Vec::new();
        let mut tag_texts: Vec<String> = Vec::new();
        for line in body.lines() {
            let trimmed = line.trim();
            if trimmed.starts_with('@') {
                tag_texts.push(trimmed.to_string());
            } else if let Some(current) = tag_texts.last_mut() {
                if !trimmed.is_empty() {
                    current.push('\n');
                    current.push_str(trimmed);
                }
            } else {
                description.push(trimmed);
            }
        }

        Self {
            description: description.join("\n").trim().to_string(),
            tags: tag_texts.iter().map(|t| parse_tag(t)).collect(),
        }
    }

    pub fn tag(&self, title: &str) -> Option<&DocTag> {
        self.tags.iter().find(|t| t.title == title)
    }

    /// Description, or `fallback` when the comment has none.
    pub fn description_or(&self, fallback: &str) -> String {
        if self.description.is_empty() {
            fallback.to_string()
        } else {
            self.description.clone()
        }
    }

    /// Type from `@type`.
    pub fn declared_type(&self) -> Option<TypeInfo> {
        self.tag("type").map(|t| tag_type(t))
    }

    /// Parameters from `@param` tags, in tag order. Tags without a name are skipped.
    pub fn params(&self) -> Vec<Param> {
        self.tags
            .iter()
            .filter(|t| matches!(t.title.as_str(), "param" | "arg" | "argument"))
            .filter_map(|t| {
                let name = t.name.clone()?;
                let mut ty = tag_type(t);
                if t.optional {
                    ty = ty.into_optional();
                }
                let description = if t.description.is_empty() {
                    placeholder::PARAMETER.to_string()
                } else {
                    t.description.clone()
                };
                Some(Param {
                    name,
                    optional: ty.optional,
                    ty,
                    description,
                })
            })
            .collect()
    }

    /// Return type from `@returns`/`@return`; `void` when absent.
    pub fn returns(&self) -> TypeInfo {
        self.tags
            .iter()
            .find(|t| t.title == "returns" || t.title == "return")
            .map_or_else(TypeInfo::void, tag_type)
    }

    /// Base type name from `@extends`/`@augments`.
    pub fn extends(&self) -> Option<String> {
        let tag = self
            .tags
            .iter()
            .find(|t| t.title == "extends" || t.title == "augments")?;
        let expr = tag.type_expr.as_deref()?.trim();
        (!expr.is_empty()).then(|| parse_doc_type(expr).name)
    }

    /// Deprecation note; a bare `@deprecated` yields a generic note.
    pub fn deprecated(&self) -> Option<String> {
        self.tag("deprecated").map(|t| {
            if t.description.is_empty() {
                "Deprecated".to_string()
            } else {
                t.description.clone()
            }
        })
    }
}

fn tag_type(tag: &DocTag) -> TypeInfo {
    match tag.type_expr.as_deref() {
        Some(expr) if !expr.trim().is_empty() => parse_doc_type(expr),
        _ => TypeInfo::unknown(),
    }
}

/// Strip comment delimiters and the leading `*` gutter of each line.
fn unwrap_comment(raw: &str) -> String {
    let raw = raw.trim();
    if let Some(block) = raw.strip_prefix("/*") {
        let block = block.trim_start_matches('*');
        let block = block.strip_suffix("*/").unwrap_or(block);
        block
            .lines()
            .map(|line| {
                let line = line.trim_start();
                let line = line.strip_prefix('*').unwrap_or(line);
                line.strip_prefix(' ').unwrap_or(line)
            })
            .collect::<Vec<_>>()
            .join("\n")
    } else {
        raw.lines()
            .map(|line| {
                let line = line.trim_start();
                let line = line.trim_start_matches('/');
                line.strip_prefix(' ').unwrap_or(line)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn parse_tag(text: &str) -> DocTag {
    let text = text.trim_start_matches('@');
    let title_end = text
        .find(|c: char| c.is_whitespace() || c == '{')
        .unwrap_or(text.len());
    let title = text[..title_end].to_lowercase();
    let mut rest = text[title_end..].trim_start();

    let mut tag = DocTag {
        title,
        ..Default::default()
    };

    if rest.starts_with('{') {
        if let Some(end) = matching_close(rest, '{', '}') {
            tag.type_expr = Some(rest[1..end].trim().to_string());
            rest = rest[end + 1..].trim_start();
        } else {
            // Unterminated braces: the whole remainder is the type.
            tag.type_expr = Some(rest[1..].trim().to_string());
            rest = "";
        }
    }

    if NAMED_TAGS.contains(&tag.title.as_str()) {
        if rest.starts_with('[') {
            let (inner, after) = match matching_close(rest, '[', ']') {
                Some(end) => (&rest[1..end], &rest[end + 1..]),
                None => (&rest[1..], ""),
            };
            let name = inner.split('=').next().unwrap_or("").trim();
            if !name.is_empty() {
                tag.name = Some(name.to_string());
            }
            tag.optional = true;
            rest = after.trim_start();
        } else {
            let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
            if end > 0 {
                tag.name = Some(rest[..end].to_string());
            }
            rest = rest[end..].trim_start();
        }
    } else if tag.type_expr.is_none() && matches!(tag.title.as_str(), "extends" | "augments" | "type") {
        let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        if end > 0 {
            tag.type_expr = Some(rest[..end].to_string());
        }
        rest = rest[end..].trim_start();
    }

    let rest = rest.strip_prefix("- ").unwrap_or(rest);
    tag.description = rest.trim().to_string();
    tag
}

/// Byte index of the delimiter closing the one at index 0.
fn matching_close(text: &str, open: char, close: char) -> Option<usize> {
    let mut depth = 0usize;
    for (idx, c) in text.char_indices() {
        if c == open {
            depth += 1;
        } else if c == close {
            depth = depth.saturating_sub(1);
            if depth == 0 {
                return Some(idx);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_description_and_tags() {
        let doc = DocComment::parse(
            "/**\n * Adds two numbers.\n * Second line.\n * @param {number} a first\n * @param {number} [b=2] second\n * @returns {number}\n */",
        );
        assert_eq!(doc.description, "Adds two numbers.\nSecond line.");

        let params = doc.params();
        assert_eq!(params.len(), 2);
        assert_eq!(params[0].name, "a");
        assert_eq!(params[0].ty.name, "number");
        assert_eq!(params[0].description, "first");
        assert!(!params[0].optional);
        assert_eq!(params[1].name, "b");
        assert!(params[1].optional);

        assert_eq!(doc.returns().name, "number");
    }

    #[test]
    fn test_missing_pieces_degrade() {
        let doc = DocComment::parse("/** @param x */");
        let params = doc.params();
        assert_eq!(params[0].name, "x");
        assert_eq!(params[0].ty, TypeInfo::unknown());
        assert_eq!(params[0].description, placeholder::PARAMETER);
        assert_eq!(doc.returns(), TypeInfo::void());
        assert_eq!(doc.description_or("fallback"), "fallback");

        // A @param without a name contributes nothing.
        assert!(DocComment::parse("/** @param {string} */").params().is_empty());
    }

    #[test]
    fn test_optional_from_type_suffix() {
        let doc = DocComment::parse("/** @param {string=} label */");
        assert!(doc.params()[0].optional);
    }

    #[test]
    fn test_nested_braces_in_type() {
        let doc = DocComment::parse("/** @type {{a: number}} */");
        let tag = doc.tag("type").unwrap();
        assert_eq!(tag.type_expr.as_deref(), Some("{a: number}"));
    }

    #[test]
    fn test_type_extends_deprecated() {
        let doc = DocComment::parse(
            "/**\n * @type {JSFoundSet<db:/crm/orders>}\n * @extends {Base}\n * @deprecated use other\n */",
        );
        let ty = doc.declared_type().unwrap();
        assert_eq!(ty.name, "JSFoundSet");
        assert_eq!(ty.db_table_ref.as_deref(), Some("crm/orders"));
        assert_eq!(doc.extends().as_deref(), Some("Base"));
        assert_eq!(doc.deprecated().as_deref(), Some("use other"));

        let bare = DocComment::parse("/** @extends Base\n @deprecated */");
        assert_eq!(bare.extends().as_deref(), Some("Base"));
        assert_eq!(bare.deprecated().as_deref(), Some("Deprecated"));
    }

    #[test]
    fn test_line_comments() {
        let doc = DocComment::parse("// Counter value\n// @type {number}");
        assert_eq!(doc.description, "Counter value");
        assert_eq!(doc.declared_type().unwrap().name, "number");
    }

    #[test]
    fn test_return_alias_and_multiline_tag() {
        let doc = DocComment::parse("/**\n * @return {boolean} true when\n *   done\n */");
        let tag = doc.tag("return").unwrap();
        assert_eq!(tag.description, "true when\ndone");
        assert_eq!(doc.returns().name, "boolean");
    }
}
