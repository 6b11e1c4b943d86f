//! The type algebra: one `TypeInfo` representation for platform type codes
//! and doc-comment type expressions.
//!
//! ```text
//! "[[I", "Ljava.lang.String;" ──► platform::map_platform_type ─┐
//!                                                              ├──► TypeInfo ──► is_assignable / stringify
//! "{Array<string>}", "{db:/crm/x}" ──► doc::parse_doc_type ────┘
//! ```
//!
//! All converters are pure and total: anything they cannot make sense of
//! becomes `unknown` (or the raw code for platform types) and is logged,
//! never returned as an error.

mod doc;
mod platform;

pub use doc::{parse_doc_type, parse_type_expression, DocType};
pub use platform::{map_platform_type, AliasTable};

use crate::types::TypeInfo;

/// Literal categories the analyzers can infer a type from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralKind {
    String,
    Number,
    Boolean,
    Null,
    Regex,
}

/// Primitive type of a literal.
pub fn infer_literal(kind: LiteralKind) -> TypeInfo {
    match kind {
        LiteralKind::String => TypeInfo::named("string"),
        LiteralKind::Number => TypeInfo::named("number"),
        LiteralKind::Boolean => TypeInfo::named("boolean"),
        LiteralKind::Null => TypeInfo::null(),
        LiteralKind::Regex => TypeInfo::named("RegExp"),
    }
}

/// Can a value of type `from` be passed where `to` is expected?
///
/// `any` accepts everything. Otherwise the base names must match and both
/// sides must agree on array-ness. Generic arguments and array depth are not
/// compared.
pub fn is_assignable(from: &TypeInfo, to: &TypeInfo) -> bool {
    if to.is_any() {
        return true;
    }
    from.name == to.name && from.is_array == to.is_array
}

/// Display form used by hover text and diagnostics: `name<args>` plus `[]`.
pub fn stringify(t: &TypeInfo) -> String {
    let mut out = t.name.clone();
    if !t.generic_args.is_empty() {
        let args: Vec<String> = t.generic_args.iter().map(stringify).collect();
        out.push('<');
        out.push_str(&args.join(", "));
        out.push('>');
    }
    if t.is_array {
        out.push_str("[]");
    }
    out
}
