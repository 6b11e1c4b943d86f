//! Platform type codes.
//!
//! The catalog describes parameter and return types with JVM-style codes:
//! `I` (int), `[Ljava.lang.String;` (array of strings), fully qualified class
//! names, and so on. `map_platform_type` resolves them in this order:
//!
//! 1. leading `[` characters: array depth, element resolved recursively
//! 2. `L<name>;`: object type, resolved by name
//! 3. single-letter primitive codes
//! 4. well-known JVM names (`java.lang.String` and friends)
//! 5. suffix match against the catalog's qualified → scripting name table
//! 6. otherwise an opaque type named by the raw code (logged)

use tracing::warn;

use super::doc::parse_doc_type;
use crate::types::TypeInfo;

/// Well-known JVM names, written as doc type expressions.
const BUILTIN_ALIASES: &[(&str, &str)] = &[
    ("java.lang.String", "string"),
    ("java.lang.Integer", "number"),
    ("java.lang.Double", "number"),
    ("java.lang.Float", "number"),
    ("java.lang.Long", "number"),
    ("java.lang.Short", "number"),
    ("java.lang.Number", "number"),
    ("java.lang.Boolean", "boolean"),
    ("java.lang.Object", "any"),
    ("java.math.BigDecimal", "number"),
    ("java.util.Date", "Date"),
    ("java.sql.Date", "Date"),
    ("java.sql.Time", "Date"),
    ("java.sql.Timestamp", "Date"),
    ("java.util.List", "Array<any>"),
    ("java.util.Map", "Record<string, any>"),
    ("org.mozilla.javascript.Function", "Function"),
    ("org.mozilla.javascript.NativeArray", "Array<any>"),
    ("org.mozilla.javascript.NativeObject", "object"),
    ("int", "number"),
    ("long", "number"),
    ("short", "number"),
    ("double", "number"),
    ("float", "number"),
    ("char", "string"),
    ("boolean", "boolean"),
    ("void", "void"),
    ("any", "any"),
];

fn primitive(code: &str) -> Option<&'static str> {
    match code {
        "I" | "D" | "F" | "J" | "S" => Some("number"),
        "Z" => Some("boolean"),
        "B" => Some("byte"),
        "C" => Some("string"),
        "V" => Some("void"),
        _ => None,
    }
}

/// Qualified platform name → scripting name, in catalog order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasTable {
    entries: Vec<(String, String)>,
}

impl AliasTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, qualified: impl Into<String>, scripting: impl Into<String>) {
        self.entries.push((qualified.into(), scripting.into()));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First scripting name whose qualified name is a suffix of `code`.
    pub fn resolve_suffix(&self, code: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(qualified, _)| code.ends_with(qualified.as_str()))
            .map(|(_, scripting)| scripting.as_str())
    }
}

/// Decode a platform type code. Never fails: unresolvable codes become an
/// opaque named type carrying the raw code.
pub fn map_platform_type(code: &str, aliases: &AliasTable) -> TypeInfo {
    let code = code.trim();
    if code.is_empty() {
        return TypeInfo::any();
    }

    let depth = code.chars().take_while(|&c| c == '[').count();
    if depth > 0 {
        let rest = &code[depth..];
        let element = if let Some(object) = rest.strip_prefix('L') {
            map_platform_type(object.strip_suffix(';').unwrap_or(object), aliases)
        } else {
            let base = rest.strip_suffix(';').unwrap_or(rest);
            match primitive(base) {
                Some(mapped) => parse_doc_type(mapped),
                None => {
                    warn!(code, base, "unknown primitive array element type");
                    TypeInfo::named(base)
                }
            }
        };
        return element.into_array(depth as u32);
    }

    if let Some(object) = code.strip_prefix('L').and_then(|c| c.strip_suffix(';')) {
        return map_platform_type(object, aliases);
    }

    if let Some(mapped) = primitive(code) {
        return parse_doc_type(mapped);
    }

    if let Some((_, mapped)) = BUILTIN_ALIASES.iter().find(|(name, _)| *name == code) {
        return parse_doc_type(mapped);
    }

    if let Some(scripting) = aliases.resolve_suffix(code) {
        return TypeInfo::named(scripting);
    }

    warn!(code, "unknown platform type code");
    TypeInfo::named(code)
}
