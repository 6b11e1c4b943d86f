//! Text forms of symbols for editor features: hover, completion detail,
//! snippets and signature help. Plus the small cursor-context scanners those
//! features need.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::{Function, Param};

/// `receiver.method` right before an opening parenthesis.
static CALL_TARGET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\w+)\.(\w+)\s*$").expect("call target pattern is valid"));

/// `name?` for optional parameters, `name` otherwise.
pub fn parameter_label(param: &Param) -> String {
    if param.optional {
        format!("{}?", param.name)
    } else {
        param.name.clone()
    }
}

fn typed_params(func: &Function) -> String {
    func.params
        .iter()
        .map(|p| format!("{}: {}", parameter_label(p), p.ty))
        .collect::<Vec<_>>()
        .join(", ")
}

/// `name(a: T, b?: U)`
pub fn signature_label(func: &Function) -> String {
    format!("{}({})", func.name, typed_params(func))
}

/// `(method) name(a: T): R`, one line per overload.
pub fn function_detail<'f>(funcs: impl IntoIterator<Item = &'f Function>) -> String {
    funcs
        .into_iter()
        .map(|f| format!("(method) {}: {}", signature_label(f), f.returns))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Markdown hover text, overloads separated by rules.
pub fn function_markdown<'f>(funcs: impl IntoIterator<Item = &'f Function>) -> String {
    funcs
        .into_iter()
        .map(|f| {
            let mut doc = format!("**{}**\n\n_{}_\n\n", f.name, f.description);
            for p in &f.params {
                let optional = if p.optional { "_(optional)_" } else { "" };
                doc.push_str(&format!("- **{}** ({}){optional}: {}\n", p.name, p.ty, p.description));
            }
            doc
        })
        .collect::<Vec<_>>()
        .join("\n---\n")
}

/// Completion snippet with tab stops; optional parameters are bracketed.
pub fn snippet(func: &Function) -> String {
    let stops: Vec<String> = func
        .params
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let stop = format!("${{{}:{}}}", i + 1, p.name);
            if p.optional {
                format!("[{stop}]")
            } else {
                stop
            }
        })
        .collect();
    format!("{}({})", func.name, stops.join(","))
}

/// `(receiver, method)` of the call whose argument list the text ends in.
pub fn call_target(before_cursor: &str) -> Option<(&str, &str)> {
    let open = before_cursor.rfind('(')?;
    let caps = CALL_TARGET.captures(&before_cursor[..open])?;
    let receiver = caps.get(1)?.as_str();
    let method = caps.get(2)?.as_str();
    Some((receiver, method))
}

/// Index of the parameter being typed: commas since the last `(`, capped at
/// the last parameter of `func`.
pub fn active_parameter(before_cursor: &str, func: &Function) -> usize {
    let args = before_cursor.rsplit('(').next().unwrap_or("");
    let index = args.matches(',').count();
    index.min(func.params.len().saturating_sub(1))
}

fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

/// The dotted member chain ending at byte `offset`, e.g. `"db.get"` for
/// `x = db.get|`. A trailing dot keeps an empty last segment (`"db."`).
/// Whitespace inside the chain is skipped; any other character ends it.
pub fn member_chain(text: &str, offset: usize) -> String {
    let end = offset.min(text.len());
    let Some(before) = text.get(..end) else {
        return String::new();
    };

    let mut parts: Vec<String> = Vec::new();
    let mut current: Vec<char> = Vec::new();
    let mut last_was_dot = false;

    for c in before.chars().rev() {
        if is_identifier_char(c) {
            current.push(c);
            last_was_dot = false;
        } else if c == '.' {
            parts.push(current.drain(..).rev().collect());
            last_was_dot = true;
        } else if matches!(c, ' ' | '\t' | '\n' | '\r') {
            continue;
        } else {
            break;
        }
    }

    if !current.is_empty() || last_was_dot {
        parts.push(current.into_iter().rev().collect());
    }
    parts.reverse();
    parts.join(".")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TypeInfo;

    fn find() -> Function {
        Function {
            name: "find".into(),
            params: vec![
                Param {
                    name: "name".into(),
                    ty: TypeInfo::named("string"),
                    description: "Record name".into(),
                    optional: false,
                },
                Param {
                    name: "limit".into(),
                    ty: TypeInfo::named("number"),
                    description: "Max rows".into(),
                    optional: true,
                },
            ],
            returns: TypeInfo::named("JSRecord").into_array(1),
            description: "Find records".into(),
            location: None,
        }
    }

    #[test]
    fn test_labels() {
        let f = find();
        assert_eq!(signature_label(&f), "find(name: string, limit?: number)");
        assert_eq!(
            function_detail([&f, &f]),
            "(method) find(name: string, limit?: number): JSRecord[]\n(method) find(name: string, limit?: number): JSRecord[]"
        );
    }

    #[test]
    fn test_markdown() {
        let f = find();
        assert_eq!(
            function_markdown([&f]),
            "**find**\n\n_Find records_\n\n- **name** (string): Record name\n- **limit** (number)_(optional)_: Max rows\n"
        );
        assert!(function_markdown([&f, &f]).contains("\n---\n**find**"));
    }

    #[test]
    fn test_snippet() {
        assert_eq!(snippet(&find()), "find(${1:name},[${2:limit}])");
    }

    #[test]
    fn test_call_target_and_active_parameter() {
        let f = find();
        assert_eq!(call_target("var r = db.find ("), Some(("db", "find")));
        assert_eq!(call_target("db.find(\"a\", "), Some(("db", "find")));
        assert_eq!(call_target("find("), None);
        assert_eq!(active_parameter("db.find(", &f), 0);
        assert_eq!(active_parameter("db.find(\"a\", ", &f), 1);
        assert_eq!(active_parameter("db.find(\"a\", 1, 2, ", &f), 1);
    }

    #[test]
    fn test_member_chain() {
        let text = "var x = db.ge";
        assert_eq!(member_chain(text, text.len()), "db.ge");
        assert_eq!(member_chain("foo(db.", 7), "db.");
        assert_eq!(member_chain("a.b .\n c", 8), "a.b.c");
        assert_eq!(member_chain("x = (", 5), "");
        assert_eq!(member_chain("plain", 3), "pla");
    }
}
