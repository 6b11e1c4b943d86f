//! Call-site checking for one document.
//!
//! Every `object.method(args)` call whose object and method are plain
//! identifiers is resolved against the symbol index. The document is walked
//! in source order with a fresh `ScopeStack`, so a call only sees variables
//! declared before it. Nested calls (in arguments, initializers or callback
//! bodies) are checked too, after their enclosing call. Function parameters
//! are bound as `any` in the function's own scope.

use tracing::{debug, warn};
use tree_sitter::Node;

use super::overload::{resolve, ResolveOptions};
use super::scope::ScopeStack;
use super::{Diagnostic, Severity, SourceRange};
use crate::extraction::{literal_kind, named_children, DocComment, ParseError, SourceTree};
use crate::index::SymbolIndex;
use crate::typesys::infer_literal;
use crate::types::{Function, TypeInfo};

/// Checks documents against a symbol index. Holds no per-document state.
pub struct DiagnosticEngine<'i> {
    index: &'i SymbolIndex,
    options: ResolveOptions,
}

impl<'i> DiagnosticEngine<'i> {
    pub fn new(index: &'i SymbolIndex, options: ResolveOptions) -> Self {
        Self { index, options }
    }

    /// Diagnostics for `text`, in source order.
    ///
    /// A document that does not parse yields `Err`; callers keep whatever
    /// diagnostics they published before.
    pub fn analyze(&self, text: &str) -> Result<Vec<Diagnostic>, ParseError> {
        let tree = match SourceTree::parse(text) {
            Ok(tree) => tree,
            Err(e) => {
                warn!(error = %e, "document not analyzed");
                return Err(e);
            }
        };
        let mut pass = Pass {
            engine: self,
            tree: &tree,
            scopes: ScopeStack::new(),
            diagnostics: Vec::new(),
        };
        pass.visit(tree.root());
        debug!(count = pass.diagnostics.len(), "document analyzed");
        Ok(pass.diagnostics)
    }
}

/// State of one `analyze` call.
struct Pass<'e, 'i, 't, 's> {
    engine: &'e DiagnosticEngine<'i>,
    tree: &'t SourceTree<'s>,
    scopes: ScopeStack,
    diagnostics: Vec<Diagnostic>,
}

impl Pass<'_, '_, '_, '_> {
    fn visit(&mut self, node: Node<'_>) {
        match node.kind() {
            "statement_block" => {
                self.scopes.push();
                self.visit_children(node);
                self.scopes.pop();
            }
            "variable_declaration" | "lexical_declaration" => self.declaration(node),
            "function_declaration"
            | "generator_function_declaration"
            | "function_expression"
            | "function"
            | "generator_function"
            | "arrow_function"
            | "method_definition" => {
                self.scopes.push();
                self.parameters(node);
                if let Some(body) = node.child_by_field_name("body") {
                    self.visit(body);
                }
                self.scopes.pop();
            }
            "call_expression" => {
                self.check_call(node);
                self.visit_children(node);
            }
            _ => self.visit_children(node),
        }
    }

    fn visit_children(&mut self, node: Node<'_>) {
        for child in named_children(node) {
            self.visit(child);
        }
    }

    /// Bind each declarator: a doc `@type` wins, then a literal initializer.
    /// Anything else stays unbound.
    fn declaration(&mut self, node: Node<'_>) {
        let declared = self
            .tree
            .comment_for(node)
            .filter(|c| c.is_doc_block())
            .and_then(|c| DocComment::parse(&c.text).declared_type());

        for declarator in named_children(node) {
            if declarator.kind() != "variable_declarator" {
                continue;
            }
            let value = declarator.child_by_field_name("value");
            if let Some(value) = value {
                self.visit(value);
            }

            let Some(name) = declarator.child_by_field_name("name") else {
                continue;
            };
            if name.kind() != "identifier" {
                continue;
            }
            let ty = declared
                .clone()
                .or_else(|| value.and_then(literal_kind).map(infer_literal));
            if let Some(ty) = ty {
                self.scopes.bind(self.tree.text(name), ty);
            }
        }
    }

    /// Parameters shadow outer bindings as `any`. Default values are visited
    /// before the parameter they belong to is bound.
    fn parameters(&mut self, function: Node<'_>) {
        if let Some(single) = function.child_by_field_name("parameter") {
            self.bind_pattern(single);
        }
        let Some(list) = function.child_by_field_name("parameters") else {
            return;
        };
        for param in named_children(list) {
            match param.kind() {
                "assignment_pattern" => {
                    if let Some(default) = param.child_by_field_name("right") {
                        self.visit(default);
                    }
                    if let Some(left) = param.child_by_field_name("left") {
                        self.bind_pattern(left);
                    }
                }
                _ => self.bind_pattern(param),
            }
        }
    }

    fn bind_pattern(&mut self, pattern: Node<'_>) {
        match pattern.kind() {
            "identifier" => self.scopes.bind(self.tree.text(pattern), TypeInfo::any()),
            "rest_pattern" => {
                for child in named_children(pattern) {
                    self.bind_pattern(child);
                }
            }
            _ => {}
        }
    }

    fn check_call(&mut self, call: Node<'_>) {
        let Some(callee) = call.child_by_field_name("function") else {
            return;
        };
        if callee.kind() != "member_expression" {
            return;
        }
        let (Some(object), Some(property)) = (
            callee.child_by_field_name("object"),
            callee.child_by_field_name("property"),
        ) else {
            return;
        };
        if object.kind() != "identifier" || property.kind() != "property_identifier" {
            return;
        }

        let object_name = self.tree.text(object);
        let method = self.tree.text(property);
        let Some(obj) = self.engine.index.lookup(object_name) else {
            return;
        };
        let candidates: Vec<&Function> = obj.overloads(method).collect();
        if candidates.is_empty() {
            return;
        }

        let actuals: Vec<TypeInfo> = call
            .child_by_field_name("arguments")
            .map(named_children)
            .unwrap_or_default()
            .into_iter()
            .map(|arg| self.actual_type(arg))
            .collect();

        if let Err(details) = resolve(candidates, &actuals, self.engine.options) {
            self.diagnostics.push(Diagnostic {
                range: SourceRange::of(self.tree.source(), call),
                severity: Severity::Error,
                message: format!(
                    "No matching overload found for function '{object_name}.{method}'.\n{}",
                    details.join(";\n")
                ),
            });
        }
    }

    fn actual_type(&self, arg: Node<'_>) -> TypeInfo {
        if let Some(kind) = literal_kind(arg) {
            return infer_literal(kind);
        }
        if arg.kind() == "identifier" {
            return self
                .scopes
                .lookup(self.tree.text(arg))
                .cloned()
                .unwrap_or_else(TypeInfo::any);
        }
        TypeInfo::any()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Param, ScriptObject};

    fn param(name: &str, ty: &str, optional: bool) -> Param {
        Param {
            name: name.into(),
            ty: TypeInfo::named(ty),
            description: String::new(),
            optional,
        }
    }

    fn function(name: &str, params: Vec<Param>) -> Function {
        Function {
            name: name.into(),
            params,
            returns: TypeInfo::void(),
            description: String::new(),
            location: None,
        }
    }

    /// `db.get(id: number)`, `db.find(name: string, limit?: number)`.
    fn index() -> SymbolIndex {
        let mut db = ScriptObject::new("db");
        db.functions.push(function("get", vec![param("id", "number", false)]));
        db.functions.push(function(
            "find",
            vec![param("name", "string", false), param("limit", "number", true)],
        ));
        let mut index = SymbolIndex::new();
        index.insert(db);
        index
    }

    fn analyze(text: &str) -> Vec<Diagnostic> {
        let index = index();
        DiagnosticEngine::new(&index, ResolveOptions::default())
            .analyze(text)
            .unwrap()
    }

    #[test]
    fn test_string_where_number_expected() {
        let diagnostics = analyze("db.get(\"x\");\n");
        assert_eq!(diagnostics.len(), 1);
        let d = &diagnostics[0];
        assert_eq!(d.severity, Severity::Error);
        assert_eq!(
            d.message,
            "No matching overload found for function 'db.get'.\nArgument 1 ('id'): expected number, got string"
        );
        assert_eq!(d.range.start.line, 0);
        assert_eq!(d.range.start.character, 0);
        assert_eq!(d.range.end.character, 11);
    }

    #[test]
    fn test_matching_call_is_clean() {
        assert!(analyze("db.get(1);\n").is_empty());
        assert!(analyze("db.find(\"a\");\ndb.find(\"a\", 2);\ndb.find(\"a\", null);\n").is_empty());
    }

    #[test]
    fn test_unknown_targets_are_ignored() {
        assert!(analyze("other.get(\"x\");\ndb.missing(1);\nget(\"x\");\ndb[\"get\"](\"x\");\n").is_empty());
    }

    #[test]
    fn test_arity_details_are_joined() {
        let diagnostics = analyze("db.get(1, 2);\n");
        assert_eq!(
            diagnostics[0].message,
            "No matching overload found for function 'db.get'.\nArgument 2: unexpected;\nIncorrect number of arguments: expected 1-1, got 2"
        );
    }

    #[test]
    fn test_variables_follow_block_scope() {
        let text = "var id = \"s\";\n{\n  var id = 3;\n  db.get(id);\n}\ndb.get(id);\n";
        let diagnostics = analyze(text);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].range.start.line, 5);
    }

    #[test]
    fn test_doc_type_overrides_literal() {
        let text = "/** @type {number} */\nvar id = \"s\";\ndb.get(id);\n";
        assert!(analyze(text).is_empty());
    }

    #[test]
    fn test_only_doc_blocks_declare_types() {
        assert!(analyze("/* @type {string} */\nvar id = 1;\ndb.get(id);\n").is_empty());
        assert!(analyze("// @type {string}\nvar id = 1;\ndb.get(id);\n").is_empty());
        assert_eq!(analyze("/** @type {string} */\nvar id = 1;\ndb.get(id);\n").len(), 1);
    }

    #[test]
    fn test_parameters_shadow_outer_bindings() {
        let text = "var id = \"s\";\nfunction f(id) {\n  db.get(id);\n}\ndb.get(id);\n";
        let diagnostics = analyze(text);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].range.start.line, 4);

        assert!(analyze("var id = \"s\";\nvar g = id => db.get(id);\n").is_empty());
        assert!(analyze("var id = \"s\";\nvar g = function (a, id = 2, ...rest) { db.get(id); };\n").is_empty());
    }

    #[test]
    fn test_calls_in_parameter_defaults_are_checked() {
        let diagnostics = analyze("function f(a = db.get(\"x\")) {}\n");
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].range.start.character, 15);
    }

    #[test]
    fn test_unanalyzed_expressions_are_compatible() {
        assert!(analyze("var id = load();\ndb.get(id);\ndb.get(unbound);\ndb.get(a + b);\ndb.get(-1);\n").is_empty());
    }

    #[test]
    fn test_null_needs_optional_parameter() {
        assert_eq!(analyze("db.get(null);\n").len(), 1);
    }

    #[test]
    fn test_nested_calls_in_source_order() {
        let text = "function f() {\n  db.find(db.get(\"a\"), true);\n}\n";
        let diagnostics = analyze(text);
        assert_eq!(diagnostics.len(), 2);
        assert!(diagnostics[0].message.contains("'db.find'"));
        assert!(diagnostics[1].message.contains("'db.get'"));
        assert_eq!(diagnostics[1].range.start.line, 1);
        assert_eq!(diagnostics[1].range.start.character, 10);
    }

    #[test]
    fn test_parse_failure_is_an_error() {
        let index = index();
        let engine = DiagnosticEngine::new(&index, ResolveOptions::default());
        assert!(engine.analyze("db.get(").is_err());
    }

    #[test]
    fn test_runs_are_independent() {
        let index = index();
        let engine = DiagnosticEngine::new(&index, ResolveOptions::default());
        assert!(engine.analyze("var id = 1;\n").unwrap().is_empty());
        // `id` from the previous run is not visible here.
        assert!(engine.analyze("db.get(id);\n").unwrap().is_empty());
        assert_eq!(engine.analyze("var id = true;\ndb.get(id);\n").unwrap().len(), 1);
    }
}
