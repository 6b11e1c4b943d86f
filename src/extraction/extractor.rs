//! Declaration extraction from one script file.
//!
//! Only top-level statements are inspected:
//!
//! - `function f(a, b) {}` becomes a `Function`
//! - `function C(a) { this.m = function () {}; this.v = 1; }` becomes a
//!   constructor-style `Class`: function-valued self-assignments are methods,
//!   literal-valued ones are class variables
//! - `var x = ...;` / `let` / `const` declarators become `Variable`s
//!
//! Typing comes only from attached `/** */` doc comments; line comments and
//! plain block comments are ignored. Parameters are merged by
//! name: the doc side wins on a match, AST-only parameters are `unknown`,
//! doc-only parameters are appended in doc order.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;
use tree_sitter::Node;

use super::jsdoc::DocComment;
use super::treesitter::{is_function_expression, literal_kind, named_children, ParseError, SourceTree};
use crate::types::{placeholder, Class, ExtractionResult, Function, Param, SourceLocation, TypeInfo, Variable};

/// Parameter as written in the function's parameter list.
#[derive(Debug, Clone, PartialEq, Eq)]
struct AstParam {
    name: String,
    /// Has a default value or is a rest parameter
    optional: bool,
}

/// Extract declarations from source text. `file` is recorded in source locations.
pub fn extract_source(source: &str, file: &str) -> Result<ExtractionResult, ParseError> {
    let tree = SourceTree::parse(source)?;
    let result = Extractor { tree: &tree, file }.run();
    debug!(
        file,
        declarations = result.len(),
        comments = tree.comments().len(),
        "declarations extracted"
    );
    Ok(result)
}

/// Read and extract one file.
pub fn extract_file(path: &Path) -> Result<ExtractionResult> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("Failed to read script {}", path.display()))?;
    let file = path.to_string_lossy();
    extract_source(&source, &file).with_context(|| format!("Failed to parse {}", path.display()))
}

struct Extractor<'a, 's> {
    tree: &'a SourceTree<'s>,
    file: &'a str,
}

impl<'a, 's> Extractor<'a, 's> {
    fn run(&self) -> ExtractionResult {
        let mut result = ExtractionResult::default();
        for node in named_children(self.tree.root()) {
            match node.kind() {
                "function_declaration" | "generator_function_declaration" => {
                    self.function_declaration(node, &mut result)
                }
                "variable_declaration" | "lexical_declaration" => {
                    for declarator in named_children(node) {
                        if let Some(variable) = self.variable(declarator) {
                            result.variables.push(variable);
                        }
                    }
                }
                _ => {}
            }
        }
        result
    }

    fn function_declaration(&self, node: Node<'_>, result: &mut ExtractionResult) {
        let Some(name_node) = node.child_by_field_name("name") else {
            return;
        };
        let name = self.tree.text(name_node);
        let doc = self.doc_for(node);
        let params = self.ast_params(node);

        let assignments = node
            .child_by_field_name("body")
            .map(|body| self.self_assignments(body))
            .unwrap_or_default();

        if assignments.is_empty() {
            result
                .functions
                .push(self.function(name, doc.as_ref(), params, node));
            return;
        }

        let mut class = Class {
            name: name.to_string(),
            description: doc
                .as_ref()
                .map_or_else(|| placeholder::CLASS.to_string(), |d| d.description_or(placeholder::CLASS)),
            params: merge_params(doc.as_ref().map(DocComment::params).unwrap_or_default(), params),
            methods: Vec::new(),
            variables: Vec::new(),
            extends: doc.as_ref().and_then(DocComment::extends),
            location: Some(self.location(node)),
        };

        for (statement, member, value) in assignments {
            let member_doc = self.doc_for(statement);
            if is_function_expression(value) {
                let member_params = self.ast_params(value);
                class
                    .methods
                    .push(self.function(member, member_doc.as_ref(), member_params, statement));
            } else if literal_kind(value).is_some() {
                class
                    .variables
                    .push(self.documented_variable(member, member_doc.as_ref(), statement));
            }
        }

        result.classes.push(class);
    }

    fn function(&self, name: &str, doc: Option<&DocComment>, params: Vec<AstParam>, node: Node<'_>) -> Function {
        Function {
            name: name.to_string(),
            params: merge_params(doc.map(DocComment::params).unwrap_or_default(), params),
            returns: doc.map_or_else(TypeInfo::void, DocComment::returns),
            description: doc.map_or_else(
                || placeholder::FUNCTION.to_string(),
                |d| d.description_or(placeholder::FUNCTION),
            ),
            location: Some(self.location(node)),
        }
    }

    fn variable(&self, declarator: Node<'_>) -> Option<Variable> {
        if declarator.kind() != "variable_declarator" {
            return None;
        }
        let name_node = declarator.child_by_field_name("name")?;
        // Destructuring patterns declare nothing nameable.
        if name_node.kind() != "identifier" {
            return None;
        }
        let doc = self.doc_for(declarator);
        Some(self.documented_variable(self.tree.text(name_node), doc.as_ref(), declarator))
    }

    fn documented_variable(&self, name: &str, doc: Option<&DocComment>, node: Node<'_>) -> Variable {
        Variable {
            name: name.to_string(),
            ty: doc
                .and_then(DocComment::declared_type)
                .unwrap_or_else(TypeInfo::unknown),
            description: doc.map_or_else(
                || placeholder::VARIABLE.to_string(),
                |d| d.description_or(placeholder::VARIABLE),
            ),
            deprecated: doc.and_then(DocComment::deprecated),
            location: Some(self.location(node)),
        }
    }

    /// `this.<name> = <expr>;` statements directly inside `body`.
    fn self_assignments<'t>(&self, body: Node<'t>) -> Vec<(Node<'t>, &'s str, Node<'t>)> {
        let mut found = Vec::new();
        for statement in named_children(body) {
            if statement.kind() != "expression_statement" {
                continue;
            }
            let Some(assignment) = statement.named_child(0) else {
                continue;
            };
            if assignment.kind() != "assignment_expression" {
                continue;
            }
            let (Some(left), Some(right)) = (
                assignment.child_by_field_name("left"),
                assignment.child_by_field_name("right"),
            ) else {
                continue;
            };
            if left.kind() != "member_expression" {
                continue;
            }
            let is_this = left
                .child_by_field_name("object")
                .is_some_and(|o| o.kind() == "this");
            let property = left
                .child_by_field_name("property")
                .filter(|p| p.kind() == "property_identifier");
            if let (true, Some(property)) = (is_this, property) {
                found.push((statement, self.tree.text(property), right));
            }
        }
        found
    }

    /// Parameters of a function-like node (declaration, expression or arrow).
    fn ast_params(&self, node: Node<'_>) -> Vec<AstParam> {
        // `x => ...` has a bare identifier instead of a parameter list.
        if let Some(single) = node.child_by_field_name("parameter") {
            return vec![AstParam {
                name: self.tree.text(single).to_string(),
                optional: false,
            }];
        }
        let Some(list) = node.child_by_field_name("parameters") else {
            return Vec::new();
        };
        named_children(list)
            .into_iter()
            .filter_map(|param| {
                let (name_node, optional) = match param.kind() {
                    "identifier" => (param, false),
                    "assignment_pattern" => (param.child_by_field_name("left")?, true),
                    "rest_pattern" => (param.named_child(0)?, true),
                    _ => return None,
                };
                (name_node.kind() == "identifier").then(|| AstParam {
                    name: self.tree.text(name_node).to_string(),
                    optional,
                })
            })
            .collect()
    }

    fn doc_for(&self, node: Node<'_>) -> Option<DocComment> {
        self.tree
            .comment_for(node)
            .filter(|c| c.is_doc_block())
            .map(|c| DocComment::parse(&c.text))
    }

    fn location(&self, node: Node<'_>) -> SourceLocation {
        let start = node.start_position();
        SourceLocation {
            file: self.file.to_string(),
            line: start.row as u32,
            column: start.column as u32,
        }
    }
}

/// Merge documented parameters into the AST parameter list by name. A
/// documented parameter is taken as written, optionality included.
fn merge_params(documented: Vec<Param>, ast: Vec<AstParam>) -> Vec<Param> {
    let mut merged: Vec<Param> = ast
        .into_iter()
        .map(|a| match documented.iter().find(|d| d.name == a.name) {
            Some(doc) => doc.clone(),
            None => Param::undocumented(a.name, a.optional),
        })
        .collect();

    for doc in documented {
        if !merged.iter().any(|p| p.name == doc.name) {
            merged.push(doc);
        }
    }
    merged
}
