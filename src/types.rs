//! Core types shared by every stage of the pipeline.
//!
//! Everything here is plain data: built once (by the catalog loader, the
//! extractor or the aggregation step) and read afterwards. Key decisions:
//! - `TypeInfo` is immutable once constructed; builders consume `self`
//! - Declarations are serde-serializable so the extraction cache can store them
//! - Placeholder descriptions are substituted at extraction time, never at read time

use std::fmt;

use serde::{Deserialize, Serialize};

/// Placeholder texts used when a declaration has no doc comment.
pub mod placeholder {
    pub const VARIABLE: &str = "No description provided for this variable";
    pub const FUNCTION: &str = "No description provided for this function / method";
    pub const CLASS: &str = "No description provided for this class";
    pub const PARAMETER: &str = "No description provided for this parameter";
}

/// Normalized type representation shared by platform types and doc types.
///
/// `is_array` implies `array_depth >= 1`. Generic arguments are kept for
/// display but ignored by assignability.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeInfo {
    /// Base type identifier ("number", "JSFoundSet", "any", ...)
    pub name: String,
    /// Marked optional (`T=` or `[name]` in doc comments, `_optional` in the catalog)
    pub optional: bool,
    pub is_array: bool,
    pub array_depth: u32,
    pub generic_args: Vec<TypeInfo>,
    /// Dataset reference from a `db:/server/table` generic argument
    pub db_table_ref: Option<String>,
}

impl TypeInfo {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            optional: false,
            is_array: false,
            array_depth: 0,
            generic_args: Vec::new(),
            db_table_ref: None,
        }
    }

    /// The unconstrained type: assignable from everything.
    pub fn any() -> Self {
        Self::named("any")
    }

    /// Type of something we know exists but could not type.
    pub fn unknown() -> Self {
        Self::named("unknown")
    }

    pub fn void() -> Self {
        Self::named("void")
    }

    /// Type of the `null` literal.
    pub fn null() -> Self {
        Self::named("null")
    }

    /// Wrap in `extra` more array levels.
    pub fn into_array(mut self, extra: u32) -> Self {
        if extra > 0 {
            self.array_depth += extra;
            self.is_array = true;
        }
        self
    }

    pub fn into_optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn with_generics(mut self, args: Vec<TypeInfo>, db_table_ref: Option<String>) -> Self {
        self.generic_args = args;
        self.db_table_ref = db_table_ref;
        self
    }

    pub fn is_any(&self) -> bool {
        self.name == "any"
    }

    pub fn is_null(&self) -> bool {
        self.name == "null"
    }
}

impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::typesys::stringify(self))
    }
}

/// Where a declaration was found. Line and column are 0-based.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    pub file: String,
    pub line: u32,
    pub column: u32,
}

/// A function or method parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub ty: TypeInfo,
    pub description: String,
    pub optional: bool,
}

impl Param {
    /// Parameter seen in the AST but not documented. The type carries the
    /// same optionality as the parameter.
    pub fn undocumented(name: impl Into<String>, optional: bool) -> Self {
        let ty = TypeInfo::unknown();
        Self {
            name: name.into(),
            ty: if optional { ty.into_optional() } else { ty },
            description: placeholder::PARAMETER.to_string(),
            optional,
        }
    }
}

/// A function, a method of a constructor-style class, or a catalog function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    pub params: Vec<Param>,
    pub returns: TypeInfo,
    pub description: String,
    pub location: Option<SourceLocation>,
}

impl Function {
    /// Two overloads are the same signature when parameters and return type agree.
    pub fn same_signature(&self, other: &Function) -> bool {
        self.name == other.name && self.params == other.params && self.returns == other.returns
    }

    /// Number of leading parameters that must be supplied.
    ///
    /// Only trailing optional parameters can be omitted, so this is the
    /// position just after the last non-optional parameter.
    pub fn required_count(&self) -> usize {
        self.params
            .iter()
            .rposition(|p| !p.optional)
            .map_or(0, |idx| idx + 1)
    }
}

/// A variable, constant, property or class field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    pub ty: TypeInfo,
    pub description: String,
    pub deprecated: Option<String>,
    pub location: Option<SourceLocation>,
}

/// A constructor-style class: a function whose body assigns to `this.<name>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Class {
    pub name: String,
    pub description: String,
    /// Constructor parameters
    pub params: Vec<Param>,
    pub methods: Vec<Function>,
    pub variables: Vec<Variable>,
    pub extends: Option<String>,
    pub location: Option<SourceLocation>,
}

/// Everything extracted from one source file, in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub functions: Vec<Function>,
    pub variables: Vec<Variable>,
    pub classes: Vec<Class>,
}

impl ExtractionResult {
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty() && self.variables.is_empty() && self.classes.is_empty()
    }

    /// Total number of top-level declarations.
    pub fn len(&self) -> usize {
        self.functions.len() + self.variables.len() + self.classes.len()
    }
}

/// A named namespace offered for top-level completion: a platform service
/// or the project's merged globals object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptObject {
    pub name: String,
    pub functions: Vec<Function>,
    pub constants: Vec<Variable>,
    pub properties: Vec<Variable>,
    pub description: String,
}

impl ScriptObject {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// All stored overloads named `name`, in stored order.
    pub fn overloads<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Function> + 'a {
        self.functions.iter().filter(move |f| f.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn param(name: &str, optional: bool) -> Param {
        Param {
            name: name.into(),
            ty: TypeInfo::named("number"),
            description: String::new(),
            optional,
        }
    }

    fn func(params: Vec<Param>) -> Function {
        Function {
            name: "f".into(),
            params,
            returns: TypeInfo::void(),
            description: String::new(),
            location: None,
        }
    }

    #[test]
    fn test_into_array_sets_flag_and_depth() {
        let t = TypeInfo::named("number").into_array(2);
        assert!(t.is_array);
        assert_eq!(t.array_depth, 2);

        let plain = TypeInfo::named("number").into_array(0);
        assert!(!plain.is_array);
        assert_eq!(plain.array_depth, 0);
    }

    #[test]
    fn test_required_count_only_skips_trailing_optionals() {
        assert_eq!(func(vec![]).required_count(), 0);
        assert_eq!(func(vec![param("a", false), param("b", true)]).required_count(), 1);
        // An optional parameter in the middle still has to be passed positionally.
        assert_eq!(
            func(vec![param("a", true), param("b", false)]).required_count(),
            2
        );
        assert_eq!(func(vec![param("a", true), param("b", true)]).required_count(), 0);
    }

    #[test]
    fn test_same_signature_compares_params_and_return() {
        let a = func(vec![param("a", false)]);
        let mut b = a.clone();
        assert!(a.same_signature(&b));

        b.returns = TypeInfo::named("string");
        assert!(!a.same_signature(&b));
    }

    #[test]
    fn test_overloads_filter_by_name() {
        let mut obj = ScriptObject::new("db");
        obj.functions.push(func(vec![]));
        obj.functions.push(Function { name: "g".into(), ..func(vec![]) });
        obj.functions.push(func(vec![param("a", false)]));

        assert_eq!(obj.overloads("f").count(), 2);
        assert_eq!(obj.overloads("missing").count(), 0);
    }
}
