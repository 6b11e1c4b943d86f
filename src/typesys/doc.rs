//! Doc-comment type expressions.
//!
//! Parsing is split in two: a small recursive-descent parser turns the text
//! between the braces of `@type {…}` into a `DocType` tree, and
//! `parse_doc_type` normalizes that tree into a `TypeInfo`.
//!
//! Supported syntax (closure-style):
//! - names: `string`, `JSFoundSet`, `ns.Type`
//! - applications: `Array<string>`, `Array.<string>`, `JSRecord<db:/crm/contacts>`
//! - postfix arrays `T[]`, tuple arrays `[T]`
//! - optional `T=`, nullable `?T`, non-null `!T`, rest `...T`
//! - unions `(A|B)`, `*`, string literals, records `{…}`, `function(…)`

use tracing::debug;

use crate::types::TypeInfo;

/// Names that are lower-cased regardless of how they were written.
const PRIMITIVES: &[&str] = &["string", "number", "boolean", "bigint", "undefined", "null", "symbol"];

/// Parsed type expression, before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocType {
    Name(String),
    Application(Box<DocType>, Vec<DocType>),
    /// `[A, B]` tuple syntax
    Array(Vec<DocType>),
    Optional(Box<DocType>),
    Nullable(Box<DocType>),
    Union(Vec<DocType>),
    StringLiteral(String),
    /// `*`
    All,
    /// A bare `?`
    Unknown,
    Record,
    Function,
}

/// Convert a type expression into a `TypeInfo`.
///
/// Unions collapse to `any`. Expressions that fail to parse become `unknown`.
pub fn parse_doc_type(expr: &str) -> TypeInfo {
    match parse_type_expression(expr) {
        Some(doc_type) => normalize(&doc_type),
        None => {
            debug!(expr, "unparseable doc type expression");
            TypeInfo::unknown()
        }
    }
}

/// Parse a type expression into its syntax tree. `None` on malformed input.
pub fn parse_type_expression(expr: &str) -> Option<DocType> {
    let mut parser = TypeParser::new(expr);
    let parsed = parser.union()?;
    parser.skip_ws();
    parser.at_end().then_some(parsed)
}

fn normalize(t: &DocType) -> TypeInfo {
    match t {
        DocType::Name(name) => normalize_name(name),
        DocType::Optional(inner) => normalize(inner).into_optional(),
        DocType::Nullable(inner) => normalize(inner),
        DocType::Union(_) | DocType::All => TypeInfo::any(),
        DocType::Unknown => TypeInfo::unknown(),
        DocType::Array(elements) => element_type(elements).into_array(1),
        DocType::Application(base, args) => match base.as_ref() {
            DocType::Name(name) if name == "Array" => element_type(args).into_array(1),
            DocType::Name(name) => {
                let args: Vec<TypeInfo> = args.iter().map(normalize).collect();
                let db_ref = args
                    .first()
                    .and_then(|a| a.name.strip_prefix("db:/"))
                    .map(str::to_string);
                TypeInfo::named(name.as_str()).with_generics(args, db_ref)
            }
            _ => TypeInfo::unknown(),
        },
        DocType::StringLiteral(value) => TypeInfo::named(value.as_str()),
        DocType::Function => TypeInfo::named("Function"),
        DocType::Record => {
            debug!("record doc types are not modelled");
            TypeInfo::unknown()
        }
    }
}

fn element_type(elements: &[DocType]) -> TypeInfo {
    elements.first().map_or_else(TypeInfo::unknown, normalize)
}

fn normalize_name(name: &str) -> TypeInfo {
    let name = name.trim();
    if name == "Array" {
        return TypeInfo::unknown().into_array(1);
    }
    let lower = name.to_ascii_lowercase();
    if PRIMITIVES.contains(&lower.as_str()) {
        TypeInfo::named(lower)
    } else {
        TypeInfo::named(name)
    }
}

struct TypeParser {
    chars: Vec<char>,
    pos: usize,
}

impl TypeParser {
    fn new(src: &str) -> Self {
        Self {
            chars: src.chars().collect(),
            pos: 0,
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn starts_with(&self, s: &str) -> bool {
        s.chars()
            .enumerate()
            .all(|(i, c)| self.chars.get(self.pos + i) == Some(&c))
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn eat(&mut self, c: char) -> bool {
        self.skip_ws();
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn union(&mut self) -> Option<DocType> {
        let mut members = vec![self.unary()?];
        while self.eat('|') {
            members.push(self.unary()?);
        }
        if members.len() == 1 {
            members.pop()
        } else {
            Some(DocType::Union(members))
        }
    }

    fn unary(&mut self) -> Option<DocType> {
        self.skip_ws();
        if self.eat('?') {
            self.skip_ws();
            // A lone `?` (end, or followed by a delimiter) is the unknown type.
            return match self.peek() {
                None | Some(',' | '>' | ')' | ']' | '|' | '=') => Some(DocType::Unknown),
                Some(_) => Some(DocType::Nullable(Box::new(self.unary()?))),
            };
        }
        if self.eat('!') {
            return self.unary();
        }
        if self.starts_with("...") {
            self.pos += 3;
            return self.unary();
        }
        self.postfix()
    }

    fn postfix(&mut self) -> Option<DocType> {
        let mut t = self.primary()?;
        loop {
            self.skip_ws();
            if self.starts_with("[]") {
                self.pos += 2;
                t = DocType::Application(Box::new(DocType::Name("Array".into())), vec![t]);
            } else if self.peek() == Some('=') {
                self.pos += 1;
                t = DocType::Optional(Box::new(t));
            } else {
                return Some(t);
            }
        }
    }

    fn primary(&mut self) -> Option<DocType> {
        self.skip_ws();
        match self.peek()? {
            '(' => {
                self.pos += 1;
                let inner = self.union()?;
                self.eat(')').then_some(inner)
            }
            '*' => {
                self.pos += 1;
                Some(DocType::All)
            }
            quote @ ('"' | '\'') => {
                self.pos += 1;
                let start = self.pos;
                while self.peek().is_some_and(|c| c != quote) {
                    self.pos += 1;
                }
                let value: String = self.chars[start..self.pos].iter().collect();
                self.eat(quote).then_some(DocType::StringLiteral(value))
            }
            '{' => {
                self.skip_balanced('{', '}')?;
                Some(DocType::Record)
            }
            '[' => {
                self.pos += 1;
                let elements = self.list(']')?;
                Some(DocType::Array(elements))
            }
            _ if self.starts_with("db:/") => {
                let start = self.pos;
                self.pos += 4;
                while self
                    .peek()
                    .is_some_and(|c| c.is_alphanumeric() || matches!(c, '_' | '/' | '-' | '.'))
                {
                    self.pos += 1;
                }
                Some(DocType::StringLiteral(self.chars[start..self.pos].iter().collect()))
            }
            c if is_ident_start(c) => self.named(),
            _ => None,
        }
    }

    fn named(&mut self) -> Option<DocType> {
        let mut name = self.ident();
        while self.peek() == Some('.') && self.chars.get(self.pos + 1).copied().is_some_and(is_ident_start) {
            self.pos += 1;
            name.push('.');
            name.push_str(&self.ident());
        }

        if name == "function" && self.eat('(') {
            self.pos -= 1;
            self.skip_balanced('(', ')')?;
            if self.eat(':') {
                self.unary()?;
            }
            return Some(DocType::Function);
        }

        self.skip_ws();
        if self.starts_with(".<") {
            self.pos += 2;
        } else if self.peek() == Some('<') {
            self.pos += 1;
        } else {
            return Some(DocType::Name(name));
        }
        let args = self.list('>')?;
        Some(DocType::Application(Box::new(DocType::Name(name)), args))
    }

    fn ident(&mut self) -> String {
        let start = self.pos;
        while self.peek().is_some_and(is_ident_char) {
            self.pos += 1;
        }
        self.chars[start..self.pos].iter().collect()
    }

    /// Comma-separated types up to and including `close`.
    fn list(&mut self, close: char) -> Option<Vec<DocType>> {
        let mut items = vec![self.union()?];
        while self.eat(',') {
            items.push(self.union()?);
        }
        self.eat(close).then_some(items)
    }

    fn skip_balanced(&mut self, open: char, close: char) -> Option<()> {
        let mut depth = 0usize;
        while let Some(c) = self.peek() {
            self.pos += 1;
            if c == open {
                depth += 1;
            } else if c == close {
                depth -= 1;
                if depth == 0 {
                    return Some(());
                }
            }
        }
        None
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}
