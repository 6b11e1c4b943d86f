//! Platform reference catalog loading.
//!
//! The catalog is a JSON rendition of an XML document, so every repeated
//! element may appear either as a single object or as a list, and free text
//! may be a plain string or a `{"__cdata": ...}` node:
//!
//! ```json
//! {"servoydoc": {"runtime": {"object": [
//!   {"_scriptingName": "databaseManager",
//!    "_qualifiedName": "com.servoy.j2db.dataprocessing.JSDatabaseManager",
//!    "functions": {"function": {"_name": "getFoundSet",
//!       "parameters": {"parameter": {"_name": "name", "_typecode": "java.lang.String"}},
//!       "return": {"_typecode": "com.servoy.j2db.dataprocessing.FoundSet"}}}}
//! ]}}}
//! ```
//!
//! Every object with a qualified and a scripting name feeds the alias table
//! used to decode type codes. Only plain service objects become top-level
//! `ScriptObject`s.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::debug;

use crate::typesys::{map_platform_type, AliasTable};
use crate::types::{Function, Param, ScriptObject, TypeInfo, Variable};

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> Default for OneOrMany<T> {
    fn default() -> Self {
        OneOrMany::Many(Vec::new())
    }
}

impl<T> OneOrMany<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::Many(items) => items,
            OneOrMany::One(item) => vec![item],
        }
    }
}

/// Free text: a string, a CDATA node, or something we ignore.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Text {
    Plain(String),
    Cdata {
        #[serde(rename = "__cdata")]
        cdata: String,
    },
    Other(Value),
}

impl Text {
    fn into_string(self) -> Option<String> {
        match self {
            Text::Plain(s) | Text::Cdata { cdata: s } => Some(s),
            Text::Other(_) => None,
        }
    }
}

/// XML attributes arrive as `true` or `"true"`.
fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Bool(b)) => b,
        Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
        _ => false,
    })
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    servoydoc: Option<DocRoot>,
}

#[derive(Debug, Deserialize)]
struct DocRoot {
    runtime: Option<Runtime>,
}

#[derive(Debug, Deserialize)]
struct Runtime {
    #[serde(default)]
    object: OneOrMany<RawObject>,
}

#[derive(Debug, Deserialize)]
struct RawObject {
    #[serde(rename = "_scriptingName")]
    scripting_name: Option<String>,
    #[serde(rename = "_qualifiedName")]
    qualified_name: Option<String>,
    #[serde(rename = "_extendsComponent")]
    extends_component: Option<String>,
    description: Option<Text>,
    functions: Option<FunctionList>,
    constants: Option<ConstantList>,
    properties: Option<PropertyList>,
}

#[derive(Debug, Deserialize)]
struct FunctionList {
    #[serde(default)]
    function: OneOrMany<RawFunction>,
}

#[derive(Debug, Deserialize)]
struct ConstantList {
    #[serde(default)]
    constant: OneOrMany<RawMember>,
}

#[derive(Debug, Deserialize)]
struct PropertyList {
    #[serde(default)]
    property: OneOrMany<RawMember>,
}

#[derive(Debug, Deserialize)]
struct RawFunction {
    #[serde(rename = "_name")]
    name: String,
    parameters: Option<ParameterList>,
    #[serde(rename = "return")]
    returns: Option<RawReturn>,
    descriptions: Option<Descriptions>,
}

#[derive(Debug, Deserialize)]
struct ParameterList {
    #[serde(default)]
    parameter: OneOrMany<RawParam>,
}

#[derive(Debug, Deserialize)]
struct RawParam {
    #[serde(rename = "_name")]
    name: String,
    #[serde(rename = "_typecode")]
    typecode: Option<String>,
    description: Option<Text>,
    #[serde(rename = "_optional", default, deserialize_with = "flag")]
    optional: bool,
}

#[derive(Debug, Deserialize)]
struct RawReturn {
    #[serde(rename = "_typecode")]
    typecode: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Descriptions {
    description: Option<OneOrMany<Text>>,
}

impl Descriptions {
    fn first_text(self) -> Option<String> {
        self.description?
            .into_vec()
            .into_iter()
            .find_map(Text::into_string)
    }
}

/// A constant or a property.
#[derive(Debug, Deserialize)]
struct RawMember {
    #[serde(rename = "_name")]
    name: String,
    #[serde(rename = "return")]
    returns: Option<RawReturn>,
    descriptions: Option<Descriptions>,
    #[serde(rename = "_deprecated", default, deserialize_with = "flag")]
    is_deprecated: bool,
    deprecated: Option<Text>,
}

/// Parsed catalog: exposed objects plus the qualified → scripting name table.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub objects: Vec<ScriptObject>,
    pub aliases: AliasTable,
}

impl Catalog {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read catalog {}", path.display()))?;
        Self::from_json(&content).with_context(|| format!("Invalid catalog {}", path.display()))
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let file: CatalogFile = serde_json::from_str(content).context("Failed to parse catalog JSON")?;
        let runtime = file
            .servoydoc
            .and_then(|d| d.runtime)
            .context("Catalog has no servoydoc.runtime section")?;
        let raw_objects = runtime.object.into_vec();

        let mut aliases = AliasTable::new();
        for obj in &raw_objects {
            if let (Some(qualified), Some(scripting)) = (&obj.qualified_name, &obj.scripting_name) {
                aliases.insert(qualified.clone(), scripting.clone());
            }
        }

        let mut objects = Vec::new();
        for obj in raw_objects {
            if let Some(skip) = skip_reason(&obj) {
                debug!(object = ?obj.scripting_name, reason = skip, "catalog object not exposed");
                continue;
            }
            objects.push(convert_object(obj, &aliases));
        }

        Ok(Self { objects, aliases })
    }
}

/// Why an object is not offered as a top-level namespace.
fn skip_reason(obj: &RawObject) -> Option<&'static str> {
    let Some(scripting) = obj.scripting_name.as_deref() else {
        return Some("no scripting name");
    };
    let qualified = obj.qualified_name.as_deref().unwrap_or("");
    if qualified.starts_with('I') {
        Some("interface")
    } else if obj.extends_component.is_some() {
        Some("component extension")
    } else if scripting == "Globals" {
        Some("replaced by project globals")
    } else if qualified.starts_with("JS") {
        Some("value type")
    } else {
        None
    }
}

fn type_of(typecode: Option<&str>, aliases: &AliasTable) -> TypeInfo {
    map_platform_type(typecode.unwrap_or("any"), aliases)
}

fn convert_object(obj: RawObject, aliases: &AliasTable) -> ScriptObject {
    let functions = obj
        .functions
        .map(|list| list.function.into_vec())
        .unwrap_or_default()
        .into_iter()
        .map(|f| convert_function(f, aliases))
        .collect();

    let constants = obj
        .constants
        .map(|list| list.constant.into_vec())
        .unwrap_or_default()
        .into_iter()
        .map(|c| convert_member(c, aliases))
        .collect();

    let properties = obj
        .properties
        .map(|list| list.property.into_vec())
        .unwrap_or_default()
        .into_iter()
        .map(|p| convert_member(p, aliases))
        .collect();

    ScriptObject {
        name: obj.scripting_name.unwrap_or_default(),
        functions,
        constants,
        properties,
        description: obj
            .description
            .and_then(Text::into_string)
            .unwrap_or_else(|| "no description".to_string()),
    }
}

fn convert_function(raw: RawFunction, aliases: &AliasTable) -> Function {
    let params = raw
        .parameters
        .map(|list| list.parameter.into_vec())
        .unwrap_or_default()
        .into_iter()
        .map(|p| {
            let mut ty = type_of(p.typecode.as_deref(), aliases);
            if p.optional {
                ty = ty.into_optional();
            }
            Param {
                name: p.name,
                ty,
                description: p.description.and_then(Text::into_string).unwrap_or_default(),
                optional: p.optional,
            }
        })
        .collect();

    Function {
        name: raw.name,
        params,
        returns: type_of(raw.returns.and_then(|r| r.typecode).as_deref(), aliases),
        description: raw.descriptions.and_then(Descriptions::first_text).unwrap_or_default(),
        location: None,
    }
}

fn convert_member(raw: RawMember, aliases: &AliasTable) -> Variable {
    let deprecated = raw.is_deprecated.then(|| {
        raw.deprecated
            .and_then(Text::into_string)
            .unwrap_or_else(|| "Deprecated".to_string())
    });
    Variable {
        name: raw.name,
        ty: type_of(raw.returns.and_then(|r| r.typecode).as_deref(), aliases),
        description: raw.descriptions.and_then(Descriptions::first_text).unwrap_or_default(),
        deprecated,
        location: None,
    }
}
