//! Shared data model for described command trees.
//!
//! Two directions:
//! - descriptions (`GroupSpec`, `CommandSpec`, `ParamSpec`) are read from JSON
//!   and turned into signatures and classes by `clap-anno`
//! - reports (`DeclarationReport`) are what `clap-anno inspect --json` prints
//!   for a built tree

use serde::{Deserialize, Serialize};

/// Version of the report payload.
pub const REPORT_FORMAT_VERSION: u32 = 1;

fn default_kind() -> String {
    "positional".to_string()
}

fn is_default_kind(kind: &str) -> bool {
    kind == "positional"
}

/// A default value as written in JSON.
///
/// Integers are tried before floats, so `1` stays an integer and `1.0` a
/// float.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DefaultValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<DefaultValue>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ParamSpec {
    pub name: String,
    /// `positional`, `positional-only`, `variadic-positional`,
    /// `keyword-only` or `variadic-keyword`.
    #[serde(default = "default_kind", skip_serializing_if = "is_default_kind")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<DefaultValue>,
    /// Textual annotation, e.g. `int`, `flag`, `tuple[float, float]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotation: Option<String>,
}

impl ParamSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: default_kind(),
            default: None,
            annotation: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub struct CommandSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub help: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<ParamSpec>,
    /// Extra member names bound to this same command.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub hidden: bool,
    /// Called without a group instance; no receiver is dropped.
    #[serde(default, rename = "static")]
    pub is_static: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub struct GroupSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub help: String,
    /// Constructor parameters: the group's own options and arguments.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub init: Vec<ParamSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub commands: Vec<CommandSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<GroupSpec>,
    /// Base groups whose members are visible when inheriting.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bases: Vec<GroupSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub hidden: bool,
    /// Only read on the root group.
    #[serde(default)]
    pub allow_inherit: bool,
}

/// Top-level description file.
#[derive(Debug, Clone, PartialEq)]
pub enum Description {
    Group(GroupSpec),
    Command(CommandSpec),
}

impl Description {
    /// Parse a description. An object with `params` and no `init` is a
    /// standalone command; anything else is a group.
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        let raw: serde_json::Value = serde_json::from_str(text)?;
        let is_command = raw.get("params").is_some() && raw.get("init").is_none();
        if is_command {
            serde_json::from_value(raw).map(Description::Command)
        } else {
            serde_json::from_value(raw).map(Description::Group)
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Description::Group(g) => &g.name,
            Description::Command(c) => &c.name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub struct ParamReport {
    /// Name the value is passed back under.
    pub name: String,
    pub key: String,
    pub kind: String,
    #[serde(default)]
    pub injected: bool,
    /// `argument` or `option`; absent for injected parameters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub names: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_type: Option<String>,
    /// A count, or `*` for variadic.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arity: Option<String>,
    #[serde(default)]
    pub flag: bool,
    #[serde(default)]
    pub toggle: bool,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<DefaultValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub struct NodeReport {
    pub name: String,
    /// `group` or `command`.
    pub kind: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub help: String,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias_of: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<ParamReport>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeReport>,
}

/// Everything computed for one built tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DeclarationReport {
    pub format_version: u32,
    pub root: NodeReport,
}

impl DeclarationReport {
    pub fn new(root: NodeReport) -> Self {
        Self {
            format_version: REPORT_FORMAT_VERSION,
            root,
        }
    }

    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}
