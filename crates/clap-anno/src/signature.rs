//! Ahead-of-time descriptions of a callable's parameters.
//!
//! A [`Signature`] is plain data: an ordered list of [`Param`]s, each with a
//! name, a [`ParamKind`], an optional default and an optional
//! [`Annotation`]. The classifier never inspects the callable itself.

use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use thiserror::Error;

use crate::context::Context;
use crate::inject::{Injector, TypeKey};
use crate::value::{EnumType, Value, ValueType};

/// How a parameter may be passed to its callable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamKind {
    /// Only by position.
    PositionalOnly,
    /// By position or by name.
    Positional,
    /// Collects every remaining positional value.
    VariadicPositional,
    /// Only by name.
    KeywordOnly,
    /// Collects every remaining named value. Never accepted.
    VariadicKeyword,
}

impl ParamKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ParamKind::PositionalOnly => "positional-only",
            ParamKind::Positional => "positional",
            ParamKind::VariadicPositional => "variadic-positional",
            ParamKind::KeywordOnly => "keyword-only",
            ParamKind::VariadicKeyword => "variadic-keyword",
        }
    }
}

impl FromStr for ParamKind {
    type Err = ParseAnnotationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "positional-only" => Ok(ParamKind::PositionalOnly),
            "positional" | "" => Ok(ParamKind::Positional),
            "variadic-positional" => Ok(ParamKind::VariadicPositional),
            "keyword-only" => Ok(ParamKind::KeywordOnly),
            "variadic-keyword" => Ok(ParamKind::VariadicKeyword),
            other => Err(ParseAnnotationError::UnknownKind(other.to_string())),
        }
    }
}

/// What a parameter's annotation says about it.
#[derive(Clone)]
pub enum Annotation {
    /// A plain value type (`int`, `str`, an enumeration, ...).
    Type(ValueType),
    /// Render as a boolean flag that takes no value.
    Flag,
    /// Unparametrized tuple: any number of string values.
    Tuple,
    /// `tuple[T1, ..., Tn]`: exactly `n` values of one type.
    FixedTuple(Vec<ValueType>),
    /// `tuple[T, ...]`: any number of values of type `T`.
    VariadicTuple(ValueType),
    /// A parametrized generic other than a tuple. Always rejected.
    Generic { origin: String, args: Vec<ValueType> },
    /// An opaque type that can only be supplied by an injector.
    Object(TypeKey),
    /// An injector bound directly to the parameter.
    Inject(Rc<dyn Injector>),
}

impl Annotation {
    /// Annotation naming the Rust type `T`.
    pub fn of<T: 'static>() -> Self {
        Annotation::Object(TypeKey::of::<T>())
    }

    /// Annotation naming a type that knows how to inject itself.
    pub fn injectable<T: crate::inject::Injectable>() -> Self {
        Annotation::Object(TypeKey::injectable::<T>())
    }

    /// Annotation requesting the current invocation [`Context`].
    pub fn context() -> Self {
        Annotation::of::<Context>()
    }

    pub fn inject(injector: impl Injector + 'static) -> Self {
        Annotation::Inject(Rc::new(injector))
    }
}

impl From<ValueType> for Annotation {
    fn from(ty: ValueType) -> Self {
        Annotation::Type(ty)
    }
}

impl fmt::Debug for Annotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Annotation::Object(key) => write!(f, "Object({})", key.name()),
            Annotation::Inject(_) => f.write_str("Inject(..)"),
            other => write!(f, "{other}"),
        }
    }
}

impl fmt::Display for Annotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn join(types: &[ValueType]) -> String {
            types
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        }

        match self {
            Annotation::Type(ty) => write!(f, "{ty}"),
            Annotation::Flag => f.write_str("flag"),
            Annotation::Tuple => f.write_str("tuple"),
            Annotation::FixedTuple(types) => write!(f, "tuple[{}]", join(types)),
            Annotation::VariadicTuple(ty) => write!(f, "tuple[{ty}, ...]"),
            Annotation::Generic { origin, args } => write!(f, "{origin}[{}]", join(args)),
            Annotation::Object(key) => f.write_str(key.name()),
            Annotation::Inject(_) => f.write_str("<injector>"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseAnnotationError {
    #[error("empty annotation")]
    Empty,
    #[error("unknown type `{0}`")]
    UnknownType(String),
    #[error("unbalanced brackets in `{0}`")]
    Unbalanced(String),
    #[error("unknown parameter kind `{0}`")]
    UnknownKind(String),
}

fn parse_value_type(raw: &str) -> Result<ValueType, ParseAnnotationError> {
    match raw.trim() {
        "str" | "string" => Ok(ValueType::Str),
        "int" => Ok(ValueType::Int),
        "float" => Ok(ValueType::Float),
        "bool" => Ok(ValueType::Bool),
        "" => Err(ParseAnnotationError::Empty),
        other => Err(ParseAnnotationError::UnknownType(other.to_string())),
    }
}

/// Textual annotations as they appear in JSON descriptions:
/// `int`, `flag`, `tuple`, `tuple[int, ...]`, `tuple[float, float]`,
/// `choice[fast, slow]`, `context`, or any `name[T, ...]` generic.
impl FromStr for Annotation {
    type Err = ParseAnnotationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ParseAnnotationError::Empty);
        }

        let Some((origin, rest)) = s.split_once('[') else {
            return match s {
                "flag" => Ok(Annotation::Flag),
                "tuple" => Ok(Annotation::Tuple),
                "context" => Ok(Annotation::context()),
                other => parse_value_type(other).map(Annotation::Type),
            };
        };

        let Some(inner) = rest.strip_suffix(']') else {
            return Err(ParseAnnotationError::Unbalanced(s.to_string()));
        };
        let parts: Vec<&str> = inner.split(',').map(str::trim).collect();
        let origin = origin.trim();

        match origin {
            "choice" => Ok(Annotation::Type(ValueType::Choice(EnumType::new(
                "choice",
                parts.into_iter().filter(|p| !p.is_empty()),
            )))),
            "tuple" => {
                if parts.len() == 2 && parts[1] == "..." {
                    return parse_value_type(parts[0]).map(Annotation::VariadicTuple);
                }
                let types = parts
                    .into_iter()
                    .map(parse_value_type)
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Annotation::FixedTuple(types))
            }
            _ => {
                let args = parts
                    .into_iter()
                    .map(parse_value_type)
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Annotation::Generic {
                    origin: origin.to_string(),
                    args,
                })
            }
        }
    }
}

/// One declared parameter.
#[derive(Debug, Clone)]
pub struct Param {
    pub name: String,
    pub kind: ParamKind,
    pub default: Option<Value>,
    pub annotation: Option<Annotation>,
}

impl Param {
    pub fn new(name: impl Into<String>, kind: ParamKind) -> Self {
        Self {
            name: name.into(),
            kind,
            default: None,
            annotation: None,
        }
    }

    pub fn positional(name: impl Into<String>) -> Self {
        Self::new(name, ParamKind::Positional)
    }

    pub fn positional_only(name: impl Into<String>) -> Self {
        Self::new(name, ParamKind::PositionalOnly)
    }

    pub fn variadic(name: impl Into<String>) -> Self {
        Self::new(name, ParamKind::VariadicPositional)
    }

    pub fn keyword(name: impl Into<String>) -> Self {
        Self::new(name, ParamKind::KeywordOnly)
    }

    pub fn variadic_keyword(name: impl Into<String>) -> Self {
        Self::new(name, ParamKind::VariadicKeyword)
    }

    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn annotate(mut self, annotation: impl Into<Annotation>) -> Self {
        self.annotation = Some(annotation.into());
        self
    }

    /// Shorthand for `annotate(ValueType::...)`.
    pub fn typed(self, ty: ValueType) -> Self {
        self.annotate(ty)
    }

    pub fn flag(self) -> Self {
        self.annotate(Annotation::Flag)
    }
}

/// Ordered parameter list of one callable.
#[derive(Debug, Clone, Default)]
pub struct Signature {
    params: Vec<Param>,
}

impl Signature {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn param(mut self, param: Param) -> Self {
        self.params.push(param);
        self
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Drop a leading receiver parameter named `self`, if present.
    pub(crate) fn without_receiver(&self) -> Signature {
        match self.params.first() {
            Some(first) if first.name == "self" => Signature {
                params: self.params[1..].to_vec(),
            },
            _ => self.clone(),
        }
    }
}

impl FromIterator<Param> for Signature {
    fn from_iter<I: IntoIterator<Item = Param>>(iter: I) -> Self {
        Self {
            params: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_and_marker_annotations() {
        assert!(matches!(
            "int".parse::<Annotation>().unwrap(),
            Annotation::Type(ValueType::Int)
        ));
        assert!(matches!(
            "flag".parse::<Annotation>().unwrap(),
            Annotation::Flag
        ));
        assert!(matches!(
            "tuple".parse::<Annotation>().unwrap(),
            Annotation::Tuple
        ));
        assert!(matches!(
            "context".parse::<Annotation>().unwrap(),
            Annotation::Object(_)
        ));
    }

    #[test]
    fn parses_tuple_forms() {
        match "tuple[int, ...]".parse::<Annotation>().unwrap() {
            Annotation::VariadicTuple(ValueType::Int) => {}
            other => panic!("unexpected: {other:?}"),
        }
        match "tuple[float, float]".parse::<Annotation>().unwrap() {
            Annotation::FixedTuple(types) => {
                assert_eq!(types, vec![ValueType::Float, ValueType::Float])
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn parses_other_generics_for_later_rejection() {
        match "list[int]".parse::<Annotation>().unwrap() {
            Annotation::Generic { origin, args } => {
                assert_eq!(origin, "list");
                assert_eq!(args, vec![ValueType::Int]);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn parses_choice() {
        match "choice[fast, slow_mode]".parse::<Annotation>().unwrap() {
            Annotation::Type(ValueType::Choice(e)) => {
                assert_eq!(e.members, vec!["fast", "slow_mode"]);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_and_malformed() {
        assert_eq!(
            "widget".parse::<Annotation>().unwrap_err(),
            ParseAnnotationError::UnknownType("widget".to_string())
        );
        assert!(matches!(
            "tuple[int".parse::<Annotation>().unwrap_err(),
            ParseAnnotationError::Unbalanced(_)
        ));
        assert!(matches!(
            "sideways".parse::<ParamKind>().unwrap_err(),
            ParseAnnotationError::UnknownKind(_)
        ));
    }

    #[test]
    fn display_round_trips_textual_forms() {
        for text in ["int", "flag", "tuple", "tuple[int, ...]", "tuple[str, str]"] {
            let parsed: Annotation = text.parse().unwrap();
            assert_eq!(parsed.to_string(), text);
        }
    }

    #[test]
    fn receiver_is_dropped_only_when_named_self() {
        let sig = Signature::new()
            .param(Param::positional("self"))
            .param(Param::positional("x"));
        let names: Vec<_> = sig
            .without_receiver()
            .params()
            .iter()
            .map(|p| p.name.clone())
            .collect();
        assert_eq!(names, vec!["x"]);

        let sig = Signature::new().param(Param::positional("x"));
        assert_eq!(sig.without_receiver().params().len(), 1);
    }
}
