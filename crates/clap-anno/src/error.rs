use thiserror::Error;

use crate::value::Value;

/// Why a parameter could not be turned into a declaration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeclarationErrorKind {
    #[error("variadic keyword parameters are not supported: the parser has no dynamic options")]
    VariadicKeyword,
    #[error("tuple element types must all be the same, found ({0})")]
    MixedTupleTypes(String),
    #[error("tuple annotation must name at least one element type")]
    EmptyTuple,
    #[error("`tuple[T, ...]` is only allowed on a variadic positional parameter")]
    VariadicTupleOnFixed,
    #[error("annotation must be `tuple` or `tuple[T, ...]` on a variadic positional parameter")]
    FixedTupleOnVariadic,
    #[error("a flag cannot collect variadic values")]
    VariadicFlag,
    #[error("generic annotation must be a tuple, found `{0}`")]
    NonTupleGeneric(String),
    #[error("type `{0}` has no injector and cannot be parsed from the command line")]
    NotParseable(String),
    #[error("parameter key `{0}` is declared more than once")]
    DuplicateKey(String),
    #[error("option `--{0}` is declared more than once")]
    DuplicateLong(String),
    #[error("option `--{0}` is reserved by the parser")]
    ReservedLong(String),
    #[error("command name `{0}` is used by more than one member")]
    DuplicateCommand(String),
}

/// A signature (or member list) that cannot be exposed on the command line.
///
/// Raised while building; a build that fails produces no tree at all.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("parameter `{param}`: {kind}")]
pub struct DeclarationError {
    /// Offending parameter, or the owning class for member-level errors.
    pub param: String,
    pub kind: DeclarationErrorKind,
}

impl DeclarationError {
    pub(crate) fn new(param: impl Into<String>, kind: DeclarationErrorKind) -> Self {
        Self {
            param: param.into(),
            kind,
        }
    }
}

/// Failure while running a built command.
#[derive(Debug, Error)]
pub enum InvokeError {
    /// The input did not match the declarations (reported by the parser).
    #[error(transparent)]
    Usage(#[from] clap::Error),
    /// A constructor, method, or injector returned an error.
    #[error(transparent)]
    Callable(#[from] anyhow::Error),
}

/// Result of running a built command.
#[derive(Debug)]
pub enum Outcome {
    /// The leaf callable ran and returned this value.
    Value(Value),
    /// `--help` was requested; the rendered text.
    Help(String),
    /// `--version` was requested; the rendered text.
    Version(String),
}

impl Outcome {
    pub fn into_value(self) -> Option<Value> {
        match self {
            Outcome::Value(v) => Some(v),
            Outcome::Help(_) | Outcome::Version(_) => None,
        }
    }
}
