//! Parameter classification: one declared parameter in, one command-line
//! declaration (or an injector binding) out.

use std::fmt;
use std::rc::Rc;

use clap::builder::PossibleValuesParser;
use clap::{Arg, ArgAction, ArgGroup, ArgMatches, value_parser};
use tracing::debug;

use crate::error::{DeclarationError, DeclarationErrorKind};
use crate::inject::{InjectionRegistry, Injector};
use crate::naming;
use crate::signature::{Annotation, Param, ParamKind};
use crate::value::{Value, ValueType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Identified by position.
    Argument,
    /// Identified by a `--long` name.
    Option,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Fixed(usize),
    Variadic,
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Fixed(n) => write!(f, "{n}"),
            Arity::Variadic => f.write_str("*"),
        }
    }
}

/// Command-line shape derived from one parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamDecl {
    pub role: Role,
    /// Parsed-value lookup key.
    pub key: String,
    /// Public spelling, without leading dashes.
    pub public_name: String,
    pub value_type: Option<ValueType>,
    pub arity: Arity,
    pub is_flag: bool,
    /// Rendered as a `--name/--no-name` switch pair.
    pub is_toggle: bool,
    pub required: bool,
    pub default: Option<Value>,
    pub show_default: bool,
    /// `--long` (or `--on/--off`) followed by the key for options; the key
    /// alone for arguments.
    pub names: Vec<String>,
}

/// Where a parameter's value comes from at invocation time.
#[derive(Clone)]
pub enum Binding {
    Injected(Rc<dyn Injector>),
    Parsed(ParamDecl),
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Binding::Injected(_) => f.write_str("Injected(..)"),
            Binding::Parsed(decl) => f.debug_tuple("Parsed").field(decl).finish(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClassifiedParam {
    /// Name used to pass the value back to the callable.
    pub name: String,
    pub key: String,
    pub kind: ParamKind,
    pub binding: Binding,
}

impl ClassifiedParam {
    pub fn decl(&self) -> Option<&ParamDecl> {
        match &self.binding {
            Binding::Parsed(decl) => Some(decl),
            Binding::Injected(_) => None,
        }
    }

    pub fn is_injected(&self) -> bool {
        matches!(self.binding, Binding::Injected(_))
    }

    pub fn is_flag(&self) -> bool {
        self.decl().is_some_and(|d| d.is_flag)
    }
}

fn homogeneous(types: &[ValueType]) -> Result<ValueType, DeclarationErrorKind> {
    let Some(first) = types.first() else {
        return Err(DeclarationErrorKind::EmptyTuple);
    };
    if types.iter().any(|t| t != first) {
        let listed = types
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        return Err(DeclarationErrorKind::MixedTupleTypes(listed));
    }
    Ok(first.clone())
}

/// Classify one parameter.
pub fn classify(
    param: &Param,
    registry: &InjectionRegistry,
) -> Result<ClassifiedParam, DeclarationError> {
    let key = naming::lookup_key(&param.name).to_string();
    let err = |kind| DeclarationError::new(param.name.clone(), kind);
    let injected = |injector: Rc<dyn Injector>| ClassifiedParam {
        name: param.name.clone(),
        key: key.clone(),
        kind: param.kind,
        binding: Binding::Injected(injector),
    };

    if let Some(injector) = param.annotation.as_ref().and_then(|a| registry.resolve(a)) {
        debug!(param = %param.name, "parameter is injected");
        return Ok(injected(injector));
    }

    let kind = param.kind;
    if kind == ParamKind::VariadicKeyword {
        return Err(err(DeclarationErrorKind::VariadicKeyword));
    }
    let collects_rest = kind == ParamKind::VariadicPositional;
    let single = if collects_rest {
        Arity::Variadic
    } else {
        Arity::Fixed(1)
    };
    let default = if collects_rest {
        None
    } else {
        param.default.clone()
    };

    let (arity, annotated) = match &param.annotation {
        None => match &default {
            Some(Value::Tuple(items)) if items.is_empty() => (Arity::Variadic, None),
            Some(Value::Tuple(items)) => {
                let types: Vec<ValueType> = items.iter().filter_map(Value::value_type).collect();
                let ty = homogeneous(&types).map_err(err)?;
                (Arity::Fixed(items.len()), Some(ty))
            }
            _ => (single, None),
        },
        Some(Annotation::Type(ty)) => match &default {
            Some(Value::Tuple(items)) if items.is_empty() => (Arity::Variadic, Some(ty.clone())),
            Some(Value::Tuple(items)) => (Arity::Fixed(items.len()), Some(ty.clone())),
            _ => (single, Some(ty.clone())),
        },
        Some(Annotation::Flag) if collects_rest => {
            return Err(err(DeclarationErrorKind::VariadicFlag));
        }
        Some(Annotation::Flag) => (single, None),
        Some(Annotation::Tuple) => (Arity::Variadic, Some(ValueType::Str)),
        Some(Annotation::VariadicTuple(ty)) if collects_rest => (Arity::Variadic, Some(ty.clone())),
        Some(Annotation::VariadicTuple(_)) => {
            return Err(err(DeclarationErrorKind::VariadicTupleOnFixed));
        }
        Some(Annotation::FixedTuple(_)) if collects_rest => {
            return Err(err(DeclarationErrorKind::FixedTupleOnVariadic));
        }
        Some(Annotation::FixedTuple(types)) => {
            let ty = homogeneous(types).map_err(err)?;
            (Arity::Fixed(types.len()), Some(ty))
        }
        Some(Annotation::Generic { origin, .. }) => {
            return Err(err(DeclarationErrorKind::NonTupleGeneric(origin.clone())));
        }
        Some(Annotation::Object(key)) => {
            return Err(err(DeclarationErrorKind::NotParseable(key.name().to_string())));
        }
        Some(Annotation::Inject(injector)) => return Ok(injected(injector.clone())),
    };

    let is_flag = matches!(param.annotation, Some(Annotation::Flag));
    let bool_annotated = matches!(param.annotation, Some(Annotation::Type(ValueType::Bool)));

    let role = match kind {
        ParamKind::PositionalOnly | ParamKind::VariadicPositional => Role::Argument,
        ParamKind::KeywordOnly => Role::Option,
        _ if is_flag || bool_annotated => Role::Option,
        _ if default.is_some() => Role::Option,
        _ => Role::Argument,
    };

    let mut value_type = if is_flag {
        None
    } else {
        annotated.or_else(|| default.as_ref().and_then(Value::value_type))
    };

    let is_toggle = role == Role::Option
        && !is_flag
        && arity == Arity::Fixed(1)
        && value_type == Some(ValueType::Bool);
    if is_toggle {
        value_type = None;
    }

    let required = default.is_none() && arity != Arity::Variadic;
    let public_name = naming::public_name(&key);
    let names = match role {
        Role::Argument => vec![key.clone()],
        Role::Option if is_toggle => vec![
            format!("--{public_name}/--no-{public_name}"),
            key.clone(),
        ],
        Role::Option => vec![format!("--{public_name}"), key.clone()],
    };

    let decl = ParamDecl {
        role,
        key: key.clone(),
        public_name,
        value_type,
        arity,
        is_flag,
        is_toggle,
        required,
        show_default: default.is_some(),
        default,
        names,
    };
    debug!(
        param = %param.name,
        role = ?decl.role,
        arity = %decl.arity,
        required = decl.required,
        "classified parameter"
    );

    Ok(ClassifiedParam {
        name: param.name.clone(),
        key,
        kind,
        binding: Binding::Parsed(decl),
    })
}

impl ParamDecl {
    /// Engine id. Prefixed so that no key can take the parser's own ids
    /// (`help`, `version`).
    fn id(&self) -> String {
        format!("p:{}", self.key)
    }

    fn off_id(&self) -> String {
        format!("n:{}", self.key)
    }

    /// `--long` names this declaration claims, without dashes.
    pub fn long_names(&self) -> Vec<String> {
        match self.role {
            Role::Argument => Vec::new(),
            Role::Option if self.is_toggle => vec![
                self.public_name.clone(),
                format!("no-{}", self.public_name),
            ],
            Role::Option => vec![self.public_name.clone()],
        }
    }

    /// Value name shown in usage. Optional arguments with a default render
    /// as `[NAME=default]`.
    fn value_name(&self) -> String {
        let upper = self.key.to_uppercase();
        match (&self.role, &self.default) {
            (Role::Argument, Some(default)) if self.show_default => {
                format!("{upper}={}", default.to_arg_string())
            }
            _ => upper,
        }
    }

    fn with_value_parser(&self, arg: Arg) -> Arg {
        match &self.value_type {
            None | Some(ValueType::Str) => arg.value_parser(value_parser!(String)),
            Some(ValueType::Int) => arg.value_parser(value_parser!(i64)),
            Some(ValueType::Float) => arg.value_parser(value_parser!(f64)),
            Some(ValueType::Bool) => arg.value_parser(value_parser!(bool)),
            Some(ValueType::Choice(e)) => arg.value_parser(PossibleValuesParser::new(e.choices())),
        }
    }

    fn with_arity(&self, arg: Arg) -> Arg {
        match self.arity {
            Arity::Fixed(n) => arg.num_args(n).action(ArgAction::Set),
            Arity::Variadic => arg.num_args(1..).action(ArgAction::Append),
        }
    }

    fn with_default(&self, arg: Arg) -> Arg {
        let arg = arg.hide_default_value(!self.show_default);
        let spell = |v: &Value| match &self.value_type {
            Some(ValueType::Choice(_)) => v.to_arg_string().replace('_', "-"),
            _ => v.to_arg_string(),
        };
        match &self.default {
            Some(Value::Tuple(items)) if !items.is_empty() => {
                arg.default_values(items.iter().map(spell).collect::<Vec<_>>())
            }
            Some(Value::Tuple(_)) | Some(Value::Unit) | Some(Value::Object(_)) | None => arg,
            Some(default) => arg.default_value(spell(default)),
        }
    }

    /// Engine declarations for this parameter: the args to add and, for a
    /// required switch pair, the group that makes one of them mandatory.
    pub(crate) fn to_clap(&self) -> (Vec<Arg>, Option<ArgGroup>) {
        match self.role {
            Role::Argument => {
                let arg = Arg::new(self.id())
                    .value_name(self.value_name())
                    .required(self.required);
                let arg = self.with_default(self.with_value_parser(self.with_arity(arg)));
                (vec![arg], None)
            }
            Role::Option if self.is_flag => {
                let mut arg = Arg::new(self.id())
                    .long(self.public_name.clone())
                    .action(ArgAction::SetTrue);
                if self.default == Some(Value::Bool(true)) {
                    arg = arg.default_value("true");
                }
                (vec![arg], None)
            }
            Role::Option if self.is_toggle => {
                let off = self.off_id();
                let on_arg = Arg::new(self.id())
                    .long(self.public_name.clone())
                    .action(ArgAction::SetTrue)
                    .overrides_with(off.clone());
                let off_arg = Arg::new(off.clone())
                    .long(format!("no-{}", self.public_name))
                    .action(ArgAction::SetTrue)
                    .overrides_with(self.id());
                let group = self.required.then(|| {
                    ArgGroup::new(format!("g:{}", self.key))
                        .args([self.id(), off])
                        .required(true)
                });
                (vec![on_arg, off_arg], group)
            }
            Role::Option => {
                let arg = Arg::new(self.id())
                    .long(self.public_name.clone())
                    .value_name(self.value_name())
                    .required(self.required);
                let arg = self.with_default(self.with_value_parser(self.with_arity(arg)));
                (vec![arg], None)
            }
        }
    }

    fn collect(&self, matches: &ArgMatches) -> Vec<Value> {
        let id = self.id();
        let id = id.as_str();
        match &self.value_type {
            Some(ValueType::Int) => matches
                .get_many::<i64>(id)
                .map(|vals| vals.copied().map(Value::Int).collect())
                .unwrap_or_default(),
            Some(ValueType::Float) => matches
                .get_many::<f64>(id)
                .map(|vals| vals.copied().map(Value::Float).collect())
                .unwrap_or_default(),
            Some(ValueType::Bool) => matches
                .get_many::<bool>(id)
                .map(|vals| vals.copied().map(Value::Bool).collect())
                .unwrap_or_default(),
            Some(ValueType::Choice(e)) => matches
                .get_many::<String>(id)
                .map(|vals| {
                    vals.map(|c| Value::Str(e.member_for(c).unwrap_or(c).to_string()))
                        .collect()
                })
                .unwrap_or_default(),
            None | Some(ValueType::Str) => matches
                .get_many::<String>(id)
                .map(|vals| vals.cloned().map(Value::Str).collect())
                .unwrap_or_default(),
        }
    }

    /// Read this parameter's value out of the engine's matches.
    pub(crate) fn read(&self, matches: &ArgMatches) -> Value {
        if self.is_flag {
            return Value::Bool(matches.get_flag(&self.id()));
        }
        if self.is_toggle {
            if matches.get_flag(&self.id()) {
                return Value::Bool(true);
            }
            if matches.get_flag(&self.off_id()) {
                return Value::Bool(false);
            }
            return self.default.clone().unwrap_or_default();
        }

        let values = self.collect(matches);
        match self.arity {
            Arity::Fixed(1) => values.into_iter().next().unwrap_or_default(),
            Arity::Fixed(_) if values.is_empty() => Value::Unit,
            Arity::Fixed(_) | Arity::Variadic => Value::Tuple(values),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::EnumType;
    use clap::Command;

    fn decl_of(param: Param) -> ParamDecl {
        let classified = classify(&param, &InjectionRegistry::new()).unwrap();
        classified.decl().cloned().unwrap()
    }

    fn kind_of(param: Param) -> DeclarationErrorKind {
        classify(&param, &InjectionRegistry::new()).unwrap_err().kind
    }

    fn parse(decl: &ParamDecl, args: &[&str]) -> Result<Value, clap::Error> {
        let (clap_args, group) = decl.to_clap();
        let mut cmd = Command::new("t").no_binary_name(true).args(clap_args);
        if let Some(group) = group {
            cmd = cmd.group(group);
        }
        let matches = cmd.try_get_matches_from(args)?;
        Ok(decl.read(&matches))
    }

    #[test]
    fn bare_parameter_is_required_argument() {
        let decl = decl_of(Param::positional("name"));
        assert_eq!(decl.role, Role::Argument);
        assert_eq!(decl.names, vec!["name"]);
        assert!(decl.required);
        assert_eq!(decl.value_type, None);
    }

    #[test]
    fn annotation_sets_value_type() {
        let decl = decl_of(Param::positional("count").typed(ValueType::Int));
        assert_eq!(decl.role, Role::Argument);
        assert_eq!(decl.value_type, Some(ValueType::Int));
        assert!(decl.required);
    }

    #[test]
    fn default_makes_an_option_with_inferred_type() {
        let decl = decl_of(Param::positional("name").default("a"));
        assert_eq!(decl.role, Role::Option);
        assert_eq!(decl.names, vec!["--name", "name"]);
        assert_eq!(decl.value_type, Some(ValueType::Str));
        assert!(!decl.required);
        assert!(decl.show_default);
    }

    #[test]
    fn variadic_positional_collects_rest() {
        let decl = decl_of(Param::variadic("args"));
        assert_eq!(decl.role, Role::Argument);
        assert_eq!(decl.arity, Arity::Variadic);
        assert!(!decl.required);

        assert_eq!(
            parse(&decl, &["a", "b"]).unwrap(),
            Value::from(vec!["a", "b"])
        );
        assert_eq!(parse(&decl, &[]).unwrap(), Value::Tuple(vec![]));
    }

    #[test]
    fn variadic_positional_ignores_default() {
        let decl = decl_of(Param::variadic("items").default(vec!["z"]));
        assert_eq!(decl.role, Role::Argument);
        assert_eq!(decl.arity, Arity::Variadic);
        assert!(!decl.required);
        assert_eq!(decl.default, None);

        assert_eq!(parse(&decl, &[]).unwrap(), Value::Tuple(vec![]));
        assert_eq!(
            parse(&decl, &["a", "b"]).unwrap(),
            Value::from(vec!["a", "b"])
        );
    }

    #[test]
    fn variadic_keyword_is_rejected() {
        assert_eq!(
            kind_of(Param::variadic_keyword("kwargs")),
            DeclarationErrorKind::VariadicKeyword
        );
    }

    #[test]
    fn keyword_only_is_always_an_option() {
        let required = decl_of(Param::keyword("d"));
        assert_eq!(required.role, Role::Option);
        assert_eq!(required.names, vec!["--d", "d"]);
        assert!(required.required);

        let with_default = decl_of(Param::keyword("e").default(2_i64));
        assert_eq!(with_default.value_type, Some(ValueType::Int));
        assert!(!with_default.required);
    }

    #[test]
    fn positional_only_with_default_stays_an_argument() {
        let decl = decl_of(Param::positional_only("b").default(1_i64));
        assert_eq!(decl.role, Role::Argument);
        assert_eq!(decl.names, vec!["b"]);
        assert_eq!(decl.value_name(), "B=1");
        assert_eq!(parse(&decl, &[]).unwrap(), Value::Int(1));
        assert_eq!(parse(&decl, &["4"]).unwrap(), Value::Int(4));
    }

    #[test]
    fn flag_without_default_reads_false_when_absent() {
        let decl = decl_of(Param::positional("value").flag());
        assert_eq!(decl.role, Role::Option);
        assert!(decl.is_flag);
        assert!(decl.required);
        assert_eq!(decl.names, vec!["--value", "value"]);

        assert_eq!(parse(&decl, &[]).unwrap(), Value::Bool(false));
        assert_eq!(parse(&decl, &["--value"]).unwrap(), Value::Bool(true));
    }

    #[test]
    fn flag_defaults() {
        let off = decl_of(Param::positional("value").flag().default(false));
        assert!(!off.required);
        assert_eq!(off.default, Some(Value::Bool(false)));

        let on = decl_of(Param::positional("value").flag().default(true));
        assert_eq!(parse(&on, &[]).unwrap(), Value::Bool(true));
    }

    #[test]
    fn bool_becomes_a_switch_pair() {
        let decl = decl_of(Param::positional("value").typed(ValueType::Bool));
        assert!(decl.is_toggle);
        assert!(decl.required);
        assert_eq!(decl.names, vec!["--value/--no-value", "value"]);

        assert_eq!(parse(&decl, &["--value"]).unwrap(), Value::Bool(true));
        assert_eq!(parse(&decl, &["--no-value"]).unwrap(), Value::Bool(false));
        assert_eq!(
            parse(&decl, &["--value", "--no-value"]).unwrap(),
            Value::Bool(false)
        );
        assert!(parse(&decl, &[]).is_err());
    }

    #[test]
    fn bool_default_switch() {
        let decl = decl_of(Param::positional("value").default(true));
        assert!(decl.is_toggle);
        assert!(!decl.required);
        assert_eq!(parse(&decl, &[]).unwrap(), Value::Bool(true));
        assert_eq!(parse(&decl, &["--no-value"]).unwrap(), Value::Bool(false));
    }

    #[test]
    fn trailing_underscore_is_stripped_from_key() {
        let classified = classify(
            &Param::keyword("name_").default("x"),
            &InjectionRegistry::new(),
        )
        .unwrap();
        assert_eq!(classified.name, "name_");
        assert_eq!(classified.key, "name");
        assert_eq!(classified.decl().unwrap().names, vec!["--name", "name"]);
    }

    #[test]
    fn underscores_become_hyphens_in_long_names() {
        let decl = decl_of(Param::keyword("dry_run").default("no"));
        assert_eq!(decl.names, vec!["--dry-run", "dry_run"]);
    }

    #[test]
    fn fixed_tuple_takes_exact_count() {
        let decl = decl_of(
            Param::keyword("pos").annotate(Annotation::FixedTuple(vec![
                ValueType::Float,
                ValueType::Float,
            ])),
        );
        assert_eq!(decl.arity, Arity::Fixed(2));
        assert_eq!(decl.value_type, Some(ValueType::Float));
        assert_eq!(
            parse(&decl, &["--pos", "2.0", "3.0"]).unwrap(),
            Value::from(vec![2.0, 3.0])
        );
        assert!(parse(&decl, &["--pos", "2.0"]).is_err());
    }

    #[test]
    fn tuple_default_implies_arity() {
        let decl = decl_of(Param::keyword("size").default(vec![1_i64, 2]));
        assert_eq!(decl.arity, Arity::Fixed(2));
        assert_eq!(decl.value_type, Some(ValueType::Int));
        assert_eq!(parse(&decl, &[]).unwrap(), Value::from(vec![1_i64, 2]));
    }

    #[test]
    fn typed_tuple_default_implies_arity() {
        let decl = decl_of(
            Param::keyword("size")
                .typed(ValueType::Int)
                .default(vec![1_i64, 2]),
        );
        assert_eq!(decl.arity, Arity::Fixed(2));
        assert_eq!(decl.value_type, Some(ValueType::Int));
        assert_eq!(parse(&decl, &[]).unwrap(), Value::from(vec![1_i64, 2]));
        assert_eq!(
            parse(&decl, &["--size", "3", "4"]).unwrap(),
            Value::from(vec![3_i64, 4])
        );
        assert!(parse(&decl, &["--size", "3"]).is_err());
    }

    #[test]
    fn keys_never_take_the_parsers_own_ids() {
        let decl = decl_of(Param::positional("help"));
        assert_eq!(parse(&decl, &["x"]).unwrap(), Value::from("x"));
        assert!(decl.long_names().is_empty());

        let version = decl_of(Param::positional("version"));
        let (args, _) = version.to_clap();
        let cmd = Command::new("t")
            .no_binary_name(true)
            .version("1.0")
            .args(args);
        let matches = cmd.try_get_matches_from(["2"]).unwrap();
        assert_eq!(version.read(&matches), Value::from("2"));
    }

    #[test]
    fn switch_pairs_claim_both_long_names() {
        let decl = decl_of(Param::keyword("x").typed(ValueType::Bool));
        assert_eq!(decl.long_names(), vec!["x", "no-x"]);
        let plain = decl_of(Param::keyword("dry_run").default("a"));
        assert_eq!(plain.long_names(), vec!["dry-run"]);
    }

    #[test]
    fn tuple_annotation_errors() {
        assert!(matches!(
            kind_of(Param::keyword("p").annotate(Annotation::FixedTuple(vec![
                ValueType::Str,
                ValueType::Int,
            ]))),
            DeclarationErrorKind::MixedTupleTypes(_)
        ));
        assert_eq!(
            kind_of(Param::keyword("p").annotate(Annotation::FixedTuple(vec![]))),
            DeclarationErrorKind::EmptyTuple
        );
        assert_eq!(
            kind_of(Param::positional("p").annotate(Annotation::VariadicTuple(ValueType::Int))),
            DeclarationErrorKind::VariadicTupleOnFixed
        );
        assert_eq!(
            kind_of(Param::variadic("p").annotate(Annotation::FixedTuple(vec![ValueType::Int]))),
            DeclarationErrorKind::FixedTupleOnVariadic
        );
        assert_eq!(
            kind_of(Param::variadic("p").flag()),
            DeclarationErrorKind::VariadicFlag
        );
    }

    #[test]
    fn variadic_tuple_annotation_types_values() {
        let decl = decl_of(Param::variadic("nums").annotate(Annotation::VariadicTuple(ValueType::Int)));
        assert_eq!(decl.value_type, Some(ValueType::Int));
        assert_eq!(
            parse(&decl, &["1", "2"]).unwrap(),
            Value::from(vec![1_i64, 2])
        );
        assert!(parse(&decl, &["x"]).is_err());
    }

    #[test]
    fn non_tuple_generics_and_opaque_types_are_rejected() {
        let generic = Annotation::Generic {
            origin: "list".into(),
            args: vec![ValueType::Int],
        };
        assert_eq!(
            kind_of(Param::positional("p").annotate(generic)),
            DeclarationErrorKind::NonTupleGeneric("list".into())
        );

        struct Opaque;
        assert!(matches!(
            kind_of(Param::positional("p").annotate(Annotation::of::<Opaque>())),
            DeclarationErrorKind::NotParseable(_)
        ));
    }

    #[test]
    fn injected_parameters_produce_no_declaration() {
        let classified = classify(
            &Param::positional("ctx").annotate(Annotation::context()),
            &InjectionRegistry::new(),
        )
        .unwrap();
        assert!(classified.is_injected());
        assert!(classified.decl().is_none());
    }

    #[test]
    fn choices_use_hyphenated_members() {
        let mode = EnumType::new("Mode", ["FAST", "EXTRA_SLOW"]);
        let decl = decl_of(
            Param::keyword("mode")
                .typed(ValueType::Choice(mode))
                .default("FAST"),
        );
        assert_eq!(parse(&decl, &[]).unwrap(), Value::from("FAST"));
        assert_eq!(
            parse(&decl, &["--mode", "EXTRA-SLOW"]).unwrap(),
            Value::from("EXTRA_SLOW")
        );
        assert!(parse(&decl, &["--mode", "MEDIUM"]).is_err());
    }
}
