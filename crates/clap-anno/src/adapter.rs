//! Callable adapter: the classified parameters of one callable, their
//! engine declarations, and routing of parsed values back into a call.

use std::fmt;
use std::rc::Rc;

use anyhow::{Context as _, Result, anyhow};
use clap::{ArgMatches, Command};
use indexmap::IndexMap;
use tracing::trace;

use crate::context::Context;
use crate::error::{DeclarationError, DeclarationErrorKind};
use crate::inject::InjectionRegistry;
use crate::param::{Binding, ClassifiedParam, ParamDecl, Role, classify};
use crate::signature::{ParamKind, Signature};
use crate::value::{FromValue, Value};

/// Long names the parser declares on every command.
const RESERVED_LONGS: &[&str] = &["help"];

/// Parsed values keyed by lookup key, in declaration order.
pub type ParsedValues = IndexMap<String, Value>;

/// Arguments routed to a callable, shaped like its signature.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallArgs {
    pub args: Vec<Value>,
    pub kwargs: IndexMap<String, Value>,
}

impl CallArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.args.len() + self.kwargs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Positional argument `index`, converted.
    pub fn arg<T: FromValue>(&self, index: usize) -> Result<T> {
        let value = self
            .args
            .get(index)
            .ok_or_else(|| anyhow!("missing positional argument {index}"))?;
        T::from_value(value).with_context(|| format!("positional argument {index}"))
    }

    /// Keyword argument `name`, converted.
    pub fn kwarg<T: FromValue>(&self, name: &str) -> Result<T> {
        let value = self
            .kwargs
            .get(name)
            .ok_or_else(|| anyhow!("missing keyword argument `{name}`"))?;
        T::from_value(value).with_context(|| format!("keyword argument `{name}`"))
    }

    /// Every positional argument from `start` on, converted.
    pub fn rest<T: FromValue>(&self, start: usize) -> Result<Vec<T>> {
        self.args
            .iter()
            .skip(start)
            .map(T::from_value)
            .collect()
    }
}

pub(crate) type Invoke = Rc<dyn Fn(&Context, CallArgs) -> Result<Value>>;

/// Adapts one callable for the parsing engine.
#[derive(Clone)]
pub struct CallableAdapter {
    params: Vec<ClassifiedParam>,
    func: Invoke,
}

impl fmt::Debug for CallableAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallableAdapter")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

impl CallableAdapter {
    /// Classify every parameter of `signature`.
    ///
    /// When a variadic positional parameter is present, every plain
    /// positional parameter before it is treated as positional-only so it
    /// stays an ordered argument. Parameters named `_` are dropped.
    pub fn from_signature(
        signature: &Signature,
        registry: &InjectionRegistry,
        func: impl Fn(&Context, CallArgs) -> Result<Value> + 'static,
    ) -> Result<Self, DeclarationError> {
        Self::with_invoke(signature, registry, Rc::new(func))
    }

    pub(crate) fn with_invoke(
        signature: &Signature,
        registry: &InjectionRegistry,
        func: Invoke,
    ) -> Result<Self, DeclarationError> {
        let rest_at = signature
            .params()
            .iter()
            .position(|p| p.kind == ParamKind::VariadicPositional);

        let mut params: Vec<ClassifiedParam> = Vec::new();
        let mut longs: Vec<String> = Vec::new();
        for (index, param) in signature.params().iter().enumerate() {
            if param.name == "_" {
                continue;
            }
            let classified = match rest_at {
                Some(at) if index < at && param.kind == ParamKind::Positional => {
                    let mut param = param.clone();
                    param.kind = ParamKind::PositionalOnly;
                    classify(&param, registry)?
                }
                _ => classify(param, registry)?,
            };
            if classified.decl().is_some()
                && params
                    .iter()
                    .any(|p| p.decl().is_some() && p.key == classified.key)
            {
                return Err(DeclarationError::new(
                    param.name.clone(),
                    DeclarationErrorKind::DuplicateKey(classified.key),
                ));
            }
            for long in classified.decl().map(ParamDecl::long_names).unwrap_or_default() {
                let kind = if RESERVED_LONGS.contains(&long.as_str()) {
                    DeclarationErrorKind::ReservedLong(long)
                } else if longs.contains(&long) {
                    DeclarationErrorKind::DuplicateLong(long)
                } else {
                    longs.push(long);
                    continue;
                };
                return Err(DeclarationError::new(param.name.clone(), kind));
            }
            params.push(classified);
        }

        Ok(Self { params, func })
    }

    pub fn params(&self) -> &[ClassifiedParam] {
        &self.params
    }

    /// Whether any option of this callable is spelled `--{long}`.
    pub(crate) fn claims_long(&self, long: &str) -> bool {
        self.declarations()
            .any(|decl| decl.long_names().iter().any(|l| l == long))
    }

    /// Declarations in signature order, skipping injected parameters.
    pub fn declarations(&self) -> impl Iterator<Item = &ParamDecl> {
        self.params.iter().filter_map(ClassifiedParam::decl)
    }

    /// Add this callable's declarations to `cmd`.
    pub fn declare(&self, mut cmd: Command) -> Command {
        let mut optional_seen = false;
        let mut needs_gap = false;
        for decl in self.declarations() {
            if decl.role == Role::Argument {
                if decl.required && optional_seen {
                    needs_gap = true;
                }
                optional_seen |= !decl.required;
            }
            let (args, group) = decl.to_clap();
            cmd = cmd.args(args);
            if let Some(group) = group {
                cmd = cmd.group(group);
            }
        }
        if needs_gap {
            cmd = cmd.allow_missing_positional(true);
        }
        cmd
    }

    /// Read every declared parameter out of `matches`.
    pub fn collect(&self, matches: &ArgMatches) -> ParsedValues {
        self.declarations()
            .map(|decl| (decl.key.clone(), decl.read(matches)))
            .collect()
    }

    /// Route parsed and injected values into call arguments in signature
    /// order. Injector errors are returned unchanged.
    pub fn route(&self, mut parsed: ParsedValues, ctx: &Context) -> Result<CallArgs> {
        let mut call = CallArgs::new();
        for param in &self.params {
            let value = match &param.binding {
                Binding::Injected(injector) => injector.get_value(ctx)?,
                Binding::Parsed(_) => parsed.shift_remove(&param.key).unwrap_or_default(),
            };

            match param.kind {
                ParamKind::VariadicPositional => match value {
                    Value::Tuple(items) => call.args.extend(items),
                    Value::Unit => {}
                    other => call.args.push(other),
                },
                ParamKind::KeywordOnly | ParamKind::VariadicKeyword => {
                    call.kwargs.insert(param.name.clone(), value);
                }
                _ if param.is_flag() => {
                    call.kwargs.insert(param.name.clone(), value);
                }
                _ => call.args.push(value),
            }
        }
        Ok(call)
    }

    /// Route `parsed` and call the adapted callable.
    pub fn invoke(&self, parsed: ParsedValues, ctx: &Context) -> Result<Value> {
        let call = self.route(parsed, ctx)?;
        trace!(
            command = %ctx.name(),
            args = call.args.len(),
            kwargs = call.kwargs.len(),
            "invoking callable"
        );
        (self.func)(ctx, call)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::{Annotation, Param};
    use crate::value::ValueType;
    use std::cell::RefCell;

    fn adapter(sig: Signature) -> CallableAdapter {
        CallableAdapter::from_signature(&sig, &InjectionRegistry::new(), |_, _| Ok(Value::Unit))
            .unwrap()
    }

    fn run(adapter: &CallableAdapter, argv: &[&str]) -> CallArgs {
        let cmd = adapter.declare(Command::new("t").no_binary_name(true));
        let matches = cmd.try_get_matches_from(argv).unwrap();
        adapter
            .route(adapter.collect(&matches), &Context::root("t"))
            .unwrap()
    }

    #[test]
    fn positional_before_rest_becomes_ordered_argument() {
        let sig = Signature::new()
            .param(Param::positional("a"))
            .param(Param::positional("b").default(1_i64))
            .param(Param::variadic("c"))
            .param(Param::keyword("d"))
            .param(Param::keyword("e").default(2_i64));
        let adapter = adapter(sig);
        let roles: Vec<_> = adapter.declarations().map(|d| d.role).collect();
        assert_eq!(
            roles,
            vec![
                Role::Argument,
                Role::Argument,
                Role::Argument,
                Role::Option,
                Role::Option
            ]
        );
        assert_eq!(adapter.params()[1].kind, ParamKind::PositionalOnly);

        let call = run(&adapter, &["x", "5", "r1", "r2", "--d", "dd"]);
        assert_eq!(
            call.args,
            vec![
                Value::from("x"),
                Value::Int(5),
                Value::from("r1"),
                Value::from("r2")
            ]
        );
        assert_eq!(call.kwargs["d"], Value::from("dd"));
        assert_eq!(call.kwargs["e"], Value::Int(2));
    }

    #[test]
    fn placeholder_parameters_are_skipped() {
        let sig = Signature::new()
            .param(Param::positional("_"))
            .param(Param::positional("x"));
        let adapter = adapter(sig);
        assert_eq!(adapter.params().len(), 1);
        assert_eq!(run(&adapter, &["v"]).args, vec![Value::from("v")]);
    }

    #[test]
    fn escaped_names_route_back_under_their_own_name() {
        let sig = Signature::new().param(Param::keyword("type_").default("a"));
        let call = run(&adapter(sig), &["--type", "b"]);
        assert_eq!(call.kwargs["type_"], Value::from("b"));
    }

    #[test]
    fn flags_route_as_keywords() {
        let sig = Signature::new()
            .param(Param::positional("x"))
            .param(Param::positional("verbose").flag());
        let call = run(&adapter(sig), &["1", "--verbose"]);
        assert_eq!(call.args, vec![Value::from("1")]);
        assert_eq!(call.kwargs["verbose"], Value::Bool(true));
    }

    #[test]
    fn duplicate_keys_are_rejected() {
        let sig = Signature::new()
            .param(Param::positional("name"))
            .param(Param::keyword("name_"));
        let err =
            CallableAdapter::from_signature(&sig, &InjectionRegistry::new(), |_, _| Ok(Value::Unit))
                .unwrap_err();
        assert_eq!(err.kind, DeclarationErrorKind::DuplicateKey("name".into()));
    }

    #[test]
    fn switch_pair_off_names_collide_with_options() {
        let sig = Signature::new()
            .param(Param::keyword("x").typed(ValueType::Bool))
            .param(Param::keyword("no_x").default("d"));
        let err =
            CallableAdapter::from_signature(&sig, &InjectionRegistry::new(), |_, _| Ok(Value::Unit))
                .unwrap_err();
        assert_eq!(err.param, "no_x");
        assert_eq!(err.kind, DeclarationErrorKind::DuplicateLong("no-x".into()));
    }

    #[test]
    fn help_option_is_reserved() {
        let sig = Signature::new().param(Param::keyword("help").default("x"));
        let err =
            CallableAdapter::from_signature(&sig, &InjectionRegistry::new(), |_, _| Ok(Value::Unit))
                .unwrap_err();
        assert_eq!(err.kind, DeclarationErrorKind::ReservedLong("help".into()));
    }

    #[test]
    fn help_and_version_work_as_argument_names() {
        let sig = Signature::new()
            .param(Param::positional("help"))
            .param(Param::positional("version"));
        let call = run(&adapter(sig), &["a", "b"]);
        assert_eq!(call.args, vec![Value::from("a"), Value::from("b")]);
    }

    #[test]
    fn injected_values_are_routed_by_kind() {
        let mut registry = InjectionRegistry::new();
        registry.register(|| Ok(42_u32));

        let seen = Rc::new(RefCell::new(None));
        let sink = seen.clone();
        let sig = Signature::new()
            .param(Param::positional("n").typed(ValueType::Int))
            .param(Param::keyword("answer").annotate(Annotation::of::<u32>()));
        let adapter = CallableAdapter::from_signature(&sig, &registry, move |_, call| {
            let answer: Rc<u32> = call.kwarg("answer")?;
            *sink.borrow_mut() = Some((call.arg::<i64>(0)?, *answer));
            Ok(Value::Unit)
        })
        .unwrap();
        assert_eq!(adapter.declarations().count(), 1);

        let cmd = adapter.declare(Command::new("t").no_binary_name(true));
        let matches = cmd.try_get_matches_from(["7"]).unwrap();
        adapter
            .invoke(adapter.collect(&matches), &Context::root("t"))
            .unwrap();
        assert_eq!(*seen.borrow(), Some((7, 42)));
    }

    #[test]
    fn injector_errors_propagate() {
        let mut registry = InjectionRegistry::new();
        registry.register::<u32, _>(|| Err(anyhow!("not configured")));
        let sig = Signature::new().param(Param::positional("n").annotate(Annotation::of::<u32>()));
        let adapter =
            CallableAdapter::from_signature(&sig, &registry, |_, _| Ok(Value::Unit)).unwrap();
        let err = adapter
            .invoke(ParsedValues::new(), &Context::root("t"))
            .unwrap_err();
        assert_eq!(err.to_string(), "not configured");
    }

    #[test]
    fn call_args_accessors() {
        let call = CallArgs {
            args: vec![Value::Int(1), Value::from("a"), Value::from("b")],
            kwargs: IndexMap::from([("k".to_string(), Value::Bool(true))]),
        };
        assert_eq!(call.len(), 4);
        assert_eq!(call.arg::<i64>(0).unwrap(), 1);
        assert_eq!(call.rest::<String>(1).unwrap(), vec!["a", "b"]);
        assert!(call.kwarg::<bool>("k").unwrap());
        assert!(call.arg::<i64>(1).is_err());
        assert!(call.kwarg::<bool>("missing").is_err());
    }
}
