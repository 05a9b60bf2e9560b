//! JSON descriptions in, command trees out; built trees back out as reports.
//!
//! Described callables have no bodies. Every constructor and method call is
//! appended to a [`Recorder`] with the arguments it was routed, which is
//! what `clap-anno run` prints.

use std::cell::RefCell;
use std::rc::Rc;

use clap_anno_metadata::{
    CommandSpec, DeclarationReport, DefaultValue, Description, GroupSpec, NodeReport,
    ParamReport, ParamSpec,
};
use thiserror::Error;
use tracing::debug;

use crate::adapter::CallArgs;
use crate::error::DeclarationError;
use crate::inject::InjectionRegistry;
use crate::param::{ClassifiedParam, Role};
use crate::signature::{Annotation, Param, ParamKind, ParseAnnotationError, Signature};
use crate::tree::{App, AppBuilder, Attrs, Class, Entry, Function, Method, command_with};
use crate::value::Value;

#[derive(Debug, Error)]
pub enum DescribeError {
    #[error("parameter `{param}`: {source}")]
    Param {
        param: String,
        source: ParseAnnotationError,
    },
    #[error(transparent)]
    Declaration(#[from] DeclarationError),
}

/// One call observed while running a described tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    /// Dotted path of the callable, e.g. `App.SubGroup.sync`.
    pub callable: String,
    /// Group instance the method ran on.
    pub receiver: Option<String>,
    pub call: CallArgs,
}

/// Shared log of [`Invocation`]s. Clones append to the same log.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    calls: Rc<RefCell<Vec<Invocation>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, callable: &str, receiver: Option<&str>, call: CallArgs) {
        self.calls.borrow_mut().push(Invocation {
            callable: callable.to_string(),
            receiver: receiver.map(str::to_string),
            call,
        });
    }

    /// Drain the log.
    pub fn take(&self) -> Vec<Invocation> {
        std::mem::take(&mut *self.calls.borrow_mut())
    }
}

/// Instance type of every described group.
#[derive(Debug)]
struct Described {
    group: String,
}

pub fn value_from_default(default: &DefaultValue) -> Value {
    match default {
        DefaultValue::Bool(b) => Value::Bool(*b),
        DefaultValue::Int(n) => Value::Int(*n),
        DefaultValue::Float(f) => Value::Float(*f),
        DefaultValue::Str(s) => Value::Str(s.clone()),
        DefaultValue::List(items) => Value::Tuple(items.iter().map(value_from_default).collect()),
    }
}

pub fn default_from_value(value: &Value) -> Option<DefaultValue> {
    match value {
        Value::Bool(b) => Some(DefaultValue::Bool(*b)),
        Value::Int(n) => Some(DefaultValue::Int(*n)),
        Value::Float(f) => Some(DefaultValue::Float(*f)),
        Value::Str(s) => Some(DefaultValue::Str(s.clone())),
        Value::Tuple(items) => Some(DefaultValue::List(
            items.iter().filter_map(default_from_value).collect(),
        )),
        Value::Unit | Value::Object(_) => None,
    }
}

pub fn param_from_spec(spec: &ParamSpec) -> Result<Param, DescribeError> {
    let err = |source| DescribeError::Param {
        param: spec.name.clone(),
        source,
    };
    let kind: ParamKind = spec.kind.parse().map_err(err)?;
    let mut param = Param::new(spec.name.clone(), kind);
    if let Some(default) = &spec.default {
        param = param.default(value_from_default(default));
    }
    if let Some(text) = &spec.annotation {
        let annotation: Annotation = text.parse().map_err(err)?;
        param = param.annotate(annotation);
    }
    Ok(param)
}

pub fn signature_from_specs(specs: &[ParamSpec]) -> Result<Signature, DescribeError> {
    specs.iter().map(param_from_spec).collect()
}

fn attrs_for(hidden: bool) -> Attrs {
    Attrs::new().hidden(hidden)
}

fn method_from_spec(
    spec: &CommandSpec,
    qualified: &str,
    recorder: &Recorder,
) -> Result<Method, DescribeError> {
    let signature = signature_from_specs(&spec.params)?;
    let callable = format!("{qualified}.{}", spec.name);
    let rec = recorder.clone();
    let mut method = if spec.is_static {
        Method::static_fn(spec.name.clone(), signature, move |call| {
            rec.record(&callable, None, call);
            Ok(Value::Unit)
        })
    } else {
        Method::new::<Described, _>(spec.name.clone(), signature, move |recv, call| {
            rec.record(&callable, Some(&recv.group), call);
            Ok(Value::Unit)
        })
    };
    if !spec.help.is_empty() {
        method = method.help(spec.help.clone());
    }
    Ok(method.attrs(attrs_for(spec.hidden)))
}

fn class_from_spec(
    spec: &GroupSpec,
    prefix: Option<&str>,
    recorder: &Recorder,
) -> Result<Class, DescribeError> {
    let qualified = match prefix {
        Some(prefix) => format!("{prefix}.{}", spec.name),
        None => spec.name.clone(),
    };
    let init = signature_from_specs(&spec.init)?;

    let rec = recorder.clone();
    let group = qualified.clone();
    let mut class = Class::new(spec.name.clone(), init, move |call| {
        rec.record(&group, None, call);
        Ok(Described {
            group: group.clone(),
        })
    })
    .attrs(attrs_for(spec.hidden));
    if !spec.help.is_empty() {
        class = class.help(spec.help.clone());
    }

    for command in &spec.commands {
        class = class.method(method_from_spec(command, &qualified, recorder)?);
        for alias in &command.aliases {
            class = class.alias(alias.clone(), &command.name);
        }
    }
    for nested in &spec.groups {
        class = class.group(class_from_spec(nested, Some(&qualified), recorder)?);
        for alias in &nested.aliases {
            class = class.alias(alias.clone(), &nested.name);
        }
    }
    for base in &spec.bases {
        let base = class_from_spec(base, Some(&qualified), recorder)?;
        class = class.inherit::<Described, Described, _>(base, |d| d);
    }
    Ok(class)
}

/// Build a described group or command. Calls are appended to `recorder`.
pub fn build(
    description: &Description,
    registry: &InjectionRegistry,
    recorder: &Recorder,
) -> Result<App, DescribeError> {
    debug!(name = description.name(), "building described tree");
    match description {
        Description::Group(spec) => {
            let class = class_from_spec(spec, None, recorder)?;
            Ok(AppBuilder::new(class)
                .allow_inherit(spec.allow_inherit)
                .registry(registry)
                .build()?)
        }
        Description::Command(spec) => {
            let signature = signature_from_specs(&spec.params)?;
            let rec = recorder.clone();
            let callable = spec.name.clone();
            let mut function = Function::new(spec.name.clone(), signature, move |call| {
                rec.record(&callable, None, call);
                Ok(Value::Unit)
            })
            .attrs(attrs_for(spec.hidden));
            if !spec.help.is_empty() {
                function = function.help(spec.help.clone());
            }
            Ok(command_with(function, registry)?)
        }
    }
}

fn param_report(param: &ClassifiedParam) -> ParamReport {
    let mut report = ParamReport {
        name: param.name.clone(),
        key: param.key.clone(),
        kind: param.kind.as_str().to_string(),
        injected: param.is_injected(),
        ..Default::default()
    };
    if let Some(decl) = param.decl() {
        report.role = Some(
            match decl.role {
                Role::Argument => "argument",
                Role::Option => "option",
            }
            .to_string(),
        );
        report.names = decl.names.clone();
        report.value_type = decl.value_type.as_ref().map(ToString::to_string);
        report.arity = Some(decl.arity.to_string());
        report.flag = decl.is_flag;
        report.toggle = decl.is_toggle;
        report.required = decl.required;
        report.default = decl.default.as_ref().and_then(default_from_value);
    }
    report
}

fn node_report(entry: &Entry) -> NodeReport {
    let is_alias = entry.alias_of().is_some();
    NodeReport {
        name: entry.name().to_string(),
        kind: if entry.is_group() { "group" } else { "command" }.to_string(),
        help: entry.help().unwrap_or_default().to_string(),
        hidden: entry.is_hidden(),
        alias_of: entry.alias_of().map(str::to_string),
        params: if is_alias {
            Vec::new()
        } else {
            entry.params().iter().map(param_report).collect()
        },
        children: if is_alias {
            Vec::new()
        } else {
            entry.children().iter().map(node_report).collect()
        },
    }
}

/// Everything the builder computed for `app`. Aliases are listed without
/// repeating their origin's parameters and children.
pub fn report(app: &App) -> DeclarationReport {
    DeclarationReport::new(node_report(app.root()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(text: &str) -> Description {
        Description::from_json(text).unwrap()
    }

    #[test]
    fn unknown_annotation_names_the_parameter() {
        let desc = group(r#"{ "name": "f", "params": [{ "name": "x", "annotation": "widget" }] }"#);
        let err = build(&desc, &InjectionRegistry::new(), &Recorder::new()).unwrap_err();
        assert_eq!(err.to_string(), "parameter `x`: unknown type `widget`");
    }

    #[test]
    fn records_constructor_and_method_calls() {
        let desc = group(
            r#"{
                "name": "App",
                "init": [{ "name": "a" }],
                "commands": [{ "name": "sync", "params": [{ "name": "x", "annotation": "int" }] }]
            }"#,
        );
        let recorder = Recorder::new();
        let app = build(&desc, &InjectionRegistry::new(), &recorder).unwrap();
        app.run(["1", "sync", "3"]).unwrap();

        let calls = recorder.take();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].callable, "App");
        assert_eq!(calls[0].call.args, vec![Value::from("1")]);
        assert_eq!(calls[1].callable, "App.sync");
        assert_eq!(calls[1].receiver.as_deref(), Some("App"));
        assert_eq!(calls[1].call.args, vec![Value::Int(3)]);
        assert!(recorder.take().is_empty());
    }

    #[test]
    fn report_lists_declarations_and_aliases() {
        let desc = group(
            r#"{
                "name": "App",
                "commands": [
                    { "name": "sync", "help": "Sync it.", "aliases": ["s"],
                      "params": [{ "name": "dry_run", "default": false }] }
                ]
            }"#,
        );
        let app = build(&desc, &InjectionRegistry::new(), &Recorder::new()).unwrap();
        let report = report(&app);
        assert_eq!(report.root.name, "app");
        assert_eq!(report.root.kind, "group");

        let sync = &report.root.children[0];
        assert_eq!(sync.help, "Sync it. (aliases: s)");
        let param = &sync.params[0];
        assert_eq!(param.role.as_deref(), Some("option"));
        assert_eq!(param.names, vec!["--dry-run/--no-dry-run", "dry_run"]);
        assert!(param.toggle);
        assert_eq!(param.default, Some(DefaultValue::Bool(false)));

        let alias = &report.root.children[1];
        assert_eq!(alias.alias_of.as_deref(), Some("sync"));
        assert!(alias.hidden);
        assert!(alias.params.is_empty());
    }

    #[test]
    fn static_commands_get_no_receiver() {
        let desc = group(
            r#"{ "name": "App", "commands": [{ "name": "ping", "static": true, "params": [] }] }"#,
        );
        let recorder = Recorder::new();
        let app = build(&desc, &InjectionRegistry::new(), &recorder).unwrap();
        app.run(["ping"]).unwrap();
        let calls = recorder.take();
        assert_eq!(calls[1].callable, "App.ping");
        assert_eq!(calls[1].receiver, None);
    }
}
