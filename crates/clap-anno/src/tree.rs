//! Command trees: class-like descriptions in, a dispatchable clap command out.
//!
//! A [`Class`] is a group. Its constructor signature becomes the group's own
//! parameters and runs before any subcommand; the instance it returns is
//! stored in the invocation context for the group's methods. Nested classes
//! become nested groups. Two member names bound to the same [`Member`] form
//! an alias set: one visible origin, hidden (but invocable) aliases.

use std::any::{Any, type_name};
use std::collections::HashSet;
use std::ffi::OsString;
use std::fmt;
use std::rc::Rc;

use anyhow::{Result, anyhow};
use clap::error::ErrorKind;
use clap::{ArgMatches, Command};
use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::adapter::{CallArgs, CallableAdapter, Invoke};
use crate::context::{Context, GroupId};
use crate::error::{DeclarationError, DeclarationErrorKind, InvokeError, Outcome};
use crate::inject::InjectionRegistry;
use crate::naming;
use crate::param::ClassifiedParam;
use crate::signature::Signature;
use crate::value::Value;

/// Per-member overrides for what the engine shows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attrs {
    pub name: Option<String>,
    pub help: Option<String>,
    pub hidden: bool,
}

impl Attrs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }
}

type FunctionCall = Rc<dyn Fn(CallArgs) -> Result<Value>>;
type MethodCall = Rc<dyn Fn(Option<&dyn Any>, CallArgs) -> Result<Value>>;
type Constructor = Rc<dyn Fn(CallArgs) -> Result<Rc<dyn Any>>>;
type Projection = Rc<dyn for<'a> Fn(&'a dyn Any) -> Option<&'a dyn Any>>;

fn projection<F>(f: F) -> Projection
where
    F: for<'a> Fn(&'a dyn Any) -> Option<&'a dyn Any> + 'static,
{
    Rc::new(f)
}

/// A free-standing callable exposed as a single command.
#[derive(Clone)]
pub struct Function {
    name: String,
    signature: Signature,
    help: Option<String>,
    attrs: Attrs,
    call: FunctionCall,
}

impl Function {
    pub fn new(
        name: impl Into<String>,
        signature: Signature,
        call: impl Fn(CallArgs) -> Result<Value> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            signature,
            help: None,
            attrs: Attrs::default(),
            call: Rc::new(call),
        }
    }

    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn attrs(mut self, attrs: Attrs) -> Self {
        self.attrs = attrs;
        self
    }
}

/// A method of a class: called on the group instance, or without one when
/// built with [`Method::static_fn`].
pub struct Method {
    name: String,
    signature: Signature,
    help: Option<String>,
    attrs: Attrs,
    has_receiver: bool,
    call: MethodCall,
}

impl Method {
    /// A method on `T`. A leading `self` parameter in `signature` is
    /// dropped.
    pub fn new<T, F>(name: impl Into<String>, signature: Signature, f: F) -> Self
    where
        T: Any,
        F: Fn(&T, CallArgs) -> Result<Value> + 'static,
    {
        let call: MethodCall = Rc::new(move |receiver: Option<&dyn Any>, args: CallArgs| {
            let receiver = receiver
                .and_then(|r| r.downcast_ref::<T>())
                .ok_or_else(|| anyhow!("receiver is not a `{}`", type_name::<T>()))?;
            f(receiver, args)
        });
        Self {
            name: name.into(),
            signature: signature.without_receiver(),
            help: None,
            attrs: Attrs::default(),
            has_receiver: true,
            call,
        }
    }

    /// A method that takes no instance; every parameter is kept.
    pub fn static_fn<F>(name: impl Into<String>, signature: Signature, f: F) -> Self
    where
        F: Fn(CallArgs) -> Result<Value> + 'static,
    {
        Self {
            name: name.into(),
            signature,
            help: None,
            attrs: Attrs::default(),
            has_receiver: false,
            call: Rc::new(move |_: Option<&dyn Any>, args: CallArgs| f(args)),
        }
    }

    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn attrs(mut self, attrs: Attrs) -> Self {
        self.attrs = attrs;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

struct Base {
    class: Rc<Class>,
    project: Projection,
}

/// A class-like group description, assembled with builder calls.
pub struct Class {
    name: String,
    init: Signature,
    ctor: Constructor,
    help: Option<String>,
    attrs: Attrs,
    members: Vec<(String, Member)>,
    bases: Vec<Base>,
}

impl Class {
    /// A class whose instances are built by `ctor` from the `init`
    /// parameters. A leading `self` parameter in `init` is dropped.
    pub fn new<T, F>(name: impl Into<String>, init: Signature, ctor: F) -> Self
    where
        T: Any,
        F: Fn(CallArgs) -> Result<T> + 'static,
    {
        let ctor: Constructor = Rc::new(move |args: CallArgs| -> Result<Rc<dyn Any>> {
            Ok(Rc::new(ctor(args)?) as Rc<dyn Any>)
        });
        Self {
            name: name.into(),
            init: init.without_receiver(),
            ctor,
            help: None,
            attrs: Attrs::default(),
            members: Vec::new(),
            bases: Vec::new(),
        }
    }

    /// A class with a parameterless constructor.
    pub fn with_default<T: Any + Default>(name: impl Into<String>) -> Self {
        Self::new(name, Signature::new(), |_| Ok(T::default()))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn attrs(mut self, attrs: Attrs) -> Self {
        self.attrs = attrs;
        self
    }

    /// Bind `member` under `name`. Binding one member under several names
    /// makes them aliases.
    pub fn member(mut self, name: impl Into<String>, member: Member) -> Self {
        self.members.push((name.into(), member));
        self
    }

    /// Add a method under its own name.
    pub fn method(self, method: Method) -> Self {
        let name = method.name.clone();
        self.member(name, Member::method(method))
    }

    /// Add a nested class under its own name.
    pub fn group(self, class: Class) -> Self {
        let name = class.name.clone();
        self.member(name, Member::class(class))
    }

    /// Attach an already built command or tree under `name`.
    pub fn command(self, name: impl Into<String>, app: App) -> Self {
        self.member(name, Member::Command(Rc::new(app)))
    }

    /// Bind the member currently named `existing` under `name` as well.
    pub fn alias(self, name: impl Into<String>, existing: &str) -> Self {
        let found = self
            .members
            .iter()
            .find(|(n, _)| n == existing)
            .map(|(_, m)| m.clone());
        match found {
            Some(member) => self.member(name, member),
            None => {
                warn!(class = %self.name, existing, "alias target is not a member");
                self
            }
        }
    }

    /// Inherit `base`'s members. `project` borrows the base part out of a
    /// `T` instance for the inherited methods.
    pub fn inherit<T, B, F>(mut self, base: Class, project: F) -> Self
    where
        T: Any,
        B: Any,
        F: Fn(&T) -> &B + 'static,
    {
        let project = projection(move |any| {
            any.downcast_ref::<T>()
                .map(|instance| project(instance) as &dyn Any)
        });
        self.bases.push(Base {
            class: Rc::new(base),
            project,
        });
        self
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Class")
            .field("name", &self.name)
            .field(
                "members",
                &self.members.iter().map(|(n, _)| n).collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}

/// A value bound to a class attribute. Identity (not name) decides aliasing.
#[derive(Clone)]
pub enum Member {
    Method(Rc<Method>),
    Class(Rc<Class>),
    Command(Rc<App>),
}

impl Member {
    pub fn method(method: Method) -> Self {
        Member::Method(Rc::new(method))
    }

    pub fn class(class: Class) -> Self {
        Member::Class(Rc::new(class))
    }

    fn identity(&self) -> usize {
        match self {
            Member::Method(m) => Rc::as_ptr(m) as *const () as usize,
            Member::Class(c) => Rc::as_ptr(c) as *const () as usize,
            Member::Command(a) => Rc::as_ptr(a) as *const () as usize,
        }
    }

    fn declared_name(&self) -> &str {
        match self {
            Member::Method(m) => &m.name,
            Member::Class(c) => &c.name,
            Member::Command(a) => &a.declared_name,
        }
    }

    fn attrs(&self) -> Attrs {
        match self {
            Member::Method(m) => m.attrs.clone(),
            Member::Class(c) => c.attrs.clone(),
            Member::Command(_) => Attrs::default(),
        }
    }

    fn help(&self) -> Option<String> {
        match self {
            Member::Method(m) => m.help.clone(),
            Member::Class(c) => c.help.clone(),
            Member::Command(a) => a.root.help.clone(),
        }
    }
}

/// `(declared name, attribute name) -> display name`. The attribute name
/// arrives with any trailing escape underscore already stripped.
pub type NameFormat = Rc<dyn Fn(&str, &str) -> String>;

#[derive(Clone)]
pub struct AppConfig {
    pub allow_inherit: bool,
    pub command_name_format: NameFormat,
    pub group_name_format: NameFormat,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            allow_inherit: false,
            command_name_format: Rc::new(|_, name| naming::to_kebab(name)),
            group_name_format: Rc::new(|_, name| naming::to_group_kebab(name)),
        }
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("allow_inherit", &self.allow_inherit)
            .finish_non_exhaustive()
    }
}

#[derive(Clone)]
enum Node {
    Group(Rc<GroupNode>),
    Command(Rc<CommandNode>),
}

struct GroupNode {
    adapter: CallableAdapter,
    children: Vec<Entry>,
}

struct CommandNode {
    adapter: CallableAdapter,
}

/// One named node of a built tree.
#[derive(Clone)]
pub struct Entry {
    name: String,
    help: Option<String>,
    hidden: bool,
    alias_of: Option<String>,
    node: Node,
}

impl Entry {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    /// Display name of the origin entry when this one is an alias.
    pub fn alias_of(&self) -> Option<&str> {
        self.alias_of.as_deref()
    }

    pub fn is_group(&self) -> bool {
        matches!(self.node, Node::Group(_))
    }

    /// The entry's own parameters (a group's constructor parameters).
    pub fn params(&self) -> &[ClassifiedParam] {
        match &self.node {
            Node::Group(g) => g.adapter.params(),
            Node::Command(c) => c.adapter.params(),
        }
    }

    pub fn children(&self) -> &[Entry] {
        match &self.node {
            Node::Group(g) => &g.children,
            Node::Command(_) => &[],
        }
    }

    pub fn child(&self, name: &str) -> Option<&Entry> {
        self.children().iter().find(|c| c.name == name)
    }

    fn adapter(&self) -> &CallableAdapter {
        match &self.node {
            Node::Group(g) => &g.adapter,
            Node::Command(c) => &c.adapter,
        }
    }

    fn to_clap(&self) -> Command {
        let mut cmd = Command::new(self.name.clone()).hide(self.hidden);
        if let Some(help) = &self.help {
            cmd = cmd.about(help.clone());
        }
        cmd = self.adapter().declare(cmd);
        for child in self.children() {
            cmd = cmd.subcommand(child.to_clap());
        }
        cmd
    }

    fn dispatch(&self, matches: &ArgMatches, ctx: &Context) -> Result<Value, InvokeError> {
        let adapter = self.adapter();
        let value = adapter.invoke(adapter.collect(matches), ctx)?;
        let Some((name, sub_matches)) = matches.subcommand() else {
            return Ok(value);
        };
        let child = self
            .child(name)
            .ok_or_else(|| anyhow!("unknown subcommand `{name}`"))?;
        debug!(group = %self.name, subcommand = name, "dispatching");
        child.dispatch(sub_matches, &ctx.child(name))
    }
}

impl fmt::Debug for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entry")
            .field("name", &self.name)
            .field("hidden", &self.hidden)
            .field("alias_of", &self.alias_of)
            .field("children", &self.children())
            .finish()
    }
}

/// A built command tree, ready to run.
pub struct App {
    declared_name: String,
    root: Entry,
    command: Command,
}

impl App {
    pub fn root(&self) -> &Entry {
        &self.root
    }

    pub fn name(&self) -> &str {
        &self.root.name
    }

    /// The engine command, for callers that drive clap themselves.
    pub fn command(&self) -> &Command {
        &self.command
    }

    /// Parse `args` (without the program name) and run the selected path.
    pub fn run<I, S>(&self, args: I) -> Result<Outcome, InvokeError>
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        let argv = std::iter::once(OsString::from(&self.root.name))
            .chain(args.into_iter().map(Into::into));
        let matches = match self.command.clone().try_get_matches_from(argv) {
            Ok(matches) => matches,
            Err(e) if e.kind() == ErrorKind::DisplayHelp => {
                return Ok(Outcome::Help(e.render().to_string()));
            }
            Err(e) if e.kind() == ErrorKind::DisplayVersion => {
                return Ok(Outcome::Version(e.render().to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        let ctx = Context::root(self.root.name.clone());
        self.root.dispatch(&matches, &ctx).map(Outcome::Value)
    }

    /// Help text of the root, or of the subcommand at `path`.
    pub fn help_for(&self, path: &[&str]) -> Option<String> {
        let mut root = self.command.clone();
        root.build();
        let mut cmd = &mut root;
        for name in path {
            cmd = cmd.find_subcommand_mut(name)?;
        }
        Some(cmd.render_help().to_string())
    }

    pub fn help(&self) -> String {
        self.help_for(&[]).unwrap_or_default()
    }
}

impl fmt::Debug for App {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("App")
            .field("declared_name", &self.declared_name)
            .field("root", &self.root)
            .finish()
    }
}

struct Resolved {
    attr: String,
    member: Member,
    projections: Vec<Projection>,
}

/// Members visible on `class`: its own first, then (when inheriting) each
/// base's in turn, depth first. Underscore-prefixed names are private and a
/// name already seen shadows later ones.
fn resolve_members(class: &Class, inherit: bool) -> Vec<Resolved> {
    fn walk(
        class: &Class,
        inherit: bool,
        chain: &[Projection],
        seen: &mut HashSet<String>,
        out: &mut Vec<Resolved>,
    ) {
        for (attr, member) in &class.members {
            if attr.starts_with('_') || !seen.insert(attr.clone()) {
                continue;
            }
            out.push(Resolved {
                attr: attr.clone(),
                member: member.clone(),
                projections: chain.to_vec(),
            });
        }
        if !inherit {
            return;
        }
        for base in &class.bases {
            let mut chain = chain.to_vec();
            chain.push(base.project.clone());
            walk(&base.class, inherit, &chain, seen, out);
        }
    }

    let mut out = Vec::new();
    walk(class, inherit, &[], &mut HashSet::new(), &mut out);
    out
}

fn alias_suffix(help: Option<String>, aliases: &[String]) -> String {
    let listed = aliases.join(", ");
    match help {
        Some(help) if !help.is_empty() => format!("{help} (aliases: {listed})"),
        _ => format!("aliases: {listed}"),
    }
}

struct Builder<'a> {
    config: &'a AppConfig,
    registry: &'a InjectionRegistry,
}

impl Builder<'_> {
    fn display_name(&self, member: &Member, attr: &str) -> String {
        let attr = naming::strip_trailing_escape(attr);
        let declared = member.declared_name();
        match member {
            Member::Class(_) => (self.config.group_name_format)(declared, attr),
            Member::Method(_) | Member::Command(_) => {
                (self.config.command_name_format)(declared, attr)
            }
        }
    }

    fn class_entry(&self, class: &Class) -> Result<Entry, DeclarationError> {
        let attrs = class.attrs.clone();
        let name = attrs.name.clone().unwrap_or_else(|| {
            (self.config.group_name_format)(
                &class.name,
                naming::strip_trailing_escape(&class.name),
            )
        });
        Ok(Entry {
            name,
            help: attrs.help.or_else(|| class.help.clone()),
            hidden: attrs.hidden,
            alias_of: None,
            node: Node::Group(self.group(class)?),
        })
    }

    fn group(&self, class: &Class) -> Result<Rc<GroupNode>, DeclarationError> {
        let id = GroupId::next();
        let ctor = class.ctor.clone();
        let init: Invoke = Rc::new(move |ctx: &Context, args: CallArgs| -> Result<Value> {
            let instance = ctor(args)?;
            ctx.store_instance(id, instance);
            Ok(Value::Unit)
        });
        let adapter = CallableAdapter::with_invoke(&class.init, self.registry, init)?;

        let members = resolve_members(class, self.config.allow_inherit);
        let mut sets: IndexMap<usize, Vec<usize>> = IndexMap::new();
        for (index, resolved) in members.iter().enumerate() {
            sets.entry(resolved.member.identity())
                .or_default()
                .push(index);
        }

        let mut entries: Vec<Option<Entry>> = vec![None; members.len()];
        for indexes in sets.values() {
            let first = &members[indexes[0]];
            let declared = first.member.declared_name();
            let origin = indexes
                .iter()
                .copied()
                .find(|&i| members[i].attr == declared)
                .unwrap_or(indexes[0]);

            let node = match &first.member {
                Member::Method(method) => {
                    Node::Command(self.method(method, id, &first.projections)?)
                }
                Member::Class(nested) => Node::Group(self.group(nested)?),
                Member::Command(app) => app.root.node.clone(),
            };

            let origin_member = &members[origin].member;
            let attrs = origin_member.attrs();
            let origin_name = match (&attrs.name, origin_member) {
                (Some(name), _) => name.clone(),
                (None, Member::Command(app)) => app.root.name.clone(),
                (None, member) => self.display_name(member, &members[origin].attr),
            };
            let alias_names: Vec<String> = indexes
                .iter()
                .filter(|&&i| i != origin)
                .map(|&i| self.display_name(&members[i].member, &members[i].attr))
                .collect();

            let help = attrs.help.clone().or_else(|| origin_member.help());
            entries[origin] = Some(Entry {
                name: origin_name.clone(),
                help: if alias_names.is_empty() {
                    help
                } else {
                    Some(alias_suffix(help, &alias_names))
                },
                hidden: attrs.hidden,
                alias_of: None,
                node: node.clone(),
            });

            for (&i, alias) in indexes
                .iter()
                .filter(|&&i| i != origin)
                .zip(alias_names)
            {
                debug!(class = %class.name, alias = %alias, origin = %origin_name, "alias");
                entries[i] = Some(Entry {
                    name: alias,
                    help: Some(format!("alias of: `{origin_name}`")),
                    hidden: true,
                    alias_of: Some(origin_name.clone()),
                    node: node.clone(),
                });
            }
        }

        let children: Vec<Entry> = entries.into_iter().flatten().collect();
        let mut names = HashSet::new();
        for child in &children {
            if !names.insert(child.name.as_str()) {
                return Err(DeclarationError::new(
                    class.name.clone(),
                    DeclarationErrorKind::DuplicateCommand(child.name.clone()),
                ));
            }
        }

        Ok(Rc::new(GroupNode { adapter, children }))
    }

    fn method(
        &self,
        method: &Rc<Method>,
        parent: GroupId,
        projections: &[Projection],
    ) -> Result<Rc<CommandNode>, DeclarationError> {
        let call = method.call.clone();
        let invoke: Invoke = if method.has_receiver {
            let projections = projections.to_vec();
            let name = method.name.clone();
            Rc::new(move |ctx: &Context, args: CallArgs| {
                let instance = ctx
                    .instance_of(parent)
                    .ok_or_else(|| anyhow!("no group instance available for `{name}`"))?;
                let mut receiver: &dyn Any = instance.as_ref();
                for project in &projections {
                    receiver = project(receiver)
                        .ok_or_else(|| anyhow!("cannot borrow base part for `{name}`"))?;
                }
                call(Some(receiver), args)
            })
        } else {
            Rc::new(move |_: &Context, args: CallArgs| call(None, args))
        };
        let adapter = CallableAdapter::with_invoke(&method.signature, self.registry, invoke)?;
        Ok(Rc::new(CommandNode { adapter }))
    }
}

fn finish(declared_name: String, root: Entry, version: Option<String>) -> App {
    let mut command = root.to_clap();
    if let Some(version) = version {
        command = command.version(version);
    }
    App {
        declared_name,
        root,
        command,
    }
}

/// Builds an [`App`] from a root [`Class`].
pub struct AppBuilder {
    class: Class,
    config: AppConfig,
    registry: InjectionRegistry,
    version: Option<String>,
}

impl AppBuilder {
    pub fn new(class: Class) -> Self {
        Self {
            class,
            config: AppConfig::default(),
            registry: InjectionRegistry::default(),
            version: None,
        }
    }

    /// Include members inherited from base classes.
    pub fn allow_inherit(mut self, allow: bool) -> Self {
        self.config.allow_inherit = allow;
        self
    }

    pub fn command_name_format(
        mut self,
        format: impl Fn(&str, &str) -> String + 'static,
    ) -> Self {
        self.config.command_name_format = Rc::new(format);
        self
    }

    pub fn group_name_format(mut self, format: impl Fn(&str, &str) -> String + 'static) -> Self {
        self.config.group_name_format = Rc::new(format);
        self
    }

    pub fn config(mut self, config: AppConfig) -> Self {
        self.config = config;
        self
    }

    pub fn registry(mut self, registry: &InjectionRegistry) -> Self {
        self.registry = registry.clone();
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Classify every signature in the tree. Any declaration error aborts
    /// the whole build.
    pub fn build(self) -> Result<App, DeclarationError> {
        let builder = Builder {
            config: &self.config,
            registry: &self.registry,
        };
        let root = builder.class_entry(&self.class)?;
        if self.version.is_some() && root.adapter().claims_long("version") {
            return Err(DeclarationError::new(
                self.class.name.clone(),
                DeclarationErrorKind::ReservedLong("version".into()),
            ));
        }
        debug!(app = %root.name, commands = root.children().len(), "built command tree");
        Ok(finish(self.class.name.clone(), root, self.version))
    }
}

/// Build a command tree from `class` with default settings.
pub fn app(class: Class) -> Result<App, DeclarationError> {
    AppBuilder::new(class).build()
}

/// Expose one function as a standalone command.
pub fn command(function: Function) -> Result<App, DeclarationError> {
    command_with(function, &InjectionRegistry::default())
}

pub fn command_with(
    function: Function,
    registry: &InjectionRegistry,
) -> Result<App, DeclarationError> {
    let call = function.call.clone();
    let invoke: Invoke = Rc::new(move |_: &Context, args: CallArgs| call(args));
    let adapter = CallableAdapter::with_invoke(&function.signature, registry, invoke)?;
    let name = function.attrs.name.clone().unwrap_or_else(|| {
        naming::to_kebab(naming::strip_trailing_escape(&function.name))
    });
    let root = Entry {
        name,
        help: function.attrs.help.clone().or(function.help.clone()),
        hidden: function.attrs.hidden,
        alias_of: None,
        node: Node::Command(Rc::new(CommandNode { adapter })),
    };
    Ok(finish(function.name, root, None))
}
