//! Expose described signatures and class-like trees as clap commands.
//!
//! A [`Signature`] lists a callable's parameters (name, kind, default,
//! annotation). Each parameter is classified into a positional argument, a
//! `--long` option, a flag, a `--x/--no-x` switch pair, or an injected value.
//! Parsed values are routed back into [`CallArgs`] shaped like the declared
//! signature.
//!
//! ```no_run
//! use clap_anno::{Class, Method, Param, Signature, Value, app};
//!
//! #[derive(Default)]
//! struct Tool;
//!
//! let tool = Class::with_default::<Tool>("Tool").method(Method::new::<Tool, _>(
//!     "greet",
//!     Signature::new().param(Param::positional("name")),
//!     |_, call| Ok(Value::from(format!("hello {}", call.arg::<String>(0)?))),
//! ));
//! let app = app(tool)?;
//! let out = app.run(["greet", "world"])?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod adapter;
pub mod context;
pub mod describe;
pub mod error;
pub mod inject;
pub mod naming;
pub mod param;
pub mod signature;
pub mod tree;
pub mod value;

pub use adapter::{CallArgs, CallableAdapter, ParsedValues};
pub use context::{Context, GroupId};
pub use error::{DeclarationError, DeclarationErrorKind, InvokeError, Outcome};
pub use inject::{Injectable, InjectionRegistry, Injector, TypeKey, ensure, find};
pub use param::{Arity, Binding, ClassifiedParam, ParamDecl, Role, classify};
pub use signature::{Annotation, Param, ParamKind, ParseAnnotationError, Signature};
pub use tree::{
    App, AppBuilder, AppConfig, Attrs, Class, Entry, Function, Member, Method, NameFormat, app,
    command, command_with,
};
pub use value::{EnumType, FromValue, Value, ValueType};
