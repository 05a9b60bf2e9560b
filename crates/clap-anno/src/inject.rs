//! Injection: parameters whose value comes from the environment instead of
//! the command line.

use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

use anyhow::Result;

use crate::context::Context;
use crate::signature::Annotation;
use crate::value::Value;

/// Supplies a parameter's value at invocation time.
pub trait Injector {
    fn get_value(&self, ctx: &Context) -> Result<Value>;
}

/// A type that can construct itself for injection.
pub trait Injectable: Any + Sized {
    fn inject() -> Result<Self>;
}

type SelfInject = fn() -> Result<Value>;

fn self_inject<T: Injectable>() -> Result<Value> {
    T::inject().map(Value::object)
}

/// Identity of a Rust type used as an annotation.
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
    inject: Option<SelfInject>,
}

impl TypeKey {
    pub fn of<T: 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
            inject: None,
        }
    }

    pub fn injectable<T: Injectable>() -> Self {
        Self {
            inject: Some(self_inject::<T>),
            ..Self::of::<T>()
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn type_id(&self) -> TypeId {
        self.id
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TypeKey").field(&self.name).finish()
    }
}

/// Injects the current invocation [`Context`].
pub struct ContextInjector;

impl Injector for ContextInjector {
    fn get_value(&self, ctx: &Context) -> Result<Value> {
        Ok(Value::object(ctx.clone()))
    }
}

type Factory = Rc<dyn Fn() -> Result<Value>>;

/// Injects whatever a registered factory produces.
pub struct FactoryInjector {
    factory: Factory,
}

impl Injector for FactoryInjector {
    fn get_value(&self, _ctx: &Context) -> Result<Value> {
        (self.factory)()
    }
}

/// Injects a value built by the annotated type's own [`Injectable::inject`].
pub struct InjectableInjector {
    inject: SelfInject,
}

impl Injector for InjectableInjector {
    fn get_value(&self, _ctx: &Context) -> Result<Value> {
        (self.inject)()
    }
}

/// Injects the closest `T` stored in the context chain, or [`Value::Unit`]
/// when there is none.
pub struct FindObject<T>(PhantomData<T>);

/// Injects the closest `T` stored in the context chain, creating a default
/// one in the current frame when there is none.
pub struct EnsureObject<T>(PhantomData<T>);

/// Bind a parameter to [`Context::find_object`].
pub fn find<T: Any>() -> Annotation {
    Annotation::inject(FindObject::<T>(PhantomData))
}

/// Bind a parameter to [`Context::ensure_object`].
pub fn ensure<T: Any + Default>() -> Annotation {
    Annotation::inject(EnsureObject::<T>(PhantomData))
}

impl<T: Any> Injector for FindObject<T> {
    fn get_value(&self, ctx: &Context) -> Result<Value> {
        Ok(ctx
            .find_object::<T>()
            .map(|obj| Value::Object(obj))
            .unwrap_or_default())
    }
}

impl<T: Any + Default> Injector for EnsureObject<T> {
    fn get_value(&self, ctx: &Context) -> Result<Value> {
        let obj: Rc<dyn Any> = ctx.ensure_object::<T>();
        Ok(Value::Object(obj))
    }
}

/// Annotation-keyed factories, consulted while classifying parameters.
///
/// Populate it before building a tree; it is only read afterwards.
#[derive(Clone, Default)]
pub struct InjectionRegistry {
    factories: HashMap<TypeId, Factory>,
}

impl InjectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the factory used for parameters annotated with
    /// `T`.
    pub fn register<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: Any,
        F: Fn() -> Result<T> + 'static,
    {
        let erased: Factory = Rc::new(move || factory().map(Value::object));
        self.register_key(TypeKey::of::<T>(), erased)
    }

    /// Register a factory producing a ready-made [`Value`] for `key`.
    pub fn register_key(&mut self, key: TypeKey, factory: Rc<dyn Fn() -> Result<Value>>) -> &mut Self {
        tracing::debug!(annotation = key.name(), "registered injection factory");
        self.factories.insert(key.type_id(), factory);
        self
    }

    pub fn is_registered(&self, key: &TypeKey) -> bool {
        self.factories.contains_key(&key.type_id())
    }

    /// Injector for `annotation`, or `None` when the value must be parsed
    /// from input.
    ///
    /// Lookup order: an injector bound directly to the parameter, a
    /// registered factory, the invocation context, a self-injecting type.
    pub fn resolve(&self, annotation: &Annotation) -> Option<Rc<dyn Injector>> {
        let key = match annotation {
            Annotation::Inject(injector) => return Some(injector.clone()),
            Annotation::Object(key) => key,
            _ => return None,
        };

        if let Some(factory) = self.factories.get(&key.type_id()) {
            return Some(Rc::new(FactoryInjector {
                factory: factory.clone(),
            }));
        }
        if key.type_id() == TypeId::of::<Context>() {
            return Some(Rc::new(ContextInjector));
        }
        key.inject
            .map(|inject| Rc::new(InjectableInjector { inject }) as Rc<dyn Injector>)
    }
}

impl fmt::Debug for InjectionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InjectionRegistry")
            .field("factories", &self.factories.len())
            .finish()
    }
}
