//! Per-invocation context chain.
//!
//! Every level of a dispatched command path gets its own frame. A frame links
//! to its parent, holds the instance constructed for its group (if any), and
//! a small typed object store. Frames live for exactly one invocation.

use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Identity of a built group node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupId(pub(crate) usize);

impl GroupId {
    pub(crate) fn next() -> Self {
        use std::sync::atomic::{AtomicUsize, Ordering};
        static NEXT: AtomicUsize = AtomicUsize::new(1);
        GroupId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

struct Frame {
    name: String,
    parent: Option<Context>,
    instance: RefCell<Option<(GroupId, Rc<dyn Any>)>>,
    objects: RefCell<Vec<(TypeId, Rc<dyn Any>)>>,
}

/// Handle to one frame of the invocation context. Cloning is cheap and
/// yields the same frame.
#[derive(Clone)]
pub struct Context {
    frame: Rc<Frame>,
}

impl Context {
    pub(crate) fn root(name: impl Into<String>) -> Self {
        Self::with_parent(name.into(), None)
    }

    pub(crate) fn child(&self, name: impl Into<String>) -> Self {
        Self::with_parent(name.into(), Some(self.clone()))
    }

    fn with_parent(name: String, parent: Option<Context>) -> Self {
        Self {
            frame: Rc::new(Frame {
                name,
                parent,
                instance: RefCell::new(None),
                objects: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Name of the command or group this frame was created for.
    pub fn name(&self) -> &str {
        &self.frame.name
    }

    pub fn parent(&self) -> Option<&Context> {
        self.frame.parent.as_ref()
    }

    /// Names from the root down to this frame.
    pub fn command_path(&self) -> Vec<String> {
        let mut path = Vec::new();
        let mut cur = Some(self);
        while let Some(ctx) = cur {
            path.push(ctx.name().to_string());
            cur = ctx.parent();
        }
        path.reverse();
        path
    }

    pub(crate) fn store_instance(&self, group: GroupId, instance: Rc<dyn Any>) {
        *self.frame.instance.borrow_mut() = Some((group, instance));
    }

    /// Instance constructed for `group` in this frame or any ancestor.
    pub fn instance_of(&self, group: GroupId) -> Option<Rc<dyn Any>> {
        let mut cur = Some(self);
        while let Some(ctx) = cur {
            if let Some((id, instance)) = ctx.frame.instance.borrow().as_ref() {
                if *id == group {
                    return Some(instance.clone());
                }
            }
            cur = ctx.parent();
        }
        None
    }

    /// Store `value` in this frame, replacing any object of the same type.
    pub fn insert_object<T: Any>(&self, value: T) -> Rc<T> {
        let rc = Rc::new(value);
        let erased: Rc<dyn Any> = rc.clone();
        let mut objects = self.frame.objects.borrow_mut();
        objects.retain(|(id, _)| *id != TypeId::of::<T>());
        objects.push((TypeId::of::<T>(), erased));
        rc
    }

    /// Closest object of type `T`, searching this frame then its ancestors.
    pub fn find_object<T: Any>(&self) -> Option<Rc<T>> {
        let mut cur = Some(self);
        while let Some(ctx) = cur {
            let found = ctx
                .frame
                .objects
                .borrow()
                .iter()
                .find(|(id, _)| *id == TypeId::of::<T>())
                .map(|(_, obj)| obj.clone());
            if let Some(obj) = found {
                return obj.downcast::<T>().ok();
            }
            cur = ctx.parent();
        }
        None
    }

    /// Like [`Context::find_object`], but creates a default object in this
    /// frame when none is visible.
    pub fn ensure_object<T: Any + Default>(&self) -> Rc<T> {
        match self.find_object::<T>() {
            Some(obj) => obj,
            None => self.insert_object(T::default()),
        }
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("path", &self.command_path())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_path_walks_to_root() {
        let root = Context::root("app");
        let sub = root.child("sub-group").child("method");
        assert_eq!(sub.command_path(), vec!["app", "sub-group", "method"]);
        assert_eq!(sub.parent().map(Context::name), Some("sub-group"));
    }

    #[test]
    fn instances_are_visible_to_descendants_only() {
        let root = Context::root("app");
        let a = root.child("a");
        let b = root.child("b");
        let id = GroupId::next();
        a.store_instance(id, Rc::new(5_u32));

        let leaf = a.child("leaf");
        let found = leaf.instance_of(id).unwrap();
        assert_eq!(found.downcast_ref::<u32>(), Some(&5));
        assert!(b.instance_of(id).is_none());
        assert!(root.instance_of(id).is_none());
    }

    #[test]
    fn find_and_ensure_objects() {
        #[derive(Default, Debug, PartialEq)]
        struct Counter(u32);

        let root = Context::root("app");
        let child = root.child("cmd");
        assert!(child.find_object::<Counter>().is_none());

        root.insert_object(Counter(3));
        assert_eq!(*child.find_object::<Counter>().unwrap(), Counter(3));

        let other = Context::root("other");
        let made = other.ensure_object::<Counter>();
        assert_eq!(*made, Counter(0));
        assert!(Rc::ptr_eq(&made, &other.ensure_object::<Counter>()));
    }
}
