use std::cell::Cell;
use std::rc::Rc;
use tree::NodeKey;

/// Shared reference to an instance's root, written at mount and cleared at
/// teardown. Clones observe the same slot.
#[derive(Clone, Debug, Default)]
pub struct RootHandle(Rc<Cell<Option<NodeKey>>>);

impl RootHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<NodeKey> {
        self.0.get()
    }

    pub fn is_mounted(&self) -> bool {
        self.0.get().is_some()
    }

    pub(crate) fn set(&self, root: Option<NodeKey>) {
        self.0.set(root);
    }

    pub fn same_slot(&self, other: &RootHandle) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}
