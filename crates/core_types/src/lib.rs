pub type SubscriptionId = u64;

/// Identity of one highlighter instance; stamped on its root as the scope boundary value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(pub u64);

impl ScopeId {
    pub fn as_attr_value(self) -> String {
        self.0.to_string()
    }
}

impl std::fmt::Display for ScopeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "scope#{}", self.0)
    }
}

/// Monotonic mutation counter of a content tree.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TreeVersion(pub u64);

impl TreeVersion {
    pub const INITIAL: TreeVersion = TreeVersion(0);

    pub fn next(self) -> Self {
        TreeVersion(self.0.wrapping_add(1))
    }
}
