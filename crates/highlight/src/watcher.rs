//! Reacting to mutations inside an instance's scope.
//!
//! A [`Highlighter`] is `Idle` until mounted. Mounting stamps the root with
//! [`SCOPE_ATTR`], runs an unconditional pass, records the signature and
//! subscribes to the root's subtree. Each delivered batch is then filtered to
//! in-scope targets; if any remain and the signature moved, a pass runs and
//! the new signature is recorded. The engine's own edits therefore come back
//! as a batch whose signature already matches and are absorbed.

use crate::annotator::{PassReport, apply_compiled};
use crate::config::{MatchConfig, SCOPE_ATTR};
use crate::handle::RootHandle;
use crate::scope::{Scope, scoped_marks};
use crate::signature::{Signature, signature_in};
use crate::terms::{CompiledTerms, compile};
use bus::{MutationBus, Subscription};
use core_types::ScopeId;
use tree::{ContentTree, MutationRecord, NodeKey, TreeError};

/// Outcome of one delivered batch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reaction {
    /// Not mounted.
    Idle,
    /// No record targeted this instance's scope.
    Ignored,
    /// In-scope records, same signature.
    Unchanged,
    Reannotated(PassReport),
    /// The root left the document; the instance went back to `Idle`.
    TornDown,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WatchStats {
    pub passes: u64,
    pub ignored_batches: u64,
    pub unchanged_batches: u64,
}

enum WatchState {
    Idle,
    Observing {
        root: NodeKey,
        subscription: Subscription,
        last_signature: Signature,
        /// Nested roots excluded from `last_signature`.
        boundaries: Vec<NodeKey>,
    },
}

pub struct Highlighter {
    scope_id: ScopeId,
    handle: RootHandle,
    config: MatchConfig,
    compiled: Option<CompiledTerms>,
    state: WatchState,
    stats: WatchStats,
}

impl Highlighter {
    pub fn new(scope_id: ScopeId, config: MatchConfig) -> Self {
        Self::with_handle(scope_id, config, RootHandle::new())
    }

    /// Like [`Highlighter::new`], writing the mounted root into the owner's handle.
    pub fn with_handle(scope_id: ScopeId, config: MatchConfig, handle: RootHandle) -> Self {
        let compiled = compile(&config);
        Self {
            scope_id,
            handle,
            config,
            compiled,
            state: WatchState::Idle,
            stats: WatchStats::default(),
        }
    }

    pub fn scope_id(&self) -> ScopeId {
        self.scope_id
    }

    pub fn handle(&self) -> RootHandle {
        self.handle.clone()
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    pub fn stats(&self) -> WatchStats {
        self.stats
    }

    pub fn root(&self) -> Option<NodeKey> {
        match &self.state {
            WatchState::Observing { root, .. } => Some(*root),
            WatchState::Idle => None,
        }
    }

    pub fn is_observing(&self) -> bool {
        self.root().is_some()
    }

    pub fn last_signature(&self) -> Option<&Signature> {
        match &self.state {
            WatchState::Observing { last_signature, .. } => Some(last_signature),
            WatchState::Idle => None,
        }
    }

    /// Attach to `root`: stamp it, annotate it, and start observing.
    ///
    /// `root` must be an element attached to the document. Mounting an already
    /// mounted instance tears the old mount down first.
    pub fn mount(
        &mut self,
        tree: &mut ContentTree,
        bus: &mut MutationBus,
        root: NodeKey,
    ) -> Result<PassReport, TreeError> {
        match tree.kind(root) {
            Some(kind) if kind.is_element() => {}
            Some(_) => return Err(TreeError::WrongNodeKind(root)),
            None => return Err(TreeError::MissingKey(root)),
        }
        if !tree.is_attached(root) {
            return Err(TreeError::NotAttached(root));
        }
        self.unmount(tree);

        tree.set_attribute(root, SCOPE_ATTR, Some(&self.scope_id.as_attr_value()))?;
        self.handle.set(Some(root));
        let report = self.run_pass(tree, root);
        let scope = Scope::resolve(tree, root);
        let last_signature = signature_in(tree, &scope);
        let subscription = bus.subscribe(root);
        log::debug!(
            target: "highlight.watcher",
            "{} mounted on node {} (subscription {})",
            self.scope_id,
            root.0,
            subscription.id()
        );
        self.state = WatchState::Observing {
            root,
            subscription,
            last_signature,
            boundaries: scope.nested().to_vec(),
        };
        Ok(report)
    }

    /// Stop observing. Markers already in the tree stay where they are.
    pub fn unmount(&mut self, tree: &mut ContentTree) {
        let WatchState::Observing { root, .. } = std::mem::replace(&mut self.state, WatchState::Idle)
        else {
            return;
        };
        if tree.is_live(root) {
            let _ = tree.remove_attribute(root, SCOPE_ATTR);
        }
        self.handle.set(None);
        log::debug!(target: "highlight.watcher", "{} unmounted from node {}", self.scope_id, root.0);
    }

    /// Move to a different root.
    pub fn redirect(
        &mut self,
        tree: &mut ContentTree,
        bus: &mut MutationBus,
        root: NodeKey,
    ) -> Result<PassReport, TreeError> {
        self.unmount(tree);
        self.mount(tree, bus, root)
    }

    /// Replace the configuration. A mounted instance re-annotates immediately,
    /// whether or not content changed.
    pub fn set_config(&mut self, tree: &mut ContentTree, config: MatchConfig) -> Option<PassReport> {
        self.compiled = compile(&config);
        self.config = config;
        let root = self.root()?;
        let report = self.run_pass(tree, root);
        self.refresh(tree, root);
        Some(report)
    }

    /// Drain delivered batches and react to each. Returns the number of passes run.
    pub fn process(&mut self, tree: &mut ContentTree) -> usize {
        let Some(root) = self.root() else {
            return 0;
        };
        if !tree.is_attached(root) {
            self.teardown(tree, root);
            return 0;
        }
        let batches = match &self.state {
            WatchState::Observing { subscription, .. } => subscription.drain(),
            WatchState::Idle => return 0,
        };
        let mut passes = 0;
        for batch in batches {
            if let Reaction::Reannotated(_) = self.handle_records(tree, &batch.records) {
                passes += 1;
            }
        }
        passes
    }

    /// React to one batch of records.
    pub fn handle_records(&mut self, tree: &mut ContentTree, records: &[MutationRecord]) -> Reaction {
        let Some(root) = self.root() else {
            return Reaction::Idle;
        };
        if !tree.is_attached(root) {
            self.teardown(tree, root);
            return Reaction::TornDown;
        }

        let scope = Scope::resolve(tree, root);
        if !records.iter().any(|record| scope.contains(tree, record.target)) {
            self.stats.ignored_batches += 1;
            if self.boundaries() != Some(scope.nested()) {
                // A nested instance came or went; its region left or joined the signature.
                let current = signature_in(tree, &scope);
                self.remember(current, &scope);
            }
            log::trace!(
                target: "highlight.watcher",
                "{}: {} records outside scope",
                self.scope_id,
                records.len()
            );
            return Reaction::Ignored;
        }

        let current = signature_in(tree, &scope);
        if self.last_signature() == Some(&current) {
            self.stats.unchanged_batches += 1;
            self.remember(current, &scope);
            return Reaction::Unchanged;
        }
        if self.config.debug {
            log::debug!(
                target: "highlight.watcher",
                "{}: content changed {:?} -> {:?}",
                self.scope_id,
                self.last_signature().map(Signature::to_string),
                current.to_string()
            );
        }

        let report = self.run_pass(tree, root);
        self.refresh(tree, root);
        Reaction::Reannotated(report)
    }

    /// Marker nodes this instance currently owns.
    pub fn marks(&self, tree: &ContentTree) -> Vec<NodeKey> {
        match self.root() {
            Some(root) => scoped_marks(tree, root),
            None => Vec::new(),
        }
    }

    fn run_pass(&mut self, tree: &mut ContentTree, root: NodeKey) -> PassReport {
        let report = apply_compiled(tree, root, self.compiled.as_ref(), &self.config.presentation);
        self.stats.passes += 1;
        if self.config.debug {
            log::debug!(
                target: "highlight.watcher",
                "{} pass {}: {report:?}\n{}",
                self.scope_id,
                self.stats.passes,
                tree::debug::outline(tree, root, 32).join("\n")
            );
        }
        report
    }

    fn boundaries(&self) -> Option<&[NodeKey]> {
        match &self.state {
            WatchState::Observing { boundaries, .. } => Some(boundaries.as_slice()),
            WatchState::Idle => None,
        }
    }

    fn refresh(&mut self, tree: &ContentTree, root: NodeKey) {
        let scope = Scope::resolve(tree, root);
        let current = signature_in(tree, &scope);
        self.remember(current, &scope);
    }

    fn remember(&mut self, next: Signature, scope: &Scope) {
        if let WatchState::Observing {
            last_signature,
            boundaries,
            ..
        } = &mut self.state
        {
            *last_signature = next;
            if boundaries.as_slice() != scope.nested() {
                *boundaries = scope.nested().to_vec();
            }
        }
    }

    fn teardown(&mut self, tree: &mut ContentTree, root: NodeKey) {
        log::debug!(
            target: "highlight.watcher",
            "{}: root {} left the document",
            self.scope_id,
            root.0
        );
        self.unmount(tree);
    }
}
