//! Mutation notification channel between the content tree and its observers.
//!
//! The tree only queues records; the host decides when a burst of edits is
//! over and calls [`MutationBus::dispatch`], which fans the queued records out
//! as one [`MutationBatch`] per interested subscriber. Observers drain their
//! [`Subscription`] whenever they are scheduled.
//!
//! Invariants:
//! - Records keep their original order inside a batch.
//! - A subscriber only receives records whose target lies inside its observed
//!   subtree (inclusive) at dispatch time; records about nodes that no longer
//!   exist are not delivered.
//! - Dropping a `Subscription` cancels it; the bus prunes the dead sender on
//!   the next dispatch that would have reached it.

use core_types::SubscriptionId;
use std::sync::mpsc::{self, Receiver, Sender};
use tree::{ContentTree, MutationRecord, NodeKey};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationBatch {
    pub observed: NodeKey,
    pub records: Vec<MutationRecord>,
}

pub struct Subscription {
    id: SubscriptionId,
    observed: NodeKey,
    rx: Receiver<MutationBatch>,
}

impl Subscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn observed(&self) -> NodeKey {
        self.observed
    }

    /// Next delivered batch, without blocking.
    pub fn try_next(&self) -> Option<MutationBatch> {
        self.rx.try_recv().ok()
    }

    pub fn drain(&self) -> Vec<MutationBatch> {
        let mut out = Vec::new();
        while let Ok(batch) = self.rx.try_recv() {
            out.push(batch);
        }
        out
    }
}

struct Subscriber {
    id: SubscriptionId,
    observed: NodeKey,
    tx: Sender<MutationBatch>,
}

pub struct MutationBus {
    subscribers: Vec<Subscriber>,
    next_id: SubscriptionId,
}

impl MutationBus {
    pub fn new() -> Self {
        Self {
            subscribers: Vec::new(),
            next_id: 1,
        }
    }

    pub fn subscribe(&mut self, observed: NodeKey) -> Subscription {
        let id = self.next_id;
        self.next_id += 1;
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(Subscriber { id, observed, tx });
        log::trace!(target: "bus.dispatch", "subscription {id} observes node {}", observed.0);
        Subscription { id, observed, rx }
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|sub| sub.id != id);
        self.subscribers.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Deliver all records queued on `tree`. Returns the number of batches sent.
    pub fn dispatch(&mut self, tree: &mut ContentTree) -> usize {
        let records = tree.take_records();
        if records.is_empty() {
            return 0;
        }
        let tree: &ContentTree = tree;
        let mut sent = 0;
        self.subscribers.retain(|sub| {
            let batch: Vec<MutationRecord> = records
                .iter()
                .filter(|record| tree.contains(sub.observed, record.target))
                .cloned()
                .collect();
            if batch.is_empty() {
                return true;
            }
            let batch = MutationBatch {
                observed: sub.observed,
                records: batch,
            };
            match sub.tx.send(batch) {
                Ok(()) => {
                    sent += 1;
                    true
                }
                Err(_) => {
                    log::debug!(target: "bus.dispatch", "pruning closed subscription {}", sub.id);
                    false
                }
            }
        });
        log::trace!(
            target: "bus.dispatch",
            "dispatched {} records in {sent} batches",
            records.len()
        );
        sent
    }
}

impl Default for MutationBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::MutationBus;
    use tree::{ContentTree, MutationKind, Node};

    #[test]
    fn batches_are_filtered_per_observed_subtree() {
        let mut tree = ContentTree::new();
        let doc = tree.document();
        let left = tree
            .insert_tree(doc, &Node::element("div", vec![Node::text("l")]))
            .unwrap();
        let right = tree
            .insert_tree(doc, &Node::element("div", vec![Node::text("r")]))
            .unwrap();
        tree.take_records();

        let mut bus = MutationBus::new();
        let left_sub = bus.subscribe(left);
        let right_sub = bus.subscribe(right);

        let left_leaf = tree.children(left)[0];
        tree.set_text(left_leaf, "changed").unwrap();
        assert_eq!(bus.dispatch(&mut tree), 1);

        let batch = left_sub.try_next().expect("left batch");
        assert_eq!(batch.records.len(), 1);
        assert_eq!(batch.records[0].kind, MutationKind::CharacterData);
        assert!(right_sub.try_next().is_none());
    }

    #[test]
    fn dropped_subscriptions_are_pruned() {
        let mut tree = ContentTree::new();
        let doc = tree.document();
        let mut bus = MutationBus::new();
        let sub = bus.subscribe(doc);
        drop(sub);
        tree.insert_tree(doc, &Node::text("x")).unwrap();
        assert_eq!(bus.dispatch(&mut tree), 0);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn dispatch_without_records_is_a_no_op() {
        let mut tree = ContentTree::new();
        let mut bus = MutationBus::new();
        let sub = bus.subscribe(tree.document());
        assert_eq!(bus.dispatch(&mut tree), 0);
        assert!(sub.drain().is_empty());
        assert!(bus.unsubscribe(sub.id()));
        assert!(!bus.unsubscribe(sub.id()));
    }
}
