//! Delivery loop for hosts that drive several instances over one tree.

use crate::watcher::Highlighter;
use bus::MutationBus;
use tree::ContentTree;

/// Upper bound on dispatch rounds per settle. A pass only produces records
/// that compare equal on the next round, so two rounds normally suffice.
pub const MAX_SETTLE_ROUNDS: usize = 16;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SettleReport {
    pub rounds: usize,
    pub passes: usize,
    /// False when the round limit was hit with work still pending.
    pub quiescent: bool,
}

/// Dispatch queued records and let every instance react until nothing new
/// is produced.
pub fn settle(
    tree: &mut ContentTree,
    bus: &mut MutationBus,
    instances: &mut [&mut Highlighter],
) -> SettleReport {
    let mut report = SettleReport::default();
    while report.rounds < MAX_SETTLE_ROUNDS {
        let delivered = bus.dispatch(tree);
        let mut passes = 0;
        for instance in instances.iter_mut() {
            passes += instance.process(tree);
        }
        report.rounds += 1;
        report.passes += passes;
        if delivered == 0 && passes == 0 && !tree.has_pending_records() {
            report.quiescent = true;
            return report;
        }
    }
    log::warn!(
        target: "highlight.host",
        "still busy after {MAX_SETTLE_ROUNDS} rounds ({} passes)",
        report.passes
    );
    report
}
