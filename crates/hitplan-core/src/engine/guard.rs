// Chip-week short circuit.

use crate::squad::{Chip, SquadSnapshot};

/// Whether the engine may plan for this snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeDecision {
    Proceed,
    /// A chip is active; the request ends with a status-only report.
    Unsupported(Chip),
}

pub fn check_mode(snapshot: &SquadSnapshot) -> ModeDecision {
    match snapshot.active_chip {
        Some(chip) => ModeDecision::Unsupported(chip),
        None => ModeDecision::Proceed,
    }
}
