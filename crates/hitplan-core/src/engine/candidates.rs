// Candidate generation: lazy enumeration of transfer skeletons.
//
// For each transfer count c in 0..=max, every c-subset of the squad is paired
// with every position-matched c-subset of the per-position candidate lists.
// Within one position the pairing order is irrelevant to the resulting squad,
// so each position-matched selection is produced exactly once.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::MAX_TRANSFERS;
use crate::player::{Player, PlayerId, Position, ProjectionTable};
use crate::squad::{check_player_data, ResolvedSquad, SquadError};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, Error, PartialEq)]
pub enum PoolError {
    #[error("candidate pool references unknown player id {player_id}")]
    UnknownPlayer { player_id: PlayerId },

    #[error("candidate pool entry is unusable: {0}")]
    InvalidData(#[from] SquadError),
}

// ---------------------------------------------------------------------------
// Transfers
// ---------------------------------------------------------------------------

/// One sale paired with one purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Transfer {
    pub out_player_id: PlayerId,
    pub in_player_id: PlayerId,
}

/// Up to `MAX_TRANSFERS` transfers stored inline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferSet {
    items: [Transfer; MAX_TRANSFERS],
    len: usize,
}

impl Default for TransferSet {
    fn default() -> Self {
        Self::new()
    }
}

impl TransferSet {
    pub fn new() -> Self {
        Self {
            items: [Transfer {
                out_player_id: 0,
                in_player_id: 0,
            }; MAX_TRANSFERS],
            len: 0,
        }
    }

    /// Build from a slice. Returns `None` when it holds more than
    /// `MAX_TRANSFERS` entries.
    pub fn from_slice(transfers: &[Transfer]) -> Option<Self> {
        if transfers.len() > MAX_TRANSFERS {
            return None;
        }
        let mut set = Self::new();
        set.items[..transfers.len()].copy_from_slice(transfers);
        set.len = transfers.len();
        Some(set)
    }

    fn push(&mut self, transfer: Transfer) {
        self.items[self.len] = transfer;
        self.len += 1;
    }

    pub fn as_slice(&self) -> &[Transfer] {
        &self.items[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn outgoing(&self) -> impl Iterator<Item = PlayerId> + '_ {
        self.as_slice().iter().map(|t| t.out_player_id)
    }

    pub fn incoming(&self) -> impl Iterator<Item = PlayerId> + '_ {
        self.as_slice().iter().map(|t| t.in_player_id)
    }
}

/// An unscored plan: just its transfers and its place in enumeration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanSkeleton {
    /// Enumeration index; the final ordering key among equal net gains.
    pub seq: u64,
    pub transfers: TransferSet,
}

// ---------------------------------------------------------------------------
// Candidate pool
// ---------------------------------------------------------------------------

/// Incoming candidates grouped by position, best-ranked first, each list cut
/// to the configured size.
#[derive(Debug, Clone)]
pub struct CandidatePool<'a> {
    by_position: [Vec<&'a Player>; 4],
}

impl<'a> CandidatePool<'a> {
    /// Build from the ranked pool. Owned players and repeated ids are skipped
    /// (first occurrence wins); every other entry must resolve to a player
    /// with complete projections over `horizon`.
    pub fn build(
        ranked: &[PlayerId],
        projections: &'a ProjectionTable,
        squad: &ResolvedSquad<'_>,
        horizon: usize,
        per_position: usize,
    ) -> Result<Self, PoolError> {
        let owned: HashSet<PlayerId> = squad.ids().collect();
        let mut seen: HashSet<PlayerId> = HashSet::with_capacity(ranked.len());
        let mut by_position: [Vec<&'a Player>; 4] = Default::default();

        for &id in ranked {
            if owned.contains(&id) || !seen.insert(id) {
                continue;
            }
            let player = projections
                .get(id)
                .ok_or(PoolError::UnknownPlayer { player_id: id })?;
            check_player_data(player, horizon)?;

            let list = &mut by_position[player.position.index()];
            if list.len() < per_position {
                list.push(player);
            }
        }

        Ok(Self { by_position })
    }

    pub fn for_position(&self, position: Position) -> &[&'a Player] {
        &self.by_position[position.index()]
    }

    /// Total candidates across positions.
    pub fn len(&self) -> usize {
        self.by_position.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ---------------------------------------------------------------------------
// Combination stepping
// ---------------------------------------------------------------------------

/// Advance `idx` (a strictly increasing k-subset of 0..n) to the next subset
/// in lexicographic order. Returns false once the last subset has been passed;
/// `idx` is left unchanged in that case.
pub(crate) fn next_combination(idx: &mut [usize], n: usize) -> bool {
    let k = idx.len();
    if k == 0 || k > n {
        return false;
    }
    let mut i = k;
    while i > 0 {
        i -= 1;
        if idx[i] < n - k + i {
            idx[i] += 1;
            for j in i + 1..k {
                idx[j] = idx[j - 1] + 1;
            }
            return true;
        }
    }
    false
}

fn first_combination(idx: &mut Vec<usize>, k: usize) {
    idx.clear();
    idx.extend(0..k);
}

// ---------------------------------------------------------------------------
// Candidate space and generator
// ---------------------------------------------------------------------------

/// The set of skeletons a request can produce. Iterate it as many times as
/// needed; each `iter()` starts from the zero-transfer skeleton.
#[derive(Debug, Clone)]
pub struct CandidateSpace {
    squad_ids: Vec<PlayerId>,
    squad_positions: Vec<Position>,
    pool_ids: [Vec<PlayerId>; 4],
    max_transfers: usize,
}

impl CandidateSpace {
    pub fn new(squad: &ResolvedSquad<'_>, pool: &CandidatePool<'_>, max_transfers: usize) -> Self {
        let pool_ids: [Vec<PlayerId>; 4] =
            Position::ALL.map(|pos| pool.for_position(pos).iter().map(|p| p.id).collect());
        Self {
            squad_ids: squad.ids().collect(),
            squad_positions: squad.players.iter().map(|p| p.position).collect(),
            pool_ids,
            max_transfers: max_transfers.min(MAX_TRANSFERS),
        }
    }

    pub fn iter(&self) -> CandidateGenerator<'_> {
        CandidateGenerator {
            space: self,
            count: 0,
            outgoing: Vec::with_capacity(MAX_TRANSFERS),
            groups: Vec::with_capacity(MAX_TRANSFERS),
            seq: 0,
            done: false,
        }
    }
}

impl<'s> IntoIterator for &'s CandidateSpace {
    type Item = PlanSkeleton;
    type IntoIter = CandidateGenerator<'s>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Outgoing players of one position and the current choice of replacements.
#[derive(Debug, Clone)]
struct IncomingGroup {
    position: usize,
    /// Squad indices being sold.
    outgoing: Vec<usize>,
    /// Indices into the pool list for `position`.
    picks: Vec<usize>,
}

/// Lazy, finite iterator over skeletons in a fixed order: by transfer count,
/// then outgoing subset, then incoming selection.
#[derive(Debug, Clone)]
pub struct CandidateGenerator<'s> {
    space: &'s CandidateSpace,
    count: usize,
    outgoing: Vec<usize>,
    groups: Vec<IncomingGroup>,
    seq: u64,
    done: bool,
}

impl CandidateGenerator<'_> {
    fn emit(&self) -> PlanSkeleton {
        let space = self.space;
        let mut transfers = TransferSet::new();
        for group in &self.groups {
            let pool = &space.pool_ids[group.position];
            for (&sq_idx, &pick) in group.outgoing.iter().zip(&group.picks) {
                transfers.push(Transfer {
                    out_player_id: space.squad_ids[sq_idx],
                    in_player_id: pool[pick],
                });
            }
        }
        PlanSkeleton {
            seq: self.seq,
            transfers,
        }
    }

    /// Step the incoming selection like an odometer, last group fastest.
    fn advance_incoming(&mut self) -> bool {
        let space = self.space;
        for group in self.groups.iter_mut().rev() {
            let n = space.pool_ids[group.position].len();
            if next_combination(&mut group.picks, n) {
                return true;
            }
            let k = group.picks.len();
            first_combination(&mut group.picks, k);
        }
        false
    }

    /// Group the current outgoing subset by position and select the first
    /// replacement for each group. False if some position lacks candidates.
    fn reset_incoming(&mut self) -> bool {
        self.groups.clear();
        for pos in Position::ALL {
            let outgoing: Vec<usize> = self
                .outgoing
                .iter()
                .copied()
                .filter(|&i| self.space.squad_positions[i] == pos)
                .collect();
            if outgoing.is_empty() {
                continue;
            }
            let available = self.space.pool_ids[pos.index()].len();
            if outgoing.len() > available {
                return false;
            }
            let mut picks = Vec::with_capacity(outgoing.len());
            first_combination(&mut picks, outgoing.len());
            self.groups.push(IncomingGroup {
                position: pos.index(),
                outgoing,
                picks,
            });
        }
        true
    }

    fn advance(&mut self) {
        if self.advance_incoming() {
            return;
        }
        let squad_len = self.space.squad_ids.len();
        loop {
            if !next_combination(&mut self.outgoing, squad_len) {
                self.count += 1;
                if self.count > self.space.max_transfers || self.count > squad_len {
                    self.done = true;
                    return;
                }
                first_combination(&mut self.outgoing, self.count);
            }
            if self.reset_incoming() {
                return;
            }
        }
    }
}

impl Iterator for CandidateGenerator<'_> {
    type Item = PlanSkeleton;

    fn next(&mut self) -> Option<PlanSkeleton> {
        if self.done {
            return None;
        }
        let skeleton = self.emit();
        self.seq += 1;
        self.advance();
        Some(skeleton)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
