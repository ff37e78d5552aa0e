// Player identity, positions, and per-cycle projections.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Upstream player identifier.
pub type PlayerId = u32;

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// Playing positions. Squad shape and best-11 formation rules are both
/// expressed per position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Position {
    #[serde(rename = "GKP")]
    Goalkeeper,
    #[serde(rename = "DEF")]
    Defender,
    #[serde(rename = "MID")]
    Midfielder,
    #[serde(rename = "FWD")]
    Forward,
}

impl Position {
    /// All positions in squad display order.
    pub const ALL: [Position; 4] = [
        Position::Goalkeeper,
        Position::Defender,
        Position::Midfielder,
        Position::Forward,
    ];

    /// Parse a position string into a Position enum.
    ///
    /// Accepts the upstream abbreviations ("GKP", "DEF", "MID", "FWD") and the
    /// common alternates "GK"/"GKP", "D", "M", "F"/"FW".
    pub fn from_str_pos(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "GKP" | "GK" | "G" => Some(Position::Goalkeeper),
            "DEF" | "D" => Some(Position::Defender),
            "MID" | "M" => Some(Position::Midfielder),
            "FWD" | "FW" | "F" => Some(Position::Forward),
            _ => None,
        }
    }

    pub fn display_str(&self) -> &'static str {
        match self {
            Position::Goalkeeper => "GKP",
            Position::Defender => "DEF",
            Position::Midfielder => "MID",
            Position::Forward => "FWD",
        }
    }

    /// Index into fixed-size per-position arrays.
    pub fn index(&self) -> usize {
        match self {
            Position::Goalkeeper => 0,
            Position::Defender => 1,
            Position::Midfielder => 2,
            Position::Forward => 3,
        }
    }

    /// Number of players of this position a full squad must carry.
    pub fn squad_quota(&self) -> usize {
        match self {
            Position::Goalkeeper => 2,
            Position::Defender => 5,
            Position::Midfielder => 5,
            Position::Forward => 3,
        }
    }

    /// Fewest players of this position a starting eleven may field.
    pub fn min_starters(&self) -> usize {
        match self {
            Position::Goalkeeper => 1,
            Position::Defender => 3,
            Position::Midfielder => 2,
            Position::Forward => 1,
        }
    }

    /// Most players of this position a starting eleven may field.
    pub fn max_starters(&self) -> usize {
        match self {
            Position::Goalkeeper => 1,
            Position::Defender => 5,
            Position::Midfielder => 5,
            Position::Forward => 3,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_str())
    }
}

// ---------------------------------------------------------------------------
// Player
// ---------------------------------------------------------------------------

/// Raw risk inputs produced by the feature pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RiskSignals {
    /// Recent minutes volatility, expected roughly in [0, 1].
    pub minutes_volatility: f64,
    /// Injury or news flag (anything other than "available").
    pub injury_flag: bool,
    /// Probability-like proxy of being rotated out, in [0, 1].
    pub rotation_risk: f64,
}

/// A player as supplied by the projection provider. Read-only to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub team: String,
    pub position: Position,
    /// Current market price (what it costs to buy).
    pub price: f64,
    /// What the manager would realize by selling.
    pub sale_value: f64,
    /// Projected points for cycles 1..=k relative to the target cycle.
    /// `projected_points[0]` is the target cycle itself.
    pub projected_points: Vec<f64>,
    pub risk: RiskSignals,
}

impl Player {
    /// Projected points for a 1-based cycle offset, if present.
    pub fn projection(&self, cycle: usize) -> Option<f64> {
        cycle
            .checked_sub(1)
            .and_then(|i| self.projected_points.get(i))
            .copied()
    }

    /// Whether the first `horizon` cycles are all present and finite.
    pub fn has_complete_horizon(&self, horizon: usize) -> bool {
        self.projected_points.len() >= horizon
            && self.projected_points[..horizon].iter().all(|p| p.is_finite())
    }
}

// ---------------------------------------------------------------------------
// Projection table
// ---------------------------------------------------------------------------

/// Every known player keyed by id, plus the order the provider delivered them
/// in (which doubles as the ranked order of the candidate pool).
#[derive(Debug, Clone, Default)]
pub struct ProjectionTable {
    players: HashMap<PlayerId, Player>,
    order: Vec<PlayerId>,
}

impl ProjectionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a player. Returns the previous entry when the id was already
    /// present; the existing ordering position is kept in that case.
    pub fn insert(&mut self, player: Player) -> Option<Player> {
        let id = player.id;
        let previous = self.players.insert(id, player);
        if previous.is_none() {
            self.order.push(id);
        }
        previous
    }

    pub fn get(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    pub fn contains(&self, id: PlayerId) -> bool {
        self.players.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Player ids in provider order.
    pub fn ids(&self) -> &[PlayerId] {
        &self.order
    }

    /// Players in provider order.
    pub fn iter(&self) -> impl Iterator<Item = &Player> {
        self.order.iter().filter_map(|id| self.players.get(id))
    }
}

impl FromIterator<Player> for ProjectionTable {
    fn from_iter<I: IntoIterator<Item = Player>>(iter: I) -> Self {
        let mut table = ProjectionTable::new();
        for player in iter {
            table.insert(player);
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player(id: PlayerId, points: &[f64]) -> Player {
        Player {
            id,
            name: format!("Player {id}"),
            team: "ARS".into(),
            position: Position::Midfielder,
            price: 5.0,
            sale_value: 5.0,
            projected_points: points.to_vec(),
            risk: RiskSignals::default(),
        }
    }

    #[test]
    fn position_parsing_accepts_aliases() {
        assert_eq!(Position::from_str_pos("gkp"), Some(Position::Goalkeeper));
        assert_eq!(Position::from_str_pos("GK"), Some(Position::Goalkeeper));
        assert_eq!(Position::from_str_pos(" DEF "), Some(Position::Defender));
        assert_eq!(Position::from_str_pos("FW"), Some(Position::Forward));
        assert_eq!(Position::from_str_pos("SP"), None);
    }

    #[test]
    fn position_serializes_as_abbreviation() {
        let json = serde_json::to_string(&Position::Forward).unwrap();
        assert_eq!(json, "\"FWD\"");
        let back: Position = serde_json::from_str("\"GKP\"").unwrap();
        assert_eq!(back, Position::Goalkeeper);
    }

    #[test]
    fn squad_quotas_sum_to_fifteen() {
        let total: usize = Position::ALL.iter().map(|p| p.squad_quota()).sum();
        assert_eq!(total, 15);
    }

    #[test]
    fn starter_minimums_fit_in_eleven() {
        let min: usize = Position::ALL.iter().map(|p| p.min_starters()).sum();
        assert!(min <= 11);
    }

    #[test]
    fn projection_is_one_based() {
        let p = player(1, &[2.0, 3.0, 4.0]);
        assert_eq!(p.projection(1), Some(2.0));
        assert_eq!(p.projection(3), Some(4.0));
        assert_eq!(p.projection(0), None);
        assert_eq!(p.projection(4), None);
    }

    #[test]
    fn complete_horizon_rejects_short_and_nan() {
        let short = player(1, &[2.0, 3.0]);
        assert!(short.has_complete_horizon(2));
        assert!(!short.has_complete_horizon(3));

        let nan = player(2, &[2.0, f64::NAN, 1.0]);
        assert!(nan.has_complete_horizon(1));
        assert!(!nan.has_complete_horizon(2));
    }

    #[test]
    fn table_preserves_insertion_order() {
        let table: ProjectionTable = vec![player(9, &[1.0]), player(3, &[1.0]), player(5, &[1.0])]
            .into_iter()
            .collect();
        assert_eq!(table.ids(), &[9, 3, 5]);
        assert_eq!(table.len(), 3);
        assert!(table.contains(3));
        assert!(!table.contains(4));
    }

    #[test]
    fn table_reinsert_keeps_position() {
        let mut table = ProjectionTable::new();
        table.insert(player(1, &[1.0]));
        table.insert(player(2, &[1.0]));
        let prev = table.insert(player(1, &[7.0]));
        assert!(prev.is_some());
        assert_eq!(table.ids(), &[1, 2]);
        assert_eq!(table.get(1).unwrap().projection(1), Some(7.0));
    }
}
