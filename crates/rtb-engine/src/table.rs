//! Variant lookup: which machine to build for a battle.

use std::collections::HashMap;
use std::fmt;

use rtb_session::Role;

use crate::variants::{PenXGuest, PenXHost, Talis};
use crate::{EngineConfig, EngineError, Exchange, Initiator, Peripherals, Responder, Scan, Status};

/// A running battle machine, whatever its role and game.
pub trait Battle: Send {
    /// Advances the machine by one step.
    fn tick(&mut self) -> Result<(), EngineError>;

    /// The last reported status.
    fn status(&self) -> Status;

    /// Reports the current status as changed.
    fn announce_status(&mut self);
}

impl<S: Scan> Battle for Initiator<S> {
    fn tick(&mut self) -> Result<(), EngineError> {
        Initiator::tick(self)
    }

    fn status(&self) -> Status {
        self.core().status()
    }

    fn announce_status(&mut self) {
        self.core_mut().announce_status();
    }
}

impl<X: Exchange> Battle for Responder<X> {
    fn tick(&mut self) -> Result<(), EngineError> {
        Responder::tick(self)
    }

    fn status(&self) -> Status {
        self.core().status()
    }

    fn announce_status(&mut self) {
        self.core_mut().announce_status();
    }
}

/// Game identifiers the app sends as `battle_type`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BattleKind {
    /// `"legendz"`
    Legendz,
    /// `"digimon-penx-battle"`
    PenXBattle,
    /// Anything else.
    Unknown(String),
}

impl BattleKind {
    pub fn from_wire(battle_type: &str) -> Self {
        match battle_type {
            "legendz" => Self::Legendz,
            "digimon-penx-battle" => Self::PenXBattle,
            other => Self::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Legendz => "legendz",
            Self::PenXBattle => "digimon-penx-battle",
            Self::Unknown(name) => name,
        }
    }
}

impl fmt::Display for BattleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

type Constructor = Box<dyn Fn(Peripherals, &EngineConfig) -> Box<dyn Battle> + Send + Sync>;

/// Maps `(battle type, role)` to a machine constructor.
///
/// [`VariantTable::standard`] holds the four built-in entries; more can
/// be added with [`register`](Self::register).
pub struct VariantTable {
    entries: HashMap<(BattleKind, Role), Constructor>,
}

impl VariantTable {
    /// An empty table.
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Legendz and PenX, both roles.
    pub fn standard() -> Self {
        let mut table = Self::new();
        table.register(BattleKind::Legendz, Role::Host, |io, config| {
            Box::new(Initiator::new(Talis::host(), io, config))
        });
        table.register(BattleKind::Legendz, Role::Guest, |io, config| {
            Box::new(Initiator::new(Talis::guest(), io, config))
        });
        table.register(BattleKind::PenXBattle, Role::Host, |io, config| {
            Box::new(Initiator::new(PenXHost, io, config))
        });
        table.register(BattleKind::PenXBattle, Role::Guest, |io, config| {
            Box::new(Responder::new(PenXGuest, io, config))
        });
        table
    }

    /// Adds or replaces the constructor for `(kind, role)`.
    ///
    /// `BattleKind::Unknown` entries are accepted but never looked up.
    pub fn register<F>(&mut self, kind: BattleKind, role: Role, constructor: F)
    where
        F: Fn(Peripherals, &EngineConfig) -> Box<dyn Battle> + Send + Sync + 'static,
    {
        self.entries.insert((kind, role), Box::new(constructor));
    }

    /// Whether a machine exists for this pair.
    pub fn supports(&self, battle_type: &str, role: Role) -> bool {
        match BattleKind::from_wire(battle_type) {
            BattleKind::Unknown(_) => false,
            kind => self.entries.contains_key(&(kind, role)),
        }
    }

    /// Builds the machine for `battle_type` and `role`.
    ///
    /// # Errors
    /// [`EngineError::UnrecognizedVariant`] when the pair is unknown;
    /// nothing is constructed and `io` is dropped.
    pub fn build(
        &self,
        battle_type: &str,
        role: Role,
        io: Peripherals,
        config: &EngineConfig,
    ) -> Result<Box<dyn Battle>, EngineError> {
        let unrecognized = || EngineError::UnrecognizedVariant {
            battle_type: battle_type.to_string(),
            role,
        };
        let constructor = match BattleKind::from_wire(battle_type) {
            BattleKind::Unknown(_) => return Err(unrecognized()),
            kind => self.entries.get(&(kind, role)).ok_or_else(unrecognized)?,
        };
        tracing::debug!(battle_type, %role, "building battle machine");
        Ok(constructor(io, config))
    }
}

impl Default for VariantTable {
    fn default() -> Self {
        Self::standard()
    }
}
