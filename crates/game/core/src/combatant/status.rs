//! Timed status effects carried by a combatant.

use arrayvec::ArrayVec;

use super::stats::{CombatStats, Stat};
use super::CombatantId;
use crate::config::GameConfig;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StatusKind {
    DamageOverTime { damage: u32 },
    HealOverTime { amount: u32 },
    ExtraMove { moves: u8 },
    Buff { stat: Stat, amount: u32 },
    Debuff { stat: Stat, amount: u32 },
}

/// An applied effect instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StatusEffect {
    pub kind: StatusKind,
    pub turns_remaining: u8,
    pub source: Option<CombatantId>,
}

impl StatusEffect {
    pub const fn new(kind: StatusKind, duration: u8, source: Option<CombatantId>) -> Self {
        Self {
            kind,
            turns_remaining: duration,
            source,
        }
    }
}

/// A tick of one status effect at turn start.
///
/// `value` is the per-tick quantity: damage dealt after defense, HP healed,
/// moves granted, or the stat delta for buffs and debuffs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProcessedEffect {
    pub kind: StatusKind,
    pub value: u32,
    pub turns_remaining: u8,
}

impl ProcessedEffect {
    pub const fn expired(&self) -> bool {
        self.turns_remaining == 0
    }
}

/// Ordered effect list with a fixed upper bound.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StatusEffects {
    effects: ArrayVec<StatusEffect, { GameConfig::MAX_STATUS_EFFECTS }>,
}

impl StatusEffects {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `effect`. Zero-duration effects and overflow are dropped.
    pub fn push(&mut self, effect: StatusEffect) -> bool {
        if effect.turns_remaining == 0 {
            return false;
        }
        self.effects.try_push(effect).is_ok()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StatusEffect> {
        self.effects.iter()
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    /// Decrements every effect, reports each tick through `tick`, and drops
    /// the ones that reach zero.
    pub fn tick(&mut self, mut tick: impl FnMut(&StatusEffect)) {
        self.effects.retain(|effect| {
            effect.turns_remaining = effect.turns_remaining.saturating_sub(1);
            tick(&*effect);
            effect.turns_remaining > 0
        });
    }

    /// `base` with active buffs and debuffs applied.
    pub fn modify(&self, base: CombatStats) -> CombatStats {
        let mut stats = base;
        for effect in &self.effects {
            match effect.kind {
                StatusKind::Buff { stat, amount } => {
                    let value = stats.get_mut(stat);
                    *value = value.saturating_add(amount);
                }
                StatusKind::Debuff { stat, amount } => {
                    let value = stats.get_mut(stat);
                    *value = value.saturating_sub(amount);
                }
                _ => {}
            }
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dot(turns: u8) -> StatusEffect {
        StatusEffect::new(StatusKind::DamageOverTime { damage: 3 }, turns, None)
    }

    #[test]
    fn tick_drops_expired_effects() {
        let mut effects = StatusEffects::new();
        effects.push(dot(1));
        effects.push(dot(2));
        let mut ticks = 0;
        effects.tick(|_| ticks += 1);
        assert_eq!(ticks, 2);
        assert_eq!(effects.len(), 1);
        assert_eq!(effects.iter().next().map(|e| e.turns_remaining), Some(1));
        effects.tick(|_| {});
        assert!(effects.is_empty());
    }

    #[test]
    fn push_rejects_overflow_and_zero_duration() {
        let mut effects = StatusEffects::new();
        assert!(!effects.push(dot(0)));
        for _ in 0..GameConfig::MAX_STATUS_EFFECTS {
            assert!(effects.push(dot(3)));
        }
        assert!(!effects.push(dot(3)));
    }

    #[test]
    fn modify_applies_buffs_and_debuffs() {
        let mut effects = StatusEffects::new();
        effects.push(StatusEffect::new(
            StatusKind::Buff {
                stat: Stat::Attack,
                amount: 4,
            },
            2,
            None,
        ));
        effects.push(StatusEffect::new(
            StatusKind::Debuff {
                stat: Stat::Defense,
                amount: 10,
            },
            2,
            None,
        ));
        let stats = effects.modify(CombatStats::new(30, 8, 6, 8));
        assert_eq!(stats.attack, 12);
        assert_eq!(stats.defense, 0);
        assert_eq!(stats.hp, 30);
    }
}
