/// Combat stat block of a monster.
///
/// `mana_cost` doubles as mana capacity: the ability fires once the pool is full.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CombatStats {
    pub hp: u32,
    pub attack: u32,
    pub defense: u32,
    pub mana_cost: u32,
}

impl CombatStats {
    pub const fn new(hp: u32, attack: u32, defense: u32, mana_cost: u32) -> Self {
        Self {
            hp,
            attack,
            defense,
            mana_cost,
        }
    }

    /// Field-wise sum.
    pub fn boosted(&self, boosts: &StatBoosts) -> Self {
        Self {
            hp: self.hp + boosts.hp,
            attack: self.attack + boosts.attack,
            defense: self.defense + boosts.defense,
            mana_cost: self.mana_cost + boosts.mana_cost,
        }
    }

    pub fn get(&self, stat: Stat) -> u32 {
        match stat {
            Stat::Attack => self.attack,
            Stat::Defense => self.defense,
        }
    }

    pub fn get_mut(&mut self, stat: Stat) -> &mut u32 {
        match stat {
            Stat::Attack => &mut self.attack,
            Stat::Defense => &mut self.defense,
        }
    }
}

/// Additive stat increases applied on evolution. Missing fields are zero.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct StatBoosts {
    pub hp: u32,
    pub attack: u32,
    pub defense: u32,
    pub mana_cost: u32,
}

/// Stats that buffs and debuffs can modify.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[strum(serialize_all = "snake_case")]
pub enum Stat {
    Attack,
    Defense,
}
