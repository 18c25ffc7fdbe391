//! Element affinities shared by tiles and combatants.
//!
//! Five combat elements drive mana and damage; the sixth, [`Element::Berry`],
//! is a bonus tile that feeds the evolution/boost economy and never deals damage.

// ============================================================================
// Element
// ============================================================================

/// Affinity of a tile or a combatant.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
    strum::EnumIter,
    strum::EnumCount,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Element {
    Fire,
    Water,
    Earth,
    Electric,
    Psychic,
    /// Bonus element: grants berries to every combatant of the matching player.
    Berry,
}

impl Element {
    /// Every element in declaration order.
    pub const ALL: [Element; 6] = [
        Element::Fire,
        Element::Water,
        Element::Earth,
        Element::Electric,
        Element::Psychic,
        Element::Berry,
    ];

    /// Elements a combatant can have.
    pub const COMBAT: [Element; 5] = [
        Element::Fire,
        Element::Water,
        Element::Earth,
        Element::Electric,
        Element::Psychic,
    ];

    /// Returns true for the bonus element.
    pub const fn is_bonus(self) -> bool {
        matches!(self, Element::Berry)
    }

    /// Stable index into per-element tables.
    pub const fn index(self) -> usize {
        self as usize
    }
}

// ============================================================================
// Element Counts
// ============================================================================

/// Tile counts keyed by element.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ElementCounts([u32; 6]);

impl ElementCounts {
    pub fn get(&self, element: Element) -> u32 {
        self.0[element.index()]
    }

    pub fn add(&mut self, element: Element, amount: u32) {
        self.0[element.index()] += amount;
    }

    pub fn merge(&mut self, other: &ElementCounts) {
        for element in Element::ALL {
            self.add(element, other.get(element));
        }
    }

    pub fn total(&self) -> u32 {
        self.0.iter().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Non-zero entries in element order.
    pub fn iter(&self) -> impl Iterator<Item = (Element, u32)> + '_ {
        Element::ALL
            .into_iter()
            .map(|element| (element, self.get(element)))
            .filter(|(_, count)| *count > 0)
    }
}

// ============================================================================
// Weighted Distribution
// ============================================================================

/// Spawn probability of each element for fill and refill.
///
/// Weights are configuration, not computed; [`ElementWeights::validate`] checks
/// they form a distribution.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ElementWeights {
    pub fire: f64,
    pub water: f64,
    pub earth: f64,
    pub electric: f64,
    pub psychic: f64,
    pub berry: f64,
}

impl ElementWeights {
    pub const TOLERANCE: f64 = 1e-6;

    pub const fn weight(&self, element: Element) -> f64 {
        match element {
            Element::Fire => self.fire,
            Element::Water => self.water,
            Element::Earth => self.earth,
            Element::Electric => self.electric,
            Element::Psychic => self.psychic,
            Element::Berry => self.berry,
        }
    }

    pub fn total(&self) -> f64 {
        Element::ALL.iter().map(|e| self.weight(*e)).sum()
    }

    /// Returns true when every weight is non-negative and they sum to one.
    pub fn validate(&self) -> bool {
        Element::ALL.iter().all(|e| self.weight(*e) >= 0.0)
            && (self.total() - 1.0).abs() <= Self::TOLERANCE
    }

    /// Maps a uniform roll in `[0, 1)` onto an element by cumulative weight.
    ///
    /// Rolls past the cumulative total (float drift) land on the last element
    /// with a non-zero weight.
    pub fn pick(&self, roll: f64) -> Element {
        let mut cumulative = 0.0;
        let mut last = Element::Fire;
        for element in Element::ALL {
            let weight = self.weight(element);
            if weight <= 0.0 {
                continue;
            }
            cumulative += weight;
            last = element;
            if roll < cumulative {
                return element;
            }
        }
        last
    }
}

impl Default for ElementWeights {
    fn default() -> Self {
        Self {
            fire: 0.18,
            water: 0.18,
            earth: 0.18,
            electric: 0.18,
            psychic: 0.18,
            berry: 0.10,
        }
    }
}

// ============================================================================
// Relationships
// ============================================================================

/// Strong/weak targets of one attacking element.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ElementAffinity {
    pub element: Element,
    #[cfg_attr(feature = "serde", serde(default))]
    pub strong: Vec<Element>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub weak: Vec<Element>,
}

/// Attacker-side relationship table.
///
/// The table is used exactly as configured. It is not required to be
/// reciprocal, and an element may list itself.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ElementRelationships {
    pub entries: Vec<ElementAffinity>,
}

/// Damage multiplier chosen by the relationship table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum Effectiveness {
    /// x1.5
    Strong,
    /// x1.0
    Neutral,
    /// x0.75
    Weak,
    /// Berry attackers deal nothing.
    Immune,
}

impl Effectiveness {
    /// Applies the multiplier with round-half-up, in integer arithmetic.
    pub const fn apply(self, base: u32) -> u32 {
        match self {
            Effectiveness::Strong => (base * 3 + 1) / 2,
            Effectiveness::Neutral => base,
            Effectiveness::Weak => (base * 3 + 2) / 4,
            Effectiveness::Immune => 0,
        }
    }
}

impl ElementRelationships {
    pub fn affinity(&self, attacker: Element) -> Option<&ElementAffinity> {
        self.entries.iter().find(|entry| entry.element == attacker)
    }

    /// Strong wins over weak when an element appears in both lists.
    pub fn effectiveness(&self, attacker: Element, defender: Element) -> Effectiveness {
        if attacker.is_bonus() {
            return Effectiveness::Immune;
        }
        match self.affinity(attacker) {
            Some(entry) if entry.strong.contains(&defender) => Effectiveness::Strong,
            Some(entry) if entry.weak.contains(&defender) => Effectiveness::Weak,
            _ => Effectiveness::Neutral,
        }
    }

    /// Base damage adjusted for the attacker/defender pairing.
    pub fn elemental_damage(&self, base: u32, attacker: Element, defender: Element) -> u32 {
        self.effectiveness(attacker, defender).apply(base)
    }
}

impl Default for ElementRelationships {
    fn default() -> Self {
        use Element::*;
        let entry = |element, strong, weak| ElementAffinity {
            element,
            strong: vec![strong],
            weak: vec![weak],
        };
        Self {
            entries: vec![
                entry(Fire, Earth, Water),
                entry(Water, Fire, Electric),
                entry(Earth, Electric, Fire),
                entry(Electric, Water, Earth),
                entry(Psychic, Electric, Psychic),
            ],
        }
    }
}
