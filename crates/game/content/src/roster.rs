//! The monster roster: every template a team can be drawn from.

use std::collections::HashSet;

use match_core::{Element, MonsterTemplate};

/// Structural problems in a roster definition.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RosterError {
    #[error("roster is empty")]
    Empty,

    #[error("species id {0} appears more than once")]
    DuplicateSpecies(u32),

    #[error("{species} evolves into unknown species {target}")]
    UnknownEvolution { species: String, target: u32 },

    #[error("{species} evolves into a form of a different element")]
    EvolutionElementMismatch { species: String },

    #[error("{species} has an ability that costs no mana")]
    ZeroManaCost { species: String },
}

/// Validated, ordered collection of monster templates.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Roster {
    templates: Vec<MonsterTemplate>,
}

impl Roster {
    pub fn new(templates: Vec<MonsterTemplate>) -> Result<Self, RosterError> {
        if templates.is_empty() {
            return Err(RosterError::Empty);
        }

        let mut ids = HashSet::new();
        for template in &templates {
            if !ids.insert(template.species_id) {
                return Err(RosterError::DuplicateSpecies(template.species_id));
            }
            if template.base_stats.mana_cost == 0 {
                return Err(RosterError::ZeroManaCost {
                    species: template.name.clone(),
                });
            }
        }

        for template in &templates {
            let Some(target) = template
                .evolution
                .as_ref()
                .and_then(|evolution| evolution.species_id)
            else {
                continue;
            };
            let evolved = templates
                .iter()
                .find(|t| t.species_id == target)
                .ok_or_else(|| RosterError::UnknownEvolution {
                    species: template.name.clone(),
                    target,
                })?;
            if evolved.element != template.element {
                return Err(RosterError::EvolutionElementMismatch {
                    species: template.name.clone(),
                });
            }
        }

        Ok(Self { templates })
    }

    /// The roster shipped with the crate.
    #[cfg(feature = "loaders")]
    pub fn builtin() -> crate::loaders::LoadResult<Self> {
        crate::loaders::RosterLoader::parse(include_str!("../data/monsters.ron"))
    }

    pub fn templates(&self) -> &[MonsterTemplate] {
        &self.templates
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn get(&self, species_id: u32) -> Option<&MonsterTemplate> {
        self.templates.iter().find(|t| t.species_id == species_id)
    }

    pub fn by_name(&self, name: &str) -> Option<&MonsterTemplate> {
        self.templates
            .iter()
            .find(|t| t.name.eq_ignore_ascii_case(name))
    }

    pub fn by_element(&self, element: Element) -> impl Iterator<Item = &MonsterTemplate> {
        self.templates.iter().filter(move |t| t.element == element)
    }

    /// Forms that can still evolve.
    pub fn base_forms(&self) -> impl Iterator<Item = &MonsterTemplate> {
        self.templates.iter().filter(|t| t.evolution.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use match_core::{Ability, AbilityEffect, CombatStats, EvolutionDescriptor};

    fn template(id: u32, element: Element, evolves_to: Option<u32>) -> MonsterTemplate {
        MonsterTemplate {
            species_id: id,
            name: format!("mon{id}"),
            element,
            base_stats: CombatStats::new(20, 5, 5, 5),
            ability: Ability {
                name: "Poke".into(),
                damage: 5,
                effect: AbilityEffect::MatchCross,
            },
            evolution: evolves_to.map(|target| EvolutionDescriptor {
                name: format!("mon{target}"),
                species_id: Some(target),
                stat_boosts: Default::default(),
                ability_boost: Default::default(),
            }),
        }
    }

    #[test]
    fn rejects_duplicate_ids() {
        let result = Roster::new(vec![
            template(1, Element::Fire, None),
            template(1, Element::Water, None),
        ]);
        assert_eq!(result, Err(RosterError::DuplicateSpecies(1)));
    }

    #[test]
    fn rejects_free_abilities() {
        let mut free = template(2, Element::Water, None);
        free.base_stats.mana_cost = 0;
        let result = Roster::new(vec![template(1, Element::Fire, None), free]);
        assert_eq!(
            result,
            Err(RosterError::ZeroManaCost {
                species: "mon2".into()
            })
        );
    }

    #[test]
    fn evolution_must_point_at_same_element() {
        let dangling = Roster::new(vec![template(1, Element::Fire, Some(9))]);
        assert!(matches!(
            dangling,
            Err(RosterError::UnknownEvolution { target: 9, .. })
        ));

        let mixed = Roster::new(vec![
            template(1, Element::Fire, Some(2)),
            template(2, Element::Water, None),
        ]);
        assert!(matches!(
            mixed,
            Err(RosterError::EvolutionElementMismatch { .. })
        ));
    }

    #[test]
    fn lookups() {
        let roster = Roster::new(vec![
            template(1, Element::Fire, Some(2)),
            template(2, Element::Fire, None),
            template(3, Element::Earth, None),
        ])
        .unwrap();
        assert_eq!(roster.get(3).map(|t| t.element), Some(Element::Earth));
        assert_eq!(roster.by_name("MON2").map(|t| t.species_id), Some(2));
        assert_eq!(roster.by_element(Element::Fire).count(), 2);
        assert_eq!(roster.base_forms().count(), 1);
    }
}
