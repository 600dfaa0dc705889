//! Damage model.
//!
//! `damage = (base + jitter) * ceil(atkHP/10) * (100 - stars * ceil(defHP/10)) / 1000`
//! evaluated in integers, which floors the same way the fractional form does.
//! Direct units trade blows; anything involving an indirect unit is one-way.

use rand::{Rng, RngCore};

use super::board::Unit;
use super::catalog::UnitCatalog;
use super::terrain::TerrainType;

/// Source of the random damage bonus, drawn from `0..span`.
pub trait JitterSource {
    fn jitter(&mut self, span: u32) -> u32;
}

impl<R: RngCore> JitterSource for R {
    fn jitter(&mut self, span: u32) -> u32 {
        if span == 0 {
            0
        } else {
            self.gen_range(0..span)
        }
    }
}

/// Always returns the same bonus (clamped into the span).
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedJitter(pub u32);

impl JitterSource for FixedJitter {
    fn jitter(&mut self, span: u32) -> u32 {
        self.0.min(span.saturating_sub(1))
    }
}

/// Replays a fixed list of bonuses, then repeats the last one.
#[derive(Debug, Clone, Default)]
pub struct SequenceJitter {
    values: Vec<u32>,
    next: usize,
}

impl SequenceJitter {
    pub fn new(values: Vec<u32>) -> Self {
        Self { values, next: 0 }
    }
}

impl JitterSource for SequenceJitter {
    fn jitter(&mut self, span: u32) -> u32 {
        let value = match self.values.get(self.next) {
            Some(v) => *v,
            None => self.values.last().copied().unwrap_or(0),
        };
        self.next += 1;
        value.min(span.saturating_sub(1))
    }
}

/// A unit together with the terrain it fights from.
#[derive(Debug, Clone, Copy)]
pub struct Combatant<'a> {
    pub unit: &'a Unit,
    pub terrain: TerrainType,
}

/// Outcome of one attack, with HP after all damage is applied. Damage
/// figures count HP actually lost, so overkill is not reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Exchange {
    pub damage_dealt: u32,
    pub damage_taken: u32,
    pub attacker_hp: u32,
    pub defender_hp: u32,
    /// Whether the defender fired back (and spent ammo).
    pub retaliated: bool,
}

/// Damage `attacker_hp` worth of `attacker` deals to `defender`.
pub fn damage(
    catalog: &UnitCatalog,
    attacker: &Unit,
    attacker_hp: u32,
    defender: &Unit,
    defender_hp: u32,
    defender_terrain: TerrainType,
    jitter: u32,
) -> u32 {
    let base = catalog.base_power(attacker.unit_type, defender.unit_type);
    if base == 0 {
        return 0;
    }
    let attack = u64::from(base + jitter);
    let atk_hp = u64::from(attacker_hp.div_ceil(10));
    let def_hp = u64::from(defender_hp.div_ceil(10));
    let stars = u64::from(defender_terrain.defense_stars());
    let defense = 100u64.saturating_sub(stars * def_hp);
    (attack * atk_hp * defense / 1000) as u32
}

fn exchange(
    catalog: &UnitCatalog,
    attacker: Combatant<'_>,
    defender: Combatant<'_>,
    mut roll: impl FnMut() -> u32,
) -> Exchange {
    let atk = attacker.unit;
    let def = defender.unit;

    let dealt = damage(
        catalog,
        atk,
        atk.status.hp,
        def,
        def.status.hp,
        defender.terrain,
        roll(),
    );
    let defender_hp = def.status.hp.saturating_sub(dealt);

    let both_direct = catalog.get(atk.unit_type).is_direct() && catalog.get(def.unit_type).is_direct();
    let retaliated = both_direct
        && defender_hp >= 1
        && def.status.ammo >= 1
        && catalog.base_power(def.unit_type, atk.unit_type) > 0;

    let taken = if retaliated {
        damage(
            catalog,
            def,
            defender_hp,
            atk,
            atk.status.hp,
            attacker.terrain,
            roll(),
        )
    } else {
        0
    };

    let attacker_hp = atk.status.hp.saturating_sub(taken);
    Exchange {
        damage_dealt: def.status.hp - defender_hp,
        damage_taken: atk.status.hp - attacker_hp,
        attacker_hp,
        defender_hp,
        retaliated,
    }
}

/// Resolve an attack with random jitter. Legality is checked by the caller.
pub fn resolve<J: JitterSource + ?Sized>(
    catalog: &UnitCatalog,
    attacker: Combatant<'_>,
    defender: Combatant<'_>,
    jitter: &mut J,
    span: u32,
) -> Exchange {
    exchange(catalog, attacker, defender, || jitter.jitter(span))
}

/// Guaranteed minimum outcome: the same exchange with zero jitter.
pub fn estimate(catalog: &UnitCatalog, attacker: Combatant<'_>, defender: Combatant<'_>) -> Exchange {
    exchange(catalog, attacker, defender, || 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::board::Faction;
    use crate::state::catalog::UnitType;
    use pretty_assertions::assert_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn unit(faction: Faction, ty: UnitType, hp: u32) -> Unit {
        let catalog = UnitCatalog::standard();
        let mut u = Unit::new(faction, ty, catalog.get(ty));
        u.status.hp = hp;
        u
    }

    fn on(unit: &Unit, terrain: TerrainType) -> Combatant<'_> {
        Combatant { unit, terrain }
    }

    #[test]
    fn test_damage_formula() {
        let catalog = UnitCatalog::standard();
        let tank = unit(Faction::Red, UnitType::Tank, 100);
        let inf = unit(Faction::Blue, UnitType::Infantry, 100);

        // 75 * 10 * (100 - 1 * 10) / 1000
        assert_eq!(damage(&catalog, &tank, 100, &inf, 100, TerrainType::Plain, 0), 67);
        // Half-strength attacker, road gives no cover.
        assert_eq!(damage(&catalog, &tank, 45, &inf, 100, TerrainType::Road, 5), 40);
        // Mountain: 4 stars.
        assert_eq!(damage(&catalog, &tank, 100, &inf, 100, TerrainType::Mountain, 0), 45);
    }

    #[test]
    fn test_zero_base_power_deals_nothing() {
        let catalog = UnitCatalog::standard();
        let apc = unit(Faction::Red, UnitType::Apc, 100);
        let inf = unit(Faction::Blue, UnitType::Infantry, 100);
        assert_eq!(damage(&catalog, &apc, 100, &inf, 100, TerrainType::Road, 9), 0);
    }

    #[test]
    fn test_direct_exchange_retaliates() {
        let catalog = UnitCatalog::standard();
        let tank = unit(Faction::Red, UnitType::Tank, 100);
        let inf = unit(Faction::Blue, UnitType::Infantry, 100);

        let result = estimate(&catalog, on(&tank, TerrainType::Plain), on(&inf, TerrainType::Plain));
        assert_eq!(
            result,
            Exchange {
                damage_dealt: 67,
                damage_taken: 1,
                attacker_hp: 99,
                defender_hp: 33,
                retaliated: true,
            }
        );
    }

    #[test]
    fn test_indirect_is_one_way() {
        let catalog = UnitCatalog::standard();
        let artillery = unit(Faction::Red, UnitType::Artillery, 100);
        let tank = unit(Faction::Blue, UnitType::Tank, 100);

        let result = estimate(&catalog, on(&artillery, TerrainType::Plain), on(&tank, TerrainType::Plain));
        assert!(!result.retaliated);
        assert_eq!(result.attacker_hp, 100);

        let result = estimate(&catalog, on(&tank, TerrainType::Plain), on(&artillery, TerrainType::Plain));
        assert!(!result.retaliated);
        assert_eq!(result.attacker_hp, 100);
    }

    #[test]
    fn test_no_retaliation_without_ammo() {
        let catalog = UnitCatalog::standard();
        let tank = unit(Faction::Red, UnitType::Tank, 100);
        let mut inf = unit(Faction::Blue, UnitType::Infantry, 100);
        inf.status.ammo = 0;

        let result = estimate(&catalog, on(&tank, TerrainType::Plain), on(&inf, TerrainType::Plain));
        assert!(!result.retaliated);
        assert_eq!(result.damage_taken, 0);
    }

    #[test]
    fn test_lethal_hit_clamps_to_zero() {
        let catalog = UnitCatalog::standard();
        let mega = unit(Faction::Red, UnitType::MegaTank, 100);
        let inf = unit(Faction::Blue, UnitType::Infantry, 20);

        let result = resolve(
            &catalog,
            on(&mega, TerrainType::Plain),
            on(&inf, TerrainType::Road),
            &mut FixedJitter(9),
            10,
        );
        assert_eq!(result.defender_hp, 0);
        assert_eq!(result.damage_dealt, 20);
        assert!(!result.retaliated);
    }

    #[test]
    fn test_lethal_retaliation_reports_hp_lost() {
        let catalog = UnitCatalog::standard();
        let inf = unit(Faction::Red, UnitType::Infantry, 5);
        let mega = unit(Faction::Blue, UnitType::MegaTank, 100);

        let result = estimate(&catalog, on(&inf, TerrainType::Plain), on(&mega, TerrainType::Plain));
        assert!(result.retaliated);
        assert_eq!(result.attacker_hp, 0);
        assert_eq!(result.damage_taken, 5);
        assert_eq!(result.defender_hp + result.damage_dealt, 100);
    }

    #[test]
    fn test_sequence_jitter_replays() {
        let mut jitter = SequenceJitter::new(vec![3, 12, 7]);
        assert_eq!(jitter.jitter(10), 3);
        assert_eq!(jitter.jitter(10), 9);
        assert_eq!(jitter.jitter(10), 7);
        assert_eq!(jitter.jitter(10), 7);
    }

    #[test]
    fn test_seeded_rng_stays_in_span() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..100 {
            assert!(rng.jitter(10) < 10);
        }
        assert_eq!(rng.jitter(0), 0);
    }

    use proptest::prelude::*;

    fn unit_type() -> impl Strategy<Value = UnitType> {
        proptest::sample::select(UnitType::ALL.to_vec())
    }

    proptest! {
        #[test]
        fn prop_exchange_hp_stays_bounded(
            atk_type in unit_type(),
            def_type in unit_type(),
            atk_hp in 1..=100u32,
            def_hp in 1..=100u32,
            seed in any::<u64>()
        ) {
            let catalog = UnitCatalog::standard();
            let attacker = unit(Faction::Red, atk_type, atk_hp);
            let defender = unit(Faction::Blue, def_type, def_hp);
            let mut rng = ChaCha8Rng::seed_from_u64(seed);

            let result = resolve(
                &catalog,
                on(&attacker, TerrainType::Plain),
                on(&defender, TerrainType::Wood),
                &mut rng,
                10,
            );
            prop_assert!(result.attacker_hp <= atk_hp);
            prop_assert!(result.defender_hp <= def_hp);
            prop_assert!(result.defender_hp <= 100 && result.attacker_hp <= 100);
            prop_assert_eq!(result.damage_dealt, def_hp - result.defender_hp);
            prop_assert_eq!(result.damage_taken, atk_hp - result.attacker_hp);
            if result.defender_hp == 0 {
                prop_assert!(!result.retaliated);
            }
        }
    }
}
