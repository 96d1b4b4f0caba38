//! 死亡计算器（Death Calculator）：纯函数，按顺序组合六条规则计算死亡座位
//! 集合。顺序很重要——后面的规则会读取前面规则的结果。

use crate::role::{registry, RoleId};
use crate::state::{GameState, NightResults, Seat};
use crate::wolf_vote::resolve_wolf_kill_target;
use std::collections::HashSet;

/// 角色-座位映射：扫描玩家，应用座位互换得到每个角色的"生效座位"，并收集
/// 标志驱动的座位集合。互换只影响身份/死亡归属判定，机械狼伪装不参与。
#[derive(Debug, Clone, Default)]
pub struct RoleSeatMap {
    pub guard_seat: Option<Seat>,
    pub witch_seat: Option<Seat>,
    pub wolf_queen_seat: Option<Seat>,
    pub dreamcatcher_seat: Option<Seat>,
    pub poison_immune_seats: HashSet<Seat>,
    pub reflects_damage_seats: HashSet<Seat>,
}

fn swap_only_role_at(state: &GameState, seat: Seat) -> Option<RoleId> {
    let effective_seat = match state.current_night_results.swapped_seats {
        Some((a, b)) if seat == a => b,
        Some((a, b)) if seat == b => a,
        _ => seat,
    };
    state.role_at(effective_seat)
}

pub fn build_role_seat_map(state: &GameState) -> RoleSeatMap {
    let reg = registry();
    let mut map = RoleSeatMap::default();
    for seat in 0..state.seat_count() {
        let Some(role_id) = swap_only_role_at(state, seat) else {
            continue;
        };
        let Some(role) = reg.get(&role_id) else { continue };
        match role_id {
            RoleId::Guard => map.guard_seat = Some(seat),
            RoleId::Witch => map.witch_seat = Some(seat),
            RoleId::WolfQueen => map.wolf_queen_seat = Some(seat),
            RoleId::Dreamcatcher => map.dreamcatcher_seat = Some(seat),
            _ => {}
        }
        if role.flags.immune_to_poison {
            map.poison_immune_seats.insert(seat);
        }
        if role.flags.reflects_damage {
            map.reflects_damage_seats.insert(seat);
        }
    }
    map
}

/// Rule 5（反伤）所需的查验/投毒上下文，由调用方（reducer 可见 reveal
/// 槽位）收集后传入，`calculate_deaths` 据此在规则 6（魔术师交换）之前应用
/// 反伤,保持 §4.8 文档顺序("规则按顺序应用,后面的规则读取前面规则的结
/// 果")。
#[derive(Debug, Clone, Default)]
pub struct ReflectionContext {
    pub seer_checked_reflector: Option<Seat>,
    pub seer_seat: Option<Seat>,
    pub witch_poisoned_reflector: bool,
    pub witch_seat: Option<Seat>,
}

/// 计算本夜死亡座位集合（升序）。
pub fn calculate_deaths(
    results: &NightResults,
    wolf_kill_disabled: bool,
    nightmare_blocked_seat: Option<Seat>,
    seat_map: &RoleSeatMap,
    reflection: &ReflectionContext,
) -> Vec<Seat> {
    let mut deaths: HashSet<Seat> = HashSet::new();

    // Rule 1: wolf kill, with guard/witch nullification by nightmare block.
    let wolf_kill_seat = if wolf_kill_disabled {
        None
    } else {
        resolve_wolf_kill_target(&results.wolf_votes_by_seat)
    };
    if let Some(kill_target) = wolf_kill_seat {
        let guard_nullified = map_matches(seat_map.guard_seat, nightmare_blocked_seat);
        let witch_nullified = map_matches(seat_map.witch_seat, nightmare_blocked_seat);

        let is_guarded = !guard_nullified && results.guarded_seat == Some(kill_target);
        let is_saved = !witch_nullified && results.saved_seat == Some(kill_target);

        let dies = (is_saved && is_guarded) || (!is_saved && !is_guarded);
        if dies {
            deaths.insert(kill_target);
        }
    }

    // Rule 2: witch poison.
    let witch_blocked = map_matches(seat_map.witch_seat, nightmare_blocked_seat);
    if !witch_blocked {
        if let Some(poisoned) = results.poisoned_seat {
            if !seat_map.poison_immune_seats.contains(&poisoned) {
                deaths.insert(poisoned);
            }
        }
    }

    // Rule 3: wolf queen link.
    if let Some(queen_seat) = seat_map.wolf_queen_seat {
        if deaths.contains(&queen_seat) {
            if let Some(charmed) = results.charmed_seat {
                deaths.insert(charmed);
            }
        }
    }

    // Rule 4: dreamcatcher always protects the dream target; dies together if
    // the dreamcatcher itself died.
    if let Some(dream_target) = results.dream_target_seat {
        deaths.remove(&dream_target);
        if let Some(dreamcatcher_seat) = seat_map.dreamcatcher_seat {
            if deaths.contains(&dreamcatcher_seat) {
                deaths.insert(dream_target);
            }
        }
    }

    // Rule 5: reflection. Seer checking a reflector kills the seer; witch
    // poisoning a reflector (while witch is unblocked) kills the witch.
    // Must run before rule 6 so a swapped seer/witch seat still reflects off
    // its own death before identity follows the swap.
    if reflection.seer_checked_reflector.is_some() {
        if let Some(seat) = reflection.seer_seat {
            deaths.insert(seat);
        }
    }
    if reflection.witch_poisoned_reflector {
        if let Some(seat) = reflection.witch_seat {
            deaths.insert(seat);
        }
    }

    // Rule 6: magician swap — if exactly one of the swapped pair died,
    // death follows the role rather than the seat.
    if let Some((a, b)) = results.swapped_seats {
        let a_dead = deaths.contains(&a);
        let b_dead = deaths.contains(&b);
        if a_dead != b_dead {
            deaths.remove(&a);
            deaths.remove(&b);
            if a_dead {
                deaths.insert(b);
            } else {
                deaths.insert(a);
            }
        }
    }

    let mut sorted: Vec<Seat> = deaths.into_iter().collect();
    sorted.sort_unstable();
    sorted
}

fn map_matches(seat: Option<Seat>, other: Option<Seat>) -> bool {
    matches!((seat, other), (Some(a), Some(b)) if a == b)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn results() -> NightResults {
        NightResults::default()
    }

    #[test]
    fn guard_protects_wolf_target_peaceful_night() {
        let mut r = results();
        r.wolf_votes_by_seat.insert(0, Some(2));
        r.guarded_seat = Some(2);
        let map = RoleSeatMap {
            guard_seat: Some(1),
            ..Default::default()
        };
        let deaths = calculate_deaths(&r, false, None, &map, &ReflectionContext::default());
        assert_eq!(deaths, Vec::<Seat>::new());
    }

    #[test]
    fn witch_poison_adds_a_second_death() {
        let mut r = results();
        r.wolf_votes_by_seat.insert(0, Some(2));
        r.poisoned_seat = Some(3);
        let map = RoleSeatMap::default();
        let deaths = calculate_deaths(&r, false, None, &map, &ReflectionContext::default());
        assert_eq!(deaths, vec![2, 3]);
    }

    #[test]
    fn empty_wolf_vote_is_peaceful() {
        let mut r = results();
        r.wolf_votes_by_seat.insert(0, None);
        let map = RoleSeatMap::default();
        let deaths = calculate_deaths(&r, false, None, &map, &ReflectionContext::default());
        assert_eq!(deaths, Vec::<Seat>::new());
    }

    #[test]
    fn nightmare_blocks_guard_so_wolf_kill_succeeds() {
        let mut r = results();
        r.wolf_votes_by_seat.insert(0, Some(2));
        r.guarded_seat = Some(2);
        let map = RoleSeatMap {
            guard_seat: Some(1),
            ..Default::default()
        };
        // guard's own seat (1) is nightmare-blocked, nullifying the protect.
        let deaths = calculate_deaths(&r, false, Some(1), &map, &ReflectionContext::default());
        assert_eq!(deaths, vec![2]);
    }

    #[test]
    fn magician_swap_moves_death_to_the_other_seat() {
        let mut r = results();
        r.wolf_votes_by_seat.insert(0, Some(4));
        r.swapped_seats = Some((4, 5));
        let map = RoleSeatMap::default();
        let deaths = calculate_deaths(&r, false, None, &map, &ReflectionContext::default());
        assert_eq!(deaths, vec![5]);
    }

    #[test]
    fn reflection_applies_before_swap_so_the_checking_seer_dies_on_its_own_seat() {
        // Seer sits at seat 4, swapped with seat 5, and checked a reflector.
        // Rule 5 (reflection) must mark seat 4 dead before rule 6 (swap)
        // runs, so the swap then carries that death over to seat 5 — the
        // seer's effective seat after the swap, not its original one.
        let mut r = results();
        r.swapped_seats = Some((4, 5));
        let map = RoleSeatMap::default();
        let reflection = ReflectionContext {
            seer_checked_reflector: Some(9),
            seer_seat: Some(4),
            witch_poisoned_reflector: false,
            witch_seat: None,
        };
        let deaths = calculate_deaths(&r, false, None, &map, &reflection);
        assert_eq!(deaths, vec![5]);
    }
}
