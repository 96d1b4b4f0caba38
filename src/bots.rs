//! 机器人兜底玩家（组件文档 §4.16）：当 `debugMode.botsEnabled` 为真时，
//! 为当前步骤里尚未行动的机器人座位挑选一个合法随机目标并提交。仅覆盖
//! `ChooseSeat`/`WolfVote` 这两类单目标 schema——女巫、魔术师、吹笛者这些
//! 复合型动作留给真人房主代为操作，机器人在这些步骤上保持静默。

use crate::handlers::{handle_action, handle_wolf_vote, role_to_schema, HandlerResult};
use crate::reducer::StateAction;
use crate::role::{schema_registry, SchemaKind};
use crate::state::{GameState, Seat};
use rand::seq::SliceRandom;
use rand::thread_rng;

fn bot_seats_pending_current_step(state: &GameState, current_step: crate::role::SchemaId) -> Vec<Seat> {
    state
        .players
        .iter()
        .flatten()
        .filter(|p| p.is_bot)
        .filter(|p| p.role.and_then(role_to_schema) == Some(current_step))
        .filter(|p| {
            !state
                .actions
                .iter()
                .any(|a| a.actor_seat == p.seat_number && a.schema_id == current_step)
        })
        .map(|p| p.seat_number)
        .collect()
}

fn random_other_seated_target(state: &GameState, actor: Seat) -> Option<Seat> {
    let mut candidates: Vec<Seat> = (0..state.seat_count())
        .filter(|seat| *seat != actor && state.player_at(*seat).is_some())
        .collect();
    candidates.shuffle(&mut thread_rng());
    candidates.first().copied()
}

/// 为当前步骤里所有待行动的机器人座位各提交一次动作，复用真实处理器的
/// 校验路径——绝不绕过约束检查。候选目标都是合法的随机座位，正常不会被
/// 拒绝；万一被拒绝也静默丢弃，留给下一轮或真人房主手动推进。
pub fn submit_bot_actions(state: &GameState, now: i64) -> Vec<StateAction> {
    if !state.debug_mode.bots_enabled {
        return Vec::new();
    }
    let Some(current_step) = state.current_step_id else {
        return Vec::new();
    };
    let schemas = schema_registry();
    let Some(schema) = schemas.get(&current_step) else {
        return Vec::new();
    };
    if !matches!(schema.kind, SchemaKind::ChooseSeat | SchemaKind::WolfVote) {
        return Vec::new();
    }

    let mut actions = Vec::new();
    for seat in bot_seats_pending_current_step(state, current_step) {
        let Some(role) = state.role_at(seat) else { continue };
        let target = random_other_seated_target(state, seat);
        let outcome: HandlerResult = if schema.kind == SchemaKind::WolfVote {
            handle_wolf_vote(state, seat, target, now)
        } else {
            handle_action(state, seat, role, target, None)
        };
        if let Ok(outcome) = outcome {
            actions.extend(outcome.actions);
        }
    }
    actions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reducer::reduce;
    use crate::role::RoleId;
    use crate::state::{GameStatus, Player};

    fn guard_state_with_bot() -> GameState {
        let mut state = GameState::new("1234".into(), "host".into(), 3);
        state.template_roles = vec![RoleId::Guard, RoleId::Villager, RoleId::Villager];
        for seat in 0..3u8 {
            state.players[seat as usize] =
                Some(Player::new(seat, format!("u{seat}"), format!("P{seat}"), None));
        }
        state.players[0].as_mut().unwrap().role = Some(RoleId::Guard);
        state.players[0].as_mut().unwrap().is_bot = true;
        state.players[1].as_mut().unwrap().role = Some(RoleId::Villager);
        state.players[2].as_mut().unwrap().role = Some(RoleId::Villager);
        state.status = GameStatus::Ongoing;
        state.current_step_index = 0;
        state.current_step_id = Some(crate::role::SchemaId::GuardProtect);
        state.debug_mode.bots_enabled = true;
        state
    }

    #[test]
    fn disabled_bots_submit_nothing() {
        let mut state = guard_state_with_bot();
        state.debug_mode.bots_enabled = false;
        assert!(submit_bot_actions(&state, 0).is_empty());
    }

    #[test]
    fn bot_submits_a_legal_target_for_its_own_step() {
        let state = guard_state_with_bot();
        let actions = submit_bot_actions(&state, 0);
        assert!(!actions.is_empty());
        let mut state = state;
        for action in actions {
            state = reduce(state, action).unwrap();
        }
        assert!(state.actions.iter().any(|a| a.actor_seat == 0));
        assert_ne!(state.current_night_results.guarded_seat, Some(0));
    }

    #[test]
    fn non_bot_seats_are_left_untouched() {
        let mut state = guard_state_with_bot();
        state.players[0].as_mut().unwrap().is_bot = false;
        assert!(submit_bot_actions(&state, 0).is_empty());
    }
}
