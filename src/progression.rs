//! 夜间推进驱动（Inline Progression Driver，组件文档 §4.9）：在房主显式发出
//! `ADVANCE_NIGHT`/`END_NIGHT` 之外，自动把状态推进到下一个真正需要玩家输入
//! 的节点。循环有界，绝不会在状态机出错时挂死整个宿主进程。

use crate::handlers::NightFlowHandler;
use crate::reducer::{reduce, ReducerError, StateAction};
use crate::role::SchemaId;
use crate::state::{AudioEffect, GameState, GameStatus};
use crate::wolf_vote;

pub const MAX_PROGRESSION_LOOPS: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StepGate {
    Blocked,
    Advance,
    EndNight,
}

/// 当前步骤是否已经自然完成，允许自动推进。狼刀用投票齐全 + 倒计时到点
/// 判定；其余步骤用"本夜动作记录里是否已有该 schema 的一条记录"判定——房
/// 主显式 ADVANCE_NIGHT 不受此限制，只有自动驱动走这条路径。
fn step_is_complete(state: &GameState, now: i64) -> bool {
    match state.current_step_id {
        None => true,
        Some(SchemaId::WolfKill) => {
            wolf_vote::is_wolf_vote_all_complete(state)
                && state.wolf_vote_deadline.map(|deadline| now >= deadline).unwrap_or(false)
        }
        Some(step_id) => state.actions.iter().any(|a| a.schema_id == step_id),
    }
}

fn evaluate(state: &GameState, now: i64) -> StepGate {
    if state.status != GameStatus::Ongoing {
        return StepGate::Blocked;
    }
    if state.is_audio_playing {
        return StepGate::Blocked;
    }
    if !state.pending_reveal_acks.is_empty() {
        return StepGate::Blocked;
    }
    if !step_is_complete(state, now) {
        return StepGate::Blocked;
    }
    if state.current_step_id.is_none() {
        StepGate::EndNight
    } else {
        StepGate::Advance
    }
}

/// 跑一轮有界推进循环，返回新状态与本轮新增的待播放音效队列（已经通过
/// `SET_PENDING_AUDIO_EFFECTS` + `SET_AUDIO_PLAYING(true)` 写回状态）。
pub fn drive(mut state: GameState, now: i64) -> Result<GameState, ReducerError> {
    let mut audio_effects: Vec<AudioEffect> = Vec::new();

    for _ in 0..MAX_PROGRESSION_LOOPS {
        match evaluate(&state, now) {
            StepGate::Blocked => break,
            StepGate::Advance => {
                let outcome = match NightFlowHandler::handle_advance_night(&state, true) {
                    Ok(outcome) => outcome,
                    Err(_) => break,
                };
                audio_effects.extend(outcome.audio_effects);
                for action in outcome.actions {
                    state = reduce(state, action)?;
                }
            }
            StepGate::EndNight => {
                let outcome = match NightFlowHandler::handle_end_night(&state, true) {
                    Ok(outcome) => outcome,
                    Err(_) => break,
                };
                audio_effects.extend(outcome.audio_effects);
                for action in outcome.actions {
                    state = reduce(state, action)?;
                }
                break;
            }
        }
    }

    if !audio_effects.is_empty() {
        state = reduce(
            state,
            StateAction::SetPendingAudioEffects { effects: audio_effects },
        )?;
        state = reduce(state, StateAction::SetAudioPlaying { playing: true })?;
    }

    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::role::RoleId;
    use crate::state::Player;

    fn guard_only_state() -> GameState {
        let mut state = GameState::new("1234".into(), "host".into(), 3);
        state.template_roles = vec![RoleId::Guard, RoleId::Villager, RoleId::Villager];
        for seat in 0..3u8 {
            state.players[seat as usize] = Some(Player::new(seat, format!("u{seat}"), format!("P{seat}"), None));
        }
        state.players[0].as_mut().unwrap().role = Some(RoleId::Guard);
        state.players[1].as_mut().unwrap().role = Some(RoleId::Villager);
        state.players[2].as_mut().unwrap().role = Some(RoleId::Villager);
        state.status = GameStatus::Ongoing;
        state.current_step_index = 0;
        state.current_step_id = Some(SchemaId::GuardProtect);
        state
    }

    #[test]
    fn blocked_until_current_step_has_a_recorded_action() {
        let state = guard_only_state();
        let state = drive(state, 1000).unwrap();
        assert_eq!(state.current_step_id, Some(SchemaId::GuardProtect));
        assert!(!state.is_audio_playing);
    }

    #[test]
    fn advances_to_end_night_once_only_step_is_recorded() {
        use crate::handlers::handle_action;
        let mut state = guard_only_state();
        let outcome = handle_action(&state, 0, RoleId::Guard, Some(1), None).unwrap();
        for action in outcome.actions {
            state = reduce(state, action).unwrap();
        }
        let state = drive(state, 1000).unwrap();
        assert_eq!(state.status, GameStatus::Ended);
        assert!(state.current_step_id.is_none());
        assert!(state.is_audio_playing);
        assert!(!state.pending_audio_effects.is_empty());
    }

    #[test]
    fn blocked_while_audio_is_playing() {
        let mut state = guard_only_state();
        state.is_audio_playing = true;
        let state = drive(state, 1000).unwrap();
        assert_eq!(state.current_step_id, Some(SchemaId::GuardProtect));
    }

    #[test]
    fn blocked_while_reveal_acks_are_pending() {
        let mut state = guard_only_state();
        state.pending_reveal_acks.insert("0:Seer".into());
        let state = drive(state, 1000).unwrap();
        assert_eq!(state.current_step_id, Some(SchemaId::GuardProtect));
    }
}
