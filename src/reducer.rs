//! 归纳器（Reducer）：纯 `(state, action) -> state`，应用带类型的
//! `StateAction`，并强制状态迁移不变式。`match` 是穷尽的：新增一个变体而
//! 不处理会在编译期报错。

use crate::protocol::RejectReason;
use crate::resolvers::{NightResultsDiff, RevealDiff};
use crate::role::{RoleId, SchemaId};
use crate::state::{
    resolve_role_reveal_animation, ActionRejected, ActorHint, ConfirmStatus, GameState, GameStatus,
    Player, ProtocolAction, RoleRevealAnimation, Seat, Uid, WitchContext,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReducerError {
    #[error("invariant violation: {0}")]
    InvariantViolation(&'static str),
}

#[derive(Debug, Clone)]
pub enum StateAction {
    PlayerJoined {
        seat: Seat,
        uid: Uid,
        display_name: String,
        avatar_url: Option<String>,
    },
    PlayerLeft {
        seat: Seat,
    },
    UpdateTemplate {
        roles: Vec<RoleId>,
    },
    AssignRoles {
        assignments: Vec<(Seat, RoleId)>,
    },
    PlayerViewedRole {
        seat: Seat,
    },
    StartNight {
        first_step_index: i32,
        first_step_id: Option<SchemaId>,
    },
    RecordProtocolAction {
        action: ProtocolAction,
    },
    ApplyResolverResult {
        diff: NightResultsDiff,
        reveal: Option<RevealDiff>,
    },
    AdvanceToNextAction {
        next_step_index: i32,
        next_step_id: Option<SchemaId>,
    },
    SetWitchContext {
        context: Option<WitchContext>,
    },
    SetConfirmStatus {
        status: Option<ConfirmStatus>,
    },
    SetUiHint {
        hint: Option<ActorHint>,
    },
    EndNight {
        deaths: Vec<Seat>,
    },
    RestartGame,
    ActionRejected {
        reason: RejectReason,
        target_uid: Option<Uid>,
        rejection_id: String,
    },
    SetPendingAudioEffects {
        effects: Vec<crate::state::AudioEffect>,
    },
    ClearPendingAudioEffects,
    SetAudioPlaying {
        playing: bool,
    },
    RecordRevealAck {
        ack_key: String,
    },
    SetWolfRobotHunterStatusViewed {
        viewed: bool,
    },
    FillWithBots,
    SetWolfVoteDeadline {
        deadline: Option<i64>,
    },
    AddPendingRevealAck {
        ack_key: String,
    },
    SetSeerLabelMap {
        labels: std::collections::HashMap<RoleId, u8>,
    },
    SetRoleRevealAnimation {
        animation: RoleRevealAnimation,
    },
}

pub fn reduce(mut state: GameState, action: StateAction) -> Result<GameState, ReducerError> {
    match action {
        StateAction::PlayerJoined {
            seat,
            uid,
            display_name,
            avatar_url,
        } => {
            let idx = seat as usize;
            if idx >= state.players.len() {
                return Err(ReducerError::InvariantViolation("join seat out of range"));
            }
            state.players[idx] = Some(Player::new(seat, uid, display_name, avatar_url));
            if state.status == GameStatus::Unseated {
                state.status = GameStatus::Seated;
            }
        }
        StateAction::PlayerLeft { seat } => {
            let idx = seat as usize;
            if idx >= state.players.len() {
                return Err(ReducerError::InvariantViolation("leave seat out of range"));
            }
            state.players[idx] = None;
            if state.players.iter().all(|p| p.is_none()) {
                state.status = GameStatus::Unseated;
            }
        }
        StateAction::UpdateTemplate { roles } => {
            let new_len = roles.len();
            state.template_roles = roles;
            state.players.resize_with(new_len, || None);
            for slot in state.players.iter_mut().flatten() {
                slot.role = None;
                slot.has_viewed_role = false;
            }
            state.status = if state.players.iter().all(|p| p.is_some()) {
                GameStatus::Seated
            } else if state.players.iter().any(|p| p.is_some()) {
                GameStatus::Seated
            } else {
                GameStatus::Unseated
            };
        }
        StateAction::AssignRoles { assignments } => {
            for (seat, role) in assignments {
                let idx = seat as usize;
                if let Some(Some(player)) = state.players.get_mut(idx) {
                    player.role = Some(role);
                    player.has_viewed_role = false;
                } else {
                    return Err(ReducerError::InvariantViolation(
                        "ASSIGN_ROLES targets an unseated seat",
                    ));
                }
            }
            state.status = GameStatus::Assigned;
        }
        StateAction::PlayerViewedRole { seat } => {
            let idx = seat as usize;
            match state.players.get_mut(idx) {
                Some(Some(player)) => player.has_viewed_role = true,
                _ => {
                    return Err(ReducerError::InvariantViolation(
                        "PLAYER_VIEWED_ROLE on a null seat",
                    ))
                }
            }
            if state.status == GameStatus::Assigned {
                let all_viewed = state
                    .players
                    .iter()
                    .flatten()
                    .all(|p| p.has_viewed_role);
                if all_viewed {
                    state.status = GameStatus::Ready;
                }
            }
        }
        StateAction::StartNight {
            first_step_index,
            first_step_id,
        } => {
            state.status = GameStatus::Ongoing;
            state.current_step_index = first_step_index;
            state.current_step_id = first_step_id;
            state.actions.clear();
            state.current_night_results = Default::default();
        }
        StateAction::RecordProtocolAction { action } => {
            state.actions.push(action);
        }
        StateAction::ApplyResolverResult { diff, reveal } => {
            let results = &mut state.current_night_results;
            if let Some((seat, target)) = diff.wolf_vote {
                results.wolf_votes_by_seat.insert(seat, target);
            }
            if let Some(saved) = diff.saved_seat {
                results.saved_seat = Some(saved);
            }
            if let Some(poisoned) = diff.poisoned_seat {
                results.poisoned_seat = Some(poisoned);
            }
            if let Some(guarded) = diff.guarded_seat {
                results.guarded_seat = Some(guarded);
            }
            if let Some(swap) = diff.swapped_seats {
                results.swapped_seats = Some(swap);
            }
            if let Some(blocked) = diff.blocked_seat {
                results.blocked_seat = Some(blocked);
                state.nightmare_blocked_seat = Some(blocked);
            }
            if let Some(charmed) = diff.charmed_seat {
                results.charmed_seat = Some(charmed);
            }
            if let Some(dream_target) = diff.dream_target_seat {
                results.dream_target_seat = Some(dream_target);
            }
            if !diff.hypnotized_add.is_empty() {
                results.hypnotized_seats.extend(diff.hypnotized_add.iter().copied());
            }
            if let Some(robot_ctx) = diff.wolf_robot_context {
                state.wolf_robot_context = Some(robot_ctx);
            }
            if let Some(disabled) = diff.wolf_kill_disabled {
                state.wolf_kill_disabled = disabled;
            }
            if let Some(reveal) = reveal {
                use crate::resolvers::RevealDiff::*;
                match reveal {
                    Seer(r) => state.reveals.seer_reveal = Some(r),
                    MirrorSeer(r) => state.reveals.mirror_seer_reveal = Some(r),
                    DrunkSeer(r) => state.reveals.drunk_seer_reveal = Some(r),
                    Psychic(r) => state.reveals.psychic_reveal = Some(r),
                    Gargoyle(r) => state.reveals.gargoyle_reveal = Some(r),
                    PureWhite(r) => state.reveals.pure_white_reveal = Some(r),
                    WolfWitch(r) => state.reveals.wolf_witch_reveal = Some(r),
                    WolfRobot(r) => state.reveals.wolf_robot_reveal = Some(r),
                }
            }
        }
        StateAction::AdvanceToNextAction {
            next_step_index,
            next_step_id,
        } => {
            state.current_step_index = next_step_index;
            state.current_step_id = next_step_id;
            state.witch_context = None;
            state.confirm_status = None;
            // reveal slots are intentionally preserved here.
        }
        StateAction::SetWitchContext { context } => {
            state.witch_context = context;
        }
        StateAction::SetConfirmStatus { status } => {
            state.confirm_status = status;
        }
        StateAction::SetUiHint { hint } => {
            state.ui.current_actor_hint = hint;
        }
        StateAction::EndNight { deaths } => {
            state.status = GameStatus::Ended;
            state.last_night_deaths = deaths;
            state.is_audio_playing = false;
            state.current_step_id = None;
            state.current_step_index = -1;
        }
        StateAction::RestartGame => {
            state.status = GameStatus::Seated;
            for slot in state.players.iter_mut().flatten() {
                slot.role = None;
                slot.has_viewed_role = false;
            }
            state.current_step_index = -1;
            state.current_step_id = None;
            state.actions.clear();
            state.current_night_results = Default::default();
            state.pending_reveal_acks.clear();
            state.last_night_deaths.clear();
            state.is_audio_playing = false;
            state.wolf_vote_deadline = None;
            state.pending_audio_effects.clear();
            state.wolf_kill_disabled = false;
            state.nightmare_blocked_seat = None;
            state.wolf_robot_context = None;
            state.wolf_robot_hunter_status_viewed = false;
            state.reveals = Default::default();
            state.witch_context = None;
            state.confirm_status = None;
            state.ui = Default::default();
            state.seer_label_map.clear();
            state.role_reveal_random_nonce = state.role_reveal_random_nonce.wrapping_add(1);
            state.resolved_role_reveal_animation = resolve_role_reveal_animation(
                state.role_reveal_animation,
                &state.room_code,
                state.role_reveal_random_nonce,
            );
            state.action_rejected = None;
        }
        StateAction::ActionRejected {
            reason,
            target_uid,
            rejection_id,
        } => {
            state.action_rejected = Some(ActionRejected {
                reason: format!("{:?}", reason),
                target_uid,
                rejection_id,
            });
        }
        StateAction::SetPendingAudioEffects { effects } => {
            state.pending_audio_effects = effects;
        }
        StateAction::ClearPendingAudioEffects => {
            state.pending_audio_effects.clear();
        }
        StateAction::SetAudioPlaying { playing } => {
            state.is_audio_playing = playing;
        }
        StateAction::RecordRevealAck { ack_key } => {
            state.pending_reveal_acks.remove(&ack_key);
        }
        StateAction::SetWolfRobotHunterStatusViewed { viewed } => {
            state.wolf_robot_hunter_status_viewed = viewed;
        }
        StateAction::FillWithBots => {
            state.debug_mode.bots_enabled = true;
            for (seat, slot) in state.players.iter_mut().enumerate() {
                if slot.is_none() {
                    let mut bot = Player::new(
                        seat as Seat,
                        format!("bot-{seat}"),
                        format!("AI-{seat}"),
                        None,
                    );
                    bot.is_bot = true;
                    *slot = Some(bot);
                }
            }
            if state.players.iter().all(|p| p.is_some()) {
                state.status = GameStatus::Seated;
            }
        }
        StateAction::SetWolfVoteDeadline { deadline } => {
            state.wolf_vote_deadline = deadline;
        }
        StateAction::AddPendingRevealAck { ack_key } => {
            state.pending_reveal_acks.insert(ack_key);
        }
        StateAction::SetSeerLabelMap { labels } => {
            state.seer_label_map = labels;
        }
        StateAction::SetRoleRevealAnimation { animation } => {
            state.role_reveal_animation = animation;
            state.resolved_role_reveal_animation = resolve_role_reveal_animation(
                animation,
                &state.room_code,
                state.role_reveal_random_nonce,
            );
        }
    }

    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::GameState;

    fn seated_state() -> GameState {
        let mut state = GameState::new("1234".into(), "host".into(), 3);
        for seat in 0..3u8 {
            state = reduce(
                state,
                StateAction::PlayerJoined {
                    seat,
                    uid: format!("u{seat}"),
                    display_name: format!("p{seat}"),
                    avatar_url: None,
                },
            )
            .unwrap();
        }
        state
    }

    #[test]
    fn assign_roles_sets_status_and_resets_viewed_flag() {
        let state = seated_state();
        let state = reduce(
            state,
            StateAction::AssignRoles {
                assignments: vec![
                    (0, RoleId::Werewolf),
                    (1, RoleId::Guard),
                    (2, RoleId::Villager),
                ],
            },
        )
        .unwrap();
        assert_eq!(state.status, GameStatus::Assigned);
        assert!(state.players[0].as_ref().unwrap().role == Some(RoleId::Werewolf));
        assert!(!state.players[0].as_ref().unwrap().has_viewed_role);
    }

    #[test]
    fn all_viewed_transitions_to_ready() {
        let mut state = seated_state();
        state = reduce(
            state,
            StateAction::AssignRoles {
                assignments: vec![
                    (0, RoleId::Werewolf),
                    (1, RoleId::Guard),
                    (2, RoleId::Villager),
                ],
            },
        )
        .unwrap();
        for seat in 0..3u8 {
            state = reduce(state, StateAction::PlayerViewedRole { seat }).unwrap();
        }
        assert_eq!(state.status, GameStatus::Ready);
    }

    #[test]
    fn end_night_forces_audio_off_and_clears_step() {
        let mut state = seated_state();
        state.status = GameStatus::Ongoing;
        state.current_step_index = 2;
        state.current_step_id = Some(SchemaId::WolfKill);
        state.is_audio_playing = true;
        state = reduce(state, StateAction::EndNight { deaths: vec![1] }).unwrap();
        assert_eq!(state.status, GameStatus::Ended);
        assert_eq!(state.current_step_index, -1);
        assert!(state.current_step_id.is_none());
        assert!(!state.is_audio_playing);
        assert_eq!(state.last_night_deaths, vec![1]);
    }

    #[test]
    fn only_set_audio_playing_and_end_night_touch_audio_flag() {
        let mut state = seated_state();
        state.is_audio_playing = true;
        let before = state.is_audio_playing;
        let state = reduce(
            state,
            StateAction::SetUiHint { hint: None },
        )
        .unwrap();
        assert_eq!(state.is_audio_playing, before);
    }

    #[test]
    fn wolf_vote_deadline_only_changes_via_its_own_action() {
        let mut state = seated_state();
        state = reduce(
            state.clone(),
            StateAction::SetWolfVoteDeadline { deadline: Some(5000) },
        )
        .unwrap();
        assert_eq!(state.wolf_vote_deadline, Some(5000));
        state = reduce(state, StateAction::SetUiHint { hint: None }).unwrap();
        assert_eq!(state.wolf_vote_deadline, Some(5000));
    }

    #[test]
    fn pending_reveal_ack_added_and_cleared() {
        let mut state = seated_state();
        state = reduce(
            state,
            StateAction::AddPendingRevealAck { ack_key: "0:Seer".into() },
        )
        .unwrap();
        assert!(state.pending_reveal_acks.contains("0:Seer"));
        state = reduce(state, StateAction::RecordRevealAck { ack_key: "0:Seer".into() }).unwrap();
        assert!(!state.pending_reveal_acks.contains("0:Seer"));
    }

    #[test]
    fn restart_game_returns_to_seated_and_clears_night_state() {
        let mut state = seated_state();
        state.status = GameStatus::Ended;
        state.last_night_deaths = vec![0];
        state = reduce(state, StateAction::RestartGame).unwrap();
        assert_eq!(state.status, GameStatus::Seated);
        assert!(state.last_night_deaths.is_empty());
        assert!(state.players.iter().all(|p| p.is_some()));
    }
}
