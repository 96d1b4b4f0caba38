//! 处理器（Handlers）：对每个入站意图做门禁检查 + 解析器派发，产出
//! `{actions[], audioEffects[]}`。从不直接修改状态——只返回归纳器输入。

use crate::constraints::{check_constraints, ValidationContext};
use crate::night_plan::build_night_plan;
use crate::protocol::{PlayerMessage, RejectReason};
use crate::reducer::StateAction;
use crate::resolvers::{self, RevealDiff};
use crate::role::{registry, schema_registry, RoleId, SchemaId};
use crate::state::{AudioEffect, ConfirmStatus, GameState, GameStatus, Seat, Uid, WitchContext};
use crate::wolf_vote;

#[derive(Debug, Clone)]
pub struct Rejection {
    pub reason: RejectReason,
    pub message: Option<String>,
    pub target_uid: Option<Uid>,
}

#[derive(Debug, Clone, Default)]
pub struct HandlerOutcome {
    pub actions: Vec<StateAction>,
    pub audio_effects: Vec<AudioEffect>,
}

pub type HandlerResult = Result<HandlerOutcome, Rejection>;

fn reject(reason: RejectReason) -> Rejection {
    Rejection {
        reason,
        message: None,
        target_uid: None,
    }
}

fn reject_with(reason: RejectReason, message: &str, target_uid: Option<Uid>) -> Rejection {
    Rejection {
        reason,
        message: Some(message.to_string()),
        target_uid,
    }
}

/// 按 `audioKey→seer_<label>` 重写：若存在预言家类标签映射且该角色是被标记
/// 的角色，使用标签而非原始音频键，使已标注标签的预言家播放专属语音。
pub fn resolve_seer_audio_key(state: &GameState, role_id: RoleId, raw_key: &str) -> String {
    if let Some(label) = state.seer_label_map.get(&role_id) {
        format!("seer_{label}")
    } else {
        raw_key.to_string()
    }
}

pub fn handle_join(
    state: &GameState,
    seat: Seat,
    uid: Uid,
    display_name: String,
    avatar_url: Option<String>,
) -> HandlerResult {
    if seat as usize >= state.players.len() {
        return Err(reject(RejectReason::InvalidSeat));
    }
    if matches!(state.status, GameStatus::Assigned | GameStatus::Ready | GameStatus::Ongoing) {
        return Err(reject(RejectReason::GameInProgress));
    }
    if let Some(occupant) = state.player_at(seat) {
        if occupant.uid != uid {
            return Err(reject(RejectReason::SeatTaken));
        }
    }
    Ok(HandlerOutcome {
        actions: vec![StateAction::PlayerJoined {
            seat,
            uid,
            display_name,
            avatar_url,
        }],
        audio_effects: vec![],
    })
}

pub fn handle_leave(state: &GameState, seat: Seat, uid: Uid) -> HandlerResult {
    match state.player_at(seat) {
        None => Err(reject(RejectReason::NotSeated)),
        Some(player) if player.uid != uid => Err(reject(RejectReason::InvalidSeat)),
        Some(_) => Ok(HandlerOutcome {
            actions: vec![StateAction::PlayerLeft { seat }],
            audio_effects: vec![],
        }),
    }
}

pub fn handle_viewed_role(state: &GameState, seat: Seat) -> HandlerResult {
    match state.player_at(seat) {
        Some(player) if player.role.is_some() => Ok(HandlerOutcome {
            actions: vec![StateAction::PlayerViewedRole { seat }],
            audio_effects: vec![],
        }),
        _ => Err(reject(RejectReason::InvalidAction)),
    }
}

pub fn handle_wolf_robot_hunter_status_viewed(state: &GameState, seat: Seat) -> HandlerResult {
    if state.player_at(seat).is_none() {
        return Err(reject(RejectReason::InvalidSeat));
    }
    Ok(HandlerOutcome {
        actions: vec![StateAction::SetWolfRobotHunterStatusViewed { viewed: true }],
        audio_effects: vec![],
    })
}

fn reveal_ack_key(seat: Seat, role: RoleId) -> String {
    format!("{seat}:{role:?}")
}

pub fn handle_reveal_ack(state: &GameState, seat: Seat, role: RoleId, _revision: u64) -> HandlerResult {
    if state.player_at(seat).is_none() {
        return Err(reject(RejectReason::InvalidSeat));
    }
    let ack_key = reveal_ack_key(seat, role);
    Ok(HandlerOutcome {
        actions: vec![StateAction::RecordRevealAck { ack_key }],
        audio_effects: vec![],
    })
}

/// 通用夜晚动作分发：ACTION 消息必须匹配当前步骤的 schema，且行动者的真实
/// 角色必须与消息所声明的角色一致。
pub fn handle_action(
    state: &GameState,
    seat: Seat,
    claimed_role: RoleId,
    target: Option<Seat>,
    extra: Option<crate::protocol::ActionExtra>,
) -> HandlerResult {
    if state.status != GameStatus::Ongoing {
        return Err(reject(RejectReason::InvalidStatus));
    }
    if state.is_audio_playing {
        return Err(reject(RejectReason::ForbiddenWhileAudioPlaying));
    }
    let Some(actual_role) = state.role_at(seat) else {
        return Err(reject(RejectReason::InvalidAction));
    };
    if actual_role != claimed_role {
        return Err(reject(RejectReason::InvalidAction));
    }
    let schema_id = role_to_schema(actual_role);
    let Some(schema_id) = schema_id else {
        return Err(reject(RejectReason::InvalidAction));
    };
    if state.current_step_id != Some(schema_id) {
        return Err(reject(RejectReason::InvalidStep));
    }

    let schemas = schema_registry();
    let schema = schemas.get(&schema_id).expect("schema exists for every role-mapped id");

    let validate_target = |t: Option<Seat>, other: Option<Seat>| -> Result<(), Rejection> {
        let ctx = ValidationContext {
            actor_seat: seat,
            target: t,
            other_target: other,
            state,
            hypnotized: &state.current_night_results.hypnotized_seats,
        };
        check_constraints(&schema.constraints, &ctx).map_err(reject)
    };

    let resolver_result = match schema_id {
        SchemaId::GuardProtect => {
            if let Some(t) = target {
                validate_target(Some(t), None)?;
                resolvers::guard_protect(t)
            } else if schema.can_skip {
                return Ok(HandlerOutcome {
                    actions: vec![StateAction::RecordProtocolAction {
                        action: protocol_action(schema_id, seat, None),
                    }],
                    audio_effects: vec![],
                });
            } else {
                return Err(reject(RejectReason::InvalidAction));
            }
        }
        SchemaId::SeerCheck => {
            let t = target.ok_or_else(|| reject(RejectReason::InvalidAction))?;
            validate_target(Some(t), None)?;
            resolvers::seer_check(state, t)
        }
        SchemaId::MirrorSeerCheck => {
            let t = target.ok_or_else(|| reject(RejectReason::InvalidAction))?;
            validate_target(Some(t), None)?;
            resolvers::mirror_seer_check(state, t)
        }
        SchemaId::DrunkSeerCheck => {
            let t = target.ok_or_else(|| reject(RejectReason::InvalidAction))?;
            validate_target(Some(t), None)?;
            resolvers::drunk_seer_check(state, t)
        }
        SchemaId::PsychicCheck => {
            let t = target.ok_or_else(|| reject(RejectReason::InvalidAction))?;
            validate_target(Some(t), None)?;
            resolvers::psychic_check(state, t)
        }
        SchemaId::GargoyleCheck => {
            let t = target.ok_or_else(|| reject(RejectReason::InvalidAction))?;
            validate_target(Some(t), None)?;
            resolvers::gargoyle_check(state, t)
        }
        SchemaId::PureWhiteCheck => {
            let t = target.ok_or_else(|| reject(RejectReason::InvalidAction))?;
            validate_target(Some(t), None)?;
            resolvers::pure_white_check(state, t)
        }
        SchemaId::WolfWitchCheck => {
            let t = target.ok_or_else(|| reject(RejectReason::InvalidAction))?;
            validate_target(Some(t), None)?;
            resolvers::wolf_witch_check(state, t)
        }
        SchemaId::WolfRobotLearn => {
            let t = target.ok_or_else(|| reject(RejectReason::InvalidAction))?;
            validate_target(Some(t), None)?;
            resolvers::wolf_robot_learn(state, t)
        }
        SchemaId::NightmareBlock => {
            if let Some(t) = target {
                validate_target(Some(t), None)?;
                resolvers::nightmare_block(state, t)
            } else if schema.can_skip {
                return Ok(HandlerOutcome {
                    actions: vec![StateAction::RecordProtocolAction {
                        action: protocol_action(schema_id, seat, None),
                    }],
                    audio_effects: vec![],
                });
            } else {
                return Err(reject(RejectReason::InvalidAction));
            }
        }
        SchemaId::MagicianSwap => {
            let extra = extra.ok_or_else(|| reject(RejectReason::InvalidAction))?;
            let (a, b) = extra
                .swap_targets
                .ok_or_else(|| reject(RejectReason::InvalidAction))?;
            validate_target(Some(a), Some(b))?;
            resolvers::magician_swap(a, b)
        }
        SchemaId::PiperHypnotize => {
            let extra = extra.ok_or_else(|| reject(RejectReason::InvalidAction))?;
            let targets = extra
                .hypnotize_targets
                .ok_or_else(|| reject(RejectReason::InvalidAction))?;
            for t in &targets {
                validate_target(Some(*t), None)?;
            }
            resolvers::piper_hypnotize(&targets, &state.current_night_results.hypnotized_seats)
        }
        SchemaId::WitchAction => {
            let extra = extra.ok_or_else(|| reject(RejectReason::InvalidAction))?;
            let wolf_kill_seat = resolve_wolf_kill_seat_for_witch(state);

            // Save and poison are independent sub-decisions within the same
            // compound step (§4.4): a witch may do either, both, or neither
            // in one submission, so each is resolved on its own and the
            // diffs are merged rather than short-circuiting on whichever
            // field is populated first.
            let mut merged = resolvers::ResolverResult {
                valid: true,
                reject_reason: None,
                message: None,
                updates: Default::default(),
                reveal: None,
            };

            if extra.save == Some(true) {
                let save_result = resolvers::witch_save(seat, wolf_kill_seat);
                if !save_result.valid {
                    return Err(Rejection {
                        reason: save_result.reject_reason.unwrap_or(RejectReason::InvalidAction),
                        message: save_result.message.map(|m| m.to_string()),
                        target_uid: state.player_at(seat).map(|p| p.uid.clone()),
                    });
                }
                merged.updates.saved_seat = save_result.updates.saved_seat;
            }

            if let Some(poison_target) = extra.poison_target {
                validate_target(Some(poison_target), None)?;
                let poison_result = resolvers::witch_poison(poison_target);
                merged.updates.poisoned_seat = poison_result.updates.poisoned_seat;
            }

            merged
        }
        SchemaId::WolfQueenCharm => {
            let t = target.ok_or_else(|| reject(RejectReason::InvalidAction))?;
            validate_target(Some(t), None)?;
            resolvers::wolf_queen_charm(t)
        }
        SchemaId::DarkWolfKingConfirm | SchemaId::HunterConfirm | SchemaId::PiperHypnotizedReveal => {
            resolvers::confirm_noop()
        }
    };

    if !resolver_result.valid {
        let reason = resolver_result.reject_reason.unwrap_or(RejectReason::InvalidAction);
        return Err(Rejection {
            reason,
            message: resolver_result.message.map(|m| m.to_string()),
            target_uid: state.player_at(seat).map(|p| p.uid.clone()),
        });
    }

    let mut actions = vec![
        StateAction::RecordProtocolAction {
            action: protocol_action(schema_id, seat, target),
        },
    ];
    if resolver_result.reveal.is_some() {
        actions.push(StateAction::AddPendingRevealAck {
            ack_key: reveal_ack_key(seat, actual_role),
        });
    }
    actions.push(StateAction::ApplyResolverResult {
        diff: resolver_result.updates,
        reveal: resolver_result.reveal,
    });

    Ok(HandlerOutcome {
        actions,
        audio_effects: vec![],
    })
}

pub fn handle_wolf_vote(state: &GameState, seat: Seat, target: Option<Seat>, now: i64) -> HandlerResult {
    if state.status != GameStatus::Ongoing {
        return Err(reject(RejectReason::InvalidStatus));
    }
    if state.current_step_id != Some(SchemaId::WolfKill) {
        return Err(reject(RejectReason::InvalidStep));
    }
    let Some(role) = state.role_at(seat) else {
        return Err(reject(RejectReason::InvalidAction));
    };
    let participates = registry()
        .get(&role)
        .and_then(|r| r.wolf_meeting)
        .map(|m| m.participates_in_wolf_vote)
        .unwrap_or(false);
    if !participates {
        return Err(reject(RejectReason::InvalidAction));
    }

    let result = resolvers::wolf_vote_submit(state, seat, target);
    if !result.valid {
        return Err(Rejection {
            reason: result.reject_reason.unwrap_or(RejectReason::InvalidAction),
            message: result.message.map(|m| m.to_string()),
            target_uid: state.player_at(seat).map(|p| p.uid.clone()),
        });
    }

    let mut simulated = state.current_night_results.wolf_votes_by_seat.clone();
    simulated.insert(seat, target);
    let all_voted_after = {
        let participant_seats: Vec<Seat> = state
            .players
            .iter()
            .filter_map(|p| p.as_ref())
            .filter(|p| {
                p.role
                    .and_then(|r| registry().get(&r).and_then(|role| role.wolf_meeting))
                    .map(|m| m.participates_in_wolf_vote)
                    .unwrap_or(false)
            })
            .map(|p| p.seat_number)
            .collect();
        !participant_seats.is_empty() && participant_seats.iter().all(|s| simulated.contains_key(s))
    };

    let mut actions = vec![
        StateAction::RecordProtocolAction {
            action: protocol_action(SchemaId::WolfKill, seat, target),
        },
        StateAction::ApplyResolverResult {
            diff: result.updates,
            reveal: None,
        },
    ];

    if let Some(new_deadline) =
        wolf_vote::next_deadline(all_voted_after, state.wolf_vote_deadline.is_some(), now)
    {
        actions.push(StateAction::SetWolfVoteDeadline { deadline: new_deadline });
    }

    Ok(HandlerOutcome {
        actions,
        audio_effects: vec![],
    })
}

fn resolve_wolf_kill_seat_for_witch(state: &GameState) -> Option<Seat> {
    state
        .witch_context
        .as_ref()
        .and_then(|ctx| ctx.wolf_kill_seat)
}

pub(crate) fn role_to_schema(role: RoleId) -> Option<SchemaId> {
    use RoleId::*;
    use SchemaId::*;
    Some(match role {
        NightmareWolf => NightmareBlock,
        Guard => GuardProtect,
        Werewolf | DarkWolfKing => WolfKill,
        WolfQueen => WolfQueenCharm,
        WolfRobot => WolfRobotLearn,
        Witch => WitchAction,
        Seer => SeerCheck,
        MirrorSeer => MirrorSeerCheck,
        DrunkSeer => DrunkSeerCheck,
        Psychic => PsychicCheck,
        Gargoyle => GargoyleCheck,
        PureWhite => PureWhiteCheck,
        WolfWitch => WolfWitchCheck,
        Magician => MagicianSwap,
        Piper => PiperHypnotize,
        Villager | Hunter | SpiritKnight | Dreamcatcher => return None,
    })
}

fn protocol_action(
    schema_id: SchemaId,
    actor_seat: Seat,
    target_seat: Option<Seat>,
) -> crate::state::ProtocolAction {
    crate::state::ProtocolAction {
        schema_id,
        actor_seat,
        target_seat,
        timestamp: 0,
    }
}

/// 两个特权意图 `ADVANCE_NIGHT` / `END_NIGHT` 的门禁与派发，见组件文档
/// §4.7。其余意图走 [`handle_action`] 等通用路径。
pub struct NightFlowHandler;

impl NightFlowHandler {
    /// 前置门禁，按文档顺序评估。
    fn common_gates(state: &GameState, is_host: bool) -> Result<(), Rejection> {
        if !is_host {
            return Err(reject(RejectReason::HostOnly));
        }
        if state.status != GameStatus::Ongoing {
            return Err(reject(RejectReason::InvalidStatus));
        }
        if state.is_audio_playing {
            return Err(reject(RejectReason::ForbiddenWhileAudioPlaying));
        }
        if state.current_step_id == Some(SchemaId::WolfRobotLearn) {
            if let Some(reveal) = &state.reveals.wolf_robot_reveal {
                if reveal.learned_role_id == RoleId::Hunter && !state.wolf_robot_hunter_status_viewed {
                    return Err(reject(RejectReason::WolfrobotHunterStatusNotViewed));
                }
            }
        }
        Ok(())
    }

    pub fn handle_advance_night(state: &GameState, is_host: bool) -> HandlerResult {
        Self::common_gates(state, is_host)?;

        let reg = registry();
        let plan = build_night_plan(&state.template_roles, &reg, &state.seer_label_map)
            .map_err(|_| reject(RejectReason::InvalidAction))?;

        let next_index = state.current_step_index + 1;
        let next_step = plan.get(next_index as usize);

        let mut actions = vec![StateAction::AdvanceToNextAction {
            next_step_index: next_index,
            next_step_id: next_step.map(|s| s.step_id),
        }];

        let mut audio_effects = Vec::new();
        if let Some(current) = state.current_step_index.try_into().ok().and_then(|i: usize| plan.get(i)) {
            audio_effects.push(AudioEffect {
                audio_key: resolve_seer_audio_key(state, current.role_id, current.audio_key),
                is_end_audio: true,
            });
        }

        if let Some(next) = next_step {
            if next.step_id == SchemaId::WitchAction {
                let wolf_kill_seat = wolf_vote::resolve_wolf_kill_target(&state.current_night_results.wolf_votes_by_seat);
                let witch_seat = state
                    .players
                    .iter()
                    .flatten()
                    .find(|p| p.role == Some(RoleId::Witch))
                    .map(|p| p.seat_number);
                actions.push(StateAction::SetWitchContext {
                    context: Some(WitchContext {
                        wolf_kill_seat,
                        can_save: wolf_kill_seat.is_some() && wolf_kill_seat != witch_seat,
                        can_poison: true,
                    }),
                });
            }

            let hint = if let (Some(blocked), Some(next_role)) = (
                state.nightmare_blocked_seat,
                state.role_at_step_actor(next),
            ) {
                if Some(blocked) == Some(next_role) {
                    Some(crate::state::ActorHint {
                        kind: crate::state::ActorHintKind::BlockedByNightmare,
                        target_role_ids: vec![next.role_id],
                        message: "你的技能已被封印",
                    })
                } else {
                    None
                }
            } else if next.step_id == SchemaId::WolfKill && state.wolf_kill_disabled {
                Some(crate::state::ActorHint {
                    kind: crate::state::ActorHintKind::WolfKillDisabled,
                    target_role_ids: wolf_vote::wolf_role_ids(),
                    message: "今晚狼人无法行动",
                })
            } else {
                None
            };
            actions.push(StateAction::SetUiHint { hint });

            audio_effects.push(AudioEffect {
                audio_key: resolve_seer_audio_key(state, next.role_id, next.audio_key),
                is_end_audio: false,
            });
        } else {
            actions.push(StateAction::SetUiHint { hint: None });
        }

        Ok(HandlerOutcome {
            actions,
            audio_effects,
        })
    }

    pub fn handle_end_night(state: &GameState, is_host: bool) -> HandlerResult {
        Self::common_gates(state, is_host)?;
        if state.current_step_id.is_some() {
            return Err(reject(RejectReason::NightNotComplete));
        }

        let seat_map = crate::death::build_role_seat_map(state);

        let seer_checked_reflector = [
            &state.reveals.seer_reveal,
            &state.reveals.mirror_seer_reveal,
            &state.reveals.drunk_seer_reveal,
        ]
        .iter()
        .filter_map(|r| r.as_ref())
        .find(|r| seat_map.reflects_damage_seats.contains(&r.target_seat))
        .map(|r| r.target_seat);
        let seer_seat = state
            .players
            .iter()
            .flatten()
            .find(|p| matches!(p.role, Some(RoleId::Seer)))
            .map(|p| p.seat_number);
        let witch_poisoned_reflector = state
            .current_night_results
            .poisoned_seat
            .map(|s| seat_map.reflects_damage_seats.contains(&s))
            .unwrap_or(false);
        let reflection = crate::death::ReflectionContext {
            seer_checked_reflector,
            seer_seat,
            witch_poisoned_reflector,
            witch_seat: seat_map.witch_seat,
        };

        let deaths = crate::death::calculate_deaths(
            &state.current_night_results,
            state.wolf_kill_disabled,
            state.nightmare_blocked_seat,
            &seat_map,
            &reflection,
        );

        let shooter_seat = state
            .players
            .iter()
            .flatten()
            .find(|p| matches!(p.role, Some(RoleId::Hunter) | Some(RoleId::DarkWolfKing)))
            .map(|p| p.seat_number);
        let mut actions = vec![StateAction::EndNight { deaths: deaths.clone() }];
        if let Some(seat) = shooter_seat {
            if deaths.contains(&seat) {
                let can_shoot = state.current_night_results.poisoned_seat != Some(seat);
                actions.push(StateAction::SetConfirmStatus {
                    status: Some(ConfirmStatus { can_shoot }),
                });
            }
        }

        Ok(HandlerOutcome {
            actions,
            audio_effects: vec![AudioEffect {
                audio_key: "night_end".to_string(),
                is_end_audio: false,
            }],
        })
    }
}

impl GameState {
    fn role_at_step_actor(&self, step: &crate::night_plan::NightStep) -> Option<Seat> {
        self.players
            .iter()
            .flatten()
            .find(|p| p.role == Some(step.role_id))
            .map(|p| p.seat_number)
    }
}

pub fn dispatch(state: &GameState, message: PlayerMessage, is_host: bool, now: i64) -> HandlerResult {
    match message {
        PlayerMessage::Join {
            seat,
            uid,
            display_name,
            avatar_url,
        } => handle_join(state, seat, uid, display_name, avatar_url),
        PlayerMessage::Leave { seat, uid } => handle_leave(state, seat, uid),
        PlayerMessage::ViewedRole { seat } => handle_viewed_role(state, seat),
        PlayerMessage::Action {
            seat,
            role,
            target,
            extra,
        } => handle_action(state, seat, role, target, extra),
        PlayerMessage::WolfVote { seat, target } => handle_wolf_vote(state, seat, target, now),
        PlayerMessage::RevealAck { seat, role, revision } => handle_reveal_ack(state, seat, role, revision),
        PlayerMessage::WolfRobotHunterStatusViewed { seat } => {
            handle_wolf_robot_hunter_status_viewed(state, seat)
        }
        PlayerMessage::AdvanceNight { .. } => NightFlowHandler::handle_advance_night(state, is_host),
        PlayerMessage::EndNight { .. } => NightFlowHandler::handle_end_night(state, is_host),
        PlayerMessage::RequestState { .. } | PlayerMessage::SnapshotRequest { .. } => {
            // 纯读取意图，不产生任何 StateAction；由传输层直接用当前状态应答。
            Ok(HandlerOutcome::default())
        }
    }
}

/// 管理类操作不属于 `PlayerMessage` 协议族（§4.6），只能由房主通过传输层的
/// 独立入口触发，而非经 [`dispatch`]。

fn host_gate(is_host: bool) -> Result<(), Rejection> {
    if !is_host {
        return Err(reject(RejectReason::HostOnly));
    }
    Ok(())
}

pub fn handle_update_template(state: &GameState, is_host: bool, roles: Vec<RoleId>) -> HandlerResult {
    host_gate(is_host)?;
    if matches!(state.status, GameStatus::Ongoing) {
        return Err(reject(RejectReason::GameInProgress));
    }
    let reg = registry();
    if roles.iter().any(|r| !reg.contains_key(r)) {
        return Err(reject(RejectReason::InvalidAction));
    }
    Ok(HandlerOutcome {
        actions: vec![StateAction::UpdateTemplate { roles }],
        audio_effects: vec![],
    })
}

/// 生成预言家类标签映射：模板中出现的每个"预言家类"角色按注册表内既有顺序
/// 从 1 开始编号；若只有零或一个这样的角色，返回空表（无需消歧）。
fn build_seer_label_map(assignments: &[(Seat, RoleId)]) -> std::collections::HashMap<RoleId, u8> {
    let mut seer_like: Vec<RoleId> = assignments
        .iter()
        .map(|(_, role)| *role)
        .filter(|r| crate::night_plan::is_seer_like(*r))
        .collect();
    seer_like.sort();
    seer_like.dedup();
    if seer_like.len() < 2 {
        return std::collections::HashMap::new();
    }
    seer_like
        .into_iter()
        .enumerate()
        .map(|(i, role)| (role, (i + 1) as u8))
        .collect()
}

pub fn handle_assign_roles(
    state: &GameState,
    is_host: bool,
    assignments: Vec<(Seat, RoleId)>,
) -> HandlerResult {
    host_gate(is_host)?;
    if state.status != GameStatus::Seated {
        return Err(reject(RejectReason::InvalidStatus));
    }
    if assignments.len() != state.template_roles.len() {
        return Err(reject(RejectReason::InvalidAction));
    }
    let reg = registry();
    for (seat, role) in &assignments {
        if state.player_at(*seat).is_none() {
            return Err(reject(RejectReason::InvalidSeat));
        }
        if !reg.contains_key(role) {
            return Err(reject(RejectReason::InvalidAction));
        }
    }
    let labels = build_seer_label_map(&assignments);
    Ok(HandlerOutcome {
        actions: vec![
            StateAction::AssignRoles { assignments },
            StateAction::SetSeerLabelMap { labels },
        ],
        audio_effects: vec![],
    })
}

/// 开始第一夜。`dream_target` 由调用方（持有随机数生成器的宿主层）在模板
/// 含摄梦人时预先选定一次，纯处理器只负责把它写入刚重置的
/// `currentNightResults`（见组件文档 §4.4 对摄梦人的补充说明）。
pub fn handle_start_night(
    state: &GameState,
    is_host: bool,
    dream_target: Option<Seat>,
) -> HandlerResult {
    host_gate(is_host)?;
    if !matches!(state.status, GameStatus::Assigned | GameStatus::Ready) {
        return Err(reject(RejectReason::InvalidStatus));
    }
    let reg = registry();
    let plan = build_night_plan(&state.template_roles, &reg, &state.seer_label_map)
        .map_err(|_| reject(RejectReason::InvalidAction))?;
    let first = plan.first();

    let mut actions = vec![StateAction::StartNight {
        first_step_index: if first.is_some() { 0 } else { -1 },
        first_step_id: first.map(|s| s.step_id),
    }];

    let has_dreamcatcher = state.template_roles.contains(&RoleId::Dreamcatcher);
    if let (true, Some(target)) = (has_dreamcatcher, dream_target) {
        actions.push(StateAction::ApplyResolverResult {
            diff: resolvers::dreamcatcher_initial_protect(target),
            reveal: None,
        });
    }

    Ok(HandlerOutcome {
        actions,
        audio_effects: vec![],
    })
}

pub fn handle_restart_game(state: &GameState, is_host: bool) -> HandlerResult {
    host_gate(is_host)?;
    let _ = state;
    Ok(HandlerOutcome {
        actions: vec![StateAction::RestartGame],
        audio_effects: vec![],
    })
}

pub fn handle_fill_with_bots(state: &GameState, is_host: bool) -> HandlerResult {
    host_gate(is_host)?;
    if state.status != GameStatus::Seated {
        return Err(reject(RejectReason::InvalidStatus));
    }
    Ok(HandlerOutcome {
        actions: vec![StateAction::FillWithBots],
        audio_effects: vec![],
    })
}

pub fn handle_set_role_reveal_animation(
    is_host: bool,
    animation: crate::state::RoleRevealAnimation,
) -> HandlerResult {
    host_gate(is_host)?;
    Ok(HandlerOutcome {
        actions: vec![StateAction::SetRoleRevealAnimation { animation }],
        audio_effects: vec![],
    })
}
