//! 解析器（Resolvers）：每个 schema id 对应一个纯函数，接受状态切片与输入，
//! 产出 `{valid, updates?, reveal?, rejectReason?}`。不做 I/O，不读墙钟。

use crate::protocol::RejectReason;
use crate::role::{registry, RoleId, Team};
use crate::state::{GameState, Seat, SeerReveal, WolfRobotContext, WolfRobotReveal};
use rand::rngs::OsRng;
use rand::Rng;
use std::collections::HashSet;

#[derive(Debug, Clone, Default)]
pub struct NightResultsDiff {
    pub wolf_vote: Option<(Seat, Option<Seat>)>,
    pub saved_seat: Option<Seat>,
    pub poisoned_seat: Option<Seat>,
    pub guarded_seat: Option<Seat>,
    pub swapped_seats: Option<(Seat, Seat)>,
    pub blocked_seat: Option<Seat>,
    pub wolf_kill_disabled: Option<bool>,
    pub hypnotized_add: Vec<Seat>,
    pub wolf_robot_context: Option<WolfRobotContext>,
    pub charmed_seat: Option<Seat>,
    pub dream_target_seat: Option<Seat>,
}

#[derive(Debug, Clone)]
pub enum RevealDiff {
    Seer(SeerReveal),
    MirrorSeer(SeerReveal),
    DrunkSeer(SeerReveal),
    Psychic(SeerReveal),
    Gargoyle(SeerReveal),
    PureWhite(SeerReveal),
    WolfWitch(SeerReveal),
    WolfRobot(WolfRobotReveal),
}

#[derive(Debug, Clone)]
pub struct ResolverResult {
    pub valid: bool,
    pub reject_reason: Option<RejectReason>,
    /// 附加的中文说明，供 UI 直接展示（规范称为"per-resolver Chinese
    /// reasons"），不是所有拒绝都携带。
    pub message: Option<&'static str>,
    pub updates: NightResultsDiff,
    pub reveal: Option<RevealDiff>,
}

impl ResolverResult {
    fn ok(updates: NightResultsDiff, reveal: Option<RevealDiff>) -> Self {
        ResolverResult {
            valid: true,
            reject_reason: None,
            message: None,
            updates,
            reveal,
        }
    }

    fn reject(reason: RejectReason) -> Self {
        ResolverResult {
            valid: false,
            reject_reason: Some(reason),
            message: None,
            updates: NightResultsDiff::default(),
            reveal: None,
        }
    }

    fn reject_with_message(reason: RejectReason, message: &'static str) -> Self {
        ResolverResult {
            valid: false,
            reject_reason: Some(reason),
            message: Some(message),
            updates: NightResultsDiff::default(),
            reveal: None,
        }
    }
}

/// 身份解析助手：依次组合座位互换与机械狼伪装。所有查验类解析器都必须经过
/// 这里，不得在各自的解析器内联这套变换。
pub fn resolve_role_for_checks(state: &GameState, seat: Seat) -> Option<RoleId> {
    let effective_seat = match state.current_night_results.swapped_seats {
        Some((a, b)) if seat == a => b,
        Some((a, b)) if seat == b => a,
        _ => seat,
    };
    let mut role = state.role_at(effective_seat)?;
    if role == RoleId::WolfRobot {
        if let Some(ctx) = &state.wolf_robot_context {
            role = ctx.disguised_role;
        }
    }
    Some(role)
}

fn team_of(role_id: RoleId) -> Team {
    registry().get(&role_id).map(|r| r.team).unwrap_or(Team::Good)
}

fn seer_check_common(state: &GameState, target: Seat) -> &'static str {
    let role = resolve_role_for_checks(state, target);
    let team = role.map(team_of).unwrap_or(Team::Good);
    crate::role::seer_check_label(team)
}

pub fn seer_check(state: &GameState, target: Seat) -> ResolverResult {
    let result = seer_check_common(state, target);
    ResolverResult::ok(
        NightResultsDiff::default(),
        Some(RevealDiff::Seer(SeerReveal {
            target_seat: target,
            result,
        })),
    )
}

pub fn mirror_seer_check(state: &GameState, target: Seat) -> ResolverResult {
    let straight = seer_check_common(state, target);
    let inverted = if straight == "狼人" { "好人" } else { "狼人" };
    ResolverResult::ok(
        NightResultsDiff::default(),
        Some(RevealDiff::MirrorSeer(SeerReveal {
            target_seat: target,
            result: inverted,
        })),
    )
}

/// 醉酒预言家以 50% 概率反转结果，使用安全随机数生成器。
pub fn drunk_seer_check(state: &GameState, target: Seat) -> ResolverResult {
    let straight = seer_check_common(state, target);
    let flip: bool = OsRng.gen_bool(0.5);
    let result = if flip {
        if straight == "狼人" { "好人" } else { "狼人" }
    } else {
        straight
    };
    ResolverResult::ok(
        NightResultsDiff::default(),
        Some(RevealDiff::DrunkSeer(SeerReveal {
            target_seat: target,
            result,
        })),
    )
}

pub fn psychic_check(state: &GameState, target: Seat) -> ResolverResult {
    let result = seer_check_common(state, target);
    ResolverResult::ok(
        NightResultsDiff::default(),
        Some(RevealDiff::Psychic(SeerReveal {
            target_seat: target,
            result,
        })),
    )
}

pub fn gargoyle_check(state: &GameState, target: Seat) -> ResolverResult {
    let result = seer_check_common(state, target);
    ResolverResult::ok(
        NightResultsDiff::default(),
        Some(RevealDiff::Gargoyle(SeerReveal {
            target_seat: target,
            result,
        })),
    )
}

pub fn pure_white_check(state: &GameState, target: Seat) -> ResolverResult {
    let result = seer_check_common(state, target);
    ResolverResult::ok(
        NightResultsDiff::default(),
        Some(RevealDiff::PureWhite(SeerReveal {
            target_seat: target,
            result,
        })),
    )
}

pub fn wolf_witch_check(state: &GameState, target: Seat) -> ResolverResult {
    let result = seer_check_common(state, target);
    ResolverResult::ok(
        NightResultsDiff::default(),
        Some(RevealDiff::WolfWitch(SeerReveal {
            target_seat: target,
            result,
        })),
    )
}

/// 女巫的救人子步骤：固定目标为狼刀目标，自救被拒绝。
pub fn witch_save(actor: Seat, wolf_kill_seat: Option<Seat>) -> ResolverResult {
    let Some(target) = wolf_kill_seat else {
        return ResolverResult::reject(RejectReason::InvalidAction);
    };
    if target == actor {
        return ResolverResult::reject(RejectReason::NotSelf);
    }
    let mut diff = NightResultsDiff::default();
    diff.saved_seat = Some(target);
    ResolverResult::ok(diff, None)
}

/// 女巫的毒人子步骤：自由选座，与救人相互独立。
pub fn witch_poison(target: Seat) -> ResolverResult {
    let mut diff = NightResultsDiff::default();
    diff.poisoned_seat = Some(target);
    ResolverResult::ok(diff, None)
}

pub fn guard_protect(target: Seat) -> ResolverResult {
    let mut diff = NightResultsDiff::default();
    diff.guarded_seat = Some(target);
    ResolverResult::ok(diff, None)
}

/// 狼美人的一次性魅惑：魅惑对象与狼美人殉情（若狼美人本夜死亡，见死亡计算
/// 规则 3）。魅惑发生于本夜投票之外，不参与狼刀目标判定。
pub fn wolf_queen_charm(target: Seat) -> ResolverResult {
    let mut diff = NightResultsDiff::default();
    diff.charmed_seat = Some(target);
    ResolverResult::ok(diff, None)
}

/// 摄梦人的保护目标不由玩家提交，而是在夜晚开始时由宿主层（持有随机数生
/// 成器）选定一次后，通过这个构造器写入初始的 `currentNightResults`。
pub fn dreamcatcher_initial_protect(target: Seat) -> NightResultsDiff {
    let mut diff = NightResultsDiff::default();
    diff.dream_target_seat = Some(target);
    diff
}

pub fn magician_swap(a: Seat, b: Seat) -> ResolverResult {
    if a == b {
        return ResolverResult::reject(RejectReason::InvalidAction);
    }
    let mut diff = NightResultsDiff::default();
    diff.swapped_seats = Some((a, b));
    ResolverResult::ok(diff, None)
}

/// 封印目标；若目标身份阵营为狼，本夜狼刀被禁用。
pub fn nightmare_block(state: &GameState, target: Seat) -> ResolverResult {
    let mut diff = NightResultsDiff::default();
    diff.blocked_seat = Some(target);
    if let Some(role) = state.role_at(target) {
        if team_of(role) == Team::Wolf {
            diff.wolf_kill_disabled = Some(true);
        }
    }
    ResolverResult::ok(diff, None)
}

pub fn wolf_robot_learn(state: &GameState, target: Seat) -> ResolverResult {
    let Some(learned_role) = state.role_at(target) else {
        return ResolverResult::reject(RejectReason::InvalidSeat);
    };
    let mut diff = NightResultsDiff::default();
    diff.wolf_robot_context = Some(WolfRobotContext {
        learned_seat: target,
        disguised_role: learned_role,
    });
    ResolverResult::ok(
        diff,
        Some(RevealDiff::WolfRobot(WolfRobotReveal {
            learned_role_id: learned_role,
        })),
    )
}

/// 吹笛者魅惑：累积去重集合，已被约束校验拒绝重复目标。
pub fn piper_hypnotize(targets: &[Seat], already: &HashSet<Seat>) -> ResolverResult {
    let fresh: Vec<Seat> = targets
        .iter()
        .copied()
        .filter(|t| !already.contains(t))
        .collect();
    if fresh.is_empty() {
        return ResolverResult::reject(RejectReason::InvalidAction);
    }
    let mut diff = NightResultsDiff::default();
    diff.hypnotized_add = fresh;
    ResolverResult::ok(diff, None)
}

/// 黑狼王/猎人确认、吹笛者魅惑群体确认：解析器层几乎是空操作，门禁逻辑都在
/// handler 层完成。
pub fn confirm_noop() -> ResolverResult {
    ResolverResult::ok(NightResultsDiff::default(), None)
}

/// 狼刀投票提交（参见 wolf vote 专用协议）。对免疫狼刀的座位投票会被拒绝，
/// 狼人需要重新选择目标。
pub fn wolf_vote_submit(state: &GameState, actor: Seat, target: Option<Seat>) -> ResolverResult {
    if let Some(target_seat) = target {
        if let Some(role) = state.role_at(target_seat) {
            if registry().get(&role).map(|r| r.flags.immune_to_wolf_kill).unwrap_or(false) {
                return ResolverResult::reject_with_message(
                    RejectReason::InvalidAction,
                    "投票失败：该玩家免疫狼人攻击",
                );
            }
        }
    }
    let mut diff = NightResultsDiff::default();
    diff.wolf_vote = Some((actor, target));
    ResolverResult::ok(diff, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::role::RoleId;
    use crate::state::GameState;

    fn state_with_roles(roles: &[(Seat, RoleId)]) -> GameState {
        let mut state = GameState::new("1234".into(), "host".into(), 6);
        for (seat, role) in roles {
            state.players[*seat as usize] = Some(crate::state::Player::new(
                *seat,
                format!("uid-{seat}"),
                format!("p{seat}"),
                None,
            ));
            state.players[*seat as usize].as_mut().unwrap().role = Some(*role);
        }
        state
    }

    #[test]
    fn seer_check_reports_wolf_team_as_狼人() {
        let state = state_with_roles(&[(0, RoleId::Seer), (1, RoleId::Werewolf)]);
        let result = seer_check(&state, 1);
        match result.reveal {
            Some(RevealDiff::Seer(reveal)) => assert_eq!(reveal.result, "狼人"),
            _ => panic!("expected seer reveal"),
        }
    }

    #[test]
    fn seer_check_reports_good_team_as_好人() {
        let state = state_with_roles(&[(0, RoleId::Seer), (1, RoleId::Villager)]);
        let result = seer_check(&state, 1);
        match result.reveal {
            Some(RevealDiff::Seer(reveal)) => assert_eq!(reveal.result, "好人"),
            _ => panic!("expected seer reveal"),
        }
    }

    #[test]
    fn identity_resolution_composes_swap_then_disguise() {
        let mut state = state_with_roles(&[
            (0, RoleId::Seer),
            (1, RoleId::Werewolf),
            (2, RoleId::Villager),
        ]);
        state.current_night_results.swapped_seats = Some((1, 2));
        // seat 1's effective role is now seat 2's original role (villager).
        assert_eq!(resolve_role_for_checks(&state, 1), Some(RoleId::Villager));
        assert_eq!(resolve_role_for_checks(&state, 2), Some(RoleId::Werewolf));
    }

    #[test]
    fn witch_cannot_save_self() {
        let result = witch_save(3, Some(3));
        assert!(!result.valid);
        assert_eq!(result.reject_reason, Some(RejectReason::NotSelf));
    }

    #[test]
    fn nightmare_block_disables_wolf_kill_when_target_is_wolf() {
        let state = state_with_roles(&[(0, RoleId::NightmareWolf), (1, RoleId::Werewolf)]);
        let result = nightmare_block(&state, 1);
        assert_eq!(result.updates.wolf_kill_disabled, Some(true));
    }

    #[test]
    fn nightmare_block_leaves_wolf_kill_enabled_for_non_wolf_target() {
        let state = state_with_roles(&[(0, RoleId::NightmareWolf), (1, RoleId::Guard)]);
        let result = nightmare_block(&state, 1);
        assert_eq!(result.updates.wolf_kill_disabled, None);
    }

    #[test]
    fn piper_hypnotize_rejects_when_all_targets_already_hypnotized() {
        let mut already = HashSet::new();
        already.insert(2u8);
        let result = piper_hypnotize(&[2], &already);
        assert!(!result.valid);
    }

    #[test]
    fn wolf_queen_charm_writes_charmed_seat() {
        let result = wolf_queen_charm(4);
        assert_eq!(result.updates.charmed_seat, Some(4));
    }

    #[test]
    fn dreamcatcher_initial_protect_writes_dream_target() {
        let diff = dreamcatcher_initial_protect(2);
        assert_eq!(diff.dream_target_seat, Some(2));
    }
}
