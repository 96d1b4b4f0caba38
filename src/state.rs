//! 游戏状态的数据模型。`GameState` 是引擎唯一拥有的权威状态，也是广播的
//! 原始形状（经 [`crate::normalize`] 规范化后）。

use crate::role::{RoleId, SchemaId};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

pub type Seat = u8;
pub type Uid = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameStatus {
    Unseated,
    Seated,
    Assigned,
    Ready,
    Ongoing,
    Ended,
}

/// 翻牌动画配置。`Random` 由 [`resolve_role_reveal_animation`] 在
/// `{roomCode, nonce}` 上确定性地解析为某个具体动画；其余变体本身已是
/// 具体动画，原样透传。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RoleRevealAnimation {
    Random,
    Flip,
    Fade,
    SlideUp,
}

const CONCRETE_ANIMATIONS: [RoleRevealAnimation; 3] =
    [RoleRevealAnimation::Flip, RoleRevealAnimation::Fade, RoleRevealAnimation::SlideUp];

/// `roomCode` + `nonce` 上的确定性选择：同一个房间码、同一个 nonce 永远解析
/// 到同一个具体动画，重开局后 nonce 变化则重新解析。非 `Random` 的配置原样
/// 透传,不经过哈希。
pub fn resolve_role_reveal_animation(
    config: RoleRevealAnimation,
    room_code: &str,
    nonce: u64,
) -> RoleRevealAnimation {
    if config != RoleRevealAnimation::Random {
        return config;
    }
    let mut hash: u64 = 1469598103934665603; // FNV-1a offset basis
    for byte in room_code.as_bytes() {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(1099511628211);
    }
    hash ^= nonce;
    hash = hash.wrapping_mul(1099511628211);
    CONCRETE_ANIMATIONS[(hash as usize) % CONCRETE_ANIMATIONS.len()]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub uid: Uid,
    pub seat_number: Seat,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub role: Option<RoleId>,
    pub has_viewed_role: bool,
    #[serde(default)]
    pub is_bot: bool,
}

impl Player {
    pub fn new(seat: Seat, uid: Uid, display_name: String, avatar_url: Option<String>) -> Self {
        Player {
            uid,
            seat_number: seat,
            display_name,
            avatar_url,
            role: None,
            has_viewed_role: false,
            is_bot: false,
        }
    }
}

/// 夜晚协议动作的不可变审计记录（线上稳定格式）。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtocolAction {
    pub schema_id: SchemaId,
    pub actor_seat: Seat,
    pub target_seat: Option<Seat>,
    pub timestamp: i64,
}

/// 本夜累积的派生事实。键名与规范保持一致，方便对照。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NightResults {
    #[serde(default)]
    pub wolf_votes_by_seat: HashMap<Seat, Option<Seat>>,
    pub saved_seat: Option<Seat>,
    pub poisoned_seat: Option<Seat>,
    pub guarded_seat: Option<Seat>,
    pub swapped_seats: Option<(Seat, Seat)>,
    pub blocked_seat: Option<Seat>,
    #[serde(default)]
    pub hypnotized_seats: HashSet<Seat>,
    pub dream_target_seat: Option<Seat>,
    pub charmed_seat: Option<Seat>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WolfRobotContext {
    pub learned_seat: Seat,
    pub disguised_role: RoleId,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reveals {
    pub seer_reveal: Option<SeerReveal>,
    pub psychic_reveal: Option<SeerReveal>,
    pub gargoyle_reveal: Option<SeerReveal>,
    pub wolf_robot_reveal: Option<WolfRobotReveal>,
    pub mirror_seer_reveal: Option<SeerReveal>,
    pub drunk_seer_reveal: Option<SeerReveal>,
    pub pure_white_reveal: Option<SeerReveal>,
    pub wolf_witch_reveal: Option<SeerReveal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeerReveal {
    pub target_seat: Seat,
    pub result: &'static str,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WolfRobotReveal {
    pub learned_role_id: RoleId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WitchContext {
    pub wolf_kill_seat: Option<Seat>,
    pub can_save: bool,
    pub can_poison: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmStatus {
    pub can_shoot: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActorHintKind {
    BlockedByNightmare,
    WolfKillDisabled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorHint {
    pub kind: ActorHintKind,
    pub target_role_ids: Vec<RoleId>,
    pub message: &'static str,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiState {
    pub current_actor_hint: Option<ActorHint>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionRejected {
    pub reason: String,
    pub target_uid: Option<Uid>,
    pub rejection_id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugMode {
    pub bots_enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioEffect {
    pub audio_key: String,
    #[serde(default)]
    pub is_end_audio: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    pub room_code: String,
    pub host_uid: Uid,
    pub status: GameStatus,
    pub template_roles: Vec<RoleId>,
    pub players: Vec<Option<Player>>,
    pub current_step_index: i32,
    pub current_step_id: Option<SchemaId>,
    pub actions: Vec<ProtocolAction>,
    pub current_night_results: NightResults,
    #[serde(default)]
    pub pending_reveal_acks: HashSet<String>,
    pub last_night_deaths: Vec<Seat>,
    pub is_audio_playing: bool,
    pub wolf_vote_deadline: Option<i64>,
    pub pending_audio_effects: Vec<AudioEffect>,
    pub wolf_kill_disabled: bool,
    pub nightmare_blocked_seat: Option<Seat>,
    pub wolf_robot_context: Option<WolfRobotContext>,
    pub wolf_robot_hunter_status_viewed: bool,
    pub reveals: Reveals,
    pub witch_context: Option<WitchContext>,
    pub confirm_status: Option<ConfirmStatus>,
    pub ui: UiState,
    pub seer_label_map: HashMap<RoleId, u8>,
    pub role_reveal_animation: RoleRevealAnimation,
    pub resolved_role_reveal_animation: RoleRevealAnimation,
    pub role_reveal_random_nonce: u64,
    pub debug_mode: DebugMode,
    pub action_rejected: Option<ActionRejected>,
}

impl GameState {
    pub fn new(room_code: String, host_uid: Uid, seat_count: u8) -> Self {
        let role_reveal_animation = RoleRevealAnimation::Random;
        let resolved_role_reveal_animation =
            resolve_role_reveal_animation(role_reveal_animation, &room_code, 0);
        GameState {
            room_code,
            host_uid,
            status: GameStatus::Unseated,
            template_roles: Vec::new(),
            players: vec![None; seat_count as usize],
            current_step_index: -1,
            current_step_id: None,
            actions: Vec::new(),
            current_night_results: NightResults::default(),
            pending_reveal_acks: HashSet::new(),
            last_night_deaths: Vec::new(),
            is_audio_playing: false,
            wolf_vote_deadline: None,
            pending_audio_effects: Vec::new(),
            wolf_kill_disabled: false,
            nightmare_blocked_seat: None,
            wolf_robot_context: None,
            wolf_robot_hunter_status_viewed: false,
            reveals: Reveals::default(),
            witch_context: None,
            confirm_status: None,
            ui: UiState::default(),
            seer_label_map: HashMap::new(),
            role_reveal_animation,
            resolved_role_reveal_animation,
            role_reveal_random_nonce: 0,
            debug_mode: DebugMode::default(),
            action_rejected: None,
        }
    }

    pub fn player_at(&self, seat: Seat) -> Option<&Player> {
        self.players.get(seat as usize).and_then(|p| p.as_ref())
    }

    pub fn role_at(&self, seat: Seat) -> Option<RoleId> {
        self.player_at(seat).and_then(|p| p.role)
    }

    pub fn seat_count(&self) -> u8 {
        self.players.len() as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_state_starts_unseated_and_out_of_night() {
        let state = GameState::new("1234".to_string(), "host-1".to_string(), 6);
        assert_eq!(state.status, GameStatus::Unseated);
        assert_eq!(state.current_step_index, -1);
        assert!(state.current_step_id.is_none());
        assert_eq!(state.players.len(), 6);
    }

    #[test]
    fn role_reveal_animation_resolution_is_deterministic_on_room_and_nonce() {
        let a = resolve_role_reveal_animation(RoleRevealAnimation::Random, "1234", 7);
        let b = resolve_role_reveal_animation(RoleRevealAnimation::Random, "1234", 7);
        assert_eq!(a, b);
    }

    #[test]
    fn role_reveal_animation_resolution_changes_with_nonce() {
        let a = resolve_role_reveal_animation(RoleRevealAnimation::Random, "1234", 0);
        let b = resolve_role_reveal_animation(RoleRevealAnimation::Random, "1234", 1);
        // 不保证一定不同(哈希可能撞上同一个具体动画),但至少函数本身可调用
        // 且两次解析都落在合法的具体动画集合里。
        assert!(CONCRETE_ANIMATIONS.contains(&a));
        assert!(CONCRETE_ANIMATIONS.contains(&b));
    }

    #[test]
    fn non_random_animation_config_passes_through_unchanged() {
        let resolved = resolve_role_reveal_animation(RoleRevealAnimation::Flip, "1234", 99);
        assert_eq!(resolved, RoleRevealAnimation::Flip);
    }
}
