//! 对外协议：入站 `PlayerMessage`、出站 `HostBroadcast`，以及拒绝原因分类。
//! 传输层（不在本 crate 范围内）负责把这些类型序列化到具体的信道上；这里
//! 只定义线上稳定的判别式联合体。

use crate::role::{RoleId, SchemaId};
use crate::state::{GameState, Seat, Uid};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PlayerMessage {
    #[serde(rename = "REQUEST_STATE")]
    RequestState { uid: Uid },
    #[serde(rename = "SNAPSHOT_REQUEST")]
    SnapshotRequest {
        request_id: String,
        uid: Uid,
        last_revision: Option<u64>,
    },
    #[serde(rename = "JOIN")]
    Join {
        seat: Seat,
        uid: Uid,
        display_name: String,
        avatar_url: Option<String>,
    },
    #[serde(rename = "LEAVE")]
    Leave { seat: Seat, uid: Uid },
    #[serde(rename = "VIEWED_ROLE")]
    ViewedRole { seat: Seat },
    #[serde(rename = "ACTION")]
    Action {
        seat: Seat,
        role: RoleId,
        target: Option<Seat>,
        extra: Option<ActionExtra>,
    },
    #[serde(rename = "WOLF_VOTE")]
    WolfVote { seat: Seat, target: Option<Seat> },
    #[serde(rename = "REVEAL_ACK")]
    RevealAck {
        seat: Seat,
        role: RoleId,
        revision: u64,
    },
    #[serde(rename = "WOLF_ROBOT_HUNTER_STATUS_VIEWED")]
    WolfRobotHunterStatusViewed { seat: Seat },
    #[serde(rename = "ADVANCE_NIGHT")]
    AdvanceNight { uid: Uid },
    #[serde(rename = "END_NIGHT")]
    EndNight { uid: Uid },
}

/// `ACTION` 的复合负载（例如女巫的救/毒选择）。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionExtra {
    pub save: Option<bool>,
    pub poison_target: Option<Seat>,
    pub swap_targets: Option<(Seat, Seat)>,
    pub hypnotize_targets: Option<Vec<Seat>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum HostBroadcast {
    #[serde(rename = "STATE_UPDATE")]
    StateUpdate {
        state: Box<GameState>,
        revision: u64,
    },
    #[serde(rename = "ROLE_TURN")]
    RoleTurn {
        role: RoleId,
        pending_seats: Vec<Seat>,
        killed_seat: Option<Seat>,
        step_id: Option<SchemaId>,
    },
    #[serde(rename = "NIGHT_END")]
    NightEnd { deaths: Vec<Seat> },
    #[serde(rename = "GAME_RESTARTED")]
    GameRestarted,
    #[serde(rename = "PLAYER_JOINED")]
    PlayerJoined {
        seat: Seat,
        player: crate::state::Player,
    },
    #[serde(rename = "PLAYER_LEFT")]
    PlayerLeft { seat: Seat },
    #[serde(rename = "SEAT_REJECTED")]
    SeatRejected {
        seat: Seat,
        request_uid: Uid,
        reason: RejectReason,
    },
    #[serde(rename = "SNAPSHOT_RESPONSE")]
    SnapshotResponse {
        request_id: String,
        to_uid: Uid,
        state: Box<GameState>,
        revision: u64,
    },
}

/// 业务拒绝原因分类。传输层自己的 `timeout`/`cancelled` 在此之外追加。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    NotAuthenticated,
    NoState,
    InvalidSeat,
    SeatTaken,
    GameInProgress,
    NotSeated,
    InvalidAction,
    HostOnly,
    InvalidStatus,
    ForbiddenWhileAudioPlaying,
    NightNotComplete,
    WolfrobotHunterStatusNotViewed,
    InvalidStep,
    NotLearnedHunter,
    NotSelf,
    Timeout,
    Cancelled,
}

impl RejectReason {
    /// 一部分解析器会在基础分类上附带中文说明，供 UI 直接展示。
    pub fn chinese_hint(self) -> &'static str {
        match self {
            RejectReason::NotAuthenticated => "未认证",
            RejectReason::NoState => "游戏状态不存在",
            RejectReason::InvalidSeat => "座位无效",
            RejectReason::SeatTaken => "座位已被占用",
            RejectReason::GameInProgress => "游戏已在进行中",
            RejectReason::NotSeated => "尚未入座",
            RejectReason::InvalidAction => "无效的动作",
            RejectReason::HostOnly => "仅房主可操作",
            RejectReason::InvalidStatus => "当前状态不允许该操作",
            RejectReason::ForbiddenWhileAudioPlaying => "语音播放中，暂不可操作",
            RejectReason::NightNotComplete => "夜晚尚未结束",
            RejectReason::WolfrobotHunterStatusNotViewed => "机械狼尚未确认猎人身份状态",
            RejectReason::InvalidStep => "当前步骤不匹配",
            RejectReason::NotLearnedHunter => "未学习到猎人身份",
            RejectReason::NotSelf => "不能选择自己",
            RejectReason::Timeout => "操作超时",
            RejectReason::Cancelled => "操作已取消",
        }
    }
}
