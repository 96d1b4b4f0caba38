//! 持久化行结构。一局一夜结束（`END_NIGHT`）落一条 [`NightRecord`]。

use crate::role::RoleId;
use crate::state::{GameState, Seat};
use serde::{Deserialize, Serialize};

/// 一条已完成夜晚的存档记录。`state_snapshot` 是终局 `GameState` 的完整
/// JSON 快照，房号/模板/死亡座位额外拆成独立列方便不解析 JSON 就能查询。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NightRecord {
    pub id: String,
    pub room_code: String,
    pub template_roles: Vec<RoleId>,
    pub final_deaths: Vec<Seat>,
    pub state_snapshot: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl NightRecord {
    pub fn from_final_state(id: String, state: &GameState) -> serde_json::Result<Self> {
        Ok(NightRecord {
            id,
            room_code: state.room_code.clone(),
            template_roles: state.template_roles.clone(),
            final_deaths: state.last_night_deaths.clone(),
            state_snapshot: serde_json::to_string(state)?,
            created_at: chrono::Utc::now(),
        })
    }
}

/// 数据库级统计信息，供管理端/调试面板展示。
#[derive(Debug, Clone)]
pub struct DatabaseStatistics {
    pub total_nights: u32,
    pub last_night_time: Option<chrono::DateTime<chrono::Utc>>,
}
