//! Tauri 命令层：每个命令取一次应用状态的写锁，跑完
//! 处理器 → 归纳器 → 推进驱动 → 机器人兜底 这条流水线再落锁,
//! 从观察者的角度看每次调度都是原子的（组件文档 §5）。

use crate::bots;
use crate::config::{AppConfig, AudioConfig, ConfigManager, GameDefaults, GeneralConfig};
use crate::database::{DatabaseManager, NightRecord};
use crate::error::{AppError, AppResult};
use crate::handlers::{self, HandlerOutcome, NightFlowHandler};
use crate::progression;
use crate::protocol::{ActionExtra, PlayerMessage, RejectReason};
use crate::reducer::{reduce, StateAction};
use crate::role::RoleId;
use crate::state::{GameState, Seat, Uid};
use crate::store::GameStore;
use crate::voice::{AudioHost, AudioHostConfig, LoggingAudioPlayer};
use log::info;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex as AsyncMutex;
use uuid::Uuid;

/// 应用程序共享状态,在 `tauri::Builder::manage` 里挂载一次。
pub struct AppState {
    config: AsyncMutex<ConfigManager>,
    store: GameStore,
    db: DatabaseManager,
    audio: AudioHost,
}

impl AppState {
    pub async fn new() -> AppResult<Self> {
        let config = ConfigManager::new()?;
        let assets_dir = config.get_config().audio.assets_dir.clone();
        let db = DatabaseManager::new().await?;
        Ok(Self {
            config: AsyncMutex::new(config),
            store: GameStore::new(),
            db,
            audio: AudioHost::new(
                AudioHostConfig {
                    assets_dir,
                    enabled: true,
                },
                Arc::new(LoggingAudioPlayer),
            ),
        })
    }
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// 把一条处理器结果应用进状态:先回放它自己的 `StateAction`,若它携带了
/// 音效(`ADVANCE_NIGHT`/`END_NIGHT` 才会),再补上推进驱动用的同一套
/// `SET_PENDING_AUDIO_EFFECTS` + `SET_AUDIO_PLAYING(true)` 包装。
fn apply_outcome(mut state: GameState, outcome: HandlerOutcome) -> Result<GameState, AppError> {
    for action in outcome.actions {
        state = reduce(state, action).map_err(|e| AppError::GameLogic(e.to_string()))?;
    }
    if !outcome.audio_effects.is_empty() {
        state = reduce(
            state,
            StateAction::SetPendingAudioEffects {
                effects: outcome.audio_effects,
            },
        )
        .map_err(|e| AppError::GameLogic(e.to_string()))?;
        state = reduce(state, StateAction::SetAudioPlaying { playing: true })
            .map_err(|e| AppError::GameLogic(e.to_string()))?;
    }
    Ok(state)
}

/// 推进驱动 + 机器人兜底,跑到下一个真正需要玩家输入的节点为止。
fn settle(mut state: GameState) -> Result<GameState, AppError> {
    loop {
        let before = state.current_step_id;
        let before_status = state.status;
        state = progression::drive(state, now_ms()).map_err(|e| AppError::GameLogic(e.to_string()))?;
        let bot_actions = bots::submit_bot_actions(&state, now_ms());
        if bot_actions.is_empty() {
            if state.current_step_id == before && state.status == before_status {
                break;
            }
            continue;
        }
        for action in bot_actions {
            state = reduce(state, action).map_err(|e| AppError::GameLogic(e.to_string()))?;
        }
    }
    Ok(state)
}

async fn persist_if_ended(app: &AppState, state: &GameState) -> AppResult<()> {
    if state.status != crate::state::GameStatus::Ended {
        return Ok(());
    }
    let record = NightRecord::from_final_state(Uuid::new_v4().to_string(), state)?;
    app.db.record_night(&record).await?;
    Ok(())
}

/// 取一次写锁,跑完整条流水线(处理 -> 归纳 -> 推进 -> 兜底 -> 持久化 -> 落盘),
/// 返回规范化后的广播载荷。
async fn commit(
    app: &tauri::State<'_, AppState>,
    handle: impl FnOnce(&GameState) -> Result<HandlerOutcome, handlers::Rejection>,
) -> AppResult<Value> {
    let current = app
        .store
        .get_state()
        .ok_or_else(|| AppError::GameLogic(RejectReason::NoState.chinese_hint().to_string()))?;

    let outcome = handle(&current)?;
    let state = apply_outcome(current, outcome)?;
    let state = settle(state)?;
    persist_if_ended(app, &state).await?;

    let payload = crate::normalize::normalize(&state)
        .map_err(|e| AppError::Serialization(e.to_string()))?;
    app.store.set_state(state);
    Ok(payload)
}

#[tauri::command]
pub async fn create_room(
    app: tauri::State<'_, AppState>,
    room_code: String,
    host_uid: Uid,
    seat_count: u8,
) -> AppResult<Value> {
    let state = GameState::new(room_code, host_uid, seat_count);
    let payload =
        crate::normalize::normalize(&state).map_err(|e| AppError::Serialization(e.to_string()))?;
    app.store.initialize(state);
    Ok(payload)
}

#[tauri::command]
pub async fn get_game_state(app: tauri::State<'_, AppState>) -> AppResult<Option<Value>> {
    match app.store.get_state() {
        Some(state) => Ok(Some(
            crate::normalize::normalize(&state).map_err(|e| AppError::Serialization(e.to_string()))?,
        )),
        None => Ok(None),
    }
}

#[tauri::command]
pub async fn player_join(
    app: tauri::State<'_, AppState>,
    seat: Seat,
    uid: Uid,
    display_name: String,
    avatar_url: Option<String>,
) -> AppResult<Value> {
    commit(&app, |state| {
        handlers::dispatch(
            state,
            PlayerMessage::Join {
                seat,
                uid,
                display_name,
                avatar_url,
            },
            false,
            now_ms(),
        )
    })
    .await
}

#[tauri::command]
pub async fn player_leave(app: tauri::State<'_, AppState>, seat: Seat, uid: Uid) -> AppResult<Value> {
    commit(&app, |state| {
        handlers::dispatch(state, PlayerMessage::Leave { seat, uid }, false, now_ms())
    })
    .await
}

#[tauri::command]
pub async fn player_viewed_role(app: tauri::State<'_, AppState>, seat: Seat) -> AppResult<Value> {
    commit(&app, |state| {
        handlers::dispatch(state, PlayerMessage::ViewedRole { seat }, false, now_ms())
    })
    .await
}

#[tauri::command]
pub async fn player_action(
    app: tauri::State<'_, AppState>,
    seat: Seat,
    role: RoleId,
    target: Option<Seat>,
    extra: Option<ActionExtra>,
) -> AppResult<Value> {
    commit(&app, |state| {
        handlers::dispatch(
            state,
            PlayerMessage::Action {
                seat,
                role,
                target,
                extra,
            },
            false,
            now_ms(),
        )
    })
    .await
}

#[tauri::command]
pub async fn player_wolf_vote(
    app: tauri::State<'_, AppState>,
    seat: Seat,
    target: Option<Seat>,
) -> AppResult<Value> {
    commit(&app, |state| {
        handlers::dispatch(state, PlayerMessage::WolfVote { seat, target }, false, now_ms())
    })
    .await
}

#[tauri::command]
pub async fn player_reveal_ack(
    app: tauri::State<'_, AppState>,
    seat: Seat,
    role: RoleId,
    revision: u64,
) -> AppResult<Value> {
    commit(&app, |state| {
        handlers::dispatch(
            state,
            PlayerMessage::RevealAck { seat, role, revision },
            false,
            now_ms(),
        )
    })
    .await
}

#[tauri::command]
pub async fn player_wolf_robot_hunter_status_viewed(
    app: tauri::State<'_, AppState>,
    seat: Seat,
) -> AppResult<Value> {
    commit(&app, |state| {
        handlers::dispatch(
            state,
            PlayerMessage::WolfRobotHunterStatusViewed { seat },
            false,
            now_ms(),
        )
    })
    .await
}

#[tauri::command]
pub async fn host_advance_night(app: tauri::State<'_, AppState>, uid: Uid) -> AppResult<Value> {
    commit(&app, |state| {
        handlers::dispatch(state, PlayerMessage::AdvanceNight { uid }, true, now_ms())
    })
    .await
}

#[tauri::command]
pub async fn host_end_night(app: tauri::State<'_, AppState>, uid: Uid) -> AppResult<Value> {
    commit(&app, |state| {
        handlers::dispatch(state, PlayerMessage::EndNight { uid }, true, now_ms())
    })
    .await
}

#[tauri::command]
pub async fn host_update_template(
    app: tauri::State<'_, AppState>,
    roles: Vec<RoleId>,
) -> AppResult<Value> {
    commit(&app, |state| handlers::handle_update_template(state, true, roles)).await
}

#[tauri::command]
pub async fn host_assign_roles(
    app: tauri::State<'_, AppState>,
    assignments: Vec<(Seat, RoleId)>,
) -> AppResult<Value> {
    commit(&app, |state| handlers::handle_assign_roles(state, true, assignments)).await
}

/// 开始第一夜。摄梦人的一次性保护目标由宿主层在此处用自己的随机数生成器
/// 挑选——纯处理器层不持有随机性(组件文档 §4.4)。
#[tauri::command]
pub async fn host_start_night(
    app: tauri::State<'_, AppState>,
    dream_target: Option<Seat>,
) -> AppResult<Value> {
    commit(&app, |state| handlers::handle_start_night(state, true, dream_target)).await
}

#[tauri::command]
pub async fn host_restart_game(app: tauri::State<'_, AppState>) -> AppResult<Value> {
    commit(&app, |state| handlers::handle_restart_game(state, true)).await
}

#[tauri::command]
pub async fn host_fill_with_bots(app: tauri::State<'_, AppState>) -> AppResult<Value> {
    commit(&app, |state| handlers::handle_fill_with_bots(state, true)).await
}

#[tauri::command]
pub async fn host_set_role_reveal_animation(
    app: tauri::State<'_, AppState>,
    animation: crate::state::RoleRevealAnimation,
) -> AppResult<Value> {
    commit(&app, |_state| {
        handlers::handle_set_role_reveal_animation(true, animation)
    })
    .await
}

#[tauri::command]
pub async fn get_app_config(app: tauri::State<'_, AppState>) -> AppResult<AppConfig> {
    Ok(app.config.lock().await.get_config().clone())
}

#[tauri::command]
pub async fn update_game_defaults(
    app: tauri::State<'_, AppState>,
    game: GameDefaults,
) -> AppResult<()> {
    app.config.lock().await.update_game_defaults(game).await
}

#[tauri::command]
pub async fn update_audio_config(
    app: tauri::State<'_, AppState>,
    audio: AudioConfig,
) -> AppResult<()> {
    app.config.lock().await.update_audio_config(audio).await
}

#[tauri::command]
pub async fn update_general_config(
    app: tauri::State<'_, AppState>,
    general: GeneralConfig,
) -> AppResult<()> {
    app.config.lock().await.update_general_config(general).await
}

#[tauri::command]
pub async fn export_config(app: tauri::State<'_, AppState>) -> AppResult<String> {
    app.config.lock().await.export_config()
}

#[tauri::command]
pub async fn import_config(app: tauri::State<'_, AppState>, config_json: String) -> AppResult<()> {
    app.config.lock().await.import_config(&config_json).await
}

#[tauri::command]
pub async fn get_night_history(
    app: tauri::State<'_, AppState>,
    room_code: String,
) -> AppResult<Vec<NightRecord>> {
    app.db.night_records_for_room(&room_code).await
}

#[tauri::command]
pub async fn ack_audio_finished(app: tauri::State<'_, AppState>) -> AppResult<Value> {
    let current = app
        .store
        .get_state()
        .ok_or_else(|| AppError::GameLogic(RejectReason::NoState.chinese_hint().to_string()))?;
    let state = app.audio.drain_and_play(current).map_err(|e| AppError::GameLogic(e.to_string()))?;
    let state = settle(state)?;
    persist_if_ended(&app, &state).await?;
    let payload =
        crate::normalize::normalize(&state).map_err(|e| AppError::Serialization(e.to_string()))?;
    app.store.set_state(state);
    Ok(payload)
}

#[tauri::command]
pub fn get_app_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

impl AppState {
    /// 应用退出前的收尾:目前只需要记一条日志,数据库连接池由 `SqlitePool`
    /// 的 `Drop` 自行处理。
    pub async fn shutdown(&self) {
        info!("应用状态正在关闭");
    }
}
