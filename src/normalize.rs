//! 规范化器（Normalizer，组件文档 §4.11）：把权威状态转换成广播载荷，对
//! 必需字段 fail-fast；两次规范化同一份已规范化的载荷必须等幂，这是重连
//! 补发允许重放同一份载荷的前提。
//!
//! `GameState` 上的 `HashMap<Seat, _>` / `HashMap<RoleId, _>` 键在 JSON 编
//! 码中天然被序列化为字符串（`serde_json` 对标量键做隐式字符串化），因此
//! 这里不需要额外的键规范化步骤——唯一需要手写的是必需字段校验。

use crate::state::GameState;
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum NormalizeError {
    #[error("broadcast payload root is not an object")]
    NotAnObject,
    #[error("missing required field: {0}")]
    MissingField(&'static str),
}

/// 组件文档 §4.11 点名的必需字段集合。
const REQUIRED_FIELDS: &[&str] = &[
    "roomCode",
    "hostUid",
    "status",
    "templateRoles",
    "players",
    "currentStepIndex",
    "isAudioPlaying",
];

/// 把权威状态序列化为广播载荷。`GameState` 的字段集合是编译期穷尽的，新增
/// 字段必须先加进结构体才能序列化，因此这里的运行时校验只需要针对
/// §4.11 明确列出的必需字段做 fail-fast，其余字段原样透传。
pub fn normalize(state: &GameState) -> Result<Value, NormalizeError> {
    let value = serde_json::to_value(state).expect("GameState always serializes to JSON");
    validate_required_fields(&value)?;
    Ok(value)
}

/// 对一份已经是广播载荷形状的 JSON 值重新做一次规范化——用于验证幂等性，
/// 以及重连补发时对缓存载荷的二次校验。
pub fn renormalize(value: Value) -> Result<Value, NormalizeError> {
    validate_required_fields(&value)?;
    Ok(value)
}

fn validate_required_fields(value: &Value) -> Result<(), NormalizeError> {
    let obj = value.as_object().ok_or(NormalizeError::NotAnObject)?;
    for field in REQUIRED_FIELDS {
        if !obj.contains_key(*field) {
            return Err(NormalizeError::MissingField(field));
        }
    }
    Ok(())
}
