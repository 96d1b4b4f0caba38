//! 应用配置（组件文档 §4.12）：沿用教师代码的 `ConfigManager` 形态——优先
//! 便携式路径（可执行文件旁的 `config/`），否则回退到系统配置目录；JSON
//! 损坏时 fail-fast 成 `AppError::Config`。

use crate::error::{AppError, AppResult};
use log::info;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::fs;

/// 应用配置顶层结构。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub game: GameDefaults,
    pub audio: AudioConfig,
    pub app: GeneralConfig,
}

/// 房间模板的默认值；日间讨论/投票计时字段只是为将来的日间扩展保留座位，
/// 本引擎自身不消费它们——但 `UPDATE_TEMPLATE`/`ASSIGN_ROLES` 仍然需要一个
/// `GameConfig` 形状的种子数据来初始化新房间。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameDefaults {
    pub default_template: Vec<crate::role::RoleId>,
    pub discussion_time_secs: u32,
    pub voting_time_secs: u32,
}

/// 音频播放配置。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioConfig {
    pub enabled: bool,
    pub volume: u8,
    pub assets_dir: String,
}

/// 通用配置。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneralConfig {
    pub log_level: String,
    pub theme: String,
    pub language: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        use crate::role::RoleId::*;
        Self {
            game: GameDefaults {
                default_template: vec![
                    Werewolf, Werewolf, Werewolf, Seer, Witch, Guard, Hunter, Villager, Villager,
                    Villager,
                ],
                discussion_time_secs: 300,
                voting_time_secs: 60,
            },
            audio: AudioConfig {
                enabled: true,
                volume: 80,
                assets_dir: "audio".to_string(),
            },
            app: GeneralConfig {
                log_level: "info".to_string(),
                theme: "auto".to_string(),
                language: "zh-CN".to_string(),
            },
        }
    }
}

/// 配置管理器。
pub struct ConfigManager {
    config_path: PathBuf,
    config: AppConfig,
}

impl ConfigManager {
    pub fn new() -> AppResult<Self> {
        let config_path = Self::get_config_path()?;
        let config = Self::load_or_create_config(&config_path)?;
        Ok(Self { config_path, config })
    }

    fn get_config_path() -> AppResult<PathBuf> {
        if let Ok(path) = Self::get_portable_config_path() {
            return Ok(path);
        }

        let mut path =
            dirs::config_dir().ok_or_else(|| AppError::Config("无法获取配置目录".to_string()))?;
        path.push("DuskWolf");
        if !path.exists() {
            std::fs::create_dir_all(&path)
                .map_err(|e| AppError::Config(format!("创建配置目录失败: {}", e)))?;
        }
        path.push("config.json");
        Ok(path)
    }

    fn get_portable_config_path() -> AppResult<PathBuf> {
        let exe_path = std::env::current_exe()
            .map_err(|e| AppError::Config(format!("无法获取可执行文件路径: {}", e)))?;
        let exe_dir = exe_path
            .parent()
            .ok_or_else(|| AppError::Config("无法获取可执行文件目录".to_string()))?;
        let config_dir = exe_dir.join("config");
        if !config_dir.exists() {
            std::fs::create_dir_all(&config_dir)
                .map_err(|e| AppError::Config(format!("创建便携式配置目录失败: {}", e)))?;
        }
        Ok(config_dir.join("config.json"))
    }

    fn load_or_create_config(config_path: &PathBuf) -> AppResult<AppConfig> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)
                .map_err(|e| AppError::Config(format!("读取配置文件失败: {}", e)))?;
            let config: AppConfig = serde_json::from_str(&content)
                .map_err(|e| AppError::Config(format!("解析配置文件失败: {}", e)))?;
            info!("已加载配置文件: {:?}", config_path);
            Ok(config)
        } else {
            let config = AppConfig::default();
            let content = serde_json::to_string_pretty(&config)
                .map_err(|e| AppError::Config(format!("序列化默认配置失败: {}", e)))?;
            std::fs::write(config_path, content)
                .map_err(|e| AppError::Config(format!("写入默认配置失败: {}", e)))?;
            info!("已创建默认配置文件: {:?}", config_path);
            Ok(config)
        }
    }

    pub fn get_config(&self) -> &AppConfig {
        &self.config
    }

    pub async fn update_game_defaults(&mut self, game: GameDefaults) -> AppResult<()> {
        self.config.game = game;
        self.save_config().await
    }

    pub async fn update_audio_config(&mut self, audio: AudioConfig) -> AppResult<()> {
        self.config.audio = audio;
        self.save_config().await
    }

    pub async fn update_general_config(&mut self, app: GeneralConfig) -> AppResult<()> {
        self.config.app = app;
        self.save_config().await
    }

    async fn save_config(&self) -> AppResult<()> {
        let content = serde_json::to_string_pretty(&self.config)
            .map_err(|e| AppError::Config(format!("序列化配置失败: {}", e)))?;
        fs::write(&self.config_path, content)
            .await
            .map_err(|e| AppError::Config(format!("保存配置失败: {}", e)))?;
        info!("配置已保存: {:?}", self.config_path);
        Ok(())
    }

    pub async fn reset_to_default(&mut self) -> AppResult<()> {
        self.config = AppConfig::default();
        self.save_config().await
    }

    pub fn export_config(&self) -> AppResult<String> {
        serde_json::to_string_pretty(&self.config)
            .map_err(|e| AppError::Config(format!("导出配置失败: {}", e)))
    }

    pub async fn import_config(&mut self, config_json: &str) -> AppResult<()> {
        let config: AppConfig = serde_json::from_str(config_json)
            .map_err(|e| AppError::Config(format!("解析导入配置失败: {}", e)))?;
        self.config = config;
        self.save_config().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_json() {
        let config = AppConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: AppConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.audio.volume, config.audio.volume);
        assert_eq!(parsed.game.default_template.len(), config.game.default_template.len());
    }
}
