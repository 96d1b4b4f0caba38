//! 音频播放宿主：消费 `pendingAudioEffects` 队列并在播放完成后清空它。
//!
//! 沿用教师 `VoiceManager`/`AudioManager` 的异步管理器形态,但只保留播放
//! 这一侧——语音识别/合成不在范围内（夜晚阶段没有发言）。

pub mod audio;

pub use audio::{AudioPlayer, LoggingAudioPlayer};

use crate::reducer::{reduce, StateAction};
use crate::state::GameState;
use audio::resolve_audio_path;
use std::sync::Arc;

/// 音频宿主配置。
#[derive(Debug, Clone)]
pub struct AudioHostConfig {
    pub assets_dir: String,
    pub enabled: bool,
}

impl Default for AudioHostConfig {
    fn default() -> Self {
        Self {
            assets_dir: "audio".to_string(),
            enabled: true,
        }
    }
}

/// 音频宿主:按队列顺序把每个音效解析成文件路径并交给注入的播放器播放,
/// 播放完成后把 `state` 推进到 `isAudioPlaying=false` 且队列清空。
pub struct AudioHost {
    config: AudioHostConfig,
    player: Arc<dyn AudioPlayer>,
}

impl AudioHost {
    pub fn new(config: AudioHostConfig, player: Arc<dyn AudioPlayer>) -> Self {
        Self { config, player }
    }

    /// 依次播放 `state.pending_audio_effects` 中的每一项,然后返回推进后的状态。
    /// 队列为空或音频被禁用时原样返回,不产生多余的 reducer 调用。
    pub fn drain_and_play(&self, state: GameState) -> Result<GameState, crate::reducer::ReducerError> {
        if state.pending_audio_effects.is_empty() {
            return Ok(state);
        }

        if self.config.enabled {
            for effect in &state.pending_audio_effects {
                let path = resolve_audio_path(&self.config.assets_dir, effect);
                self.player.play(&path);
            }
        }

        let state = reduce(state, StateAction::ClearPendingAudioEffects)?;
        reduce(state, StateAction::SetAudioPlaying { playing: false })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AudioEffect;
    use std::sync::Mutex;

    struct RecordingPlayer {
        played: Mutex<Vec<String>>,
    }

    impl RecordingPlayer {
        fn new() -> Self {
            Self {
                played: Mutex::new(Vec::new()),
            }
        }
    }

    impl AudioPlayer for RecordingPlayer {
        fn play(&self, path: &str) {
            self.played.lock().unwrap().push(path.to_string());
        }
    }

    fn base_state() -> GameState {
        GameState::new("1234".into(), "host".into(), 3)
    }

    #[test]
    fn drains_queue_and_clears_audio_playing_flag() {
        let mut state = base_state();
        state.pending_audio_effects = vec![AudioEffect {
            audio_key: "wolf".to_string(),
            is_end_audio: false,
        }];
        state.is_audio_playing = true;

        let player = Arc::new(RecordingPlayer::new());
        let host = AudioHost::new(AudioHostConfig::default(), player.clone());
        let state = host.drain_and_play(state).unwrap();

        assert!(state.pending_audio_effects.is_empty());
        assert!(!state.is_audio_playing);
        assert_eq!(*player.played.lock().unwrap(), vec!["audio/wolf.mp3".to_string()]);
    }

    #[test]
    fn empty_queue_is_a_no_op() {
        let state = base_state();
        let player = Arc::new(RecordingPlayer::new());
        let host = AudioHost::new(AudioHostConfig::default(), player.clone());
        let result = host.drain_and_play(state).unwrap();
        assert!(player.played.lock().unwrap().is_empty());
        assert!(!result.is_audio_playing);
    }
}
