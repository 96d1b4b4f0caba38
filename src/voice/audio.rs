//! 单条语音资源的落地：key -> 文件路径，以及实际“播放”动作本身的抽象。

use crate::state::AudioEffect;

/// 把音效 key 解析成磁盘上的音频文件路径。
///
/// 普通 key 落在 `<assets_dir>/<key>.mp3`；`is_end_audio` 的收尾播报落在
/// `<assets_dir>/audio_end/<key>.mp3`，和教师代码按子目录归类音频素材的
/// 习惯一致。
pub fn resolve_audio_path(assets_dir: &str, effect: &AudioEffect) -> String {
    if effect.is_end_audio {
        format!("{}/audio_end/{}.mp3", assets_dir, effect.audio_key)
    } else {
        format!("{}/{}.mp3", assets_dir, effect.audio_key)
    }
}

/// 实际播放一个音频文件。真机实现会接到系统播放器；测试用一个记录调用
/// 而不真正出声的假实现替换它，和教师 `set_audio_callback` 的可插拔方式一致。
pub trait AudioPlayer: Send + Sync {
    fn play(&self, path: &str);
}

/// 生产环境占位实现：记一条日志，交由前端 `<audio>` 元素真正播放。
/// 桌面端引擎本身不做解码/输出,只负责决定"现在该播哪一个文件"。
pub struct LoggingAudioPlayer;

impl AudioPlayer for LoggingAudioPlayer {
    fn play(&self, path: &str) {
        log::info!("播放音效: {}", path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normal_effect_resolves_under_assets_dir() {
        let effect = AudioEffect {
            audio_key: "wolf".to_string(),
            is_end_audio: false,
        };
        assert_eq!(resolve_audio_path("audio", &effect), "audio/wolf.mp3");
    }

    #[test]
    fn end_audio_resolves_under_audio_end_subdirectory() {
        let effect = AudioEffect {
            audio_key: "wolf".to_string(),
            is_end_audio: true,
        };
        assert_eq!(
            resolve_audio_path("audio", &effect),
            "audio/audio_end/wolf.mp3"
        );
    }
}
