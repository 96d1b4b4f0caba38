mod bots;
mod commands;
mod config;
mod constraints;
mod database;
mod death;
#[cfg(test)]
mod e2e_tests;
mod error;
mod handlers;
mod night_plan;
mod normalize;
mod progression;
mod protocol;
mod reducer;
mod resolvers;
mod role;
mod state;
mod store;
mod voice;
mod wolf_vote;

use commands::*;
use log::info;

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    info!("黄昏之狼 (DuskWolf) 启动中...");

    tauri::Builder::default()
        .plugin(tauri_plugin_opener::init::<tauri::Wry>())
        .setup(|app| {
            let app_state = tauri::async_runtime::block_on(commands::AppState::new())
                .expect("初始化应用状态失败");
            app.manage(app_state);
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            create_room,
            get_game_state,
            player_join,
            player_leave,
            player_viewed_role,
            player_action,
            player_wolf_vote,
            player_reveal_ack,
            player_wolf_robot_hunter_status_viewed,
            host_advance_night,
            host_end_night,
            host_update_template,
            host_assign_roles,
            host_start_night,
            host_restart_game,
            host_fill_with_bots,
            host_set_role_reveal_animation,
            ack_audio_finished,
            get_app_config,
            update_game_defaults,
            update_audio_config,
            update_general_config,
            export_config,
            import_config,
            get_night_history,
            get_app_version
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
