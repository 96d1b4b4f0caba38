//! 端到端场景测试：从入座到夜晚结束跑完整条流水线（handler → reducer →
//! 推进驱动 → 音频确认），对照组件文档 §8 的六个场景断言最终死亡集合与
//! 关键中间状态。不覆盖单个模块内部分支——那些已经在各模块自己的
//! `#[cfg(test)]` 里验证过了。

#![cfg(test)]

use crate::handlers::{self, HandlerOutcome};
use crate::protocol::ActionExtra;
use crate::reducer::{reduce, StateAction};
use crate::progression;
use crate::role::{RoleId, SchemaId};
use crate::state::{GameState, GameStatus, Seat};
use crate::voice::{AudioHost, AudioHostConfig, LoggingAudioPlayer};
use std::sync::Arc;

fn apply(mut state: GameState, outcome: HandlerOutcome) -> GameState {
    for action in outcome.actions {
        state = reduce(state, action).expect("reducer should accept handler-produced actions");
    }
    if !outcome.audio_effects.is_empty() {
        state = reduce(
            state,
            StateAction::SetPendingAudioEffects {
                effects: outcome.audio_effects,
            },
        )
        .unwrap();
        state = reduce(state, StateAction::SetAudioPlaying { playing: true }).unwrap();
    }
    state
}

/// 跑推进驱动直到稳定，期间自动"播放并确认"任何挂起的音效队列——和
/// `commands::settle` + `ack_audio_finished` 的组合效果一致，只是没有机器人
/// 兜底（场景里的座位都是真人提交）。
fn settle(mut state: GameState, now: i64) -> GameState {
    let audio = AudioHost::new(AudioHostConfig::default(), Arc::new(LoggingAudioPlayer));
    loop {
        let before_step = state.current_step_id;
        let before_status = state.status;
        state = progression::drive(state, now).expect("progression drive should not error");
        if state.is_audio_playing {
            state = audio.drain_and_play(state).expect("audio drain should not error");
            continue;
        }
        if state.current_step_id == before_step && state.status == before_status {
            break;
        }
    }
    state
}

/// 建房 → 全员入座 → 铺设模板 → 分配角色 → 开始第一夜，一路跑到
/// `currentStepId` 落在模板的第一个步骤上。
fn setup_game(roles: Vec<RoleId>) -> GameState {
    let seat_count = roles.len() as Seat;
    let mut state = GameState::new("1234".into(), "host".into(), seat_count);

    for seat in 0..seat_count {
        let outcome =
            handlers::handle_join(&state, seat, format!("u{seat}"), format!("P{seat}"), None).unwrap();
        state = apply(state, outcome);
    }

    let outcome = handlers::handle_update_template(&state, true, roles.clone()).unwrap();
    state = apply(state, outcome);

    let assignments: Vec<(Seat, RoleId)> = roles.iter().copied().enumerate().map(|(i, r)| (i as Seat, r)).collect();
    let outcome = handlers::handle_assign_roles(&state, true, assignments).unwrap();
    state = apply(state, outcome);

    let outcome = handlers::handle_start_night(&state, true, None).unwrap();
    state = apply(state, outcome);

    state
}

/// 场景 1：守卫守住了狼刀目标，和平夜。
#[test]
fn scenario_guard_protects_wolf_target_peaceful_night() {
    let state = setup_game(vec![RoleId::Werewolf, RoleId::Guard, RoleId::Villager]);
    assert_eq!(state.current_step_id, Some(SchemaId::GuardProtect));

    let outcome = handlers::handle_action(&state, 1, RoleId::Guard, Some(2), None).unwrap();
    let state = apply(state, outcome);
    let state = settle(state, 1000);
    assert_eq!(state.current_step_id, Some(SchemaId::WolfKill));

    let outcome = handlers::handle_wolf_vote(&state, 0, Some(2), 1000).unwrap();
    let state = apply(state, outcome);
    let state = settle(state, 6000);

    assert_eq!(state.status, GameStatus::Ended);
    assert!(state.last_night_deaths.is_empty());
}

/// 场景 2：女巫毒人，两人死亡。
#[test]
fn scenario_witch_poison_causes_two_deaths() {
    let state = setup_game(vec![
        RoleId::Werewolf,
        RoleId::Witch,
        RoleId::Villager,
        RoleId::Villager,
    ]);
    assert_eq!(state.current_step_id, Some(SchemaId::WolfKill));

    let outcome = handlers::handle_wolf_vote(&state, 0, Some(2), 1000).unwrap();
    let state = apply(state, outcome);
    let state = settle(state, 6000);
    assert_eq!(state.current_step_id, Some(SchemaId::WitchAction));

    let extra = ActionExtra {
        save: None,
        poison_target: Some(3),
        swap_targets: None,
        hypnotize_targets: None,
    };
    let outcome = handlers::handle_action(&state, 1, RoleId::Witch, None, Some(extra)).unwrap();
    let state = apply(state, outcome);
    let state = settle(state, 6000);

    assert_eq!(state.status, GameStatus::Ended);
    assert_eq!(state.last_night_deaths, vec![2, 3]);
}

/// 场景 2b：女巫同一提交内同时救人与毒人，两个子决定互不影响。
#[test]
fn scenario_witch_save_and_poison_together_in_one_submission() {
    let state = setup_game(vec![
        RoleId::Werewolf,
        RoleId::Witch,
        RoleId::Villager,
        RoleId::Villager,
    ]);
    assert_eq!(state.current_step_id, Some(SchemaId::WolfKill));

    let outcome = handlers::handle_wolf_vote(&state, 0, Some(2), 1000).unwrap();
    let state = apply(state, outcome);
    let state = settle(state, 6000);
    assert_eq!(state.current_step_id, Some(SchemaId::WitchAction));

    let extra = ActionExtra {
        save: Some(true),
        poison_target: Some(3),
        swap_targets: None,
        hypnotize_targets: None,
    };
    let outcome = handlers::handle_action(&state, 1, RoleId::Witch, None, Some(extra)).unwrap();
    let state = apply(state, outcome);
    let state = settle(state, 6000);

    assert_eq!(state.status, GameStatus::Ended);
    // 狼刀目标被救回，被毒的座位仍然死亡:唯一死者是女巫毒杀的目标。
    assert_eq!(state.last_night_deaths, vec![3]);
}

/// 场景 3：空刀，和平夜。
#[test]
fn scenario_empty_wolf_kill_is_peaceful() {
    let state = setup_game(vec![RoleId::Werewolf, RoleId::Villager]);
    let outcome = handlers::handle_wolf_vote(&state, 0, None, 1000).unwrap();
    let state = apply(state, outcome);
    let state = settle(state, 6000);

    assert_eq!(state.status, GameStatus::Ended);
    assert!(state.last_night_deaths.is_empty());
}

/// 场景 4：噩梦封印守卫，狼刀得手。
#[test]
fn scenario_nightmare_blocks_guard_so_wolf_kill_succeeds() {
    let state = setup_game(vec![RoleId::NightmareWolf, RoleId::Guard, RoleId::Villager]);
    assert_eq!(state.current_step_id, Some(SchemaId::NightmareBlock));

    let outcome = handlers::handle_action(&state, 0, RoleId::NightmareWolf, Some(1), None).unwrap();
    let state = apply(state, outcome);
    let state = settle(state, 1000);
    assert_eq!(state.current_step_id, Some(SchemaId::GuardProtect));

    let outcome = handlers::handle_action(&state, 1, RoleId::Guard, Some(2), None).unwrap();
    let state = apply(state, outcome);
    let state = settle(state, 1000);
    assert_eq!(state.current_step_id, Some(SchemaId::WolfKill));

    let outcome = handlers::handle_wolf_vote(&state, 0, Some(2), 1000).unwrap();
    let state = apply(state, outcome);
    let state = settle(state, 6000);

    assert_eq!(state.status, GameStatus::Ended);
    assert_eq!(state.last_night_deaths, vec![2]);
}

/// 场景 5：魔术师交换狼人与村民座位，预言家查验原狼人座位得到"好人"。
#[test]
fn scenario_magician_swap_flips_seer_result_on_original_seat() {
    let state = setup_game(vec![
        RoleId::Werewolf,
        RoleId::Villager,
        RoleId::Villager,
        RoleId::Seer,
        RoleId::Magician,
    ]);
    assert_eq!(state.current_step_id, Some(SchemaId::WolfKill));

    let outcome = handlers::handle_wolf_vote(&state, 0, Some(2), 1000).unwrap();
    let state = apply(state, outcome);
    let state = settle(state, 6000);
    assert_eq!(state.current_step_id, Some(SchemaId::MagicianSwap));

    let extra = ActionExtra {
        save: None,
        poison_target: None,
        swap_targets: Some((0, 1)),
        hypnotize_targets: None,
    };
    let outcome = handlers::handle_action(&state, 4, RoleId::Magician, None, Some(extra)).unwrap();
    let state = apply(state, outcome);
    let state = settle(state, 6000);
    assert_eq!(state.current_step_id, Some(SchemaId::SeerCheck));

    let outcome = handlers::handle_action(&state, 3, RoleId::Seer, Some(0), None).unwrap();
    let state = apply(state, outcome);

    let reveal = state.reveals.seer_reveal.clone().expect("seer reveal recorded");
    assert_eq!(reveal.result, "好人");

    // 查验产生的 reveal 需要确认才能继续推进，否则夜晚会卡在这一步。
    let outcome = handlers::handle_reveal_ack(&state, 3, RoleId::Seer, 0).unwrap();
    let state = apply(state, outcome);
    let state = settle(state, 6000);

    assert_eq!(state.status, GameStatus::Ended);
    assert_eq!(state.last_night_deaths, vec![2]);
}

/// 场景 6：恶灵骑士免疫狼刀——投票被拒绝，改投其他目标后成功结束夜晚。
#[test]
fn scenario_spirit_knight_immunity_rejects_vote_then_revote_succeeds() {
    let state = setup_game(vec![RoleId::Werewolf, RoleId::SpiritKnight, RoleId::Villager]);
    assert_eq!(state.current_step_id, Some(SchemaId::WolfKill));

    let rejection = handlers::handle_wolf_vote(&state, 0, Some(1), 1000).unwrap_err();
    let message = rejection.message.expect("rejection carries a Chinese explanation");
    assert!(message.contains("投票失败"));
    // 被拒绝的投票不得写入状态。
    assert!(!state
        .current_night_results
        .wolf_votes_by_seat
        .contains_key(&0));

    let outcome = handlers::handle_wolf_vote(&state, 0, Some(2), 1000).unwrap();
    let state = apply(state, outcome);
    let state = settle(state, 6000);

    assert_eq!(state.status, GameStatus::Ended);
    assert_eq!(state.last_night_deaths, vec![2]);
}
