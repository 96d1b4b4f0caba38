//! 狼刀投票协议（§4.5）：全员投票判定、倒计时调度与最终目标裁决。

use crate::role::{registry, RoleId};
use crate::state::{GameState, Seat};
use std::collections::HashMap;

pub const WOLF_VOTE_COUNTDOWN_MS: i64 = 5_000;

/// "全员已投票"判定是 fail-closed 的：找不到参与者角色或参与者数为零一律
/// 判定为 false，不允许倒计时在未知状态下意外启动。
pub fn is_wolf_vote_all_complete(state: &GameState) -> bool {
    let registry = registry();
    let participant_seats: Vec<Seat> = state
        .players
        .iter()
        .filter_map(|p| p.as_ref())
        .filter(|p| {
            p.role
                .and_then(|r| registry.get(&r))
                .and_then(|role| role.wolf_meeting)
                .map(|m| m.participates_in_wolf_vote)
                .unwrap_or(false)
        })
        .map(|p| p.seat_number)
        .collect();

    if participant_seats.is_empty() {
        return false;
    }

    participant_seats
        .iter()
        .all(|seat| state.current_night_results.wolf_votes_by_seat.contains_key(seat))
}

/// 计算下一个 `wolfVoteDeadline` 值：投票已满且无截止时间则设定；已满且已有
/// 截止时间则重置；投票不再齐全则清除；否则维持不变（None 表示不修改）。
pub fn next_deadline(all_voted: bool, has_deadline: bool, now: i64) -> Option<Option<i64>> {
    match (all_voted, has_deadline) {
        (true, false) => Some(Some(now + WOLF_VOTE_COUNTDOWN_MS)),
        (true, true) => Some(Some(now + WOLF_VOTE_COUNTDOWN_MS)),
        (false, true) => Some(None),
        (false, false) => None,
    }
}

/// 多数裁决，平票按目标座位号最小者裁决；空刀（`None`）不参与计票，若所有
/// 投票都是空刀则返回 `None`（和平夜）。
pub fn resolve_wolf_kill_target(votes: &HashMap<Seat, Option<Seat>>) -> Option<Seat> {
    let mut counts: HashMap<Seat, u32> = HashMap::new();
    for target in votes.values().flatten() {
        *counts.entry(*target).or_insert(0) += 1;
    }
    if counts.is_empty() {
        return None;
    }
    let max_votes = *counts.values().max().unwrap();
    counts
        .into_iter()
        .filter(|(_, count)| *count == max_votes)
        .map(|(seat, _)| seat)
        .min()
}

pub fn wolf_role_ids() -> Vec<RoleId> {
    registry()
        .into_iter()
        .filter(|(_, role)| role.wolf_meeting.map(|m| m.participates_in_wolf_vote).unwrap_or(false))
        .map(|(id, _)| id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_voted_true_no_deadline_sets_one() {
        assert_eq!(next_deadline(true, false, 1000), Some(Some(6000)));
    }

    #[test]
    fn all_voted_true_has_deadline_resets_it() {
        assert_eq!(next_deadline(true, true, 1000), Some(Some(6000)));
    }

    #[test]
    fn all_voted_false_has_deadline_clears_it() {
        assert_eq!(next_deadline(false, true, 1000), Some(None));
    }

    #[test]
    fn all_voted_false_no_deadline_is_noop() {
        assert_eq!(next_deadline(false, false, 1000), None);
    }

    #[test]
    fn majority_vote_wins() {
        let mut votes = HashMap::new();
        votes.insert(0u8, Some(5u8));
        votes.insert(1u8, Some(5u8));
        votes.insert(2u8, Some(3u8));
        assert_eq!(resolve_wolf_kill_target(&votes), Some(5));
    }

    #[test]
    fn tie_break_by_lowest_seat() {
        let mut votes = HashMap::new();
        votes.insert(0u8, Some(5u8));
        votes.insert(1u8, Some(3u8));
        assert_eq!(resolve_wolf_kill_target(&votes), Some(3));
    }

    #[test]
    fn all_empty_votes_is_peaceful() {
        let mut votes = HashMap::new();
        votes.insert(0u8, None);
        votes.insert(1u8, None);
        assert_eq!(resolve_wolf_kill_target(&votes), None);
    }
}
