//! 游戏存储（Game Store，组件文档 §4.10）：带版本号的状态容器，支持乐观
//! 应用/回滚与监听者订阅。监听者彼此故障隔离——一个监听者 panic 不会波及
//! 其余监听者，也不会波及存储本身。

use crate::state::GameState;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

pub type Revision = u64;

#[derive(Clone)]
pub struct Snapshot {
    pub revision: Revision,
    pub state: Option<GameState>,
}

type ListenerFn = dyn Fn(&Snapshot) + Send + Sync;

pub struct GameStore {
    inner: RwLock<Option<GameState>>,
    revision: AtomicU64,
    listeners: RwLock<HashMap<u64, Arc<ListenerFn>>>,
    next_listener_id: AtomicU64,
    optimistic: RwLock<Option<(GameState, Revision)>>,
}

impl GameStore {
    pub fn new() -> Self {
        GameStore {
            inner: RwLock::new(None),
            revision: AtomicU64::new(0),
            listeners: RwLock::new(HashMap::new()),
            next_listener_id: AtomicU64::new(0),
            optimistic: RwLock::new(None),
        }
    }

    pub fn initialize(&self, state: GameState) {
        *self.inner.write().unwrap() = Some(state);
        self.revision.fetch_add(1, Ordering::SeqCst);
        self.notify();
    }

    pub fn get_state(&self) -> Option<GameState> {
        self.inner.read().unwrap().clone()
    }

    pub fn revision(&self) -> Revision {
        self.revision.load(Ordering::SeqCst)
    }

    /// 用新状态替换当前状态，版本号单调递增。
    pub fn set_state(&self, state: GameState) {
        *self.inner.write().unwrap() = Some(state);
        self.revision.fetch_add(1, Ordering::SeqCst);
        self.notify();
    }

    /// 应用一个带版本号的快照；只有版本号严格大于当前版本号时才生效，
    /// fail-closed 防止乱序快照让状态倒退。返回是否真的被应用。
    pub fn apply_snapshot(&self, revision: Revision, state: GameState) -> bool {
        if revision <= self.revision.load(Ordering::SeqCst) {
            return false;
        }
        *self.inner.write().unwrap() = Some(state);
        self.revision.store(revision, Ordering::SeqCst);
        *self.optimistic.write().unwrap() = None;
        self.notify();
        true
    }

    /// 乐观应用一次本地推测的状态，不推进版本号；之后要么被真实快照覆盖，
    /// 要么显式回滚。连续两次乐观应用只保留最早的一次回滚锚点。
    pub fn apply_optimistic(&self, state: GameState) {
        let previous = self.inner.read().unwrap().clone();
        if let Some(previous) = previous {
            let mut anchor = self.optimistic.write().unwrap();
            if anchor.is_none() {
                *anchor = Some((previous, self.revision.load(Ordering::SeqCst)));
            }
        }
        *self.inner.write().unwrap() = Some(state);
        self.notify();
    }

    /// 回滚最近一次乐观应用；若没有待回滚的锚点则是 no-op。若锚点记录的版本
    /// 号与当前版本号不一致,说明期间有更新的权威快照到达(`apply_snapshot`
    /// 会清空锚点,但并发场景下仍以此比较为准),丢弃锚点而不做回滚,避免用
    /// 过期状态覆盖新的权威状态。
    pub fn rollback_optimistic(&self) {
        let anchor = self.optimistic.write().unwrap().take();
        if let Some((previous, confirmed_revision)) = anchor {
            if confirmed_revision == self.revision.load(Ordering::SeqCst) {
                *self.inner.write().unwrap() = Some(previous);
                self.notify();
            }
        }
    }

    pub fn subscribe(&self, listener: impl Fn(&Snapshot) + Send + Sync + 'static) -> u64 {
        let id = self.next_listener_id.fetch_add(1, Ordering::SeqCst);
        self.listeners.write().unwrap().insert(id, Arc::new(listener));
        id
    }

    pub fn unsubscribe(&self, id: u64) {
        self.listeners.write().unwrap().remove(&id);
    }

    fn notify(&self) {
        let snapshot = Snapshot {
            revision: self.revision(),
            state: self.inner.read().unwrap().clone(),
        };
        let listeners: Vec<Arc<ListenerFn>> = self.listeners.read().unwrap().values().cloned().collect();
        for listener in listeners {
            let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| listener(&snapshot)));
        }
    }

    /// 重置存储但保留已注册的监听者；所有监听者都会收到一次 `(None, 0)`。
    pub fn reset(&self) {
        *self.inner.write().unwrap() = None;
        self.revision.store(0, Ordering::SeqCst);
        *self.optimistic.write().unwrap() = None;
        self.notify();
    }

    /// 完全拆除，连监听者也清空；仅供测试使用。
    #[cfg(test)]
    pub fn destroy(&self) {
        self.reset();
        self.listeners.write().unwrap().clear();
    }
}

impl Default for GameStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_state() -> GameState {
        GameState::new("1234".into(), "host".into(), 3)
    }

    #[test]
    fn revision_is_monotonic_across_set_state() {
        let store = GameStore::new();
        store.initialize(sample_state());
        let r1 = store.revision();
        store.set_state(sample_state());
        let r2 = store.revision();
        assert!(r2 > r1);
    }

    #[test]
    fn stale_snapshot_is_rejected() {
        let store = GameStore::new();
        store.initialize(sample_state());
        let current = store.revision();
        let applied = store.apply_snapshot(current, sample_state());
        assert!(!applied);
        let applied = store.apply_snapshot(current + 5, sample_state());
        assert!(applied);
        assert_eq!(store.revision(), current + 5);
    }

    #[test]
    fn optimistic_apply_and_rollback_round_trips() {
        let store = GameStore::new();
        let mut original = sample_state();
        original.host_uid = "original-host".into();
        store.initialize(original.clone());

        let mut optimistic_state = sample_state();
        optimistic_state.host_uid = "optimistic-host".into();
        store.apply_optimistic(optimistic_state);
        assert_eq!(store.get_state().unwrap().host_uid, "optimistic-host");

        store.rollback_optimistic();
        assert_eq!(store.get_state().unwrap().host_uid, "original-host");
    }

    #[test]
    fn rollback_is_skipped_once_a_newer_snapshot_has_landed() {
        let store = GameStore::new();
        let mut original = sample_state();
        original.host_uid = "original-host".into();
        store.initialize(original);

        let mut optimistic_state = sample_state();
        optimistic_state.host_uid = "optimistic-host".into();
        store.apply_optimistic(optimistic_state);

        let mut authoritative = sample_state();
        authoritative.host_uid = "authoritative-host".into();
        let applied = store.apply_snapshot(store.revision() + 1, authoritative);
        assert!(applied);

        store.rollback_optimistic();
        assert_eq!(store.get_state().unwrap().host_uid, "authoritative-host");
    }

    #[test]
    fn a_panicking_listener_does_not_block_others() {
        let store = GameStore::new();
        let hits = Arc::new(std::sync::atomic::AtomicU64::new(0));
        let hits_clone = hits.clone();
        store.subscribe(|_snapshot| panic!("boom"));
        store.subscribe(move |_snapshot| {
            hits_clone.fetch_add(1, Ordering::SeqCst);
        });
        store.initialize(sample_state());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn reset_keeps_listeners_registered() {
        let store = GameStore::new();
        let hits = Arc::new(std::sync::atomic::AtomicU64::new(0));
        let hits_clone = hits.clone();
        store.subscribe(move |_snapshot| {
            hits_clone.fetch_add(1, Ordering::SeqCst);
        });
        store.initialize(sample_state());
        store.reset();
        store.initialize(sample_state());
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn reset_notifies_listeners_with_null_state_and_zero_revision() {
        let store = GameStore::new();
        let last = Arc::new(RwLock::new(None::<(Revision, bool)>));
        let last_clone = last.clone();
        store.subscribe(move |snapshot| {
            *last_clone.write().unwrap() = Some((snapshot.revision, snapshot.state.is_some()));
        });
        store.initialize(sample_state());
        store.reset();
        let (revision, has_state) = last.read().unwrap().unwrap();
        assert_eq!(revision, 0);
        assert!(!has_state);
    }
}
