//! 变更通知源（Notifier）
//!
//! 定义属性变更 / 集合变更的统一订阅协议：
//! - `Notifier<E>`：可克隆（共享句柄）的回调注册表，`raise` 时同步分发事件；
//! - `ChangeNotifier`：属性变更源，事件为属性名；
//! - `CollectionNotifier`：集合变更源，事件为 [`CollectionChange`]；
//! - `Subscription`：订阅句柄，显式 `unsubscribe` 或随 Drop 释放，避免悬挂观察。
//!
use crate::collection::CollectionChange;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

type Callback<E> = Arc<dyn Fn(&E) + Send + Sync>;

/// 属性变更源：事件为发生变更的属性名
pub type ChangeNotifier = Notifier<str>;

/// 集合变更源：事件为成员/顺序变更描述
pub type CollectionNotifier = Notifier<CollectionChange>;

/// 回调注册表。克隆得到的是同一注册表的另一个句柄，
/// 因此状态对象与其属性单元可以共享同一个通知源。
pub struct Notifier<E: ?Sized + 'static> {
    inner: Arc<NotifierInner<E>>,
}

struct NotifierInner<E: ?Sized + 'static> {
    next_id: AtomicU64,
    subscribers: DashMap<u64, Callback<E>>,
}

impl<E: ?Sized + 'static> Notifier<E> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(NotifierInner {
                next_id: AtomicU64::new(0),
                subscribers: DashMap::new(),
            }),
        }
    }

    /// 注册回调，返回订阅句柄；句柄释放后回调不再被调用
    pub fn subscribe(&self, callback: impl Fn(&E) + Send + Sync + 'static) -> Subscription {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner.subscribers.insert(id, Arc::new(callback));

        let weak: Weak<NotifierInner<E>> = Arc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.subscribers.remove(&id);
            }
        })
    }

    /// 同步分发事件给所有当前订阅者。
    /// 先对回调做快照再逐一调用，允许回调内再订阅/退订同一通知源。
    pub fn raise(&self, event: &E) {
        let callbacks: Vec<Callback<E>> = self
            .inner
            .subscribers
            .iter()
            .map(|entry| entry.value().clone())
            .collect();

        for callback in callbacks {
            callback(event);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.len()
    }
}

impl<E: ?Sized + 'static> Clone for Notifier<E> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<E: ?Sized + 'static> Default for Notifier<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: ?Sized + 'static> std::fmt::Debug for Notifier<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier")
            .field("subscribers", &self.inner.subscribers.len())
            .finish()
    }
}

/// 订阅句柄：用于解除一次 [`Notifier::subscribe`] 注册。
/// Drop 时自动退订；通知源先于句柄销毁时退订为空操作。
#[must_use = "dropping a Subscription immediately unsubscribes the callback"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// 显式退订（等价于 Drop）
    pub fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}
