//! 可观察集合（ObservableVec）
//!
//! 在成员/顺序发生变化时通过自身的 [`CollectionNotifier`] 广播
//! [`CollectionChange`]。越界操作返回 `None`/空操作，不会 panic。
//!
use crate::notify::CollectionNotifier;
use serde::Serialize;
use std::sync::{PoisonError, RwLock};

/// 集合变更描述
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum CollectionChange {
    Inserted { index: usize },
    Removed { index: usize },
    Replaced { index: usize },
    Cleared,
}

pub struct ObservableVec<T> {
    items: RwLock<Vec<T>>,
    notifier: CollectionNotifier,
}

impl<T> ObservableVec<T> {
    pub fn new() -> Self {
        Self {
            items: RwLock::new(Vec::new()),
            notifier: CollectionNotifier::new(),
        }
    }

    pub fn with_items(items: Vec<T>) -> Self {
        Self {
            items: RwLock::new(items),
            notifier: CollectionNotifier::new(),
        }
    }

    /// 集合自身的变更通知源
    pub fn notifier(&self) -> &CollectionNotifier {
        &self.notifier
    }

    pub fn push(&self, item: T) {
        let index = {
            let mut guard = self.items.write().unwrap_or_else(PoisonError::into_inner);
            guard.push(item);
            guard.len() - 1
        };
        self.notifier.raise(&CollectionChange::Inserted { index });
    }

    /// 越界时追加到末尾
    pub fn insert(&self, index: usize, item: T) {
        let index = {
            let mut guard = self.items.write().unwrap_or_else(PoisonError::into_inner);
            let index = index.min(guard.len());
            guard.insert(index, item);
            index
        };
        self.notifier.raise(&CollectionChange::Inserted { index });
    }

    pub fn remove(&self, index: usize) -> Option<T> {
        let removed = {
            let mut guard = self.items.write().unwrap_or_else(PoisonError::into_inner);
            if index < guard.len() {
                Some(guard.remove(index))
            } else {
                None
            }
        };
        if removed.is_some() {
            self.notifier.raise(&CollectionChange::Removed { index });
        }
        removed
    }

    /// 替换指定位置的元素，返回旧值；越界返回 `None` 且不广播
    pub fn replace(&self, index: usize, item: T) -> Option<T> {
        let old = {
            let mut guard = self.items.write().unwrap_or_else(PoisonError::into_inner);
            if index < guard.len() {
                Some(std::mem::replace(&mut guard[index], item))
            } else {
                None
            }
        };
        if old.is_some() {
            self.notifier.raise(&CollectionChange::Replaced { index });
        }
        old
    }

    /// 清空集合；原本为空时不广播
    pub fn clear(&self) {
        let had_items = {
            let mut guard = self.items.write().unwrap_or_else(PoisonError::into_inner);
            let had_items = !guard.is_empty();
            guard.clear();
            had_items
        };
        if had_items {
            self.notifier.raise(&CollectionChange::Cleared);
        }
    }

    pub fn len(&self) -> usize {
        self.items
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Clone> ObservableVec<T> {
    pub fn get(&self, index: usize) -> Option<T> {
        self.items
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(index)
            .cloned()
    }

    /// 当前内容的一份快照
    pub fn snapshot(&self) -> Vec<T> {
        self.items
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl<T> Default for ObservableVec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: std::fmt::Debug + Clone> std::fmt::Debug for ObservableVec<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.snapshot()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn record(
        vec: &ObservableVec<i32>,
    ) -> (
        Arc<Mutex<Vec<CollectionChange>>>,
        crate::notify::Subscription,
    ) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen2 = seen.clone();
        let sub = vec.notifier().subscribe(move |change: &CollectionChange| {
            seen2.lock().unwrap().push(*change);
        });
        (seen, sub)
    }

    #[test]
    fn push_remove_replace_emit_matching_changes() {
        let vec = ObservableVec::new();
        let (seen, _sub) = record(&vec);

        vec.push(1);
        vec.push(2);
        vec.replace(0, 10);
        assert_eq!(vec.remove(1), Some(2));

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                CollectionChange::Inserted { index: 0 },
                CollectionChange::Inserted { index: 1 },
                CollectionChange::Replaced { index: 0 },
                CollectionChange::Removed { index: 1 },
            ]
        );
        assert_eq!(vec.snapshot(), vec![10]);
    }

    #[test]
    fn out_of_range_ops_are_silent() {
        let vec = ObservableVec::new();
        vec.push(1);
        let (seen, _sub) = record(&vec);

        assert_eq!(vec.remove(5), None);
        assert_eq!(vec.replace(5, 9), None);

        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn clear_emits_only_when_nonempty() {
        let vec = ObservableVec::new();
        vec.push(1);
        let (seen, _sub) = record(&vec);

        vec.clear();
        vec.clear(); // 已空，静默

        assert_eq!(*seen.lock().unwrap(), vec![CollectionChange::Cleared]);
        assert!(vec.is_empty());
    }
}
