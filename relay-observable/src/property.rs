//! 可观察属性单元（Property）
//!
//! 以“命名值 + 共享通知源”的形式承载状态对象上的单个属性：
//! - `set` 仅在值实际变化时才广播属性名（相等写入静默）；
//! - `replace` 无条件写入并广播；
//! - 广播发生在内部锁释放之后，回调内可以安全地读回属性。
//!
use crate::notify::ChangeNotifier;
use std::sync::{PoisonError, RwLock};

pub struct Property<T> {
    name: &'static str,
    value: RwLock<T>,
    notifier: ChangeNotifier,
}

impl<T> Property<T> {
    /// `notifier` 通常是所属状态对象通知源的克隆句柄
    pub fn new(name: &'static str, notifier: ChangeNotifier, initial: T) -> Self {
        Self {
            name,
            value: RwLock::new(initial),
            notifier,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// 借用访问当前值，避免 Clone
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        let guard = self.value.read().unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }

    /// 无条件写入并广播属性名，返回旧值
    pub fn replace(&self, value: T) -> T {
        let old = {
            let mut guard = self.value.write().unwrap_or_else(PoisonError::into_inner);
            std::mem::replace(&mut *guard, value)
        };
        self.notifier.raise(self.name);
        old
    }
}

impl<T: Clone> Property<T> {
    pub fn get(&self) -> T {
        self.value
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl<T: PartialEq> Property<T> {
    /// 写入新值；仅当与当前值不同才广播
    pub fn set(&self, value: T) {
        let changed = {
            let mut guard = self.value.write().unwrap_or_else(PoisonError::into_inner);
            if *guard == value {
                false
            } else {
                *guard = value;
                true
            }
        };
        if changed {
            self.notifier.raise(self.name);
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let guard = self.value.read().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("Property")
            .field("name", &self.name)
            .field("value", &*guard)
            .finish()
    }
}
