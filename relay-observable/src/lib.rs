//! 变更通知层基础库（relay-observable）
//!
//! 为展示层状态对象提供最小的可观察构件：
//! - 通知源与订阅句柄（`notify`）
//! - 可观察属性单元（`property`）
//! - 可观察集合（`collection`）
//! - 被观察对象协议（`observable`）
//!
//! 本 crate 不关心“谁在观察、为何观察”：命令层（relay-command）基于这些
//! 构件完成依赖跟踪与权限重估，其他消费者也可以直接订阅。
//!
pub mod collection;
pub mod notify;
pub mod observable;
pub mod property;

pub use collection::{CollectionChange, ObservableVec};
pub use notify::{ChangeNotifier, CollectionNotifier, Notifier, Subscription};
pub use observable::Observable;
pub use property::Property;

// 允许在本 crate 内部通过 ::relay_observable 进行自引用，
// 以便派生宏在本 crate 的单元测试中也能解析到 ::relay_observable 路径。
extern crate self as relay_observable;
