//! 通知桥（bridge）
//!
//! 把构建好的命令接到所有变更信号上：
//! - 状态对象的属性变更源，按提取出的依赖集过滤；
//! - 显式注册的属性持有者（任一属性触发）；
//! - 显式注册的集合（任何变更触发）。
//!
//! 任一信号到达即重估权限谓词并经 watch 通道发布。订阅句柄全部交还给
//! 命令持有，随 `dispose`/Drop 统一释放，不遗留悬挂观察。
//!
use crate::command::CommandInner;
use relay_observable::{CollectionChange, Subscription};
use std::sync::Arc;

pub(crate) fn wire<I: Send + 'static>(inner: &Arc<CommandInner<I>>) -> Vec<Subscription> {
    let mut subscriptions = Vec::new();

    // 依赖集为空时不必订阅状态对象
    if !inner.config().tracked.is_empty() {
        let command = inner.clone();
        subscriptions.push(inner.config().state_notifier.subscribe(move |name: &str| {
            if command.config().tracked.contains(name) {
                command.refresh_permission();
            }
        }));
    }

    for dependency in &inner.config().observed_dependencies {
        let command = inner.clone();
        subscriptions.push(dependency.subscribe(move |_name: &str| {
            command.refresh_permission();
        }));
    }

    for collection in &inner.config().observed_collections {
        let command = inner.clone();
        subscriptions.push(collection.subscribe(move |_change: &CollectionChange| {
            command.refresh_permission();
        }));
    }

    subscriptions
}
