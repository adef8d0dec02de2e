//! 命令运行时与执行管线（RelayCommand）
//!
//! 单次调用的状态机：权限检查 → 前置钩子 → 并发闸门 → 校验 → 动作 →
//! 后置钩子。要点：
//! - 权限为假时调用是空操作，任何钩子都不运行；
//! - 前置钩子返回 `false` 在进入闸门前中止，后置钩子不运行；
//! - 后置钩子的保证范围自占到并发槽起：校验器在范围之内，
//!   校验失败或出错仍会触发后置钩子；
//! - 错误先交给错误处理器，传播推迟到后置钩子之后；吞掉错误时调用方
//!   得到 [`Execution::Faulted`]；
//! - 槽位释放依赖 RAII permit，任何退出路径都不破坏并发计数。
//!
use crate::bridge;
use crate::builder::{CommandBuilder, CommandConfig};
use crate::context::ExecutionContext;
use crate::error::{CommandError, CommandResult};
use futures_core::stream::BoxStream;
use relay_observable::{Observable, Subscription};
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{Semaphore, watch};
use tokio_stream::wrappers::WatchStream;
use tracing::{debug, warn};

/// 一次调用的终态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Execution {
    /// 动作正常完成
    Completed,
    /// 权限谓词为假，整次调用为空操作
    NotPermitted,
    /// 前置钩子返回 `false`
    Aborted,
    /// 校验器返回 `false`
    Invalid,
    /// 出错但已按配置吞掉
    Faulted,
}

/// 响应式命令：权限随观察到的状态变化自动重估
pub struct RelayCommand<I: 'static> {
    inner: Arc<CommandInner<I>>,
    subscriptions: Mutex<Vec<Subscription>>,
}

pub(crate) struct CommandInner<I: 'static> {
    config: CommandConfig<I>,
    slots: Semaphore,
    in_flight: AtomicUsize,
    permitted: watch::Sender<bool>,
}

impl<I: Send + 'static> RelayCommand<I> {
    /// 构建入口：`state` 为被观察的状态对象
    pub fn builder<V: Observable>(state: Arc<V>) -> CommandBuilder<V, I> {
        CommandBuilder::new(state)
    }

    pub(crate) fn from_config(config: CommandConfig<I>) -> Self {
        let initial = config.predicate.as_ref().map_or(true, |p| p.eval());
        let (permitted, _) = watch::channel(initial);

        let inner = Arc::new(CommandInner {
            slots: Semaphore::new(config.concurrency),
            in_flight: AtomicUsize::new(0),
            permitted,
            config,
        });

        let subscriptions = bridge::wire(&inner);

        Self {
            inner,
            subscriptions: Mutex::new(subscriptions),
        }
    }

    /// 即时求值当前权限（含执行期自动失效的影响）
    pub fn can_execute(&self) -> bool {
        self.inner.effective_permission()
    }

    /// 权限变更流：先给出当前值，之后仅在计算结果变化时给出新值
    pub fn observe_can_execute(&self) -> BoxStream<'static, bool> {
        Box::pin(WatchStream::new(self.inner.permitted.subscribe()))
    }

    /// 手动触发一次权限重估（例如谓词读取了未被跟踪的状态）
    pub fn invalidate(&self) {
        self.inner.refresh_permission();
    }

    /// 依赖提取得到的被跟踪属性集
    pub fn tracked_properties(&self) -> &BTreeSet<String> {
        &self.inner.config.tracked
    }

    /// 按管线执行一次命令
    pub async fn execute(&self, input: I) -> CommandResult<Execution> {
        self.inner.run(input).await
    }

    /// 释放全部通知订阅；命令仍可手动执行，但不再跟随状态变化。
    /// Drop 时自动调用等效逻辑。
    pub fn dispose(&self) {
        let mut subscriptions = self
            .subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        for subscription in subscriptions.drain(..) {
            subscription.unsubscribe();
        }
    }
}

impl<I: 'static> std::fmt::Debug for RelayCommand<I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayCommand")
            .field("tracked", &self.inner.config.tracked)
            .field("concurrency", &self.inner.config.concurrency)
            .finish()
    }
}

impl<I: Send + 'static> CommandInner<I> {
    async fn run(&self, input: I) -> CommandResult<Execution> {
        // 1. 权限为假 → 空操作
        if !self.effective_permission() {
            return Ok(Execution::NotPermitted);
        }

        let mut ctx = ExecutionContext::new();
        debug!(invocation = %ctx.invocation_id(), "command invocation started");

        // 2. 前置钩子：false 中止；出错按执行错误路由，但不进入保证范围
        if let Some(before) = &self.config.before {
            match before.before(&mut ctx).await {
                Ok(true) => {}
                Ok(false) => return Ok(Execution::Aborted),
                Err(source) => {
                    let err = CommandError::BeforeExecute(source.into());
                    ctx.mark_failed(&err);
                    self.notify_error(&err).await;
                    return self.suppress_or(err);
                }
            }
        }

        // 3. 并发闸门：满载时挂起等待，绝不拒绝。
        // 信号量从不关闭，acquire 仅在关闭后才会失败。
        let _permit = self
            .slots
            .acquire()
            .await
            .expect("command semaphore is never closed");

        // 4. 自进入槽位起：后置钩子保证生效，自动失效窗口开启
        self.enter_execution();
        let phase = self.action_phase(input, &mut ctx).await;

        // 5. 错误先交给处理器，传播推迟到后置钩子之后
        if let Err(err) = &phase {
            ctx.mark_failed(err);
            self.notify_error(err).await;
        }

        // 6. 后置钩子恰好运行一次，包括出错路径
        let after = match &self.config.after {
            Some(after) => after
                .after(&mut ctx)
                .await
                .map_err(|source| CommandError::AfterExecute(source.into())),
            None => Ok(()),
        };

        self.leave_execution();

        if let Err(err) = &after {
            warn!(invocation = %ctx.invocation_id(), error = %err, "after-execute hook failed");
            ctx.mark_failed(err);
            self.notify_error(err).await;
        }

        // 7. 动作阶段的错误优先传播；后置钩子错误只在动作成功时上浮
        match phase {
            Err(err) => self.suppress_or(err),
            Ok(outcome) => match after {
                Err(err) => self.suppress_or(err),
                Ok(()) => Ok(outcome),
            },
        }
    }

    // 校验 + 动作（保证范围内的部分）
    async fn action_phase(
        &self,
        input: I,
        ctx: &mut ExecutionContext,
    ) -> CommandResult<Execution> {
        if let Some(validate) = &self.config.validate {
            match validate.validate(ctx).await {
                Ok(true) => {}
                Ok(false) => return Ok(Execution::Invalid),
                Err(source) => return Err(CommandError::Validate(source.into())),
            }
        }

        self.config
            .execute
            .execute(input, ctx)
            .await
            .map(|()| Execution::Completed)
            .map_err(|source| CommandError::Execute(source.into()))
    }

    async fn notify_error(&self, err: &CommandError) {
        if let Some(handler) = &self.config.on_error {
            handler.on_error(err).await;
        }
    }

    fn suppress_or(&self, err: CommandError) -> CommandResult<Execution> {
        if self.config.swallow_errors {
            warn!(error = %err, "command error swallowed");
            Ok(Execution::Faulted)
        } else {
            Err(err)
        }
    }

    fn enter_execution(&self) {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        if self.config.auto_invalidate {
            self.refresh_permission();
        }
    }

    fn leave_execution(&self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        if self.config.auto_invalidate {
            self.refresh_permission();
        }
    }

    pub(crate) fn config(&self) -> &CommandConfig<I> {
        &self.config
    }

    fn natural_permission(&self) -> bool {
        self.config.predicate.as_ref().map_or(true, |p| p.eval())
    }

    pub(crate) fn effective_permission(&self) -> bool {
        if self.config.auto_invalidate && self.in_flight.load(Ordering::SeqCst) > 0 {
            return false;
        }
        self.natural_permission()
    }

    /// 重估权限；仅在结果变化时发布（设计取舍，见 crate 文档）
    pub(crate) fn refresh_permission(&self) {
        let value = self.effective_permission();
        self.permitted.send_if_modified(|current| {
            if *current == value {
                false
            } else {
                *current = value;
                true
            }
        });
    }
}
