//! 钩子能力协议（handler）
//!
//! 每个可配置行为对应一个单方法 trait，运行时对所有钩子统一 `await`，
//! 管线只有一条执行路径：
//! - 挂起变体：为自己的类型实现对应 trait（`#[async_trait]`），
//!   经构建器的 `*_async` setter 传入；
//! - 同步变体：普通闭包经 `Fn*` 包装成为“立即完成”的实现，
//!   经不带后缀的 setter 传入。
//!
use crate::context::ExecutionContext;
use crate::error::{BoxError, CommandError};
use async_trait::async_trait;

/// 命令的动作本体
#[async_trait]
pub trait ExecuteHandler<I>: Send + Sync {
    async fn execute(&self, input: I, ctx: &mut ExecutionContext) -> Result<(), BoxError>;
}

/// 前置校验：返回 `false` 放弃本次执行（不算错误）
#[async_trait]
pub trait ValidateHandler: Send + Sync {
    async fn validate(&self, ctx: &mut ExecutionContext) -> Result<bool, BoxError>;
}

/// 前置钩子：返回 `false` 在进入并发闸门之前中止
#[async_trait]
pub trait BeforeExecuteHandler: Send + Sync {
    async fn before(&self, ctx: &mut ExecutionContext) -> Result<bool, BoxError>;
}

/// 后置钩子：进入并发闸门后的每次调用保证恰好运行一次
#[async_trait]
pub trait AfterExecuteHandler: Send + Sync {
    async fn after(&self, ctx: &mut ExecutionContext) -> Result<(), BoxError>;
}

/// 执行错误处理器（签名上不可失败）
#[async_trait]
pub trait ErrorHandler: Send + Sync {
    async fn on_error(&self, error: &CommandError);
}

// ---- 同步闭包包装：立即完成的钩子实现 ----

pub(crate) struct FnExecute<F>(pub F);

#[async_trait]
impl<I, F> ExecuteHandler<I> for FnExecute<F>
where
    I: Send + 'static,
    F: Fn(I, &mut ExecutionContext) -> Result<(), BoxError> + Send + Sync,
{
    async fn execute(&self, input: I, ctx: &mut ExecutionContext) -> Result<(), BoxError> {
        (self.0)(input, ctx)
    }
}

pub(crate) struct FnValidate<F>(pub F);

#[async_trait]
impl<F> ValidateHandler for FnValidate<F>
where
    F: Fn(&mut ExecutionContext) -> Result<bool, BoxError> + Send + Sync,
{
    async fn validate(&self, ctx: &mut ExecutionContext) -> Result<bool, BoxError> {
        (self.0)(ctx)
    }
}

pub(crate) struct FnBeforeExecute<F>(pub F);

#[async_trait]
impl<F> BeforeExecuteHandler for FnBeforeExecute<F>
where
    F: Fn(&mut ExecutionContext) -> Result<bool, BoxError> + Send + Sync,
{
    async fn before(&self, ctx: &mut ExecutionContext) -> Result<bool, BoxError> {
        (self.0)(ctx)
    }
}

pub(crate) struct FnAfterExecute<F>(pub F);

#[async_trait]
impl<F> AfterExecuteHandler for FnAfterExecute<F>
where
    F: Fn(&mut ExecutionContext) -> Result<(), BoxError> + Send + Sync,
{
    async fn after(&self, ctx: &mut ExecutionContext) -> Result<(), BoxError> {
        (self.0)(ctx)
    }
}

pub(crate) struct FnOnError<F>(pub F);

#[async_trait]
impl<F> ErrorHandler for FnOnError<F>
where
    F: Fn(&CommandError) + Send + Sync,
{
    async fn on_error(&self, error: &CommandError) {
        (self.0)(error)
    }
}
