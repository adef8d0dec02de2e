//! 命令层统一错误定义
//!
//! 两类错误严格分开：
//! - `ConfigError`：配置期错误，违反互斥规则或缺少必需项时在 setter/build
//!   处立即返回，绝不推迟到执行期；
//! - `CommandError`：执行期错误，按管线阶段分变体，内部以共享指针持有
//!   错误源，便于同一错误既交给错误处理器又返回给调用方。
//!
use std::sync::Arc;
use thiserror::Error;

/// 钩子与动作返回的用户侧错误
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// 管线内部共享的错误源
pub type SharedError = Arc<dyn std::error::Error + Send + Sync>;

/// 配置期错误（在 setter / build 处立即失败）
#[non_exhaustive]
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("execute action already set")]
    ExecuteAlreadySet,
    #[error("validator already set")]
    ValidatorAlreadySet,
    #[error("error handler already set")]
    ErrorHandlerAlreadySet,
    #[error("before-execute hook already set")]
    BeforeExecuteAlreadySet,
    #[error("after-execute hook already set")]
    AfterExecuteAlreadySet,
    #[error("missing execute action")]
    MissingExecute,
    #[error("concurrent execution limit must be at least 1, got {0}")]
    InvalidConcurrencyLimit(usize),
}

/// 执行期错误，按管线阶段区分来源
#[non_exhaustive]
#[derive(Debug, Clone, Error)]
pub enum CommandError {
    #[error("before-execute hook failed: {0}")]
    BeforeExecute(#[source] SharedError),
    #[error("validation failed: {0}")]
    Validate(#[source] SharedError),
    #[error("execute action failed: {0}")]
    Execute(#[source] SharedError),
    #[error("after-execute hook failed: {0}")]
    AfterExecute(#[source] SharedError),
}

/// 统一 Result 类型别名
pub type CommandResult<T> = Result<T, CommandError>;
