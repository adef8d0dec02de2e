//! 响应式命令层（relay-command）
//!
//! 面向展示层视图模型的可配置命令对象：动作由动态重估的权限谓词
//! （`can_execute`）把关，并自动订阅其读取的状态属性的变更通知。
//! 组成部分：
//! - 权限表达式与依赖提取（`expr`）：对表达式语法树做纯结构递归，
//!   得出需要订阅的属性集合；
//! - 配置构建器（`builder`）：流式 setter + 互斥检查，`build` 冻结配置；
//! - 通知桥（`bridge`）：订阅/退订接线与权限变更发布；
//! - 执行管线（`command`）：校验、前后钩子、并发闸门与错误遏制。
//!
//! 状态对象一侧的构件（通知源、属性、集合）见 `relay-observable`；
//! 由表达式同时生成谓词闭包与语法树的宏见 `relay-macros`。
//!
mod bridge;

pub mod builder;
pub mod command;
pub mod context;
pub mod error;
pub mod expr;
pub mod handler;

pub use builder::CommandBuilder;
pub use command::{Execution, RelayCommand};
pub use context::ExecutionContext;
pub use error::{BoxError, CommandError, CommandResult, ConfigError, SharedError};
pub use expr::{Predicate, PredicateExpr};
pub use handler::{
    AfterExecuteHandler, BeforeExecuteHandler, ErrorHandler, ExecuteHandler, ValidateHandler,
};

// 允许在本 crate 内部通过 ::relay_command 进行自引用，
// 以便 can_execute! 在本 crate 的测试中也能解析到 ::relay_command 路径。
extern crate self as relay_command;
