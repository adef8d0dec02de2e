//! 命令配置构建器（CommandBuilder）
//!
//! 以流式、顺序无关的 setter 累积配置，`build` 时冻结为不可变的
//! [`CommandConfig`] 并交给运行时。互斥规则（动作/校验器/错误处理器/
//! 前后钩子各自的同步与挂起变体只能设置其一）在 setter 调用处立即失败；
//! `with_can_execute` 例外：重复调用静默覆盖谓词与依赖集（最后一次生效）。
//!
//! 同步变体接收普通闭包；挂起变体（`*_async`）接收实现了对应
//! [`handler`](crate::handler) trait 的类型。`build` 按值消费构建器，
//! 重复构建在编译期即不可能。
//!
use crate::error::{BoxError, ConfigError};
use crate::expr::{self, Predicate};
use crate::handler::{
    AfterExecuteHandler, BeforeExecuteHandler, ErrorHandler, ExecuteHandler, FnAfterExecute,
    FnBeforeExecute, FnExecute, FnOnError, FnValidate, ValidateHandler,
};
use crate::{CommandError, ExecutionContext, RelayCommand};
use relay_observable::{ChangeNotifier, CollectionNotifier, Observable, ObservableVec};
use std::collections::BTreeSet;
use std::sync::Arc;

/// 构建完成后冻结的命令配置；构建后不可变，运行时无须同步即可共享
pub(crate) struct CommandConfig<I: 'static> {
    pub(crate) state_notifier: ChangeNotifier,
    pub(crate) predicate: Option<Predicate>,
    pub(crate) tracked: BTreeSet<String>,
    pub(crate) observed_dependencies: Vec<ChangeNotifier>,
    pub(crate) observed_collections: Vec<CollectionNotifier>,
    pub(crate) execute: Arc<dyn ExecuteHandler<I>>,
    pub(crate) validate: Option<Arc<dyn ValidateHandler>>,
    pub(crate) before: Option<Arc<dyn BeforeExecuteHandler>>,
    pub(crate) after: Option<Arc<dyn AfterExecuteHandler>>,
    pub(crate) on_error: Option<Arc<dyn ErrorHandler>>,
    pub(crate) swallow_errors: bool,
    pub(crate) concurrency: usize,
    pub(crate) auto_invalidate: bool,
}

pub struct CommandBuilder<V, I: 'static> {
    state: Arc<V>,
    predicate: Option<Predicate>,
    tracked: BTreeSet<String>,
    observed_dependencies: Vec<ChangeNotifier>,
    observed_collections: Vec<CollectionNotifier>,
    execute: Option<Arc<dyn ExecuteHandler<I>>>,
    validate: Option<Arc<dyn ValidateHandler>>,
    before: Option<Arc<dyn BeforeExecuteHandler>>,
    after: Option<Arc<dyn AfterExecuteHandler>>,
    on_error: Option<Arc<dyn ErrorHandler>>,
    swallow_errors: bool,
    concurrency: usize,
    auto_invalidate: bool,
}

impl<V, I: 'static> std::fmt::Debug for CommandBuilder<V, I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandBuilder")
            .field("predicate", &self.predicate.is_some())
            .field("tracked", &self.tracked)
            .field("observed_dependencies", &self.observed_dependencies.len())
            .field("observed_collections", &self.observed_collections.len())
            .field("execute", &self.execute.is_some())
            .field("validate", &self.validate.is_some())
            .field("before", &self.before.is_some())
            .field("after", &self.after.is_some())
            .field("on_error", &self.on_error.is_some())
            .field("swallow_errors", &self.swallow_errors)
            .field("concurrency", &self.concurrency)
            .field("auto_invalidate", &self.auto_invalidate)
            .finish()
    }
}

impl<V, I> CommandBuilder<V, I>
where
    V: Observable,
    I: Send + 'static,
{
    pub fn new(state: Arc<V>) -> Self {
        Self {
            state,
            predicate: None,
            tracked: BTreeSet::new(),
            observed_dependencies: Vec::new(),
            observed_collections: Vec::new(),
            execute: None,
            validate: None,
            before: None,
            after: None,
            on_error: None,
            swallow_errors: false,
            concurrency: 1,
            auto_invalidate: false,
        }
    }

    /// 设置权限谓词，同时对其语法树运行依赖提取。
    /// 重复调用覆盖谓词与提取结果（非累积）。
    pub fn with_can_execute(mut self, predicate: Predicate) -> Self {
        self.tracked = expr::extract(predicate.expr(), self.state.declared_properties());
        self.predicate = Some(predicate);
        self
    }

    /// 追加一个无条件观察的属性持有者：其任一属性变更都触发权限重估。
    /// 可多次调用，依次累积。
    pub fn with_dependency_evaluate(mut self, observed: &dyn Observable) -> Self {
        self.observed_dependencies.push(observed.notifier().clone());
        self
    }

    /// 追加一个无条件观察的集合：任何成员/顺序变更都触发权限重估
    pub fn with_raise_on_collection_changed<T>(mut self, collection: &ObservableVec<T>) -> Self {
        self.observed_collections.push(collection.notifier().clone());
        self
    }

    /// 设置动作（必需项，同步变体）
    pub fn with_execute<F>(self, action: F) -> Result<Self, ConfigError>
    where
        F: Fn(I, &mut ExecutionContext) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.set_execute(Arc::new(FnExecute(action)))
    }

    /// 设置动作（挂起变体：实现 [`ExecuteHandler`] 的类型）
    pub fn with_execute_async(
        self,
        action: impl ExecuteHandler<I> + 'static,
    ) -> Result<Self, ConfigError> {
        self.set_execute(Arc::new(action))
    }

    /// 设置校验器；校验器不影响 `can_execute`，只在执行期把关
    pub fn with_validator<F>(self, validate: F) -> Result<Self, ConfigError>
    where
        F: Fn(&mut ExecutionContext) -> Result<bool, BoxError> + Send + Sync + 'static,
    {
        self.set_validate(Arc::new(FnValidate(validate)))
    }

    pub fn with_validator_async(
        self,
        validate: impl ValidateHandler + 'static,
    ) -> Result<Self, ConfigError> {
        self.set_validate(Arc::new(validate))
    }

    /// 设置执行错误处理器
    pub fn with_error_handler<F>(self, on_error: F) -> Result<Self, ConfigError>
    where
        F: Fn(&CommandError) + Send + Sync + 'static,
    {
        self.set_on_error(Arc::new(FnOnError(on_error)))
    }

    pub fn with_error_handler_async(
        self,
        on_error: impl ErrorHandler + 'static,
    ) -> Result<Self, ConfigError> {
        self.set_on_error(Arc::new(on_error))
    }

    /// 设置前置钩子：返回 `false` 中止本次执行
    pub fn with_before_execute<F>(self, before: F) -> Result<Self, ConfigError>
    where
        F: Fn(&mut ExecutionContext) -> Result<bool, BoxError> + Send + Sync + 'static,
    {
        self.set_before(Arc::new(FnBeforeExecute(before)))
    }

    pub fn with_before_execute_async(
        self,
        before: impl BeforeExecuteHandler + 'static,
    ) -> Result<Self, ConfigError> {
        self.set_before(Arc::new(before))
    }

    /// 设置后置钩子（保证执行范围内运行，包括出错路径）
    pub fn with_after_execute<F>(self, after: F) -> Result<Self, ConfigError>
    where
        F: Fn(&mut ExecutionContext) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.set_after(Arc::new(FnAfterExecute(after)))
    }

    pub fn with_after_execute_async(
        self,
        after: impl AfterExecuteHandler + 'static,
    ) -> Result<Self, ConfigError> {
        self.set_after(Arc::new(after))
    }

    /// 允许的并发动作数；默认 1，必须 ≥ 1
    pub fn with_concurrent_execution_of(mut self, limit: usize) -> Result<Self, ConfigError> {
        if limit < 1 {
            return Err(ConfigError::InvalidConcurrencyLimit(limit));
        }
        self.concurrency = limit;
        Ok(self)
    }

    /// 执行出错时不向调用方传播（错误处理器仍会被调用）
    pub fn with_swallow_errors(mut self) -> Self {
        self.swallow_errors = true;
        self
    }

    /// 执行期间命令自动报告“不可执行”，结束后恢复
    pub fn with_auto_invalidate_when_executing(mut self) -> Self {
        self.auto_invalidate = true;
        self
    }

    /// 冻结配置并构建命令。按值消费构建器（单次使用）；
    /// 未设置动作时返回 [`ConfigError::MissingExecute`]。
    pub fn build(self) -> Result<RelayCommand<I>, ConfigError> {
        let execute = self.execute.ok_or(ConfigError::MissingExecute)?;

        let config = CommandConfig {
            state_notifier: self.state.notifier().clone(),
            predicate: self.predicate,
            tracked: self.tracked,
            observed_dependencies: self.observed_dependencies,
            observed_collections: self.observed_collections,
            execute,
            validate: self.validate,
            before: self.before,
            after: self.after,
            on_error: self.on_error,
            swallow_errors: self.swallow_errors,
            concurrency: self.concurrency,
            auto_invalidate: self.auto_invalidate,
        };

        Ok(RelayCommand::from_config(config))
    }

    // ---- 互斥槽位写入 ----

    fn set_execute(mut self, handler: Arc<dyn ExecuteHandler<I>>) -> Result<Self, ConfigError> {
        if self.execute.is_some() {
            return Err(ConfigError::ExecuteAlreadySet);
        }
        self.execute = Some(handler);
        Ok(self)
    }

    fn set_validate(mut self, handler: Arc<dyn ValidateHandler>) -> Result<Self, ConfigError> {
        if self.validate.is_some() {
            return Err(ConfigError::ValidatorAlreadySet);
        }
        self.validate = Some(handler);
        Ok(self)
    }

    fn set_on_error(mut self, handler: Arc<dyn ErrorHandler>) -> Result<Self, ConfigError> {
        if self.on_error.is_some() {
            return Err(ConfigError::ErrorHandlerAlreadySet);
        }
        self.on_error = Some(handler);
        Ok(self)
    }

    fn set_before(mut self, handler: Arc<dyn BeforeExecuteHandler>) -> Result<Self, ConfigError> {
        if self.before.is_some() {
            return Err(ConfigError::BeforeExecuteAlreadySet);
        }
        self.before = Some(handler);
        Ok(self)
    }

    fn set_after(mut self, handler: Arc<dyn AfterExecuteHandler>) -> Result<Self, ConfigError> {
        if self.after.is_some() {
            return Err(ConfigError::AfterExecuteAlreadySet);
        }
        self.after = Some(handler);
        Ok(self)
    }
}
