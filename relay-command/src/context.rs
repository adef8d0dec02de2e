//! 单次调用上下文（ExecutionContext）
//!
//! 生命周期恰为一次 `execute` 调用：依次经过前置钩子、校验器、动作与
//! 后置钩子，钩子之间可通过字符串键的 JSON 注记袋传递调用级数据。
//! 管线在后置钩子运行前写入错误槽，便于后置钩子区分成功与失败路径。
//!
use crate::error::CommandError;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug)]
pub struct ExecutionContext {
    invocation_id: Uuid,
    started_at: DateTime<Utc>,
    values: HashMap<String, Value>,
    error: Option<String>,
}

impl ExecutionContext {
    pub(crate) fn new() -> Self {
        Self {
            invocation_id: Uuid::new_v4(),
            started_at: Utc::now(),
            values: HashMap::new(),
            error: None,
        }
    }

    /// 本次调用的标识（用于日志关联）
    pub fn invocation_id(&self) -> Uuid {
        self.invocation_id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// 写入调用级注记；同键覆盖
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.values.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// 管线错误的描述；仅在校验器/动作/钩子出错后、后置钩子运行前可见
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    // 保留最先发生的错误
    pub(crate) fn mark_failed(&mut self, err: &CommandError) {
        if self.error.is_none() {
            self.error = Some(err.to_string());
        }
    }
}
