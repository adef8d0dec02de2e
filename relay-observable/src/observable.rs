//! 被观察状态对象的协议（Observable）
//!
//! 命令层通过该协议订阅状态对象的属性变更，并获知“精确类型上声明了哪些属性”。
//! 依赖提取的结果只保留出现在 `declared_properties` 中的名字，
//! 因此嵌套对象、外部对象的成员天然被排除在跟踪之外。
//!
use crate::notify::ChangeNotifier;

pub trait Observable {
    /// 状态对象的属性变更通知源
    fn notifier(&self) -> &ChangeNotifier;

    /// 精确类型上声明的属性名（通常由 `#[derive(Observable)]` 生成）
    fn declared_properties(&self) -> &'static [&'static str];
}
