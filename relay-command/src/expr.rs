//! 权限表达式与依赖提取（expr）
//!
//! `Predicate` 把同一个布尔表达式的两种形态装在一起：可执行的闭包，
//! 与可检视的语法树（`PredicateExpr`）。语法树通常由
//! `relay_macros::can_execute!` 从源表达式降层而来。
//!
//! `extract` 是对语法树的纯结构递归，产出表达式直接读取的、且声明在被
//! 观察对象精确类型上的属性名集合。提取有意保守：嵌套成员链、未识别的
//! 节点形状一律不参与跟踪，需要更多依赖的调用方应使用构建器的显式注册
//! 入口（`with_dependency_evaluate` / `with_raise_on_collection_changed`）。
//!
use std::collections::BTreeSet;
use std::sync::Arc;

/// 布尔表达式的标签化语法树
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PredicateExpr {
    /// 成员读取；`root` 标记接收者是否恰为被跟踪的状态绑定
    Member { root: bool, name: &'static str },
    /// 二元运算，左右都继续检视
    Binary {
        left: Box<PredicateExpr>,
        right: Box<PredicateExpr>,
    },
    /// 一元运算
    Unary { operand: Box<PredicateExpr> },
    /// 调用：仅检视实参，不检视接收者
    Call { args: Vec<PredicateExpr> },
    /// 其余节点形状：不跟踪、不报错
    Other,
}

/// 编译后的权限谓词及其语法树
#[derive(Clone)]
pub struct Predicate {
    eval: Arc<dyn Fn() -> bool + Send + Sync>,
    expr: PredicateExpr,
}

impl Predicate {
    /// 不透明谓词：无语法树（`Other`），依赖须显式注册
    pub fn new(eval: impl Fn() -> bool + Send + Sync + 'static) -> Self {
        Self::from_parts(Arc::new(eval), PredicateExpr::Other)
    }

    /// 由闭包与语法树两部分组装（`can_execute!` 的展开目标）
    pub fn from_parts(eval: Arc<dyn Fn() -> bool + Send + Sync>, expr: PredicateExpr) -> Self {
        Self { eval, expr }
    }

    pub fn eval(&self) -> bool {
        (self.eval)()
    }

    pub fn expr(&self) -> &PredicateExpr {
        &self.expr
    }
}

impl std::fmt::Debug for Predicate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Predicate").field("expr", &self.expr).finish()
    }
}

/// 提取表达式读取的被跟踪属性集合。
///
/// 纯函数，永不失败；结果已去重。`declared` 为状态对象精确类型上声明的
/// 属性名（见 `relay_observable::Observable::declared_properties`）。
pub fn extract(expr: &PredicateExpr, declared: &[&str]) -> BTreeSet<String> {
    let mut out = BTreeSet::new();
    collect(expr, declared, &mut out);
    out
}

fn collect(expr: &PredicateExpr, declared: &[&str], out: &mut BTreeSet<String>) {
    match expr {
        // 成员节点不再向下递归：要么命中，要么整体忽略
        PredicateExpr::Member { root: true, name } if declared.contains(name) => {
            out.insert((*name).to_string());
        }
        PredicateExpr::Member { .. } => {}
        PredicateExpr::Binary { left, right } => {
            collect(left, declared, out);
            collect(right, declared, out);
        }
        PredicateExpr::Unary { operand } => collect(operand, declared, out),
        PredicateExpr::Call { args } => {
            for arg in args {
                collect(arg, declared, out);
            }
        }
        PredicateExpr::Other => {}
    }
}
