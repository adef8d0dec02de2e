use relay_command::expr::{self, PredicateExpr};
use relay_macros::{Observable, can_execute};
use relay_observable::{ChangeNotifier, Property};
use std::sync::Arc;

#[derive(Observable)]
struct Form {
    notifier: ChangeNotifier,
    is_busy: Property<bool>,
    amount: Property<i64>,
}

fn main() {
    let notifier = ChangeNotifier::new();
    let form = Arc::new(Form {
        is_busy: Property::new("is_busy", notifier.clone(), false),
        amount: Property::new("amount", notifier.clone(), 3),
        notifier,
    });

    let predicate = can_execute!(form, !form.is_busy && form.amount > 0);

    // 谓词闭包可执行
    assert!(predicate.eval());
    form.is_busy.set(true);
    assert!(!predicate.eval());

    // 语法树可检视，提取结果按声明过滤
    let tracked = expr::extract(predicate.expr(), &["is_busy", "amount"]);
    assert_eq!(tracked.len(), 2);
    assert!(matches!(predicate.expr(), PredicateExpr::Binary { .. }));
}
