//! 演示：一个转账表单的提交命令。
//! 权限 = 非忙碌且金额为正；执行期间自动失效；前后钩子维护忙碌标记。
use relay_command::{ExecutionContext, RelayCommand};
use relay_macros::{Observable, can_execute};
use relay_observable::{ChangeNotifier, Property};
use std::sync::Arc;

#[derive(Observable)]
struct TransferForm {
    notifier: ChangeNotifier,
    is_busy: Property<bool>,
    amount: Property<i64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let notifier = ChangeNotifier::new();
    let form = Arc::new(TransferForm {
        is_busy: Property::new("is_busy", notifier.clone(), false),
        amount: Property::new("amount", notifier.clone(), 0),
        notifier,
    });

    let busy_on = form.clone();
    let busy_off = form.clone();

    let submit = RelayCommand::<i64>::builder(form.clone())
        .with_can_execute(can_execute!(form, !form.is_busy && form.amount > 0))
        .with_before_execute(move |_: &mut ExecutionContext| {
            busy_on.is_busy.set(true);
            Ok(true)
        })?
        .with_validator(|ctx: &mut ExecutionContext| {
            ctx.insert("validated", serde_json::json!(true));
            Ok(true)
        })?
        .with_execute(|amount: i64, ctx: &mut ExecutionContext| {
            println!(
                "transferring {amount} (invocation {})",
                ctx.invocation_id()
            );
            Ok(())
        })?
        .with_after_execute(move |_: &mut ExecutionContext| {
            busy_off.is_busy.set(false);
            Ok(())
        })?
        .build()?;

    println!("tracked properties: {:?}", submit.tracked_properties());
    println!("can_execute with amount=0: {}", submit.can_execute());

    form.amount.set(250);
    println!("can_execute with amount=250: {}", submit.can_execute());

    let outcome = submit.execute(form.amount.get()).await?;
    println!("outcome: {outcome:?}");

    submit.dispose();
    Ok(())
}
