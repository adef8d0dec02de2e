//! 演示：错误处理器与吞错开关。
//! 同一个失败动作，先以传播模式执行，再以吞错模式执行。
use relay_command::{CommandError, ExecutionContext, RelayCommand};
use relay_macros::Observable;
use relay_observable::{ChangeNotifier, Property};
use std::sync::Arc;

#[derive(Observable)]
struct Panel {
    notifier: ChangeNotifier,
    enabled: Property<bool>,
}

fn failing_panel() -> Arc<Panel> {
    let notifier = ChangeNotifier::new();
    Arc::new(Panel {
        enabled: Property::new("enabled", notifier.clone(), true),
        notifier,
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 传播模式：错误处理器先收到错误，随后错误返回给调用方
    let strict = RelayCommand::<()>::builder(failing_panel())
        .with_execute(|_: (), _: &mut ExecutionContext| Err("downstream unavailable".into()))?
        .with_error_handler(|err: &CommandError| {
            eprintln!("handler saw: {err}");
        })?
        .build()?;

    match strict.execute(()).await {
        Err(err) => println!("caller saw: {err}"),
        Ok(outcome) => println!("unexpected outcome: {outcome:?}"),
    }

    // 吞错模式：调用方只观察到“没有效果”，错误可见性全靠处理器
    let quiet = RelayCommand::<()>::builder(failing_panel())
        .with_execute(|_: (), _: &mut ExecutionContext| Err("downstream unavailable".into()))?
        .with_error_handler(|err: &CommandError| {
            eprintln!("handler saw: {err}");
        })?
        .with_swallow_errors()
        .build()?;

    let outcome = quiet.execute(()).await?;
    println!("caller saw outcome: {outcome:?}");

    Ok(())
}
