//! 执行管线端到端行为：权限空操作、前置中止、校验/后置钩子边界、
//! 错误路由与吞错、并发闸门、执行期自动失效。
use async_trait::async_trait;
use futures_util::StreamExt;
use relay_command::{
    BoxError, CommandError, Execution, ExecutionContext, RelayCommand,
};
use relay_macros::{Observable, can_execute};
use relay_observable::{ChangeNotifier, Property};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use tokio::time::timeout;

#[derive(Observable)]
struct TransferForm {
    notifier: ChangeNotifier,
    is_busy: Property<bool>,
    amount: Property<i64>,
}

impl TransferForm {
    fn new(amount: i64) -> Arc<Self> {
        let notifier = ChangeNotifier::new();
        Arc::new(Self {
            is_busy: Property::new("is_busy", notifier.clone(), false),
            amount: Property::new("amount", notifier.clone(), amount),
            notifier,
        })
    }
}

#[derive(Clone, Default)]
struct Spies {
    before: Arc<AtomicUsize>,
    validate: Arc<AtomicUsize>,
    action: Arc<AtomicUsize>,
    after: Arc<AtomicUsize>,
    on_error: Arc<AtomicUsize>,
}

impl Spies {
    fn counts(&self) -> (usize, usize, usize, usize, usize) {
        (
            self.before.load(Ordering::SeqCst),
            self.validate.load(Ordering::SeqCst),
            self.action.load(Ordering::SeqCst),
            self.after.load(Ordering::SeqCst),
            self.on_error.load(Ordering::SeqCst),
        )
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn permission_false_is_a_noop_without_any_hook() {
    let form = TransferForm::new(0);
    let spies = Spies::default();

    let before = spies.before.clone();
    let action = spies.action.clone();
    let after = spies.after.clone();
    let on_error = spies.on_error.clone();

    let command = RelayCommand::<()>::builder(form.clone())
        .with_can_execute(can_execute!(form, form.amount > 0))
        .with_before_execute(move |_: &mut ExecutionContext| {
            before.fetch_add(1, Ordering::SeqCst);
            Ok(true)
        })
        .unwrap()
        .with_execute(move |_: (), _: &mut ExecutionContext| {
            action.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .unwrap()
        .with_after_execute(move |_: &mut ExecutionContext| {
            after.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .unwrap()
        .with_error_handler(move |_: &CommandError| {
            on_error.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap()
        .build()
        .unwrap();

    assert!(!command.can_execute());
    let outcome = command.execute(()).await.unwrap();

    assert_eq!(outcome, Execution::NotPermitted);
    assert_eq!(spies.counts(), (0, 0, 0, 0, 0));
}

#[tokio::test(flavor = "multi_thread")]
async fn before_hook_false_skips_action_and_after_hook() {
    let form = TransferForm::new(10);
    let spies = Spies::default();

    let action = spies.action.clone();
    let after = spies.after.clone();

    let command = RelayCommand::<()>::builder(form)
        .with_before_execute(|_: &mut ExecutionContext| Ok(false))
        .unwrap()
        .with_execute(move |_: (), _: &mut ExecutionContext| {
            action.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .unwrap()
        .with_after_execute(move |_: &mut ExecutionContext| {
            after.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .unwrap()
        .build()
        .unwrap();

    let outcome = command.execute(()).await.unwrap();

    assert_eq!(outcome, Execution::Aborted);
    assert_eq!(spies.action.load(Ordering::SeqCst), 0);
    assert_eq!(spies.after.load(Ordering::SeqCst), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn validator_refusal_skips_action_but_still_runs_after_hook() {
    let form = TransferForm::new(10);
    let spies = Spies::default();

    let validate = spies.validate.clone();
    let action = spies.action.clone();
    let after = spies.after.clone();

    let command = RelayCommand::<()>::builder(form)
        .with_validator(move |_: &mut ExecutionContext| {
            validate.fetch_add(1, Ordering::SeqCst);
            Ok(false)
        })
        .unwrap()
        .with_execute(move |_: (), _: &mut ExecutionContext| {
            action.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .unwrap()
        .with_after_execute(move |_: &mut ExecutionContext| {
            after.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .unwrap()
        .build()
        .unwrap();

    // 校验失败不是错误：结果为 Invalid，后置钩子照常运行
    let outcome = command.execute(()).await.unwrap();

    assert_eq!(outcome, Execution::Invalid);
    assert_eq!(spies.validate.load(Ordering::SeqCst), 1);
    assert_eq!(spies.action.load(Ordering::SeqCst), 0);
    assert_eq!(spies.after.load(Ordering::SeqCst), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn action_error_runs_handler_then_after_hook_then_propagates() {
    let form = TransferForm::new(10);
    let spies = Spies::default();

    let after = spies.after.clone();
    let on_error = spies.on_error.clone();
    let after_saw_error = Arc::new(AtomicUsize::new(0));
    let after_saw_error2 = after_saw_error.clone();

    let command = RelayCommand::<()>::builder(form)
        .with_execute(|_: (), _: &mut ExecutionContext| Err("boom".into()))
        .unwrap()
        .with_after_execute(move |ctx: &mut ExecutionContext| {
            after.fetch_add(1, Ordering::SeqCst);
            if ctx.error().is_some() {
                after_saw_error2.fetch_add(1, Ordering::SeqCst);
            }
            Ok(())
        })
        .unwrap()
        .with_error_handler(move |_: &CommandError| {
            on_error.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap()
        .build()
        .unwrap();

    let err = command.execute(()).await.unwrap_err();

    assert!(matches!(err, CommandError::Execute(_)));
    assert_eq!(spies.on_error.load(Ordering::SeqCst), 1);
    assert_eq!(spies.after.load(Ordering::SeqCst), 1);
    // 后置钩子运行时错误已写入上下文
    assert_eq!(after_saw_error.load(Ordering::SeqCst), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn swallowed_error_reaches_handler_but_not_the_caller() {
    let form = TransferForm::new(10);
    let spies = Spies::default();
    let on_error = spies.on_error.clone();

    let command = RelayCommand::<()>::builder(form)
        .with_execute(|_: (), _: &mut ExecutionContext| Err("boom".into()))
        .unwrap()
        .with_error_handler(move |_: &CommandError| {
            on_error.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap()
        .with_swallow_errors()
        .build()
        .unwrap();

    let outcome = command.execute(()).await.unwrap();

    assert_eq!(outcome, Execution::Faulted);
    assert_eq!(spies.on_error.load(Ordering::SeqCst), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn before_hook_error_routes_to_handler_without_after_hook() {
    let form = TransferForm::new(10);
    let spies = Spies::default();

    let after = spies.after.clone();
    let on_error = spies.on_error.clone();

    let command = RelayCommand::<()>::builder(form)
        .with_before_execute(|_: &mut ExecutionContext| Err("denied".into()))
        .unwrap()
        .with_execute(|_: (), _: &mut ExecutionContext| Ok(()))
        .unwrap()
        .with_after_execute(move |_: &mut ExecutionContext| {
            after.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .unwrap()
        .with_error_handler(move |_: &CommandError| {
            on_error.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap()
        .build()
        .unwrap();

    let err = command.execute(()).await.unwrap_err();

    assert!(matches!(err, CommandError::BeforeExecute(_)));
    assert_eq!(spies.on_error.load(Ordering::SeqCst), 1);
    // 未进入并发闸门，保证范围尚未开始
    assert_eq!(spies.after.load(Ordering::SeqCst), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn after_hook_error_propagates_when_action_succeeded() {
    let form = TransferForm::new(10);

    let command = RelayCommand::<()>::builder(form)
        .with_execute(|_: (), _: &mut ExecutionContext| Ok(()))
        .unwrap()
        .with_after_execute(|_: &mut ExecutionContext| Err("cleanup failed".into()))
        .unwrap()
        .build()
        .unwrap();

    let err = command.execute(()).await.unwrap_err();
    assert!(matches!(err, CommandError::AfterExecute(_)));
}

struct SlowAction {
    running: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

#[async_trait]
impl relay_command::ExecuteHandler<()> for SlowAction {
    async fn execute(&self, _input: (), _ctx: &mut ExecutionContext) -> Result<(), BoxError> {
        let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(100)).await;
        self.running.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrency_limit_bounds_simultaneous_actions() {
    let form = TransferForm::new(10);
    let running = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));

    let command = Arc::new(
        RelayCommand::<()>::builder(form)
            .with_execute_async(SlowAction {
                running: running.clone(),
                peak: peak.clone(),
            })
            .unwrap()
            .with_concurrent_execution_of(2)
            .unwrap()
            .build()
            .unwrap(),
    );

    let started = Instant::now();
    let mut set = JoinSet::new();
    for _ in 0..3 {
        let command = command.clone();
        set.spawn(async move { command.execute(()).await.unwrap() });
    }
    while let Some(res) = set.join_next().await {
        assert_eq!(res.unwrap(), Execution::Completed);
    }

    // 最多两个动作同时在跑；第三个必须等到有槽位空出
    assert_eq!(peak.load(Ordering::SeqCst), 2);
    assert!(started.elapsed() >= Duration::from_millis(190));
    assert_eq!(running.load(Ordering::SeqCst), 0);
}

struct Sleeper;

#[async_trait]
impl relay_command::ExecuteHandler<()> for Sleeper {
    async fn execute(&self, _input: (), _ctx: &mut ExecutionContext) -> Result<(), BoxError> {
        tokio::time::sleep(Duration::from_millis(100)).await;
        Ok(())
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn auto_invalidate_reports_not_permitted_while_running() {
    let form = TransferForm::new(10);

    let command = Arc::new(
        RelayCommand::<()>::builder(form.clone())
            .with_can_execute(can_execute!(form, form.amount > 0))
            .with_execute_async(Sleeper)
            .unwrap()
            .with_auto_invalidate_when_executing()
            .build()
            .unwrap(),
    );

    let mut changes = command.observe_can_execute();
    assert_eq!(changes.next().await, Some(true));

    let task = {
        let command = command.clone();
        tokio::spawn(async move { command.execute(()).await.unwrap() })
    };

    // 执行期内权限为假，并已发布变更
    let during = timeout(Duration::from_secs(1), changes.next())
        .await
        .expect("permission change while running");
    assert_eq!(during, Some(false));
    assert!(!command.can_execute());

    // 结束后恢复自然值
    let after = timeout(Duration::from_secs(1), changes.next())
        .await
        .expect("permission restored after completion");
    assert_eq!(after, Some(true));
    assert_eq!(task.await.unwrap(), Execution::Completed);
    assert!(command.can_execute());
}
