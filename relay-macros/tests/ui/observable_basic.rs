use relay_macros::Observable;
use relay_observable::{ChangeNotifier, Observable as _, Property};

#[derive(Observable)]
struct Counter {
    notifier: ChangeNotifier,
    count: Property<i64>,
    label: Property<String>,
}

fn main() {
    let notifier = ChangeNotifier::new();
    let counter = Counter {
        count: Property::new("count", notifier.clone(), 0),
        label: Property::new("label", notifier.clone(), String::new()),
        notifier,
    };

    assert_eq!(counter.declared_properties(), ["count", "label"]);
    counter.count.set(1);
    assert_eq!(counter.count.get(), 1);
    let _ = counter.notifier();
}
