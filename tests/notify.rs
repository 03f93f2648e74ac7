use std::{
    sync::{
        mpsc::{self, RecvTimeoutError},
        Arc,
    },
    time::Duration,
};

use serial_test::serial;
use vestnik::{
    default_broker, with_prefix, LocalBus, Notification, NotificationBroker, NotificationCenter,
    PrefixedCenter,
};

const TICK: Duration = Duration::from_secs(1);
const QUIET: Duration = Duration::from_millis(150);

/// Включает вывод tracing в тестах; фильтр берётся из `RUST_LOG`.
/// Повторные вызовы из других тестов безвредны.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init()
        .ok();
}

/// Тест проверяет сквозной сценарий слабой регистрации: наблюдатель,
/// связанный методом, получает уведомление ровно один раз с полным
/// именем.
#[test]
fn test_target_action_end_to_end() {
    init_tracing();

    struct Listener {
        tx: mpsc::Sender<String>,
    }

    impl Listener {
        fn on_foo(&self, note: &Notification) {
            self.tx.send(note.name().to_string()).ok();
        }
    }

    let bus = Arc::new(LocalBus::new());
    let broker = NotificationBroker::with_bus(bus);
    let (tx, rx) = mpsc::channel();
    let listener = Arc::new(Listener { tx });

    broker.add_observer(&listener, Listener::on_foo, "com.app.Foo");
    broker.post_notification_name("com.app.Foo");

    assert_eq!(rx.recv_timeout(TICK).as_deref(), Ok("com.app.Foo"));
    assert_eq!(rx.recv_timeout(QUIET), Err(RecvTimeoutError::Timeout));
}

/// Тест проверяет сценарий блочной регистрации: после потери внешней
/// копии хэндла блок продолжает срабатывать — регистрацию держит брокер,
/// а не вызывающий.
#[test]
fn test_block_survives_dropped_handle() {
    init_tracing();

    let bus = Arc::new(LocalBus::new());
    let broker = NotificationBroker::with_bus(bus);
    let (tx, rx) = mpsc::channel();

    let handle = broker.add_observer_for_name("com.app.Bar", None, move |note| {
        tx.send(note.name().to_string()).ok();
    });
    drop(handle);

    broker.post_notification_name("com.app.Bar");
    assert_eq!(rx.recv_timeout(TICK).as_deref(), Ok("com.app.Bar"));
}

/// Тест проверяет сценарий префикса: пост «Bar» через представление
/// «com.app» доходит до наблюдателя полного имени на голом брокере.
#[test]
fn test_prefixed_view_scenario() {
    init_tracing();

    let bus = Arc::new(LocalBus::new());
    let broker = Arc::new(NotificationBroker::with_bus(bus));
    let view = PrefixedCenter::new(broker.clone(), "com.app");
    let (tx, rx) = mpsc::channel();

    let _handle = broker.add_observer_for_name("com.app.Bar", None, move |note| {
        tx.send(note.name().to_string()).ok();
    });

    view.post_notification_name("Bar");
    assert_eq!(rx.recv_timeout(TICK).as_deref(), Ok("com.app.Bar"));
}

/// Тест проверяет выборочное удаление: из двух наблюдателей имени после
/// удаления первого пост доставляется только второму.
#[test]
fn test_remove_one_of_two_observers() {
    init_tracing();

    let bus = Arc::new(LocalBus::new());
    let broker = NotificationBroker::with_bus(bus);
    let (tx_a, rx_a) = mpsc::channel();
    let (tx_b, rx_b) = mpsc::channel();

    let a = broker.add_observer_for_name("com.app.N", None, move |_| {
        tx_a.send(()).ok();
    });
    let _b = broker.add_observer_for_name("com.app.N", None, move |_| {
        tx_b.send(()).ok();
    });

    broker.remove_observer_for_name(&a, Some("com.app.N"));
    broker.post_notification_name("com.app.N");

    assert_eq!(rx_b.recv_timeout(TICK), Ok(()));
    // Удаление A сбросило его действие вместе с отправителем канала:
    // приёмник видит тишину или закрытый канал, но не доставку.
    assert!(rx_a.recv_timeout(QUIET).is_err());
}

/// Тест проверяет «межпроцессный» сценарий: два независимых брокера на
/// одной шине; пост через один доходит до наблюдателя другого.
#[test]
fn test_two_brokers_share_one_bus() {
    init_tracing();

    let bus = Arc::new(LocalBus::new());
    let receiver = NotificationBroker::with_bus(bus.clone());
    let sender = NotificationBroker::with_bus(bus.clone());
    let (tx, rx) = mpsc::channel();

    let _handle = receiver.add_observer_for_name("com.app.IPC", None, move |note| {
        tx.send(note.name().to_string()).ok();
    });
    // одно имя — одна подписка на брокера
    assert_eq!(bus.listener_count("com.app.IPC"), 1);

    sender.post_notification_name("com.app.IPC");
    assert_eq!(rx.recv_timeout(TICK).as_deref(), Ok("com.app.IPC"));
}

/// Тест проверяет, что `default_broker` выдаёт один и тот же экземпляр
/// и что он работает поверх глобальной шины.
#[test]
#[serial]
fn test_default_broker_singleton() {
    init_tracing();

    let a = default_broker();
    let b = default_broker();
    assert!(Arc::ptr_eq(&a, &b));

    let (tx, rx) = mpsc::channel();
    let handle = a.add_observer_for_name("com.vestnik.tests.Default", None, move |note| {
        tx.send(note.name().to_string()).ok();
    });

    b.post_notification_name("com.vestnik.tests.Default");
    assert_eq!(
        rx.recv_timeout(TICK).as_deref(),
        Ok("com.vestnik.tests.Default")
    );

    a.remove_observer(&handle);
}

/// Тест проверяет `with_prefix` поверх брокера по умолчанию: два
/// независимых представления с одним префиксом взаимозаменяемы.
#[test]
#[serial]
fn test_with_prefix_views_interoperate() {
    init_tracing();

    let view1 = with_prefix("com.vestnik.tests");
    let view2 = with_prefix(".com.vestnik.tests.");
    assert_eq!(view1.prefix(), view2.prefix());

    let (tx, rx) = mpsc::channel();
    let handle = view1.add_observer_for_name("Interop", None, move |note| {
        tx.send(note.name().to_string()).ok();
    });

    view2.post_notification_name("Interop");
    assert_eq!(
        rx.recv_timeout(TICK).as_deref(),
        Ok("com.vestnik.tests.Interop")
    );

    view1.remove_observer(&handle);
}
