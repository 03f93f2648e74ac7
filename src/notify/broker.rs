use std::{
    collections::HashMap,
    fmt,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Weak,
    },
};

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::{
    bus::{BusCallback, LocalBus, SystemBus},
    dispatch::{main_queue, DispatchQueue},
};

use super::{
    table::{Action, ActionTable, RegisteredAction},
    Notification, NotificationCenter, ObserverId, Observing, PrefixedCenter,
};

/// Процесс-широкий брокер по умолчанию.
static DEFAULT_BROKER: Lazy<Arc<NotificationBroker>> =
    Lazy::new(|| Arc::new(NotificationBroker::new()));

/// Возвращает брокер по умолчанию поверх глобальной шины.
///
/// Ленивая потокобезопасная инициализация: при конкурентном первом
/// обращении создаётся ровно один экземпляр, живущий до конца процесса.
pub fn default_broker() -> Arc<NotificationBroker> {
    DEFAULT_BROKER.clone()
}

/// Возвращает префиксированное представление брокера по умолчанию.
///
/// Ведущие и замыкающие точки префикса отбрасываются. Независимо
/// созданные представления с одинаковым префиксом взаимозаменяемы.
pub fn with_prefix(prefix: &str) -> PrefixedCenter<NotificationBroker> {
    PrefixedCenter::new(default_broker(), prefix)
}

/// Непрозрачный хэндл блочной регистрации.
///
/// Брокер удерживает собственную копию хэндла до явного удаления, поэтому
/// регистрация переживает потерю всех внешних копий. Хэндл — единственный
/// ключ для удаления именно этой регистрации.
#[derive(Clone)]
pub struct ObserverHandle {
    core: Arc<HandleCore>,
}

struct HandleCore {
    name: Arc<str>,
}

impl ObserverHandle {
    fn new(name: Arc<str>) -> Self {
        Self {
            core: Arc::new(HandleCore { name }),
        }
    }

    /// Имя, на которое зарегистрирован хэндл.
    pub fn name(&self) -> &str {
        &self.core.name
    }

    pub(crate) fn id(&self) -> ObserverId {
        ObserverId::of_arc(&self.core)
    }
}

impl fmt::Debug for ObserverHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverHandle")
            .field("name", &self.core.name)
            .finish()
    }
}

/// Реестр наблюдателей поверх системной шины.
///
/// Мультиплексирует N локальных наблюдателей на одну подписку шины на имя:
/// `subscribe` вызывается ровно один раз на переходе 0→1 наблюдателей,
/// `unsubscribe` — ровно один раз на переходе 1→0. Все мутации таблицы и
/// обработчик событий шины сериализуются одним замком; постановка действий
/// на очереди доставки происходит уже вне замка, так что действие может
/// повторно входить в брокер (например, удалять само себя).
pub struct NotificationBroker<B: SystemBus = LocalBus> {
    shared: Arc<BrokerShared<B>>,
}

struct BrokerShared<B: SystemBus> {
    bus: Arc<B>,
    default_queue: DispatchQueue,
    inner: Mutex<BrokerInner>,
    /// Общее количество вызовов `post_notification*`.
    post_count: AtomicUsize,
    /// Общее количество действий, поставленных на очереди доставки.
    delivery_count: AtomicUsize,
}

struct BrokerInner {
    table: ActionTable,
    /// Хэндлы блочных регистраций, удерживаемые брокером.
    retained: HashMap<ObserverId, ObserverHandle>,
}

impl NotificationBroker<LocalBus> {
    /// Создаёт брокер поверх глобальной внутрипроцессной шины.
    pub fn new() -> Self {
        Self::with_bus(LocalBus::global())
    }
}

impl Default for NotificationBroker<LocalBus> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: SystemBus> NotificationBroker<B> {
    /// Создаёт брокер поверх заданной шины с главной очередью доставки
    /// по умолчанию.
    pub fn with_bus(bus: Arc<B>) -> Self {
        Self::with_bus_and_queue(bus, main_queue())
    }

    /// Создаёт брокер с заданной шиной и очередью доставки по умолчанию.
    pub fn with_bus_and_queue(bus: Arc<B>, default_queue: DispatchQueue) -> Self {
        Self {
            shared: Arc::new(BrokerShared {
                bus,
                default_queue,
                inner: Mutex::new(BrokerInner {
                    table: ActionTable::new(),
                    retained: HashMap::new(),
                }),
                post_count: AtomicUsize::new(0),
                delivery_count: AtomicUsize::new(0),
            }),
        }
    }

    /// Количество наблюдателей имени.
    pub fn observer_count(&self, name: &str) -> usize {
        self.shared.inner.lock().table.observer_count(name)
    }

    /// Держит ли брокер подписку шины на имя.
    pub fn is_subscribed(&self, name: &str) -> bool {
        self.shared.inner.lock().table.contains(name)
    }

    /// Общее количество публикаций через этот брокер.
    pub fn post_count(&self) -> usize {
        self.shared.post_count.load(Ordering::Relaxed)
    }

    /// Общее количество действий, поставленных на доставку.
    pub fn delivery_count(&self) -> usize {
        self.shared.delivery_count.load(Ordering::Relaxed)
    }

    /// Регистрирует действие под именем; при необходимости заводит строку
    /// таблицы и единственную подписку шины. `retain` — хэндл блочной
    /// регистрации, удерживаемый в той же критической секции.
    fn register(
        &self,
        name: &str,
        id: ObserverId,
        queue: DispatchQueue,
        action: Action,
        retain: Option<ObserverHandle>,
    ) {
        warn_if_flat(name);
        let mut inner = self.shared.inner.lock();
        if !inner.table.contains(name) {
            let token = self.shared.bus.subscribe(name, bus_callback(&self.shared));
            inner.table.insert_row(Arc::from(name), token);
            debug!(name, "first observer, subscribed on system bus");
        }
        inner.table.push_action(name, id, RegisteredAction { queue, action });
        if let Some(handle) = retain {
            inner.retained.insert(id, handle);
        }
    }

    fn remove_all(&self, id: ObserverId) {
        let mut inner = self.shared.inner.lock();
        inner.retained.remove(&id);
        for (name, token) in inner.table.remove_observer(id) {
            self.shared.bus.unsubscribe(token, &name);
            debug!(name = &*name, "last observer gone, unsubscribed from system bus");
        }
    }

    fn remove_named(&self, id: ObserverId, name: &str) {
        let mut inner = self.shared.inner.lock();
        if let Some((name, token)) = inner.table.remove_pair(name, id) {
            self.shared.bus.unsubscribe(token, &name);
            debug!(name = &*name, "last observer gone, unsubscribed from system bus");
        }
        // Хэндл удерживается, пока у наблюдателя есть хоть одна запись.
        if !inner.table.observer_registered(id) {
            inner.retained.remove(&id);
        }
    }
}

impl<B: SystemBus> NotificationCenter for NotificationBroker<B> {
    fn add_observer<O, F>(&self, observer: &Arc<O>, action: F, name: &str)
    where
        O: Send + Sync + 'static,
        F: Fn(&O, &Notification) + Send + Sync + 'static,
    {
        let id = ObserverId::of_arc(observer);
        let target = Arc::downgrade(observer);
        let action: Action = Arc::new(move |note: &Notification| {
            // Наблюдатель мог умереть между снимком и выполнением:
            // мёртвая запись просто бездействует.
            if let Some(observer) = target.upgrade() {
                action(&observer, note);
            }
        });
        self.register(name, id, self.shared.default_queue.clone(), action, None);
    }

    fn add_observer_for_name<F>(
        &self,
        name: &str,
        queue: Option<DispatchQueue>,
        block: F,
    ) -> ObserverHandle
    where
        F: Fn(&Notification) + Send + Sync + 'static,
    {
        let handle = ObserverHandle::new(Arc::from(name));
        let queue = queue.unwrap_or_else(|| self.shared.default_queue.clone());
        self.register(
            name,
            handle.id(),
            queue,
            Arc::new(block),
            Some(handle.clone()),
        );
        handle
    }

    fn remove_observer<K: Observing>(&self, observer: &K) {
        self.remove_all(observer.observer_id());
    }

    fn remove_observer_for_name<K: Observing>(&self, observer: &K, name: Option<&str>) {
        match name {
            Some(name) => self.remove_named(observer.observer_id(), name),
            None => self.remove_all(observer.observer_id()),
        }
    }

    fn post_notification(&self, notification: &Notification) {
        // Нагрузка уведомления через шину не проходит.
        self.post_notification_name(notification.name());
    }

    fn post_notification_name(&self, name: &str) {
        warn_if_flat(name);
        self.shared.post_count.fetch_add(1, Ordering::Relaxed);
        self.shared.bus.publish(name);
    }
}

impl<B: SystemBus> BrokerShared<B> {
    /// Обработчик события шины: снимок строки под замком, постановка на
    /// очереди — вне замка. Удаления, инициированные уже выполняющимся
    /// действием, не затрагивают текущий снимок.
    fn deliver(self: &Arc<Self>, name: &str) {
        let jobs = {
            let inner = self.inner.lock();
            inner.table.snapshot(name)
        };
        if jobs.is_empty() {
            return;
        }
        let note = Notification::delivered(Arc::from(name));
        for (queue, action) in jobs {
            let note = note.clone();
            match queue.dispatch(move || action(&note)) {
                Ok(()) => {
                    self.delivery_count.fetch_add(1, Ordering::Relaxed);
                }
                Err(_) => {
                    warn!(name, queue = queue.label(), "delivery dropped: queue closed");
                }
            }
        }
    }
}

impl<B: SystemBus> Drop for BrokerShared<B> {
    fn drop(&mut self) {
        // Брокер обязан снять все свои подписки на шине.
        let inner = self.inner.get_mut();
        for (name, token) in inner.table.drain_rows() {
            self.bus.unsubscribe(token, &name);
        }
    }
}

/// Колбэк для шины: держит слабую ссылку на брокера и маршализует событие
/// в его критическую секцию.
fn bus_callback<B: SystemBus>(shared: &Arc<BrokerShared<B>>) -> BusCallback {
    let weak: Weak<BrokerShared<B>> = Arc::downgrade(shared);
    Arc::new(move |name: &str| {
        if let Some(shared) = weak.upgrade() {
            shared.deliver(name);
        }
    })
}

/// Обратно-доменная форма имени — соглашение, а не требование:
/// предупреждаем в отладочной сборке, никогда не отклоняем.
fn warn_if_flat(name: &str) {
    if cfg!(debug_assertions) && name.matches('.').count() < 2 {
        warn!(name, "notification name is not reverse-domain qualified");
    }
}
