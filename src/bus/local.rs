use std::sync::{
    atomic::{AtomicU64, AtomicUsize, Ordering},
    Arc,
};

use dashmap::DashMap;
use once_cell::sync::Lazy;
use tracing::debug;

use super::{BusCallback, BusToken, SystemBus};

type NameKey = Arc<str>;

/// Общая для всего процесса шина. Независимо созданные брокеры видят
/// публикации друг друга — внутрипроцессный аналог системной шины.
static GLOBAL_BUS: Lazy<Arc<LocalBus>> = Lazy::new(|| Arc::new(LocalBus::new()));

/// Внутрипроцессная эталонная реализация [`SystemBus`].
///
/// Хранит получателей по имени и доставляет события синхронно в потоке
/// публикующего. Используется как шина по умолчанию и как заглушка
/// системной шины в тестах.
pub struct LocalBus {
    /// Имя → список (токен, колбэк) в порядке подписки.
    listeners: DashMap<NameKey, Vec<(BusToken, BusCallback)>>,
    /// Счётчик для выдачи уникальных токенов.
    next_token: AtomicU64,
    /// Общее количество вызовов `publish`.
    pub publish_count: AtomicUsize,
}

impl LocalBus {
    /// Создаёт пустую шину.
    pub fn new() -> Self {
        Self {
            listeners: DashMap::new(),
            next_token: AtomicU64::new(1),
            publish_count: AtomicUsize::new(0),
        }
    }

    /// Возвращает процесс-широкую шину.
    pub fn global() -> Arc<LocalBus> {
        GLOBAL_BUS.clone()
    }

    /// Количество активных подписок на имя.
    pub fn listener_count(&self, name: &str) -> usize {
        self.listeners.get(name).map_or(0, |e| e.value().len())
    }
}

impl Default for LocalBus {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemBus for LocalBus {
    fn subscribe(&self, name: &str, deliver: BusCallback) -> BusToken {
        let token = BusToken(self.next_token.fetch_add(1, Ordering::Relaxed));
        let key: NameKey = Arc::from(name);
        self.listeners.entry(key).or_default().push((token, deliver));
        debug!(name, token = token.0, "bus subscribe");
        token
    }

    fn unsubscribe(&self, token: BusToken, name: &str) {
        let Some(mut entry) = self.listeners.get_mut(name) else {
            return;
        };
        entry.value_mut().retain(|(t, _)| *t != token);
        let empty = entry.value().is_empty();
        drop(entry);
        if empty {
            // пустая строка не должна пережить последнюю подписку
            self.listeners.remove_if(name, |_, v| v.is_empty());
        }
        debug!(name, token = token.0, "bus unsubscribe");
    }

    fn publish(&self, name: &str) {
        self.publish_count.fetch_add(1, Ordering::Relaxed);
        // Клонируем получателей до вызова: шард DashMap нельзя держать,
        // пока колбэк берёт чужие замки.
        let delivers: Vec<BusCallback> = match self.listeners.get(name) {
            Some(entry) => entry.value().iter().map(|(_, cb)| cb.clone()).collect(),
            None => return,
        };
        for deliver in delivers {
            deliver(name);
        }
    }
}
