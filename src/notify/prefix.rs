use std::sync::Arc;

use tracing::warn;

use crate::dispatch::DispatchQueue;

use super::{Notification, NotificationCenter, ObserverHandle, Observing};

/// Декоратор, прозрачно дополняющий имена фиксированным префиксом.
///
/// Оборачивает любой [`NotificationCenter`] и переписывает каждое имя в
/// `prefix.имя` на входе; безымянное удаление пересылается без изменений.
/// Состояния у декоратора нет, поэтому независимо созданные представления
/// с одинаковым префиксом поверх одного брокера взаимозаменяемы:
/// наблюдатель, добавленный через одно, получает публикации из любого
/// другого. Декораторы вкладываются друг в друга.
pub struct PrefixedCenter<C: NotificationCenter> {
    inner: Arc<C>,
    prefix: String,
}

impl<C: NotificationCenter> PrefixedCenter<C> {
    /// Создаёт представление `inner` с префиксом `prefix`.
    ///
    /// Ведущие и замыкающие точки префикса отбрасываются.
    pub fn new(inner: Arc<C>, prefix: &str) -> Self {
        Self {
            inner,
            prefix: prefix.trim_matches('.').to_string(),
        }
    }

    /// Обрезанный префикс представления.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Полное имя: `prefix.имя`.
    ///
    /// Имя, уже начинающееся с префикса, — вероятная ошибка вызывающего:
    /// в отладочной сборке предупреждаем, но префикс всё равно
    /// добавляется (задокументированное поведение, не исправляется).
    fn qualified(&self, name: &str) -> String {
        if self.prefix.is_empty() {
            return name.to_string();
        }
        if cfg!(debug_assertions) && name.starts_with(&self.prefix) {
            warn!(
                prefix = %self.prefix,
                name,
                "name already carries the prefix, result will be double-prefixed"
            );
        }
        format!("{}.{}", self.prefix, name)
    }
}

impl<C: NotificationCenter> Clone for PrefixedCenter<C> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            prefix: self.prefix.clone(),
        }
    }
}

impl<C: NotificationCenter> NotificationCenter for PrefixedCenter<C> {
    fn add_observer<O, F>(&self, observer: &Arc<O>, action: F, name: &str)
    where
        O: Send + Sync + 'static,
        F: Fn(&O, &Notification) + Send + Sync + 'static,
    {
        self.inner.add_observer(observer, action, &self.qualified(name));
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
        self.inner
            .add_observer_for_name(&self.qualified(name), queue, block)
    }

    fn remove_observer<K: Observing>(&self, observer: &K) {
        // имени нет — пересылаем как есть
        self.inner.remove_observer(observer);
    }

    fn remove_observer_for_name<K: Observing>(&self, observer: &K, name: Option<&str>) {
        match name {
            Some(name) => self
                .inner
                .remove_observer_for_name(observer, Some(&self.qualified(name))),
            None => self.inner.remove_observer(observer),
        }
    }

    fn post_notification(&self, notification: &Notification) {
        self.inner
            .post_notification_name(&self.qualified(notification.name()));
    }

    fn post_notification_name(&self, name: &str) {
        self.inner.post_notification_name(&self.qualified(name));
    }
}
