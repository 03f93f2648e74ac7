use std::sync::Arc;

use crate::dispatch::DispatchQueue;

use super::{Notification, ObserverHandle, ObserverId};

/// Источник идентичности наблюдателя для операций удаления.
///
/// Реализован для `Arc<O>` (слабые регистрации через `add_observer`)
/// и для [`ObserverHandle`] (блочные регистрации).
pub trait Observing {
    fn observer_id(&self) -> ObserverId;
}

impl<O: Send + Sync + 'static> Observing for Arc<O> {
    fn observer_id(&self) -> ObserverId {
        ObserverId::of_arc(self)
    }
}

impl Observing for ObserverHandle {
    fn observer_id(&self) -> ObserverId {
        self.id()
    }
}

/// Единый набор возможностей центра уведомлений.
///
/// Реализуется двумя вариантами: прямым —
/// [`NotificationBroker`](super::NotificationBroker) — и пересылающим —
/// [`PrefixedCenter`](super::PrefixedCenter), который держит ссылку на
/// другой центр и переписывает имена. Благодаря общему трейту декораторы
/// свободно вкладываются друг в друга.
pub trait NotificationCenter: Send + Sync {
    /// Слабая регистрация: центр не продлевает жизнь наблюдателя.
    ///
    /// `action` вызывается с наблюдателем и уведомлением на очереди
    /// доставки по умолчанию. Если наблюдатель уже уничтожен к моменту
    /// доставки, действие молча пропускается. Повторная регистрация той
    /// же пары (имя, наблюдатель) аддитивна.
    fn add_observer<O, F>(&self, observer: &Arc<O>, action: F, name: &str)
    where
        O: Send + Sync + 'static,
        F: Fn(&O, &Notification) + Send + Sync + 'static;

    /// Блочная регистрация: центр создаёт свежий хэндл, удерживает его
    /// копию до явного удаления и возвращает хэндл вызывающему.
    ///
    /// `queue: None` означает очередь доставки по умолчанию. Вернувшийся
    /// хэндл — единственный ключ для удаления именно этой регистрации.
    fn add_observer_for_name<F>(
        &self,
        name: &str,
        queue: Option<DispatchQueue>,
        block: F,
    ) -> ObserverHandle
    where
        F: Fn(&Notification) + Send + Sync + 'static;

    /// Удаляет все записи наблюдателя по всем именам; удержание хэндла
    /// сбрасывается безусловно. Отсутствующий наблюдатель — no-op.
    fn remove_observer<K: Observing>(&self, observer: &K);

    /// Удаляет записи наблюдателя для одного имени; `None` эквивалентно
    /// [`remove_observer`](Self::remove_observer). Незарегистрированная
    /// пара — no-op.
    fn remove_observer_for_name<K: Observing>(&self, observer: &K, name: Option<&str>);

    /// Публикует имя уведомления на шине. Отправитель и полезная
    /// нагрузка через шину не проходят и молча отбрасываются.
    fn post_notification(&self, notification: &Notification);

    /// Публикует имя на шине (fire-and-forget).
    fn post_notification_name(&self, name: &str);
}
