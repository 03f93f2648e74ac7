use std::sync::Arc;

/// Токен активной подписки на шине.
///
/// Возвращается из [`SystemBus::subscribe`] и предъявляется обратно
/// в [`SystemBus::unsubscribe`] вместе с именем.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BusToken(pub(crate) u64);

/// Колбэк доставки события шины.
///
/// Вызывается в потоке, которым управляет шина; получает только имя.
pub type BusCallback = Arc<dyn Fn(&str) + Send + Sync>;

/// Системная шина публикации/подписки «только имя».
///
/// Контракт:
/// - `publish` — fire-and-forget: ни ожидания удалённой доставки,
///   ни видимости её результата;
/// - доставка может произойти синхронно в потоке публикующего;
/// - `subscribe` не должен вызывать `deliver` до своего возврата
///   (вызывающий может держать собственный замок).
pub trait SystemBus: Send + Sync + 'static {
    /// Регистрирует получателя событий с именем `name`.
    fn subscribe(&self, name: &str, deliver: BusCallback) -> BusToken;

    /// Снимает подписку `token` с имени `name`. Неизвестный токен — no-op.
    fn unsubscribe(&self, token: BusToken, name: &str);

    /// Публикует имя всем подписчикам шины.
    fn publish(&self, name: &str);
}
