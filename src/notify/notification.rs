use std::sync::Arc;

use bytes::Bytes;

/// Значение уведомления.
///
/// Через шину проходит только имя: полезная нагрузка, приложенная к
/// публикуемому уведомлению, молча отбрасывается, а доставленные
/// уведомления всегда приходят с `payload() == None`.
#[derive(Debug, Clone)]
pub struct Notification {
    name: Arc<str>,
    payload: Option<Bytes>,
}

impl Notification {
    /// Создаёт уведомление с именем `name`.
    pub fn new(name: impl AsRef<str>) -> Self {
        Self {
            name: Arc::from(name.as_ref()),
            payload: None,
        }
    }

    /// Создаёт уведомление с полезной нагрузкой.
    ///
    /// Нагрузка живёт только внутри процесса отправителя: шина её
    /// не переносит.
    pub fn with_payload(name: impl AsRef<str>, payload: Bytes) -> Self {
        Self {
            name: Arc::from(name.as_ref()),
            payload: Some(payload),
        }
    }

    /// Свежее уведомление для доставки наблюдателям: только имя.
    pub(crate) fn delivered(name: Arc<str>) -> Self {
        Self {
            name,
            payload: None,
        }
    }

    /// Имя уведомления.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Полезная нагрузка, если была приложена при создании.
    pub fn payload(&self) -> Option<&Bytes> {
        self.payload.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Тест проверяет создание уведомления по имени.
    #[test]
    fn test_notification_name() {
        let note = Notification::new("com.app.Foo");
        assert_eq!(note.name(), "com.app.Foo");
        assert!(note.payload().is_none());
    }

    /// Тест проверяет, что приложенная нагрузка доступна локально.
    #[test]
    fn test_notification_payload_is_local() {
        let note = Notification::with_payload("com.app.Bar", Bytes::from_static(b"x"));
        assert_eq!(note.payload(), Some(&Bytes::from_static(b"x")));
    }

    /// Тест проверяет, что доставленное уведомление не несёт нагрузки.
    #[test]
    fn test_delivered_notification_has_no_payload() {
        let note = Notification::delivered(Arc::from("com.app.Baz"));
        assert_eq!(note.name(), "com.app.Baz");
        assert!(note.payload().is_none());
    }
}
