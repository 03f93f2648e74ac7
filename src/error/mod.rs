use thiserror::Error;

/// Ошибка постановки задания в очередь доставки.
///
/// Единственный структурно возможный сбой реестра: все остальные
/// вырожденные случаи (отсутствующий наблюдатель, незарегистрированная
/// пара, полезная нагрузка при публикации) по контракту являются no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("dispatch queue is closed")]
    QueueClosed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_error_display() {
        assert_eq!(
            DispatchError::QueueClosed.to_string(),
            "dispatch queue is closed"
        );
    }
}
