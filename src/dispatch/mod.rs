//! Последовательные очереди доставки.
//!
//! [`DispatchQueue`] — лёгкая серийная очередь: задания одной очереди
//! выполняются строго по одному, в порядке постановки. Воркеры всех
//! очередей живут на общем многопоточном Tokio runtime крейта, поэтому
//! постановка задания никогда не блокирует вызывающего.
//!
//! Задания должны быть короткими: долгое задание задерживает всю свою
//! очередь.

use std::sync::Arc;

use once_cell::sync::Lazy;
use tokio::{
    runtime::{Builder, Runtime},
    sync::mpsc,
};

use crate::error::DispatchError;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Общий runtime, на котором крутятся воркеры всех очередей.
static DISPATCH_RT: Lazy<Runtime> = Lazy::new(|| {
    Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("vestnik-dispatch")
        .enable_all()
        .build()
        .expect("failed to build dispatch runtime")
});

/// Главная очередь процесса — очередь доставки по умолчанию.
static MAIN_QUEUE: Lazy<DispatchQueue> = Lazy::new(|| DispatchQueue::new("main"));

/// Именованная серийная очередь заданий.
///
/// Клон очереди разделяет тот же воркер: задания, поставленные через
/// любой клон, выполняются в общем FIFO-порядке.
#[derive(Clone)]
pub struct DispatchQueue {
    label: Arc<str>,
    tx: mpsc::UnboundedSender<Job>,
}

impl DispatchQueue {
    /// Создаёт очередь и запускает её воркер.
    pub fn new(label: &str) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<Job>();
        DISPATCH_RT.spawn(async move {
            while let Some(job) = rx.recv().await {
                job();
            }
        });
        Self {
            label: Arc::from(label),
            tx,
        }
    }

    /// Ставит задание в конец очереди.
    ///
    /// # Возвращает
    /// - `Ok(())` если задание принято
    /// - `Err(DispatchError::QueueClosed)` если воркер очереди уже завершён
    pub fn dispatch<F>(&self, job: F) -> Result<(), DispatchError>
    where
        F: FnOnce() + Send + 'static,
    {
        self.tx
            .send(Box::new(job))
            .map_err(|_| DispatchError::QueueClosed)
    }

    /// Метка очереди (для диагностики).
    pub fn label(&self) -> &str {
        &self.label
    }
}

impl std::fmt::Debug for DispatchQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchQueue")
            .field("label", &self.label)
            .finish()
    }
}

/// Возвращает главную очередь процесса.
pub fn main_queue() -> DispatchQueue {
    MAIN_QUEUE.clone()
}
