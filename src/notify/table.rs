use std::{collections::HashMap, sync::Arc};

use crate::{bus::BusToken, dispatch::DispatchQueue};

use super::Notification;

/// Идентичность наблюдателя.
///
/// Выводится из адреса `Arc`-аллокации наблюдателя или хэндла, поэтому
/// действует, пока жив хотя бы один `Arc`-клон. Переиспользование адреса
/// после смерти наблюдателя — принятая условность, как и идентичность
/// объектов в оригинальной модели.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(usize);

impl ObserverId {
    pub(crate) fn of_arc<T>(arc: &Arc<T>) -> Self {
        ObserverId(Arc::as_ptr(arc) as usize)
    }
}

/// Готовое к доставке действие наблюдателя.
pub(crate) type Action = Arc<dyn Fn(&Notification) + Send + Sync>;

/// Одно зарегистрированное действие: что выполнять и на какой очереди.
pub(crate) struct RegisteredAction {
    pub queue: DispatchQueue,
    pub action: Action,
}

/// Упорядоченный список действий одной пары (имя, наблюдатель).
/// Порядок вставки — порядок доставки.
pub(crate) struct ActionEntry {
    actions: Vec<RegisteredAction>,
}

impl ActionEntry {
    fn new(first: RegisteredAction) -> Self {
        Self {
            actions: vec![first],
        }
    }

    fn push(&mut self, action: RegisteredAction) {
        self.actions.push(action);
    }
}

/// Строка таблицы для одного имени: токен единственной подписки на шине
/// и наблюдатели в порядке первой регистрации.
struct NameRow {
    token: BusToken,
    entries: Vec<(ObserverId, ActionEntry)>,
}

/// Таблица действий: имя → наблюдатели → действия.
///
/// Инварианты (поддерживаются вызывающим под одним замком):
/// - строка имени существует тогда и только тогда, когда у имени есть
///   хотя бы один наблюдатель с хотя бы одним действием — и ровно тогда
///   брокер держит подписку на шине (токен живёт в строке);
/// - наблюдатель числится под именем тогда и только тогда, когда у него
///   есть хотя бы одно действие для этого имени.
pub(crate) struct ActionTable {
    rows: HashMap<Arc<str>, NameRow>,
}

impl ActionTable {
    pub fn new() -> Self {
        Self {
            rows: HashMap::new(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.rows.contains_key(name)
    }

    /// Заводит строку имени с токеном свежей подписки на шине.
    pub fn insert_row(&mut self, name: Arc<str>, token: BusToken) {
        self.rows.insert(
            name,
            NameRow {
                token,
                entries: Vec::new(),
            },
        );
    }

    /// Дописывает действие паре (имя, наблюдатель). Повторная регистрация
    /// той же пары аддитивна. Строка имени должна уже существовать.
    pub fn push_action(&mut self, name: &str, id: ObserverId, action: RegisteredAction) {
        let Some(row) = self.rows.get_mut(name) else {
            return;
        };
        match row.entries.iter_mut().find(|(oid, _)| *oid == id) {
            Some((_, entry)) => entry.push(action),
            None => row.entries.push((id, ActionEntry::new(action))),
        }
    }

    /// Снимок действий имени в порядке доставки: наблюдатели — в порядке
    /// первой регистрации, действия наблюдателя — в порядке добавления.
    pub fn snapshot(&self, name: &str) -> Vec<(DispatchQueue, Action)> {
        let Some(row) = self.rows.get(name) else {
            return Vec::new();
        };
        row.entries
            .iter()
            .flat_map(|(_, entry)| entry.actions.iter())
            .map(|reg| (reg.queue.clone(), reg.action.clone()))
            .collect()
    }

    /// Удаляет наблюдателя из всех строк. Возвращает имена, оставшиеся
    /// без наблюдателей, вместе с их токенами — по ним вызывающий снимает
    /// подписки на шине.
    pub fn remove_observer(&mut self, id: ObserverId) -> Vec<(Arc<str>, BusToken)> {
        let mut emptied = Vec::new();
        self.rows.retain(|name, row| {
            row.entries.retain(|(oid, _)| *oid != id);
            if row.entries.is_empty() {
                emptied.push((name.clone(), row.token));
                false
            } else {
                true
            }
        });
        emptied
    }

    /// Удаляет пару (имя, наблюдатель). Незарегистрированная пара — no-op.
    /// Возвращает `(имя, токен)`, если строка имени опустела.
    pub fn remove_pair(&mut self, name: &str, id: ObserverId) -> Option<(Arc<str>, BusToken)> {
        let row = self.rows.get_mut(name)?;
        let before = row.entries.len();
        row.entries.retain(|(oid, _)| *oid != id);
        if row.entries.len() == before {
            return None;
        }
        if row.entries.is_empty() {
            return self.rows.remove_entry(name).map(|(n, r)| (n, r.token));
        }
        None
    }

    /// Числится ли наблюдатель хотя бы под одним именем.
    pub fn observer_registered(&self, id: ObserverId) -> bool {
        self.rows
            .values()
            .any(|row| row.entries.iter().any(|(oid, _)| *oid == id))
    }

    /// Количество наблюдателей имени.
    pub fn observer_count(&self, name: &str) -> usize {
        self.rows.get(name).map_or(0, |row| row.entries.len())
    }

    /// Все строки таблицы с токенами — для снятия подписок при
    /// разрушении брокера.
    pub fn drain_rows(&mut self) -> Vec<(Arc<str>, BusToken)> {
        self.rows
            .drain()
            .map(|(name, row)| (name, row.token))
            .collect()
    }
}
