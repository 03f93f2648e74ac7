//! Центр уведомлений поверх системной шины.
//!
//! Этот модуль реализует реестр наблюдателей, мультиплексирующий любое
//! число локальных наблюдателей на одну подписку системной шины на имя:
//!
//! - `broker`: реестр наблюдателей и его критическая секция, брокер
//!   по умолчанию, хэндлы блочных регистраций.
//! - `center`: трейт возможностей центра (add/remove/post), общий для
//!   брокера и префиксного декоратора.
//! - `notification`: значение уведомления — имя и отбрасываемая при
//!   публикации полезная нагрузка.
//! - `prefix`: декоратор, прозрачно дополняющий имена фиксированным
//!   префиксом.
//! - `table` (приватный): таблица действий и идентичность наблюдателей.

pub mod broker;
pub mod center;
pub mod notification;
pub mod prefix;
mod table;

pub use broker::*;
pub use center::*;
pub use notification::*;
pub use prefix::*;
pub use table::ObserverId;
