//! Абстракция системной шины уведомлений.
//!
//! Шина переносит через границу процесса ровно одну единицу информации —
//! имя уведомления. Ни полезной нагрузки, ни гарантий доставки, ни порядка
//! между процессами у шины нет.
//!
//! - `system`: трейт [`SystemBus`], токен подписки и тип колбэка доставки.
//! - `local`: [`LocalBus`] — внутрипроцессная эталонная реализация,
//!   используемая по умолчанию и в тестах.

pub mod local;
pub mod system;

pub use local::*;
pub use system::*;
