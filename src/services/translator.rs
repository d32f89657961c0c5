use crate::error::TranslateError;
use crate::events::{KeyRecord, KeyState, RawEvent};
use crate::mappings::EvdevToKeyName;

/// Перевести событие в запись о нажатии.
///
/// `None` для отпусканий и для всего, что не является клавишей: это
/// ожидаемое подавление, а не ошибка. Неизвестный код получает имя
/// `"unknown"`. Ошибка только если событие клавиатуры нельзя прочитать.
pub fn translate(event: &RawEvent) -> Result<Option<KeyRecord>, TranslateError> {
    match event {
        RawEvent::Key {
            code,
            state: KeyState::Pressed,
        } => Ok(Some(KeyRecord {
            key_name: EvdevToKeyName::name_or_unknown(*code),
            key_code: *code,
        })),
        RawEvent::Key {
            state: KeyState::Released,
            ..
        } => Ok(None),
        RawEvent::UnreadableKeyboard => Err(TranslateError::Unreadable),
        RawEvent::DeviceAdded { .. } | RawEvent::DeviceRemoved { .. } | RawEvent::Other => {
            Ok(None)
        }
    }
}
