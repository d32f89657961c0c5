use evdev::KeyCode;
use std::borrow::Cow;

/// Преобразование evdev кодов в символьные имена клавиш.
///
/// Имена берутся из таблицы `evdev::KeyCode` (идентификаторы
/// `input-event-codes.h`): у `KEY_*` префикс отбрасывается, `BTN_*`
/// остаются целиком.
pub struct EvdevToKeyName;

impl EvdevToKeyName {
    /// Имя для неизвестного кода
    pub const UNKNOWN: &'static str = "unknown";

    /// Получить имя клавиши по evdev коду
    pub fn translate(code: u32) -> Option<String> {
        let code = u16::try_from(code).ok()?;
        // Debug выводит имя константы или "unknown key: N"
        let name = format!("{:?}", KeyCode::new(code));

        if let Some(short) = name.strip_prefix("KEY_") {
            Some(short.to_string())
        } else if name.starts_with("BTN_") {
            Some(name)
        } else {
            None
        }
    }

    /// Имя клавиши или `"unknown"`, если у кода нет имени
    pub fn name_or_unknown(code: u32) -> Cow<'static, str> {
        Self::translate(code).map_or(Cow::Borrowed(Self::UNKNOWN), Cow::Owned)
    }
}
