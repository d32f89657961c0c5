use serde::Serialize;
use std::borrow::Cow;
use std::fmt;

/// Состояние клавиши
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyState {
    Pressed,
    Released,
}

impl From<input::event::keyboard::KeyState> for KeyState {
    fn from(state: input::event::keyboard::KeyState) -> Self {
        match state {
            input::event::keyboard::KeyState::Pressed => KeyState::Pressed,
            input::event::keyboard::KeyState::Released => KeyState::Released,
        }
    }
}

/// Необработанное событие, полученное из контекста устройств.
/// Живёт только до конца обработки в цикле.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawEvent {
    /// Переход клавиши (evdev код + состояние)
    Key { code: u32, state: KeyState },
    /// Событие клавиатуры, из которого не удалось прочитать клавишу
    UnreadableKeyboard,
    DeviceAdded { name: String },
    DeviceRemoved { name: String },
    /// Всё остальное: указатель, тач, планшет и т.д.
    Other,
}

#[cfg(test)]
impl RawEvent {
    pub fn press(code: u32) -> Self {
        RawEvent::Key {
            code,
            state: KeyState::Pressed,
        }
    }

    pub fn release(code: u32) -> Self {
        RawEvent::Key {
            code,
            state: KeyState::Released,
        }
    }
}

impl From<input::event::Event> for RawEvent {
    fn from(event: input::event::Event) -> Self {
        use input::event::keyboard::KeyboardEventTrait;
        use input::event::{DeviceEvent, Event, EventTrait, KeyboardEvent};

        match event {
            Event::Keyboard(KeyboardEvent::Key(key_event)) => RawEvent::Key {
                code: key_event.key(),
                state: key_event.key_state().into(),
            },
            Event::Keyboard(_) => RawEvent::UnreadableKeyboard,
            Event::Device(DeviceEvent::Added(added)) => RawEvent::DeviceAdded {
                name: added.device().name().to_string(),
            },
            Event::Device(DeviceEvent::Removed(removed)) => RawEvent::DeviceRemoved {
                name: removed.device().name().to_string(),
            },
            _ => RawEvent::Other,
        }
    }
}

/// Запись о нажатии клавиши, которая уходит в stdout.
/// Порядок полей входит в формат вывода.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyRecord {
    pub key_name: Cow<'static, str>,
    pub key_code: u32,
}

impl fmt::Display for KeyRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.key_name, self.key_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_press_release_constructors() {
        assert_eq!(
            RawEvent::press(30),
            RawEvent::Key {
                code: 30,
                state: KeyState::Pressed
            }
        );
        assert_eq!(
            RawEvent::release(30),
            RawEvent::Key {
                code: 30,
                state: KeyState::Released
            }
        );
    }

    #[test]
    fn test_key_state_from_libinput() {
        use input::event::keyboard::KeyState as LibinputKeyState;

        assert_eq!(KeyState::from(LibinputKeyState::Pressed), KeyState::Pressed);
        assert_eq!(KeyState::from(LibinputKeyState::Released), KeyState::Released);
    }

    #[test]
    fn test_key_record_display() {
        let record = KeyRecord {
            key_name: "A".into(),
            key_code: 30,
        };
        assert_eq!(record.to_string(), "A(30)");
    }
}
