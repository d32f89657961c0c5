use thiserror::Error;

/// Фатальные ошибки захвата. Каждый класс завершает процесс своим кодом.
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("Не удалось инициализировать udev: {0}")]
    DeviceSubsystem(#[source] std::io::Error),

    #[error("Не удалось инициализировать libinput: {0}")]
    EventSubsystem(String),

    #[error("Не удалось назначить seat '{seat}'")]
    SeatAssignment { seat: String },

    #[error("Ошибка dispatch событий libinput: {0}")]
    Dispatch(#[source] std::io::Error),

    #[error("Не удалось записать событие в stdout: {0}")]
    Emission(#[source] std::io::Error),

    #[error("Ошибка конфигурации: {0}")]
    Config(String),
}

impl CaptureError {
    /// Код завершения процесса для данного класса ошибки
    pub fn exit_code(&self) -> u8 {
        match self {
            CaptureError::DeviceSubsystem(_) => 1,
            CaptureError::EventSubsystem(_)
            | CaptureError::Dispatch(_)
            | CaptureError::Emission(_) => 2,
            CaptureError::SeatAssignment { .. } => 3,
            CaptureError::Config(_) => 4,
        }
    }

    /// Подсистема, которую называем в диагностике перед завершением
    pub fn subsystem(&self) -> &'static str {
        match self {
            CaptureError::DeviceSubsystem(_) => "udev",
            CaptureError::EventSubsystem(_) | CaptureError::Dispatch(_) => "libinput",
            CaptureError::SeatAssignment { .. } => "seat",
            CaptureError::Emission(_) => "stdout",
            CaptureError::Config(_) => "config",
        }
    }
}

/// Ошибка разбора отдельного события. Не фатальна: событие пропускается.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TranslateError {
    #[error("Событие клавиатуры без читаемых данных клавиши")]
    Unreadable,
}

pub type Result<T> = std::result::Result<T, CaptureError>;

// Удобные макросы для создания ошибок
#[macro_export]
macro_rules! capture_error {
    (event_subsystem, $($arg:tt)*) => {
        $crate::error::CaptureError::EventSubsystem(format!($($arg)*))
    };
    (config, $($arg:tt)*) => {
        $crate::error::CaptureError::Config(format!($($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_exit_codes_per_class() {
        let io_err = || io::Error::from(io::ErrorKind::Other);

        assert_eq!(CaptureError::DeviceSubsystem(io_err()).exit_code(), 1);
        assert_eq!(CaptureError::EventSubsystem("fd".into()).exit_code(), 2);
        assert_eq!(CaptureError::Dispatch(io_err()).exit_code(), 2);
        assert_eq!(CaptureError::Emission(io_err()).exit_code(), 2);
        assert_eq!(
            CaptureError::SeatAssignment { seat: "seat0".into() }.exit_code(),
            3
        );
        assert_eq!(capture_error!(config, "bad {}", 1).exit_code(), 4);
    }

    #[test]
    fn test_seat_error_names_seat() {
        let err = CaptureError::SeatAssignment { seat: "seat9".into() };
        assert!(err.to_string().contains("seat9"));
        assert_eq!(err.subsystem(), "seat");
    }
}
