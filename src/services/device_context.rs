use crate::capture_error;
use crate::error::{CaptureError, Result};
use crate::events::RawEvent;
use input::{AsRaw, Libinput};
use std::os::unix::io::{AsRawFd, RawFd};
use tracing::{debug, info};

use super::access_policy::{AccessPolicy, PolicyInterface};

/// Источник необработанных событий для цикла dispatch
pub trait EventSource {
    /// Назначить seat, устройства которого будут перечислены
    fn assign_seat(&mut self, seat: &str) -> Result<()>;

    /// Забрать накопившиеся события у ОС во внутреннюю очередь (без блокировки)
    fn refresh(&mut self) -> Result<()>;

    /// Следующее событие из очереди, `None` когда очередь пуста
    fn next_event(&mut self) -> Option<RawEvent>;
}

/// Контекст устройств одного seat на базе udev + libinput.
///
/// Единственный владелец дескрипторов устройств: они открываются и
/// закрываются только через политику доступа внутри libinput.
pub struct SeatContext {
    input: Libinput,
    seat: Option<String>,
}

impl SeatContext {
    pub fn create<P: AccessPolicy + 'static>(policy: P) -> Result<Self> {
        // Только проверка доступности udev: libinput создаёт свой экземпляр
        udev::Udev::new().map_err(CaptureError::DeviceSubsystem)?;
        debug!("udev инициализирован");

        let input = Libinput::new_with_udev(PolicyInterface(policy));
        if input.as_raw().is_null() {
            // Drop для пустого контекста вызвал бы libinput_unref(NULL)
            std::mem::forget(input);
            return Err(context_failure(None));
        }

        let fd = input.as_raw_fd();
        if fd < 0 {
            return Err(context_failure(Some(fd)));
        }
        debug!("Контекст libinput создан (fd={})", fd);

        Ok(Self { input, seat: None })
    }
}

/// Ошибка создания контекста libinput: пустой контекст или некорректный fd
fn context_failure(fd: Option<RawFd>) -> CaptureError {
    match fd {
        None => capture_error!(event_subsystem, "libinput_udev_create_context вернул NULL"),
        Some(fd) => capture_error!(event_subsystem, "контекст libinput вернул некорректный fd {}", fd),
    }
}

impl EventSource for SeatContext {
    fn assign_seat(&mut self, seat: &str) -> Result<()> {
        // libinput не принимает имя с нулевым байтом
        if seat.contains('\0') {
            return Err(CaptureError::SeatAssignment {
                seat: seat.escape_default().to_string(),
            });
        }

        self.input
            .udev_assign_seat(seat)
            .map_err(|()| CaptureError::SeatAssignment {
                seat: seat.to_string(),
            })?;

        info!("libinput инициализирован, назначен {}", seat);
        self.seat = Some(seat.to_string());
        Ok(())
    }

    fn refresh(&mut self) -> Result<()> {
        self.input.dispatch().map_err(CaptureError::Dispatch)
    }

    fn next_event(&mut self) -> Option<RawEvent> {
        self.input.next().map(RawEvent::from)
    }
}

impl Drop for SeatContext {
    fn drop(&mut self) {
        debug!(
            "Освобождение контекста устройств (seat: {})",
            self.seat.as_deref().unwrap_or("не назначен")
        );
    }
}
