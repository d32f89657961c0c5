use input::LibinputInterface;
use std::fs::OpenOptions;
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::OwnedFd;
use std::path::Path;
use tracing::{trace, warn};

/// Политика доступа к узлам устройств.
///
/// Единственная точка, через которую контекст устройств получает файловые
/// дескрипторы. Реализация может добавить проверки прав, песочницу или аудит,
/// не затрагивая цикл обработки событий.
pub trait AccessPolicy {
    /// Открыть узел устройства. При ошибке возвращает отрицательный errno.
    fn open_restricted(&mut self, path: &Path, flags: i32) -> Result<OwnedFd, i32>;

    /// Закрыть дескриптор, ранее выданный `open_restricted`
    fn close_restricted(&mut self, fd: OwnedFd);
}

/// Политика по умолчанию: прямое открытие `/dev/input/event*` с правами процесса
#[derive(Debug, Default, Clone, Copy)]
pub struct DeviceNodePolicy;

impl AccessPolicy for DeviceNodePolicy {
    fn open_restricted(&mut self, path: &Path, flags: i32) -> Result<OwnedFd, i32> {
        let writable = (flags & libc::O_WRONLY != 0) || (flags & libc::O_RDWR != 0);
        let file = OpenOptions::new()
            .read(true)
            .write(writable)
            .custom_flags(flags & !libc::O_WRONLY & !libc::O_RDWR & !libc::O_RDONLY)
            .open(path)
            .map_err(|e| {
                warn!("Не удалось открыть {}: {}", path.display(), e);
                -e.raw_os_error().unwrap_or(libc::ENOENT)
            })?;

        trace!("Открыт узел устройства {}", path.display());
        Ok(OwnedFd::from(file))
    }

    fn close_restricted(&mut self, fd: OwnedFd) {
        drop(fd);
    }
}

/// Адаптер любой `AccessPolicy` к интерфейсу, который ожидает libinput
pub struct PolicyInterface<P>(pub P);

impl<P: AccessPolicy> LibinputInterface for PolicyInterface<P> {
    fn open_restricted(&mut self, path: &Path, flags: i32) -> Result<OwnedFd, i32> {
        self.0.open_restricted(path, flags)
    }

    fn close_restricted(&mut self, fd: OwnedFd) {
        self.0.close_restricted(fd)
    }
}
