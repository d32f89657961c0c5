use crate::error::Result;
use crate::events::RawEvent;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, trace};

use super::device_context::EventSource;
use super::emitter::Emitter;
use super::translator::translate;

/// Пауза между циклами dispatch
#[async_trait::async_trait(?Send)]
pub trait Ticker {
    async fn tick(&mut self);
}

/// Пауза через `tokio::time::sleep`
pub struct TokioTicker {
    interval: Duration,
}

impl TokioTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

#[async_trait::async_trait(?Send)]
impl Ticker for TokioTicker {
    async fn tick(&mut self) {
        tokio::time::sleep(self.interval).await;
    }
}

/// Условие остановки цикла, проверяется один раз за цикл
pub trait ShutdownSignal {
    fn requested(&self) -> bool;
}

/// Флаг остановки, который выставляется по SIGINT/SIGTERM
#[derive(Debug, Clone, Default)]
pub struct ShutdownFlag(Arc<AtomicBool>);

impl ShutdownFlag {
    /// Запустить задачу, ожидающую сигналов завершения.
    /// Должно вызываться внутри runtime tokio.
    pub fn install() -> std::io::Result<Self> {
        use tokio::signal::unix::{signal, SignalKind};

        let flag = Self::default();
        let mut interrupt = signal(SignalKind::interrupt())?;
        let mut terminate = signal(SignalKind::terminate())?;

        let handle = flag.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = interrupt.recv() => info!("Получен SIGINT"),
                _ = terminate.recv() => info!("Получен SIGTERM"),
            }
            handle.trigger();
        });

        Ok(flag)
    }

    pub fn trigger(&self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

impl ShutdownSignal for ShutdownFlag {
    fn requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Статистика одного цикла dispatch
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    pub drained: usize,
    pub emitted: usize,
    pub suppressed: usize,
    pub unreadable: usize,
    pub device_changes: usize,
}

/// Один цикл: обновить очередь событий и разобрать её целиком.
///
/// Ошибка разбора отдельного события только учитывается. Ошибка записи
/// делает весь цикл ошибочным, но очередь всё равно дочитывается до конца,
/// чтобы ни одно событие не пережило цикл.
pub fn dispatch_and_drain<S, W>(source: &mut S, emitter: &mut Emitter<W>) -> Result<CycleReport>
where
    S: EventSource + ?Sized,
    W: Write,
{
    source.refresh()?;

    let mut report = CycleReport::default();
    let mut emit_failure = None;

    while let Some(event) = source.next_event() {
        report.drained += 1;

        match &event {
            RawEvent::DeviceAdded { name } => {
                info!("Устройство добавлено: {}", name);
                report.device_changes += 1;
            }
            RawEvent::DeviceRemoved { name } => {
                info!("Устройство удалено: {}", name);
                report.device_changes += 1;
            }
            _ => {}
        }

        match translate(&event) {
            Ok(Some(record)) => {
                if emit_failure.is_some() {
                    continue;
                }
                match emitter.emit(&record) {
                    Ok(()) => {
                        report.emitted += 1;
                        trace!("Нажатие: {}", record);
                    }
                    Err(e) => emit_failure = Some(e),
                }
            }
            Ok(None) => report.suppressed += 1,
            Err(e) => {
                report.unreadable += 1;
                debug!("Событие пропущено: {}", e);
            }
        }
        // событие освобождается здесь
    }

    if let Some(e) = emit_failure {
        return Err(e);
    }

    if report.drained > 0 {
        trace!(?report, "Цикл dispatch завершён");
    }

    Ok(report)
}

/// Крутить циклы dispatch, пока не придёт сигнал остановки или не случится ошибка
pub async fn run<S, W, T, Q>(
    source: &mut S,
    emitter: &mut Emitter<W>,
    ticker: &mut T,
    shutdown: &Q,
) -> Result<()>
where
    S: EventSource + ?Sized,
    W: Write,
    T: Ticker + ?Sized,
    Q: ShutdownSignal + ?Sized,
{
    info!("Цикл обработки событий запущен");

    while !shutdown.requested() {
        if let Err(e) = dispatch_and_drain(source, emitter) {
            error!("Ошибка обработки событий ({}): {}", e.subsystem(), e);
            return Err(e);
        }
        ticker.tick().await;
    }

    info!("Цикл обработки событий остановлен по сигналу");
    Ok(())
}

/// Полная последовательность запуска: контекст, seat, цикл.
///
/// Если контекст не создан, seat не назначается. Если seat не назначен,
/// контекст освобождается до возврата ошибки.
pub async fn capture<S, F, W, T, Q>(
    open: F,
    seat: &str,
    emitter: &mut Emitter<W>,
    ticker: &mut T,
    shutdown: &Q,
) -> Result<()>
where
    S: EventSource,
    F: FnOnce() -> Result<S>,
    W: Write,
    T: Ticker + ?Sized,
    Q: ShutdownSignal + ?Sized,
{
    let mut source = open().map_err(|e| {
        error!("Ошибка инициализации ({}): {}", e.subsystem(), e);
        e
    })?;

    if let Err(e) = source.assign_seat(seat) {
        drop(source);
        error!("{}", e);
        return Err(e);
    }

    let result = run(&mut source, emitter, ticker, shutdown).await;
    drop(source);
    if result.is_ok() {
        info!("Захват клавиш завершён");
    }
    result
}
