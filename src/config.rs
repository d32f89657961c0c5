use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub capture: CaptureConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CaptureConfig {
    /// Seat, устройства которого слушаем
    pub seat: String,
    /// Пауза между циклами dispatch
    pub idle_interval_ms: u64,
}

/// Значения из командной строки, перекрывающие файл и окружение
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub seat: Option<String>,
    pub log_level: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "compact".to_string(),
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            seat: "seat0".to_string(),
            idle_interval_ms: 1,
        }
    }
}

impl CaptureConfig {
    pub fn idle_interval(&self) -> Duration {
        Duration::from_millis(self.idle_interval_ms)
    }
}

impl Config {
    /// Порядок слоёв: значения по умолчанию, TOML файл (если есть),
    /// переменные `KEYSTREAM_*`, затем аргументы командной строки.
    pub fn load<P: AsRef<Path>>(config_path: P, overrides: &Overrides) -> Result<Self> {
        let config_path = config_path.as_ref();

        let figment = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_path))
            .merge(Env::prefixed("KEYSTREAM_").split("__"));

        let mut config: Config = figment
            .extract()
            .with_context(|| format!("Не удалось загрузить конфигурацию из {:?}", config_path))?;

        config.apply(overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply(&mut self, overrides: &Overrides) {
        if let Some(seat) = &overrides.seat {
            self.capture.seat = seat.clone();
        }
        if let Some(level) = &overrides.log_level {
            self.logging.level = level.clone();
        }
    }

    pub fn validate(&self) -> Result<()> {
        // Валидация настроек логирования
        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" | "off" => {}
            _ => anyhow::bail!("Неверный уровень логирования: {}", self.logging.level),
        }

        match self.logging.format.as_str() {
            "compact" | "json" => {}
            _ => anyhow::bail!("Неверный формат логирования: {}", self.logging.format),
        }

        // Валидация настроек захвата
        if self.capture.seat.trim().is_empty() {
            anyhow::bail!("Имя seat не может быть пустым");
        }

        if self.capture.seat.contains('\0') {
            anyhow::bail!(
                "Имя seat не может содержать нулевой байт: {}",
                self.capture.seat.escape_default()
            );
        }

        if self.capture.idle_interval_ms == 0 {
            anyhow::bail!("idle_interval_ms должно быть больше 0");
        }

        if self.capture.idle_interval_ms > 1000 {
            anyhow::bail!("idle_interval_ms должно быть не больше 1000");
        }

        Ok(())
    }
}
