use anyhow::Result;
use clap::error::{ContextKind, ContextValue, ErrorKind};
use clap::{ArgAction, CommandFactory, Parser};
use std::ffi::OsString;
use std::process::ExitCode;
use tracing::{error, info};
mod config;
mod error;
mod events;
mod mappings;
mod services;
mod utils;

use config::{Config, LoggingConfig, Overrides};
use error::CaptureError;
use services::{DeviceNodePolicy, Emitter, SeatContext, ShutdownFlag, TokioTicker};

/// Сообщить об ошибке настройки до запуска логирования и получить код завершения
fn config_failure(message: String) -> ExitCode {
    let err = capture_error!(config, "{}", message);
    eprintln!("keystream: {}", err);
    ExitCode::from(err.exit_code())
}

#[derive(Parser, Debug)]
#[command(name = "keystream", version)]
#[command(about = "Бэкенд захвата клавиатуры: пишет каждое нажатие в stdout одной строкой JSON")]
#[command(after_help = "Внимание: это бэкенд, он не предназначен для ручного запуска. \
Запускайте фронтенд, который сам запустит этот процесс.")]
#[command(disable_version_flag = true)]
struct Args {
    /// Путь к файлу конфигурации
    #[arg(short, long, default_value = "keystream.toml")]
    config: String,

    /// Seat, устройства которого слушаем
    #[arg(short, long)]
    seat: Option<String>,

    /// Уровень логирования (stderr)
    #[arg(long)]
    log_level: Option<String>,

    /// Показать версию и выйти
    #[arg(short = 'v', long, action = ArgAction::Version)]
    version: Option<bool>,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            seat: self.seat.clone(),
            log_level: self.log_level.clone(),
        }
    }
}

/// Разобрать аргументы, выбрасывая неизвестные опции.
/// Список проигнорированных опций возвращается и при ошибке разбора,
/// чтобы диагностика не терялась перед выводом справки или версии.
fn parse_args<I, T>(argv: I) -> (std::result::Result<Args, clap::Error>, Vec<String>)
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut argv: Vec<OsString> = argv.into_iter().map(Into::into).collect();
    let mut ignored = Vec::new();

    loop {
        let err = match Args::try_parse_from(&argv) {
            Ok(args) => return (Ok(args), ignored),
            Err(err) if err.kind() == ErrorKind::UnknownArgument => err,
            Err(err) => return (Err(err), ignored),
        };

        let bad = match err.get(ContextKind::InvalidArg) {
            Some(ContextValue::String(bad)) => bad.clone(),
            _ => return (Err(err), ignored),
        };

        if !remove_option(&mut argv, &bad) {
            return (Err(err), ignored);
        }
        ignored.push(bad);
    }
}

/// Убрать из argv первое вхождение опции `bad`.
///
/// Длинная опция удаляется целиком (`--bogus`, `--bogus=1`). Короткая
/// может стоять в связке (`-xh`): удаляется только её символ, остальные
/// флаги связки сохраняются.
fn remove_option(argv: &mut Vec<OsString>, bad: &str) -> bool {
    let mut short = bad.strip_prefix('-').unwrap_or(bad).chars();
    let short_flag = match (bad.starts_with("--"), short.next(), short.next()) {
        (false, Some(flag), None) => Some(flag),
        _ => None,
    };

    // Короткие опции со значением: после них остаток связки уже значение
    let takes_value: Vec<char> = Args::command()
        .get_arguments()
        .filter(|arg| arg.get_action().takes_values())
        .filter_map(|arg| arg.get_short())
        .collect();

    for index in 1..argv.len() {
        let Some(text) = argv[index].to_str() else {
            continue;
        };
        if text == "--" {
            break;
        }

        let Some(flag) = short_flag else {
            if text == bad || text.strip_prefix(bad).is_some_and(|rest| rest.starts_with('=')) {
                argv.remove(index);
                return true;
            }
            continue;
        };

        let Some(cluster) = text.strip_prefix('-').filter(|c| !c.starts_with('-')) else {
            continue;
        };
        let flags = cluster
            .find(|c: char| takes_value.contains(&c))
            .map_or(cluster, |end| &cluster[..end]);

        if let Some(position) = flags.find(flag) {
            let mut rest = cluster.to_string();
            rest.remove(position);
            if rest.is_empty() {
                argv.remove(index);
            } else {
                argv[index] = format!("-{}", rest).into();
            }
            return true;
        }
    }

    false
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let (parsed, ignored) = parse_args(std::env::args_os());

    for option in &ignored {
        eprintln!("keystream: неизвестная опция `{}`, игнорируется", option);
    }

    let args = match parsed {
        Ok(args) => args,
        Err(err) => {
            return match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => match err.print() {
                    Ok(()) => ExitCode::SUCCESS,
                    Err(e) => {
                        let err = CaptureError::Emission(e);
                        eprintln!("keystream: {}", err);
                        ExitCode::from(err.exit_code())
                    }
                },
                _ => config_failure(err.render().to_string().trim_end().to_string()),
            };
        }
    };

    // Загрузка конфигурации
    let config = match Config::load(&args.config, &args.overrides()) {
        Ok(config) => config,
        Err(e) => return config_failure(format!("{:#}", e)),
    };

    // Инициализация системы логирования
    if let Err(e) = init_tracing(&config.logging) {
        return config_failure(format!("не удалось настроить логирование: {:#}", e));
    }

    info!("Запуск keystream v{}", env!("CARGO_PKG_VERSION"));

    // Проверка прав доступа
    utils::permissions::check_permissions();

    let shutdown = match ShutdownFlag::install() {
        Ok(flag) => flag,
        Err(e) => {
            error!("Не удалось установить обработчик сигналов: {}", e);
            return ExitCode::from(2);
        }
    };

    let mut emitter = Emitter::new(std::io::stdout().lock());
    let mut ticker = TokioTicker::new(config.capture.idle_interval());

    let result = services::capture(
        || SeatContext::create(DeviceNodePolicy),
        &config.capture.seat,
        &mut emitter,
        &mut ticker,
        &shutdown,
    )
    .await;

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => ExitCode::from(e.exit_code()),
    }
}

fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))?;

    // stdout занят данными, логи только в stderr
    let json = (logging.format == "json").then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
    });
    let compact = (logging.format != "json").then(|| {
        tracing_subscriber::fmt::layer()
            .compact()
            .with_writer(std::io::stderr)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(json)
        .with(compact)
        .try_init()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(argv: &[&str]) -> (Args, Vec<String>) {
        let (parsed, ignored) = parse_args(argv.iter().copied());
        (parsed.unwrap(), ignored)
    }

    fn parse_err(argv: &[&str]) -> (clap::Error, Vec<String>) {
        let (parsed, ignored) = parse_args(argv.iter().copied());
        (parsed.unwrap_err(), ignored)
    }

    #[test]
    fn test_version_flag() {
        for flag in ["-v", "--version"] {
            let (err, _) = parse_err(&["keystream", flag]);
            assert_eq!(err.kind(), ErrorKind::DisplayVersion);

            let rendered = err.render().to_string();
            assert_eq!(rendered.trim_end().lines().count(), 1);
            assert!(rendered.contains(env!("CARGO_PKG_VERSION")));
        }
    }

    #[test]
    fn test_help_flag() {
        for flag in ["-h", "--help"] {
            let (err, _) = parse_err(&["keystream", flag]);
            assert_eq!(err.kind(), ErrorKind::DisplayHelp);
        }
    }

    #[test]
    fn test_defaults() {
        let (args, ignored) = parse_ok(&["keystream"]);
        assert_eq!(args.config, "keystream.toml");
        assert!(args.seat.is_none());
        assert!(args.log_level.is_none());
        assert!(ignored.is_empty());
    }

    #[test]
    fn test_unknown_options_are_ignored() {
        let (args, ignored) = parse_ok(&["keystream", "--bogus", "-s", "seat1", "-x"]);

        assert_eq!(args.seat.as_deref(), Some("seat1"));
        assert_eq!(ignored, vec!["--bogus".to_string(), "-x".to_string()]);
    }

    #[test]
    fn test_unknown_long_option_with_value() {
        let (args, ignored) = parse_ok(&["keystream", "--bogus=1", "--seat", "seat4"]);

        assert_eq!(args.seat.as_deref(), Some("seat4"));
        assert_eq!(ignored.len(), 1);
        assert!(ignored[0].starts_with("--bogus"));
    }

    #[test]
    fn test_version_after_unknown_option() {
        let (err, ignored) = parse_err(&["keystream", "--bogus", "--version"]);
        assert_eq!(err.kind(), ErrorKind::DisplayVersion);
        assert_eq!(ignored, vec!["--bogus".to_string()]);
    }

    #[test]
    fn test_unknown_flag_in_short_cluster() {
        let (err, ignored) = parse_err(&["keystream", "-xh"]);
        assert_eq!(err.kind(), ErrorKind::DisplayHelp);
        assert_eq!(ignored, vec!["-x".to_string()]);

        let (err, ignored) = parse_err(&["keystream", "-xv"]);
        assert_eq!(err.kind(), ErrorKind::DisplayVersion);
        assert_eq!(ignored, vec!["-x".to_string()]);
    }

    #[test]
    fn test_short_cluster_keeps_value_option() {
        let (args, ignored) = parse_ok(&["keystream", "-xs", "seat1"]);
        assert_eq!(args.seat.as_deref(), Some("seat1"));
        assert_eq!(ignored, vec!["-x".to_string()]);

        let (args, ignored) = parse_ok(&["keystream", "-xqs", "seat5"]);
        assert_eq!(args.seat.as_deref(), Some("seat5"));
        assert_eq!(ignored.len(), 2);
    }

    #[test]
    fn test_overrides_from_args() {
        let (args, _) = parse_ok(&["keystream", "--seat", "seat2", "--log-level", "debug"]);
        let overrides = args.overrides();

        assert_eq!(overrides.seat.as_deref(), Some("seat2"));
        assert_eq!(overrides.log_level.as_deref(), Some("debug"));
    }
}
