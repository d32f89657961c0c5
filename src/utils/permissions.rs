use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

const INPUT_DIR: &str = "/dev/input";

/// Проверить права доступа к устройствам ввода.
///
/// Только предупреждает: окончательное решение принимает libinput при
/// открытии устройств через политику доступа.
pub fn check_permissions() {
    debug!("Проверка прав доступа...");

    let mut ok = true;

    if let Some(problem) = input_dir_problem(Path::new(INPUT_DIR)) {
        warn!("{}", problem);
        ok = false;
    }

    if !is_root() {
        warn!("Процесс запущен не от root: устройства ввода могут быть недоступны");
        ok = false;
    }

    if ok {
        info!("Доступ к {} подтвержден", INPUT_DIR);
    } else {
        for hint in get_setup_commands() {
            warn!("   {}", hint);
        }
    }
}

/// Описание проблемы с каталогом устройств, если она есть
fn input_dir_problem(dir: &Path) -> Option<String> {
    if !dir.exists() {
        return Some(format!("Директория {} не существует", dir.display()));
    }

    match fs::read_dir(dir) {
        Ok(_) => None,
        Err(e) => Some(format!("Нет доступа к {}: {}", dir.display(), e)),
    }
}

fn is_root() -> bool {
    // SAFETY: geteuid не имеет побочных эффектов и не может завершиться ошибкой
    unsafe { libc::geteuid() == 0 }
}

/// Рекомендуемые команды для настройки прав доступа
pub fn get_setup_commands() -> Vec<String> {
    vec![
        "# Запустить с повышенными правами:".to_string(),
        "sudo keystream".to_string(),
        "# Либо добавить пользователя в группу input и перезайти в систему:".to_string(),
        "sudo usermod -a -G input $USER".to_string(),
    ]
}
