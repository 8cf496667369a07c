use std::env;
use std::path::PathBuf;

use postfolio::config::{read_config, Config};
use postfolio::logger::default_log_location;

use crate::CFG_FILE_NAME;

fn get_config_path() -> Option<PathBuf> {
    let exe_dir = env::current_exe().ok()
        .and_then(|exe| exe.parent().map(|p| p.to_path_buf()));
    let candidates = [
        exe_dir,
        env::current_dir().ok(),
        dirs::config_dir(),
    ];

    candidates.into_iter()
        .flatten()
        .map(|dir| dir.join(CFG_FILE_NAME))
        .find(|path| path.exists())
}

/// Where `init-config` writes when no path is given.
pub(crate) fn default_config_path() -> PathBuf {
    env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(CFG_FILE_NAME)
}

pub(crate) fn open_config(cfg_path: Option<PathBuf>) -> Result<Config, String> {
    let config_path = match cfg_path.or_else(get_config_path) {
        Some(path) => path,
        None => return Err("Could not find Postfolio configuration".to_string()),
    };

    println!("Reading config from {}", config_path.display());
    let mut config = read_config(&config_path).map_err(|e| e.to_string())?;

    if let Some(log) = config.log.as_mut() {
        let location = log.location.get_or_insert_with(default_log_location);
        println!("Log enabled. Files will be written in {}", location.display());
    } else {
        println!("Log disabled. Using stdout");
    }

    Ok(config)
}
