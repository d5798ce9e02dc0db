use std::path::PathBuf;

pub fn get_config_dir() -> PathBuf {
    if let Ok(path) = std::env::var("RAINDUMP_CONFIG_DIR") {
        return PathBuf::from(path);
    }

    if let Ok(path) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(path).join("raindump");
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".config/raindump");
    }

    #[cfg(target_os = "windows")]
    if let Ok(appdata) = std::env::var("APPDATA") {
        return PathBuf::from(appdata).join("raindump");
    }

    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

/// Shorten `text` to at most `max_len` characters, ending in "..." when cut
pub fn truncate(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        let keep = max_len.saturating_sub(3);
        let cut: String = text.chars().take(keep).collect();
        format!("{}...", cut)
    } else {
        text.to_string()
    }
}
