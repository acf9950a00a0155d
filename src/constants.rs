pub const APP_NAME: &str = "tidydir";

pub const CONFIG_FILE: &str = "config.toml";
pub const ALLOWLIST_FILE: &str = "allowlist.txt";
pub const LOG_FILE: &str = "tidydir.log";
pub const LOG_ENV: &str = "TIDYDIR_LOG";

pub const DEFAULT_FOLDER_PATTERNS: &[&str] = &[
    "node_modules",
    "__pycache__",
    ".venv",
    "dist",
    "build",
    ".next",
    "target",
    ".git",
];

pub const DEFAULT_FILE_PATTERNS: &[&str] = &[".pyc", ".pyo", ".DS_Store", ".log", ".tmp", ".swp"];

pub const PATTERN_SEPARATOR: char = ',';
