mod environment;
mod settings;

pub use environment::Environment;
pub use settings::{
    AsrSettings, DEFAULT_CONFIG_FILE, HttpSettings, LoggingSettings, ScaffoldSettings, Settings,
};
