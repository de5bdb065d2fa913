use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config directory not found")]
    ConfigDirNotFound,

    #[error(
        "Config file not found. Looked in:\n\
        - ATTACHFLOW_CONFIG_PATH\n\
        - current directory: attachflow.yaml, .attachflow/config.yaml\n\
        - ~/.config/attachflow/config.yaml"
    )]
    ConfigFileNotFound,

    #[error("Invalid config value: {0}")]
    Invalid(String),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
