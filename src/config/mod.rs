//! 配置管理模块
//!
//! 提供配置文件解析、验证以及与命令行参数的合并

pub mod loader;
pub mod types;

// 重新导出主要类型
pub use loader::{locate_config, ConfigLoader, TomlConfigLoader};
pub use types::{
    default_config_path, parse_duration, validate_file_config, validate_settings, FileConfig,
    Settings,
};
