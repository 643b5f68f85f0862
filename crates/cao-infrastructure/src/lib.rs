pub mod paths;
pub mod storage;
pub mod toml_config_repository;

pub use crate::paths::CaoPaths;
pub use crate::toml_config_repository::TomlConfigRepository;
