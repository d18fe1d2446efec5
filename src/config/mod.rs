//! Configuration system
//!
//! - `macros`: the `config_struct!` definition macro
//! - `schemas`: every configuration section with its defaults
//! - `utils`: loading, global access and saving

pub mod macros;
pub mod schemas;
pub mod utils;

pub use schemas::{CacheSettings, Config, RecoveryConfig, RpcConfig, SwapsConfig, WalletConfig};
pub use utils::{
    get_config_clone, load_config, load_config_from_path, read_config_file, save_config,
    with_config, CONFIG_FILE_PATH,
};
