// config.rs — 配置管理模块
// 遵循 Unix 风格：优先从 ~/.config/wallaza/config.toml 读取配置

use schemars::JsonSchema; // 引入用于生成 JSON Schema 的 trait
use serde::{Deserialize, Serialize}; // 引入序列化与反序列化 trait
use shellexpand::tilde; // 用于展开 ~ 和环境变量
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::client;

/// 展开路径中的 ~ 和环境变量 ($HOME, $XDG_CONFIG_HOME 等)
/// 支持格式: ~/path, $HOME/path, ${HOME}/path
fn expand_path(path_str: &str) -> PathBuf {
    let expanded = tilde(path_str).into_owned();
    PathBuf::from(expanded)
}

/// 映射 config.toml 文件内容的嵌套结构体
#[derive(Debug, Deserialize, Serialize, Default, JsonSchema)]
struct ConfigFile {
    #[serde(default)]
    api: ApiConfig,
    #[serde(default)]
    common: CommonConfig,
}

#[derive(Debug, Deserialize, Serialize, Default, JsonSchema)]
struct ApiConfig {
    /// Wallaza API Key（优先级：ENV > TOML，不会被打印或记录）
    key: Option<String>,
    /// API 基础 URL 覆盖，不配置则使用官方默认地址
    #[serde(default)]
    base_url: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Default, JsonSchema)]
struct CommonConfig {
    /// 下载保存根目录 (支持 ~、$HOME 等环境变量，相对路径则相对于 $HOME)
    download_dir: Option<String>,
    /// 默认查询参数
    #[serde(default)]
    defaults: QueryDefaults,
}

/// list / search 的默认查询参数
#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct QueryDefaults {
    /// 每页数量
    #[serde(default = "default_limit")]
    pub limit: u32,
    /// 默认分类过滤（如 "Nature"），不配置则不过滤
    #[serde(default)]
    pub category: Option<String>,
    /// 默认分辨率过滤（如 "3840x2160"），不配置则不过滤
    #[serde(default)]
    pub resolution: Option<String>,
}

impl Default for QueryDefaults {
    fn default() -> Self {
        Self {
            limit: default_limit(),
            category: None,
            resolution: None,
        }
    }
}

fn default_limit() -> u32 {
    20
}

/// 应用全局配置项
///
/// 运行时字段（api_key / base_url / download_dir）是环境变量、配置文件
/// 和内置默认值合并后的结果；file_* 字段原样保留配置文件自身的内容，
/// save / dump 只回写这些，保证环境变量注入的 Key 永远不会落盘。
pub struct AppConfig {
    /// Wallaza API Key (优先级：ENV > TOML)
    pub api_key: Option<String>,
    /// API 基础 URL
    pub base_url: String,
    /// 下载保存根目录
    pub download_dir: PathBuf,
    /// 配置文件所在路径
    pub config_path: PathBuf,
    /// 默认查询参数
    pub defaults: QueryDefaults,

    /// 配置文件自身的 api.key（不含环境变量）
    file_api_key: Option<String>,
    /// 配置文件自身的 api.base_url（未配置则为 None，不回写默认值）
    file_base_url: Option<String>,
    /// 配置文件自身的 common.download_dir 原文（未展开）
    file_download_dir: Option<String>,
}

impl AppConfig {
    /// 初始化配置
    pub fn new() -> Self {
        let home = env::var("HOME").unwrap_or_else(|_| ".".to_string());
        let home_path = PathBuf::from(&home);
        let config_dir = home_path.join(".config").join("wallaza");
        let config_path = config_dir.join("config.toml");

        let config_file = Self::load_config_from_file(&config_path).unwrap_or_default();
        let env_key = env::var("WALLAZA_API_KEY").ok();

        Self::from_parts(config_file, env_key, home_path, config_path)
    }

    /// 由配置文件内容和环境变量组装配置（测试也从这里注入）
    fn from_parts(
        config_file: ConfigFile,
        env_key: Option<String>,
        home_path: PathBuf,
        config_path: PathBuf,
    ) -> Self {
        let file_api_key = config_file.api.key;
        let file_base_url = config_file.api.base_url;
        let file_download_dir = config_file.common.download_dir;

        // 优先级：环境变量 > 配置文件内容
        let api_key = env_key.or_else(|| file_api_key.clone());

        let base_url = file_base_url
            .clone()
            .unwrap_or_else(|| client::DEFAULT_BASE_URL.to_string());

        // 下载目录：
        // 1. 如果配置了路径：展开 ~ 和环境变量，相对路径则相对于 $HOME
        // 2. 如果未配置：默认使用 $HOME/Pictures/wallaza
        let download_dir = if let Some(dir_str) = &file_download_dir {
            let p = expand_path(dir_str);
            if p.is_absolute() { p } else { home_path.join(p) }
        } else {
            home_path.join("Pictures").join("wallaza")
        };

        Self {
            api_key,
            base_url,
            download_dir,
            config_path,
            defaults: config_file.common.defaults,
            file_api_key,
            file_base_url,
            file_download_dir,
        }
    }

    /// 辅助函数：解析 TOML 配置文件
    fn load_config_from_file(path: &Path) -> Option<ConfigFile> {
        fs::read_to_string(path)
            .ok()
            .and_then(|content| toml::from_str(&content).ok())
    }

    /// 确保所有必要的目录都存在
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::create_dir_all(&self.download_dir)
    }

    /// 将当前配置映射回文件结构
    ///
    /// api.key / api.base_url / common.download_dir 回写配置文件的原值，
    /// 而非合并后的运行时值：环境变量提供的 Key 不落盘，
    /// 用户没写过的项也不会被默认值填充。
    fn to_file(&self) -> ConfigFile {
        ConfigFile {
            api: ApiConfig {
                key: self.file_api_key.clone(),
                base_url: self.file_base_url.clone(),
            },
            common: CommonConfig {
                download_dir: self.file_download_dir.clone(),
                defaults: QueryDefaults {
                    limit: self.defaults.limit,
                    category: self.defaults.category.clone(),
                    resolution: self.defaults.resolution.clone(),
                },
            },
        }
    }

    /// 将配置保存回文件
    pub fn save(&self) -> std::io::Result<()> {
        let toml_str = toml::to_string_pretty(&self.to_file())
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        fs::write(&self.config_path, toml_str)
    }

    /// 获取配置文件的 JSON Schema
    pub fn get_schema() -> String {
        let schema = schemars::schema_for!(ConfigFile);
        serde_json::to_string_pretty(&schema).unwrap_or_else(|_| "{}".to_string())
    }

    /// 将当前配置转换为 TOML 字符串
    pub fn to_toml(&self) -> String {
        let toml_str = toml::to_string_pretty(&self.to_file())
            .unwrap_or_else(|_| "# Error serializing config".to_string());

        // toml 库不支持带注释序列化，手动在 [api] 节前插入说明
        toml_str.replace(
            "[api]",
            "# API 访问配置\n# key 也可通过环境变量 WALLAZA_API_KEY 提供（环境变量优先）\n[api]",
        )
    }
}
