// cli.rs — 命令行接口定义模块
// 使用 clap 的 derive 模式定义所有子命令和参数

use clap::{Parser, Subcommand}; // Parser: 解析命令行参数的 trait; Subcommand: 定义子命令的 trait
use clap_complete::Shell; // Shell 枚举：Bash, Zsh, Fish, Elvish, PowerShell

/// Wallaza 壁纸 API 命令行客户端
///
/// 浏览、搜索 Wallaza 上的壁纸，并下载原图到本地。
/// API Key 通过环境变量 WALLAZA_API_KEY 或配置文件提供。
#[derive(Parser)]
#[command(name = "wallaza")]
#[command(version)] // 自动从 Cargo.toml 读取 version 字段
#[command(about = "Wallaza 壁纸 API 客户端 — 列表、搜索、查询与下载壁纸")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 分页浏览壁纸列表
    ///
    /// 用法示例:
    ///   wallaza list
    ///   wallaza list --page 2 --limit 10
    ///   wallaza list -c Nature -l 5
    List {
        /// 页码（从 1 开始）
        #[arg(short, long)]
        page: Option<u32>,

        /// 每页数量
        #[arg(short, long)]
        limit: Option<u32>,

        /// 分类过滤（如 "Nature", "Abstract"）
        #[arg(short, long)]
        category: Option<String>,
    },

    /// 按关键词搜索壁纸
    ///
    /// 用法示例:
    ///   wallaza search mountain
    ///   wallaza search "night city" --resolution 3840x2160
    Search {
        /// 搜索关键词
        query: String,

        /// 分辨率过滤（格式 "宽x高"，如 "1920x1080"）
        #[arg(short, long)]
        resolution: Option<String>,
    },

    /// 查询单张壁纸的详情
    ///
    /// 用法示例:
    ///   wallaza get w1
    Get {
        /// 壁纸 ID
        id: String,
    },

    /// 下载壁纸原图到本地
    ///
    /// 用法示例:
    ///   wallaza download w1
    ///   wallaza download w1 --output downloads/peak.jpg
    Download {
        /// 壁纸 ID
        id: String,

        /// 保存路径（不指定则保存到下载目录，文件名为 wallaza-<id>.jpg）
        #[arg(short, long)]
        output: Option<String>,
    },

    /// 生成 shell 补全脚本（支持 bash, zsh, fish, elvish, powershell）
    ///
    /// 用法示例：
    ///   wallaza completions zsh > ~/.zsh/completions/_wallaza
    ///   wallaza completions fish > ~/.config/fish/completions/wallaza.fish
    Completions {
        /// 目标 shell 类型
        shell: Shell,
    },

    /// 配置管理操作
    ///
    /// 用法示例:
    ///   wallaza config show
    ///   wallaza config dump
    ///   wallaza config set category "Nature"
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// 配置管理操作
#[derive(Subcommand)]
pub enum ConfigAction {
    /// 查看当前所有配置简报（不含 API Key）
    Show,
    /// 生成配置文件对应的 JSON Schema
    Schema,
    /// 以 TOML 格式打印当前完整配置内容
    Dump,
    /// 设置配置项的值 (支持: limit, category, resolution)
    Set {
        /// 要设置的键 (limit, category, res)
        key: String,
        /// 要设置的值
        value: String,
    },
}
