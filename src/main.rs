// main.rs — 程序入口
// 负责初始化异步运行时、解析命令行参数、分发子命令

mod cli; // 声明 cli 模块，对应 src/cli.rs
mod client; // 声明 client 模块，对应 src/client.rs
mod config; // 声明 config 模块，对应 src/config.rs

// 初始化多语言支持，嵌入 locales 目录下的所有翻译
rust_i18n::i18n!("locales");

use clap::{CommandFactory, Parser}; // 引入 Parser trait 的 parse() 方法; CommandFactory 用于生成补全脚本
use clap_complete::generate; // 引入补全脚本生成函数
use cli::{Cli, Commands}; // 引入 CLI 结构体和子命令枚举
use client::{WallazaClient, WallazaError}; // 引入 Wallaza API 客户端
use config::AppConfig; // 引入应用配置
use rust_i18n::t; // 引入翻译宏
use std::path::PathBuf;

/// `#[tokio::main]` 宏将 async main 转换为同步 main + tokio 运行时
#[tokio::main]
async fn main() {
    // 自动检测系统语言并设置
    let locale = std::env::var("LANG").unwrap_or_else(|_| "en".to_string());
    if locale.starts_with("zh") {
        rust_i18n::set_locale("zh-CN");
    } else {
        rust_i18n::set_locale("en");
    }

    if let Err(err) = run().await {
        report_error(&err);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    // 解析命令行参数
    let cli = Cli::parse();

    // 创建应用配置（读取环境变量、配置文件）
    let mut config = AppConfig::new();

    // 确保下载目录存在
    config.ensure_dirs()?;

    // 根据子命令分发执行逻辑
    match &cli.command {
        Commands::List {
            page,
            limit,
            category,
        } => {
            handle_list(&config, *page, *limit, category.as_deref()).await?;
        }

        Commands::Search { query, resolution } => {
            handle_search(&config, query, resolution.as_deref()).await?;
        }

        Commands::Get { id } => {
            handle_get(&config, id).await?;
        }

        Commands::Download { id, output } => {
            handle_download(&config, id, output.as_deref()).await?;
        }

        Commands::Completions { shell } => {
            generate(
                *shell,
                &mut Cli::command(),
                "wallaza",
                &mut std::io::stdout(),
            );
        }

        Commands::Config { action } => {
            handle_config(&mut config, action)?;
        }
    }

    Ok(())
}

/// 错误展示策略（仅展示，客户端本身不做任何恢复）：
/// 401 提示检查 API Key，429 提示稍后再试，其余打印响应体原文
fn report_error(err: &anyhow::Error) {
    if let Some(WallazaError::Status { status, body }) = err.downcast_ref::<WallazaError>() {
        eprintln!("{}", t!("error_api", status => status.as_u16()));
        match status.as_u16() {
            401 => eprintln!("{}", t!("error_check_key")),
            429 => eprintln!("{}", t!("error_rate_limited")),
            _ => eprintln!("{}", body),
        }
    } else {
        eprintln!("{}", t!("error_generic", reason => error_reason(err)));
    }
}

/// 串联 anyhow 错误链作为展示文本，保留 reqwest 等底层错误的原因
fn error_reason(err: &anyhow::Error) -> String {
    format!("{err:#}")
}

/// 构造 API 客户端；未配置 API Key 时报错
fn build_client(config: &AppConfig) -> anyhow::Result<WallazaClient> {
    let api_key = config
        .api_key
        .clone()
        .ok_or_else(|| anyhow::anyhow!("{}", t!("error_missing_key")))?;

    Ok(WallazaClient::with_base_url(api_key, config.base_url.clone()))
}

/// 打印一页壁纸列表
fn print_listing(wallpapers: &[client::Wallpaper]) {
    if wallpapers.is_empty() {
        println!("{}", t!("no_wallpapers"));
        return;
    }

    println!("{}", t!("found_count", count => wallpapers.len()));
    for wallpaper in wallpapers {
        println!(
            "{}",
            t!(
                "wallpaper_item",
                title => wallpaper.title,
                res => wallpaper.resolution,
                id => wallpaper.id
            )
        );
    }
}

/// 处理 list 子命令：分页浏览壁纸
async fn handle_list(
    config: &AppConfig,
    page: Option<u32>,
    limit: Option<u32>,
    category: Option<&str>,
) -> anyhow::Result<()> {
    let client = build_client(config)?;

    println!("{}", t!("list_start"));

    let listing = client
        .list(
            page.unwrap_or(1),
            limit.unwrap_or(config.defaults.limit),
            category.or(config.defaults.category.as_deref()),
        )
        .await?;

    print_listing(&listing.data);
    Ok(())
}

/// 处理 search 子命令：按关键词搜索壁纸
async fn handle_search(
    config: &AppConfig,
    query: &str,
    resolution: Option<&str>,
) -> anyhow::Result<()> {
    let client = build_client(config)?;

    println!("{}", t!("search_start", query => query));

    let listing = client
        .search(query, resolution.or(config.defaults.resolution.as_deref()))
        .await?;

    print_listing(&listing.data);
    Ok(())
}

/// 处理 get 子命令：查询单张壁纸详情
async fn handle_get(config: &AppConfig, id: &str) -> anyhow::Result<()> {
    let client = build_client(config)?;

    let wallpaper = client.get(id).await?;

    println!("{}", t!("detail_id", id => wallpaper.id));
    println!("{}", t!("detail_title", title => wallpaper.title));
    println!("{}", t!("detail_res", res => wallpaper.resolution));
    println!("{}", t!("detail_url", url => wallpaper.url));
    Ok(())
}

/// 处理 download 子命令：下载壁纸原图
async fn handle_download(
    config: &AppConfig,
    id: &str,
    output: Option<&str>,
) -> anyhow::Result<()> {
    let client = build_client(config)?;

    // 未指定输出路径时保存到下载目录，文件名带 wallaza- 前缀
    let save_path = match output {
        Some(path) => PathBuf::from(path),
        None => config.download_dir.join(format!("wallaza-{}.jpg", id)),
    };

    println!("{}", t!("download_start", id => id));

    let saved = client.download(id, &save_path).await?;
    println!("{}", t!("save_path", path => saved.display()));
    Ok(())
}

/// 解析 limit 配置值：必须是正整数，0 与非数字一律拒绝
fn parse_limit(value: &str) -> anyhow::Result<u32> {
    value
        .parse::<u32>()
        .ok()
        .filter(|limit| *limit > 0)
        .ok_or_else(|| anyhow::anyhow!("{}", t!("config_error_invalid_limit", value => value)))
}

/// 处理 config 子命令：查看或修改配置
fn handle_config(config: &mut AppConfig, action: &cli::ConfigAction) -> anyhow::Result<()> {
    match action {
        cli::ConfigAction::Show => {
            println!("{}", t!("config_title"));
            println!(
                "{}",
                t!("config_path", path => config.config_path.display())
            );
            println!(
                "{}",
                t!("config_download_dir", path => config.download_dir.display())
            );
            println!("{}", t!("config_base_url", url => config.base_url));
            println!("{}", t!("config_defaults"));
            println!("{}", t!("config_limit", limit => config.defaults.limit));
            let category = config.defaults.category.as_deref().unwrap_or("None");
            println!("{}", t!("config_category", category => category));
            let resolution = config.defaults.resolution.as_deref().unwrap_or("None");
            println!("{}", t!("config_resolution", res => resolution));
        }
        cli::ConfigAction::Schema => {
            println!("{}", AppConfig::get_schema());
        }
        cli::ConfigAction::Dump => {
            println!("{}", config.to_toml());
        }
        cli::ConfigAction::Set { key, value } => {
            match key.as_str() {
                "limit" => config.defaults.limit = parse_limit(value)?,
                "category" => config.defaults.category = Some(value.clone()),
                "res" | "resolution" => config.defaults.resolution = Some(value.clone()),
                _ => anyhow::bail!("{}", t!("config_error_unknown_key", key => key)),
            }
            config.save()?;
            println!("{}", t!("config_updated", key => key, value => value));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_rejects_zero_and_non_numbers() {
        assert!(parse_limit("0").is_err());
        assert!(parse_limit("-3").is_err());
        assert!(parse_limit("abc").is_err());
        assert_eq!(parse_limit("1").unwrap(), 1);
        assert_eq!(parse_limit("20").unwrap(), 20);
    }

    #[test]
    fn error_reason_keeps_cause_chain() {
        use anyhow::Context;

        let err = anyhow::anyhow!("connection refused")
            .context("error sending request for url (https://api.wallaza.com/v1/wallpapers)");
        let reason = error_reason(&err);

        assert!(reason.contains("error sending request"));
        assert!(reason.contains("connection refused"));
    }
}
