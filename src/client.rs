// client.rs — Wallaza API 异步客户端模块
// 负责与 Wallaza API 交互：列表、搜索、查询单张壁纸和下载图片

use futures_util::StreamExt; // bytes_stream() 返回的流需要 next() 方法
use reqwest::StatusCode;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs::File; // tokio 提供的异步文件操作
use tokio::io::AsyncWriteExt; // 异步写入 trait，提供 write_all() 等方法

/// Wallaza API 默认基础 URL
pub const DEFAULT_BASE_URL: &str = "https://api.wallaza.com/v1";

/// 客户端统一错误类型
///
/// 只有一种业务错误：服务端（API 或图片 CDN）返回非 2xx 状态码，
/// 携带状态码和响应体原文。传输层和文件系统错误透明传递。
#[derive(Error, Debug)]
pub enum WallazaError {
    /// 服务端返回非 2xx 响应，携带状态码与响应体
    #[error("HTTP {status}: {body}")]
    Status { status: StatusCode, body: String },

    /// 请求发送或响应读取阶段的传输错误
    #[error(transparent)]
    Request(#[from] reqwest::Error),

    /// 创建目录或写入文件时的 I/O 错误
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// 单张壁纸的数据结构
///
/// 只提取我们需要的字段，JSON 中多余的字段会被 serde 自动忽略
#[derive(Deserialize, Debug, Clone)]
pub struct Wallpaper {
    /// 壁纸唯一标识符（如 "w1"）
    pub id: String,

    /// 壁纸标题
    pub title: String,

    /// 壁纸分辨率（如 "1920x1080"）
    pub resolution: String,

    /// 壁纸原图的直接下载 URL（可能在 CDN 上，与 API 不同主机）
    pub url: String,
}

/// 列表 / 搜索响应的顶层结构
#[derive(Deserialize, Debug)]
pub struct ListResponse {
    /// 本页结果列表
    pub data: Vec<Wallpaper>,

    /// 分页元数据，服务端未约定具体字段，原样透传给调用方
    #[allow(dead_code)]
    #[serde(flatten)]
    pub meta: serde_json::Map<String, serde_json::Value>,
}

/// Wallaza API 异步客户端
///
/// 封装了 reqwest::Client 和 API 配置。配置在构造后不可变，
/// 每次调用都是独立的一次请求/响应（download 为两次串行请求）。
///
/// # Rust 特性说明
/// - `reqwest::Client` 内部维护连接池，应该复用而非每次请求都创建新的
pub struct WallazaClient {
    /// HTTP 客户端（内部有连接池，应复用）
    client: reqwest::Client,

    /// API 基础 URL
    base_url: String,

    /// API Key，通过 Bearer token 方式认证
    api_key: String,
}

impl WallazaClient {
    /// 创建使用默认基础 URL 的客户端
    #[allow(dead_code)]
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL.to_string())
    }

    /// 创建指定基础 URL 的客户端（配置文件覆盖或测试时使用）
    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            api_key,
        }
    }

    /// 构建 Authorization header 的值
    /// Wallaza 使用标准的 "Bearer <key>" 格式
    fn auth_header(&self) -> String {
        format!("Bearer {}", self.api_key)
    }

    /// 获取壁纸列表
    ///
    /// # 参数
    /// - `page`: 页码，从 1 开始
    /// - `limit`: 每页数量
    /// - `category`: 可选的分类过滤（如 "Nature"），为 None 时不发送该参数
    ///
    /// 参数不做本地范围校验，越界值原样转发，由服务端拒绝并以
    /// [`WallazaError::Status`] 形式返回。
    pub async fn list(
        &self,
        page: u32,
        limit: u32,
        category: Option<&str>,
    ) -> Result<ListResponse, WallazaError> {
        let url = format!("{}/wallpapers", self.base_url);

        let page = page.to_string();
        let limit = limit.to_string();

        let mut params: Vec<(&str, &str)> = vec![("page", &page), ("limit", &limit)];

        if let Some(c) = category {
            params.push(("category", c));
        }

        self.get_json(&url, &params).await
    }

    /// 按关键词搜索壁纸
    ///
    /// # 参数
    /// - `query`: 搜索关键词（必填，长度不做本地限制）
    /// - `resolution`: 可选的分辨率过滤（如 "3840x2160"，格式不做本地校验）
    pub async fn search(
        &self,
        query: &str,
        resolution: Option<&str>,
    ) -> Result<ListResponse, WallazaError> {
        let url = format!("{}/wallpapers/search", self.base_url);

        let mut params: Vec<(&str, &str)> = vec![("query", query)];

        if let Some(r) = resolution {
            params.push(("resolution", r));
        }

        self.get_json(&url, &params).await
    }

    /// 查询单张壁纸的详情
    ///
    /// 404 与其他 4xx 不做区分，调用方如需区分可检查
    /// [`WallazaError::Status`] 中的状态码。
    pub async fn get(&self, wallpaper_id: &str) -> Result<Wallpaper, WallazaError> {
        let url = format!("{}/wallpapers/{}", self.base_url, wallpaper_id);
        self.get_json(&url, &[]).await
    }

    /// 下载壁纸到指定路径
    ///
    /// 复合操作：先调用 [`get`](Self::get) 解析出壁纸记录，再请求其
    /// `url` 字段指向的图片数据。保存前会创建缺失的父目录；
    /// 目标文件已存在时直接覆盖。响应体以流式分块写入，
    /// 不会整体载入内存。
    ///
    /// 任一阶段失败都返回相同的错误类型；下载中途失败时
    /// 不保证清理已写入的部分文件。
    pub async fn download(
        &self,
        wallpaper_id: &str,
        save_path: impl AsRef<Path>,
    ) -> Result<PathBuf, WallazaError> {
        let wallpaper = self.get(wallpaper_id).await?;

        let save_path = save_path.as_ref();

        // 创建缺失的父目录；save_path 只有文件名时 parent 为空串，跳过
        if let Some(parent) = save_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        // 图片 URL 可能指向与 API 不同的主机（CDN），不携带认证 header
        let response = self.client.get(&wallpaper.url).send().await?;
        let response = Self::check_status(response).await?;

        let mut file = File::create(save_path).await?;
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            file.write_all(&chunk?).await?;
        }
        file.flush().await?;

        Ok(save_path.to_path_buf())
    }

    /// 发送带认证 header 的 GET 请求并解析 JSON 响应
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        params: &[(&str, &str)],
    ) -> Result<T, WallazaError> {
        let response = self
            .client
            .get(url)
            .header("Authorization", self.auth_header())
            .header("Content-Type", "application/json")
            .query(params)
            .send()
            .await?;

        let response = Self::check_status(response).await?;

        Ok(response.json().await?)
    }

    /// 非 2xx 响应转为 [`WallazaError::Status`]，读出响应体作为错误信息
    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, WallazaError> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(WallazaError::Status { status, body })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer, key: &str) -> WallazaClient {
        WallazaClient::with_base_url(key.to_string(), server.uri())
    }

    fn sample_listing() -> serde_json::Value {
        json!({
            "data": [{
                "id": "w1",
                "title": "Peak",
                "resolution": "1920x1080",
                "url": "https://cdn/w1.jpg"
            }],
            "page": 1,
            "total": 1
        })
    }

    #[tokio::test]
    async fn list_sends_page_limit_category_and_bearer_token() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/wallpapers"))
            .and(query_param("page", "1"))
            .and(query_param("limit", "5"))
            .and(query_param("category", "Nature"))
            .and(header("Authorization", "Bearer K"))
            .respond_with(ResponseTemplate::new(200).set_body_json(sample_listing()))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, "K");
        let listing = client.list(1, 5, Some("Nature")).await.unwrap();

        assert_eq!(listing.data.len(), 1);
        assert_eq!(listing.data[0].title, "Peak");
        assert_eq!(listing.data[0].resolution, "1920x1080");
    }

    #[tokio::test]
    async fn list_omits_category_when_absent() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/wallpapers"))
            .respond_with(ResponseTemplate::new(200).set_body_json(sample_listing()))
            .mount(&server)
            .await;

        let client = client_for(&server, "K");
        client.list(2, 20, None).await.unwrap();

        let requests = server.received_requests().await.unwrap();
        let query = requests[0].url.query().unwrap_or_default();
        assert!(query.contains("page=2"));
        assert!(query.contains("limit=20"));
        assert!(!query.contains("category"));
    }

    #[tokio::test]
    async fn search_sends_query_and_optional_resolution() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/wallpapers/search"))
            .and(query_param("query", "mountain"))
            .and(query_param("resolution", "3840x2160"))
            .respond_with(ResponseTemplate::new(200).set_body_json(sample_listing()))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, "K");
        client.search("mountain", Some("3840x2160")).await.unwrap();
    }

    #[tokio::test]
    async fn search_omits_resolution_when_absent() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/wallpapers/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(sample_listing()))
            .mount(&server)
            .await;

        let client = client_for(&server, "K");
        client.search("mountain", None).await.unwrap();

        let requests = server.received_requests().await.unwrap();
        let query = requests[0].url.query().unwrap_or_default();
        assert!(query.contains("query=mountain"));
        assert!(!query.contains("resolution"));
    }

    #[tokio::test]
    async fn get_hits_id_path_with_no_query_string() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/wallpapers/abc123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "abc123",
                "title": "Dune",
                "resolution": "2560x1440",
                "url": "https://cdn/abc123.jpg"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, "K");
        let wallpaper = client.get("abc123").await.unwrap();

        assert_eq!(wallpaper.id, "abc123");

        let requests = server.received_requests().await.unwrap();
        assert!(requests[0].url.query().is_none() || requests[0].url.query() == Some(""));
    }

    #[tokio::test]
    async fn non_success_status_carries_code_and_body() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
            .mount(&server)
            .await;

        let client = client_for(&server, "bad-key");
        let err = client.list(1, 20, None).await.unwrap_err();

        match err {
            WallazaError::Status { status, body } => {
                assert_eq!(status, StatusCode::UNAUTHORIZED);
                assert_eq!(body, "invalid api key");
            }
            other => panic!("expected Status error, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn download_creates_parent_dirs_and_writes_exact_bytes() {
        let server = MockServer::start().await;
        let image_bytes: &[u8] = b"\xff\xd8\xff\xe0fake-jpeg-payload";

        Mock::given(method("GET"))
            .and(path("/wallpapers/w1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "w1",
                "title": "Peak",
                "resolution": "1920x1080",
                "url": format!("{}/files/w1.jpg", server.uri())
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/files/w1.jpg"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(image_bytes))
            .mount(&server)
            .await;

        let temp = TempDir::new().unwrap();
        let save_path = temp.path().join("downloads").join("w1.jpg");

        let client = client_for(&server, "K");
        let written = client.download("w1", &save_path).await.unwrap();

        assert_eq!(written, save_path);
        assert!(temp.path().join("downloads").is_dir());
        assert_eq!(tokio::fs::read(&save_path).await.unwrap(), image_bytes);
    }

    #[tokio::test]
    async fn download_overwrites_existing_file() {
        let server = MockServer::start().await;
        let image_bytes: &[u8] = b"new content";

        Mock::given(method("GET"))
            .and(path("/wallpapers/w1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "w1",
                "title": "Peak",
                "resolution": "1920x1080",
                "url": format!("{}/files/w1.jpg", server.uri())
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/files/w1.jpg"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(image_bytes))
            .mount(&server)
            .await;

        let temp = TempDir::new().unwrap();
        let save_path = temp.path().join("w1.jpg");
        tokio::fs::write(&save_path, b"stale bytes from an earlier run")
            .await
            .unwrap();

        let client = client_for(&server, "K");
        client.download("w1", &save_path).await.unwrap();

        assert_eq!(tokio::fs::read(&save_path).await.unwrap(), image_bytes);
    }

    #[tokio::test]
    async fn download_fails_when_binary_fetch_is_not_found() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/wallpapers/w1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "w1",
                "title": "Peak",
                "resolution": "1920x1080",
                "url": format!("{}/files/gone.jpg", server.uri())
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/files/gone.jpg"))
            .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
            .mount(&server)
            .await;

        let temp = TempDir::new().unwrap();
        let save_path = temp.path().join("gone.jpg");

        let client = client_for(&server, "K");
        let err = client.download("w1", &save_path).await.unwrap_err();

        match err {
            WallazaError::Status { status, .. } => {
                assert_eq!(status, StatusCode::NOT_FOUND);
            }
            other => panic!("expected Status error, got: {other:?}"),
        }
    }
}
