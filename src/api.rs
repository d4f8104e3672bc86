use futures::StreamExt;
use indicatif::ProgressBar;
use log::{debug, error, info, warn};
use reqwest::header::CONTENT_DISPOSITION;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, RequestBuilder, Response, StatusCode};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;
use url::Url;

use crate::config::Config;
use crate::constants::{
    AUTH_PATH, BASIC_STATS_PATH, DELETE_PATH, DOWNLOAD_PATH, FILES_PATH, FILE_STATS_PATH,
    UPLOAD_FIELD, UPLOAD_PATH,
};
use crate::error::{ClientError, Result};
use crate::token::TokenManager;
use crate::types::{BasicStats, FileList, StatsSnapshot, UploadResponse};
use crate::util::{filename_from_disposition, sanitize_filename};

/// FileShare 服务端接口
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
    tokens: Option<Arc<TokenManager>>,
}

impl ApiClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()?;

        let tokens = if config.username.is_some() || config.access_token.is_some() {
            let auth_url = config.server_url.join(AUTH_PATH)?;
            Some(Arc::new(TokenManager::new(
                client.clone(),
                auth_url,
                config.username.clone(),
                config.access_token.clone(),
            )))
        } else {
            None
        };

        Ok(Self::with_client(client, config.server_url.clone(), tokens))
    }

    pub fn with_client(client: Client, base_url: Url, tokens: Option<Arc<TokenManager>>) -> Self {
        ApiClient {
            client,
            base_url,
            tokens,
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn has_credentials(&self) -> bool {
        self.tokens.is_some()
    }

    /// 文件下载地址 {origin}/d/{token}
    pub fn download_url(&self, token: &str) -> Result<Url> {
        self.token_url(DOWNLOAD_PATH, token)
    }

    pub async fn list_files(&self) -> Result<FileList> {
        let url = self.base_url.join(FILES_PATH)?;
        debug!("获取文件列表: {}", url);

        let response = self.execute(self.client.get(url)).await?;
        let list: FileList = response.json().await?;
        debug!("获取到 {} 个文件", list.files.len());

        Ok(list)
    }

    pub async fn file_stats(&self) -> Result<StatsSnapshot> {
        let url = self.base_url.join(FILE_STATS_PATH)?;
        debug!("获取详细统计: {}", url);

        let response = self.execute(self.client.get(url)).await?;
        Ok(response.json().await?)
    }

    pub async fn basic_stats(&self) -> Result<BasicStats> {
        let url = self.base_url.join(BASIC_STATS_PATH)?;
        debug!("获取基础统计: {}", url);

        let response = self.execute(self.client.get(url)).await?;
        Ok(response.json().await?)
    }

    pub async fn upload(&self, path: &Path) -> Result<UploadResponse> {
        let url = self.base_url.join(UPLOAD_PATH)?;

        let file = fs::File::open(path).await?;
        let length = file.metadata().await?.len();
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(str::to_string)
            .unwrap_or_else(|| "upload".to_string());
        let mime = mime_guess::from_path(path).first_or_octet_stream();

        info!("上传文件: {} ({} 字节)", file_name, length);

        // 流式发送，避免把整个文件读入内存
        let body = Body::wrap_stream(ReaderStream::new(file));
        let part = Part::stream_with_length(body, length)
            .file_name(file_name)
            .mime_str(mime.as_ref())?;
        let form = Form::new().part(UPLOAD_FIELD, part);

        let response = self.execute(self.client.post(url).multipart(form)).await?;
        let uploaded: UploadResponse = response.json().await?;
        info!("上传完成: {}", uploaded.url);

        Ok(uploaded)
    }

    pub async fn delete(&self, token: &str) -> Result<()> {
        let url = self.token_url(DELETE_PATH, token)?;
        info!("删除文件: {}", token);

        self.execute(self.client.delete(url)).await?;
        Ok(())
    }

    /// 把下载地址的内容写入目标目录，返回保存路径
    pub async fn download(&self, url: &Url, dest_dir: &Path, progress: &ProgressBar) -> Result<PathBuf> {
        debug!("下载文件: {}", url);
        let response = self.execute(self.client.get(url.clone())).await?;

        let fallback = url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .and_then(sanitize_filename)
            .unwrap_or_else(|| "download".to_string());
        let file_name = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok())
            .and_then(filename_from_disposition)
            .unwrap_or(fallback);

        if let Some(length) = response.content_length() {
            progress.set_length(length);
        }

        fs::create_dir_all(dest_dir).await?;
        let (target, mut file) = create_unique(dest_dir, &file_name).await?;

        // 下载中断时删除不完整的文件
        if let Err(e) = write_body(response, &mut file, progress).await {
            drop(file);
            if let Err(remove_err) = fs::remove_file(&target).await {
                warn!("无法删除不完整的文件 {}: {}", target.display(), remove_err);
            }
            return Err(e);
        }
        progress.finish_and_clear();

        info!("文件已保存到 {}", target.display());
        Ok(target)
    }

    async fn execute(&self, builder: RequestBuilder) -> Result<Response> {
        let builder = match &self.tokens {
            Some(tokens) => builder.bearer_auth(tokens.get_token().await?),
            None => builder,
        };

        let response = builder.send().await?;
        self.check_status(response).await
    }

    async fn check_status(&self, response: Response) -> Result<Response> {
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            if let Some(tokens) = &self.tokens {
                tokens.invalidate();
            }
            return Err(ClientError::Unauthorized);
        }

        if !status.is_success() {
            let url = response.url().clone();
            let body = response.text().await.unwrap_or_default();
            error!("请求失败: {} - {} - {}", url, status, body);
            return Err(ClientError::Status { status, body });
        }

        Ok(response)
    }

    // 在服务器根路径下拼接 {prefix}/{token}，token会被转义
    fn token_url(&self, prefix: &str, token: &str) -> Result<Url> {
        let mut segments: Vec<&str> = prefix
            .split('/')
            .filter(|segment| !segment.is_empty())
            .collect();
        segments.push(token);

        let mut url = self.base_url.clone();
        url.set_query(None);
        url.set_fragment(None);
        url.path_segments_mut()
            .map_err(|_| ClientError::Config(format!("服务器地址无法作为基础地址: {}", self.base_url)))?
            .clear()
            .extend(&segments);
        Ok(url)
    }
}

async fn write_body(response: Response, file: &mut fs::File, progress: &ProgressBar) -> Result<()> {
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        progress.inc(chunk.len() as u64);
    }
    file.flush().await?;
    Ok(())
}

// 以create_new创建目标文件，已存在时追加序号，不会覆盖已有文件
async fn create_unique(dir: &Path, file_name: &str) -> Result<(PathBuf, fs::File)> {
    let path = Path::new(file_name);
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file_name);
    let extension = path.extension().and_then(|e| e.to_str());

    let mut index = 0u32;
    loop {
        let name = match (index, extension) {
            (0, _) => file_name.to_string(),
            (_, Some(ext)) => format!("{} ({}).{}", stem, index, ext),
            (_, None) => format!("{} ({})", stem, index),
        };
        let candidate = dir.join(name);

        match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&candidate)
            .await
        {
            Ok(file) => return Ok((candidate, file)),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => index += 1,
            Err(e) => return Err(e.into()),
        }
    }
}
