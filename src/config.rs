use anyhow::{anyhow, Result};
use chrono_tz::Tz;
use log::info;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::constants::{
    DEFAULT_CONNECT_TIMEOUT, DEFAULT_DATE_FORMAT, DEFAULT_DOWNLOAD_DIR,
    DEFAULT_DOWNLOAD_SETTLE_DELAY, DEFAULT_REQUEST_TIMEOUT, DEFAULT_SERVER_URL,
};
use crate::util::DateDisplay;

#[derive(Debug, Clone)]
pub struct Config {
    // 服务端
    pub server_url: Url,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,

    // 认证
    pub username: Option<String>,
    pub access_token: Option<String>,

    // 下载
    pub download_dir: PathBuf,
    pub download_settle_delay: Duration,

    // 显示
    pub date_display: DateDisplay,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server_url: Url::parse(DEFAULT_SERVER_URL).expect("默认服务器地址无效"),
            connect_timeout: *DEFAULT_CONNECT_TIMEOUT,
            request_timeout: *DEFAULT_REQUEST_TIMEOUT,
            username: None,
            access_token: None,
            download_dir: PathBuf::from(DEFAULT_DOWNLOAD_DIR),
            download_settle_delay: *DEFAULT_DOWNLOAD_SETTLE_DELAY,
            date_display: DateDisplay::default(),
        }
    }
}

impl Config {
    // 创建默认的.env文件模板（如果不存在）
    fn create_default_env_file() -> Result<()> {
        let env_path = ".env";
        if !Path::new(env_path).exists() {
            let env_content =
                "# FileShare 客户端配置\n\
                 # 服务器地址（可选，默认 http://localhost:8080）\n\
                 # FILESHARE_URL=http://localhost:8080\n\
                 # 服务器开启认证时填写用户名，客户端会自动申请访问令牌\n\
                 # FILESHARE_USERNAME=\n\
                 # 或者直接填写已有的访问令牌\n\
                 # FILESHARE_TOKEN=\n\
                 # 下载目录（可选，默认 downloads）\n\
                 # DOWNLOAD_DIR=downloads\n\
                 # 下载后等待服务端记录下载次数的时间，单位毫秒（可选，默认1000）\n\
                 # DOWNLOAD_SETTLE_MS=1000\n\
                 # 请求超时，单位秒（可选，默认300）\n\
                 # REQUEST_TIMEOUT_SECS=300\n\
                 # 连接超时，单位秒（可选，默认10）\n\
                 # CONNECT_TIMEOUT_SECS=10\n\
                 # 显示时区，例如 Asia/Shanghai（可选，默认本机时区）\n\
                 # DISPLAY_TIMEZONE=\n\
                 # 日期格式（可选）\n\
                 # DATE_FORMAT=%Y/%m/%d %H:%M:%S\n";

            fs::write(env_path, env_content)?;
            info!("已创建.env文件模板，可按需填写配置项");
        }
        Ok(())
    }

    pub fn new() -> Result<Self> {
        // 模板写入失败不影响运行
        if let Err(e) = Self::create_default_env_file() {
            log::debug!("无法创建.env模板: {}", e);
        }
        Self::from_env()
    }

    /// 只读取环境变量，不写任何文件
    pub fn from_env() -> Result<Self> {
        let server_url = env::var("FILESHARE_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string());
        let server_url = Self::parse_server_url(&server_url)?;

        let connect_timeout = Self::duration_var("CONNECT_TIMEOUT_SECS", Duration::from_secs)?
            .unwrap_or(*DEFAULT_CONNECT_TIMEOUT);
        let request_timeout = Self::duration_var("REQUEST_TIMEOUT_SECS", Duration::from_secs)?
            .unwrap_or(*DEFAULT_REQUEST_TIMEOUT);
        let download_settle_delay = Self::duration_var("DOWNLOAD_SETTLE_MS", Duration::from_millis)?
            .unwrap_or(*DEFAULT_DOWNLOAD_SETTLE_DELAY);

        let username = non_empty_var("FILESHARE_USERNAME");
        let access_token = non_empty_var("FILESHARE_TOKEN");

        let download_dir = non_empty_var("DOWNLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DOWNLOAD_DIR));

        let timezone = match non_empty_var("DISPLAY_TIMEZONE") {
            Some(name) => Some(
                name.parse::<Tz>()
                    .map_err(|e| anyhow!("DISPLAY_TIMEZONE无效: {} - {}", name, e))?,
            ),
            None => None,
        };
        let date_format =
            non_empty_var("DATE_FORMAT").unwrap_or_else(|| DEFAULT_DATE_FORMAT.to_string());

        Ok(Config {
            server_url,
            connect_timeout,
            request_timeout,
            username,
            access_token,
            download_dir,
            download_settle_delay,
            date_display: DateDisplay::new(timezone, date_format),
        })
    }

    /// 解析服务器地址，缺少协议时补全为http
    pub fn parse_server_url(raw: &str) -> Result<Url> {
        let raw = raw.trim();
        let with_scheme = if !raw.starts_with("http://") && !raw.starts_with("https://") {
            format!("http://{}", raw)
        } else {
            raw.to_string()
        };

        let url = Url::parse(&with_scheme)
            .map_err(|e| anyhow!("FILESHARE_URL无效: {} - {}", raw, e))?;
        if url.host_str().is_none() {
            return Err(anyhow!("FILESHARE_URL缺少主机名: {}", raw));
        }
        Ok(url)
    }

    fn duration_var(key: &str, to_duration: fn(u64) -> Duration) -> Result<Option<Duration>> {
        non_empty_var(key)
            .map(|raw| Self::parse_duration(key, &raw, to_duration))
            .transpose()
    }

    // 0是合法值，例如DOWNLOAD_SETTLE_MS=0表示下载后不等待
    fn parse_duration(key: &str, raw: &str, to_duration: fn(u64) -> Duration) -> Result<Duration> {
        let n = raw
            .trim()
            .parse::<u64>()
            .map_err(|_| anyhow!("{}必须是非负整数: {}", key, raw))?;
        Ok(to_duration(n))
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}
