use reqwest::StatusCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    /// 网络层失败（连接、超时、响应体读取）
    #[error("请求失败: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("服务器返回错误状态: {status} - {body}")]
    Status { status: StatusCode, body: String },

    #[error("未授权，请检查用户名或访问令牌")]
    Unauthorized,

    #[error("写入剪贴板失败: {0}")]
    Clipboard(String),

    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL无效: {0}")]
    Url(#[from] url::ParseError),

    #[error("配置错误: {0}")]
    Config(String),
}

impl ClientError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ClientError::Unauthorized)
    }
}
