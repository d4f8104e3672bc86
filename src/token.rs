use log::{info, warn};
use reqwest::Client;
use std::sync::Arc;
use std::sync::RwLock;
use tokio::sync::Mutex;
use url::Url;

use crate::error::{ClientError, Result};
use crate::types::{AuthRequest, AuthResponse};

/// 访问令牌管理：预置令牌直接使用，否则用用户名向 /api/auth 申请并缓存
#[derive(Debug, Clone)]
pub struct TokenManager {
    client: Client,
    auth_url: Url,
    username: Option<String>,
    token: Arc<RwLock<Option<String>>>,
    refresh_lock: Arc<Mutex<()>>,
}

impl TokenManager {
    pub fn new(
        client: Client,
        auth_url: Url,
        username: Option<String>,
        preset_token: Option<String>,
    ) -> Self {
        TokenManager {
            client,
            auth_url,
            username,
            token: Arc::new(RwLock::new(preset_token)),
            refresh_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub async fn get_token(&self) -> Result<String> {
        if let Some(token) = self.cached() {
            return Ok(token);
        }

        let _lock = self.refresh_lock.lock().await;

        // 在获取锁后再次检查，以避免多次申请令牌
        if let Some(token) = self.cached() {
            return Ok(token);
        }

        let token = self.request_token().await?;
        self.store(Some(token.clone()));

        Ok(token)
    }

    /// 服务端返回401后调用，下一次请求会重新申请令牌
    pub fn invalidate(&self) {
        if self.username.is_some() {
            warn!("访问令牌已失效，下次请求时重新申请");
            self.store(None);
        }
    }

    fn cached(&self) -> Option<String> {
        match self.token.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn store(&self, token: Option<String>) {
        match self.token.write() {
            Ok(mut guard) => *guard = token,
            Err(poisoned) => *poisoned.into_inner() = token,
        }
    }

    async fn request_token(&self) -> Result<String> {
        let username = self.username.clone().ok_or(ClientError::Unauthorized)?;

        let response = self
            .client
            .post(self.auth_url.clone())
            .json(&AuthRequest { username })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Status { status, body });
        }

        let auth: AuthResponse = response.json().await?;
        info!("已获取访问令牌，用户: {}", auth.username);

        Ok(auth.token)
    }
}
