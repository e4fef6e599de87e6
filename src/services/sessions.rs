//! Browser sessions kept in Redis, keyed by a random cookie token

use async_trait::async_trait;
use rand::RngCore;
use redis::{AsyncCommands, Client};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// Bytes of randomness in a session token
const TOKEN_BYTES: usize = 32;

/// Per-browser state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionData {
    /// Logged-in user, if any
    #[serde(default)]
    pub user_id: Option<i32>,
    /// Index page visits made from this browser
    #[serde(default)]
    pub num_visits: u64,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self, token: &str) -> AppResult<Option<SessionData>>;
    async fn save(&self, token: &str, data: &SessionData) -> AppResult<()>;
    async fn destroy(&self, token: &str) -> AppResult<()>;
}

/// Fresh unguessable session token (hex encoded)
pub fn new_session_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[derive(Clone)]
pub struct RedisSessionStore {
    client: Client,
    ttl_seconds: u64,
}

impl RedisSessionStore {
    /// Create the store and check the server answers
    pub async fn new(url: &str, ttl_hours: u64) -> AppResult<Self> {
        let client = Client::open(url)?;

        let mut conn = client.get_multiplexed_async_connection().await?;
        redis::cmd("PING").query_async::<_, String>(&mut conn).await?;

        Ok(Self {
            client,
            ttl_seconds: ttl_hours * 3600,
        })
    }

    fn key(token: &str) -> String {
        format!("session:{}", token)
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn load(&self, token: &str) -> AppResult<Option<SessionData>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let raw: Option<String> = conn.get(Self::key(token)).await?;
        match raw {
            Some(raw) => {
                let data = serde_json::from_str(&raw)
                    .map_err(|e| AppError::Internal(format!("Corrupt session record: {}", e)))?;
                Ok(Some(data))
            }
            None => Ok(None),
        }
    }

    async fn save(&self, token: &str, data: &SessionData) -> AppResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let raw = serde_json::to_string(data)
            .map_err(|e| AppError::Internal(format!("Failed to encode session: {}", e)))?;
        conn.set_ex::<_, _, ()>(Self::key(token), raw, self.ttl_seconds).await?;
        Ok(())
    }

    async fn destroy(&self, token: &str) -> AppResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        conn.del::<_, ()>(Self::key(token)).await?;
        Ok(())
    }
}
