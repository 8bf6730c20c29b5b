use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::Result;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub qq_number: i64,
    pub name: String,
    pub avatar_path: String,
    pub role: String,
    pub password_hash: String,
    pub inviter: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub uuid: String,
    pub qq_number: i64,
    pub name: String,
    pub avatar_path: String,
    pub role: String,
    pub password_hash: String,
    pub inviter: String,
    pub created_at: DateTime<Utc>,
}

/// Persistence port for the business operations. Relational backends live
/// behind this trait and are injected; the core never talks SQL.
#[async_trait]
pub trait ChatRepository: Send + Sync {
    /// Creates a user and returns its uuid.
    async fn create_user(&self, user: NewUser) -> Result<String>;

    async fn get_user_by_uuid(&self, user_uuid: &str) -> Result<Option<UserRecord>>;

    async fn database_info(&self) -> Result<serde_json::Value>;
}

/// In-memory repository backing tests and the default server wiring.
#[derive(Default)]
pub struct MemoryRepository {
    users: RwLock<HashMap<String, UserRecord>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ChatRepository for MemoryRepository {
    async fn create_user(&self, user: NewUser) -> Result<String> {
        let uuid = Uuid::new_v4().to_string();
        let record = UserRecord {
            uuid: uuid.clone(),
            qq_number: user.qq_number,
            name: user.name,
            avatar_path: user.avatar_path,
            role: user.role,
            password_hash: user.password_hash,
            inviter: user.inviter,
            created_at: Utc::now(),
        };
        self.users.write().await.insert(uuid.clone(), record);
        Ok(uuid)
    }

    async fn get_user_by_uuid(&self, user_uuid: &str) -> Result<Option<UserRecord>> {
        Ok(self.users.read().await.get(user_uuid).cloned())
    }

    async fn database_info(&self) -> Result<serde_json::Value> {
        let users = self.users.read().await;
        Ok(serde_json::json!({
            "backend": "memory",
            "users": users.len(),
        }))
    }
}
