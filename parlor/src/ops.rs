use serde::Deserialize;
use shared::{Error, Result};

use crate::crypto::hash;
use crate::repository::{ChatRepository, NewUser};

/// Closed set of business operations. Dispatch is a single `match`; there is
/// no name-to-method reflection, so a name outside this set can never reach
/// code.
#[derive(Debug, Deserialize)]
#[serde(tag = "operate", content = "args")]
pub enum Operation {
    #[serde(rename = "super_add_user")]
    SuperAddUser(AddUserArgs),
    #[serde(rename = "super_get_user_by_uuid")]
    SuperGetUserByUuid(GetUserArgs),
    #[serde(rename = "super_get_database_info")]
    SuperGetDatabaseInfo(serde_json::Value),
}

#[derive(Debug, Deserialize)]
pub struct AddUserArgs {
    pub qq_number: i64,
    pub name: String,
    pub avatar_path: String,
    pub role: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct GetUserArgs {
    pub user_uuid: String,
}

const OPERATION_NAMES: &[&str] = &[
    "super_add_user",
    "super_get_user_by_uuid",
    "super_get_database_info",
];

/// Parses the decrypted inner payload into an [`Operation`]. A missing or
/// non-string `operate` field is a schema failure; a well-formed but unknown
/// name is `OperationNotPermitted`.
pub fn parse(body: serde_json::Value) -> Result<Operation> {
    let name = body
        .get("operate")
        .and_then(|v| v.as_str())
        .ok_or_else(|| Error::MalformedEnvelope("missing operate field".to_string()))?;
    if !OPERATION_NAMES.contains(&name) {
        return Err(Error::OperationNotPermitted);
    }
    serde_json::from_value(body).map_err(|e| Error::MalformedEnvelope(e.to_string()))
}

pub async fn dispatch(repo: &dyn ChatRepository, op: Operation) -> Result<serde_json::Value> {
    match op {
        Operation::SuperAddUser(args) => {
            let password_hash = hash::sha512_hex(&format!("{}{}", args.password, args.qq_number));
            let uuid = repo
                .create_user(NewUser {
                    qq_number: args.qq_number,
                    name: args.name,
                    avatar_path: args.avatar_path,
                    role: args.role,
                    password_hash,
                    inviter: String::new(),
                })
                .await?;
            Ok(serde_json::json!({ "user_uuid": uuid }))
        }
        Operation::SuperGetUserByUuid(args) => {
            let user = repo.get_user_by_uuid(&args.user_uuid).await?;
            serde_json::to_value(user).map_err(|e| Error::Internal(e.to_string()))
        }
        Operation::SuperGetDatabaseInfo(_) => repo.database_info().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MemoryRepository;

    #[test]
    fn unknown_operation_names_are_not_permitted() {
        let body = serde_json::json!({"operate": "drop_all_tables", "args": {}});
        assert!(matches!(parse(body), Err(Error::OperationNotPermitted)));
    }

    #[test]
    fn missing_operate_field_is_malformed() {
        let body = serde_json::json!({"args": {}});
        assert!(matches!(parse(body), Err(Error::MalformedEnvelope(_))));
    }

    #[test]
    fn bad_argument_shape_is_malformed() {
        let body = serde_json::json!({"operate": "super_get_user_by_uuid", "args": {}});
        assert!(matches!(parse(body), Err(Error::MalformedEnvelope(_))));
    }

    #[tokio::test]
    async fn add_then_fetch_a_user() {
        let repo = MemoryRepository::new();
        let op = parse(serde_json::json!({
            "operate": "super_add_user",
            "args": {
                "qq_number": 10001,
                "name": "alice",
                "avatar_path": "/a.png",
                "role": "member",
                "password": "secret"
            }
        }))
        .unwrap();

        let created = dispatch(&repo, op).await.unwrap();
        let uuid = created["user_uuid"].as_str().unwrap().to_string();

        let op = parse(serde_json::json!({
            "operate": "super_get_user_by_uuid",
            "args": {"user_uuid": uuid}
        }))
        .unwrap();
        let fetched = dispatch(&repo, op).await.unwrap();
        assert_eq!(fetched["name"], "alice");
        // Hash input is password ++ qq_number, per the account scheme.
        assert_eq!(
            fetched["password_hash"],
            crate::crypto::hash::sha512_hex("secret10001").as_str()
        );
    }

    #[tokio::test]
    async fn database_info_reports_the_backend() {
        let repo = MemoryRepository::new();
        let op = parse(serde_json::json!({"operate": "super_get_database_info"})).unwrap();
        let info = dispatch(&repo, op).await.unwrap();
        assert_eq!(info["backend"], "memory");
        assert_eq!(info["users"], 0);
    }
}
