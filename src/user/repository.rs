use async_trait::async_trait;
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::{debug, instrument, warn};

use super::models::{TwoFactor, User};
use crate::password;
use crate::shared::AppError;

/// Trait for user store operations
///
/// `store_user` owns the password hashing: callers hand over the raw
/// password and it is hashed before anything is persisted. The
/// uniqueness check and the append are atomic per implementation, so
/// two concurrent sign-ups with the same email cannot both succeed.
#[async_trait]
pub trait UserRepository {
    async fn get_user(&self, email: &str) -> Result<Option<User>, AppError>;
    async fn store_user(&self, email: &str, name: &str, raw_password: &str)
        -> Result<(), AppError>;
    async fn list_users(&self) -> Result<Vec<User>, AppError>;
}

/// In-memory implementation of UserRepository for development and testing
///
/// Data is stored in memory and lost when the application restarts.
pub struct InMemoryUserRepository {
    users: Mutex<HashMap<String, User>>,
}

impl Default for InMemoryUserRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryUserRepository {
    /// Creates a new empty in-memory repository
    pub fn new() -> Self {
        Self {
            users: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the current number of users in the repository
    pub fn user_count(&self) -> usize {
        self.users.lock().unwrap().len()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    #[instrument(skip(self))]
    async fn get_user(&self, email: &str) -> Result<Option<User>, AppError> {
        debug!(email = %email, "Fetching user from memory");

        let users = self.users.lock().unwrap();
        Ok(users.get(email).cloned())
    }

    #[instrument(skip(self, raw_password))]
    async fn store_user(
        &self,
        email: &str,
        name: &str,
        raw_password: &str,
    ) -> Result<(), AppError> {
        debug!(email = %email, "Storing user in memory");

        // Hash outside the lock; the post-lock re-check keeps the
        // uniqueness invariant even if two sign-ups hash concurrently.
        let password_hash = password::hash_password(raw_password)?;

        let mut users = self.users.lock().unwrap();
        if users.contains_key(email) {
            warn!(email = %email, "User already exists in memory");
            return Err(AppError::AlreadyExists);
        }
        users.insert(
            email.to_string(),
            User::new(email.to_string(), name.to_string(), password_hash),
        );

        debug!(email = %email, "User stored successfully in memory");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_users(&self) -> Result<Vec<User>, AppError> {
        let users = self.users.lock().unwrap();
        Ok(users.values().cloned().collect())
    }
}

/// JSON-file implementation of UserRepository
///
/// The user file is loaded into an in-memory index once at
/// construction; lookups are served from the index. `store_user`
/// holds the index lock across the uniqueness re-check, the file
/// rewrite, and the index insert, so the full read-append-write
/// sequence is a single mutual-exclusion domain. The file write
/// happens before the index insert: a failed write leaves no
/// half-applied user.
pub struct JsonFileUserRepository {
    path: PathBuf,
    users: Mutex<HashMap<String, User>>,
}

impl JsonFileUserRepository {
    /// Opens the repository, loading any existing user file.
    /// A missing file is treated as an empty store.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, AppError> {
        let path = path.into();

        let mut users = HashMap::new();
        if path.exists() {
            let raw = fs::read(&path).map_err(|e| {
                AppError::StorageFailure(format!("failed to read user file: {}", e))
            })?;
            if !raw.is_empty() {
                let list: Vec<User> = serde_json::from_slice(&raw).map_err(|e| {
                    AppError::StorageFailure(format!("failed to decode user file: {}", e))
                })?;
                for user in list {
                    users.insert(user.email.clone(), user);
                }
            }
        }

        debug!(path = %path.display(), user_count = users.len(), "Loaded user file");
        Ok(Self {
            path,
            users: Mutex::new(users),
        })
    }

    /// Serializes the given records to the user file.
    /// Called with the index lock held.
    fn write_file(&self, users: Vec<&User>) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    AppError::StorageFailure(format!("failed to create storage dir: {}", e))
                })?;
            }
        }

        let encoded = serde_json::to_vec_pretty(&users)
            .map_err(|e| AppError::StorageFailure(format!("failed to encode users: {}", e)))?;
        fs::write(&self.path, encoded)
            .map_err(|e| AppError::StorageFailure(format!("failed to write user file: {}", e)))
    }
}

#[async_trait]
impl UserRepository for JsonFileUserRepository {
    #[instrument(skip(self))]
    async fn get_user(&self, email: &str) -> Result<Option<User>, AppError> {
        debug!(email = %email, "Fetching user from file-backed index");

        let users = self.users.lock().unwrap();
        Ok(users.get(email).cloned())
    }

    #[instrument(skip(self, raw_password))]
    async fn store_user(
        &self,
        email: &str,
        name: &str,
        raw_password: &str,
    ) -> Result<(), AppError> {
        debug!(email = %email, "Storing user in file-backed store");

        let password_hash = password::hash_password(raw_password)?;
        let user = User::new(email.to_string(), name.to_string(), password_hash);

        let mut users = self.users.lock().unwrap();
        if users.contains_key(email) {
            warn!(email = %email, "User already exists in file-backed store");
            return Err(AppError::AlreadyExists);
        }

        // Rewrite the file before touching the index
        let mut snapshot: Vec<&User> = users.values().collect();
        snapshot.push(&user);
        self.write_file(snapshot)?;

        users.insert(email.to_string(), user);

        debug!(email = %email, "User stored successfully in file-backed store");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_users(&self) -> Result<Vec<User>, AppError> {
        let users = self.users.lock().unwrap();
        Ok(users.values().cloned().collect())
    }
}

/// PostgreSQL implementation of user repository
///
/// Uniqueness rides on the primary key: `ON CONFLICT DO NOTHING` with
/// zero rows affected means the email was already taken.
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn two_factor_columns(two_factor: &TwoFactor) -> (&'static str, Option<&str>) {
    match two_factor {
        TwoFactor::Disabled => ("disabled", None),
        TwoFactor::Authenticator {
            one_time_password_secret,
        } => ("authenticator", Some(one_time_password_secret)),
    }
}

fn two_factor_from_columns(kind: &str, secret: Option<String>) -> TwoFactor {
    match (kind, secret) {
        ("authenticator", Some(secret)) => TwoFactor::Authenticator {
            one_time_password_secret: secret,
        },
        _ => TwoFactor::Disabled,
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    #[instrument(skip(self))]
    async fn get_user(&self, email: &str) -> Result<Option<User>, AppError> {
        debug!(email = %email, "Fetching user from database");

        let row = sqlx::query(
            "SELECT email, name, password_hash, two_factor_type, two_factor_secret \
             FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, email = %email, "Failed to fetch user from database");
            AppError::StorageFailure(e.to_string())
        })?;

        Ok(row.map(|row| User {
            email: row.get("email"),
            name: row.get("name"),
            password_hash: row.get("password_hash"),
            two_factor: two_factor_from_columns(
                row.get::<String, _>("two_factor_type").as_str(),
                row.get("two_factor_secret"),
            ),
        }))
    }

    #[instrument(skip(self, raw_password))]
    async fn store_user(
        &self,
        email: &str,
        name: &str,
        raw_password: &str,
    ) -> Result<(), AppError> {
        debug!(email = %email, "Storing user in database");

        let password_hash = password::hash_password(raw_password)?;
        let user = User::new(email.to_string(), name.to_string(), password_hash);
        let (two_factor_type, two_factor_secret) = two_factor_columns(&user.two_factor);

        let result = sqlx::query(
            "INSERT INTO users (email, name, password_hash, two_factor_type, two_factor_secret) \
             VALUES ($1, $2, $3, $4, $5) ON CONFLICT (email) DO NOTHING",
        )
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.password_hash)
        .bind(two_factor_type)
        .bind(two_factor_secret)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, email = %email, "Failed to store user in database");
            AppError::StorageFailure(e.to_string())
        })?;

        if result.rows_affected() == 0 {
            warn!(email = %email, "User already exists in database");
            return Err(AppError::AlreadyExists);
        }

        debug!(email = %email, "User stored successfully in database");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_users(&self) -> Result<Vec<User>, AppError> {
        let rows = sqlx::query(
            "SELECT email, name, password_hash, two_factor_type, two_factor_secret FROM users",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to list users from database");
            AppError::StorageFailure(e.to_string())
        })?;

        Ok(rows
            .into_iter()
            .map(|row| User {
                email: row.get("email"),
                name: row.get("name"),
                password_hash: row.get("password_hash"),
                two_factor: two_factor_from_columns(
                    row.get::<String, _>("two_factor_type").as_str(),
                    row.get("two_factor_secret"),
                ),
            })
            .collect())
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::password::verify_password;
    use std::sync::Arc;

    /// Test helper functions
    mod helpers {
        use std::path::PathBuf;

        /// Creates a unique throwaway path for file-backed repository tests
        pub fn temp_store_path() -> PathBuf {
            std::env::temp_dir().join(format!("authgate-users-{}.json", uuid::Uuid::new_v4()))
        }
    }

    use helpers::*;

    #[tokio::test]
    async fn test_store_and_get_user() {
        let repo = InMemoryUserRepository::new();

        repo.store_user("a@x.com", "Alice", "pw1").await.unwrap();

        let user = repo.get_user("a@x.com").await.unwrap().unwrap();
        assert_eq!(user.email, "a@x.com");
        assert_eq!(user.name, "Alice");
        assert!(verify_password("pw1", &user.password_hash));
        assert_eq!(user.two_factor, TwoFactor::Disabled);
    }

    #[tokio::test]
    async fn test_get_nonexistent_user() {
        let repo = InMemoryUserRepository::new();

        let result = repo.get_user("nobody@x.com").await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_lookup_is_case_sensitive() {
        let repo = InMemoryUserRepository::new();
        repo.store_user("a@x.com", "Alice", "pw1").await.unwrap();

        assert!(repo.get_user("A@x.com").await.unwrap().is_none());
        assert!(repo.get_user("a@x.com").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_duplicate_store_keeps_original_record() {
        let repo = InMemoryUserRepository::new();

        repo.store_user("a@x.com", "Alice", "pw1").await.unwrap();
        let original = repo.get_user("a@x.com").await.unwrap().unwrap();

        let result = repo.store_user("a@x.com", "Mallory", "pw2").await;
        assert!(matches!(result, Err(AppError::AlreadyExists)));

        // Original record untouched
        let after = repo.get_user("a@x.com").await.unwrap().unwrap();
        assert_eq!(after.name, "Alice");
        assert_eq!(after.password_hash, original.password_hash);
    }

    #[tokio::test]
    async fn test_concurrent_duplicate_signup_one_wins() {
        let repo = Arc::new(InMemoryUserRepository::new());

        let r1 = Arc::clone(&repo);
        let r2 = Arc::clone(&repo);
        let t1 = tokio::spawn(async move { r1.store_user("a@x.com", "Alice", "pw1").await });
        let t2 = tokio::spawn(async move { r2.store_user("a@x.com", "Alice", "pw1").await });

        let results = [t1.await.unwrap(), t2.await.unwrap()];
        let successes = results.iter().filter(|r| r.is_ok()).count();
        let conflicts = results
            .iter()
            .filter(|r| matches!(r, Err(AppError::AlreadyExists)))
            .count();

        assert_eq!(successes, 1);
        assert_eq!(conflicts, 1);
        assert_eq!(repo.user_count(), 1);
    }

    #[tokio::test]
    async fn test_list_users() {
        let repo = InMemoryUserRepository::new();
        repo.store_user("a@x.com", "Alice", "pw1").await.unwrap();
        repo.store_user("b@x.com", "Bob", "pw2").await.unwrap();

        let users = repo.list_users().await.unwrap();
        assert_eq!(users.len(), 2);
    }

    #[tokio::test]
    async fn test_json_file_repository_persists_across_reload() {
        let path = temp_store_path();

        {
            let repo = JsonFileUserRepository::new(&path).unwrap();
            repo.store_user("a@x.com", "Alice", "pw1").await.unwrap();
        }

        // Fresh instance over the same file sees the stored user
        let repo = JsonFileUserRepository::new(&path).unwrap();
        let user = repo.get_user("a@x.com").await.unwrap().unwrap();
        assert_eq!(user.name, "Alice");
        assert!(verify_password("pw1", &user.password_hash));

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_json_file_repository_missing_file_is_empty_store() {
        let path = temp_store_path();

        let repo = JsonFileUserRepository::new(&path).unwrap();
        assert!(repo.get_user("a@x.com").await.unwrap().is_none());
        assert!(repo.list_users().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_json_file_repository_rejects_duplicates() {
        let path = temp_store_path();
        let repo = JsonFileUserRepository::new(&path).unwrap();

        repo.store_user("a@x.com", "Alice", "pw1").await.unwrap();
        let result = repo.store_user("a@x.com", "Alice", "pw1").await;
        assert!(matches!(result, Err(AppError::AlreadyExists)));

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_json_file_concurrent_duplicate_signup_one_wins() {
        let path = temp_store_path();
        let repo = Arc::new(JsonFileUserRepository::new(&path).unwrap());

        let r1 = Arc::clone(&repo);
        let r2 = Arc::clone(&repo);
        let t1 = tokio::spawn(async move { r1.store_user("a@x.com", "Alice", "pw1").await });
        let t2 = tokio::spawn(async move { r2.store_user("a@x.com", "Alice", "pw1").await });

        let results = [t1.await.unwrap(), t2.await.unwrap()];
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert_eq!(
            results
                .iter()
                .filter(|r| matches!(r, Err(AppError::AlreadyExists)))
                .count(),
            1
        );

        // The file agrees with the index
        let reloaded = JsonFileUserRepository::new(&path).unwrap();
        assert_eq!(reloaded.list_users().await.unwrap().len(), 1);

        let _ = std::fs::remove_file(&path);
    }
}
