//! User repository for database operations
//!
//! Credential-store access with bcrypt password hashing and the
//! per-user refresh token field used for session revocation.

use sqlx::PgPool;

use crate::core::db::models::User;

/// Cost factor for bcrypt hashing
const BCRYPT_COST: u32 = 10;

/// User repository error types
#[derive(Debug, thiserror::Error)]
pub enum UserRepositoryError {
    #[error("User not found")]
    NotFound,

    #[error("Email already exists")]
    EmailAlreadyExists,

    #[error("Password hashing failed: {0}")]
    HashingError(String),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// User repository for database operations
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Hash a password using bcrypt with automatic salt generation
    pub fn hash_password(password: &str) -> Result<String, UserRepositoryError> {
        bcrypt::hash(password, BCRYPT_COST)
            .map_err(|e| UserRepositoryError::HashingError(e.to_string()))
    }

    /// Verify a password against a bcrypt hash
    pub fn verify_password(password: &str, hash: &str) -> Result<bool, UserRepositoryError> {
        bcrypt::verify(password, hash).map_err(|e| UserRepositoryError::HashingError(e.to_string()))
    }

    /// Create a new user with a plain text password (will be hashed).
    ///
    /// The email pre-check is an optimization; the unique constraint on
    /// `users.email` is the source of truth, so a concurrent duplicate
    /// registration that slips past the check still fails here with
    /// `EmailAlreadyExists` instead of overwriting anything.
    pub async fn create(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<User, UserRepositoryError> {
        if self.find_by_email(email).await?.is_some() {
            return Err(UserRepositoryError::EmailAlreadyExists);
        }

        let password_hash = Self::hash_password(password)?;

        let result = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, name, email, password_hash, refresh_token, created_at
            "#,
        )
        .bind(name)
        .bind(email)
        .bind(&password_hash)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(user) => Ok(user),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(UserRepositoryError::EmailAlreadyExists)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Find a user by ID
    pub async fn find_by_id(&self, id: i64) -> Result<Option<User>, UserRepositoryError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, refresh_token, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Find a user by email (case-sensitive, as stored)
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, UserRepositoryError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, refresh_token, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Overwrite the stored refresh token unconditionally.
    ///
    /// `Some(token)` is the login/rotation operation, `None` the logout
    /// operation. This is the sole revocation mechanism for refresh
    /// tokens.
    pub async fn set_refresh_token(
        &self,
        user_id: i64,
        token: Option<&str>,
    ) -> Result<(), UserRepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET refresh_token = $2
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .bind(token)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(UserRepositoryError::NotFound);
        }

        Ok(())
    }

    /// Clear the refresh token for whichever user currently holds the
    /// exact value. A no-op (0 rows) is not an error: logout with an
    /// already-cleared token still succeeds.
    pub async fn clear_refresh_token_by_value(
        &self,
        token: &str,
    ) -> Result<u64, UserRepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET refresh_token = NULL
            WHERE refresh_token = $1
            "#,
        )
        .bind(token)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Authenticate a user by email and password.
    /// Returns the user if credentials are valid, None otherwise
    pub async fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<User>, UserRepositoryError> {
        let user = match self.find_by_email(email).await? {
            Some(u) => u,
            None => return Ok(None),
        };

        let is_valid = Self::verify_password(password, &user.password_hash)?;

        if is_valid { Ok(Some(user)) } else { Ok(None) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========================================================================
    // Password hashing tests (don't require database)
    // ========================================================================

    #[test]
    fn test_hash_password_produces_valid_bcrypt_hash() {
        let password = "my_secure_password123!";
        let hash = UserRepository::hash_password(password).unwrap();

        assert!(hash.starts_with("$2b$") || hash.starts_with("$2a$") || hash.starts_with("$2y$"));
        assert_eq!(hash.len(), 60);
    }

    #[test]
    fn test_hash_password_produces_different_hashes_for_same_password() {
        let password = "same_password";
        let hash1 = UserRepository::hash_password(password).unwrap();
        let hash2 = UserRepository::hash_password(password).unwrap();

        // Random salt
        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_verify_password_correct() {
        let password = "correct_password";
        let hash = UserRepository::hash_password(password).unwrap();

        assert!(UserRepository::verify_password(password, &hash).unwrap());
    }

    #[test]
    fn test_verify_password_incorrect() {
        let hash = UserRepository::hash_password("correct_password").unwrap();

        assert!(!UserRepository::verify_password("wrong_password", &hash).unwrap());
    }

    #[test]
    fn test_verify_password_unicode() {
        let password = "รหัสผ่าน_密码_🔐";
        let hash = UserRepository::hash_password(password).unwrap();

        assert!(UserRepository::verify_password(password, &hash).unwrap());
    }

    #[test]
    fn test_verify_password_invalid_hash_format() {
        let result = UserRepository::verify_password("password", "not_a_valid_hash");
        assert!(result.is_err());
    }

    #[test]
    fn test_user_repository_error_display() {
        assert_eq!(format!("{}", UserRepositoryError::NotFound), "User not found");
        assert_eq!(
            format!("{}", UserRepositoryError::EmailAlreadyExists),
            "Email already exists"
        );
        assert!(
            format!("{}", UserRepositoryError::HashingError("boom".to_string())).contains("boom")
        );
    }

    // ========================================================================
    // Integration tests (require database)
    // ========================================================================

    #[tokio::test]
    #[ignore = "requires running PostgreSQL database"]
    async fn test_create_and_find_user() {
        let pool = create_test_pool().await;
        let repo = UserRepository::new(pool);

        let user = repo
            .create("Test Create", "test_create@example.com", "secret123")
            .await
            .unwrap();

        assert_eq!(user.email, "test_create@example.com");
        assert_eq!(user.name, "Test Create");
        assert!(user.refresh_token.is_none());
        // Never stored in plain text
        assert_ne!(user.password_hash, "secret123");
        assert!(user.password_hash.starts_with("$2"));

        let found = repo.find_by_id(user.id).await.unwrap();
        assert_eq!(found.unwrap().id, user.id);
    }

    #[tokio::test]
    #[ignore = "requires running PostgreSQL database"]
    async fn test_create_user_duplicate_email() {
        let pool = create_test_pool().await;
        let repo = UserRepository::new(pool);

        let first = repo
            .create("First", "duplicate@example.com", "password1")
            .await
            .unwrap();

        let result = repo
            .create("Second", "duplicate@example.com", "password2")
            .await;
        assert!(matches!(
            result,
            Err(UserRepositoryError::EmailAlreadyExists)
        ));

        // First record untouched
        let unchanged = repo.find_by_id(first.id).await.unwrap().unwrap();
        assert_eq!(unchanged.name, "First");
    }

    #[tokio::test]
    #[ignore = "requires running PostgreSQL database"]
    async fn test_set_and_clear_refresh_token() {
        let pool = create_test_pool().await;
        let repo = UserRepository::new(pool);

        let user = repo
            .create("Token User", "token_user@example.com", "password")
            .await
            .unwrap();

        repo.set_refresh_token(user.id, Some("token-a")).await.unwrap();
        let stored = repo.find_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(stored.refresh_token.as_deref(), Some("token-a"));

        // Rotation overwrites the previous value
        repo.set_refresh_token(user.id, Some("token-b")).await.unwrap();
        let stored = repo.find_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(stored.refresh_token.as_deref(), Some("token-b"));

        // Logout by value clears it; stale values are a no-op
        assert_eq!(repo.clear_refresh_token_by_value("token-a").await.unwrap(), 0);
        assert_eq!(repo.clear_refresh_token_by_value("token-b").await.unwrap(), 1);
        let stored = repo.find_by_id(user.id).await.unwrap().unwrap();
        assert!(stored.refresh_token.is_none());
    }

    #[tokio::test]
    #[ignore = "requires running PostgreSQL database"]
    async fn test_authenticate() {
        let pool = create_test_pool().await;
        let repo = UserRepository::new(pool);

        let user = repo
            .create("Auth User", "auth@example.com", "correct_password")
            .await
            .unwrap();

        let ok = repo
            .authenticate("auth@example.com", "correct_password")
            .await
            .unwrap();
        assert_eq!(ok.unwrap().id, user.id);

        let wrong = repo
            .authenticate("auth@example.com", "wrong_password")
            .await
            .unwrap();
        assert!(wrong.is_none());

        let unknown = repo
            .authenticate("nobody@example.com", "correct_password")
            .await
            .unwrap();
        assert!(unknown.is_none());
    }

    async fn create_test_pool() -> PgPool {
        use crate::core::db::pool::{DbConfig, create_pool};

        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");
        create_pool(&DbConfig::new(url))
            .await
            .expect("Failed to create test pool")
    }
}
