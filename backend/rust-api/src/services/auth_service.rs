use anyhow::{anyhow, Context};
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::Utc;
use mongodb::bson::{doc, oid::ObjectId};
use mongodb::Database;

use crate::middlewares::auth::{JwtClaims, JwtService};
use crate::models::user::{AuthResponse, LoginRequest, RegisterRequest, User, UserProfile};
use crate::services::ServiceError;
use crate::utils::time::chrono_to_bson;

pub struct AuthService {
    mongo: Database,
    jwt_service: JwtService,
    access_token_ttl_seconds: i64,
}

impl AuthService {
    pub fn new(mongo: Database, jwt_service: JwtService) -> Self {
        let access_token_ttl_seconds = std::env::var("JWT_ACCESS_TOKEN_TTL_SECONDS")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(86400); // Default: 24 hours

        Self {
            mongo,
            jwt_service,
            access_token_ttl_seconds,
        }
    }

    pub fn hash_password(&self, password: &str) -> Result<String, ServiceError> {
        Ok(hash(password, DEFAULT_COST).context("Failed to hash password")?)
    }

    pub fn verify_password(&self, password: &str, hash: &str) -> Result<bool, ServiceError> {
        Ok(verify(password, hash).context("Failed to verify password")?)
    }

    /// Register a new reader; level defaults to beginner when the payload
    /// does not name one.
    pub async fn register(&self, req: RegisterRequest) -> Result<AuthResponse, ServiceError> {
        let users = self.mongo.collection::<User>("users");

        let existing = users
            .find_one(doc! { "email": &req.email })
            .await
            .context("Failed to check existing user")?;
        if existing.is_some() {
            return Err(ServiceError::conflict(
                "User with this email already exists",
            ));
        }

        let password_hash = self.hash_password(&req.password)?;

        let now = Utc::now();
        let user = User {
            id: None, // MongoDB will generate
            email: req.email,
            password_hash,
            name: req.name,
            age: req.age,
            level: req.level.unwrap_or_default(),
            created_at: now,
            updated_at: now,
            last_login_at: None,
        };

        let insert_result = users
            .insert_one(&user)
            .await
            .context("Failed to insert user")?;
        let user_id = insert_result
            .inserted_id
            .as_object_id()
            .ok_or_else(|| anyhow!("Failed to get inserted user ID"))?;

        let access_token = self.generate_access_token(&user_id, &user)?;

        let mut user_with_id = user;
        user_with_id.id = Some(user_id);

        Ok(AuthResponse {
            access_token,
            user: UserProfile::from(user_with_id),
        })
    }

    pub async fn login(&self, req: LoginRequest) -> Result<AuthResponse, ServiceError> {
        let users = self.mongo.collection::<User>("users");

        let user = users
            .find_one(doc! { "email": &req.email })
            .await
            .context("Failed to query user")?
            .ok_or_else(|| ServiceError::invalid_input("Invalid email or password"))?;

        if !self.verify_password(&req.password, &user.password_hash)? {
            return Err(ServiceError::invalid_input("Invalid email or password"));
        }

        let user_id = user
            .id
            .ok_or_else(|| anyhow!("Stored user is missing an id"))?;

        users
            .update_one(
                doc! { "_id": user_id },
                doc! { "$set": { "lastLoginAt": chrono_to_bson(Utc::now()) } },
            )
            .await
            .context("Failed to record login time")?;

        let access_token = self.generate_access_token(&user_id, &user)?;

        Ok(AuthResponse {
            access_token,
            user: UserProfile::from(user),
        })
    }

    pub async fn get_profile(&self, user_id: &ObjectId) -> Result<UserProfile, ServiceError> {
        let user = self.load_user(user_id).await?;
        Ok(UserProfile::from(user))
    }

    pub async fn load_user(&self, user_id: &ObjectId) -> Result<User, ServiceError> {
        let users = self.mongo.collection::<User>("users");
        users
            .find_one(doc! { "_id": user_id })
            .await
            .context("Failed to query user")?
            .ok_or_else(|| ServiceError::not_found("User not found"))
    }

    fn generate_access_token(
        &self,
        user_id: &ObjectId,
        user: &User,
    ) -> Result<String, ServiceError> {
        let now = Utc::now().timestamp();
        let claims = JwtClaims {
            sub: user_id.to_hex(),
            level: user.level,
            exp: (now + self.access_token_ttl_seconds) as usize,
            iat: now as usize,
        };

        self.jwt_service
            .generate_token(claims)
            .map_err(|e| ServiceError::Internal(anyhow!("Failed to generate token: {}", e)))
    }
}
