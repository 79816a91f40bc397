// service/auth_service.rs
use std::sync::Arc;

use crate::{
    db::Storage,
    models::usermodel::{NewUser, User, UserRole},
    service::error::ServiceError,
    utils::password,
};

struct DemoUser {
    username: &'static str,
    password: &'static str,
    full_name: &'static str,
    role: UserRole,
    email: &'static str,
    phone: &'static str,
}

const DEMO_USERS: &[DemoUser] = &[
    DemoUser {
        username: "admin",
        password: "admin123",
        full_name: "System Administrator",
        role: UserRole::Admin,
        email: "admin@company.com",
        phone: "+79990000000",
    },
    DemoUser {
        username: "manager",
        password: "manager123",
        full_name: "Manager Ivanov",
        role: UserRole::Manager,
        email: "manager@company.com",
        phone: "+79990000001",
    },
    DemoUser {
        username: "master1",
        password: "master123",
        full_name: "Master Petrov",
        role: UserRole::Master,
        email: "master@company.com",
        phone: "+79990000002",
    },
    DemoUser {
        username: "master2",
        password: "master123",
        full_name: "Master Sidorov",
        role: UserRole::Master,
        email: "master2@company.com",
        phone: "+79990000004",
    },
    DemoUser {
        username: "client1",
        password: "client123",
        full_name: "Client Sidorov",
        role: UserRole::Client,
        email: "client@company.com",
        phone: "+79990000003",
    },
];

#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn Storage>,
}

impl AuthService {
    pub fn new(store: Arc<dyn Storage>) -> Self {
        Self { store }
    }

    /// Loads the user by username and checks the password against the stored
    /// hash. Unknown users and wrong passwords both yield `None`.
    pub async fn get_user_by_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<User>, ServiceError> {
        let Some(user) = self.store.get_user_by_username(username).await? else {
            return Ok(None);
        };

        let matched = password::compare(password, &user.password).unwrap_or_else(|e| {
            tracing::warn!("password check for {} failed: {}", username, e.to_string());
            false
        });

        Ok(matched.then_some(user))
    }

    pub async fn get_user(&self, user_id: i64) -> Result<Option<User>, ServiceError> {
        Ok(self.store.get_user_by_id(user_id).await?)
    }

    pub async fn masters(&self) -> Result<Vec<User>, ServiceError> {
        Ok(self.store.get_users_by_role(UserRole::Master).await?)
    }

    pub async fn register_client(
        &self,
        username: String,
        password: &str,
        full_name: String,
        email: Option<String>,
        phone: Option<String>,
    ) -> Result<User, ServiceError> {
        self.create_user(NewUserRequest {
            username,
            password,
            full_name,
            role: UserRole::Client,
            email,
            phone,
        })
        .await
    }

    async fn create_user(&self, request: NewUserRequest<'_>) -> Result<User, ServiceError> {
        if self
            .store
            .get_user_by_username(&request.username)
            .await?
            .is_some()
        {
            return Err(ServiceError::UsernameTaken(request.username));
        }

        let hashed = password::hash(request.password)
            .map_err(|e| ServiceError::Validation(e.to_string()))?;

        let user = self
            .store
            .save_user(NewUser {
                username: request.username,
                password: hashed,
                full_name: request.full_name,
                role: request.role,
                email: request.email,
                phone: request.phone,
            })
            .await?;

        tracing::info!("user {} ({}) created as {}", user.username, user.id, user.role.to_str());

        Ok(user)
    }

    /// Creates the demo accounts unless an admin already exists. Returns how
    /// many users were created.
    pub async fn seed_demo_users(&self) -> Result<usize, ServiceError> {
        if !self.store.get_users_by_role(UserRole::Admin).await?.is_empty() {
            tracing::debug!("admin present, skipping demo users");
            return Ok(0);
        }

        let mut created = 0;
        for demo in DEMO_USERS {
            match self
                .create_user(NewUserRequest {
                    username: demo.username.to_string(),
                    password: demo.password,
                    full_name: demo.full_name.to_string(),
                    role: demo.role,
                    email: Some(demo.email.to_string()),
                    phone: Some(demo.phone.to_string()),
                })
                .await
            {
                Ok(_) => created += 1,
                Err(ServiceError::UsernameTaken(username)) => {
                    tracing::debug!("demo user {} already exists", username)
                }
                Err(e) => return Err(e),
            }
        }

        tracing::info!("seeded {} demo users", created);

        Ok(created)
    }
}

struct NewUserRequest<'a> {
    username: String,
    password: &'a str,
    full_name: String,
    role: UserRole,
    email: Option<String>,
    phone: Option<String>,
}
