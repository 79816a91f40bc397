// config.rs
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseType {
    Postgres,
    Memory,
}

impl FromStr for DatabaseType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(DatabaseType::Postgres),
            "memory" => Ok(DatabaseType::Memory),
            other => Err(format!("unsupported DATABASE_TYPE: {}", other)),
        }
    }
}

/// Who may read and write ticket comments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommentVisibility {
    /// Anyone allowed to view the ticket.
    #[default]
    Participants,
    /// Admins and the assigned master only.
    StaffOnly,
}

impl FromStr for CommentVisibility {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "participants" => Ok(CommentVisibility::Participants),
            "staff_only" => Ok(CommentVisibility::StaffOnly),
            other => Err(format!("unsupported COMMENT_VISIBILITY: {}", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_type: DatabaseType,
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub jwt_maxage: i64,
    pub port: u16,
    pub enable_notifications: bool,
    pub comment_visibility: CommentVisibility,
    pub seed_demo_users: bool,
}

fn env_flag(name: &str, default: bool) -> bool {
    std::env::var(name)
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}

impl Config {
    pub fn init() -> Result<Config, String> {
        let database_type = std::env::var("DATABASE_TYPE")
            .unwrap_or_else(|_| "postgres".to_string())
            .parse::<DatabaseType>()?;

        let database_url = std::env::var("DATABASE_URL").ok();
        if database_type == DatabaseType::Postgres && database_url.is_none() {
            return Err("DATABASE_URL must be set".to_string());
        }

        let jwt_secret = std::env::var("JWT_SECRET_KEY")
            .map_err(|_| "JWT_SECRET_KEY must be set".to_string())?;

        let jwt_maxage = std::env::var("JWT_MAXAGE")
            .unwrap_or_else(|_| "60".to_string())
            .parse::<i64>()
            .map_err(|e| format!("JWT_MAXAGE: {}", e))?;

        let port = std::env::var("PORT")
            .unwrap_or_else(|_| "8000".to_string())
            .parse::<u16>()
            .map_err(|e| format!("PORT: {}", e))?;

        let comment_visibility = match std::env::var("COMMENT_VISIBILITY") {
            Ok(value) => value.parse::<CommentVisibility>()?,
            Err(_) => CommentVisibility::default(),
        };

        Ok(Config {
            database_type,
            database_url,
            jwt_secret,
            jwt_maxage,
            port,
            enable_notifications: env_flag("ENABLE_NOTIFICATIONS", true),
            comment_visibility,
            seed_demo_users: env_flag("SEED_DEMO_USERS", false),
        })
    }

    /// In-memory settings for tests.
    #[cfg(test)]
    pub fn for_tests() -> Config {
        Config {
            database_type: DatabaseType::Memory,
            database_url: None,
            jwt_secret: "test-secret".to_string(),
            jwt_maxage: 60,
            port: 8000,
            enable_notifications: true,
            comment_visibility: CommentVisibility::Participants,
            seed_demo_users: false,
        }
    }
}
