// rest_api/src/config.rs

use std::env;

/// Public clinic details served by the website endpoints.
#[derive(Debug, Clone)]
pub struct ClinicInfo {
    pub name: String,
    pub address: String,
    pub phone: String,
    pub hours: String,
    pub about: String,
}

/// Credentials used to create the first admin account when the staff
/// table is empty at startup.
#[derive(Debug, Clone)]
pub struct BootstrapAdmin {
    pub name: String,
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Immutable process configuration, read once at startup and passed
/// explicitly to the components that need it.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_path: String,
    pub jwt_secret: String,
    pub jwt_expire_minutes: i64,
    pub environment: String,
    pub allowed_origins: Vec<String>,
    pub clinic: ClinicInfo,
    pub bootstrap_admin: BootstrapAdmin,
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

impl AppConfig {
    /// Builds the configuration from the environment, falling back to
    /// development defaults. `.env` loading (dotenvy) happens in `main`
    /// before this is called.
    pub fn from_env() -> Self {
        let port = env_or("PORT", "8000").parse().unwrap_or(8000);
        let jwt_expire_minutes = env_or("JWT_EXPIRE_MINUTES", "60").parse().unwrap_or(60);
        let allowed_origins = env_or("ALLOWED_ORIGINS", "http://localhost:3000")
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        AppConfig {
            host: env_or("HOST", "127.0.0.1"),
            port,
            database_path: env_or("DATABASE_PATH", "clinic.db"),
            jwt_secret: env_or("JWT_SECRET", "dev_secret_key"),
            jwt_expire_minutes,
            environment: env_or("ENVIRONMENT", "development"),
            allowed_origins,
            clinic: ClinicInfo {
                name: env_or("CLINIC_NAME", "Riverside Pet Clinic"),
                address: env_or("CLINIC_ADDRESS", "123 Main Street, Cityville"),
                phone: env_or("CLINIC_PHONE", "+1 555 0100"),
                hours: env_or("CLINIC_HOURS", "Mon-Sat 9 AM - 7 PM"),
                about: env_or(
                    "CLINIC_ABOUT",
                    "Trusted veterinary care for your beloved pets. We offer \
                     consultations, vaccinations, surgeries, grooming, and 24/7 \
                     emergency services.",
                ),
            },
            bootstrap_admin: BootstrapAdmin {
                name: env_or("ADMIN_NAME", "Administrator"),
                username: env_or("ADMIN_USERNAME", "admin"),
                email: env_or("ADMIN_EMAIL", "admin@clinic.local"),
                password: env_or("ADMIN_PASSWORD", "ChangeMe!1"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = AppConfig::from_env();
        assert!(!config.jwt_secret.is_empty());
        assert!(config.jwt_expire_minutes > 0);
        assert!(!config.allowed_origins.is_empty());
    }
}
