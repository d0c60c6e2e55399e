use crate::utils::dates::parse_local_offset;
use chrono::FixedOffset;

#[derive(Debug, Clone, PartialEq)]
pub enum StorageBackend {
    /// In-memory repositories seeded with sample data ("mock mode").
    Memory,
    MongoDB { url: String },
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_hours: i64,
}

/// Spreadsheet web-app endpoint used as the roster store.
#[derive(Debug, Clone)]
pub struct SheetsConfig {
    pub api_url: String,
    pub api_key: String,
}

#[derive(Debug, Clone)]
pub struct QrConfig {
    pub ttl_secs: i64,
    /// Reject clock-ins that do not present a valid hospital QR token.
    pub required: bool,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub storage: StorageBackend,
    pub jwt: JwtConfig,
    pub bcrypt_cost: u32,
    pub local_offset: FixedOffset,
    pub qr: QrConfig,
    pub sheets: Option<SheetsConfig>,
    pub cors_origins: Vec<String>,
    pub seed_admin: Option<(String, String)>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup (environment, test map).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let flag = |key: &str| {
            get(key)
                .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
                .unwrap_or(false)
        };

        let host = get("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = get("PORT")
            .unwrap_or_else(|| "3000".to_string())
            .parse::<u16>()
            .map_err(|e| format!("PORT must be a valid port number: {}", e))?;

        let storage = if flag("USE_MOCK") {
            StorageBackend::Memory
        } else {
            let url = get("DATABASE_URL")
                .ok_or_else(|| "DATABASE_URL must be set (or USE_MOCK=true)".to_string())?;
            StorageBackend::MongoDB { url }
        };

        let jwt = JwtConfig {
            secret: get("JWT_SECRET").unwrap_or_else(|| "default-secret-change-me".to_string()),
            issuer: get("JWT_ISSUER").unwrap_or_else(|| "shift-attendance-service".to_string()),
            audience: get("JWT_AUDIENCE").unwrap_or_else(|| "shift-attendance-api".to_string()),
            ttl_hours: parse_number(get("JWT_TTL_HOURS"), "JWT_TTL_HOURS", 24)?,
        };

        let bcrypt_cost: u32 = parse_number(get("BCRYPT_COST"), "BCRYPT_COST", bcrypt::DEFAULT_COST)?;
        if !(4..=31).contains(&bcrypt_cost) {
            return Err(format!("BCRYPT_COST must be between 4 and 31, got {}", bcrypt_cost));
        }

        let local_offset = parse_local_offset(&get("LOCAL_UTC_OFFSET").unwrap_or_default())?;

        let qr = QrConfig {
            ttl_secs: parse_number(get("QR_TOKEN_TTL_SECS"), "QR_TOKEN_TTL_SECS", 300)?,
            required: flag("QR_REQUIRED"),
        };

        let sheets = match get("ASSIGNMENT_STORE").as_deref() {
            None | Some("primary") => None,
            Some("sheets") => Some(SheetsConfig {
                api_url: get("SHEETS_API_URL")
                    .ok_or_else(|| "SHEETS_API_URL must be set when ASSIGNMENT_STORE=sheets".to_string())?,
                api_key: get("SHEETS_API_KEY").unwrap_or_default(),
            }),
            Some(other) => {
                return Err(format!(
                    "Invalid ASSIGNMENT_STORE: {}. Supported: primary, sheets",
                    other
                ))
            }
        };

        let cors_origins = get("CORS_ORIGINS")
            .map(|v| {
                v.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_else(|| {
                vec![
                    "http://localhost:8100".to_string(), // Ionic dev server
                    "http://localhost:4200".to_string(),
                    "capacitor://localhost".to_string(),
                ]
            });

        let seed_admin = match (get("SEED_ADMIN_EMAIL"), get("SEED_ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some((email, password)),
            (None, None) => None,
            _ => return Err("SEED_ADMIN_EMAIL and SEED_ADMIN_PASSWORD must be set together".to_string()),
        };

        Ok(Self {
            host,
            port,
            storage,
            jwt,
            bcrypt_cost,
            local_offset,
            qr,
            sheets,
            cors_origins,
            seed_admin,
        })
    }

    pub fn is_mock(&self) -> bool {
        self.storage == StorageBackend::Memory
    }
}

fn parse_number<T: std::str::FromStr>(raw: Option<String>, key: &str, default: T) -> Result<T, String>
where
    T::Err: std::fmt::Display,
{
    match raw {
        Some(v) => v.parse::<T>().map_err(|e| format!("{} is invalid: {}", key, e)),
        None => Ok(default),
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> AppConfig {
    AppConfig::from_lookup(|key| match key {
        "USE_MOCK" => Some("true".to_string()),
        "BCRYPT_COST" => Some("4".to_string()),
        "JWT_SECRET" => Some("test-secret".to_string()),
        _ => None,
    })
    .expect("test configuration is valid")
}
