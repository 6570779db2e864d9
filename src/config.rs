//! Runtime configuration, read from the environment (and `.env`).

use std::net::SocketAddr;
use std::str::FromStr;

use anyhow::{Context, Result};

/// Which logins get the teacher profile merged into their login response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfilePolicy {
    /// Every account that references a teacher row gets the profile.
    AllLogins,
    /// Only accounts with the `teacher` or `admin` role get the profile.
    TeacherAndAdmin,
}

impl ProfilePolicy {
    pub fn includes(&self, role: &str) -> bool {
        match self {
            ProfilePolicy::AllLogins => true,
            ProfilePolicy::TeacherAndAdmin => role == "teacher" || role == "admin",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_address: SocketAddr,
    pub max_connections: u32,
    /// IANA zone used to decide whether a room is occupied right now.
    pub civil_timezone: String,
    /// Initial password given to freshly provisioned teacher accounts.
    pub default_teacher_password: String,
    /// Sign-in page included in the credentials message.
    pub login_url: String,
    /// Teacher images must be hosted under this prefix.
    pub image_host_prefix: String,
    pub profile_policy: ProfilePolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            bind_address: SocketAddr::from(([0, 0, 0, 0], 8080)),
            max_connections: 10,
            civil_timezone: "Africa/Cairo".to_owned(),
            default_teacher_password: "123456".to_owned(),
            login_url: "https://phoenix-center.com/login".to_owned(),
            image_host_prefix: "https://res.cloudinary.com/".to_owned(),
            profile_policy: ProfilePolicy::AllLogins,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let defaults = Config::default();

        let database_url = std::env::var("DATABASE_URL").context("`DATABASE_URL` not set")?;
        let bind_address = match std::env::var("BIND_ADDRESS") {
            Ok(address) => address
                .parse()
                .with_context(|| format!("Invalid `BIND_ADDRESS`: {}", address))?,
            Err(_) => match std::env::var("PORT") {
                Ok(port) => SocketAddr::from((
                    [0, 0, 0, 0],
                    port.parse::<u16>()
                        .with_context(|| format!("Invalid `PORT`: {}", port))?,
                )),
                Err(_) => defaults.bind_address,
            },
        };
        let enrich_all_logins = parse_or("ENRICH_ALL_LOGINS", true)?;

        Ok(Self {
            database_url,
            bind_address,
            max_connections: parse_or("MAX_CONNECTIONS", defaults.max_connections)?,
            civil_timezone: var_or("CIVIL_TIMEZONE", defaults.civil_timezone),
            default_teacher_password: var_or(
                "DEFAULT_TEACHER_PASSWORD",
                defaults.default_teacher_password,
            ),
            login_url: var_or("LOGIN_URL", defaults.login_url),
            image_host_prefix: var_or("IMAGE_HOST_PREFIX", defaults.image_host_prefix),
            profile_policy: if enrich_all_logins {
                ProfilePolicy::AllLogins
            } else {
                ProfilePolicy::TeacherAndAdmin
            },
        })
    }
}

fn var_or(name: &str, default: String) -> String {
    std::env::var(name).unwrap_or(default)
}

fn parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(name) {
        Ok(value) => value
            .parse()
            .with_context(|| format!("Invalid `{}`: {}", name, value)),
        Err(_) => Ok(default),
    }
}
