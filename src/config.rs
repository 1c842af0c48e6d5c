use anyhow::{Context, Result};
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub max_connections: u32,
    pub host: String,
    pub port: u16,
    pub teacher_registration_code: String,
    pub default_loan_days: i64,
    pub utc_offset_hours: i32,
    pub personal_use: PersonalUsePolicy,
    pub email_domain: String,
    pub seed_defaults: bool,
}

/// The teacher/subject pair whose booking requests must carry a reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonalUsePolicy {
    pub teacher: String,
    pub subject: String,
}

impl PersonalUsePolicy {
    pub fn applies_to(&self, teacher: &str, subject: &str) -> bool {
        self.teacher == teacher && self.subject == subject
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            database_url: "sqlite:portal.db".to_string(),
            max_connections: 5,
            host: "0.0.0.0".to_string(),
            port: 5000,
            teacher_registration_code: "AMACC2025".to_string(),
            default_loan_days: 7,
            utc_offset_hours: 8,
            personal_use: PersonalUsePolicy {
                teacher: "admin".to_string(),
                subject: "Personal Use".to_string(),
            },
            email_domain: "amacc_lipa.com".to_string(),
            seed_defaults: true,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup, falling back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        let database_url = lookup("DATABASE_URL").unwrap_or(defaults.database_url);
        let max_connections =
            parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", defaults.max_connections)?;
        let host = lookup("HOST").unwrap_or(defaults.host);
        let port = parse_or(&lookup, "PORT", defaults.port)?;
        let teacher_registration_code =
            lookup("TEACHER_REGISTRATION_CODE").unwrap_or(defaults.teacher_registration_code);
        let default_loan_days = parse_or(&lookup, "DEFAULT_LOAN_DAYS", defaults.default_loan_days)?;
        if default_loan_days < 1 {
            return Err(anyhow::anyhow!("DEFAULT_LOAN_DAYS must be at least 1"));
        }
        let utc_offset_hours =
            parse_or(&lookup, "PORTAL_UTC_OFFSET_HOURS", defaults.utc_offset_hours)?;
        if !(-12..=14).contains(&utc_offset_hours) {
            return Err(anyhow::anyhow!(
                "PORTAL_UTC_OFFSET_HOURS must be between -12 and 14"
            ));
        }

        let personal_use = PersonalUsePolicy {
            teacher: lookup("PERSONAL_USE_TEACHER").unwrap_or(defaults.personal_use.teacher),
            subject: lookup("PERSONAL_USE_SUBJECT").unwrap_or(defaults.personal_use.subject),
        };

        let email_domain = lookup("EMAIL_DOMAIN").unwrap_or(defaults.email_domain);
        let seed_defaults = parse_or(&lookup, "SEED_DEFAULTS", defaults.seed_defaults)?;

        Ok(Config {
            database_url,
            max_connections,
            host,
            port,
            teacher_registration_code,
            default_loan_days,
            utc_offset_hours,
            personal_use,
            email_domain,
            seed_defaults,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value: {raw}")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_lookup_yields_defaults() {
        let config = Config::from_lookup(|_| None).unwrap();
        assert_eq!(config.port, 5000);
        assert_eq!(config.default_loan_days, 7);
        assert_eq!(config.personal_use.teacher, "admin");
        assert_eq!(config.server_address(), "0.0.0.0:5000");
    }

    #[test]
    fn overrides_are_parsed() {
        let config = Config::from_lookup(lookup_from(&[
            ("PORT", "8080"),
            ("DEFAULT_LOAN_DAYS", "14"),
            ("SEED_DEFAULTS", "false"),
            ("PERSONAL_USE_SUBJECT", "Self Study"),
        ]))
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.default_loan_days, 14);
        assert!(!config.seed_defaults);
        assert!(config.personal_use.applies_to("admin", "Self Study"));
        assert!(!config.personal_use.applies_to("admin", "Personal Use"));
    }

    #[test]
    fn invalid_numbers_are_rejected() {
        assert!(Config::from_lookup(lookup_from(&[("PORT", "eighty")])).is_err());
        assert!(Config::from_lookup(lookup_from(&[("DEFAULT_LOAN_DAYS", "0")])).is_err());
        assert!(Config::from_lookup(lookup_from(&[("PORTAL_UTC_OFFSET_HOURS", "20")])).is_err());
    }
}
