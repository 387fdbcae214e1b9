use anyhow::{anyhow, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordConfig {
    pub min_length: usize,
    pub max_length: usize,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            min_length: 8,
            max_length: 128,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Argon2Config {
    pub memory_cost_kib: u32,
    pub time_cost: u32,
    pub parallelism: u32,
}

impl Default for Argon2Config {
    fn default() -> Self {
        Self {
            memory_cost_kib: 19456,
            time_cost: 2,
            parallelism: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PasswordIssue {
    TooShort { min: usize, actual: usize },
    TooLong { max: usize, actual: usize },
    CommonPassword,
    ContainsEmail,
}

impl PasswordIssue {
    pub fn message(&self) -> String {
        match self {
            Self::TooShort { min, actual } => {
                format!("Password must be at least {min} characters (currently {actual})")
            }
            Self::TooLong { max, actual } => {
                format!("Password must be at most {max} characters (currently {actual})")
            }
            Self::CommonPassword => "This password is too common and easily guessed".into(),
            Self::ContainsEmail => "Password must not contain your email address".into(),
        }
    }
}

pub struct PasswordService {
    argon2: Argon2<'static>,
    config: PasswordConfig,
}

impl PasswordService {
    pub fn new(argon2_config: Argon2Config, password_config: PasswordConfig) -> Result<Self> {
        let params = Params::new(
            argon2_config.memory_cost_kib,
            argon2_config.time_cost,
            argon2_config.parallelism,
            None,
        )
        .map_err(|e| anyhow!("Invalid Argon2 parameters: {e}"))?;

        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
            config: password_config,
        })
    }

    pub fn with_defaults() -> Result<Self> {
        Self::new(Argon2Config::default(), PasswordConfig::default())
    }

    /// Salted Argon2id hash in PHC string format.
    pub fn hash(&self, password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| anyhow!("Failed to hash password: {e}"))?;

        Ok(hash.to_string())
    }

    pub fn verify(&self, password: &str, hash: &str) -> Result<bool> {
        let parsed_hash =
            PasswordHash::new(hash).map_err(|e| anyhow!("Invalid password hash format: {e}"))?;

        match self.argon2.verify_password(password.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(anyhow!("Password verification failed: {e}")),
        }
    }

    pub fn validate(&self, password: &str, email: Option<&str>) -> Vec<PasswordIssue> {
        let mut issues = Vec::new();
        let length = password.chars().count();

        if length < self.config.min_length {
            issues.push(PasswordIssue::TooShort {
                min: self.config.min_length,
                actual: length,
            });
        }
        if length > self.config.max_length {
            issues.push(PasswordIssue::TooLong {
                max: self.config.max_length,
                actual: length,
            });
        }
        if is_common_password(password) {
            issues.push(PasswordIssue::CommonPassword);
        }
        if let Some(email) = email {
            let local = email.split('@').next().unwrap_or_default().to_lowercase();
            if local.len() >= 4 && password.to_lowercase().contains(&local) {
                issues.push(PasswordIssue::ContainsEmail);
            }
        }

        issues
    }
}

fn is_common_password(password: &str) -> bool {
    const COMMON: &[&str] = &[
        "password",
        "password1",
        "password123",
        "12345678",
        "123456789",
        "1234567890",
        "qwerty123",
        "qwertyuiop",
        "iloveyou",
        "letmein1",
        "welcome1",
        "admin123",
        "abc12345",
        "11111111",
        "00000000",
    ];
    let lower = password.to_lowercase();
    COMMON.contains(&lower.as_str())
}

pub fn hash_password(password: &str) -> Result<String> {
    PasswordService::with_defaults()?.hash(password)
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    PasswordService::with_defaults()?.verify(password, hash)
}

/// First problem found, phrased for an API client.
pub fn validate_password(password: &str, email: Option<&str>) -> Option<String> {
    PasswordService::with_defaults()
        .ok()?
        .validate(password, email)
        .first()
        .map(PasswordIssue::message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let service = PasswordService::with_defaults().expect("Failed to create service");
        let hash = service.hash("correct horse battery").expect("Failed to hash");

        assert!(hash.starts_with("$argon2id$"));
        assert!(service.verify("correct horse battery", &hash).expect("Verify failed"));
        assert!(!service.verify("wrong horse battery", &hash).expect("Verify failed"));
    }

    #[test]
    fn test_hashes_are_salted() {
        let a = hash_password("same-password").expect("hash");
        let b = hash_password("same-password").expect("hash");
        assert_ne!(a, b);
        assert!(verify_password("same-password", &a).expect("verify"));
        assert!(verify_password("same-password", &b).expect("verify"));
    }

    #[test]
    fn test_invalid_hash_format() {
        assert!(verify_password("whatever", "not-a-phc-string").is_err());
    }

    #[test]
    fn test_too_short() {
        let service = PasswordService::with_defaults().expect("Failed to create service");
        let issues = service.validate("short", None);
        assert!(issues
            .iter()
            .any(|i| matches!(i, PasswordIssue::TooShort { min: 8, actual: 5 })));
    }

    #[test]
    fn test_too_long() {
        let service = PasswordService::with_defaults().expect("Failed to create service");
        let long = "x".repeat(129);
        assert!(service
            .validate(&long, None)
            .iter()
            .any(|i| matches!(i, PasswordIssue::TooLong { .. })));
    }

    #[test]
    fn test_common_password() {
        assert_eq!(
            validate_password("Password123", None),
            Some(PasswordIssue::CommonPassword.message())
        );
    }

    #[test]
    fn test_contains_email() {
        let service = PasswordService::with_defaults().expect("Failed to create service");
        let issues = service.validate("grace.hopper-2024", Some("grace.hopper@navy.mil"));
        assert_eq!(issues, vec![PasswordIssue::ContainsEmail]);
    }

    #[test]
    fn test_acceptable_password() {
        assert_eq!(validate_password("tidal-orbit-lantern", Some("ada@example.com")), None);
    }
}
