//! Password hashing, verification and strength policy.
//!
//! Hashes are Argon2id PHC strings with OWASP-recommended parameters
//! (memory: 19 MiB, iterations: 2, parallelism: 1). An optional pepper is
//! prepended to the password before hashing and verification.

use std::fmt;

use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHasher, PasswordVerifier};

use crate::error::AuthError;

/// Passwords rejected regardless of composition. Compared
/// case-insensitively.
const WEAK_PASSWORDS: &[&str] = &[
    "123456",
    "12345678",
    "123456789",
    "1234567890",
    "password",
    "password1",
    "password123",
    "password123!",
    "p@ssw0rd",
    "p@ssw0rd123",
    "p@ssword123",
    "qwerty",
    "qwerty123",
    "qwerty@123",
    "abc123",
    "abc@123456",
    "admin",
    "admin123",
    "admin@123",
    "admin@12345",
    "administrator",
    "letmein",
    "welcome",
    "welcome123",
    "welcome@123",
    "iloveyou",
    "changeme",
    "changeme123!",
    "senha",
    "senha123",
    "senha@123",
    "mudar@123",
    "mudar123",
    "brasil@2024",
    "brasil@2025",
    "brasil@2026",
    "passw0rd!",
    "trustno1",
    "sunshine",
    "football",
    "monkey",
    "dragon",
];

fn peppered_input<'a>(password: &'a str, pepper: Option<&str>, buf: &'a mut String) -> &'a [u8] {
    match pepper {
        Some(p) => {
            *buf = format!("{p}{password}");
            buf.as_bytes()
        }
        None => password.as_bytes(),
    }
}

fn argon2id() -> Result<Argon2<'static>, AuthError> {
    // OWASP ASVS recommended: m=19456 (19 MiB), t=2, p=1
    let params = argon2::Params::new(19456, 2, 1, None)
        .map_err(|e| AuthError::Crypto(format!("argon2 params error: {e}")))?;
    Ok(Argon2::new(
        argon2::Algorithm::Argon2id,
        argon2::Version::V0x13,
        params,
    ))
}

/// Hash a password with Argon2id. The salt is randomly generated for
/// each call.
pub fn hash_password(password: &str, pepper: Option<&str>) -> Result<String, AuthError> {
    let mut buf = String::new();
    let input = peppered_input(password, pepper, &mut buf);

    let salt_bytes: [u8; 16] = rand::random();
    let salt = SaltString::encode_b64(&salt_bytes)
        .map_err(|e| AuthError::Crypto(format!("salt encode error: {e}")))?;

    argon2id()?
        .hash_password(input, &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Crypto(format!("password hash error: {e}")))
}

/// Verify a plaintext password against an Argon2id PHC-format hash.
///
/// Returns `Ok(true)` on match, `Ok(false)` on mismatch, or
/// `Err(AuthError::Crypto)` if the stored hash is malformed.
pub fn verify_password(
    password: &str,
    hash: &str,
    pepper: Option<&str>,
) -> Result<bool, AuthError> {
    let mut buf = String::new();
    let input = peppered_input(password, pepper, &mut buf);

    let parsed_hash = argon2::PasswordHash::new(hash)
        .map_err(|e| AuthError::Crypto(format!("invalid hash format: {e}")))?;

    match Argon2::default().verify_password(input, &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AuthError::Crypto(format!("verify error: {e}"))),
    }
}

/// A single reason a password was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyViolation {
    TooShort { min: usize },
    TooFewCharacterClasses { found: usize, required: usize },
    CommonPassword,
}

impl fmt::Display for PolicyViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyViolation::TooShort { min } => {
                write!(f, "must be at least {min} characters long")
            }
            PolicyViolation::TooFewCharacterClasses { found, required } => write!(
                f,
                "must mix at least {required} of uppercase, lowercase, digits and symbols \
                 (found {found})"
            ),
            PolicyViolation::CommonPassword => write!(f, "is too common"),
        }
    }
}

/// Character classes a password must mix.
pub const REQUIRED_CHARACTER_CLASSES: usize = 3;

/// Check a candidate password against the strength policy: minimum
/// length, at least three of {uppercase, lowercase, digit, symbol}, and
/// not on the weak-password list. Every violation is reported.
pub fn validate_password_strength(password: &str, min_length: usize) -> Result<(), AuthError> {
    let mut violations = Vec::new();

    if password.chars().count() < min_length {
        violations.push(PolicyViolation::TooShort { min: min_length });
    }

    let classes = [
        password.chars().any(|c| c.is_uppercase()),
        password.chars().any(|c| c.is_lowercase()),
        password.chars().any(|c| c.is_ascii_digit()),
        password
            .chars()
            .any(|c| !c.is_alphanumeric() && !c.is_whitespace()),
    ]
    .into_iter()
    .filter(|present| *present)
    .count();
    if classes < REQUIRED_CHARACTER_CLASSES {
        violations.push(PolicyViolation::TooFewCharacterClasses {
            found: classes,
            required: REQUIRED_CHARACTER_CLASSES,
        });
    }

    let lowered = password.to_lowercase();
    if WEAK_PASSWORDS.contains(&lowered.as_str()) {
        violations.push(PolicyViolation::CommonPassword);
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(AuthError::WeakPassword(violations))
    }
}
