use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};

use tankgame_db::Database;
use tankgame_types::Envelope;
use tankgame_types::api::{LoginRequest, RegisterRequest};
use tankgame_types::models::{LoginData, SystemAccount};

use crate::error::{ServiceError, respond, respond_empty};

/// Hashes the password with Argon2id and stores the user.
///
/// There is no uniqueness pre-check: a taken email comes back as the
/// driver's constraint error.
pub fn register(db: &Database, req: &RegisterRequest) -> Envelope<()> {
    respond_empty("register", try_register(db, req), "Registration successful")
}

fn try_register(db: &Database, req: &RegisterRequest) -> Result<(), ServiceError> {
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|e| ServiceError::Hash(e.to_string()))?
        .to_string();

    db.register_user(&req.email, &password_hash)?;
    Ok(())
}

/// Returns the user (without its hash) and roles, or 403 with the same
/// message for an unknown email and a wrong password.
pub fn login(db: &Database, req: &LoginRequest) -> Envelope<LoginData> {
    respond("login", try_login(db, req), "success")
}

fn try_login(db: &Database, req: &LoginRequest) -> Result<LoginData, ServiceError> {
    let user = db
        .get_user_by_email(&req.email)?
        .ok_or(ServiceError::InvalidCredentials)?;

    // The system account's stored hash is deliberately unparseable
    let parsed_hash =
        PasswordHash::new(&user.password).map_err(|_| ServiceError::InvalidCredentials)?;

    Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .map_err(|_| ServiceError::InvalidCredentials)?;

    let roles = db.get_roles(user.id)?;

    Ok(LoginData {
        user: user.into_user(),
        roles,
    })
}

pub fn get_system_user_id(db: &Database) -> Envelope<SystemAccount> {
    respond("get_system_user_id", system_account(db), "success")
}

pub(crate) fn system_account(db: &Database) -> Result<SystemAccount, ServiceError> {
    db.get_system_account()?
        .ok_or(ServiceError::NotFound("system account"))
}
