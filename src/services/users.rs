use crate::{
    auth::{AuthError, AuthService, TokenPair},
    db::DbPool,
    entities::user,
    errors::{map_unique_violation, FieldErrors, ServiceError},
    mailer::{self, Mailer},
};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::Rng;
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{ActiveModelTrait, ActiveValue::Set, EntityTrait, QueryFilter};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Registration input, already deserialized and shape-checked by the handler
#[derive(Debug)]
pub struct RegisterInput {
    pub full_name: String,
    pub phone_number: String,
    pub email: String,
    pub password: String,
}

/// Nested address payload for profile updates
#[derive(Debug, Clone)]
pub struct AddressInput {
    pub address_line_1: String,
    pub address_line_2: Option<String>,
    pub city: String,
    pub country: String,
    pub postcode: String,
}

/// Partial profile update; omitted fields stay unchanged
#[derive(Debug, Default)]
pub struct ProfileChanges {
    pub full_name: Option<String>,
    pub phone_number: Option<String>,
    pub address: Option<AddressInput>,
}

/// Password reset input
#[derive(Debug)]
pub struct ResetPasswordInput {
    pub email: String,
    pub code: String,
    pub password: String,
    pub confirm_password: String,
}

/// Result of an email-verification attempt
pub enum VerifyOutcome {
    /// The account was already verified; nothing changed
    AlreadyVerified,
    /// Verification succeeded; the account is active and logged in
    Verified {
        account: user::Model,
        tokens: TokenPair,
    },
}

/// Result of a resend-verification request
pub enum ResendOutcome {
    AlreadyVerified,
    Sent,
}

/// Service for account lifecycle: registration, verification, login,
/// profile, and password reset
#[derive(Clone)]
pub struct UserService {
    db: Arc<DbPool>,
    auth: Arc<AuthService>,
    mailer: Arc<dyn Mailer>,
}

impl UserService {
    pub fn new(db: Arc<DbPool>, auth: Arc<AuthService>, mailer: Arc<dyn Mailer>) -> Self {
        Self { db, auth, mailer }
    }

    /// Registers a new, inactive account and emails a 4-digit verification
    /// code. Email delivery failure is logged, not surfaced; the caller can
    /// always request a resend.
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn register(&self, input: RegisterInput) -> Result<user::Model, ServiceError> {
        let mut errors = FieldErrors::new();
        validate_full_name(&input.full_name, &mut errors);
        validate_uk_phone(&input.phone_number, &mut errors);
        validate_password(&input.password, &mut errors);
        if !validator::validate_email(input.email.as_str()) {
            errors.add("email", "Enter a valid email address.");
        }
        errors.into_result()?;

        if self.find_by_email(&input.email).await?.is_some() {
            return Err(ServiceError::validation(
                "email",
                "A user with this email already exists.",
            ));
        }

        let code = generate_code();
        let account = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(input.email.clone()),
            full_name: Set(input.full_name.clone()),
            phone_number: Set(input.phone_number.clone()),
            password_hash: Set(hash_password(&input.password)?),
            role: Set(user::ROLE_USER.to_string()),
            is_email_verified: Set(false),
            is_active: Set(false),
            email_verification_token: Set(Some(code.clone())),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await
        .map_err(|e| {
            map_unique_violation(e, "email", "A user with this email already exists.")
        })?;

        if let Err(err) = self
            .mailer
            .send(
                &account.email,
                mailer::VERIFICATION_SUBJECT,
                &mailer::verification_body(&account.full_name, &code),
            )
            .await
        {
            warn!(email = %account.email, error = %err, "verification email failed to send");
        }

        info!(user_id = %account.id, "user registered");
        Ok(account)
    }

    /// Verifies the emailed code. Success activates the account, clears the
    /// code, and signs the user in; the transition happens exactly once.
    #[instrument(skip(self, code))]
    pub async fn verify_email(
        &self,
        email: &str,
        code: &str,
    ) -> Result<VerifyOutcome, ServiceError> {
        let account = self
            .find_by_email(email)
            .await?
            .ok_or_else(|| ServiceError::NotFound("User not found.".to_string()))?;

        if account.is_email_verified {
            return Ok(VerifyOutcome::AlreadyVerified);
        }

        if account.email_verification_token.as_deref() != Some(code) {
            return Err(ServiceError::InvalidInput(
                "Invalid verification code.".to_string(),
            ));
        }

        let mut active: user::ActiveModel = account.into();
        active.is_email_verified = Set(true);
        active.is_active = Set(true);
        active.email_verification_token = Set(None);
        let account = active.update(self.db.as_ref()).await?;

        let tokens = self.auth.generate_token_pair(&account)?;
        info!(user_id = %account.id, "email verified, account activated");
        Ok(VerifyOutcome::Verified { account, tokens })
    }

    /// Regenerates the verification code, overwriting the previous one
    #[instrument(skip(self))]
    pub async fn resend_verification(&self, email: &str) -> Result<ResendOutcome, ServiceError> {
        let account = self
            .find_by_email(email)
            .await?
            .ok_or_else(|| ServiceError::NotFound("User not found.".to_string()))?;

        if account.is_email_verified {
            return Ok(ResendOutcome::AlreadyVerified);
        }

        let code = generate_code();
        let full_name = account.full_name.clone();
        let recipient = account.email.clone();
        let mut active: user::ActiveModel = account.into();
        active.email_verification_token = Set(Some(code.clone()));
        active.update(self.db.as_ref()).await?;

        if let Err(err) = self
            .mailer
            .send(
                &recipient,
                mailer::VERIFICATION_SUBJECT,
                &mailer::verification_body(&full_name, &code),
            )
            .await
        {
            warn!(email = %recipient, error = %err, "verification email failed to send");
        }

        Ok(ResendOutcome::Sent)
    }

    /// Authenticates by email and password. Unverified accounts are refused
    /// with a distinct error so clients can prompt for verification.
    #[instrument(skip(self, password))]
    pub async fn login(
        &self,
        email: &str,
        password: &str,
    ) -> Result<(user::Model, TokenPair), ServiceError> {
        let account = self.find_by_email(email).await?;
        let account = match account {
            Some(account) if verify_password(password, &account.password_hash)? => account,
            _ => return Err(ServiceError::Unauthorized("Invalid credentials".to_string())),
        };

        if !account.is_email_verified {
            return Err(ServiceError::Forbidden(
                "Please verify your email before logging in.".to_string(),
            ));
        }

        let tokens = self.auth.generate_token_pair(&account)?;
        info!(user_id = %account.id, "user logged in");
        Ok((account, tokens))
    }

    /// Rotates a refresh token into a fresh pair, revoking the old one
    #[instrument(skip(self, refresh_token))]
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<TokenPair, ServiceError> {
        let claims = self.auth.validate_token(refresh_token).await?;
        if claims.email.is_some() {
            // An access token was posted where a refresh token belongs.
            return Err(ServiceError::Unauthorized("Invalid token".to_string()));
        }

        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| ServiceError::Unauthorized("Invalid token".to_string()))?;
        let account = user::Entity::find_by_id(user_id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::Unauthorized("Invalid token".to_string()))?;

        self.auth.revoke_jti(&claims.jti, claims.exp).await;
        let tokens = self.auth.generate_token_pair(&account)?;
        Ok(tokens)
    }

    /// Invalidates a refresh token
    #[instrument(skip(self, refresh_token))]
    pub async fn logout(&self, refresh_token: &str) -> Result<(), ServiceError> {
        self.auth
            .revoke_token(refresh_token)
            .await
            .map_err(|_: AuthError| ServiceError::InvalidInput("Invalid token.".to_string()))
    }

    /// Fetches the account behind an authenticated request
    #[instrument(skip(self))]
    pub async fn get_profile(&self, user_id: Uuid) -> Result<user::Model, ServiceError> {
        user::Entity::find_by_id(user_id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound("User not found.".to_string()))
    }

    /// Applies partial profile changes with the registration-time field rules
    #[instrument(skip(self, changes))]
    pub async fn update_profile(
        &self,
        user_id: Uuid,
        changes: ProfileChanges,
    ) -> Result<user::Model, ServiceError> {
        let account = self.get_profile(user_id).await?;

        let mut errors = FieldErrors::new();
        if let Some(full_name) = &changes.full_name {
            validate_full_name(full_name, &mut errors);
        }
        if let Some(phone) = &changes.phone_number {
            validate_uk_phone(phone, &mut errors);
        }
        errors.into_result()?;

        let mut active: user::ActiveModel = account.into();
        if let Some(full_name) = changes.full_name {
            active.full_name = Set(full_name);
        }
        if let Some(phone) = changes.phone_number {
            active.phone_number = Set(phone);
        }
        if let Some(address) = changes.address {
            active.address_line_1 = Set(Some(address.address_line_1));
            active.address_line_2 = Set(address.address_line_2);
            active.city = Set(Some(address.city));
            active.country = Set(Some(address.country));
            active.postcode = Set(Some(address.postcode));
        }

        let updated = active.update(self.db.as_ref()).await?;
        Ok(updated)
    }

    /// Starts the password-reset flow. The response is identical whether or
    /// not the email exists, so the endpoint cannot be used to enumerate
    /// accounts; only the unverified case answers differently.
    #[instrument(skip(self))]
    pub async fn forgot_password(&self, email: &str) -> Result<(), ServiceError> {
        let Some(account) = self.find_by_email(email).await? else {
            info!("password reset requested for unknown email");
            return Ok(());
        };

        if !account.is_email_verified {
            return Err(ServiceError::InvalidInput(
                "Please verify your email first before resetting password.".to_string(),
            ));
        }

        let code = generate_code();
        let recipient = account.email.clone();
        let mut active: user::ActiveModel = account.into();
        active.password_reset_token = Set(Some(code.clone()));
        active.update(self.db.as_ref()).await?;

        self.mailer
            .send(
                &recipient,
                mailer::PASSWORD_RESET_SUBJECT,
                &mailer::password_reset_body(&code),
            )
            .await
            .map_err(|e| ServiceError::EmailDelivery(e.to_string()))?;

        info!(email = %recipient, "password reset code sent");
        Ok(())
    }

    /// Completes the password-reset flow and clears the single-use code
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn reset_password(&self, input: ResetPasswordInput) -> Result<(), ServiceError> {
        let mut errors = FieldErrors::new();
        if input.code.len() != 4 || !input.code.chars().all(|c| c.is_ascii_digit()) {
            errors.add("code", "Reset code must be exactly 4 digits.");
        }
        validate_password(&input.password, &mut errors);
        if input.password != input.confirm_password {
            errors.add("confirm_password", "Passwords do not match.");
        }
        errors.into_result()?;

        let account = self
            .find_by_email(&input.email)
            .await?
            .ok_or_else(|| ServiceError::NotFound("User not found.".to_string()))?;

        let Some(expected) = account.password_reset_token.clone() else {
            return Err(ServiceError::InvalidInput(
                "No password reset request found. Please request a new code.".to_string(),
            ));
        };
        if expected != input.code {
            return Err(ServiceError::InvalidInput(
                "Invalid verification code.".to_string(),
            ));
        }

        let user_id = account.id;
        let mut active: user::ActiveModel = account.into();
        active.password_hash = Set(hash_password(&input.password)?);
        active.password_reset_token = Set(None);
        active.update(self.db.as_ref()).await?;

        info!(user_id = %user_id, "password reset");
        Ok(())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<user::Model>, ServiceError> {
        let found = user::Entity::find()
            .filter(
                Expr::expr(Func::lower(Expr::col(user::Column::Email))).eq(email.to_lowercase()),
            )
            .one(self.db.as_ref())
            .await?;
        Ok(found)
    }
}

/// Random single-use 4-digit code, zero-padded
fn generate_code() -> String {
    format!("{:04}", rand::thread_rng().gen_range(0..10_000))
}

fn hash_password(password: &str) -> Result<String, ServiceError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ServiceError::HashError(e.to_string()))
}

fn verify_password(password: &str, hash: &str) -> Result<bool, ServiceError> {
    let parsed = PasswordHash::new(hash).map_err(|e| ServiceError::HashError(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

fn validate_full_name(full_name: &str, errors: &mut FieldErrors) {
    if full_name.len() < 4 {
        errors.add(
            "full_name",
            "Full name must be at least 4 characters long.",
        );
    }
}

fn validate_password(password: &str, errors: &mut FieldErrors) {
    if password.len() < 8 {
        errors.add("password", "Password must be at least 8 characters long.");
    }
}

fn validate_uk_phone(phone: &str, errors: &mut FieldErrors) {
    match phone.strip_prefix("+44") {
        None => {
            errors.add(
                "phone_number",
                "Phone number must start with '+44' for UK numbers.",
            );
        }
        Some(rest) => {
            if !rest.chars().all(|c| c.is_ascii_digit()) {
                errors.add(
                    "phone_number",
                    "Phone number must only contain digits after the '+44' country code.",
                );
            } else if rest.len() != 10 {
                errors.add(
                    "phone_number",
                    "UK phone number must be exactly 10 digits long after '+44'.",
                );
            }
        }
    }
}
