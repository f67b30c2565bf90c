//! Authentication
//!
//! Form validation and account flows over `AuthApi`:
//! - Login with email or phone
//! - Registration (with the optional referral code)
//! - Password reset by OTP
//! - Profile edit and password change
//!
//! Every flow validates locally first; nothing is sent while a field is
//! invalid.

pub mod session;

pub use session::{AuthTokens, Session, SessionState, SessionStore};

use crate::api::{AuthApi, SettingsApi};
use crate::error::{IcashError, IcashResult};
use crate::phone::normalize_phone;
use crate::types::{PasswordChange, ProfileUpdate, RegisterRequest, User};
use crate::utils::sanitize::{limits, sanitize_name, validate_email};
use crate::{log_info, log_warn};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

pub const MIN_PASSWORD_LENGTH: usize = 6;
pub const MIN_OTP_LENGTH: usize = 4;
pub const MIN_NAME_LENGTH: usize = 2;
pub const MIN_PHONE_LENGTH: usize = 8;

/// Field-level validation failures of the account forms
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Veuillez entrer votre email ou numéro de téléphone")]
    MissingIdentifier,
    #[error("Le mot de passe doit contenir au moins 6 caractères")]
    PasswordTooShort,
    #[error("Les mots de passe ne correspondent pas")]
    PasswordMismatch,
    #[error("Veuillez entrer votre mot de passe actuel")]
    MissingOldPassword,
    #[error("Le code OTP doit contenir au moins 4 caractères")]
    OtpTooShort,
    #[error("Le {0} doit contenir au moins 2 caractères")]
    NameTooShort(&'static str),
    #[error("Email invalide")]
    InvalidEmail,
    #[error("Le numéro de téléphone doit contenir au moins 8 chiffres")]
    PhoneTooShort,
}

impl From<ValidationError> for IcashError {
    fn from(err: ValidationError) -> Self {
        IcashError::validation(err.to_string())
    }
}

// =============================================================================
// Field Checks
// =============================================================================

fn check_password(password: &SecretString) -> Result<(), ValidationError> {
    if password.expose_secret().chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::PasswordTooShort);
    }
    Ok(())
}

fn check_confirmation(password: &SecretString, confirm: &SecretString) -> Result<(), ValidationError> {
    if password.expose_secret() != confirm.expose_secret() {
        return Err(ValidationError::PasswordMismatch);
    }
    Ok(())
}

fn check_name(value: &str, label: &'static str) -> Result<String, ValidationError> {
    let name = sanitize_name(value);
    if name.chars().count() < MIN_NAME_LENGTH {
        return Err(ValidationError::NameTooShort(label));
    }
    Ok(name)
}

fn check_email(value: &str) -> Result<String, ValidationError> {
    validate_email(value).map_err(|_| ValidationError::InvalidEmail)
}

/// Login identifier: emails pass through, anything else is a phone number
pub fn normalize_identifier(input: &str) -> Result<String, ValidationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::MissingIdentifier);
    }
    if trimmed.contains('@') {
        Ok(trimmed.to_string())
    } else {
        Ok(normalize_phone(trimmed))
    }
}

// =============================================================================
// Forms
// =============================================================================

/// Signup form as typed by the user
pub struct RegisterForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub password: SecretString,
    pub confirm_password: SecretString,
    pub referral_code: Option<String>,
}

impl RegisterForm {
    /// Validate every field and build the payload.
    ///
    /// The referral code is only sent when the server runs a referral
    /// bonus and the user typed a non-blank code.
    pub fn into_request(self, referral_bonus: bool) -> Result<RegisterRequest, ValidationError> {
        let first_name = check_name(&self.first_name, "prénom")?;
        let last_name = check_name(&self.last_name, "nom")?;
        let email = check_email(&self.email)?;

        let phone = normalize_phone(&self.phone);
        if phone.chars().count() < MIN_PHONE_LENGTH {
            return Err(ValidationError::PhoneTooShort);
        }

        check_password(&self.password)?;
        check_confirmation(&self.password, &self.confirm_password)?;

        let referral_code = if referral_bonus {
            self.referral_code
                .map(|c| c.trim().chars().take(limits::MAX_REFERRAL_LENGTH).collect::<String>())
                .filter(|c| !c.is_empty())
        } else {
            None
        };

        Ok(RegisterRequest {
            first_name,
            last_name,
            email,
            phone,
            password: self.password.expose_secret().to_string(),
            re_password: self.confirm_password.expose_secret().to_string(),
            referral_code,
        })
    }
}

/// Profile edit form
pub struct ProfileForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
}

impl ProfileForm {
    /// Pre-filled from the current profile
    pub fn from_user(user: &User) -> Self {
        Self {
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone().unwrap_or_default(),
        }
    }

    pub fn into_update(self) -> Result<ProfileUpdate, ValidationError> {
        let first_name = sanitize_name(&self.first_name);
        if first_name.is_empty() {
            return Err(ValidationError::NameTooShort("prénom"));
        }
        let last_name = sanitize_name(&self.last_name);
        if last_name.is_empty() {
            return Err(ValidationError::NameTooShort("nom"));
        }
        Ok(ProfileUpdate {
            first_name,
            last_name,
            email: check_email(&self.email)?,
            phone: normalize_phone(&self.phone),
        })
    }
}

/// Build a password change after checking the three fields
pub fn password_change(
    old: &SecretString,
    new: &SecretString,
    confirm: &SecretString,
) -> Result<PasswordChange, ValidationError> {
    if old.expose_secret().trim().is_empty() {
        return Err(ValidationError::MissingOldPassword);
    }
    check_password(new)?;
    check_confirmation(new, confirm)?;
    Ok(PasswordChange {
        old_password: old.expose_secret().to_string(),
        new_password: new.expose_secret().to_string(),
        confirm_new_password: confirm.expose_secret().to_string(),
    })
}

// =============================================================================
// Password Reset
// =============================================================================

/// Where the password reset stands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResetStep {
    /// Waiting for the account email
    Email,
    /// OTP sent to `email`
    Otp { email: String },
    Done,
}

/// Two-step password reset: request an OTP, then set the new password
pub struct PasswordReset {
    step: ResetStep,
}

impl Default for PasswordReset {
    fn default() -> Self {
        Self::new()
    }
}

impl PasswordReset {
    pub fn new() -> Self {
        Self { step: ResetStep::Email }
    }

    pub fn step(&self) -> &ResetStep {
        &self.step
    }

    pub fn request_otp<A: AuthApi>(&mut self, api: &A, email: &str) -> IcashResult<()> {
        let email = check_email(email)?;
        api.request_otp(&email)?;
        log_info!("auth", "Password reset OTP requested");
        self.step = ResetStep::Otp { email };
        Ok(())
    }

    pub fn confirm<A: AuthApi>(
        &mut self,
        api: &A,
        otp: &str,
        new_password: &SecretString,
        confirm: &SecretString,
    ) -> IcashResult<()> {
        if !matches!(self.step, ResetStep::Otp { .. }) {
            return Err(IcashError::invalid_state("Aucun code OTP n'a été demandé"));
        }
        let otp = otp.trim();
        if otp.chars().count() < MIN_OTP_LENGTH {
            return Err(ValidationError::OtpTooShort.into());
        }
        check_password(new_password)?;
        check_confirmation(new_password, confirm)?;

        api.reset_password(otp, new_password, confirm)?;
        self.step = ResetStep::Done;
        Ok(())
    }
}

// =============================================================================
// Account Service
// =============================================================================

/// Validate and log in, starting `session` on success
pub fn login<A: AuthApi>(
    api: &A,
    session: &mut Session,
    identifier: &str,
    password: &SecretString,
) -> IcashResult<()> {
    let identifier = normalize_identifier(identifier)?;
    check_password(password)?;

    match api.login(&identifier, password) {
        Ok(response) => {
            log_info!("auth", "Logged in", user = response.data.id);
            session.login(response);
            Ok(())
        }
        Err(e) => {
            log_warn!("auth", "Login failed", code = format!("{:?}", e.code));
            Err(e)
        }
    }
}

/// Validate the signup form and create the account
pub fn register<A: AuthApi + SettingsApi>(api: &A, form: RegisterForm) -> IcashResult<()> {
    let referral_bonus = api.settings().map(|s| s.referral_bonus).unwrap_or(false);
    let request = form.into_request(referral_bonus)?;
    api.register(&request)?;
    log_info!("auth", "Account created", email = request.email);
    Ok(())
}

/// Refresh the session's user from the server
pub fn refresh_profile<A: AuthApi>(api: &A, session: &mut Session) -> IcashResult<User> {
    session.require_user()?;
    let user = api.profile()?;
    session.update_user(user.clone());
    Ok(user)
}

pub fn update_profile<A: AuthApi>(api: &A, session: &mut Session, form: ProfileForm) -> IcashResult<User> {
    session.require_user()?;
    let update = form.into_update()?;
    let user = api.update_profile(&update)?;
    session.update_user(user.clone());
    Ok(user)
}

pub fn change_password<A: AuthApi>(
    api: &A,
    session: &Session,
    old: &SecretString,
    new: &SecretString,
    confirm: &SecretString,
) -> IcashResult<()> {
    session.require_user()?;
    let change = password_change(old, new, confirm)?;
    api.change_password(&change)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret(s: &str) -> SecretString {
        SecretString::from(s.to_string())
    }

    fn form(referral: Option<&str>) -> RegisterForm {
        RegisterForm {
            first_name: "Kofi".into(),
            last_name: "Mensah".into(),
            email: "Kofi@Example.com".into(),
            phone: "+229 97 00 00 00".into(),
            password: secret("secret1"),
            confirm_password: secret("secret1"),
            referral_code: referral.map(String::from),
        }
    }

    #[test]
    fn test_identifier_normalization() {
        assert_eq!(normalize_identifier(" a@b.co ").unwrap(), "a@b.co");
        assert_eq!(normalize_identifier("+229 97 00 00 00").unwrap(), "22997000000");
        assert_eq!(normalize_identifier("  "), Err(ValidationError::MissingIdentifier));
    }

    #[test]
    fn test_referral_only_with_bonus() {
        let request = form(Some("ABC123")).into_request(false).unwrap();
        assert_eq!(request.referral_code, None);

        let request = form(Some("  ABC123 ")).into_request(true).unwrap();
        assert_eq!(request.referral_code.as_deref(), Some("ABC123"));

        let request = form(Some("   ")).into_request(true).unwrap();
        assert_eq!(request.referral_code, None);
    }

    #[test]
    fn test_register_validation() {
        let request = form(None).into_request(false).unwrap();
        assert_eq!(request.email, "kofi@example.com");
        assert_eq!(request.phone, "22997000000");

        let mut bad = form(None);
        bad.first_name = "K".into();
        assert_eq!(bad.into_request(false).unwrap_err(), ValidationError::NameTooShort("prénom"));

        let mut bad = form(None);
        bad.confirm_password = secret("other1");
        assert_eq!(bad.into_request(false).unwrap_err(), ValidationError::PasswordMismatch);

        let mut bad = form(None);
        bad.phone = "1234".into();
        assert_eq!(bad.into_request(false).unwrap_err(), ValidationError::PhoneTooShort);
    }

    #[test]
    fn test_password_change_rules() {
        assert_eq!(
            password_change(&secret(" "), &secret("newpass"), &secret("newpass")).unwrap_err(),
            ValidationError::MissingOldPassword
        );
        assert_eq!(
            password_change(&secret("old"), &secret("short"), &secret("short")).unwrap_err(),
            ValidationError::PasswordTooShort
        );
        assert!(password_change(&secret("old"), &secret("newpass"), &secret("newpass")).is_ok());
    }

    #[test]
    fn test_profile_form_requires_names() {
        let form = ProfileForm {
            first_name: "  ".into(),
            last_name: "Diallo".into(),
            email: "a@b.co".into(),
            phone: "22670000000".into(),
        };
        assert!(form.into_update().is_err());
    }
}
