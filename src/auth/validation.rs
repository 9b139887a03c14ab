//! Field rules for sign-up and sign-in payloads.

pub const MIN_PASSWORD_LENGTH: usize = 8;
pub const MAX_PASSWORD_LENGTH: usize = 72; // bcrypt ignores anything past 72 bytes

pub fn validate_username(username: &str) -> Result<(), String> {
    if username.is_empty() {
        return Err("must be provided".to_string());
    }
    if username.len() < 3 {
        return Err("must be at least 3 characters".to_string());
    }
    if username.len() > 50 {
        return Err("must be less than 50 characters".to_string());
    }
    if !username.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
        return Err("can only contain letters, numbers, underscore, and hyphen".to_string());
    }
    if !username.starts_with(|c: char| c.is_ascii_alphanumeric()) {
        return Err("must start with a letter or number".to_string());
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("must be provided".to_string());
    }
    if email.len() > 254 || email.chars().any(char::is_whitespace) {
        return Err("must be a valid email address".to_string());
    }

    let (local, domain) = email.split_once('@').ok_or_else(|| "must be a valid email address".to_string())?;
    let domain_ok = !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.');
    if local.is_empty() || !domain_ok {
        return Err("must be a valid email address".to_string());
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), String> {
    if password.is_empty() {
        return Err("must be provided".to_string());
    }
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(format!("must be at least {} bytes long", MIN_PASSWORD_LENGTH));
    }
    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(format!("must not be more than {} bytes long", MAX_PASSWORD_LENGTH));
    }
    Ok(())
}
