use super::ApiError;

pub fn validate_username(username: &str) -> Result<&str, ApiError> {
    let trimmed = username.trim();

    if trimmed.len() < 3 {
        return Err(ApiError::validation(
            "Username must be at least 3 characters",
        ));
    }

    if trimmed.len() > 50 {
        return Err(ApiError::validation(
            "Username must be 50 characters or less",
        ));
    }

    if !trimmed
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ApiError::validation(
            "Username can only contain letters, numbers, hyphens, and underscores",
        ));
    }

    Ok(trimmed)
}

/// Shallow shape check; deliverability is the mail provider's problem.
pub fn validate_email(email: &str) -> Result<&str, ApiError> {
    let trimmed = email.trim();

    let valid = trimmed.len() <= 254
        && trimmed
            .split_once('@')
            .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));

    if !valid {
        return Err(ApiError::validation("Invalid email address"));
    }

    Ok(trimmed)
}

pub fn validate_password(password: &str) -> Result<&str, ApiError> {
    if password.len() < 8 {
        return Err(ApiError::validation(
            "Password must be at least 8 characters",
        ));
    }

    if password.len() > 128 {
        return Err(ApiError::validation(
            "Password must be 128 characters or less",
        ));
    }

    Ok(password)
}

pub fn validate_limit(limit: u64) -> Result<u64, ApiError> {
    const MAX_LIMIT: u64 = 100;
    const MIN_LIMIT: u64 = 1;

    if !(MIN_LIMIT..=MAX_LIMIT).contains(&limit) {
        return Err(ApiError::validation(format!(
            "Invalid limit: {}. Limit must be between {} and {}",
            limit, MIN_LIMIT, MAX_LIMIT
        )));
    }
    Ok(limit)
}

pub fn validate_rating(value: i32, min: i32, max: i32, field: &str) -> Result<i32, ApiError> {
    if !(min..=max).contains(&value) {
        return Err(ApiError::validation(format!(
            "Invalid {}: {}. Must be between {} and {}",
            field, value, min, max
        )));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_username() {
        assert!(validate_username("alice").is_ok());
        assert!(validate_username("lifter_42").is_ok());
        assert!(validate_username("ab").is_err());
        assert!(validate_username("a".repeat(51).as_str()).is_err());
        assert!(validate_username("bad name!").is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("user@example.com").is_ok());
        assert!(validate_email("  padded@example.com  ").is_ok());
        assert!(validate_email("not-an-email").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("user@nodot").is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("longenough").is_ok());
        assert!(validate_password("short").is_err());
        assert!(validate_password("p".repeat(129).as_str()).is_err());
    }

    #[test]
    fn test_validate_limit() {
        assert!(validate_limit(1).is_ok());
        assert!(validate_limit(100).is_ok());
        assert!(validate_limit(0).is_err());
        assert!(validate_limit(101).is_err());
    }

    #[test]
    fn test_validate_rating() {
        assert!(validate_rating(3, 1, 5, "mood_rating").is_ok());
        assert!(validate_rating(0, 1, 5, "mood_rating").is_err());
        assert!(validate_rating(11, 1, 10, "difficulty_rating").is_err());
    }
}
