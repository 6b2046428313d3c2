use std::borrow::Cow;

use validator::ValidationError;

use super::user::CreditAction;

/// Blank strings count as missing, like absent fields.
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("required"));
    }
    Ok(())
}

pub fn validate_credit_action(action: &str) -> Result<(), ValidationError> {
    if action.trim().is_empty() {
        return Err(new_validation_error("required", "Missing required fields: credits, action"));
    }
    match CreditAction::parse(action) {
        Some(_) => Ok(()),
        None => Err(new_validation_error("invalid_action", "Invalid action. Must be 'add' or 'subtract'")),
    }
}

fn new_validation_error(code: &'static str, msg: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Borrowed(msg));
    err
}
