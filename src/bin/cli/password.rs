//! Password handling for CLI operations.

use rpassword::prompt_password;
use sevenz_update::Password;

/// Prompts for a password twice and returns it if both entries match
pub fn confirm_password() -> Option<Password> {
    let pwd1 = prompt_password("Enter password: ").ok()?;

    if pwd1.is_empty() {
        eprintln!("Password cannot be empty");
        return None;
    }

    let pwd2 = prompt_password("Confirm password: ").ok()?;

    if pwd1 == pwd2 {
        Some(Password::new(pwd1))
    } else {
        eprintln!("Passwords do not match");
        None
    }
}

/// Uses the provided password or prompts for one with confirmation
pub fn get_or_prompt_password(provided: Option<String>) -> Option<Password> {
    match provided {
        Some(pwd) if !pwd.is_empty() => Some(Password::new(pwd)),
        Some(_) => {
            eprintln!("Password cannot be empty");
            None
        }
        None => confirm_password(),
    }
}
