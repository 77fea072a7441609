//! `user create` command.

use std::fmt;

use super::App;
use crate::Result;
use crate::models::{User, UserId};

/// Output of `user create`.
#[derive(Debug, Clone, PartialEq)]
pub struct UserCreated(pub User);

impl fmt::Display for UserCreated {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Created {} user {}", self.0.user_type.as_str(), self.0.id)
    }
}

/// Creates a guest user, with a generated id unless one is given.
///
/// # Errors
///
/// Returns an error if the id is blank or taken, or the store write fails.
pub fn create_user(app: &App, id: Option<&str>) -> Result<UserCreated> {
    let user = match id {
        Some(id) => app.users.create_guest_with_id(UserId::new(id))?,
        None => app.users.create_guest()?,
    };
    Ok(UserCreated(user))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::test_support::app;

    #[test]
    fn test_create_user_with_and_without_id() {
        let app = app();
        let named = create_user(&app, Some("alice")).unwrap();
        assert_eq!(named.to_string(), "Created guest user alice");
        assert!(create_user(&app, Some("alice")).is_err());

        let generated = create_user(&app, None).unwrap();
        assert_ne!(generated.0.id.as_str(), "alice");
        assert_eq!(generated.0.preference, vec![0.0, 0.0]);
    }
}
