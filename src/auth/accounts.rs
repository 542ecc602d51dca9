//! User registration and login against the user table

use serde::Deserialize;
use tracing::{info, warn};

use crate::store::{Database, StoreError};
use crate::types::{Role, User};

use super::{AuthError, JwtAuth, TokenPair};

/// Registration payload; `password` is plain text until hashed
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

impl JwtAuth {
    /// Hash the password and store the user
    pub fn register_user(&self, db: &Database, new_user: NewUser) -> Result<User, AuthError> {
        if db.get_user_by_email(&new_user.email).is_some() {
            return Err(AuthError::UserExists);
        }

        let user = User {
            id: new_user.id,
            name: new_user.name,
            email: new_user.email,
            password: self.hash_password(&new_user.password)?,
            role: new_user.role,
        };

        match db.add_user(user.clone()) {
            Ok(()) => {
                info!(user = %user.email, role = %user.role, "User registered");
                Ok(user)
            }
            Err(StoreError::Duplicate { .. }) => Err(AuthError::UserExists),
            Err(e) => Err(e.into()),
        }
    }

    /// Check credentials and issue a token pair
    pub fn login(
        &self,
        db: &Database,
        email: &str,
        password: &str,
    ) -> Result<(User, TokenPair), AuthError> {
        let user = db
            .get_user_by_email(email)
            .filter(|u| self.verify_password(password, &u.password))
            .ok_or_else(|| {
                warn!(user = %email, "Rejected login");
                AuthError::InvalidCredentials
            })?;

        let tokens = self.generate_tokens(&user.email, user.role)?;
        info!(user = %user.email, "User logged in");
        Ok((user, tokens))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (JwtAuth, Database) {
        let auth = JwtAuth::new("test-secret-key-that-is-at-least-32-characters-long")
            .with_bcrypt_cost(4);
        (auth, Database::in_memory())
    }

    fn new_user(id: &str, email: &str) -> NewUser {
        NewUser {
            id: id.to_string(),
            name: "Ada".to_string(),
            email: email.to_string(),
            password: "password123".to_string(),
            role: Role::Organizer,
        }
    }

    #[test]
    fn test_register_and_login() {
        let (auth, db) = setup();
        let user = auth.register_user(&db, new_user("u1", "ada@example.com")).unwrap();
        assert_ne!(user.password, "password123");

        let (logged_in, tokens) = auth.login(&db, "ada@example.com", "password123").unwrap();
        assert_eq!(logged_in.id, "u1");
        let claims = auth.validate_token(&tokens.access_token).unwrap();
        assert_eq!(claims.role, Role::Organizer);
    }

    #[test]
    fn test_duplicate_email_rejected() {
        let (auth, db) = setup();
        auth.register_user(&db, new_user("u1", "ada@example.com")).unwrap();
        let result = auth.register_user(&db, new_user("u2", "ada@example.com"));
        assert!(matches!(result, Err(AuthError::UserExists)));
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let (auth, db) = setup();
        auth.register_user(&db, new_user("u1", "ada@example.com")).unwrap();
        let result = auth.register_user(&db, new_user("u1", "bob@example.com"));
        assert!(matches!(result, Err(AuthError::UserExists)));
    }

    #[test]
    fn test_bad_credentials() {
        let (auth, db) = setup();
        auth.register_user(&db, new_user("u1", "ada@example.com")).unwrap();

        assert!(matches!(
            auth.login(&db, "ada@example.com", "wrong"),
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            auth.login(&db, "nobody@example.com", "password123"),
            Err(AuthError::InvalidCredentials)
        ));
    }
}
