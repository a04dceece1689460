use tracing::{info, warn};

use emosns_common::{AuthUser, UserDetails};

use crate::error::{require_non_empty, Result, SocialError};
use crate::password::{hash_password_blocking, verify_password_blocking};
use crate::{GraphClient, GraphReader, GraphWriter};

const MIN_PASSWORD_LEN: usize = 8;

/// Registration, credential checks and profile lookup.
#[derive(Clone)]
pub struct AccountService {
    writer: GraphWriter,
    reader: GraphReader,
}

impl AccountService {
    pub fn new(client: GraphClient) -> Self {
        Self {
            writer: GraphWriter::new(client.clone()),
            reader: GraphReader::new(client),
        }
    }

    /// Register a user and return the new id. Emails are unique.
    pub async fn register(&self, username: &str, email: &str, password: &str) -> Result<String> {
        require_non_empty("username", username)?;
        require_non_empty("email", email)?;
        validate_email(email)?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(SocialError::Validation(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }

        let password_hash = hash_password_blocking(password.to_string()).await?;
        self.writer
            .create_user(username.trim(), email.trim(), &password_hash)
            .await
    }

    /// Check credentials. Unknown emails and wrong passwords are
    /// indistinguishable to the caller.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<AuthUser> {
        let user = match self.reader.get_user_by_email(email.trim()).await {
            Ok(user) => user,
            Err(e) if e.is_not_found() => return Err(invalid_credentials()),
            Err(e) => return Err(e),
        };

        let valid = verify_password_blocking(password.to_string(), user.password_hash.clone()).await?;
        if !valid {
            warn!(user_id = %user.id, "Rejected login");
            return Err(invalid_credentials());
        }

        info!(user_id = %user.id, "User authenticated");
        Ok(user)
    }

    pub async fn details(&self, user_id: &str) -> Result<UserDetails> {
        self.reader.get_user_with_details(user_id).await
    }
}

fn invalid_credentials() -> SocialError {
    SocialError::Validation("invalid credentials".to_string())
}

fn validate_email(email: &str) -> Result<()> {
    let email = email.trim();
    let valid = match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.starts_with('.'),
        None => false,
    };
    if !valid || email.contains(char::is_whitespace) {
        return Err(SocialError::Validation(format!("invalid email: {email}")));
    }
    Ok(())
}
