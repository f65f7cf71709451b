//! Credential input.
//!
//! Hidden prompts on a terminal; one field per line when stdin is piped.

use std::io::{self, IsTerminal};

use dialoguer::{Input, Password};
use tracing::debug;
use zeroize::Zeroizing;

use crate::core::domain::{Credentials, Provider};
use crate::error::Result;

/// Read the provider's required credential fields, in order.
///
/// # Errors
///
/// Returns a validation error if any field is empty.
pub fn credentials(provider: Provider) -> Result<Credentials> {
    let interactive = io::stdin().is_terminal();
    debug!(provider = %provider, interactive, "reading credentials");

    let mut credentials = Credentials::new();
    for field in provider.required_fields() {
        let value = if !interactive {
            let mut line = Zeroizing::new(String::new());
            io::stdin().read_line(&mut line)?;
            line.trim().to_string()
        } else if provider.is_secret_field(field) {
            Password::new().with_prompt(*field).interact()?
        } else {
            Input::<String>::new()
                .with_prompt(*field)
                .interact_text()?
        };
        credentials.insert(*field, value);
    }

    credentials.validate_for(provider)?;
    Ok(credentials)
}
