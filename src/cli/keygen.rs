//! Keygen command.
//!
//! Prints a fresh process key. Only the key goes to stdout so it can be
//! captured directly.

use std::io::{self, IsTerminal};

use crate::cli::output;
use crate::core::cipher::SecretCipher;
use crate::core::constants;
use crate::error::Result;

/// Generate and print a new key.
pub fn execute() -> Result<()> {
    let key = SecretCipher::generate_key();
    println!("{}", key.as_str());

    if io::stdout().is_terminal() {
        let cipher = SecretCipher::from_key(&key)?;
        output::hint(&format!(
            "store it in {} (fingerprint {})",
            constants::KEY_ENV,
            cipher.fingerprint()
        ));
    }
    Ok(())
}
