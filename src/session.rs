// Copyright 2025 the AirAware Desktop authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Session gate: holds the API token and the map-unlocked flag.
//!
//! The gate is the only trigger for map controller construction. Until
//! `unlock` succeeds, no map view exists. Locking the gate tears the
//! controller down before the flag flips back.

use log::info;
use thiserror::Error;

/// Credential validation failure; the gate stays closed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("API token is empty")]
    EmptyToken,
}

/// Gate between the credential form and the live map.
#[derive(Debug, Default)]
pub struct SessionGate {
    credential: String,
    unlocked: bool,
}

impl SessionGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the raw credential string. No validation happens here.
    pub fn set_credential(&mut self, value: impl Into<String>) {
        self.credential = value.into();
    }

    pub fn credential(&self) -> &str {
        &self.credential
    }

    /// Validate the stored credential and open the gate.
    ///
    /// Empty or whitespace-only tokens are rejected and the gate stays
    /// closed. The caller persists the token on success.
    pub fn unlock(&mut self) -> Result<(), ValidationError> {
        if self.credential.trim().is_empty() {
            return Err(ValidationError::EmptyToken);
        }

        self.unlocked = true;
        info!("Session unlocked");
        Ok(())
    }

    /// Close the gate. The caller destroys the map controller first.
    pub fn lock(&mut self) {
        self.unlocked = false;
        info!("Session locked");
    }

    pub fn is_unlocked(&self) -> bool {
        self.unlocked
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unlock_rejects_empty_token() {
        let mut gate = SessionGate::new();
        gate.set_credential("");
        assert_eq!(gate.unlock(), Err(ValidationError::EmptyToken));
        assert!(!gate.is_unlocked());
    }

    #[test]
    fn test_unlock_rejects_whitespace_token() {
        let mut gate = SessionGate::new();
        gate.set_credential("   \t ");
        assert_eq!(gate.unlock(), Err(ValidationError::EmptyToken));
        assert!(!gate.is_unlocked());
    }

    #[test]
    fn test_unlock_opens_gate() {
        let mut gate = SessionGate::new();
        gate.set_credential("demo-token");
        assert!(gate.unlock().is_ok());
        assert!(gate.is_unlocked());
        assert_eq!(gate.credential(), "demo-token");
    }

    #[test]
    fn test_lock_closes_gate() {
        let mut gate = SessionGate::new();
        gate.set_credential("demo-token");
        gate.unlock().expect("valid token should unlock");
        gate.lock();
        assert!(!gate.is_unlocked());
    }
}
