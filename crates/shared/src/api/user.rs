use crate::constants::DEFAULT_SCHEME_VERSION;
use crate::ids::UserId;
use serde::{Deserialize, Serialize};

fn default_scheme_version() -> u8 {
    DEFAULT_SCHEME_VERSION
}

/// Key material a user publishes to the shared user directory.
///
/// `public_key` is readable by any peer; `encrypted_private_key` is the
/// password-wrapped recovery copy of the private key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserKeyRecord {
    pub user_id: UserId,
    pub public_key: String,
    pub encrypted_private_key: String,
    #[serde(default = "default_scheme_version")]
    pub scheme_version: u8,
}
