//! Storage key constants.

/// Storage keys used by the session record
pub struct StorageKeys;

impl StorageKeys {
    /// Identity token
    pub const JWT: &'static str = "jwt";

    /// Absolute session expiry, epoch milliseconds
    pub const EXPIRES_IN: &'static str = "expiresIn";

    /// Signed-in user's email
    pub const USER: &'static str = "user";

    /// Signed-in user's avatar URL
    pub const AVATAR: &'static str = "avatar";

    /// Every key that makes up the session record.
    pub const SESSION_KEYS: [&'static str; 4] =
        [Self::JWT, Self::EXPIRES_IN, Self::USER, Self::AVATAR];
}
