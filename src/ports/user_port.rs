//! User account storage port.

use crate::domain::error::TrackerError;
use crate::domain::user::User;

pub trait UserPort {
    /// Inserts a user. The email is expected to be normalized already.
    /// Fails with `Conflict` when the email is taken.
    fn create_user(&self, email: &str, password_hash: &str) -> Result<User, TrackerError>;
    fn find_user_by_email(&self, email: &str) -> Result<Option<User>, TrackerError>;
    fn find_user(&self, id: i64) -> Result<Option<User>, TrackerError>;
}
