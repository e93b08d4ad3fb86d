//! UUID helpers.
//!
//! New rows use UUIDv7 so ids sort by creation time.

use uuid::Uuid;

/// Generate a new time-ordered UUIDv7.
#[inline]
pub fn new_v7() -> Uuid {
    Uuid::now_v7()
}
