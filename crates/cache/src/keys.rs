//! Cache key builders.
//!
//! The key formats are wire-compatible with the deployed services and must
//! not change: other consumers (and operators) address the same keys.

/// Key of a user's follow-list set.
#[must_use]
pub fn follow_list(user_id: i64) -> String {
    format!("GetFollowList:{user_id}")
}

/// Key of a user's fan-list set.
#[must_use]
pub fn fans_list(user_id: i64) -> String {
    format!("GetFansList:{user_id}")
}

/// Key of a user's follow counter.
#[must_use]
pub fn follow_count(user_id: i64) -> String {
    format!("CountFollower:{user_id}")
}

/// Key of a user's fan counter.
#[must_use]
pub fn fans_count(user_id: i64) -> String {
    format!("CountFans:{user_id}")
}

/// Key of the memoized "does `user_id` follow `be_follower_id`" result.
#[must_use]
pub fn is_follow(user_id: i64, be_follower_id: i64) -> String {
    format!("IsFollow_{user_id}_{be_follower_id}")
}

/// Key of a user's cached profile.
#[must_use]
pub fn user_info(user_id: i64) -> String {
    format!("GetUserInfo:{user_id}")
}

/// Key of the cached login-check projection for an identifier
/// (phone, email or username).
#[must_use]
pub fn login_check(identifier: &str) -> String {
    format!("user:{identifier}")
}

/// Key of the captcha code sent to a phone number.
#[must_use]
pub fn captcha(phone: &str) -> String {
    format!("captcha:{phone}")
}
