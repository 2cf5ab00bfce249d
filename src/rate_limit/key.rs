//! Rate-limit key derivation.
//!
//! Keys are plain strings so the limiter stays agnostic of where identity
//! comes from. The default is the caller's network address; authenticated
//! callers get per-identity budgets, and the identity+route composite keeps
//! one hot endpoint from starving a user's quota everywhere else.

use std::net::IpAddr;

/// Key for an unauthenticated caller: `ip:<addr>`.
pub fn client(ip: IpAddr) -> String {
    format!("ip:{ip}")
}

/// Key for an authenticated identity: `user:<id>`.
pub fn user(id: &str) -> String {
    format!("user:{id}")
}

/// Composite identity+route key: `user:<id>:route:<route>`.
pub fn user_route(id: &str, route: &str) -> String {
    format!("user:{id}:route:{route}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_shapes() {
        assert_eq!(client("1.2.3.4".parse().unwrap()), "ip:1.2.3.4");
        assert_eq!(user("42"), "user:42");
        assert_eq!(user_route("42", "/api/search"), "user:42:route:/api/search");
    }

    #[test]
    fn test_composite_keys_are_distinct_per_route() {
        assert_ne!(
            user_route("42", "/api/search"),
            user_route("42", "/api/users")
        );
    }
}
