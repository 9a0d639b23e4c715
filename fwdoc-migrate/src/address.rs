//! Address literal shape checks.
//!
//! A token is an address literal when it *looks* like one: dotted-decimal IPv4
//! or colon-hex IPv6, optionally followed by `/<prefix>`. Octet ranges and
//! prefix lengths are not validated. Everything else in a membership list is a
//! name reference, except the reserved word `any`.

use once_cell::sync::Lazy;
use regex::Regex;

/// Token that matches every address; never treated as a name.
pub const ANY: &str = "any";

static IPV4_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{1,3}(\.\d{1,3}){3}(/\d{1,2})?$").expect("valid ipv4 pattern"));

static IPV6_SHAPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9A-Fa-f]{0,4}(:[0-9A-Fa-f]{0,4}){2,7}(/\d{1,3})?$")
        .expect("valid ipv6 pattern")
});

/// True for `any`, compared case-insensitively.
pub fn is_reserved(token: &str) -> bool {
    token.trim().eq_ignore_ascii_case(ANY)
}

/// True when `token` has the shape of an IPv4/IPv6 address or prefix.
pub fn is_address_literal(token: &str) -> bool {
    let token = token.trim();
    IPV4_SHAPE.is_match(token) || IPV6_SHAPE.is_match(token)
}

/// True when `token` is a literal or the reserved `any`, i.e. never a reference.
pub fn is_literal_or_reserved(token: &str) -> bool {
    is_reserved(token) || is_address_literal(token)
}

/// True when the token carries a `/prefix` suffix.
pub fn is_cidr_shaped(token: &str) -> bool {
    token.contains('/')
}

#[cfg(test)]
mod tests {
    use super::{is_address_literal, is_cidr_shaped, is_literal_or_reserved, is_reserved};

    #[test]
    fn recognizes_ipv4_hosts_and_prefixes() {
        assert!(is_address_literal("10.0.0.1"));
        assert!(is_address_literal("192.168.1.0/24"));
        assert!(is_address_literal(" 172.16.0.0/12 "));
    }

    #[test]
    fn recognizes_ipv6_shapes() {
        assert!(is_address_literal("2001:db8::1"));
        assert!(is_address_literal("2001:db8::/32"));
        assert!(is_address_literal("::1"));
    }

    #[test]
    fn shape_check_does_not_validate_octets() {
        assert!(is_address_literal("999.1.1.1"));
    }

    #[test]
    fn names_are_not_literals() {
        assert!(!is_address_literal("server.de"));
        assert!(!is_address_literal("Staff-Network"));
        assert!(!is_address_literal("web1.example.de"));
        assert!(!is_address_literal("10.0.0"));
    }

    #[test]
    fn any_is_reserved_in_any_case() {
        assert!(is_reserved("any"));
        assert!(is_reserved("ANY"));
        assert!(is_literal_or_reserved("Any"));
        assert!(!is_address_literal("any"));
    }

    #[test]
    fn cidr_shape_needs_prefix() {
        assert!(is_cidr_shaped("10.0.0.0/8"));
        assert!(!is_cidr_shaped("10.0.0.1"));
    }
}
