//! Listen-address port shifting.

/// Shifts the trailing `:port` of `address` by `offset`.
///
/// Accepts `host:port` and `scheme://host:port`. The scheme is kept as is and
/// the split happens at the last colon, so bracketed IPv6 hosts survive. A
/// zero offset or empty address is returned untouched; an address without a
/// numeric port is returned unchanged instead of failing.
pub fn shift_port(address: &str, offset: i64) -> String {
    if offset == 0 || address.is_empty() {
        return address.to_string();
    }

    let (prefix, rest) = match address.split_once("://") {
        Some((scheme, rest)) => (format!("{scheme}://"), rest),
        None => (String::new(), address),
    };

    let Some((host, port)) = rest.rsplit_once(':') else {
        return format!("{prefix}{rest}");
    };

    match port.parse::<i64>().ok().and_then(|port| port.checked_add(offset)) {
        Some(shifted) => format!("{prefix}{host}:{shifted}"),
        None => format!("{prefix}{rest}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn shifts_scheme_addresses() {
        assert_eq!(
            shift_port("tcp://127.0.0.1:26657", 1000),
            "tcp://127.0.0.1:27657"
        );
        assert_eq!(shift_port("tcp://0.0.0.0:1317", 1000), "tcp://0.0.0.0:2317");
    }

    #[test]
    fn shifts_bare_addresses() {
        assert_eq!(shift_port("localhost:6060", 1000), "localhost:7060");
        assert_eq!(shift_port("0.0.0.0:9090", -90), "0.0.0.0:9000");
    }

    #[test]
    fn splits_at_last_colon() {
        assert_eq!(shift_port("tcp://[::1]:26656", 10), "tcp://[::1]:26666");
    }

    #[test]
    fn zero_offset_and_empty_are_noops() {
        assert_eq!(shift_port("tcp://127.0.0.1:26657", 0), "tcp://127.0.0.1:26657");
        assert_eq!(shift_port("not even an address", 0), "not even an address");
        assert_eq!(shift_port("", 1000), "");
    }

    #[test]
    fn malformed_addresses_are_returned_unchanged() {
        assert_eq!(shift_port("localhost", 1000), "localhost");
        assert_eq!(shift_port("tcp://localhost", 1000), "tcp://localhost");
        assert_eq!(shift_port("unix:///var/run/node.sock", 5), "unix:///var/run/node.sock");
        assert_eq!(shift_port("tcp://host:http", 5), "tcp://host:http");
        assert_eq!(shift_port("host:", 5), "host:");
    }

    proptest! {
        #[test]
        fn shift_is_invertible(
            host in "[a-z0-9.]{1,20}",
            port in 0i64..=65_535,
            offset in -100_000i64..=100_000,
            with_scheme in any::<bool>(),
        ) {
            let address = if with_scheme {
                format!("tcp://{host}:{port}")
            } else {
                format!("{host}:{port}")
            };
            let shifted = shift_port(&address, offset);
            prop_assert_eq!(shift_port(&shifted, -offset), address);
        }
    }
}
