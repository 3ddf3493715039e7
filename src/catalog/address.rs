//! Catalog address validation
//!
//! Runs before any network access: a rejected address never reaches the client.

use url::{Host, Url};

use crate::error::{Result, VaultError};

/// Parse and validate an absolute http(s) address
pub fn validate_address(address: &str) -> Result<Url> {
    let invalid = |reason: &str| VaultError::InvalidAddress {
        address: address.to_string(),
        reason: reason.to_string(),
    };

    let url = Url::parse(address).map_err(|e| invalid(&e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid("scheme must be http or https"));
    }

    match url.host() {
        None => Err(invalid("missing host")),
        Some(Host::Ipv4(_)) | Some(Host::Ipv6(_)) => Ok(url),
        Some(Host::Domain(domain)) => {
            if is_valid_domain(domain) {
                Ok(url)
            } else {
                Err(invalid("malformed host name"))
            }
        }
    }
}

/// `localhost`, or dot-separated LDH labels ending in an alphabetic TLD
fn is_valid_domain(domain: &str) -> bool {
    if domain.eq_ignore_ascii_case("localhost") {
        return true;
    }

    let labels: Vec<&str> = domain.trim_end_matches('.').split('.').collect();
    if labels.len() < 2 {
        return false;
    }

    let label_ok = |label: &&str| {
        !label.is_empty()
            && label.len() <= 63
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    };
    if !labels.iter().all(label_ok) {
        return false;
    }

    labels.last().is_some_and(|tld| {
        tld.len() >= 2 && (tld.chars().all(|c| c.is_ascii_alphabetic()) || tld.starts_with("xn--"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_malformed_addresses() {
        let rejected = [
            "",
            "https://blabla.com_",
            "ILoveYouToo",
            "google.com",
            "http://",
            "lody",
            "https://\n.com",
            "ftp://neverwintervault.org/file.zip",
            "https://-bad-.org",
            "https://nodots",
        ];
        for address in rejected {
            assert!(
                matches!(validate_address(address), Err(VaultError::InvalidAddress { .. })),
                "{:?} should be rejected",
                address
            );
        }
    }

    #[test]
    fn accepts_vault_and_local_addresses() {
        let accepted = [
            "https://neverwintervault.org/project/nwn1/module/enigma-island",
            "http://neverwintervault.org",
            "http://127.0.0.1:8080/project/x",
            "http://localhost:3000/",
            "http://[::1]/modules/a.zip",
        ];
        for address in accepted {
            assert!(validate_address(address).is_ok(), "{:?} should be accepted", address);
        }
    }
}
