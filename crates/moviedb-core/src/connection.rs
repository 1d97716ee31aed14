//! Document-store connection string assembly.
//!
//! All four components are percent-encoded; only RFC 3986 unreserved
//! characters pass through untouched.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::config::Credentials;

const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'.').remove(b'_').remove(b'~');

fn encode(value: &str) -> String {
    utf8_percent_encode(value, COMPONENT).to_string()
}

/// `<scheme>://<user>:<password>@<cluster>/?appName=<app>`
pub fn connection_string(scheme: &str, creds: &Credentials) -> String {
    format!(
        "{}://{}:{}@{}/?appName={}",
        scheme,
        encode(&creds.user_name),
        encode(&creds.password),
        encode(&creds.cluster_name),
        encode(&creds.app_name),
    )
}

/// Same shape as [`connection_string`] with the password masked, for logs.
pub fn redacted_connection_string(scheme: &str, creds: &Credentials) -> String {
    format!(
        "{}://{}:****@{}/?appName={}",
        scheme,
        encode(&creds.user_name),
        encode(&creds.cluster_name),
        encode(&creds.app_name),
    )
}
