//! Throwaway identity generation
//!
//! Produces a syntactically valid disposable identity for one provisioning
//! attempt: a mailbox address on one of the temp-mail domains, a password,
//! and display names. Identities are never persisted; uniqueness across rapid
//! retries relies on entropy plus a millisecond timestamp in the local part.

use rand::Rng;
use serde::Serialize;

const LOWER_ALNUM: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
const MIXED_ALNUM: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
const LOWER_ALPHA: &[u8] = b"abcdefghijklmnopqrstuvwxyz";

const LOCAL_PART_RANDOM_LEN: usize = 8;
const PASSWORD_LEN: usize = 12;
const NAME_LEN: usize = 6;

/// Candidate identity for one disposable-account registration
#[derive(Debug, Clone, Serialize)]
pub struct Identity {
    /// Mailbox address on a temp-mail domain
    pub email: String,
    /// Account password
    pub password: String,
    /// Display first name
    #[serde(rename = "firstName")]
    pub first_name: String,
    /// Display last name
    #[serde(rename = "lastName")]
    pub last_name: String,
}

impl Identity {
    /// Generate a fresh identity on one of the given mailbox domains.
    ///
    /// The local part is 8 random lowercase alphanumerics followed by the
    /// current Unix-epoch milliseconds, so two attempts in the same process
    /// cannot collide even with unlucky RNG draws.
    pub fn generate(domains: &[String]) -> Self {
        let mut rng = rand::thread_rng();

        let random_part = random_string(&mut rng, LOWER_ALNUM, LOCAL_PART_RANDOM_LEN);
        let timestamp_part = chrono::Utc::now().timestamp_millis();
        let domain = &domains[rng.gen_range(0..domains.len())];

        Self {
            email: format!("{random_part}{timestamp_part}@{domain}"),
            password: random_string(&mut rng, MIXED_ALNUM, PASSWORD_LEN),
            first_name: random_string(&mut rng, LOWER_ALPHA, NAME_LEN),
            last_name: random_string(&mut rng, LOWER_ALPHA, NAME_LEN),
        }
    }
}

fn random_string(rng: &mut impl Rng, charset: &[u8], len: usize) -> String {
    (0..len)
        .map(|_| charset[rng.gen_range(0..charset.len())] as char)
        .collect()
}
