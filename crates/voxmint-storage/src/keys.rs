//! Shared key and filename generation for storage backends.

use chrono::{DateTime, Utc};

use crate::traits::ContentHash;

/// Filesystem key for a stored object: `objects/{first two hex chars}/{hash}`.
/// The two-character fanout keeps directories small.
pub fn object_key(hash: &ContentHash) -> String {
    let hex = hash.as_str();
    let prefix = if hex.len() >= 2 { &hex[..2] } else { "00" };
    format!("objects/{}/{}", prefix, hex)
}

/// Display filename for a published version, derived from the recording
/// title and a timestamp. Falls back to "recording" for empty titles.
pub fn publish_filename(title: &str, now: DateTime<Utc>) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut last_dash = true;
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    let slug = slug.trim_end_matches('-');
    let slug = if slug.is_empty() { "recording" } else { slug };
    format!("{}-{}.mp3", slug, now.timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn object_key_fans_out_on_prefix() {
        let hash = ContentHash("abcdef0123".to_string());
        assert_eq!(object_key(&hash), "objects/ab/abcdef0123");
    }

    #[test]
    fn publish_filename_slugifies_title() {
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        assert_eq!(
            publish_filename("My First Take!", now),
            "my-first-take-1700000000000.mp3"
        );
        assert_eq!(
            publish_filename("  ", now),
            "recording-1700000000000.mp3"
        );
    }
}
