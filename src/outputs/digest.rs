//! Plain-text digest rendering.
//!
//! The layout of a rendered body:
//!
//! ```text
//! Daily News Digest - January 15, 2024
//! ==================================================
//!
//! TECHNOLOGY NEWS:
//! ------------------------------
//! 1. Title
//!    Source: techwire
//!    Summary: Two sentences of summary.
//!    Read more: https://news.test/story
//!
//! ==================================================
//! Sent by your Daily News Digest Bot
//! ```
//!
//! Rendering is pure: the same digest and date always produce the same bytes.

use crate::models::{CategoryDigest, DigestMessage};
use crate::utils::digest_date;
use chrono::NaiveDate;
use std::fmt;

const TITLE_RULE_WIDTH: usize = 50;
const SECTION_RULE_WIDTH: usize = 30;
const SIGNATURE: &str = "Sent by your Daily News Digest Bot";

/// Build the email subject and body for `digest` as of `date`.
///
/// Categories with no articles are left out.
pub fn compose_digest(digest: &CategoryDigest, date: NaiveDate) -> DigestMessage {
    let date = digest_date(date);
    DigestMessage {
        subject: format!("Daily News Digest - {date}"),
        body: DigestBody {
            digest,
            date: &date,
        }
        .to_string(),
    }
}

struct DigestBody<'a> {
    digest: &'a CategoryDigest,
    date: &'a str,
}

impl fmt::Display for DigestBody<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let title_rule = "=".repeat(TITLE_RULE_WIDTH);
        let section_rule = "-".repeat(SECTION_RULE_WIDTH);

        writeln!(f, "Daily News Digest - {}", self.date)?;
        writeln!(f, "{title_rule}")?;
        writeln!(f)?;

        for (category, articles) in self.digest.iter().filter(|(_, a)| !a.is_empty()) {
            writeln!(f, "{} NEWS:", category.as_str().to_uppercase())?;
            writeln!(f, "{section_rule}")?;

            for (i, article) in articles.iter().enumerate() {
                writeln!(f, "{}. {}", i + 1, article.title)?;
                writeln!(f, "   Source: {}", article.source)?;
                writeln!(f, "   Summary: {}", article.synopsis())?;
                if !article.url.is_empty() {
                    writeln!(f, "   Read more: {}", article.url)?;
                }
                writeln!(f)?;
            }
        }

        writeln!(f, "{title_rule}")?;
        write!(f, "{SIGNATURE}")
    }
}
