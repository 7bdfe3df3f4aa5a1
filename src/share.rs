//! Share links for a grid.

use serde::Serialize;

/// Public URL of a grid in the web app.
pub fn share_url(base_url: &str, share_token: &str) -> String {
    format!(
        "{}/grid/{}",
        base_url.trim_end_matches('/'),
        urlencoding::encode(share_token)
    )
}

/// Text prefilled in the X (Twitter) composer.
pub fn share_text(goal_text: &str) -> String {
    format!(
        "I just mapped out my goal using the Harada Method! 🎯\n\n\"{}\"\n\n8 pillars, 64 actionable tasks. Check it out:",
        goal_text
    )
}

/// X (Twitter) web intent.
pub fn twitter_intent_url(goal_text: &str, share_url: &str) -> String {
    format!(
        "https://twitter.com/intent/tweet?text={}&url={}",
        urlencoding::encode(&share_text(goal_text)),
        urlencoding::encode(share_url)
    )
}

/// LinkedIn share dialog.
pub fn linkedin_share_url(share_url: &str) -> String {
    format!(
        "https://www.linkedin.com/sharing/share-offsite/?url={}",
        urlencoding::encode(share_url)
    )
}

/// All share links for one grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShareLinks {
    pub share_url: String,
    pub twitter: String,
    pub linkedin: String,
}

impl ShareLinks {
    pub fn new(base_url: &str, share_token: &str, goal_text: &str) -> Self {
        let url = share_url(base_url, share_token);
        Self {
            twitter: twitter_intent_url(goal_text, &url),
            linkedin: linkedin_share_url(&url),
            share_url: url,
        }
    }
}
