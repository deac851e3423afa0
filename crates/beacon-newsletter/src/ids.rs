//! Query ids and result keys of the newsletter structured queries.

/// Server-side ids of the structured queries this layer issues.
pub mod query_id {
    pub const SUBSCRIBED: &str = "6388546374527196";
    pub const FOLLOW: &str = "7871414976211147";
    pub const UNFOLLOW: &str = "7238632346214362";
    pub const MUTE: &str = "25151904754424642";
    pub const UNMUTE: &str = "7337137176362961";
    /// Name, description and picture edits.
    pub const JOB_MUTATION: &str = "7150902998257522";
    pub const METADATA: &str = "6620195908089573";
    pub const CREATE: &str = "6996806640408138";
}

/// Keys under `data` that hold each query's result.
pub mod result_key {
    pub const SUBSCRIBED: &str = "xwa2_newsletter_subscribed";
    pub const NEWSLETTER: &str = "xwa2_newsletter";
    pub const CREATE: &str = "xwa2_newsletter_create";
}
