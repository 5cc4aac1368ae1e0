/// Single playable stream recovered for one quality tier of an episode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamCandidate {
    pub server_label: String,
    pub quality_label: String,
    pub audio_label: String,
    pub final_url: String,
    pub is_encrypted: bool,
}

/// What to do when a single quality of an episode fails to resolve.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Abort the whole extraction call on the first failed quality.
    #[default]
    AbortOnFirst,
    /// Resolve qualities independently and drop the failed ones.
    SkipFailed,
}
