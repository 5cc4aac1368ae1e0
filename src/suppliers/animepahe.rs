use std::sync::OnceLock;

use indexmap::IndexMap;
use log::warn;
use regex::Regex;
use serde::Deserialize;

use crate::{
    error::ExtractError,
    extractors::kwik,
    models::{FailurePolicy, StreamCandidate},
    session::SessionStore,
    utils::{
        self,
        http::{HttpClient, ReqwestHttpClient, RequestOptions},
    },
};

const MAIN_URL: &str = "https://animepahe.com";
const SERVER_LABEL: &str = "KWIK";
const DEFAULT_AUDIO: &str = "jpn";

// descriptor suffix markers, as planted by the episode list builder
const DIRECT_MARKER: &str = "!!TRUE!!";
const PAGED_MARKER_RE: &str = r"&ep=(\d+)!!FALSE!!";

/// One stream-host entry of the quality listing API.
#[derive(Deserialize, Debug)]
struct VideoQuality {
    #[serde(default)]
    audio: Option<String>,
    kwik_adfly: String,
}

/// AnimePahe link extractor. Owns the browsing session that all of its
/// extraction calls share.
pub struct AnimePaheExtractor<C = ReqwestHttpClient> {
    client: C,
    session: SessionStore,
    failure_policy: FailurePolicy,
}

impl Default for AnimePaheExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl AnimePaheExtractor {
    pub fn new() -> Self {
        Self::with_client(ReqwestHttpClient::new())
    }
}

impl<C: HttpClient> AnimePaheExtractor<C> {
    pub fn with_client(client: C) -> Self {
        Self {
            client,
            session: SessionStore::new(MAIN_URL),
            failure_policy: FailurePolicy::default(),
        }
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    #[cfg(test)]
    pub(crate) fn client_ref(&self) -> &C {
        &self.client
    }

    /// Resolves an episode descriptor to playable stream candidates, one
    /// per quality tier of the listing.
    pub async fn extract_streams(
        &self,
        descriptor: &str,
    ) -> Result<Vec<StreamCandidate>, ExtractError> {
        let listing_url = self.resolve_listing_url(descriptor).await?;
        let listing = self.fetch_quality_listing(&listing_url).await?;

        match self.failure_policy {
            FailurePolicy::AbortOnFirst => {
                let mut candidates = Vec::with_capacity(listing.len());
                for (key, quality) in &listing {
                    candidates.push(self.resolve_quality(key, quality).await?);
                }
                Ok(candidates)
            }
            FailurePolicy::SkipFailed => {
                let candidate_futures = listing
                    .iter()
                    .map(|(key, quality)| self.resolve_quality(key, quality));

                let candidates = futures::future::join_all(candidate_futures)
                    .await
                    .into_iter()
                    .filter_map(|result| match result {
                        Ok(candidate) => Some(candidate),
                        Err(err) => {
                            warn!("[animepahe] dropping quality: {err}");
                            None
                        }
                    })
                    .collect();
                Ok(candidates)
            }
        }
    }

    /// Descriptor state machine: a `DIRECT` marker means the descriptor
    /// already names the quality listing; a `PAGED` marker carries an
    /// episode number to look up in the release listing first; anything
    /// else is used as a listing URL as-is.
    async fn resolve_listing_url(&self, descriptor: &str) -> Result<String, ExtractError> {
        if descriptor.contains(DIRECT_MARKER) {
            return Ok(descriptor.replace(DIRECT_MARKER, ""));
        }

        static PAGED_RE: OnceLock<Regex> = OnceLock::new();
        let paged_re = PAGED_RE.get_or_init(|| Regex::new(PAGED_MARKER_RE).unwrap());

        if let Some(caps) = paged_re.captures(descriptor) {
            let episode = caps[1]
                .parse()
                .map_err(|_| ExtractError::Parse("episode number in descriptor"))?;
            let listing_url = paged_re.replace(descriptor, "").into_owned();
            return self.lookup_episode(&listing_url, episode).await;
        }

        Ok(descriptor.to_owned())
    }

    /// Finds the release-listing entry for `episode` and rewrites it into
    /// a direct quality-listing URL.
    async fn lookup_episode(
        &self,
        listing_url: &str,
        episode: u32,
    ) -> Result<String, ExtractError> {
        #[derive(Deserialize)]
        struct ReleaseEpisode {
            anime_id: u32,
            episode: u32,
            session: String,
        }

        #[derive(Deserialize)]
        struct ReleaseListing {
            data: Vec<ReleaseEpisode>,
        }

        let res = self
            .client
            .get(
                listing_url,
                RequestOptions::default().referer(&format!("{MAIN_URL}/")),
            )
            .await?;
        let listing: ReleaseListing = serde_json::from_str(&res.text)?;

        let entry = listing
            .data
            .iter()
            .find(|e| e.episode == episode)
            .ok_or(ExtractError::LookupMiss(episode))?;

        Ok(format!(
            "{MAIN_URL}/api?m=links&id={}&session={}&p=kwik",
            entry.anime_id, entry.session
        ))
    }

    async fn fetch_quality_listing(
        &self,
        url: &str,
    ) -> Result<Vec<(String, VideoQuality)>, ExtractError> {
        #[derive(Deserialize)]
        struct QualityListing {
            data: Vec<IndexMap<String, VideoQuality>>,
        }

        let res = self
            .client
            .get(url, RequestOptions::default().referer(&format!("{MAIN_URL}/")))
            .await?;
        let listing: QualityListing = serde_json::from_str(&res.text)?;

        Ok(listing
            .data
            .into_iter()
            .flat_map(IndexMap::into_iter)
            .collect())
    }

    async fn resolve_quality(
        &self,
        key: &str,
        quality: &VideoQuality,
    ) -> Result<StreamCandidate, ExtractError> {
        let final_url = kwik::extract(&self.client, &self.session, &quality.kwik_adfly).await?;

        Ok(StreamCandidate {
            server_label: SERVER_LABEL.into(),
            quality_label: utils::text::quality_label(key),
            audio_label: quality
                .audio
                .clone()
                .unwrap_or_else(|| DEFAULT_AUDIO.into()),
            final_url,
            is_encrypted: false,
        })
    }
}
