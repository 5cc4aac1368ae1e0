//! Stream resolution against the kwik host: poll the ad gate until it
//! surrenders the player page, decode the scrambled payload planted there,
//! then trade the page's hidden form token for the final media location.

pub mod adfly;
pub mod cipher;

use std::sync::OnceLock;

use log::debug;
use regex::Regex;

use crate::{
    error::ExtractError,
    session::SessionStore,
    utils::http::{HttpClient, HttpResponse, RequestOptions},
};

use self::cipher::CipherParams;

const KWIK_REFERER: &str = "https://kwik.cx/";
const MAX_ATTEMPTS: u32 = 20;

/// Progress of one bounded polling loop against the redirector. The
/// attempt cap is the only circuit breaker; a non-matching status means
/// "poll again", not "fail".
#[derive(Debug)]
struct RetryState {
    attempt: u32,
    max_attempts: u32,
    last_status: u16,
}

impl RetryState {
    fn new() -> Self {
        Self {
            attempt: 0,
            max_attempts: MAX_ATTEMPTS,
            last_status: 0,
        }
    }

    fn record(&mut self, status: u16) {
        self.attempt += 1;
        self.last_status = status;
    }

    fn exhausted(&self) -> bool {
        self.attempt >= self.max_attempts
    }
}

/// Resolves one `kwik_adfly` token to a direct stream URL.
pub async fn extract(
    client: &impl HttpClient,
    session: &SessionStore,
    adfly_uri: &str,
) -> Result<String, ExtractError> {
    let player_url = bypass_gate(client, session, adfly_uri).await?;

    let player_page = client
        .get(
            &player_url,
            RequestOptions::default()
                .referer(KWIK_REFERER)
                .cookies(session.snapshot()),
        )
        .await?;
    session.merge(player_page.cookies.clone());

    let decrypted = parse_cipher_params(&player_page.text)?.decrypt()?;

    static ACTION_RE: OnceLock<Regex> = OnceLock::new();
    static TOKEN_RE: OnceLock<Regex> = OnceLock::new();

    let action_url = ACTION_RE
        .get_or_init(|| Regex::new(r#"action="([^"]+)""#).unwrap())
        .captures(&decrypted)
        .map(|caps| caps[1].to_owned())
        .ok_or(ExtractError::Parse("kwik form action not found"))?;
    let token = TOKEN_RE
        .get_or_init(|| Regex::new(r#"value="([^"]+)""#).unwrap())
        .captures(&decrypted)
        .map(|caps| caps[1].to_owned())
        .ok_or(ExtractError::Parse("kwik form token not found"))?;

    exchange_token(client, &action_url, &token, &player_page).await
}

/// Polls the ad gate until it answers 200 and plants the `ysmm` payload.
///
/// Each attempt follows the gate's `Location` by hand and merges whatever
/// cookies the redirector hands back; the gate only settles once it is
/// satisfied with the accumulated session.
async fn bypass_gate(
    client: &impl HttpClient,
    session: &SessionStore,
    adfly_uri: &str,
) -> Result<String, ExtractError> {
    bootstrap_session(client, session).await?;

    let mut retry = RetryState::new();
    let gate = loop {
        if retry.exhausted() {
            debug!(
                "[kwik] giving up on ad gate, last status {}",
                retry.last_status
            );
            return Err(ExtractError::RetryExhausted {
                stage: "ad-gate bypass",
                attempts: retry.attempt,
            });
        }

        let cookies = session.snapshot();
        let hop = client
            .get(
                adfly_uri,
                RequestOptions::default()
                    .cookies(cookies.clone())
                    .no_redirects(),
            )
            .await?;
        let next_url = hop.location.unwrap_or(hop.url);

        let gate = client
            .get(
                &next_url,
                RequestOptions::default().cookies(cookies).no_redirects(),
            )
            .await?;
        session.merge(gate.cookies.clone());
        retry.record(gate.status);

        if gate.status == 200 {
            break gate;
        }
        debug!(
            "[kwik] ad gate answered {}, attempt {}",
            gate.status, retry.attempt
        );
    };

    static YSMM_RE: OnceLock<Regex> = OnceLock::new();
    let token = YSMM_RE
        .get_or_init(|| Regex::new(r"ysmm = '([^']+)").unwrap())
        .captures(&gate.text)
        .map(|caps| caps[1].to_owned())
        .ok_or(ExtractError::Parse("ad-gate payload not found"))?;

    let player_url = adfly::descramble(&token)?;
    if player_url.is_empty() {
        return Err(ExtractError::Parse("ad-gate token carried no link"));
    }
    Ok(player_url)
}

/// Posts the hidden form token until the host answers with the stream
/// redirect.
async fn exchange_token(
    client: &impl HttpClient,
    action_url: &str,
    token: &str,
    player_page: &HttpResponse,
) -> Result<String, ExtractError> {
    let mut retry = RetryState::new();
    loop {
        if retry.exhausted() {
            debug!(
                "[kwik] giving up on token exchange, last status {}",
                retry.last_status
            );
            return Err(ExtractError::RetryExhausted {
                stage: "kwik token exchange",
                attempts: retry.attempt,
            });
        }

        let res = client
            .post_form(
                action_url,
                &[("_token", token)],
                RequestOptions::default()
                    .referer(&player_page.url)
                    .cookies(player_page.cookies.clone())
                    .no_redirects(),
            )
            .await?;
        retry.record(res.status);

        if res.status == 302 {
            return res
                .location
                .ok_or(ExtractError::Parse("kwik redirect without location"));
        }
        debug!(
            "[kwik] token exchange answered {}, attempt {}",
            res.status, retry.attempt
        );
    }
}

/// One immediate re-bootstrap is allowed before the failure turns fatal.
async fn bootstrap_session(
    client: &impl HttpClient,
    session: &SessionStore,
) -> Result<(), ExtractError> {
    for _ in 0..2 {
        if session.ensure_session(client).await {
            return Ok(());
        }
    }
    Err(ExtractError::SessionBootstrap)
}

fn parse_cipher_params(text: &str) -> Result<CipherParams, ExtractError> {
    static PARAMS_RE: OnceLock<Regex> = OnceLock::new();
    let caps = PARAMS_RE
        .get_or_init(|| Regex::new(r#"\("(\w+)",\d+,"(\w+)",(\d+),(\d+),\d+\)"#).unwrap())
        .captures(text)
        .ok_or(ExtractError::Parse("kwik cipher params not found"))?;

    Ok(CipherParams {
        full_string: caps[1].to_owned(),
        key: caps[2].to_owned(),
        offset: caps[3]
            .parse()
            .map_err(|_| ExtractError::Parse("kwik cipher offset"))?,
        base: caps[4]
            .parse()
            .map_err(|_| ExtractError::Parse("kwik cipher base"))?,
    })
}
