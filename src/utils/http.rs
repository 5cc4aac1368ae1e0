use std::collections::HashMap;

use reqwest::{header, redirect};

use super::create_client_builder;

/// Response surface the extraction pipeline needs: the status, the final
/// effective URL, the body, the raw `Location` header when redirects were
/// not followed, and any cookies the host tried to set.
#[derive(Debug, Clone, Default)]
pub struct HttpResponse {
    pub status: u16,
    pub url: String,
    pub text: String,
    pub location: Option<String>,
    pub cookies: HashMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub headers: Vec<(String, String)>,
    pub cookies: HashMap<String, String>,
    pub allow_redirects: bool,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            headers: vec![],
            cookies: HashMap::new(),
            allow_redirects: true,
        }
    }
}

impl RequestOptions {
    pub fn referer(mut self, referer: &str) -> Self {
        self.headers.push(("Referer".into(), referer.into()));
        self
    }

    pub fn cookies(mut self, cookies: HashMap<String, String>) -> Self {
        self.cookies = cookies;
        self
    }

    pub fn no_redirects(mut self) -> Self {
        self.allow_redirects = false;
        self
    }
}

/// Thin client seam so the retry protocol can run against scripted
/// transports in tests.
#[allow(async_fn_in_trait)]
pub trait HttpClient {
    async fn get(&self, url: &str, options: RequestOptions) -> anyhow::Result<HttpResponse>;

    async fn post_form(
        &self,
        url: &str,
        form: &[(&str, &str)],
        options: RequestOptions,
    ) -> anyhow::Result<HttpResponse>;
}

/// Production client. Cookies are managed by the caller, so the built-in
/// cookie store stays off; redirect handling is split between two clients
/// because the protocol has to read raw `Location` headers.
pub struct ReqwestHttpClient {
    redirecting: reqwest::Client,
    direct: reqwest::Client,
}

impl Default for ReqwestHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ReqwestHttpClient {
    pub fn new() -> Self {
        Self {
            redirecting: create_client_builder().build().unwrap(),
            direct: create_client_builder()
                .redirect(redirect::Policy::none())
                .build()
                .unwrap(),
        }
    }

    fn request(
        &self,
        method: reqwest::Method,
        url: &str,
        options: &RequestOptions,
    ) -> reqwest::RequestBuilder {
        let client = if options.allow_redirects {
            &self.redirecting
        } else {
            &self.direct
        };

        let mut builder = client.request(method, url);
        for (name, value) in &options.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if !options.cookies.is_empty() {
            builder = builder.header(header::COOKIE, cookie_header(&options.cookies));
        }
        builder
    }
}

impl HttpClient for ReqwestHttpClient {
    async fn get(&self, url: &str, options: RequestOptions) -> anyhow::Result<HttpResponse> {
        let res = self
            .request(reqwest::Method::GET, url, &options)
            .send()
            .await?;
        into_response(res).await
    }

    async fn post_form(
        &self,
        url: &str,
        form: &[(&str, &str)],
        options: RequestOptions,
    ) -> anyhow::Result<HttpResponse> {
        let res = self
            .request(reqwest::Method::POST, url, &options)
            .form(form)
            .send()
            .await?;
        into_response(res).await
    }
}

fn cookie_header(cookies: &HashMap<String, String>) -> String {
    cookies
        .iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect::<Vec<_>>()
        .join("; ")
}

async fn into_response(res: reqwest::Response) -> anyhow::Result<HttpResponse> {
    let status = res.status().as_u16();
    let url = res.url().to_string();
    let location = res
        .headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);
    let cookies = res
        .cookies()
        .map(|cookie| (cookie.name().to_owned(), cookie.value().to_owned()))
        .collect();
    let text = res.text().await?;

    Ok(HttpResponse {
        status,
        url,
        text,
        location,
        cookies,
    })
}
