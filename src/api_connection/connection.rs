use async_trait::async_trait;
use log::{debug, warn};
use reqwest::{Client, Url};
use std::sync::Arc;
use std::time::Duration;

use super::endpoints::{
    FoodSearchQuery, FoodSearchResponse, FDC_DATA_TYPES, FDC_PAGE_SIZE, USER_AGENT,
};
use crate::error::{FetchError, LookupError};
use crate::search::data_loader::{parse_sheet_csv, SheetRow};
use crate::search::food_search::{FoodCandidate, FoodSearch};
use crate::search::sheet_cache::SheetSource;

/// Shared HTTP client with the per-request timeout and a browser-like user agent.
pub fn build_http_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder().timeout(timeout).user_agent(USER_AGENT).build()
}

/// Retrieves the body of a page as text.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError>;
}

/// One proxied GET: `<proxy>?url=<target>`.
pub struct ProxyFetcher {
    client: Client,
    proxy: String,
}

impl ProxyFetcher {
    pub fn new(client: Client, proxy: &str) -> Self {
        Self {
            client,
            proxy: proxy.to_string(),
        }
    }

    pub fn proxied_url(&self, target: &str) -> Result<Url, FetchError> {
        Url::parse_with_params(&self.proxy, &[("url", target)])
            .map_err(|e| FetchError::InvalidUrl(format!("{}: {}", self.proxy, e)))
    }
}

#[async_trait]
impl PageFetcher for ProxyFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        let proxied = self.proxied_url(url)?;
        debug!("GET {}", proxied);
        let response = self.client.get(proxied).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: self.proxy.clone(),
            });
        }
        Ok(response.text().await?)
    }
}

/// Tries each fetcher in order and returns the first body obtained.
pub struct FetchChain {
    fetchers: Vec<Box<dyn PageFetcher>>,
}

impl FetchChain {
    pub fn new(fetchers: Vec<Box<dyn PageFetcher>>) -> Self {
        Self { fetchers }
    }

    pub fn from_proxies<S: AsRef<str>>(client: &Client, proxies: &[S]) -> Self {
        let fetchers = proxies
            .iter()
            .map(|p| Box::new(ProxyFetcher::new(client.clone(), p.as_ref())) as Box<dyn PageFetcher>)
            .collect();
        Self { fetchers }
    }
}

#[async_trait]
impl PageFetcher for FetchChain {
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        for (i, fetcher) in self.fetchers.iter().enumerate() {
            match fetcher.fetch_text(url).await {
                Ok(body) => return Ok(body),
                Err(e) => warn!("Fetch attempt {} for {} failed: {}", i + 1, url, e),
            }
        }
        Err(FetchError::Exhausted {
            url: url.to_string(),
        })
    }
}

/// Client for the FoodData Central `foods/search` endpoint.
pub struct FoodDataCentralClient {
    client: Client,
    api_key: String,
    search_url: String,
}

impl FoodDataCentralClient {
    pub fn new(client: Client, api_key: &str, search_url: &str) -> Self {
        Self {
            client,
            api_key: api_key.to_string(),
            search_url: search_url.to_string(),
        }
    }
}

#[async_trait]
impl FoodSearch for FoodDataCentralClient {
    async fn search(&self, term: &str) -> Result<Vec<FoodCandidate>, LookupError> {
        let query = FoodSearchQuery {
            api_key: &self.api_key,
            query: term,
            page_size: FDC_PAGE_SIZE,
            data_type: FDC_DATA_TYPES,
        };

        let response = self
            .client
            .get(&self.search_url)
            .query(&query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::Api {
                status: status.as_u16(),
            });
        }

        let body = response.json::<FoodSearchResponse>().await?;
        debug!("Food search '{}' returned {} foods", term, body.foods.len());
        Ok(body.foods.into_iter().map(FoodCandidate::from).collect())
    }
}

/// Downloads the published reference-sheet CSV on every call. Wrap in
/// `CachedSheet` to avoid refetching.
pub struct HttpSheet {
    client: Client,
    url: String,
}

impl HttpSheet {
    pub fn new(client: Client, url: &str) -> Self {
        Self {
            client,
            url: url.to_string(),
        }
    }
}

#[async_trait]
impl SheetSource for HttpSheet {
    async fn rows(&self) -> Result<Arc<Vec<SheetRow>>, LookupError> {
        let response = self.client.get(&self.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::Sheet(format!(
                "HTTP {} from {}",
                status.as_u16(),
                self.url
            )));
        }
        let body = response.bytes().await?;
        let rows = parse_sheet_csv(body.as_ref()).map_err(|e| LookupError::Sheet(e.to_string()))?;
        Ok(Arc::new(rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct ScriptedFetcher {
        name: &'static str,
        body: Option<&'static str>,
        calls: Arc<Mutex<Vec<&'static str>>>,
    }

    #[async_trait]
    impl PageFetcher for ScriptedFetcher {
        async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
            self.calls.lock().unwrap().push(self.name);
            match self.body {
                Some(body) => Ok(body.to_string()),
                None => Err(FetchError::Status {
                    status: 403,
                    url: url.to_string(),
                }),
            }
        }
    }

    fn chain(bodies: &[(&'static str, Option<&'static str>)]) -> (FetchChain, Arc<Mutex<Vec<&'static str>>>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let fetchers = bodies
            .iter()
            .map(|&(name, body)| {
                Box::new(ScriptedFetcher {
                    name,
                    body,
                    calls: calls.clone(),
                }) as Box<dyn PageFetcher>
            })
            .collect();
        (FetchChain::new(fetchers), calls)
    }

    #[tokio::test]
    async fn test_chain_falls_through_to_second_proxy() {
        let (chain, calls) = chain(&[("first", None), ("second", Some("<html>")), ("third", Some("unused"))]);
        let body = chain.fetch_text("https://example.com/r").await.unwrap();
        assert_eq!(body, "<html>");
        assert_eq!(*calls.lock().unwrap(), vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_chain_exhausted() {
        let (chain, calls) = chain(&[("first", None), ("second", None)]);
        let err = chain.fetch_text("https://example.com/r").await.unwrap_err();
        assert!(matches!(err, FetchError::Exhausted { .. }));
        assert_eq!(
            err.to_string(),
            "Could not fetch the URL. The site may be blocking access."
        );
        assert_eq!(calls.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_empty_chain_is_exhausted() {
        let (chain, _) = chain(&[]);
        assert!(matches!(
            chain.fetch_text("https://example.com").await,
            Err(FetchError::Exhausted { .. })
        ));
    }

    #[test]
    fn test_proxied_url_encodes_target() {
        let fetcher = ProxyFetcher::new(Client::new(), "https://api.allorigins.win/raw");
        let url = fetcher
            .proxied_url("https://example.com/recipe?id=7&x=a b")
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.allorigins.win/raw?url=https%3A%2F%2Fexample.com%2Frecipe%3Fid%3D7%26x%3Da+b"
        );
    }

    #[test]
    fn test_invalid_proxy_url() {
        let fetcher = ProxyFetcher::new(Client::new(), "not a url");
        assert!(matches!(
            fetcher.proxied_url("https://example.com"),
            Err(FetchError::InvalidUrl(_))
        ));
    }

    #[tokio::test]
    #[ignore] // hits the live FoodData Central API
    async fn test_live_food_search() {
        let client = build_http_client(Duration::from_secs(15)).unwrap();
        let fdc = FoodDataCentralClient::new(
            client,
            crate::api_connection::endpoints::FDC_DEMO_KEY,
            crate::api_connection::endpoints::FDC_SEARCH_URL,
        );
        let foods = fdc.search("egg").await.unwrap();
        assert!(!foods.is_empty());
    }
}
