use super::{parser, FetchError, RawTable, RegisterFetcher};
use std::time::Duration;
use tokio::runtime::Runtime;
use tracing::info;

const USER_AGENT: &str = concat!("kmatch-sponsors/", env!("CARGO_PKG_VERSION"));

/// Fetches the register page over HTTP. The async client runs on a private
/// current-thread runtime so callers stay synchronous.
pub struct HttpRegisterFetcher {
    client: reqwest::Client,
    runtime: Runtime,
}

impl HttpRegisterFetcher {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        Self::with_client(reqwest::Client::builder().timeout(timeout))
    }

    fn with_client(builder: reqwest::ClientBuilder) -> Result<Self, FetchError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(FetchError::Runtime)?;
        let client = builder.user_agent(USER_AGENT).build()?;

        Ok(Self { client, runtime })
    }

    fn fetch_html(&self, url: &str) -> Result<String, FetchError> {
        self.runtime.block_on(async {
            let response = self.client.get(url).send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(FetchError::Status {
                    url: url.to_string(),
                    status: status.as_u16(),
                });
            }
            Ok(response.text().await?)
        })
    }
}

impl std::fmt::Debug for HttpRegisterFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpRegisterFetcher").finish_non_exhaustive()
    }
}

impl RegisterFetcher for HttpRegisterFetcher {
    fn fetch_register(&self, url: &str) -> Result<RawTable, FetchError> {
        let html = self.fetch_html(url)?;
        let table = parser::parse_register_table(&html)?;
        info!(url, rows = table.rows.len(), "fetched sponsor register");
        Ok(table)
    }
}
