//! Runner backed by an already running WebDriver service on this machine,
//! such as chromedriver or geckodriver.

use async_trait::async_trait;
use tracing::info;
use url::Url;

use webgrid_protocols::{Capabilities, CreatedSession, GridRequest, GridResponse, NodeError, SessionId};

use crate::client::WebDriverClient;
use crate::local::SessionRunner;

pub struct DriverServiceRunner {
    client: WebDriverClient,
}

impl DriverServiceRunner {
    pub fn new(url: Url) -> Self {
        info!(driver = %url, "Using local driver service");
        Self {
            client: WebDriverClient::new(url),
        }
    }

    pub fn url(&self) -> &Url {
        self.client.base()
    }
}

#[async_trait]
impl SessionRunner for DriverServiceRunner {
    async fn start(&self, capabilities: &Capabilities) -> Result<CreatedSession, NodeError> {
        self.client.create_session(capabilities).await
    }

    async fn execute(&self, _session: &SessionId, request: GridRequest) -> Result<GridResponse, NodeError> {
        self.client.forward(request).await
    }

    async fn stop(&self, session: &SessionId) -> Result<(), NodeError> {
        self.client.delete_session(session).await
    }
}
