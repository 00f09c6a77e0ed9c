//! Resource page fetch

use reqwest::StatusCode;
use tracing::{debug, warn};

use super::Harvester;
use crate::error::{Error, Result};
use crate::http;
use crate::types::{Event, ResourceId};

impl Harvester {
    /// GET the resource page and return its markup
    ///
    /// Anything but HTTP 200 is an [`Error::PageFetch`]. Bytes that are not
    /// valid UTF-8 are replaced rather than rejected.
    pub(super) async fn fetch_page(&self, id: ResourceId) -> Result<String> {
        let url = self.config.page_url(id);
        self.observer.on_progress(&Event::PageRequested {
            id,
            url: url.clone(),
        });

        let limit = self.config.http.page_timeout;
        let response = http::send(self.client.get(&url), limit).await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(Error::PageFetch {
                id,
                status: status.as_u16(),
            });
        }

        let body = http::read_body(response, limit).await?;
        let html = String::from_utf8_lossy(&body).into_owned();
        debug!(%id, bytes = body.len(), "Page fetched");

        if self.config.debug_dump {
            self.dump_page(id, &html).await;
        }
        Ok(html)
    }

    /// Save the page as `debug_<id>.html`; failures are only logged
    async fn dump_page(&self, id: ResourceId, html: &str) {
        let path = self.config.output_dir.join(format!("debug_{id}.html"));
        let written = async {
            tokio::fs::create_dir_all(&self.config.output_dir).await?;
            tokio::fs::write(&path, html).await
        }
        .await;

        match written {
            Ok(()) => debug!(%id, path = %path.display(), "Page saved for debugging"),
            Err(e) => warn!(%id, path = %path.display(), error = %e, "Could not save debug page"),
        }
    }
}
