use serde_json::Value;
use zerocore::sync::{decode_coords, RemotePoint};
use zerocore::{PointId, PointSource, SyncError, SyncResult};

/// Scoring board reached over HTTP+JSON.
pub struct HttpPointSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpPointSource {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn fetch_coords(&self, url: String) -> SyncResult<Vec<RemotePoint>> {
        let response = self.client.get(&url).send().await.map_err(transport)?;
        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::Status(status.as_u16()));
        }
        let body: Value = response
            .json()
            .await
            .map_err(|e| SyncError::Decode(e.to_string()))?;
        decode_coords(&body)
    }
}

impl PointSource for HttpPointSource {
    async fn fetch_all(&self) -> SyncResult<Vec<RemotePoint>> {
        self.fetch_coords(format!("{}/coords/all", self.base_url))
            .await
    }

    async fn fetch_since(&self, last_id: Option<PointId>) -> SyncResult<Vec<RemotePoint>> {
        let url = format!(
            "{}/coords/diff?last_id={}",
            self.base_url,
            last_id.unwrap_or(0)
        );
        self.fetch_coords(url).await
    }

    async fn clear(&self) -> SyncResult<()> {
        let response = self
            .client
            .post(format!("{}/coords/clear", self.base_url))
            .send()
            .await
            .map_err(transport)?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(SyncError::Status(status.as_u16()))
        }
    }
}

fn transport(err: reqwest::Error) -> SyncError {
    SyncError::Transport(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;
    use std::net::SocketAddr;
    use warp::http::StatusCode;
    use warp::Filter;

    fn serve_fake_board() -> SocketAddr {
        let all = warp::path!("coords" / "all").and(warp::get()).map(|| {
            warp::reply::json(&json!({
                "coords": [
                    {"id": 1, "x": 1.5, "y": -2.0},
                    {"id": 2, "x": "oops", "y": 0.0},
                    {"id": 3, "x": "4", "y": "5.5"}
                ]
            }))
        });
        let diff = warp::path!("coords" / "diff")
            .and(warp::get())
            .and(warp::query::<HashMap<String, String>>())
            .map(|query: HashMap<String, String>| {
                let last: u64 = query
                    .get("last_id")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(0);
                let coords: Vec<_> = (1..=4u64)
                    .filter(|id| *id > last)
                    .map(|id| json!({"id": id, "x": 0.0, "y": 0.0}))
                    .collect();
                warp::reply::json(&json!({ "coords": coords }))
            });
        let clear = warp::path!("coords" / "clear")
            .and(warp::post())
            .map(|| warp::reply::with_status("busy", StatusCode::SERVICE_UNAVAILABLE));

        let (addr, server) =
            warp::serve(all.or(diff).or(clear)).bind_ephemeral(([127, 0, 0, 1], 0));
        tokio::spawn(server);
        addr
    }

    #[tokio::test]
    async fn full_fetch_skips_malformed_records() {
        let addr = serve_fake_board();
        let source = HttpPointSource::new(&format!("http://{addr}/"));
        let points = source.fetch_all().await.unwrap();
        let ids: Vec<_> = points.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(points[1].y_mm, 5.5);
    }

    #[tokio::test]
    async fn diff_sends_the_cursor() {
        let addr = serve_fake_board();
        let source = HttpPointSource::new(&format!("http://{addr}"));
        let ids: Vec<_> = source
            .fetch_since(Some(2))
            .await
            .unwrap()
            .iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec![3, 4]);
        assert_eq!(source.fetch_since(None).await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn refused_clear_reports_status() {
        let addr = serve_fake_board();
        let source = HttpPointSource::new(&format!("http://{addr}"));
        assert!(matches!(source.clear().await, Err(SyncError::Status(503))));
    }

    #[tokio::test]
    async fn unreachable_board_is_a_transport_error() {
        let source = HttpPointSource::new("http://127.0.0.1:1");
        assert!(matches!(
            source.fetch_all().await,
            Err(SyncError::Transport(_))
        ));
    }
}
