use crate::bridge::board::ShotBoard;
use anyhow::Context;
use log::info;
use serde::Deserialize;
use std::{
    net::SocketAddr,
    sync::{Arc, RwLock},
};
use warp::{http::StatusCode, Filter};
use zerocore::sync::{ClearReceipt, CoordsPayload};

pub type SharedBoard = Arc<RwLock<ShotBoard>>;

#[derive(Debug, Deserialize)]
struct DiffQuery {
    last_id: Option<i64>,
}

/// Manually reported impact.
#[derive(Debug, Deserialize)]
struct ShotRequest {
    x: f64,
    y: f64,
}

/// Bridge that hosts the scoring-board HTTP endpoints.
pub struct ScoringBridge {
    board: SharedBoard,
}

impl ScoringBridge {
    pub fn new(board: SharedBoard) -> Self {
        Self { board }
    }

    pub fn board(&self) -> SharedBoard {
        self.board.clone()
    }

    /// Binds `addr` and serves on the current runtime. Returns the bound
    /// address, which differs from `addr` when port 0 was requested.
    pub fn start(&self, addr: SocketAddr) -> anyhow::Result<SocketAddr> {
        let (bound, server) = warp::serve(routes(self.board.clone()))
            .try_bind_ephemeral(addr)
            .with_context(|| format!("binding scoring board on {addr}"))?;
        tokio::spawn(server);
        self.publish_status(&format!("scoring board listening on http://{bound}"));
        Ok(bound)
    }

    pub fn publish_status(&self, message: &str) {
        info!("[board] {}", message);
    }
}

/// `/coords/all`, `/coords/diff`, `/coords/clear` and `/coords/shot`.
pub fn routes(
    board: SharedBoard,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let board_filter = warp::any().map(move || board.clone());

    let all_route = warp::path!("coords" / "all")
        .and(warp::get())
        .and(board_filter.clone())
        .map(|board: SharedBoard| {
            let coords = board.read().map(|b| b.all()).unwrap_or_default();
            warp::reply::json(&CoordsPayload { coords })
        });

    let diff_route = warp::path!("coords" / "diff")
        .and(warp::get())
        .and(warp::query::<DiffQuery>())
        .and(board_filter.clone())
        .map(|query: DiffQuery, board: SharedBoard| {
            let coords = board
                .read()
                .map(|b| b.since(query.last_id))
                .unwrap_or_default();
            warp::reply::json(&CoordsPayload { coords })
        });

    let clear_route = warp::path!("coords" / "clear")
        .and(warp::post())
        .and(board_filter.clone())
        .map(|board: SharedBoard| match board.write() {
            Ok(mut guard) => {
                let cleared = guard.clear();
                info!("[board] cleared {cleared} shots");
                warp::reply::with_status(
                    warp::reply::json(&ClearReceipt {
                        status: "ok".into(),
                        cleared,
                    }),
                    StatusCode::OK,
                )
            }
            Err(_) => warp::reply::with_status(
                warp::reply::json(&ClearReceipt {
                    status: "board unavailable".into(),
                    cleared: 0,
                }),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        });

    let shot_route = warp::path!("coords" / "shot")
        .and(warp::post())
        .and(warp::body::json())
        .and(board_filter)
        .map(|shot: ShotRequest, board: SharedBoard| match board.write() {
            Ok(mut guard) => {
                let record = guard.push(shot.x, shot.y);
                info!("[board] manual shot #{} at ({}, {})", record.id, shot.x, shot.y);
                warp::reply::with_status(warp::reply::json(&record), StatusCode::CREATED)
            }
            Err(_) => warp::reply::with_status(
                warp::reply::json(&serde_json::json!({"status": "board unavailable"})),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        });

    all_route.or(diff_route).or(clear_route).or(shot_route)
}
