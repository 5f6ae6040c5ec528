use crate::config::AppConfig;
use crate::types::{ACRES_PER_SQ_DEGREE, RankedSite};
use anyhow::Result;
use axum::{
    Router,
    extract::{Query, State},
    response::Json,
    routing::get,
};
use rstar::{AABB, PointDistance, RTree, RTreeObject};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

// Wrapper for RTree indexing
struct SiteIndex {
    index: usize,
    position: [f64; 2],
}

impl RTreeObject for SiteIndex {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.position)
    }
}

impl PointDistance for SiteIndex {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.position[0] - point[0];
        let dy = self.position[1] - point[1];
        dx * dx + dy * dy
    }
}

pub struct AppState {
    pub sites: Vec<RankedSite>,
    pub tree: RTree<SiteIndex>,
}

#[derive(Deserialize)]
pub struct QueryParams {
    lat: f64,
    lon: f64,
}

#[derive(Serialize)]
pub struct SiteResponse {
    zone: String,
    area: f64,
    area_acres: f64,
    compact_score: u8,
    big_box_score: u8,
    winner: &'static str,
    margin: u8,
    location: [f64; 2],
    /// Distance from the query point, in degrees.
    distance: f64,
}

pub async fn start_server(config: AppConfig, sites: Vec<RankedSite>) -> Result<()> {
    println!("Building spatial index for {} ranked sites...", sites.len());
    let tree_items: Vec<SiteIndex> = sites
        .iter()
        .enumerate()
        .map(|(i, site)| SiteIndex {
            index: i,
            position: [site.location.x(), site.location.y()],
        })
        .collect();
    let tree = RTree::bulk_load(tree_items);

    let state = Arc::new(AppState { sites, tree });

    let port = config.server.port;
    let addr = SocketAddr::from(([127, 0, 0, 1], port));

    tracing::info!("Starting server on http://{}", addr);

    // The ranked-site collection is served from its output directory so the
    // frontend can fetch it like any other static file.
    let data_dir = config
        .output
        .sites
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf();

    let app = Router::new()
        .route("/api/site", get(site_handler))
        .nest_service("/data", ServeDir::new(data_dir))
        .nest_service("/", ServeDir::new("."))
        .layer(CorsLayer::permissive())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn site_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<QueryParams>,
) -> Json<Option<SiteResponse>> {
    let query = [params.lon, params.lat];

    let nearest = state.tree.nearest_neighbor(&query);

    let response = nearest.and_then(|entry| {
        state.sites.get(entry.index).map(|site| SiteResponse {
            zone: site.zone.clone(),
            area: site.area,
            area_acres: site.area * ACRES_PER_SQ_DEGREE,
            compact_score: site.score.compact,
            big_box_score: site.score.big_box,
            winner: site.winner.as_str(),
            margin: site.margin,
            location: [site.location.x(), site.location.y()],
            distance: entry.distance_2(&query).sqrt(),
        })
    });

    Json(response)
}
