//! Unauthenticated read routes.

use crate::api::AppState;
use crate::api::error::ApiResult;
use crate::core::nightline::{self, NightlineFilter, NightlineView};
use crate::core::validation::{self, Language};
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Default, Deserialize)]
struct ListQuery {
    status: Option<String>,
    language: Option<String>,
    now: Option<String>,
}

impl ListQuery {
    fn into_filter(self) -> ApiResult<NightlineFilter> {
        let language = self
            .language
            .map(|value| value.parse::<Language>())
            .transpose()?;
        let now = self
            .now
            .map(|value| validation::parse_now_filter(&value))
            .transpose()?;
        Ok(NightlineFilter {
            status: self.status.filter(|status| !status.is_empty()),
            language,
            now,
        })
    }
}

/// Routes mounted under `/public`.
pub fn route() -> Router<AppState> {
    Router::new()
        .route("/all", get(list))
        .route("/:name", get(show))
}

async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<NightlineView>>> {
    let filter = query.into_filter()?;
    debug!("Public listing with {:?}", filter);
    Ok(Json(nightline::list_nightlines(&*state.db, &filter).await))
}

async fn show(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<Json<NightlineView>> {
    Ok(Json(nightline::get_public_view(&*state.db, &name).await?))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use crate::api::test_support::TestApp;
    use crate::core::nightline as registry;
    use crate::errors::Result;
    use crate::test_utils::setup_test_db;
    use axum::http::{Method, StatusCode};

    #[tokio::test]
    async fn test_show_nightline() -> Result<()> {
        let db = setup_test_db().await?;
        registry::register(&db, "testline").await?;
        let app = TestApp::new(db);

        let (status, body) = app.send(Method::GET, "/public/testline", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "testline");
        assert_eq!(body["status"], "default");
        assert_eq!(body["now"], false);
        assert!(body["description_en"].is_string());

        let (status, body) = app.send(Method::GET, "/public/missing", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["message"].as_str().unwrap().contains("missing"));
        Ok(())
    }

    #[tokio::test]
    async fn test_list_with_filters() -> Result<()> {
        let db = setup_test_db().await?;
        let first = registry::register(&db, "alpha").await?;
        registry::register(&db, "beta").await?;
        registry::set_status(&db, &first, "german").await?;
        let app = TestApp::new(db);

        let (status, body) = app.send(Method::GET, "/public/all", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 2);

        let (_, body) = app
            .send(Method::GET, "/public/all?language=de", None, None)
            .await;
        let names: Vec<&str> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|view| view["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["alpha"]);

        let (_, body) = app
            .send(Method::GET, "/public/all?status=default&now=false", None, None)
            .await;
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["name"], "beta");
        Ok(())
    }

    #[tokio::test]
    async fn test_list_rejects_bad_filters() -> Result<()> {
        let db = setup_test_db().await?;
        let app = TestApp::new(db);

        let (status, body) = app
            .send(Method::GET, "/public/all?language=fr", None, None)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].as_str().unwrap().contains("language"));

        let (status, _) = app
            .send(Method::GET, "/public/all?now=maybe", None, None)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        Ok(())
    }
}
