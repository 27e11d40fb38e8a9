use std::sync::Arc;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
};
use tower_http::trace::TraceLayer;
use tracing::{debug, warn};

use crate::{
    AppState,
    error::{AppError, AppResult},
    flash::Flash,
    models::MovieForm,
    templates,
    validation::MovieId,
};

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/movies", get(list).post(create))
        .route("/movies/create", get(create_form))
        .route("/movies/{id}", get(show).post(update))
        .route("/movies/{id}/update", get(update_form))
        .route("/movies/{id}/delete", get(delete))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

pub async fn index() -> Redirect {
    Redirect::to("/movies")
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    mut flash: Flash,
) -> AppResult<(Flash, Html<String>)> {
    let movies = state.store.list().await?;
    let messages = flash.drain_messages();
    let body = templates::movies_page(&state.config.site_title, &movies, &messages);
    Ok((flash, Html(body)))
}

pub async fn create_form(State(state): State<Arc<AppState>>) -> Html<String> {
    Html(templates::create_page(&state.config.site_title))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    mut flash: Flash,
    form: MovieForm,
) -> AppResult<(Flash, Redirect)> {
    let input = form.validate(current_year()).inspect_err(|errors| {
        debug!(errors = errors.len(), "rejected movie form");
    })?;

    let id = state.store.create(&input).await?;

    flash.add_message(format!("Movie with id {id} created."));
    Ok((flash, Redirect::to(&format!("/movies/{id}"))))
}

pub async fn show(
    State(state): State<Arc<AppState>>,
    MovieId(id): MovieId,
    mut flash: Flash,
) -> AppResult<(Flash, Html<String>)> {
    let movie = state.store.get(id).await?.ok_or(AppError::NotFound(id))?;
    let messages = flash.drain_messages();
    let body = templates::movie_page(&state.config.site_title, &movie, &messages);
    Ok((flash, Html(body)))
}

pub async fn update_form(
    State(state): State<Arc<AppState>>,
    MovieId(id): MovieId,
) -> AppResult<Response> {
    let Some(movie) = state.store.get(id).await? else {
        return Ok(missing(id));
    };
    Ok(Html(templates::edit_page(&state.config.site_title, &movie)).into_response())
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    MovieId(id): MovieId,
    mut flash: Flash,
    form: MovieForm,
) -> AppResult<(Flash, Redirect)> {
    let input = form.validate(current_year()).inspect_err(|errors| {
        debug!(movie_id = id, errors = errors.len(), "rejected movie form");
    })?;

    if state.store.update(id, &input).await? {
        flash.add_message(format!("Movie with id {id} updated."));
        Ok((flash, Redirect::to(&format!("/movies/{id}"))))
    } else {
        warn!(movie_id = id, "update matched no movie");
        flash.add_message(format!("Movie with id {id} could not be updated."));
        Ok((flash, Redirect::to("/movies")))
    }
}

pub async fn delete(
    State(state): State<Arc<AppState>>,
    MovieId(id): MovieId,
    mut flash: Flash,
) -> AppResult<Response> {
    if !state.store.delete(id).await? {
        return Ok(missing(id));
    }
    flash.add_message(format!("Movie with id {id} deleted."));
    Ok((flash, Redirect::to("/movies")).into_response())
}

fn missing(id: i32) -> Response {
    (StatusCode::NOT_FOUND, format!("There is no resource with id {id}")).into_response()
}

fn current_year() -> i32 {
    let today: jiff::civil::Date = jiff::Zoned::now().into();
    i32::from(today.year())
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{Body, to_bytes},
        http::{Request, header},
    };
    use sea_orm::{EntityTrait, PaginatorTrait};
    use tower::ServiceExt;

    use super::*;
    use crate::{
        config::Config,
        entities::{director, movie},
        store::{
            MovieStore,
            tests::{input, memory_store},
        },
    };

    fn app(store: MovieStore) -> Router {
        let config = Config {
            addr: "127.0.0.1:0".parse().unwrap(),
            database_url: "sqlite::memory:".to_string(),
            database_max_connections: 1,
            site_title: "Filmdatabasen".to_string(),
        };
        router(Arc::new(AppState { config: Arc::new(config), store }))
    }

    fn get(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).unwrap()
    }

    fn post(uri: &str, body: &str) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_text(resp: Response) -> String {
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn location(resp: &Response) -> &str {
        resp.headers().get(header::LOCATION).unwrap().to_str().unwrap()
    }

    fn flash_cookie(resp: &Response) -> String {
        let set_cookie = resp.headers().get(header::SET_COOKIE).unwrap().to_str().unwrap();
        set_cookie.split(';').next().unwrap().to_string()
    }

    #[tokio::test]
    async fn root_redirects_to_list() {
        let resp = app(memory_store().await).oneshot(get("/")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&resp), "/movies");
    }

    #[tokio::test]
    async fn non_integer_id_is_rejected_before_any_query() {
        // No migrations: any query would fail with a 500.
        let db = crate::db::connect("sqlite::memory:", 1).await.unwrap();
        let app = app(MovieStore::new(db));

        for uri in ["/movies/abc", "/movies/abc/update", "/movies/1.5/delete"] {
            let resp = app.clone().oneshot(get(uri)).await.unwrap();
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{uri}");

            let json: serde_json::Value = serde_json::from_str(&body_text(resp).await).unwrap();
            let errors = json["errors"].as_array().unwrap();
            assert!(!errors.is_empty());
            assert_eq!(errors[0]["path"], "id");
            assert_eq!(errors[0]["location"], "params");
        }

        let resp = app.oneshot(post("/movies/abc", "title=x")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn create_form_needs_no_database() {
        let db = crate::db::connect("sqlite::memory:", 1).await.unwrap();
        let resp = app(MovieStore::new(db)).oneshot(get("/movies/create")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(body_text(resp).await.contains("action=\"/movies\""));
    }

    #[tokio::test]
    async fn create_redirects_and_flashes_once() {
        let store = memory_store().await;
        let app = app(store.clone());

        let resp = app
            .clone()
            .oneshot(post(
                "/movies",
                "title=Alien&tagline=Scream&year=1979&imdb_score=8.5&director=Ridley+Scott",
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        let target = location(&resp).to_string();
        let cookie = flash_cookie(&resp);

        let id: i32 = target.trim_start_matches("/movies/").parse().unwrap();
        assert_eq!(director::Entity::find().count(store.db()).await.unwrap(), 1);

        let shown = app
            .clone()
            .oneshot(Request::get(&target).header(header::COOKIE, &cookie).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(shown.status(), StatusCode::OK);
        let cleared = shown.headers().get(header::SET_COOKIE).unwrap().to_str().unwrap().to_string();
        assert!(cleared.contains("Max-Age=0"));
        let html = body_text(shown).await;
        assert!(html.contains("Alien"));
        assert!(html.contains("Ridley Scott"));
        assert!(html.contains(&format!("Movie with id {id} created.")));

        // Without the cookie the message is gone.
        let again = body_text(app.oneshot(get(&target)).await.unwrap()).await;
        assert!(!again.contains("created."));
    }

    #[tokio::test]
    async fn invalid_form_is_a_400_and_writes_nothing() {
        let store = memory_store().await;
        let resp = app(store.clone())
            .oneshot(post("/movies", "title=&year=soon&imdb_score=12&director=Someone"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let json: serde_json::Value = serde_json::from_str(&body_text(resp).await).unwrap();
        assert_eq!(json["errors"].as_array().unwrap().len(), 3);
        assert_eq!(movie::Entity::find().count(store.db()).await.unwrap(), 0);
        assert_eq!(director::Entity::find().count(store.db()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn unreadable_body_is_a_json_400() {
        let store = memory_store().await;
        let id = store.create(&input("Untouched", 5.0, None)).await.unwrap();
        let app = app(store.clone());

        for uri in ["/movies".to_string(), format!("/movies/{id}")] {
            let req = Request::post(&uri)
                .body(Body::from("title=X&year=2000&imdb_score=5"))
                .unwrap();
            let resp = app.clone().oneshot(req).await.unwrap();
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{uri}");

            let json: serde_json::Value = serde_json::from_str(&body_text(resp).await).unwrap();
            let errors = json["errors"].as_array().unwrap();
            assert_eq!(errors.len(), 1);
            assert_eq!(errors[0]["path"], "body");
            assert_eq!(errors[0]["location"], "body");
        }

        assert_eq!(movie::Entity::find().count(store.db()).await.unwrap(), 1);
        assert_eq!(store.get(id).await.unwrap().unwrap().title, "Untouched");
    }

    #[tokio::test]
    async fn leading_zero_id_is_rejected() {
        let resp = app(memory_store().await).oneshot(get("/movies/007")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn list_shows_best_score_first() {
        let store = memory_store().await;
        store.create(&input("Decent", 6.5, None)).await.unwrap();
        store.create(&input("Classic", 9.2, None)).await.unwrap();

        let resp = app(store).oneshot(get("/movies")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let html = body_text(resp).await;
        let classic = html.find("Classic").unwrap();
        let decent = html.find("Decent").unwrap();
        assert!(classic < decent);
    }

    #[tokio::test]
    async fn show_missing_movie_is_404() {
        let resp = app(memory_store().await).oneshot(get("/movies/99")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn update_form_for_missing_movie_is_plain_text() {
        let resp = app(memory_store().await).oneshot(get("/movies/99/update")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_text(resp).await, "There is no resource with id 99");
    }

    #[tokio::test]
    async fn update_form_is_prefilled() {
        let store = memory_store().await;
        let id = store.create(&input("Stalker", 8.1, Some("Andrei Tarkovsky"))).await.unwrap();

        let resp = app(store).oneshot(get(&format!("/movies/{id}/update"))).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let html = body_text(resp).await;
        assert!(html.contains("value=\"Stalker\""));
        assert!(html.contains("value=\"Andrei Tarkovsky\""));
    }

    #[tokio::test]
    async fn update_redirects_and_is_visible() {
        let store = memory_store().await;
        let id = store.create(&input("Solaris", 7.0, Some("Andrei Tarkovsky"))).await.unwrap();
        let app = app(store.clone());

        let resp = app
            .clone()
            .oneshot(post(
                &format!("/movies/{id}"),
                "title=Solaris+(1972)&tagline=&year=1972&imdb_score=8.0&director=Tarkovsky",
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&resp), format!("/movies/{id}"));

        let movie = store.get(id).await.unwrap().unwrap();
        assert_eq!(movie.title, "Solaris (1972)");
        assert_eq!(movie.tagline, "");
        assert_eq!(movie.release_year, 1972);
        assert_eq!(movie.imdb_score, 8.0);
        assert_eq!(movie.director.as_deref(), Some("Tarkovsky"));

        let html = body_text(app.oneshot(get(&format!("/movies/{id}"))).await.unwrap()).await;
        assert!(html.contains("Solaris (1972)"));
    }

    #[tokio::test]
    async fn update_of_missing_movie_flashes_failure() {
        let store = memory_store().await;
        let resp = app(store.clone())
            .oneshot(post("/movies/42", "title=X&year=2000&imdb_score=5&director=Nobody"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&resp), "/movies");
        assert!(flash_cookie(&resp).starts_with("flash="));
        assert_eq!(director::Entity::find().count(store.db()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn delete_existing_movie_redirects_to_list() {
        let store = memory_store().await;
        let id = store.create(&input("Gone", 3.0, None)).await.unwrap();

        let resp = app(store.clone()).oneshot(get(&format!("/movies/{id}/delete"))).await.unwrap();
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&resp), "/movies");
        assert!(flash_cookie(&resp).starts_with("flash="));
        assert!(store.get(id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_missing_movie_does_not_redirect() {
        let store = memory_store().await;
        store.create(&input("Stays", 4.0, None)).await.unwrap();

        let resp = app(store.clone()).oneshot(get("/movies/999/delete")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert!(resp.headers().get(header::LOCATION).is_none());
        assert_eq!(movie::Entity::find().count(store.db()).await.unwrap(), 1);
    }
}
