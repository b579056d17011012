use std::sync::Arc;

use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use serde_json::{json, Value};

use moctail_api::api::{cors_layer, create_router, AppState};
use moctail_api::corpus::{builder, Corpus, MetadataIndex};
use moctail_api::services::InMemorySearchHistory;

const MOVIES_CSV: &str = r#"id,title,overview,genres,keywords,release_date,tagline,vote_average,vote_count
155,The Dark Knight,Batman fights the Joker for the soul of Gotham,"[{""id"": 28, ""name"": ""Action""}, {""id"": 80, ""name"": ""Crime""}, {""id"": 18, ""name"": ""Drama""}]","[{""id"": 1, ""name"": ""dc comics""}, {""id"": 2, ""name"": ""gotham""}]",2008-07-16,Why So Serious?,8.2,12002
49026,The Dark Knight Rises,Batman returns to Gotham to stop Bane,"[{""id"": 28, ""name"": ""Action""}, {""id"": 80, ""name"": ""Crime""}, {""id"": 18, ""name"": ""Drama""}, {""id"": 53, ""name"": ""Thriller""}]","[{""id"": 1, ""name"": ""dc comics""}, {""id"": 2, ""name"": ""gotham""}]",2012-07-16,The Legend Ends,7.6,9106
272,Batman Begins,Bruce Wayne becomes Batman to protect Gotham,"[{""id"": 28, ""name"": ""Action""}, {""id"": 80, ""name"": ""Crime""}, {""id"": 18, ""name"": ""Drama""}]","[{""id"": 1, ""name"": ""dc comics""}, {""id"": 3, ""name"": ""ninja""}]",2005-06-10,Evil fears the knight.,7.5,7359
862,Toy Story,A cowboy doll feels threatened by a space ranger toy,"[{""id"": 16, ""name"": ""Animation""}, {""id"": 35, ""name"": ""Comedy""}, {""id"": 10751, ""name"": ""Family""}]","[{""id"": 4, ""name"": ""toy""}, {""id"": 5, ""name"": ""friendship""}]",1995-10-30,,7.7,5269
863,Toy Story 2,The toys set out to rescue a cowboy doll stolen by a collector,"[{""id"": 16, ""name"": ""Animation""}, {""id"": 35, ""name"": ""Comedy""}, {""id"": 10751, ""name"": ""Family""}]","[{""id"": 4, ""name"": ""toy""}, {""id"": 6, ""name"": ""collector""}]",1999-10-30,The toys are back!,7.3,3914
597,Titanic,A young aristocrat falls in love aboard a doomed ship,"[{""id"": 18, ""name"": ""Drama""}, {""id"": 10749, ""name"": ""Romance""}]","[{""id"": 7, ""name"": ""ship""}, {""id"": 8, ""name"": ""love""}]",1997-11-18,Nothing on Earth could come between them.,7.5,7562
"#;

const CREDITS_CSV: &str = r#"movie_id,title,cast,crew
155,The Dark Knight,"[{""name"": ""Christian Bale""}, {""name"": ""Heath Ledger""}]","[{""job"": ""Director"", ""name"": ""Christopher Nolan""}]"
49026,The Dark Knight Rises,"[{""name"": ""Christian Bale""}, {""name"": ""Tom Hardy""}]","[{""job"": ""Director"", ""name"": ""Christopher Nolan""}]"
272,Batman Begins,"[{""name"": ""Christian Bale""}, {""name"": ""Liam Neeson""}]","[{""job"": ""Director"", ""name"": ""Christopher Nolan""}]"
862,Toy Story,"[{""name"": ""Tom Hanks""}, {""name"": ""Tim Allen""}]","[{""job"": ""Director"", ""name"": ""John Lasseter""}]"
863,Toy Story 2,"[{""name"": ""Tom Hanks""}, {""name"": ""Tim Allen""}]","[{""job"": ""Director"", ""name"": ""John Lasseter""}]"
597,Titanic,"[{""name"": ""Kate Winslet""}, {""name"": ""Leonardo DiCaprio""}]","[{""job"": ""Director"", ""name"": ""James Cameron""}]"
"#;

fn create_test_server() -> TestServer {
    let built = builder::build_from_readers(MOVIES_CSV.as_bytes(), CREDITS_CSV.as_bytes()).unwrap();
    let metadata = MetadataIndex::from_reader(MOVIES_CSV.as_bytes()).unwrap();
    let corpus = Corpus::from_built(built, metadata).unwrap();

    let state = AppState::new(Arc::new(corpus), Arc::new(InMemorySearchHistory::new()));
    let app = create_router(state, cors_layer(None));
    TestServer::new(app).unwrap()
}

fn titles(data: &Value) -> Vec<String> {
    data.as_array()
        .unwrap()
        .iter()
        .map(|m| m["title"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_home() {
    let server = create_test_server();
    let response = server.get("/").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["message"], "Backend is running successfully");
    assert_eq!(body["error"], Value::Null);
}

#[tokio::test]
async fn test_health_check_reports_corpus() {
    let server = create_test_server();
    let response = server.get("/health").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["movies"], 6);
    assert_eq!(body["data"]["metadata_records"], 6);
}

#[tokio::test]
async fn test_recommend_resolves_typo() {
    let server = create_test_server();
    let response = server.get("/api/recommend?movie=the%20drak%20knight").await;

    response.assert_status_ok();
    let body: Value = response.json();
    let data = &body["data"];
    assert_eq!(data["searched_movie"], "The Dark Knight");
    assert_eq!(data["searched_movie_id"], 155);
    assert_eq!(data["searched_year"], 2008);
    assert_eq!(data["searched_tagline"], "Why So Serious?");
    assert_eq!(data["searched_genres"], json!(["Action", "Crime", "Drama"]));

    let recommended = titles(&data["recommendations"]);
    assert_eq!(recommended.len(), 5);
    assert!(!recommended.contains(&"The Dark Knight".to_string()));

    let ratings: Vec<f64> = data["recommendations"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["rating"].as_f64().unwrap())
        .collect();
    assert!(ratings.windows(2).all(|pair| pair[0] >= pair[1]));
}

#[tokio::test]
async fn test_recommend_with_thresholds() {
    let server = create_test_server();
    let response = server
        .get("/api/recommend?movie=batman%20begins&min_rating=7.5&min_votes=8000")
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(
        titles(&body["data"]["recommendations"]),
        vec!["The Dark Knight", "The Dark Knight Rises"]
    );
}

#[tokio::test]
async fn test_recommend_missing_movie() {
    let server = create_test_server();
    let response = server.get("/api/recommend").await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["data"], Value::Null);
    assert_eq!(body["error"], "Movie parameter is required");
}

#[tokio::test]
async fn test_recommend_unknown_movie() {
    let server = create_test_server();
    let response = server.get("/api/recommend?movie=zzzzzznonexistentmovie").await;

    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["error"], "Movie not found");
}

#[tokio::test]
async fn test_recommend_bad_threshold() {
    let server = create_test_server();
    let response = server.get("/api/recommend?movie=titanic&min_rating=high").await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_popular_and_recent() {
    let server = create_test_server();

    let body: Value = server.get("/api/movies/popular").await.json();
    assert_eq!(titles(&body["data"])[0], "The Dark Knight");
    assert_eq!(titles(&body["data"]).len(), 6);

    let body: Value = server.get("/api/movies/recent").await.json();
    let recent = titles(&body["data"]);
    assert_eq!(recent[0], "The Dark Knight Rises");
    assert_eq!(recent.last().unwrap(), "Toy Story");
}

#[tokio::test]
async fn test_random_movies() {
    let server = create_test_server();
    let response = server.get("/api/movies/random").await;

    response.assert_status_ok();
    let body: Value = response.json();
    let picks = body["data"].as_array().unwrap();
    assert_eq!(picks.len(), 4);
    assert!(picks.iter().all(|m| m["rating"].as_f64().unwrap() > 6.0));
}

#[tokio::test]
async fn test_by_genres() {
    let server = create_test_server();
    let response = server
        .get("/api/movies/by-genres?genres=action,Drama&exclude=batman%20begins")
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(
        titles(&body["data"]),
        vec!["The Dark Knight", "The Dark Knight Rises", "Titanic"]
    );
    assert_eq!(body["data"][0]["overlap_count"], 2);
    assert_eq!(body["data"][2]["overlap_count"], 1);
}

#[tokio::test]
async fn test_by_genres_requires_genres() {
    let server = create_test_server();
    let response = server.get("/api/movies/by-genres").await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], "Genres parameter is required");
}

#[tokio::test]
async fn test_for_you_without_user_is_top_rated() {
    let server = create_test_server();
    let body: Value = server.get("/api/movies/for-you").await.json();
    assert_eq!(titles(&body["data"])[0], "The Dark Knight");
}

#[tokio::test]
async fn test_logged_searches_drive_for_you() {
    let server = create_test_server();

    let response = server
        .post("/api/log-search")
        .json(&json!({ "user_id": 9, "movie_title": "Toy Story" }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["message"], "Search logged");

    let body: Value = server.get("/api/movies/for-you?user_id=9").await.json();
    let picks = titles(&body["data"]);
    assert!(picks.contains(&"Toy Story 2".to_string()));
    assert!(!picks.contains(&"Toy Story".to_string()));
}

#[tokio::test]
async fn test_log_search_missing_fields() {
    let server = create_test_server();
    let response = server
        .post("/api/log-search")
        .json(&json!({ "user_id": 9 }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], "Missing user_id or movie_title");
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let server = create_test_server();
    let response = server
        .get("/health")
        .add_header(
            HeaderName::from_static("x-request-id"),
            HeaderValue::from_static("test-request-1"),
        )
        .await;

    assert_eq!(response.header("x-request-id"), "test-request-1");
}

#[tokio::test]
async fn test_unknown_route() {
    let server = create_test_server();
    let response = server.get("/api/nope").await;

    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["success"], false);
}
