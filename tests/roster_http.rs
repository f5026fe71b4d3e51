//! Roster client and ranking service against a mocked roster panel.

use knowledge_harness::ranking::{CacheState, HttpRosterClient, RankField, RankingService, RosterClient, TopFilters};
use knowledge_harness::traits::{KnowledgeSource, RetrieveOptions};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TTL: Duration = Duration::from_secs(3 * 60 * 60);

fn roster() -> serde_json::Value {
    json!([
        {"nombre": "Juan", "elv": 40, "kills": 12, "murio": 3, "npcsmuertes": 950,
         "rganados": 2, "rduosg": 1, "clase": 2, "raza": 1, "bando": 1},
        {"nombre": "Lupe", "elv": 47, "kills": 30, "murio": 9, "npcsmuertes": 400,
         "rganados": 0, "rduosg": null, "clase": 2, "raza": 4, "bando": 2},
        {"nombre": "Tito", "elv": 45, "kills": 0, "murio": 1, "npcsmuertes": 1200,
         "rganados": 5, "rduosg": 0, "clase": 1, "raza": 3, "bando": 1}
    ])
}

async fn mount_roster(server: &MockServer, expected_calls: u64) {
    Mock::given(method("GET"))
        .and(path("/roster"))
        .and(query_param_is_missing("user"))
        .respond_with(ResponseTemplate::new(200).set_body_json(roster()))
        .expect(expected_calls)
        .mount(server)
        .await;
}

fn client(server: &MockServer) -> HttpRosterClient {
    HttpRosterClient::new(
        format!("{}/roster", server.uri()),
        Some(Duration::from_secs(5)),
        false,
    )
    .unwrap()
}

#[tokio::test]
async fn fetch_all_parses_roster() {
    let server = MockServer::start().await;
    mount_roster(&server, 1).await;

    let players = client(&server).fetch_all().await.unwrap();
    assert_eq!(players.len(), 3);
    assert_eq!(players[1].name, "Lupe");
    assert_eq!(players[1].challenges_won_duo, 0);
}

#[tokio::test]
async fn null_name_rows_do_not_break_ranking() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/roster"))
        .and(query_param_is_missing("user"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"nombre": "Juan", "elv": 40, "npcsmuertes": 950},
            {"nombre": null, "elv": 50, "npcsmuertes": 5000}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let service = RankingService::new(Arc::new(client(&server)), TTL);
    let opts = RetrieveOptions::default();

    assert_eq!(service.get_all_players().await.unwrap().len(), 2);
    let frags = service.retrieve("cuantos npcs mato juan", &opts).await.unwrap();
    assert_eq!(frags[0].text, "**Juan** mató 950 NPCs.");
}

#[tokio::test]
async fn fetch_all_rejects_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/roster"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = client(&server).fetch_all().await.unwrap_err();
    assert!(err.to_string().contains("503"));
}

#[tokio::test]
async fn fetch_player_accepts_object_or_array() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/roster"))
        .and(query_param("user", "Ana"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"nombre": "Ana", "elv": 12})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/roster"))
        .and(query_param("user", "Beto"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"nombre": "Beto", "kills": 7}])))
        .mount(&server)
        .await;

    let c = client(&server);
    assert_eq!(c.fetch_player("Ana").await.unwrap().level, 12);
    assert_eq!(c.fetch_player("Beto").await.unwrap().kills, 7);
}

#[tokio::test]
async fn fetch_player_not_found_cases() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/roster"))
        .and(query_param("user", "Nadie"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/roster"))
        .and(query_param("user", "Fantasma"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let c = client(&server);
    assert!(c.fetch_player("Nadie").await.is_err());
    assert!(c.fetch_player("Fantasma").await.is_err());
}

#[tokio::test]
async fn service_fetches_once_within_ttl_and_persists() {
    let server = MockServer::start().await;
    mount_roster(&server, 1).await;
    let tmp = TempDir::new().unwrap();
    let side_store = tmp.path().join("cache").join("roster.json");

    let service = RankingService::new(Arc::new(client(&server)), TTL).with_side_store(side_store.clone());
    assert_eq!(service.cache_state().unwrap(), CacheState::Empty);

    let top = service
        .get_top_by(RankField::NpcKills, &TopFilters { limit: 2, ..TopFilters::default() })
        .await
        .unwrap();
    let names: Vec<&str> = top.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Tito", "Juan"]);

    // Second query is served from memory.
    service.get_all_players().await.unwrap();
    assert_eq!(service.cache_state().unwrap(), CacheState::Fresh);
    assert!(side_store.exists());

    // A new process with no network reuses the side-store.
    let offline = RankingService::new(
        Arc::new(HttpRosterClient::new("http://127.0.0.1:9/roster", Some(Duration::from_millis(200)), false).unwrap()),
        TTL,
    )
    .with_side_store(side_store);
    assert_eq!(offline.get_all_players().await.unwrap().len(), 3);
    assert_eq!(offline.cache_state().unwrap(), CacheState::DiskLoaded);
}

#[tokio::test]
async fn service_answers_detail_with_remote_fallback() {
    let server = MockServer::start().await;
    mount_roster(&server, 1).await;
    Mock::given(method("GET"))
        .and(path("/roster"))
        .and(query_param("user", "zoe"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"nombre": "Zoe", "npcsmuertes": 77})))
        .mount(&server)
        .await;

    let service = RankingService::new(Arc::new(client(&server)), TTL);
    let opts = RetrieveOptions::default();

    let frags = service.retrieve("cuantos npcs mato Juan", &opts).await.unwrap();
    assert_eq!(frags[0].text, "**Juan** mató 950 NPCs.");

    let frags = service.retrieve("cuantos npcs mato zoe", &opts).await.unwrap();
    assert_eq!(frags[0].text, "**Zoe** mató 77 NPCs.");
}
