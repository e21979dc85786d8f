//! End-to-end setup runs against a mock AnkiConnect

use std::time::Duration;

use avs_common::anki::AnkiConnectClient;
use avs_common::language::{LanguageConfig, TagPrefixes};
use avs_langsetup::{run, SetupError, SetupPlan};
use mockito::{Matcher, Server, ServerGuard};
use serde_json::{json, Value};

fn client(server: &ServerGuard) -> AnkiConnectClient {
    AnkiConnectClient::new(server.url(), Duration::from_secs(2), Duration::from_secs(4)).unwrap()
}

fn plan(config: Option<LanguageConfig>) -> SetupPlan {
    SetupPlan {
        deck: "Spanish 1".to_string(),
        config,
        tag_notes: false,
        remove_note_tags: false,
        dry_run: false,
        prefixes: TagPrefixes::default(),
    }
}

async fn mock_action(server: &mut ServerGuard, body: Value, result: Value) -> mockito::Mock {
    server
        .mock("POST", "/")
        .match_body(Matcher::PartialJson(body))
        .with_status(200)
        .with_body(json!({ "result": result, "error": null }).to_string())
        .create_async()
        .await
}

/// version + deckNames + findNotes for "Spanish 1" with the given notes
async fn mock_deck(server: &mut ServerGuard, notes: Value) {
    mock_action(server, json!({ "action": "version" }), json!(6)).await;
    mock_action(
        server,
        json!({ "action": "deckNames" }),
        json!(["Default", "Spanish 1"]),
    )
    .await;
    mock_action(
        server,
        json!({ "action": "findNotes", "params": { "query": "deck:\"Spanish 1\"" } }),
        notes,
    )
    .await;
}

#[tokio::test]
async fn test_writes_deck_config_and_tags() {
    let mut server = Server::new_async().await;
    mock_deck(&mut server, json!([1, 2, 3])).await;
    let store = server
        .mock("POST", "/")
        .match_body(Matcher::PartialJson(json!({
            "action": "storeMediaFile",
            "params": { "filename": "_ankiVoice.deck.Spanish_1.json" }
        })))
        .with_status(200)
        .with_body(r#"{"result": "_ankiVoice.deck.Spanish_1.json", "error": null}"#)
        .expect(1)
        .create_async()
        .await;
    let tag = mock_action(
        &mut server,
        json!({
            "action": "addTags",
            "params": { "notes": [1, 2, 3], "tags": "av:front=es-ES av:back=en-GB" }
        }),
        Value::Null,
    )
    .await;

    let mut plan = plan(Some(LanguageConfig::new("es-ES", "en-GB")));
    plan.tag_notes = true;

    let mut out = Vec::new();
    run(&client(&server), &plan, &mut out).await.unwrap();
    let out = String::from_utf8(out).unwrap();

    store.assert_async().await;
    tag.assert_async().await;
    assert!(out.contains("Connected to AnkiConnect (version=6)."));
    assert!(out.contains("Wrote deck config media: _ankiVoice.deck.Spanish_1.json"));
    assert!(out.contains("Deck 'Spanish 1': 3 notes."));
    assert!(out.ends_with("Done.\n"));
}

#[tokio::test]
async fn test_dry_run_writes_nothing() {
    let mut server = Server::new_async().await;
    mock_deck(&mut server, json!([1, 2])).await;
    let writes = server
        .mock("POST", "/")
        .match_body(Matcher::AnyOf(vec![
            Matcher::PartialJson(json!({ "action": "storeMediaFile" })),
            Matcher::PartialJson(json!({ "action": "addTags" })),
        ]))
        .expect(0)
        .create_async()
        .await;

    let mut plan = plan(Some(LanguageConfig::new("es-ES", "en-US")));
    plan.tag_notes = true;
    plan.dry_run = true;

    let mut out = Vec::new();
    run(&client(&server), &plan, &mut out).await.unwrap();
    let out = String::from_utf8(out).unwrap();

    writes.assert_async().await;
    assert!(out.contains("[dry-run] Would storeMediaFile: _ankiVoice.deck.Spanish_1.json"));
    assert!(out.contains("\"frontLang\": \"es-ES\""));
    assert!(out.contains("[dry-run] Would addTags to 2 notes: av:front=es-ES av:back=en-US"));
}

#[tokio::test]
async fn test_remove_tags_uses_literal_tokens() {
    let mut server = Server::new_async().await;
    mock_deck(&mut server, json!([5])).await;
    let remove = mock_action(
        &mut server,
        json!({
            "action": "removeTags",
            "params": { "notes": [5], "tags": "av:front= av:back=" }
        }),
        Value::Null,
    )
    .await;
    let store = server
        .mock("POST", "/")
        .match_body(Matcher::PartialJson(json!({ "action": "storeMediaFile" })))
        .expect(0)
        .create_async()
        .await;

    let mut plan = plan(None);
    plan.remove_note_tags = true;

    let mut out = Vec::new();
    run(&client(&server), &plan, &mut out).await.unwrap();

    remove.assert_async().await;
    store.assert_async().await;
    assert!(String::from_utf8(out).unwrap().contains("Removed av:front=/av:back= tags from notes."));
}

#[tokio::test]
async fn test_empty_deck_skips_tag_call() {
    let mut server = Server::new_async().await;
    mock_deck(&mut server, json!([])).await;
    mock_action(&mut server, json!({ "action": "storeMediaFile" }), json!("ok")).await;
    let tag = server
        .mock("POST", "/")
        .match_body(Matcher::PartialJson(json!({ "action": "addTags" })))
        .expect(0)
        .create_async()
        .await;

    let mut plan = plan(Some(LanguageConfig::new("es-ES", "en-US")));
    plan.tag_notes = true;

    let mut out = Vec::new();
    run(&client(&server), &plan, &mut out).await.unwrap();

    tag.assert_async().await;
    assert!(String::from_utf8(out).unwrap().contains("No notes found; skipping tag add."));
}

#[tokio::test]
async fn test_unknown_deck() {
    let mut server = Server::new_async().await;
    mock_action(&mut server, json!({ "action": "version" }), json!(6)).await;
    mock_action(&mut server, json!({ "action": "deckNames" }), json!(["Zoology", "Default"])).await;

    let mut out = Vec::new();
    let err = run(&client(&server), &plan(Some(LanguageConfig::new("es-ES", "en-US"))), &mut out)
        .await
        .unwrap_err();
    match err {
        SetupError::DeckNotFound { deck, known } => {
            assert_eq!(deck, "Spanish 1");
            assert_eq!(known, ["Default", "Zoology"]);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_anki_unreachable() {
    let client =
        AnkiConnectClient::new("http://127.0.0.1:9", Duration::from_secs(2), Duration::from_secs(4)).unwrap();
    let mut out = Vec::new();
    let err = run(&client, &plan(Some(LanguageConfig::new("es-ES", "en-US"))), &mut out)
        .await
        .unwrap_err();
    assert!(matches!(err, SetupError::Anki(ref e) if e.is_connectivity()));
    assert!(out.is_empty());
}
