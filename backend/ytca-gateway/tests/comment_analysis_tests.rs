//! End-to-end tests for the comment-enrichment pipeline against mocked
//! YouTube and inference endpoints.

use serde_json::json;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use ytca_gateway::clients::ServiceClients;
use ytca_gateway::config::{
    Config, CorsConfig, GraphQLConfig, InferenceConfig, ServerConfig, YoutubeConfig,
};
use ytca_gateway::error::GatewayError;
use ytca_gateway::inference::CallerIdentity;
use ytca_gateway::pipeline;

fn test_config(base_url: &str, inference_key: Option<&str>) -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            workers: 1,
        },
        youtube: YoutubeConfig {
            base_url: format!("{base_url}/youtube/v3"),
            api_key: "test-google-key".to_string(),
        },
        inference: InferenceConfig {
            base_url: format!("{base_url}/v1/ent"),
            api_key: inference_key.map(String::from),
        },
        cors: CorsConfig {
            allowed_origins: vec![],
        },
        graphql: GraphQLConfig {
            playground: false,
            introspection: true,
        },
    }
}

fn test_clients(server: &MockServer) -> ServiceClients {
    ServiceClients::new(&test_config(&server.uri(), Some("test-inference-key")))
}

fn comment_item(text: &str, like_count: i64) -> serde_json::Value {
    json!({
        "snippet": {
            "topLevelComment": {
                "snippet": {
                    "textOriginal": text,
                    "likeCount": like_count,
                    "publishedAt": "2023-04-01T12:30:00Z"
                }
            }
        }
    })
}

async fn mount_comment_page(server: &MockServer, video_id: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/youtube/v3/commentThreads"))
        .and(query_param("videoId", video_id))
        .and(query_param("order", "relevance"))
        .and(query_param("maxResults", "10"))
        .and(query_param("textFormat", "plainText"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn mount_detection(server: &MockServer, input: &str, body: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path("/v1/ent/azure/1/cog-text-language-detect"))
        .and(body_json(json!({ "input": input })))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn mount_sentiment(server: &MockServer, input: &str, body: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path(
            "/v1/ent/huggingface/1/distilbert-base-uncased-finetuned-sst-2-english",
        ))
        .and(body_json(json!({ "input": input })))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn enrichment_preserves_length_and_order_despite_soft_failures() {
    let server = MockServer::start().await;

    mount_comment_page(
        &server,
        "vid1",
        json!({
            "nextPageToken": "tok-2",
            "items": [
                comment_item("hola amigos", 5),
                comment_item("mystery text", 0),
                comment_item("nice video", 12),
            ]
        }),
    )
    .await;

    // es -> eligible for translation
    mount_detection(
        &server,
        "hola amigos",
        json!({"response": [{"label": "es", "score": 0.93}]}),
    )
    .await;
    // detection blows up for this one -> fail open
    Mock::given(method("POST"))
        .and(path("/v1/ent/azure/1/cog-text-language-detect"))
        .and(body_json(json!({ "input": "mystery text" })))
        .respond_with(ResponseTemplate::new(500).set_body_string("detector down"))
        .mount(&server)
        .await;
    // en -> not in the supported set
    mount_detection(
        &server,
        "nice video",
        json!({"response": [{"label": "en", "score": 0.99}]}),
    )
    .await;

    Mock::given(method("POST"))
        .and(path("/v1/ent/ibmcloud/1/watson-translation-es-en"))
        .and(body_json(json!({ "input": "hola amigos" })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"response": [{"translation_text": "hello friends"}]})),
        )
        .expect(1)
        .mount(&server)
        .await;

    // sentiment runs on the translated text for the first comment and on the
    // original text for the rest
    mount_sentiment(
        &server,
        "hello friends",
        json!({"response": [{"label": "POSITIVE", "score": 0.99}]}),
    )
    .await;
    mount_sentiment(&server, "mystery text", json!({"response": []})).await;
    mount_sentiment(
        &server,
        "nice video",
        json!({"response": [{"label": "POSITIVE", "score": 0.87}]}),
    )
    .await;

    let clients = test_clients(&server);
    let page = pipeline::analyze_comments(&clients, &CallerIdentity::default(), "vid1", "")
        .await
        .expect("pipeline should succeed");

    assert_eq!(page.results.len(), 3);
    assert_eq!(page.next_page_token, "tok-2");

    let first = &page.results[0];
    assert_eq!(first.comment.text, "hola amigos");
    let translation = first.translation.as_ref().expect("es comment is translated");
    assert_eq!(translation.text, "hello friends");
    assert_eq!(translation.source_language, "es");
    assert_eq!(translation.score, 0.93);
    assert_eq!(first.sentiment.label, "POSITIVE");
    assert_eq!(first.sentiment.confidence, 0.99);

    let second = &page.results[1];
    assert_eq!(second.comment.text, "mystery text");
    assert!(second.translation.is_none());
    assert_eq!(second.sentiment.label, "UNKNOWN");
    assert_eq!(second.sentiment.confidence, 0.0);

    let third = &page.results[2];
    assert_eq!(third.comment.text, "nice video");
    assert!(third.translation.is_none());
    assert_eq!(third.sentiment.label, "POSITIVE");
}

#[tokio::test]
async fn embedded_unauthorized_fails_the_whole_page() {
    let server = MockServer::start().await;

    mount_comment_page(
        &server,
        "vid1",
        json!({
            "nextPageToken": "",
            "items": [comment_item("first", 1), comment_item("second", 2)]
        }),
    )
    .await;

    // no translations in play
    Mock::given(method("POST"))
        .and(path("/v1/ent/azure/1/cog-text-language-detect"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"response": []})))
        .mount(&server)
        .await;

    mount_sentiment(
        &server,
        "first",
        json!({"response": [{"label": "POSITIVE", "score": 0.9}]}),
    )
    .await;
    mount_sentiment(
        &server,
        "second",
        json!({"response": {"statusCode": 401, "body": "expired token"}}),
    )
    .await;

    let clients = test_clients(&server);
    let err = pipeline::analyze_comments(&clients, &CallerIdentity::default(), "vid1", "")
        .await
        .expect_err("embedded 401 must fail the page");

    assert!(matches!(err, GatewayError::Authentication(m) if m == "expired token"));
}

#[tokio::test]
async fn embedded_generic_failure_fails_the_whole_page() {
    let server = MockServer::start().await;

    mount_comment_page(
        &server,
        "vid1",
        json!({"nextPageToken": "", "items": [comment_item("only one", 0)]}),
    )
    .await;

    Mock::given(method("POST"))
        .and(path("/v1/ent/azure/1/cog-text-language-detect"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"response": []})))
        .mount(&server)
        .await;

    mount_sentiment(
        &server,
        "only one",
        json!({"response": {"statusCode": 503, "body": "model unavailable"}}),
    )
    .await;

    let clients = test_clients(&server);
    let err = pipeline::analyze_comments(&clients, &CallerIdentity::default(), "vid1", "")
        .await
        .expect_err("embedded non-401 must fail the page");

    assert!(matches!(err, GatewayError::Upstream(m) if m == "model unavailable"));
}

#[tokio::test]
async fn empty_page_short_circuits_without_inference_calls() {
    let server = MockServer::start().await;

    mount_comment_page(
        &server,
        "vid1",
        json!({"nextPageToken": "would-be-next", "items": []}),
    )
    .await;

    // any inference traffic at all is a bug
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let clients = test_clients(&server);
    let page = pipeline::analyze_comments(&clients, &CallerIdentity::default(), "vid1", "")
        .await
        .unwrap();

    assert!(page.results.is_empty());
    assert_eq!(page.next_page_token, "");
}

#[tokio::test]
async fn chinese_labels_share_the_zh_translation_endpoint() {
    let server = MockServer::start().await;

    mount_comment_page(
        &server,
        "vid1",
        json!({"nextPageToken": "", "items": [comment_item("很棒的影片", 3)]}),
    )
    .await;

    mount_detection(
        &server,
        "很棒的影片",
        json!({"response": [{"label": "zh_cht", "score": 0.88}]}),
    )
    .await;

    Mock::given(method("POST"))
        .and(path("/v1/ent/ibmcloud/1/watson-translation-zh-en"))
        .and(body_json(json!({ "input": "很棒的影片" })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"response": [{"translation_text": "great video"}]})),
        )
        .expect(1)
        .mount(&server)
        .await;

    mount_sentiment(
        &server,
        "great video",
        json!({"response": [{"label": "POSITIVE", "score": 0.95}]}),
    )
    .await;

    let clients = test_clients(&server);
    let page = pipeline::analyze_comments(&clients, &CallerIdentity::default(), "vid1", "")
        .await
        .unwrap();

    let translation = page.results[0].translation.as_ref().unwrap();
    // the endpoint gets the normalized code, the result keeps the original
    assert_eq!(translation.source_language, "zh_cht");
    assert_eq!(translation.text, "great video");
}

#[tokio::test]
async fn translation_failure_fails_the_whole_page() {
    let server = MockServer::start().await;

    mount_comment_page(
        &server,
        "vid1",
        json!({"nextPageToken": "", "items": [comment_item("bonjour", 0)]}),
    )
    .await;

    mount_detection(
        &server,
        "bonjour",
        json!({"response": [{"label": "fr", "score": 0.97}]}),
    )
    .await;

    Mock::given(method("POST"))
        .and(path("/v1/ent/ibmcloud/1/watson-translation-fr-en"))
        .respond_with(ResponseTemplate::new(500).set_body_string("translator down"))
        .mount(&server)
        .await;

    // classification must never start once translation failed
    Mock::given(method("POST"))
        .and(path(
            "/v1/ent/huggingface/1/distilbert-base-uncased-finetuned-sst-2-english",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"response": []})))
        .expect(0)
        .mount(&server)
        .await;

    let clients = test_clients(&server);
    let err = pipeline::analyze_comments(&clients, &CallerIdentity::default(), "vid1", "")
        .await
        .expect_err("translation failure is fail-closed");

    assert!(matches!(err, GatewayError::Upstream(_)));
}

#[tokio::test]
async fn youtube_fetch_failure_surfaces_as_upstream_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/youtube/v3/commentThreads"))
        .respond_with(ResponseTemplate::new(403).set_body_string("quota exceeded"))
        .mount(&server)
        .await;

    let clients = test_clients(&server);
    let err = pipeline::analyze_comments(&clients, &CallerIdentity::default(), "vid1", "")
        .await
        .expect_err("fetch failure must fail the request");

    assert!(matches!(err, GatewayError::Upstream(_)));
}
