use backbrain::services::summarizer::{failure_marker, OpenAISummarizer, Summarizer};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn completion(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [
            { "index": 0, "message": { "role": "assistant", "content": content }, "finish_reason": "stop" }
        ]
    })
}

#[tokio::test]
async fn test_summary_request_shape_and_trimmed_answer() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({
            "model": "gpt-4o-mini",
            "temperature": 0.2,
            "messages": [
                { "role": "system", "content": "Fasse deutsch, sachlich und kurz zusammen." },
                { "role": "user", "content": "Bitte ~50 Wörter:\n\nEin langer Text." }
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("  Kurzfassung.\n")))
        .expect(1)
        .mount(&server)
        .await;

    let summarizer = OpenAISummarizer::new(
        Some("sk-test".to_string()),
        &format!("{}/v1/", server.uri()),
        "gpt-4o-mini",
        50,
    )
    .unwrap();

    assert_eq!(summarizer.summarize("Ein langer Text.").await.unwrap(), "Kurzfassung.");
}

#[tokio::test]
async fn test_http_error_is_reported_with_kind() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let summarizer =
        OpenAISummarizer::new(Some("sk-test".to_string()), &server.uri(), "gpt-4o-mini", 120).unwrap();

    let err = summarizer.summarize("text").await.unwrap_err();
    assert_eq!(failure_marker(&err), "[auto-summary failed: HTTPError]");
}

#[tokio::test]
async fn test_unexpected_body_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let summarizer =
        OpenAISummarizer::new(Some("sk-test".to_string()), &server.uri(), "gpt-4o-mini", 120).unwrap();

    let err = summarizer.summarize("text").await.unwrap_err();
    assert_eq!(failure_marker(&err), "[auto-summary failed: DecodeError]");
}

#[tokio::test]
async fn test_empty_choices_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
        .mount(&server)
        .await;

    let summarizer =
        OpenAISummarizer::new(Some("sk-test".to_string()), &server.uri(), "gpt-4o-mini", 120).unwrap();

    let err = summarizer.summarize("text").await.unwrap_err();
    assert_eq!(failure_marker(&err), "[auto-summary failed: SummaryError]");
}
