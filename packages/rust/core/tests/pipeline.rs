//! End-to-end pipeline runs against mock HTTP services.

use std::sync::Arc;
use std::time::Duration;

use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use newslens_core::{FALLBACK_GROUP_LABEL, GroupingCache, SearchGroupingPipeline};
use newslens_extract::HttpContentFetcher;
use newslens_llm::ChatCompletionsClient;
use newslens_search::BraveSearchClient;
use newslens_shared::{
    CacheConfig, FetchConfig, ModelClientConfig, ModelFailurePolicy, NewsLensError,
    SearchClientConfig,
};

fn article_html(headline: &str, body: &str) -> String {
    format!(
        "<html><head><title>{headline}</title></head><body>\
         <nav><p>Home World Business Sport Culture</p></nav>\
         <article><h1>{headline}</h1><p>{body}</p></article>\
         </body></html>"
    )
}

async fn mount_article(server: &MockServer, route: &str, headline: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html; charset=utf-8")
                .set_body_string(article_html(headline, body)),
        )
        .mount(server)
        .await;
}

async fn mount_search(server: &MockServer, urls: &[String]) {
    let results: Vec<_> = urls
        .iter()
        .enumerate()
        .map(|(i, url)| {
            serde_json::json!({
                "url": url,
                "title": format!("Search title {i}"),
                "description": format!("Search description {i}"),
                "profile": { "name": format!("Outlet {i}") }
            })
        })
        .collect();

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "rent control"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "web": { "results": results } })),
        )
        .mount(server)
        .await;
}

async fn mount_model(server: &MockServer, reply: &str) {
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": [{ "message": { "role": "assistant", "content": reply } }]
        })))
        .mount(server)
        .await;
}

fn pipeline(server: &MockServer) -> SearchGroupingPipeline {
    let search = BraveSearchClient::new(&SearchClientConfig {
        endpoint: format!("{}/search", server.uri()),
        api_key: "search-token".into(),
        result_count: 20,
    })
    .unwrap();

    let fetch = FetchConfig {
        timeout: Duration::from_secs(2),
        workers: 4,
        ..FetchConfig::default()
    };
    let fetcher = HttpContentFetcher::allowing_private_hosts(&fetch).unwrap();

    let model = ChatCompletionsClient::new(&ModelClientConfig {
        endpoint: format!("{}/v1", server.uri()),
        model: "test-model".into(),
        api_key: "model-token".into(),
        timeout: Duration::from_secs(5),
    })
    .unwrap();

    SearchGroupingPipeline::with_collaborators(
        Arc::new(search),
        Arc::new(fetcher),
        Arc::new(model),
        &fetch,
    )
}

#[tokio::test]
async fn groups_search_results_end_to_end() {
    let server = MockServer::start().await;
    let urls: Vec<String> = ["/a", "/b", "/c"]
        .iter()
        .map(|p| format!("{}{p}", server.uri()))
        .collect();

    mount_search(&server, &urls).await;
    mount_article(
        &server,
        "/a",
        "City caps rent increases",
        "The city council voted to cap annual rent increases at three percent for all tenants.",
    )
    .await;
    mount_article(
        &server,
        "/b",
        "Landlords warn of housing shortage",
        "Property owners argue that rent control will reduce the supply of new housing units.",
    )
    .await;
    // "/c" is not mounted, so wiremock answers 404 and the article degrades.

    let reply = format!(
        "Here is a scale from pro-tenant to pro-landlord:\n\n\
         **1. Pro-tenant**\n- Article: {}\n\
         **2. Pro-landlord**\n- Article: {}\n- Article: {}\n- Article: {}/unknown\n",
        urls[0], urls[1], urls[2], server.uri()
    );
    mount_model(&server, &reply).await;

    let result = pipeline(&server).run("rent control").await.unwrap();

    assert_eq!(
        result.labels().collect::<Vec<_>>(),
        vec!["Pro-tenant", "Pro-landlord"]
    );
    assert_eq!(result.article_count(), 3);

    let a = result.find_article(&urls[0]).unwrap();
    assert_eq!(a.title, "Search title 0");
    assert_eq!(a.source_name, "Outlet 0");
    assert!(a.has_usable_summary());
    assert!(a.effective_text().contains("cap annual rent increases"));

    let c = result.find_article(&urls[2]).unwrap();
    assert!(c.summary.is_none());
    assert_eq!(c.effective_text(), "Search description 2");

    let landlord = result.get("Pro-landlord").unwrap();
    assert_eq!(landlord.len(), 2);
}

#[tokio::test]
async fn search_failure_surfaces_as_search_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = pipeline(&server).run("rent control").await.unwrap_err();
    assert!(matches!(err, NewsLensError::Search(_)));
}

#[tokio::test]
async fn model_outage_falls_back_or_aborts() {
    let server = MockServer::start().await;
    let urls = vec![format!("{}/a", server.uri())];
    mount_search(&server, &urls).await;
    mount_article(&server, "/a", "Rents rise", "Average rents rose again this quarter in the city.").await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .mount(&server)
        .await;

    let result = pipeline(&server).run("rent control").await.unwrap();
    assert_eq!(result.len(), 1);
    assert_eq!(result.get(FALLBACK_GROUP_LABEL).map(|g| g.len()), Some(1));

    let err = pipeline(&server)
        .with_model_failure_policy(ModelFailurePolicy::Abort)
        .run("rent control")
        .await
        .unwrap_err();
    assert!(matches!(err, NewsLensError::Model(_)));
}

#[tokio::test]
async fn repeated_query_uses_cache() {
    let server = MockServer::start().await;
    let urls = vec![format!("{}/a", server.uri())];
    mount_search(&server, &urls).await;
    mount_article(&server, "/a", "Rents rise", "Average rents rose again this quarter in the city.").await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": [{ "message": { "content": format!("1. Housing\n- Article: {}", urls[0]) } }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let pipeline = pipeline(&server).with_cache(GroupingCache::new(&CacheConfig::default()));
    let first = pipeline.run("rent control").await.unwrap();
    let second = pipeline.run("rent control").await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first.labels().collect::<Vec<_>>(), vec!["Housing"]);
}
