use super::*;
use contentlens::cli::{AnalysisCommand, Command};
use contentlens::{run, Context};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

#[test]
fn analyses_results_command_fetches_filtered_page() {
    let runtime = test_runtime();
    runtime.block_on(async {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/analyses/a1/results"))
            .and(query_param("performance", "low"))
            .and(query_param("page_size", "50"))
            .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!([{
                "id": "r1", "analysis_id": "a1", "post_id": "p1", "performance": "low",
                "result_data": {"performance": "low", "problem_metrics": ["read_7d"]},
                "created_at": CREATED_AT
            }]))))
            .expect(1)
            .mount(&server)
            .await;
        let h = harness(&server, Some("jwt"));
        let ctx = Context::new(h.client.clone(), false);

        run(
            Command::Analyses(AnalysisCommand::Results {
                id: "a1".into(),
                performance: Some("low".into()),
                page: 1,
                page_size: 50,
            }),
            &ctx,
        )
        .await
        .expect("results command");
        assert_eq!(ctx.analyses.results()[0].post_id, "p1");
    });
}

#[test]
fn logged_out_cli_never_reaches_backend() {
    let runtime = test_runtime();
    runtime.block_on(async {
        let server = MockServer::start().await;
        let h = harness(&server, None);
        let ctx = Context::new(h.client.clone(), false);

        let err = run(
            Command::Analyses(AnalysisCommand::Show { id: "a1".into() }),
            &ctx,
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("contentlens login"));
        let received = server.received_requests().await.expect("recording enabled");
        assert!(received.is_empty());
    });
}
