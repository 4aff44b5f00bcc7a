use super::*;
use contentlens_core::{guard, AuthStore, DatasetStore, Navigation, Route};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, ResponseTemplate};

#[test]
fn login_then_gate_opens() {
    let runtime = test_runtime();
    runtime.block_on(async {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/auth/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(envelope(
                json!({"access_token": "fresh", "token_type": "bearer"}),
            )))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/auth/me"))
            .and(header("authorization", "Bearer fresh"))
            .respond_with(ResponseTemplate::new(200).set_body_json(envelope(user_json())))
            .mount(&server)
            .await;
        let h = harness(&server, None);
        let auth = AuthStore::new(h.client.clone());
        assert_eq!(
            guard("/datasets", auth.is_logged_in()),
            Navigation::Redirect("/login".into())
        );

        auth.login("alice", "secret").await.expect("login");
        assert_eq!(auth.user().map(|user| user.email), Some("alice@example.com".into()));
        assert_eq!(
            std::fs::read_to_string(h.storage.path().join("token")).expect("token file"),
            "fresh"
        );
        assert_eq!(
            guard("/datasets", auth.is_logged_in()),
            Navigation::Proceed(Route::Datasets)
        );
        assert_eq!(
            guard("/login", auth.is_logged_in()),
            Navigation::Redirect("/".into())
        );

        auth.logout();
        assert!(!h.storage.path().join("token").exists());
    });
}

#[test]
fn dataset_list_mirrors_last_successful_fetch() {
    let runtime = test_runtime();
    runtime.block_on(async {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/datasets"))
            .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!({
                "items": [dataset_json("d1", "completed"), dataset_json("d2", "processing")],
                "total": 2
            }))))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/datasets"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/api/v1/datasets/d2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!(null))))
            .mount(&server)
            .await;
        let mut h = harness(&server, Some("jwt"));
        let store = DatasetStore::new(h.client.clone());

        store.fetch_datasets(1, 20).await.expect("first fetch");
        assert!(store.fetch_datasets(1, 20).await.is_err());
        assert!(!store.loading());
        assert_eq!(store.datasets().len(), 2);

        store.delete_dataset("d2").await.expect("delete");
        assert_eq!(store.total(), 1);
        assert_eq!(
            h.notifications(),
            vec!["Server error, please try again later"]
        );
    });
}
