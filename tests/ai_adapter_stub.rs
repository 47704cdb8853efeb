// tests/ai_adapter_stub.rs
use sam_opportunity_monitor::ai_adapter::{build_title_model, DisabledClient, TitleModel};
use sam_opportunity_monitor::config::ai::AiConfig;

#[tokio::test]
async fn disabled_client_reports_disabled() {
    let client = DisabledClient;
    assert!(!client.is_enabled());
    assert!(client.complete("Create a title").await.is_err());
}

#[serial_test::serial]
#[tokio::test]
async fn mock_mode_overrides_configured_key() {
    std::env::set_var("AI_TEST_MODE", "mock");
    let cfg = AiConfig {
        api_key: Some("sk-real".into()),
        ..AiConfig::default()
    };
    let model = build_title_model(&cfg).unwrap();
    std::env::remove_var("AI_TEST_MODE");

    assert_eq!(model.provider_name(), "mock");
    assert!(model.is_enabled());
    let title = model.complete("anything").await.unwrap();
    assert!(!title.is_empty());
}

#[serial_test::serial]
#[test]
fn key_selects_openai_and_absence_disables() {
    std::env::remove_var("AI_TEST_MODE");
    let with_key = AiConfig {
        api_key: Some("sk-real".into()),
        ..AiConfig::default()
    };
    assert_eq!(build_title_model(&with_key).unwrap().provider_name(), "openai");

    let blank = AiConfig {
        api_key: Some("  ".into()),
        ..AiConfig::default()
    };
    assert_eq!(build_title_model(&blank).unwrap().provider_name(), "disabled");
    assert_eq!(
        build_title_model(&AiConfig::default()).unwrap().provider_name(),
        "disabled"
    );
}
