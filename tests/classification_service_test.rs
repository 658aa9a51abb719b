use std::sync::Arc;
use std::time::Duration;

use docsort::application::ports::{ProviderError, ProviderInvoker};
use docsort::application::services::{ClassificationService, EscalationPolicy, HealthRegistry};
use docsort::domain::{
    CircuitState, ClassificationRequest, ClassificationResult, DocumentMetadata,
    ProviderDescriptor, ProviderId, ProviderKind, QualityTier, LABEL_PROCESSING_ERROR,
};
use docsort::infrastructure::cache::MemoryResultCache;
use docsort::infrastructure::providers::ScriptedProvider;

fn descriptor(name: &str, tier: u8) -> ProviderDescriptor {
    ProviderDescriptor {
        id: ProviderId::new(name),
        kind: ProviderKind::OpenAi,
        model: "gpt-4o-mini".to_string(),
        cost_per_call: 0.003,
        rate_limit_rpm: 500,
        tier: QualityTier::new(tier),
        supports_vision: true,
    }
}

fn request(filename: &str) -> ClassificationRequest {
    ClassificationRequest::new(
        filename.as_bytes().to_vec(),
        format!("contents of {filename}"),
        DocumentMetadata::new(filename, "pdf", 2048),
        vec![
            "invoice".to_string(),
            "bank_statement".to_string(),
            "unknown".to_string(),
        ],
    )
}

fn answer(label: &str, confidence: f64, provider: &str) -> Result<ClassificationResult, ProviderError> {
    Ok(ClassificationResult::new(
        label,
        confidence,
        ProviderId::new(provider),
    ))
}

fn transport_error() -> Result<ClassificationResult, ProviderError> {
    Err(ProviderError::Transport("connection refused".to_string()))
}

fn build_service(
    providers: &[Arc<ScriptedProvider>],
    failure_threshold: u32,
    attempt_timeout: Duration,
) -> (ClassificationService, Arc<MemoryResultCache>, Arc<HealthRegistry>) {
    let descriptors: Vec<ProviderDescriptor> =
        providers.iter().map(|p| p.descriptor().clone()).collect();
    let health = Arc::new(HealthRegistry::new(
        &descriptors,
        failure_threshold,
        Duration::from_secs(300),
    ));
    let cache = Arc::new(MemoryResultCache::new(Duration::from_secs(3600)));
    let invokers: Vec<Arc<dyn ProviderInvoker>> = providers
        .iter()
        .map(|p| Arc::clone(p) as Arc<dyn ProviderInvoker>)
        .collect();
    let service = ClassificationService::new(
        invokers,
        Arc::clone(&health),
        Arc::clone(&cache) as Arc<dyn docsort::application::ports::ResultCache>,
        EscalationPolicy::new(0.8),
        attempt_timeout,
    );
    (service, cache, health)
}

#[tokio::test]
async fn given_confident_primary_answer_when_classifying_then_no_escalation_occurs() {
    let primary = Arc::new(
        ScriptedProvider::new(descriptor("primary", 1))
            .with_outcome(answer("invoice", 0.95, "primary")),
    );
    let upgrade = Arc::new(
        ScriptedProvider::new(descriptor("upgrade", 2))
            .with_outcome(answer("invoice", 0.99, "upgrade")),
    );
    let (service, _, _) = build_service(
        &[Arc::clone(&primary), Arc::clone(&upgrade)],
        5,
        Duration::from_secs(5),
    );

    let result = service.classify(&request("invoice.pdf")).await;

    assert_eq!(result.label, "invoice");
    assert_eq!(result.provider, Some(ProviderId::new("primary")));
    assert!(!result.escalated);
    assert_eq!(primary.call_count(), 1);
    assert_eq!(upgrade.call_count(), 0);
}

#[tokio::test]
async fn given_cached_result_when_classifying_again_then_no_provider_is_invoked() {
    let primary = Arc::new(
        ScriptedProvider::new(descriptor("primary", 1))
            .with_outcome(answer("invoice", 0.95, "primary")),
    );
    let (service, cache, _) = build_service(&[Arc::clone(&primary)], 5, Duration::from_secs(5));

    let first = service.classify(&request("invoice.pdf")).await;
    let second = service.classify(&request("invoice.pdf")).await;

    assert!(!first.cached);
    assert!(second.cached);
    assert_eq!(second.label, "invoice");
    assert_eq!(primary.call_count(), 1);
    assert_eq!(cache.len(), 1);
}

#[tokio::test]
async fn given_low_confidence_when_higher_tier_exists_then_result_is_escalated() {
    let primary = Arc::new(
        ScriptedProvider::new(descriptor("primary", 1))
            .with_outcome(answer("bank_statement", 0.4, "primary")),
    );
    let upgrade = Arc::new(
        ScriptedProvider::new(descriptor("upgrade", 2))
            .with_outcome(answer("bank_statement", 0.9, "upgrade")),
    );
    let (service, _, _) = build_service(
        &[Arc::clone(&primary), Arc::clone(&upgrade)],
        5,
        Duration::from_secs(5),
    );

    let result = service.classify(&request("statement.pdf")).await;

    assert_eq!(result.label, "bank_statement");
    assert_eq!(result.provider, Some(ProviderId::new("upgrade")));
    assert!(result.escalated);
    assert_eq!(primary.call_count(), 1);
    assert_eq!(upgrade.call_count(), 1);
}

#[tokio::test]
async fn given_escalation_when_same_tier_sibling_exists_then_it_is_bypassed() {
    let primary = Arc::new(
        ScriptedProvider::new(descriptor("primary", 1))
            .with_outcome(answer("invoice", 0.3, "primary")),
    );
    let sibling = Arc::new(
        ScriptedProvider::new(descriptor("sibling", 1))
            .with_outcome(answer("invoice", 0.95, "sibling")),
    );
    let upgrade = Arc::new(
        ScriptedProvider::new(descriptor("upgrade", 2))
            .with_outcome(answer("invoice", 0.9, "upgrade")),
    );
    let (service, _, _) = build_service(
        &[Arc::clone(&primary), Arc::clone(&sibling), Arc::clone(&upgrade)],
        5,
        Duration::from_secs(5),
    );

    let result = service.classify(&request("invoice.pdf")).await;

    assert_eq!(result.provider, Some(ProviderId::new("upgrade")));
    assert_eq!(sibling.call_count(), 0);
}

#[tokio::test]
async fn given_primary_transport_failure_when_classifying_then_fallback_provider_answers() {
    let primary = Arc::new(
        ScriptedProvider::new(descriptor("primary", 1)).with_outcome(transport_error()),
    );
    let backup = Arc::new(
        ScriptedProvider::new(descriptor("backup", 1))
            .with_outcome(answer("invoice", 0.9, "backup")),
    );
    let (service, _, _) = build_service(
        &[Arc::clone(&primary), Arc::clone(&backup)],
        5,
        Duration::from_secs(5),
    );

    let result = service.classify(&request("invoice.pdf")).await;

    assert_eq!(result.provider, Some(ProviderId::new("backup")));
    // Fallback after failure is not an escalation.
    assert!(!result.escalated);
    assert_eq!(primary.call_count(), 1);
}

#[tokio::test]
async fn given_slow_provider_when_attempt_times_out_then_fallback_advances() {
    let slow = Arc::new(
        ScriptedProvider::new(descriptor("slow", 1))
            .with_outcome(answer("invoice", 0.95, "slow"))
            .with_delay(Duration::from_millis(500)),
    );
    let backup = Arc::new(
        ScriptedProvider::new(descriptor("backup", 1))
            .with_outcome(answer("invoice", 0.9, "backup")),
    );
    let (service, _, health) = build_service(
        &[Arc::clone(&slow), Arc::clone(&backup)],
        5,
        Duration::from_millis(50),
    );

    let result = service.classify(&request("invoice.pdf")).await;

    assert_eq!(result.provider, Some(ProviderId::new("backup")));
    // The expired attempt counts against the slow provider's health.
    let snapshot = health.snapshot();
    let slow_snap = snapshot
        .iter()
        .find(|s| s.provider == ProviderId::new("slow"))
        .expect("slow entry");
    assert_eq!(slow_snap.consecutive_failures, 1);
}

#[tokio::test]
async fn given_repeated_failures_when_threshold_reached_then_provider_is_skipped_via_open_circuit() {
    let flaky = Arc::new(
        ScriptedProvider::new(descriptor("flaky", 1)).with_outcome(transport_error()),
    );
    let backup = Arc::new(
        ScriptedProvider::new(descriptor("backup", 1))
            .with_outcome(answer("invoice", 0.9, "backup")),
    );
    let (service, _, health) = build_service(
        &[Arc::clone(&flaky), Arc::clone(&backup)],
        3,
        Duration::from_secs(5),
    );

    // Three distinct requests, three recorded failures.
    for n in 0..3 {
        let result = service.classify(&request(&format!("doc-{n}.pdf"))).await;
        assert_eq!(result.provider, Some(ProviderId::new("backup")));
    }
    assert_eq!(flaky.call_count(), 3);

    // Fourth request: breaker is open, the flaky provider is never attempted.
    let result = service.classify(&request("doc-4.pdf")).await;

    assert_eq!(result.provider, Some(ProviderId::new("backup")));
    assert_eq!(flaky.call_count(), 3);
    let snapshot = health.snapshot();
    let flaky_snap = snapshot
        .iter()
        .find(|s| s.provider == ProviderId::new("flaky"))
        .expect("flaky entry");
    assert_eq!(flaky_snap.state, CircuitState::Open);
}

#[tokio::test]
async fn given_all_providers_failing_then_processing_error_is_returned_and_never_cached() {
    let primary = Arc::new(
        ScriptedProvider::new(descriptor("primary", 1)).with_outcome(transport_error()),
    );
    let backup = Arc::new(
        ScriptedProvider::new(descriptor("backup", 1))
            .with_outcome(Err(ProviderError::RateLimited)),
    );
    let (service, cache, _) = build_service(
        &[Arc::clone(&primary), Arc::clone(&backup)],
        5,
        Duration::from_secs(5),
    );

    let result = service.classify(&request("invoice.pdf")).await;

    assert_eq!(result.label, LABEL_PROCESSING_ERROR);
    assert!(result.provider.is_none());
    assert!(result.rationale.is_some());
    assert!(cache.is_empty());

    // The transient failure must not poison the next identical request.
    service.classify(&request("invoice.pdf")).await;
    assert_eq!(primary.call_count(), 2);
}

#[tokio::test]
async fn given_escalation_target_failing_then_low_confidence_result_is_kept_as_best_effort() {
    let primary = Arc::new(
        ScriptedProvider::new(descriptor("primary", 1))
            .with_outcome(answer("invoice", 0.4, "primary")),
    );
    let upgrade = Arc::new(
        ScriptedProvider::new(descriptor("upgrade", 2)).with_outcome(transport_error()),
    );
    let (service, _, _) = build_service(
        &[Arc::clone(&primary), Arc::clone(&upgrade)],
        5,
        Duration::from_secs(5),
    );

    let result = service.classify(&request("invoice.pdf")).await;

    assert_eq!(result.label, "invoice");
    assert_eq!(result.provider, Some(ProviderId::new("primary")));
    // The provider was tried exactly once despite the failed escalation.
    assert_eq!(primary.call_count(), 1);
    assert_eq!(upgrade.call_count(), 1);
}

#[tokio::test]
async fn given_low_confidence_with_no_higher_tier_then_result_is_accepted_as_final() {
    let primary = Arc::new(
        ScriptedProvider::new(descriptor("primary", 1))
            .with_outcome(answer("invoice", 0.4, "primary")),
    );
    let (service, _, _) = build_service(&[Arc::clone(&primary)], 5, Duration::from_secs(5));

    let result = service.classify(&request("invoice.pdf")).await;

    assert_eq!(result.label, "invoice");
    assert!(!result.escalated);
    assert_eq!(primary.call_count(), 1);
}

#[tokio::test]
async fn given_equal_tier_providers_then_configured_order_decides_deterministically() {
    for _ in 0..5 {
        let first = Arc::new(
            ScriptedProvider::new(descriptor("first", 1))
                .with_outcome(answer("invoice", 0.9, "first")),
        );
        let second = Arc::new(
            ScriptedProvider::new(descriptor("second", 1))
                .with_outcome(answer("invoice", 0.9, "second")),
        );
        let (service, _, _) = build_service(
            &[Arc::clone(&first), Arc::clone(&second)],
            5,
            Duration::from_secs(5),
        );

        let result = service.classify(&request("invoice.pdf")).await;

        assert_eq!(result.provider, Some(ProviderId::new("first")));
        assert_eq!(second.call_count(), 0);
    }
}

#[tokio::test]
async fn given_tier_floor_then_lower_tier_providers_are_never_considered() {
    let cheap = Arc::new(
        ScriptedProvider::new(descriptor("cheap", 1))
            .with_outcome(answer("invoice", 0.95, "cheap")),
    );
    let premium = Arc::new(
        ScriptedProvider::new(descriptor("premium", 2))
            .with_outcome(answer("invoice", 0.9, "premium")),
    );
    let (service, _, _) = build_service(
        &[Arc::clone(&cheap), Arc::clone(&premium)],
        5,
        Duration::from_secs(5),
    );

    let result = service
        .classify(&request("invoice.pdf").with_tier_floor(QualityTier::new(2)))
        .await;

    assert_eq!(result.provider, Some(ProviderId::new("premium")));
    assert_eq!(cheap.call_count(), 0);
}

#[tokio::test]
async fn given_image_only_request_then_text_only_providers_are_filtered_out() {
    let mut text_only_descriptor = descriptor("text-only", 1);
    text_only_descriptor.supports_vision = false;
    let text_only = Arc::new(
        ScriptedProvider::new(text_only_descriptor)
            .with_outcome(answer("invoice", 0.95, "text-only")),
    );
    let vision = Arc::new(
        ScriptedProvider::new(descriptor("vision", 2))
            .with_outcome(answer("invoice", 0.9, "vision")),
    );
    let (service, _, _) = build_service(
        &[Arc::clone(&text_only), Arc::clone(&vision)],
        5,
        Duration::from_secs(5),
    );

    let mut image_only = request("scan.png");
    image_only.text = String::new();

    let result = service.classify(&image_only).await;

    assert_eq!(result.provider, Some(ProviderId::new("vision")));
    assert_eq!(text_only.call_count(), 0);
}

#[tokio::test]
async fn given_no_eligible_candidates_then_processing_error_is_returned_without_attempts() {
    let cheap = Arc::new(
        ScriptedProvider::new(descriptor("cheap", 1))
            .with_outcome(answer("invoice", 0.95, "cheap")),
    );
    let (service, cache, _) = build_service(&[Arc::clone(&cheap)], 5, Duration::from_secs(5));

    let result = service
        .classify(&request("invoice.pdf").with_tier_floor(QualityTier::new(3)))
        .await;

    assert_eq!(result.label, LABEL_PROCESSING_ERROR);
    assert_eq!(cheap.call_count(), 0);
    assert!(cache.is_empty());
}
