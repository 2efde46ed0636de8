mod common;

use aifactory::{
  AiFactory, FactoryConfig, Provider, ProviderConfig, ProviderKind, Registry
};
use common::{init_logging, providers, MockProvider, RecordingSink};
use std::sync::Arc;

#[tokio::test]
async fn test_registry_keeps_registration_order()
{   init_logging();
    let c = MockProvider::new("C").build();
    let a = MockProvider::new("A").build();
    let b = MockProvider::new("B").build();
    let factory = AiFactory::new(FactoryConfig::new())
      .with_providers(providers(&[&c, &a, &b]));

    assert_eq!(factory.provider_ids().await, vec!["C", "A", "B"]);
}

#[tokio::test]
async fn test_offline_provider_is_skipped_and_reported()
{   let a = MockProvider::new("A").offline().build();
    let b = MockProvider::new("B").build();
    let sink = Arc::new(RecordingSink::default());
    let factory = AiFactory::new(FactoryConfig::new())
      .with_providers(providers(&[&a, &b]))
      .with_sink(sink.clone());

    assert_eq!(factory.provider_ids().await, vec!["B"]);
    assert!(factory.provider("A").await.is_none());
    assert!(sink.lines().iter().any(|l| l.contains("Skipping provider A")));
}

#[tokio::test]
async fn test_missing_sink_is_silent()
{   let a = MockProvider::new("A").offline().build();
    let factory = AiFactory::new(FactoryConfig::new())
      .with_providers(providers(&[&a]));

    assert!(factory.provider_ids().await.is_empty());
}

#[tokio::test]
async fn test_duplicate_ids_last_write_wins()
{   let first = MockProvider::new("A").models(&["old"]).build();
    let second = MockProvider::new("A").models(&["new"]).build();
    let b = MockProvider::new("B").build();
    let factory = AiFactory::new(FactoryConfig::new())
      .with_providers(providers(&[&first, &b, &second]));

    assert_eq!(factory.provider_ids().await, vec!["A", "B"]);
    let registered = factory.provider("A").await.expect("A registered");
    assert_eq!(registered.supported_models(), vec!["new"]);
}

#[tokio::test]
async fn test_discovery_failure_does_not_block_registration()
{   let a = MockProvider::new("A")
      .models(&["m1", "m2"])
      .discovery_fails()
      .build();
    let factory = AiFactory::new(FactoryConfig::new())
      .with_providers(providers(&[&a]));

    assert_eq!(factory.provider_ids().await, vec!["A"]);
    assert_eq!(a.supported_models(), vec!["m1", "m2"]);
}

#[tokio::test]
async fn test_failed_rediscovery_keeps_known_models()
{   let a = MockProvider::new("A")
      .models(&["m1"])
      .discovery_fails()
      .build();

    assert!(a.discover_models().await.is_err());
    assert!(a.discover_models().await.is_err());
    assert_eq!(a.supported_models(), vec!["m1"]);
    assert!(a.is_model_supported("m1"));
}

#[tokio::test]
async fn test_discovery_refreshes_models_at_startup()
{   let a = MockProvider::new("A")
      .models(&["stale"])
      .discovers(&["fresh-1", "fresh-2"])
      .build();
    let factory = AiFactory::new(FactoryConfig::new())
      .with_providers(providers(&[&a]));

    assert_eq!(factory.available_models().await, vec!["fresh-1", "fresh-2"]);
    assert!(factory.provider_for_model("stale").await.is_none());
}

#[tokio::test]
async fn test_available_models_collapses_duplicates()
{   let a = MockProvider::new("A").models(&["m1", "shared"]).build();
    let b = MockProvider::new("B").models(&["shared", "m2"]).build();
    let factory = AiFactory::new(FactoryConfig::new())
      .with_providers(providers(&[&a, &b]));

    assert_eq!(
      factory.available_models().await
    , vec!["m1", "shared", "m2"]
    );
    let owner = factory.provider_for_model("shared").await.expect("owner");
    assert_eq!(owner.provider_id(), "A");
    assert!(factory.provider_for_model("nope").await.is_none());
}

#[tokio::test]
async fn test_health_checks_every_call()
{   let a = MockProvider::new("A").build();
    let b = MockProvider::new("B").build();
    let factory = AiFactory::new(FactoryConfig::new())
      .with_providers(providers(&[&a, &b]));

    let health = factory.health().await;
    assert_eq!(health.len(), 2);
    assert_eq!(health.get("A"), Some(&true));
    assert_eq!(health.get("B"), Some(&true));

    factory.health().await;
    assert_eq!(a.connection_checks(), 3);
}

#[tokio::test]
async fn test_ready_is_idempotent()
{   let a = MockProvider::new("A").build();
    let factory = AiFactory::new(FactoryConfig::new())
      .with_providers(providers(&[&a]))
      .open()
      .await;

    let first = factory.ready().await.ids();
    let second = factory.ready().await.ids();

    assert_eq!(first, second);
    assert_eq!(a.connection_checks(), 1);
}

#[tokio::test]
async fn test_background_readiness()
{   let a = MockProvider::new("A").build();
    let factory = Arc::new(
      AiFactory::new(FactoryConfig::new())
        .with_providers(providers(&[&a]))
    );

    let handle = factory.spawn_ready();
    let ids = factory.provider_ids().await;
    handle.await.expect("background build");

    assert_eq!(ids, vec!["A"]);
    assert_eq!(a.connection_checks(), 1);
}

#[tokio::test]
async fn test_default_set_without_credentials()
{   // Nothing listens on the discard port, so the local connection test fails fast.
    let config = FactoryConfig::new()
      .with_provider(
        ProviderConfig::new(ProviderKind::Ollama)
          .with_api_base("http://127.0.0.1:9")
      )
      .with_provider(ProviderConfig::new(ProviderKind::OpenAi))
      .with_provider(ProviderConfig::new(ProviderKind::Anthropic))
      .with_provider(ProviderConfig::new(ProviderKind::MistralAi));
    let factory = AiFactory::new(config);

    assert!(factory.provider_ids().await.is_empty());
}

#[test]
fn test_registry_counts_and_lookups()
{   let mut registry = Registry::new();
    assert!(registry.is_empty());
    assert_eq!(registry.len(), 0);

    let first = MockProvider::new("A").models(&["m1"]).build();
    let again = MockProvider::new("A").models(&["m2"]).build();
    let other = MockProvider::new("B").build();
    for provider in providers(&[&first, &other, &again])
    {   registry.insert(provider);
    }

    assert!(!registry.is_empty());
    assert_eq!(registry.len(), 2);
    assert!(registry.contains("A"));
    assert!(registry.contains("B"));
    assert!(!registry.contains("C"));
    assert_eq!(registry.ids(), vec!["A", "B"]);
}
