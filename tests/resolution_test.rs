//! Resolution semantics through the public API: idempotent lookup, exact vs
//! subset matching, and state continuity across resolutions.

mod common;

use std::sync::Arc;

use dispatcher_core::{
    Dispatcher, DispatcherError, ExecuteOptions, InMemoryChainStore, MatchMode, ResourcePair,
};

use common::{sample_config, T1_DONE};

fn pairs(raw: &[(&str, &str)]) -> Vec<ResourcePair> {
    raw.iter().map(|&(t, i)| ResourcePair::new(t, i)).collect()
}

#[tokio::test]
async fn repeated_resolution_returns_the_same_chain() {
    common::init_tracing();
    let store = InMemoryChainStore::new();
    let dispatcher = Dispatcher::new(sample_config(true, true), Arc::new(store.clone()));
    let mapping = pairs(&[("rsc1", "123"), ("rsc2", "456")]);

    let first = dispatcher
        .resolve("sample_chain", &mapping, MatchMode::Exact)
        .await
        .unwrap();
    let second = dispatcher
        .resolve("sample_chain", &mapping, MatchMode::Exact)
        .await
        .unwrap();

    assert_eq!(first.chain_id(), second.chain_id());
    assert_eq!(store.chain_count(), 1);
    assert_eq!(store.resources_for(first.chain_id()).len(), 2);
}

#[tokio::test]
async fn resolution_picks_up_where_the_chain_left_off() {
    common::init_tracing();
    let store = InMemoryChainStore::new();
    let dispatcher = Dispatcher::new(sample_config(true, true), Arc::new(store.clone()));
    let mapping = pairs(&[("rsc1", "123"), ("rsc2", "456")]);

    let mut machine = dispatcher
        .resolve("sample_chain", &mapping, MatchMode::Exact)
        .await
        .unwrap();
    machine.execute(ExecuteOptions::new()).await.unwrap();
    assert_eq!(machine.current_state(), T1_DONE);

    // A fresh resolution of the same mapping sees the advanced state
    let resolved = dispatcher
        .resolve("sample_chain", &mapping, MatchMode::Exact)
        .await
        .unwrap();
    assert_eq!(resolved.chain_id(), machine.chain_id());
    assert_eq!(resolved.current_state(), T1_DONE);
}

#[tokio::test]
async fn exact_and_subset_modes_disagree_on_partial_mappings() {
    common::init_tracing();
    let store = InMemoryChainStore::new();
    let dispatcher = Dispatcher::new(sample_config(true, true), Arc::new(store.clone()));

    let full = dispatcher
        .resolve(
            "sample_chain",
            &pairs(&[("rsc1", "123"), ("rsc2", "456")]),
            MatchMode::Exact,
        )
        .await
        .unwrap();

    // Subset: the stored chain may carry extra resources
    let subset = dispatcher
        .resolve("sample_chain", &pairs(&[("rsc1", "123")]), MatchMode::Subset)
        .await
        .unwrap();
    assert_eq!(subset.chain_id(), full.chain_id());
    assert_eq!(store.chain_count(), 1);

    // Exact: the partial mapping misses and creates a second chain
    let exact = dispatcher
        .resolve("sample_chain", &pairs(&[("rsc1", "123")]), MatchMode::Exact)
        .await
        .unwrap();
    assert_ne!(exact.chain_id(), full.chain_id());
    assert_eq!(store.chain_count(), 2);
}

#[tokio::test]
async fn superset_mapping_never_matches_exactly() {
    common::init_tracing();
    let store = InMemoryChainStore::new();
    let dispatcher = Dispatcher::new(sample_config(true, true), Arc::new(store.clone()));

    let original = dispatcher
        .resolve(
            "sample_chain",
            &pairs(&[("rsc1", "123"), ("rsc2", "456")]),
            MatchMode::Exact,
        )
        .await
        .unwrap();

    let superset = dispatcher
        .resolve(
            "sample_chain",
            &pairs(&[("rsc1", "123"), ("rsc2", "456"), ("rsc3", "789")]),
            MatchMode::Exact,
        )
        .await
        .unwrap();

    assert_ne!(original.chain_id(), superset.chain_id());
    assert_eq!(store.chain_count(), 2);
}

#[tokio::test]
async fn overlapping_chains_surface_as_ambiguity() {
    common::init_tracing();
    let store = InMemoryChainStore::new();
    let dispatcher = Dispatcher::new(sample_config(true, true), Arc::new(store.clone()));

    dispatcher
        .resolve(
            "sample_chain",
            &pairs(&[("rsc1", "123"), ("rsc2", "456")]),
            MatchMode::Exact,
        )
        .await
        .unwrap();
    dispatcher
        .resolve(
            "sample_chain",
            &pairs(&[("rsc1", "123"), ("rsc3", "789")]),
            MatchMode::Exact,
        )
        .await
        .unwrap();

    // Both chains carry rsc1/123: a subset request for it alone is ambiguous
    let result = dispatcher
        .resolve("sample_chain", &pairs(&[("rsc1", "123")]), MatchMode::Subset)
        .await;
    assert!(matches!(
        result,
        Err(DispatcherError::AmbiguousChain { matched: 2, .. })
    ));
}

#[tokio::test]
async fn validation_failures_never_touch_storage() {
    common::init_tracing();
    let store = InMemoryChainStore::new();
    let dispatcher = Dispatcher::new(sample_config(true, true), Arc::new(store.clone()));

    assert!(matches!(
        dispatcher
            .resolve("sample_chain", &pairs(&[("", "123")]), MatchMode::Exact)
            .await,
        Err(DispatcherError::InvalidResource { .. })
    ));
    assert!(matches!(
        dispatcher
            .resolve("unknown_chain", &pairs(&[("rsc1", "123")]), MatchMode::Exact)
            .await,
        Err(DispatcherError::UnknownChainType { .. })
    ));
    assert_eq!(store.chain_count(), 0);
}
