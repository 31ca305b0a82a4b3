//! Tests for the search filter synchronizer.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use rstest::{fixture, rstest};

use super::*;
use crate::domain::ports::{MemorySessionStorage, MockLocation, SessionStorage, SweetsAuthority};
use crate::domain::{SessionExpiryPolicy, SessionStore};
use crate::test_support::{AuthorityCall, Endpoint, ManualScheduler, StubAuthority};

#[derive(Debug, Default)]
struct Address {
    path: String,
    query: String,
    pushes: Vec<(String, String)>,
}

type SharedAddress = Arc<Mutex<Address>>;

fn location(address: &SharedAddress) -> MockLocation {
    let mut location = MockLocation::new();
    let path = Arc::clone(address);
    location
        .expect_current_path()
        .returning(move || path.lock().expect("address").path.clone());
    let query = Arc::clone(address);
    location
        .expect_current_query()
        .returning(move || query.lock().expect("address").query.clone());
    let pushes = Arc::clone(address);
    location.expect_push().returning(move |path, query| {
        let mut address = pushes.lock().expect("address");
        address.path = path.to_owned();
        address.query = query.to_owned();
        address.pushes.push((path.to_owned(), query.to_owned()));
    });
    location
}

struct Harness {
    address: SharedAddress,
    scheduler: Arc<ManualScheduler>,
    authority: Arc<StubAuthority>,
    sync: SearchQuerySynchronizer,
}

fn build(scheduler: ManualScheduler, path: &str, query: &str) -> Harness {
    let address = Arc::new(Mutex::new(Address {
        path: path.to_owned(),
        query: query.to_owned(),
        pushes: Vec::new(),
    }));
    let scheduler = Arc::new(scheduler);
    let authority = Arc::new(StubAuthority::new());
    let session = Arc::new(
        SessionStore::initialize(Arc::new(MemorySessionStorage::default()) as Arc<dyn SessionStorage>)
            .expect("hydrates"),
    );
    let catalogue = Catalogue::new(
        Arc::clone(&authority) as Arc<dyn SweetsAuthority>,
        session,
        SessionExpiryPolicy::default(),
    );
    let sync = SearchQuerySynchronizer::new(
        Arc::new(location(&address)),
        Arc::clone(&scheduler) as Arc<dyn DebounceScheduler>,
        catalogue,
        DEFAULT_DEBOUNCE,
    );
    Harness {
        address,
        scheduler,
        authority,
        sync,
    }
}

#[fixture]
fn harness() -> Harness {
    build(ManualScheduler::new(), "/", "")
}

fn pushes(harness: &Harness) -> Vec<(String, String)> {
    harness.address.lock().expect("address").pushes.clone()
}

fn listed_queries(harness: &Harness) -> Vec<CollectionQuery> {
    harness
        .authority
        .calls()
        .into_iter()
        .filter_map(|call| match call {
            AuthorityCall::ListItems { query, .. } => Some(query),
            _ => None,
        })
        .collect()
}

fn storefront(query: &str) -> CollectionQuery {
    CollectionQuery::Storefront(SearchFilter::from_query(query).canonical_query())
}

#[rstest]
#[tokio::test]
async fn burst_of_edits_reconciles_once_with_last_state(harness: Harness) {
    harness.sync.on_field_edit(SearchField::Name, "f");
    harness.sync.on_field_edit(SearchField::Name, "fu");
    harness.sync.on_field_edit(SearchField::Category, "candy");
    harness.sync.on_field_edit(SearchField::Name, "fudge");

    assert_eq!(harness.scheduler.scheduled(), 4);
    assert_eq!(harness.scheduler.cancelled(), 3);
    assert_eq!(
        harness.scheduler.pending_delays(),
        vec![Duration::from_millis(350)]
    );
    assert!(pushes(&harness).is_empty());

    assert_eq!(harness.scheduler.fire_all().await, 1);

    assert_eq!(
        pushes(&harness),
        vec![("/".to_owned(), "name=fudge&category=candy".to_owned())]
    );
    assert_eq!(
        listed_queries(&harness),
        vec![storefront("name=fudge&category=candy")]
    );
    assert!(!harness.sync.has_pending());
}

#[tokio::test]
async fn superseded_countdown_is_inert_even_if_not_cancelled() {
    let harness = build(ManualScheduler::ignoring_cancel(), "/", "");
    harness.sync.on_field_edit(SearchField::Name, "a");
    harness.sync.on_field_edit(SearchField::Name, "ab");
    assert_eq!(harness.scheduler.pending(), 2);

    harness.scheduler.fire_all().await;

    assert_eq!(harness.authority.count(Endpoint::ListItems), 1);
    assert_eq!(listed_queries(&harness), vec![storefront("name=ab")]);
}

#[rstest]
#[tokio::test]
async fn submit_skips_the_countdown(harness: Harness) {
    harness.sync.on_field_edit(SearchField::MinPrice, "2");

    let outcome = harness.sync.submit().await.expect("fetch");

    assert_eq!(outcome, RefreshOutcome::Applied { count: 0 });
    assert_eq!(harness.scheduler.pending(), 0);
    assert_eq!(pushes(&harness), vec![("/".to_owned(), "minPrice=2".to_owned())]);
    assert_eq!(harness.scheduler.fire_all().await, 0);
    assert_eq!(harness.authority.count(Endpoint::ListItems), 1);
}

#[rstest]
#[tokio::test]
async fn whitespace_fields_never_reach_the_location(harness: Harness) {
    harness.sync.on_field_edit(SearchField::Name, "  ");
    harness.sync.on_field_edit(SearchField::Category, "cake");

    harness.sync.submit().await.expect("fetch");

    assert_eq!(pushes(&harness), vec![("/".to_owned(), "category=cake".to_owned())]);
}

#[test]
fn hydrates_from_location_on_construction() {
    let harness = build(ManualScheduler::new(), "/", "name=fudge&maxPrice=4");
    let filter = harness.sync.filter();
    assert_eq!(filter.get(SearchField::Name), "fudge");
    assert_eq!(filter.get(SearchField::MaxPrice), "4");
    assert_eq!(filter.get(SearchField::Category), "");
}

#[rstest]
#[tokio::test]
async fn navigation_replaces_every_field_and_fetches(harness: Harness) {
    harness.sync.on_field_edit(SearchField::Name, "fudge");
    harness.address.lock().expect("address").query = "category=cake".to_owned();

    let outcome = harness.sync.on_location_changed().await;

    assert!(matches!(outcome, Some(Ok(RefreshOutcome::Applied { .. }))));
    let filter = harness.sync.filter();
    assert_eq!(filter.get(SearchField::Name), "");
    assert_eq!(filter.get(SearchField::Category), "cake");
    assert_eq!(harness.scheduler.pending(), 0);
    assert_eq!(listed_queries(&harness), vec![storefront("category=cake")]);
    assert!(pushes(&harness).is_empty());
}

#[rstest]
#[tokio::test]
async fn echo_of_own_push_is_ignored(harness: Harness) {
    harness.sync.on_field_edit(SearchField::Name, "fudge");
    harness.sync.submit().await.expect("fetch");

    let outcome = harness.sync.on_location_changed().await;

    assert!(outcome.is_none());
    assert_eq!(harness.authority.count(Endpoint::ListItems), 1);
    assert_eq!(harness.sync.filter().get(SearchField::Name), "fudge");
}

#[tokio::test]
async fn navigation_away_from_storefront_only_hydrates() {
    let harness = build(ManualScheduler::new(), "/admin", "");
    harness.address.lock().expect("address").query = "name=x".to_owned();

    assert!(harness.sync.on_location_changed().await.is_none());
    assert_eq!(harness.sync.filter().get(SearchField::Name), "x");
    assert_eq!(harness.authority.count(Endpoint::ListItems), 0);
}

#[rstest]
#[tokio::test]
async fn forgotten_push_makes_the_same_query_external_again(harness: Harness) {
    harness.sync.on_field_edit(SearchField::Category, "cake");
    harness.sync.submit().await.expect("fetch");

    harness.sync.forget_push();
    let outcome = harness.sync.on_location_changed().await;

    assert!(matches!(outcome, Some(Ok(RefreshOutcome::Applied { .. }))));
    assert_eq!(
        listed_queries(&harness),
        vec![storefront("category=cake"), storefront("category=cake")]
    );
}
