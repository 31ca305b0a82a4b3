//! Tests for the displayed collection and its fetch ordering.

use std::sync::Arc;

use rstest::{fixture, rstest};

use super::*;
use crate::domain::ports::{AuthorityError, MemorySessionStorage, SessionStorage};
use crate::domain::{AuthToken, CanonicalQuery, ErrorCode, Role, SearchField, SearchFilter, Session};
use crate::test_support::{AuthorityCall, Endpoint, StubAuthority, item};

struct Harness {
    authority: Arc<StubAuthority>,
    session: Arc<SessionStore>,
    catalogue: Catalogue,
}

fn admin() -> Identity {
    Identity::try_new("u1", "Ada", "ada@example.com", Role::Admin).expect("identity")
}

fn harness_with(session: Option<Session>) -> Harness {
    let storage = session.map_or_else(MemorySessionStorage::default, MemorySessionStorage::with_session);
    let session = Arc::new(
        SessionStore::initialize(Arc::new(storage) as Arc<dyn SessionStorage>).expect("hydrates"),
    );
    let authority = Arc::new(StubAuthority::new());
    let catalogue = Catalogue::new(
        Arc::clone(&authority) as Arc<dyn SweetsAuthority>,
        Arc::clone(&session),
        SessionExpiryPolicy::ClearSession,
    );
    Harness {
        authority,
        session,
        catalogue,
    }
}

#[fixture]
fn harness() -> Harness {
    harness_with(Some(Session::new(
        AuthToken::new("t1").expect("token"),
        admin(),
    )))
}

fn storefront(name: &str) -> CollectionQuery {
    let mut filter = SearchFilter::default();
    filter.set(SearchField::Name, name);
    CollectionQuery::Storefront(filter.canonical_query())
}

#[rstest]
#[tokio::test]
async fn refresh_commits_items_and_sends_bearer(harness: Harness) {
    harness.authority.set_inventory(vec![
        item("a1", "Fudge", 3).expect("fixture item"),
        item("a2", "Toffee", 0).expect("fixture item"),
    ]);

    let outcome = harness
        .catalogue
        .refresh(CollectionQuery::default())
        .await
        .expect("fetch succeeds");

    assert_eq!(outcome, RefreshOutcome::Applied { count: 2 });
    assert_eq!(harness.catalogue.items().len(), 2);
    assert_eq!(
        harness.authority.last_call(Endpoint::ListItems),
        Some(AuthorityCall::ListItems {
            bearer: Some("t1".to_owned()),
            query: CollectionQuery::Storefront(CanonicalQuery::default()),
        })
    );
}

#[rstest]
#[tokio::test]
async fn newer_fetch_wins_even_when_older_finishes_last(harness: Harness) {
    let authority = &harness.authority;
    authority.hold(Endpoint::ListItems);
    authority.push_list(Ok(vec![item("old", "Old", 1).expect("fixture item")]));
    authority.push_list(Ok(vec![item("new", "New", 1).expect("fixture item")]));

    let first = harness.catalogue.refresh(storefront("a"));
    let second = harness.catalogue.refresh(storefront("ab"));

    let driver = async {
        while authority.parked(Endpoint::ListItems) < 2 {
            tokio::task::yield_now().await;
        }
        assert!(authority.release_nth(Endpoint::ListItems, 1));
        tokio::task::yield_now().await;
        assert!(authority.release(Endpoint::ListItems));
    };
    let (first_outcome, second_outcome, ()) = tokio::join!(first, second, driver);

    assert_eq!(first_outcome.expect("no error"), RefreshOutcome::Superseded);
    assert_eq!(
        second_outcome.expect("no error"),
        RefreshOutcome::Applied { count: 1 }
    );
    let shown: Vec<String> = harness
        .catalogue
        .items()
        .into_iter()
        .map(|i| i.name)
        .collect();
    assert_eq!(shown, vec!["New".to_owned()]);
}

#[rstest]
#[tokio::test]
async fn superseded_failure_is_discarded(harness: Harness) {
    let authority = &harness.authority;
    authority.hold(Endpoint::ListItems);
    authority.push_list(Err(AuthorityError::timeout("slow")));
    authority.push_list(Ok(vec![item("a1", "Fudge", 1).expect("fixture item")]));

    let first = harness.catalogue.refresh(storefront("a"));
    let second = harness.catalogue.refresh(storefront("b"));
    let driver = async {
        while authority.parked(Endpoint::ListItems) < 2 {
            tokio::task::yield_now().await;
        }
        authority.release(Endpoint::ListItems);
        authority.release(Endpoint::ListItems);
    };
    let (first_outcome, second_outcome, ()) = tokio::join!(first, second, driver);

    assert_eq!(first_outcome.expect("stale error dropped"), RefreshOutcome::Superseded);
    assert!(second_outcome.is_ok());
}

#[rstest]
#[tokio::test]
async fn failed_fetch_keeps_previous_items(harness: Harness) {
    harness.authority.set_inventory(vec![item("a1", "Fudge", 3).expect("fixture item")]);
    harness
        .catalogue
        .refresh(CollectionQuery::default())
        .await
        .expect("first fetch");
    harness.authority.push_list(Err(AuthorityError::Rejected {
        status: 500,
        message: None,
    }));

    let err = harness
        .catalogue
        .refresh_current()
        .await
        .expect_err("second fetch fails");

    assert_eq!(err.code(), ErrorCode::Rejected);
    assert_eq!(err.message(), LOAD_FAILED);
    assert_eq!(harness.catalogue.items().len(), 1);
}

#[rstest]
#[tokio::test]
async fn unauthenticated_fetch_clears_session(harness: Harness) {
    harness
        .authority
        .push_list(Err(AuthorityError::Unauthenticated { message: None }));

    let err = harness
        .catalogue
        .refresh(CollectionQuery::default())
        .await
        .expect_err("rejected");

    assert_eq!(err.code(), ErrorCode::Unauthorized);
    assert!(!harness.session.is_authenticated());
}

#[rstest]
#[tokio::test]
async fn owned_scope_queries_by_identity(harness: Harness) {
    let owner = admin();
    harness
        .catalogue
        .show_owned_by(Some(&owner))
        .await
        .expect("fetch");

    assert_eq!(
        harness.catalogue.scope(),
        Some(CollectionQuery::OwnedBy(owner.id().clone()))
    );
    harness.catalogue.refresh_current().await.expect("repeat");
    assert_eq!(harness.authority.count(Endpoint::ListItems), 2);
    assert!(matches!(
        harness.authority.last_call(Endpoint::ListItems),
        Some(AuthorityCall::ListItems {
            query: CollectionQuery::OwnedBy(_),
            ..
        })
    ));
}

#[rstest]
#[tokio::test]
async fn missing_identity_empties_without_request(harness: Harness) {
    harness.authority.set_inventory(vec![item("a1", "Fudge", 3).expect("fixture item")]);
    harness
        .catalogue
        .refresh(CollectionQuery::default())
        .await
        .expect("fetch");

    let outcome = harness.catalogue.show_owned_by(None).await.expect("empty");

    assert_eq!(outcome, RefreshOutcome::Applied { count: 0 });
    assert!(harness.catalogue.items().is_empty());
    assert_eq!(harness.authority.count(Endpoint::ListItems), 1);
    harness.catalogue.refresh_current().await.expect("still empty");
    assert_eq!(harness.authority.count(Endpoint::ListItems), 1);
}

#[tokio::test]
async fn anonymous_fetch_has_no_bearer() {
    let harness = harness_with(None);
    harness
        .catalogue
        .refresh(CollectionQuery::default())
        .await
        .expect("fetch");
    assert!(matches!(
        harness.authority.last_call(Endpoint::ListItems),
        Some(AuthorityCall::ListItems { bearer: None, .. })
    ));
}

#[rstest]
#[tokio::test]
async fn find_looks_up_displayed_items(harness: Harness) {
    harness.authority.set_inventory(vec![item("a1", "Fudge", 3).expect("fixture item")]);
    harness
        .catalogue
        .refresh(CollectionQuery::default())
        .await
        .expect("fetch");

    let id = ItemId::new("a1").expect("id");
    assert_eq!(harness.catalogue.find(&id).map(|i| i.quantity), Some(3));
    assert!(harness.catalogue.find(&ItemId::new("zz").expect("id")).is_none());
}
