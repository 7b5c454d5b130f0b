//! BDD step definitions for the reference cache feature

use cucumber::{then, when};

use coach_gateway::types::ReferenceResource;

use crate::world::GatewayWorld;

#[when("the symptom catalog is fetched")]
async fn fetch_catalog(world: &mut GatewayWorld) {
    let result = world
        .gateway()
        .reference_list(ReferenceResource::Symptoms)
        .await;
    world.fetches.push(result);
}

#[when("the symptom catalog is fetched twice")]
async fn fetch_catalog_twice(world: &mut GatewayWorld) {
    fetch_catalog(world).await;
    fetch_catalog(world).await;
}

#[when("the cache is invalidated")]
async fn invalidate(world: &mut GatewayWorld) {
    world.gateway().clear_cache().await;
}

#[then(expr = "the transport should have been called {int} time(s)")]
fn transport_calls(world: &mut GatewayWorld, expected: usize) {
    assert_eq!(world.transport().calls(), expected);
}

#[then("both fetches should return the same catalog")]
fn same_catalog(world: &mut GatewayWorld) {
    assert_eq!(world.fetches.len(), 2);
    let first = world.fetches[0].as_ref().unwrap();
    let second = world.fetches[1].as_ref().unwrap();
    assert_eq!(first, second);
}

#[then("the last fetch should succeed")]
fn last_fetch_succeeds(world: &mut GatewayWorld) {
    let last = world.fetches.last().expect("nothing fetched");
    let list = last.as_ref().unwrap();
    assert_eq!(list.names().collect::<Vec<_>>(), vec!["Headache", "Fever"]);
}

#[then("no reference catalogs should be cached")]
async fn nothing_cached(world: &mut GatewayWorld) {
    assert!(world.gateway().cached_resources().await.is_empty());
}
