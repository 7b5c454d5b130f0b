//! BDD step definitions for the UI dispatch boundary

use cucumber::{then, when};

use coach_gateway::types::ReferenceResource;
use coach_gateway::{Delivery, DispatchError, Operation, Origin};

use crate::world::GatewayWorld;

#[when(expr = "{string} requests the symptom catalog")]
fn request_catalog(world: &mut GatewayWorld, origin: String) {
    world
        .ui()
        .submit(
            origin.as_str(),
            Operation::ReferenceList(ReferenceResource::Symptoms),
        )
        .unwrap();
}

#[when("the UI drains completions")]
async fn drain(world: &mut GatewayWorld) {
    let mut rendered = 0;
    world
        .ui()
        .drain_with(|completion| {
            assert!(matches!(completion.delivery, Delivery::Completed(Ok(_))));
            rendered += 1;
        })
        .await;
    world.rendered += rendered;
}

#[then(expr = "{string} should be disabled")]
fn disabled(world: &mut GatewayWorld, origin: String) {
    assert!(!world.ui().is_enabled(&Origin::new(origin)));
}

#[then(expr = "{string} should be enabled")]
fn enabled(world: &mut GatewayWorld, origin: String) {
    assert!(world.ui().is_enabled(&Origin::new(origin)));
}

#[then(expr = "a second request from {string} should be rejected")]
fn second_rejected(world: &mut GatewayWorld, origin: String) {
    let result = world.ui().submit(
        origin.as_str(),
        Operation::ReferenceList(ReferenceResource::Symptoms),
    );
    assert_eq!(
        result.map(|ticket| ticket.id()),
        Err(DispatchError::AlreadyPending(Origin::new(origin)))
    );
}

#[then(expr = "{int} completion(s) should have been rendered")]
fn rendered(world: &mut GatewayWorld, expected: usize) {
    assert_eq!(world.rendered, expected);
}
