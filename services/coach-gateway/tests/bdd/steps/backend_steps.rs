//! Shared backend setup steps

use cucumber::{given, when};

use coach_gateway::io::RawResponse;

use crate::common::{FakeTransport, SYMPTOMS};
use crate::world::GatewayWorld;

#[given("a backend serving the symptom catalog")]
fn backend_serving_catalog(world: &mut GatewayWorld) {
    world.install(FakeTransport::ok(SYMPTOMS));
}

#[given("a backend that answers probes")]
fn backend_answering_probes(world: &mut GatewayWorld) {
    world.install(FakeTransport::ok(SYMPTOMS));
}

#[given("a backend that refuses connections")]
fn backend_refusing(world: &mut GatewayWorld) {
    world.install(FakeTransport::refusing());
}

#[given(expr = "a backend that answers with status {int} and body {string}")]
fn backend_answering_with(world: &mut GatewayWorld, status: u16, body: String) {
    world.install(FakeTransport::new(move |_| {
        Ok(RawResponse::new(status, body.clone()))
    }));
}

#[when("the backend starts refusing connections")]
fn backend_goes_down(world: &mut GatewayWorld) {
    world.transport().fail_from_now_on();
}

#[when("the backend recovers")]
fn backend_recovers(world: &mut GatewayWorld) {
    world.transport().recover();
}
