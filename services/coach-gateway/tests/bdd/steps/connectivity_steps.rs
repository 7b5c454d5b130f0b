//! BDD step definitions for the connectivity feature

use cucumber::{then, when};

use coach_gateway::ConnectivityState;

use crate::world::GatewayWorld;

fn parse_state(s: &str) -> ConnectivityState {
    match s {
        "Online" => ConnectivityState::Online,
        "Offline" => ConnectivityState::Offline,
        "Unknown" => ConnectivityState::Unknown,
        other => panic!("Unknown state: {}", other),
    }
}

async fn probe(world: &mut GatewayWorld) {
    let transition = world.monitor().probe_once().await;
    world.transitions.extend(transition);
}

#[when("the monitor probes once")]
async fn probe_once(world: &mut GatewayWorld) {
    probe(world).await;
}

#[when(expr = "the monitor probes {int} times")]
async fn probe_times(world: &mut GatewayWorld, times: usize) {
    for _ in 0..times {
        probe(world).await;
    }
}

#[when(expr = "the probe outcomes are {string}")]
async fn probe_outcomes(world: &mut GatewayWorld, outcomes: String) {
    for outcome in outcomes.split(',').map(str::trim) {
        match outcome {
            "succeed" => world.transport().recover(),
            "fail" => world.transport().fail_from_now_on(),
            other => panic!("Unknown outcome: {}", other),
        }
        probe(world).await;
    }
}

#[then(expr = "the connectivity state should be {string}")]
fn state_should_be(world: &mut GatewayWorld, expected: String) {
    let handle = world.monitor().handle();
    assert_eq!(handle.state(), parse_state(&expected));
}

#[then("the backend should not be reachable")]
fn not_reachable(world: &mut GatewayWorld) {
    assert!(!world.monitor().handle().is_reachable());
}

#[then("the backend should be reachable")]
fn reachable(world: &mut GatewayWorld) {
    assert!(world.monitor().handle().is_reachable());
}

#[then("no transitions should have been emitted")]
fn no_transitions(world: &mut GatewayWorld) {
    assert!(world.transitions.is_empty(), "{:?}", world.transitions);
}

#[then(expr = "{int} transition(s) should have been emitted")]
fn transitions_emitted(world: &mut GatewayWorld, expected: usize) {
    assert_eq!(world.transitions.len(), expected, "{:?}", world.transitions);
}

#[then(expr = "transition {int} should be {string} to {string}")]
fn transition_should_be(world: &mut GatewayWorld, index: usize, from: String, to: String) {
    let transition = world.transitions[index - 1];
    assert_eq!(transition.previous, parse_state(&from));
    assert_eq!(transition.current, parse_state(&to));
}

#[then(expr = "the consecutive failure count should be {int}")]
fn consecutive_failures(world: &mut GatewayWorld, expected: u32) {
    let snapshot = world.monitor().handle().snapshot();
    assert_eq!(snapshot.consecutive_failures, expected);
}
