//! BDD step definitions for error fidelity

use cucumber::{then, when};

use coach_gateway::types::AssessmentRequest;
use coach_gateway::GatewayError;

use crate::world::GatewayWorld;

fn kind(error: &GatewayError) -> &'static str {
    match error {
        GatewayError::Unreachable(_) => "Unreachable",
        GatewayError::Timeout(_) => "Timeout",
        GatewayError::ClientError { .. } => "ClientError",
        GatewayError::ServerError { .. } => "ServerError",
        GatewayError::MalformedResponse(_) => "MalformedResponse",
    }
}

#[when("an assessment is submitted")]
async fn submit_assessment(world: &mut GatewayWorld) {
    let request = AssessmentRequest {
        age: 52,
        gender: "male".to_string(),
        symptoms: vec!["Chest pain".to_string()],
        vitals: Default::default(),
    };
    world.last_error = world.gateway().assess(&request).await.err();
}

#[then(expr = "the error kind should be {string}")]
fn error_kind(world: &mut GatewayWorld, expected: String) {
    let error = world.last_error.as_ref().expect("call succeeded");
    assert_eq!(kind(error), expected);
}

#[then(expr = "the error should carry status {int}")]
fn error_status(world: &mut GatewayWorld, expected: u16) {
    let error = world.last_error.as_ref().expect("call succeeded");
    assert_eq!(error.status(), Some(expected));
}
