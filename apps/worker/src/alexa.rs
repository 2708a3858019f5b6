//! Alexa skill endpoint.
//!
//! Voice control is fire-and-forget: the skill always gets a 200 with a
//! speech response, whatever happens downstream. Backend failures are
//! already logged by the fan-out; the user just hears the
//! acknowledgement and the lights catch up on the next cycle if they
//! can.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use presence_core::DEFAULT_CUSTOM_COLOR;

use crate::routes::ApiState;

// =============================================================================
// Skill Wire Format
// =============================================================================

#[derive(Debug, Default, Deserialize)]
struct SkillRequest {
    #[serde(default)]
    request: RequestBody,
}

#[derive(Debug, Default, Deserialize)]
struct RequestBody {
    #[serde(rename = "type", default)]
    kind: String,

    #[serde(default)]
    intent: Option<Intent>,
}

#[derive(Debug, Deserialize)]
struct Intent {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Serialize)]
pub struct SkillResponse {
    version: &'static str,
    response: ResponseBody,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ResponseBody {
    output_speech: OutputSpeech,
    should_end_session: bool,
}

#[derive(Debug, Serialize)]
struct OutputSpeech {
    #[serde(rename = "type")]
    kind: &'static str,
    text: String,
}

impl SkillResponse {
    fn speak(text: impl Into<String>, end_session: bool) -> Self {
        SkillResponse {
            version: "1.0",
            response: ResponseBody {
                output_speech: OutputSpeech {
                    kind: "PlainText",
                    text: text.into(),
                },
                should_end_session: end_session,
            },
        }
    }

    #[cfg(test)]
    fn text(&self) -> &str {
        &self.response.output_speech.text
    }
}

// =============================================================================
// Handler
// =============================================================================

/// POST /api/alexa
///
/// The body is taken raw so a malformed skill payload still gets a 200
/// speech response instead of an extractor rejection.
pub async fn handle(State(api): State<ApiState>, body: String) -> Json<SkillResponse> {
    let request = match serde_json::from_str::<SkillRequest>(&body) {
        Ok(request) => request,
        Err(e) => {
            warn!(error = %e, "Unparseable Alexa request");
            SkillRequest::default()
        }
    };

    let response = match request.request.kind.as_str() {
        "LaunchRequest" => SkillResponse::speak(
            "Welcome to Presence Light! You can say, set the light to Teams, \
             or, set the light to custom.",
            false,
        ),
        "IntentRequest" => {
            let intent = request
                .request
                .intent
                .map(|i| i.name)
                .unwrap_or_default();
            handle_intent(&api, &intent).await
        }
        other => {
            info!(kind = other, "Unhandled Alexa request type");
            SkillResponse::speak("I didn't understand that. Please try again.", false)
        }
    };

    Json(response)
}

async fn handle_intent(api: &ApiState, intent: &str) -> SkillResponse {
    match intent {
        "Teams" => {
            info!("Alexa intent: follow Teams presence");
            api.controller.set_automatic().await;
            SkillResponse::speak("Presence Light set to Teams!", true)
        }
        "Custom" => {
            info!("Alexa intent: custom color");
            api.controller.set_custom(DEFAULT_CUSTOM_COLOR).await;
            SkillResponse::speak("Presence Light set to custom!", true)
        }
        other => {
            info!(intent = other, "Unhandled Alexa intent");
            SkillResponse::speak("I didn't understand that. Please try again.", false)
        }
    }
}
