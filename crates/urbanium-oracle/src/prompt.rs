//! Prompt template loading and rendering via `minijinja`.
//!
//! Two templates make up a prompt: `system` sets the rules of the game and
//! the reply format, `decision` describes one citizen at one tick together
//! with the actions it may choose from. Built-in defaults ship with the
//! crate; a template directory replaces them so the wording can be tuned
//! without recompiling.

use std::path::Path;

use minijinja::Environment;
use serde_json::json;
use urbanium_core::OracleRequest;
use urbanium_types::{ActionType, Citizen, ServiceKind};
use urbanium_world::City;

use crate::error::OracleClientError;

const DEFAULT_SYSTEM: &str = "\
You decide what one resident of Urbanium, a simulated city, does during the next hour.
Choose exactly one action from the list you are given. Any other answer is discarded.
Reply with a single JSON object and nothing else:
{\"action\": \"<action name>\", \"reasoning\": \"<one short sentence>\", \"confidence\": <number between 0 and 1>}";

const DEFAULT_DECISION: &str = "\
## Time
Tick {{ tick }}, {{ time }} ({{ time_of_day }}){% if working_hours %}, working hours{% endif %}.

## Resident
{{ citizen.name }}, age {{ citizen.age }}, currently {{ citizen.activity }}.
Cash: {{ citizen.cash }}. Monthly income: {{ citizen.monthly_income }}.
Employment: {% if citizen.employed %}employed{% else %}unemployed for {{ citizen.unemployed_ticks }} hours{% endif %}.
Home: {% if citizen.housed %}housed{% else %}homeless{% endif %}, in {{ citizen.district }}.

## Needs (0 = satisfied, 1 = critical)
{% for need in needs %}- {{ need.name }}: {{ need.value }}
{% endfor %}
## Personality (0 to 1)
{% for t in traits %}- {{ t.name }}: {{ t.value }}
{% endfor %}
## City
Population {{ city.population }}, {{ city.open_positions }} open jobs, {{ city.vacant_units }} vacant homes, food price index {{ city.food_price_index }}.
{% if city.park_nearby %}There is a park in this district.
{% endif %}
## Available actions
{% for action in actions %}- {{ action }}
{% endfor %}";

/// Manages the prompt templates.
pub struct PromptEngine {
    env: Environment<'static>,
}

/// The complete rendered prompt ready to send to the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPrompt {
    /// System message with the rules and reply format.
    pub system: String,
    /// User message describing the citizen and the choices.
    pub user: String,
}

impl PromptEngine {
    /// Create a prompt engine with the built-in templates.
    pub fn with_defaults() -> Result<Self, OracleClientError> {
        Self::from_sources(DEFAULT_SYSTEM.to_owned(), DEFAULT_DECISION.to_owned())
    }

    /// Create a prompt engine loading `system.j2` and `decision.j2` from
    /// `dir`.
    pub fn from_dir(dir: &Path) -> Result<Self, OracleClientError> {
        let system = load_template(dir, "system.j2")?;
        let decision = load_template(dir, "decision.j2")?;
        Self::from_sources(system, decision)
    }

    /// Load from `dir` when given, otherwise use the defaults.
    pub fn load(dir: Option<&Path>) -> Result<Self, OracleClientError> {
        dir.map_or_else(Self::with_defaults, Self::from_dir)
    }

    fn from_sources(system: String, decision: String) -> Result<Self, OracleClientError> {
        let mut env = Environment::new();
        env.add_template_owned("system", system)
            .map_err(|e| template_error(format!("failed to add system template: {e}")))?;
        env.add_template_owned("decision", decision)
            .map_err(|e| template_error(format!("failed to add decision template: {e}")))?;
        Ok(Self { env })
    }

    /// Render the prompt for one decision.
    pub fn render(&self, request: &OracleRequest<'_>) -> Result<RenderedPrompt, OracleClientError> {
        let context = decision_context(request);

        let system = self
            .env
            .get_template("system")
            .map_err(|e| template_error(format!("missing system template: {e}")))?
            .render(&context)
            .map_err(|e| template_error(format!("system render failed: {e}")))?;

        let user = self
            .env
            .get_template("decision")
            .map_err(|e| template_error(format!("missing decision template: {e}")))?
            .render(&context)
            .map_err(|e| template_error(format!("decision render failed: {e}")))?;

        Ok(RenderedPrompt { system, user })
    }
}

/// The template context for one request.
///
/// Numbers are pre-formatted so the prompt reads the same on every run.
pub fn decision_context(request: &OracleRequest<'_>) -> serde_json::Value {
    let citizen = request.citizen;
    let city = request.city;
    let actions = action_names(request.available);

    json!({
        "tick": request.tick,
        "time": request.time.format("%Y-%m-%d %H:%M").to_string(),
        "time_of_day": format!("{:?}", request.time_of_day).to_lowercase(),
        "working_hours": request.is_working_hours,
        "citizen": citizen_context(citizen, city),
        "needs": [
            { "name": "hunger", "value": format!("{:.2}", citizen.needs.hunger) },
            { "name": "energy", "value": format!("{:.2}", citizen.needs.energy) },
            { "name": "social", "value": format!("{:.2}", citizen.needs.social) },
            { "name": "shelter", "value": format!("{:.2}", citizen.needs.shelter) },
            { "name": "income", "value": format!("{:.2}", citizen.needs.income) },
        ],
        "traits": [
            { "name": "sociability", "value": format!("{:.2}", citizen.traits.sociability) },
            { "name": "risk tolerance", "value": format!("{:.2}", citizen.traits.risk_tolerance) },
            { "name": "frugality", "value": format!("{:.2}", citizen.traits.frugality) },
            { "name": "ambition", "value": format!("{:.2}", citizen.traits.ambition) },
            { "name": "stability", "value": format!("{:.2}", citizen.traits.stability) },
        ],
        "city": {
            "population": city.population(),
            "open_positions": city.labor.open_positions.len(),
            "vacant_units": city.housing.vacant().count(),
            "food_price_index": city.goods.food_price_index.to_string(),
            "park_nearby": city.has_service_near(citizen, ServiceKind::Park),
        },
        "actions": actions,
    })
}

fn citizen_context(citizen: &Citizen, city: &City) -> serde_json::Value {
    let district = citizen
        .district_id
        .and_then(|id| city.map.district(id))
        .map_or_else(|| String::from("no district"), |d| d.name.clone());

    json!({
        "name": citizen.name,
        "age": citizen.age,
        "activity": format!("{:?}", citizen.activity).to_lowercase(),
        "cash": citizen.resources.cash.to_string(),
        "monthly_income": citizen.resources.monthly_income.to_string(),
        "employed": citizen.employer_id.is_some(),
        "unemployed_ticks": citizen.unemployed_ticks,
        "housed": citizen.home_id.is_some(),
        "district": district,
    })
}

/// Names of `actions` as they appear in prompts.
pub fn action_names(actions: &[ActionType]) -> Vec<&'static str> {
    actions.iter().copied().map(ActionType::as_str).collect()
}

fn load_template(dir: &Path, filename: &str) -> Result<String, OracleClientError> {
    let path = dir.join(filename);
    std::fs::read_to_string(&path)
        .map_err(|e| template_error(format!("failed to read {}: {e}", path.display())))
}

const fn template_error(message: String) -> OracleClientError {
    OracleClientError::Template { message }
}
