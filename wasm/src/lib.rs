//! WebAssembly module for the Pour Choices client
//!
//! Provides client-side computation for:
//! - Running a blind tasting offline (selection, pouring, notes, ranking, reveal)
//! - Percentile and rank label display
//! - Flavor tag suggestions
//! - Offline form validation
//!
//! Errors cross the boundary as JSON strings of the form
//! `{"code": "...", "message": "..."}`.

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use uuid::Uuid;
use wasm_bindgen::prelude::*;

use shared::tasting::{
    percentile, rank_label, suggest_tags, BottleRatings, RevealEngine, Section, Slot,
    TastingError, TastingSession,
};

// Re-export shared types for use in JavaScript
pub use shared::models::*;
pub use shared::types::*;
pub use shared::validation::*;

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {
    web_sys::console::debug_1(&JsValue::from_str("pour-choices wasm ready"));
}

#[derive(Debug, Serialize)]
struct ClientError {
    code: &'static str,
    message: String,
}

fn client_error(code: &'static str, message: impl ToString) -> String {
    let error = ClientError {
        code,
        message: message.to_string(),
    };
    serde_json::to_string(&error).unwrap_or_else(|_| error.message)
}

fn tasting_error(err: TastingError) -> String {
    client_error(err.code(), err)
}

fn invalid_input(message: impl ToString) -> String {
    client_error("VALIDATION_ERROR", message)
}

fn parse_uuid(value: &str) -> Result<Uuid, String> {
    Uuid::parse_str(value.trim()).map_err(invalid_input)
}

fn parse_slot(value: &str) -> Result<Slot, String> {
    value.parse().map_err(invalid_input)
}

fn parse_section(value: &str) -> Result<Section, String> {
    value.parse().map_err(invalid_input)
}

fn to_json<T: Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string(value).map_err(|e| client_error("INTERNAL_ERROR", e))
}

/// Seed from the browser's Math.random; only reachable from JavaScript
fn browser_seed() -> u64 {
    (js_sys::Math::random() * u64::MAX as f64) as u64
}

// ============================================================================
// Display helpers
// ============================================================================

/// Percentile (0-100) of an Elo rating
#[wasm_bindgen]
pub fn ranking_percentile(elo: f64) -> f64 {
    percentile(elo)
}

/// "1st".."5th", or "Unranked" for 0 and anything above 5
#[wasm_bindgen]
pub fn ordinal_label(rank: u8) -> String {
    rank_label((rank > 0).then_some(rank)).to_string()
}

#[wasm_bindgen]
pub fn bottle_emoji(bottle_type: &str) -> String {
    BottleType::from(bottle_type).emoji().to_string()
}

/// Flavor vocabulary entries containing `query`, case-insensitive
#[wasm_bindgen]
pub fn suggest_flavor_tags(query: &str) -> Vec<String> {
    suggest_tags(query).map(str::to_string).collect()
}

// ============================================================================
// Form validation
// ============================================================================

/// Error message for an invalid username, `None` when it is acceptable
#[wasm_bindgen]
pub fn check_username(username: &str) -> Option<String> {
    validate_username(username).err().map(str::to_string)
}

#[wasm_bindgen]
pub fn check_email(email: &str) -> Option<String> {
    validate_email(email).err().map(str::to_string)
}

/// Format a US number as `+1 (XXX) XXX-XXXX` while the user types
#[wasm_bindgen]
pub fn format_phone(raw: &str) -> Option<String> {
    format_us_phone(raw)
}

// ============================================================================
// Blind tasting
// ============================================================================

/// An in-browser tasting session.
///
/// Mirrors the server's step-by-step API so a tasting can run without a
/// connection; `toJson` produces the state to persist and `restore` picks it
/// back up. `view` is what the UI should render: bottle identities are
/// withheld while tasting.
#[wasm_bindgen]
pub struct BlindTasting {
    session: TastingSession,
    rng: StdRng,
}

impl BlindTasting {
    fn seeded(session: TastingSession, seed: u64) -> Self {
        Self {
            session,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Start a tasting with a fixed shuffle seed
    pub fn with_seed(user_id: &str, first_bottle_json: &str, seed: u64) -> Result<Self, String> {
        let user_id = parse_uuid(user_id)?;
        let bottle: Bottle = serde_json::from_str(first_bottle_json).map_err(invalid_input)?;
        Ok(Self::seeded(TastingSession::start(user_id, bottle), seed))
    }

    /// Resume a saved tasting with a fixed shuffle seed. Sessions whose
    /// contents do not match their step are rejected.
    pub fn restore_with_seed(session_json: &str, seed: u64) -> Result<Self, String> {
        let session: TastingSession = serde_json::from_str(session_json).map_err(invalid_input)?;
        Ok(Self::seeded(session, seed))
    }

    pub fn session(&self) -> &TastingSession {
        &self.session
    }
}

#[wasm_bindgen]
impl BlindTasting {
    #[wasm_bindgen(constructor)]
    pub fn new(user_id: &str, first_bottle_json: &str) -> Result<BlindTasting, String> {
        Self::with_seed(user_id, first_bottle_json, browser_seed())
    }

    /// Resume a tasting saved with `toJson`
    pub fn restore(session_json: &str) -> Result<BlindTasting, String> {
        Self::restore_with_seed(session_json, browser_seed())
    }

    #[wasm_bindgen(js_name = toJson)]
    pub fn to_json(&self) -> Result<String, String> {
        to_json(&self.session)
    }

    pub fn view(&self) -> Result<String, String> {
        to_json(&self.session.view())
    }

    pub fn step(&self) -> String {
        self.session.step().to_string()
    }

    #[wasm_bindgen(js_name = canProceed)]
    pub fn can_proceed(&self) -> bool {
        self.session.can_proceed()
    }

    // Selection

    #[wasm_bindgen(js_name = addBottle)]
    pub fn add_bottle(&mut self, bottle_json: &str) -> Result<(), String> {
        let bottle: Bottle = serde_json::from_str(bottle_json).map_err(invalid_input)?;
        self.session.add_bottle(bottle).map_err(tasting_error)
    }

    #[wasm_bindgen(js_name = removeBottle)]
    pub fn remove_bottle(&mut self, bottle_id: &str) -> Result<(), String> {
        let bottle_id = parse_uuid(bottle_id)?;
        self.session
            .remove_bottle(bottle_id)
            .map(|_| ())
            .map_err(tasting_error)
    }

    #[wasm_bindgen(js_name = proceedToPourer)]
    pub fn proceed_to_pourer(&mut self) -> Result<(), String> {
        self.session.proceed_to_pourer().map_err(tasting_error)
    }

    // Pourer

    pub fn assign(&mut self, bottle_id: &str, slot: &str) -> Result<(), String> {
        let bottle_id = parse_uuid(bottle_id)?;
        let slot = parse_slot(slot)?;
        self.session.assign(bottle_id, slot).map_err(tasting_error)
    }

    pub fn randomize(&mut self) -> Result<(), String> {
        self.session
            .randomize(&mut self.rng)
            .map_err(tasting_error)
    }

    #[wasm_bindgen(js_name = proceedToTaster)]
    pub fn proceed_to_taster(&mut self) -> Result<(), String> {
        self.session.proceed_to_taster().map_err(tasting_error)
    }

    // Taster

    /// Returns false when the tag was already present
    #[wasm_bindgen(js_name = addTag)]
    pub fn add_tag(&mut self, slot: &str, section: &str, tag: &str) -> Result<bool, String> {
        let (slot, section) = (parse_slot(slot)?, parse_section(section)?);
        self.session
            .add_tag(slot, section, tag)
            .map_err(tasting_error)
    }

    #[wasm_bindgen(js_name = removeTag)]
    pub fn remove_tag(&mut self, slot: &str, section: &str, tag: &str) -> Result<bool, String> {
        let (slot, section) = (parse_slot(slot)?, parse_section(section)?);
        self.session
            .remove_tag(slot, section, tag)
            .map_err(tasting_error)
    }

    #[wasm_bindgen(js_name = setCustomNote)]
    pub fn set_custom_note(&mut self, slot: &str, section: &str, text: &str) -> Result<(), String> {
        let (slot, section) = (parse_slot(slot)?, parse_section(section)?);
        self.session
            .set_custom_note(slot, section, text)
            .map_err(tasting_error)
    }

    /// `controls_json` lists the slot chosen for each rank position,
    /// e.g. `["B", "A", null]`
    #[wasm_bindgen(js_name = updateRanking)]
    pub fn update_ranking(&mut self, controls_json: &str) -> Result<(), String> {
        let controls: Vec<Option<Slot>> =
            serde_json::from_str(controls_json).map_err(invalid_input)?;
        self.session
            .update_ranking(&controls)
            .map_err(tasting_error)
    }

    #[wasm_bindgen(js_name = proceedToReveal)]
    pub fn proceed_to_reveal(&mut self) -> Result<(), String> {
        self.session.proceed_to_reveal().map_err(tasting_error)
    }

    // Reveal

    /// Build the reveal report. `ratings_json` maps bottle id to
    /// `{"user_elo": ..., "global_elo": ...}`; missing bottles count as unrated.
    pub fn reveal(&self, ratings_json: &str, upset_threshold: Option<f64>) -> Result<String, String> {
        let ratings: HashMap<Uuid, BottleRatings> =
            serde_json::from_str(ratings_json).map_err(invalid_input)?;
        let engine = match upset_threshold {
            Some(threshold) => RevealEngine::new().with_upset_threshold(threshold),
            None => RevealEngine::new(),
        };
        let report = engine
            .reveal(&self.session, &ratings)
            .map_err(tasting_error)?;
        to_json(&report)
    }

    /// Completed tasting record, ready to upload. Calling it again returns
    /// the same record.
    pub fn complete(&mut self) -> Result<String, String> {
        let completed = self
            .session
            .complete(chrono::Utc::now())
            .map_err(tasting_error)?;
        to_json(&completed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::TastingStep;

    const USER: &str = "7b0c5d1e-8a43-4f5e-9c1a-2d3e4f5a6b7c";

    fn bottle_json(name: &str) -> String {
        serde_json::json!({
            "id": Uuid::new_v4(),
            "name": name,
            "distillery": "Buffalo Trace",
            "type": "Bourbon",
            "status": "approved",
            "images": [],
            "barcode": null,
        })
        .to_string()
    }

    fn poured(bottles: usize) -> BlindTasting {
        let mut tasting = BlindTasting::with_seed(USER, &bottle_json("Bottle 1"), 42).unwrap();
        for i in 2..=bottles {
            tasting.add_bottle(&bottle_json(&format!("Bottle {}", i))).unwrap();
        }
        tasting.proceed_to_pourer().unwrap();
        tasting.randomize().unwrap();
        tasting.proceed_to_taster().unwrap();
        tasting
    }

    #[test]
    fn test_ordinal_label() {
        assert_eq!(ordinal_label(1), "1st");
        assert_eq!(ordinal_label(4), "4th");
        assert_eq!(ordinal_label(0), "Unranked");
        assert_eq!(ordinal_label(9), "Unranked");
    }

    #[test]
    fn test_ranking_percentile() {
        assert_eq!(ranking_percentile(1500.0), 50.0);
        assert_eq!(ranking_percentile(800.0), 0.0);
        assert_eq!(ranking_percentile(2200.0), 100.0);
    }

    #[test]
    fn test_bottle_emoji() {
        assert_eq!(bottle_emoji("Rye"), "🌾");
        assert_eq!(bottle_emoji("Bourbon"), "🥃");
        assert_eq!(bottle_emoji("Mezcal"), "🍺");
    }

    #[test]
    fn test_suggest_flavor_tags() {
        assert_eq!(suggest_flavor_tags("smo"), vec!["Smoke", "Smooth"]);
        assert!(suggest_flavor_tags("zzz").is_empty());
    }

    #[test]
    fn test_form_checks() {
        assert!(check_username("whiskyfan").is_none());
        assert!(check_username("no spaces").is_some());
        assert!(check_email("not-an-email").is_some());
        assert_eq!(format_phone("5551234567").as_deref(), Some("+1 (555) 123-4567"));
    }

    #[test]
    fn test_single_bottle_cannot_be_poured() {
        let mut tasting = BlindTasting::with_seed(USER, &bottle_json("Solo"), 1).unwrap();
        assert!(!tasting.can_proceed());
        let err = tasting.proceed_to_pourer().unwrap_err();
        assert!(err.contains("INSUFFICIENT_SELECTION"));
        assert_eq!(tasting.session().step(), TastingStep::Selection);
    }

    #[test]
    fn test_bad_input_is_a_validation_error() {
        let mut tasting = poured(2);
        let err = tasting.add_tag("F", "nose", "Oak").unwrap_err();
        assert!(err.contains("VALIDATION_ERROR"));
        let err = tasting.add_tag("A", "palate", "Oak").unwrap_err();
        assert!(err.contains("VALIDATION_ERROR"));
    }

    #[test]
    fn test_view_hides_bottles_while_tasting() {
        let tasting = poured(3);
        let view: serde_json::Value = serde_json::from_str(&tasting.view().unwrap()).unwrap();
        let slots = view["slots"].as_array().unwrap();
        assert_eq!(slots.len(), 3);
        assert!(slots.iter().all(|s| s["bottle_id"].is_null()));
        assert!(slots.iter().all(|s| s["poured"] == true));
    }

    #[test]
    fn test_full_tasting_to_reveal() {
        let mut tasting = poured(2);
        assert!(tasting.add_tag("A", "nose", "Vanilla").unwrap());
        assert!(!tasting.add_tag("a", "Nose", "vanilla").unwrap());
        tasting.set_custom_note("B", "finish", "Long and dry").unwrap();

        assert!(tasting.proceed_to_reveal().is_err());
        tasting.update_ranking(r#"["B", "A"]"#).unwrap();
        tasting.proceed_to_reveal().unwrap();

        let favorite = tasting.session().bottle_in(Slot::B).unwrap().id;
        let ratings = format!(
            r#"{{"{}": {{"user_elo": 1800.0, "global_elo": 1500.0}}}}"#,
            favorite
        );
        let report: serde_json::Value =
            serde_json::from_str(&tasting.reveal(&ratings, None).unwrap()).unwrap();
        assert_eq!(report["sequence"].as_array().unwrap().len(), 2);
        assert!(!report["upset"].is_null());

        let first = tasting.complete().unwrap();
        let second = tasting.complete().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_restore_round_trip() {
        let tasting = poured(2);
        let saved = tasting.to_json().unwrap();
        let restored = BlindTasting::restore_with_seed(&saved, 7).unwrap();
        assert_eq!(restored.session(), tasting.session());
    }

    #[test]
    fn test_restore_rejects_forged_reveal() {
        let tasting = BlindTasting::with_seed(USER, &bottle_json("Solo"), 1).unwrap();
        let mut state: serde_json::Value = serde_json::from_str(&tasting.to_json().unwrap()).unwrap();
        state["step"] = "reveal".into();

        let err = BlindTasting::restore_with_seed(&state.to_string(), 1).err().unwrap();
        assert!(err.contains("VALIDATION_ERROR"));
    }
}
