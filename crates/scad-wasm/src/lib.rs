//! WASM bindings for expiration date extraction.
//!
//! The host app runs OCR on the camera frame and passes the recognized
//! fragments here, either as an array of `{ text, frame }` objects or one by
//! one through [`FragmentSetJs`].

use chrono::NaiveDate;
use wasm_bindgen::prelude::*;

use scad_core::models::config::ScadConfig;
use scad_core::ocr::{self, Rectangle, TextFragment};
use scad_core::{ExpiryExtractor, ExtractionError, ExtractionOutcome};

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Version information.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Extract the expiration date from an array of `{ text, frame }` fragments.
///
/// Always resolves to an outcome object; `success: false` means the user
/// should enter the date manually.
#[wasm_bindgen]
pub fn extract_expiration_date(fragments: JsValue) -> Result<JsValue, JsValue> {
    ExpirationExtractor::new().extract(fragments)
}

/// Parse a single line of text, e.g. "SCAD 12/05/2025", into `yyyy-MM-dd`.
#[wasm_bindgen]
pub fn parse_date_text(text: &str) -> Option<String> {
    ExpirationExtractor::new()
        .inner
        .extract_from_text(text)
        .ok()
        .map(|candidate| candidate.formatted_date)
}

/// Whether the text labels an expiration date ("SCAD", "EXP", "BEST BEFORE", ...).
#[wasm_bindgen]
pub fn is_expiration_anchor(text: &str) -> bool {
    scad_core::is_expiration_anchor(text)
}

/// Expiration date extractor class for browser use.
#[wasm_bindgen]
pub struct ExpirationExtractor {
    inner: scad_core::ExpirationExtractor,
}

#[wasm_bindgen]
impl ExpirationExtractor {
    /// Create an extractor with the default configuration.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self::with_config(&ScadConfig::default())
    }

    /// Create an extractor from a JSON configuration string.
    #[wasm_bindgen]
    pub fn from_config_json(json: &str) -> Result<ExpirationExtractor, JsValue> {
        let config: ScadConfig = serde_json::from_str(json).map_err(to_js_error)?;
        config.validate().map_err(to_js_error)?;
        Ok(Self::with_config(&config))
    }

    /// Reason against `date` instead of today.
    #[wasm_bindgen]
    pub fn set_reference_date(&mut self, date: &js_sys::Date) -> Result<(), JsValue> {
        let date = naive_date(date).ok_or_else(|| JsValue::from_str("Invalid reference date"))?;
        self.inner = self.inner.clone().with_reference_date(date);
        Ok(())
    }

    /// Reference date as `yyyy-MM-dd`.
    #[wasm_bindgen]
    pub fn reference_date(&self) -> String {
        self.inner.reference_date().format("%Y-%m-%d").to_string()
    }

    /// Extract from an array of `{ text, frame }` fragments.
    ///
    /// Input that is not a fragment array yields a "no date" outcome.
    #[wasm_bindgen]
    pub fn extract(&self, fragments: JsValue) -> Result<JsValue, JsValue> {
        match read_fragments(fragments) {
            Ok(fragments) => to_js(&self.inner.extract_outcome(&fragments)),
            Err(outcome) => to_js(&outcome),
        }
    }

    /// Extract with the source fragment and timing.
    #[wasm_bindgen]
    pub fn extract_with_details(&self, fragments: JsValue) -> Result<JsValue, JsValue> {
        #[derive(serde::Serialize)]
        #[serde(rename_all = "camelCase")]
        struct ExtractDetails {
            outcome: ExtractionOutcome,
            source_fragment: Option<TextFragment>,
            anchor_distance: Option<f32>,
            processing_time_ms: f64,
        }

        let fragments = match read_fragments(fragments) {
            Ok(fragments) => fragments,
            Err(outcome) => {
                return to_js(&ExtractDetails {
                    outcome,
                    source_fragment: None,
                    anchor_distance: None,
                    processing_time_ms: 0.0,
                });
            }
        };

        let start = js_sys::Date::now();
        let result = self.inner.extract(&fragments);
        let processing_time_ms = js_sys::Date::now() - start;

        let (source_fragment, anchor_distance) = match &result {
            Ok(candidate) => (Some(candidate.source_fragment.clone()), candidate.anchor_distance),
            Err(_) => (None, None),
        };

        to_js(&ExtractDetails {
            outcome: ExtractionOutcome::from_result(result, ocr::raw_text(&fragments)),
            source_fragment,
            anchor_distance,
            processing_time_ms,
        })
    }
}

impl ExpirationExtractor {
    fn with_config(config: &ScadConfig) -> Self {
        let today = naive_date(&js_sys::Date::new_0())
            .unwrap_or_else(|| chrono::Local::now().date_naive());
        Self {
            inner: scad_core::ExpirationExtractor::from_config_at(config, today),
        }
    }
}

impl Default for ExpirationExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Fragments pushed one at a time by the host's OCR callback.
#[wasm_bindgen]
pub struct FragmentSetJs {
    fragments: Vec<TextFragment>,
}

#[wasm_bindgen]
impl FragmentSetJs {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            fragments: Vec::new(),
        }
    }

    /// Add a recognized text span with its frame.
    #[wasm_bindgen]
    pub fn add_fragment(&mut self, text: &str, left: f32, top: f32, width: f32, height: f32) {
        self.fragments.push(TextFragment::new(
            text,
            Rectangle::new(left, top, width, height),
        ));
    }

    /// Number of fragments added so far.
    #[wasm_bindgen]
    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    #[wasm_bindgen]
    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    #[wasm_bindgen]
    pub fn clear(&mut self) {
        self.fragments.clear();
    }

    /// All fragment texts joined with spaces.
    #[wasm_bindgen]
    pub fn get_text(&self) -> String {
        ocr::raw_text(&self.fragments)
    }

    /// Extract the expiration date from the collected fragments.
    #[wasm_bindgen]
    pub fn extract(&self, extractor: &ExpirationExtractor) -> Result<JsValue, JsValue> {
        to_js(&extractor.inner.extract_outcome(&self.fragments))
    }
}

impl Default for FragmentSetJs {
    fn default() -> Self {
        Self::new()
    }
}

/// Calendar date of a JS `Date` in local time.
fn naive_date(date: &js_sys::Date) -> Option<NaiveDate> {
    let year = date.get_full_year();
    if year == 0 {
        return None;
    }
    NaiveDate::from_ymd_opt(year as i32, date.get_month() + 1, date.get_date())
}

/// Deserialize host fragments, or the outcome to report when they are unusable.
fn read_fragments(value: JsValue) -> Result<Vec<TextFragment>, ExtractionOutcome> {
    serde_wasm_bindgen::from_value(value).map_err(|e| {
        ExtractionOutcome::not_found(&ExtractionError::InvalidInput(e.to_string()), "")
    })
}

fn to_js<T: serde::Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(to_js_error)
}

fn to_js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}
