//! WASM bridge between the epiflow model catalog and the web dashboards.

use anyhow::{anyhow, Result};
use epiflow_core::{
    ModelRegistry, ParameterSet, PresentationProfile, SimulationResult, SolverSettings,
};
use js_sys::Array;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::prelude::*;

#[derive(Debug, Serialize)]
pub struct ModelSummary {
    pub id: String,
    pub parameters: Vec<String>,
    pub compartments: Vec<String>,
    pub presentation_profile: PresentationProfile,
}

/// What a renderer receives: the result plus the layout it should use.
#[derive(Debug, Serialize)]
pub struct SimulationPayload {
    pub model_id: String,
    pub presentation_profile: PresentationProfile,
    pub result: SimulationResult,
}

pub fn summarize(registry: &ModelRegistry) -> Vec<ModelSummary> {
    registry
        .specs()
        .iter()
        .map(|spec| ModelSummary {
            id: spec.id().to_string(),
            parameters: spec.required_parameters().to_vec(),
            compartments: spec.compartment_labels().to_vec(),
            presentation_profile: spec.presentation_profile(),
        })
        .collect()
}

pub fn defaults_for(registry: &ModelRegistry, model_id: &str) -> Result<ParameterSet> {
    registry
        .lookup(model_id)?
        .default_parameters()
        .ok_or_else(|| anyhow!("model '{model_id}' has no default parameters"))
}

pub fn run_simulation(
    registry: &ModelRegistry,
    settings: &SolverSettings,
    model_id: &str,
    params: &ParameterSet,
    horizon: f64,
    sample_count: usize,
) -> Result<SimulationPayload> {
    let spec = registry.lookup(model_id)?;
    let result = registry.simulate_with(model_id, params, horizon, sample_count, settings)?;
    Ok(SimulationPayload {
        model_id: model_id.to_string(),
        presentation_profile: spec.presentation_profile(),
        result,
    })
}

fn decode<T: DeserializeOwned>(value: JsValue, what: &str) -> Result<T> {
    from_value(value).map_err(|err| anyhow!("invalid {what}: {err}"))
}

fn encode<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    to_value(value).map_err(|err| JsValue::from_str(&err.to_string()))
}

fn to_js_error(err: anyhow::Error) -> JsValue {
    JsValue::from_str(&format!("{err:#}"))
}

#[wasm_bindgen]
pub struct WasmModelCatalog {
    registry: ModelRegistry,
    settings: SolverSettings,
}

#[wasm_bindgen]
impl WasmModelCatalog {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Result<WasmModelCatalog, JsValue> {
        console_error_panic_hook::set_once();

        let registry = ModelRegistry::with_default_models()
            .map_err(|err| to_js_error(err.into()))?;
        Ok(WasmModelCatalog {
            registry,
            settings: SolverSettings::default(),
        })
    }

    pub fn model_ids(&self) -> Array {
        self.registry
            .list_ids()
            .into_iter()
            .map(JsValue::from_str)
            .collect()
    }

    pub fn list_models(&self) -> Result<JsValue, JsValue> {
        encode(&summarize(&self.registry))
    }

    pub fn default_parameters(&self, model_id: &str) -> Result<JsValue, JsValue> {
        let params = defaults_for(&self.registry, model_id).map_err(to_js_error)?;
        encode(&params)
    }

    pub fn set_solver_settings(&mut self, settings: JsValue) -> Result<(), JsValue> {
        self.settings = decode(settings, "solver settings").map_err(to_js_error)?;
        Ok(())
    }

    pub fn simulate(
        &self,
        model_id: &str,
        parameters: JsValue,
        horizon: f64,
        sample_count: u32,
    ) -> Result<JsValue, JsValue> {
        let params: ParameterSet = decode(parameters, "parameters").map_err(to_js_error)?;
        let payload = run_simulation(
            &self.registry,
            &self.settings,
            model_id,
            &params,
            horizon,
            sample_count as usize,
        )
        .map_err(to_js_error)?;
        encode(&payload)
    }
}


#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use epiflow_core::models::sir;
    use wasm_bindgen_test::wasm_bindgen_test;

    #[wasm_bindgen_test]
    fn simulate_round_trips_through_js_values() {
        let catalog = WasmModelCatalog::new().expect("catalog");
        assert_eq!(catalog.model_ids().length(), 3);

        let params = to_value(&sir::defaults()).expect("params");
        let value = catalog.simulate("sir", params, 30.0, 31).expect("simulate");
        assert!(value.is_object());
    }

    #[wasm_bindgen_test]
    fn simulate_rejects_unknown_model() {
        let catalog = WasmModelCatalog::new().expect("catalog");
        let params = to_value(&sir::defaults()).expect("params");
        let message = catalog
            .simulate("agent", params, 30.0, 31)
            .err()
            .and_then(|err| err.as_string())
            .unwrap_or_default();
        assert!(message.contains("model not found"));
    }
}
