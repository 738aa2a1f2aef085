pub mod coefficients;
pub mod features;
pub mod financials;
pub mod orchestrator;
pub mod predictor;

pub use coefficients::CoefficientStore;
pub use orchestrator::{LeverCatalog, SimulationOrchestrator};
