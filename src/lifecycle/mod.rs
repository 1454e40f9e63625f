mod params;
mod store;
mod transition;

pub use params::{RecoveredParameters, parse_parameters, recover_request};
pub use store::{RegenerationPlan, ReportStore};
pub use transition::{LifecycleRules, ReportAction};
