//! Client-side orchestration for asynchronous certification report jobs.
//!
//! The remote service generates reports in the background; this crate
//! keeps the client's view of employees, eligible certifications and
//! report jobs consistent while requests are in flight. Everything goes
//! through [`ReportOrchestrator`], which talks to the service via a
//! [`ReportGateway`].

pub mod cli;
pub mod config;
pub mod error;
pub mod filter;
pub mod gateway;
pub mod lifecycle;
pub mod model;
pub mod orchestrator;
pub mod pagination;
pub mod selection;
pub mod ui;

pub use config::ClientConfig;
pub use error::ReportError;
pub use gateway::{GatewayError, HttpGateway, ReportGateway};
pub use model::{
    CertificationDefinition, DateRange, Employee, Report, ReportRequest, ReportStatus, ReportType,
};
pub use orchestrator::{ReportOrchestrator, SessionSnapshot, View};
