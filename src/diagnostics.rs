use serde::Serialize;
use tracing::warn;

use crate::loader::LoadError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    ClassNotFound,
    InitFailed,
    ArchiveUnreadable,
    DirectoryUnreadable,
    UnsupportedLocation,
    InvalidPackage,
    ResolveFailed,
    Unexpected,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanFailure {
    /// Class name, location URI or package the failure is about.
    pub target: String,
    pub kind: FailureKind,
    pub message: String,
}

impl ScanFailure {
    pub fn new(target: impl Into<String>, kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            kind,
            message: message.into(),
        }
    }

    pub fn from_load_error(fqn: &str, err: &LoadError) -> Self {
        let kind = match err {
            LoadError::NotFound(_) => FailureKind::ClassNotFound,
            LoadError::InitFailed { .. } => FailureKind::InitFailed,
        };
        Self::new(fqn, kind, err.to_string())
    }
}

pub trait Diagnostics {
    fn report(&mut self, failure: &ScanFailure);
}

/// Forwards every failure to the `tracing` warn level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn report(&mut self, failure: &ScanFailure) {
        warn!(
            subject = %failure.target,
            kind = ?failure.kind,
            "{}",
            failure.message
        );
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NullDiagnostics;

impl Diagnostics for NullDiagnostics {
    fn report(&mut self, _failure: &ScanFailure) {}
}

impl Diagnostics for Vec<ScanFailure> {
    fn report(&mut self, failure: &ScanFailure) {
        self.push(failure.clone());
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanReport {
    pub packages: Vec<String>,
    pub locations: Vec<String>,
    pub initialized: usize,
    pub failures: Vec<ScanFailure>,
}

impl ScanReport {
    pub fn new(package: &str) -> Self {
        Self {
            packages: vec![package.to_string()],
            ..Self::default()
        }
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failures_of(&self, kind: FailureKind) -> impl Iterator<Item = &ScanFailure> {
        self.failures.iter().filter(move |f| f.kind == kind)
    }

    pub fn merge(&mut self, other: ScanReport) {
        self.packages.extend(other.packages);
        self.locations.extend(other.locations);
        self.initialized += other.initialized;
        self.failures.extend(other.failures);
    }
}
