//! Top-level package enumeration.
//!
//! [`PackageEnumerator::enumerate`] resolves a package to every resource
//! location on the classpath, hands each one to the matching walker and
//! folds the results into a [`ScanReport`]. It never returns an error: every
//! failure, including a panicking initializer, ends up in the report and in
//! the injected [`Diagnostics`] sink.

use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, info};

use crate::classpath::ResourceResolver;
use crate::diagnostics::{Diagnostics, FailureKind, ScanFailure, ScanReport};
use crate::dir_walk::walk_directory_into;
use crate::jar_walk::{report_unreadable, walk_entries_into};
use crate::loader::ClassLoader;
use crate::names::{is_valid_package_name, to_dir_path};
use crate::resource::ResourceLocation;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanOptions {
    pub recursive: bool,
    pub skip_inner_classes: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            recursive: true,
            skip_inner_classes: false,
        }
    }
}

/// What one walker did with one resource location.
#[derive(Debug, Default)]
pub struct WalkOutcome {
    pub initialized: usize,
    pub failures: Vec<ScanFailure>,
}

impl WalkOutcome {
    pub(crate) fn load(&mut self, fqn: &str, loader: &mut dyn ClassLoader, sink: &mut dyn Diagnostics) {
        match loader.ensure_initialized(fqn) {
            Ok(()) => {
                debug!(class = fqn, "initialized");
                self.initialized += 1;
            }
            Err(err) => self.fail(ScanFailure::from_load_error(fqn, &err), sink),
        }
    }

    pub(crate) fn fail(&mut self, failure: ScanFailure, sink: &mut dyn Diagnostics) {
        sink.report(&failure);
        self.failures.push(failure);
    }
}

pub struct PackageEnumerator<R> {
    resolver: R,
    options: ScanOptions,
}

impl<R: ResourceResolver> PackageEnumerator<R> {
    pub fn new(resolver: R) -> Self {
        Self {
            resolver,
            options: ScanOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ScanOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &ScanOptions {
        &self.options
    }

    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    pub fn enumerate(
        &self,
        package: &str,
        loader: &mut dyn ClassLoader,
        sink: &mut dyn Diagnostics,
    ) -> ScanReport {
        let package = package.trim();
        let mut report = ScanReport::new(package);
        // Progress on the location being walked; lives out here so a panic
        // does not lose it.
        let mut current = WalkOutcome::default();

        let scan = panic::catch_unwind(AssertUnwindSafe(|| {
            self.scan_package(package, &mut report, &mut current, &mut *loader, &mut *sink)
        }));

        if let Err(payload) = scan {
            absorb(&mut report, current);
            let message = panic_message(payload.as_ref());
            record(
                &mut report,
                sink,
                ScanFailure::new(
                    package,
                    FailureKind::Unexpected,
                    format!("enumeration aborted: {message}"),
                ),
            );
        }

        info!(
            package,
            locations = report.locations.len(),
            initialized = report.initialized,
            failed = report.failures.len(),
            "package enumeration finished"
        );
        report
    }

    /// Runs [`Self::enumerate`] for each package in order and merges the reports.
    pub fn enumerate_all<S: AsRef<str>>(
        &self,
        packages: &[S],
        loader: &mut dyn ClassLoader,
        sink: &mut dyn Diagnostics,
    ) -> ScanReport {
        let mut merged = ScanReport::default();
        for package in packages {
            merged.merge(self.enumerate(package.as_ref(), loader, sink));
        }
        merged
    }

    fn scan_package(
        &self,
        package: &str,
        report: &mut ScanReport,
        current: &mut WalkOutcome,
        loader: &mut dyn ClassLoader,
        sink: &mut dyn Diagnostics,
    ) {
        if !is_valid_package_name(package) {
            record(
                report,
                sink,
                ScanFailure::new(
                    package,
                    FailureKind::InvalidPackage,
                    format!("not a valid package name: {package:?}"),
                ),
            );
            return;
        }

        let dir_path = to_dir_path(package);
        let locations = match self.resolver.resources(&dir_path) {
            Ok(locations) => locations,
            Err(err) => {
                record(
                    report,
                    sink,
                    ScanFailure::new(package, FailureKind::ResolveFailed, format!("{err:#}")),
                );
                return;
            }
        };

        if locations.is_empty() {
            debug!(package, "no resource locations on classpath");
        }

        for location in locations {
            report.locations.push(location.to_string());

            match &location {
                ResourceLocation::File { path } => {
                    walk_directory_into(package, path, &self.options, loader, sink, current)
                }
                ResourceLocation::Jar { archive, entry } => {
                    match self.resolver.archive_entries(archive) {
                        Ok(names) => walk_entries_into(
                            package,
                            &names,
                            entry,
                            &self.options,
                            loader,
                            sink,
                            current,
                        ),
                        Err(err) => report_unreadable(archive, &err, sink, current),
                    }
                }
                ResourceLocation::Other { scheme, .. } => {
                    record(
                        report,
                        sink,
                        ScanFailure::new(
                            location.to_string(),
                            FailureKind::UnsupportedLocation,
                            format!("unsupported resource scheme: {scheme}"),
                        ),
                    );
                    continue;
                }
            }

            let outcome = std::mem::take(current);
            info!(
                location = %location,
                initialized = outcome.initialized,
                failed = outcome.failures.len(),
                "scanned resource location"
            );
            absorb(report, outcome);
        }
    }
}

fn absorb(report: &mut ScanReport, outcome: WalkOutcome) {
    report.initialized += outcome.initialized;
    report.failures.extend(outcome.failures);
}

fn record(report: &mut ScanReport, sink: &mut dyn Diagnostics, failure: ScanFailure) {
    sink.report(&failure);
    report.failures.push(failure);
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic with non-string payload".to_string()
    }
}
