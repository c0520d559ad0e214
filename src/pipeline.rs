//! Drives one run: scan, compile, encrypt, package, report.

use crate::bundler::{
    AssemblyOutcome, Bundler, DataFile, SettingsBuilder, StagedData, ToolLocator,
};
use crate::compiler::{BuildExecutor, BuildResult, CompilerInvocation, StreamLine, synthesize};
use crate::config::BuildConfig;
use crate::error::{Error, Result};
use crate::payload::{self, EncryptedPayload};
use crate::report::RunReport;
use crate::scan::{self, IgnoreSpec, ScanResult, bundled_files, select_bundled};
use std::path::{Path, PathBuf};

/// Scan results and the command they produced, ready to execute.
#[derive(Debug)]
pub struct Prepared {
    /// Ignore rules used for the scan; reused when bundling data.
    pub ignore: IgnoreSpec,
    /// What the scan found.
    pub scan: ScanResult,
    /// The compiler command.
    pub invocation: CompilerInvocation,
}

/// Everything a successful run produced.
#[derive(Debug)]
pub struct RunOutcome {
    /// Compiler result.
    pub build: BuildResult,
    /// Encrypted payload, when requested and something was selected.
    pub payload: Option<EncryptedPayload>,
    /// One entry per selected format; empty when packaging did not run.
    pub packages: Vec<AssemblyOutcome>,
    /// Run report, when it could be written.
    pub report: Option<PathBuf>,
}

/// One orchestrator run over a resolved configuration.
#[derive(Debug)]
pub struct Pipeline<'a> {
    config: &'a BuildConfig,
    tools: ToolLocator,
}

impl<'a> Pipeline<'a> {
    /// Pipeline for `config`, finding packaging tools with `tools`.
    pub fn new(config: &'a BuildConfig, tools: ToolLocator) -> Self {
        Self { config, tools }
    }

    /// Loads the ignore file, scans the tree and synthesizes the command.
    ///
    /// Fails only on configuration problems; nothing is spawned.
    pub async fn prepare(&self) -> Result<Prepared> {
        let layout = self.config.layout.clone();
        let ignore = IgnoreSpec::load(&layout.ignore_path())?;
        log::debug!("Loaded {} ignore patterns", ignore.len());

        let scan_ignore = ignore.clone();
        let scan = tokio::task::spawn_blocking(move || scan::scan(&layout, &scan_ignore))
            .await
            .map_err(|e| anyhow::anyhow!("scan task failed: {e}"))?;
        log::info!(
            "Found {} packages and {} data directories",
            scan.packages.len(),
            scan.data_dirs.len()
        );

        let invocation = synthesize(
            &scan.packages,
            &scan.data_dirs,
            self.config,
            self.config.platform,
        );
        Ok(Prepared {
            ignore,
            scan,
            invocation,
        })
    }

    /// Runs the compiler, then the optional payload and packaging stages.
    ///
    /// A toolchain failure is returned after the run report is written.
    /// Packaging problems end up in [`RunOutcome::packages`], never here.
    pub async fn run<F>(&self, prepared: &Prepared, on_line: F) -> Result<RunOutcome>
    where
        F: FnMut(&StreamLine),
    {
        let build_dir = self.config.build_dir();
        let executor = BuildExecutor::new(self.config);

        let build = match executor
            .execute(&prepared.invocation, self.config.stream_output, on_line)
            .await
        {
            Ok(build) => build,
            Err(err) => {
                if let Error::Toolchain(failure) = &err {
                    RunReport::new(
                        &self.config.version,
                        &prepared.scan,
                        &prepared.invocation,
                        failure.exit_code,
                    )
                    .write(&build_dir)
                    .await;
                }
                return Err(err);
            }
        };

        let payload = if self.config.encrypt_data {
            payload::encrypt(&self.config.layout, &prepared.ignore, &prepared.scan.data_dirs)
                .await?
        } else {
            None
        };

        let packages = match &build.binary {
            Some(binary) if !self.config.formats.is_empty() => {
                self.assemble(prepared, binary, payload.as_ref()).await
            }
            Some(_) => {
                log::info!("Packaging disabled");
                Vec::new()
            }
            None => {
                if !self.config.formats.is_empty() {
                    log::warn!("No binary to package; skipping package assembly");
                }
                Vec::new()
            }
        };

        let mut report = RunReport::new(
            &self.config.version,
            &prepared.scan,
            &prepared.invocation,
            build.exit_code,
        );
        report.binary = build.binary.as_deref();
        report.payload = payload.as_ref();
        report.package_outcomes = &packages;
        let report = report.write(&build_dir).await;

        Ok(RunOutcome {
            build,
            payload,
            packages,
            report,
        })
    }

    async fn assemble(
        &self,
        prepared: &Prepared,
        binary: &Path,
        payload: Option<&EncryptedPayload>,
    ) -> Vec<AssemblyOutcome> {
        let data = match payload {
            Some(payload) => StagedData::EncryptedPayload(payload.ciphertext_path.clone()),
            None => self.plain_data(prepared).await,
        };

        let mut package = self.config.package.clone();
        package.version = self.config.version.clone();

        let settings = SettingsBuilder::new()
            .project_out_directory(self.config.build_dir())
            .package_settings(package)
            .binary(binary)
            .data(data)
            .package_formats(self.config.formats.clone())
            .build();

        match settings {
            Ok(settings) => Bundler::new(settings, self.tools.clone()).bundle().await,
            Err(e) => {
                log::warn!("Cannot assemble packages: {e}");
                self.config
                    .formats
                    .iter()
                    .map(|format| AssemblyOutcome::Failed {
                        format: *format,
                        reason: e.to_string(),
                    })
                    .collect()
            }
        }
    }

    async fn plain_data(&self, prepared: &Prepared) -> StagedData {
        let layout = self.config.layout.clone();
        let ignore = prepared.ignore.clone();
        let data_dirs = prepared.scan.data_dirs.clone();

        let files = tokio::task::spawn_blocking(move || {
            let selected = select_bundled(&data_dirs, &layout.always_bundle);
            bundled_files(&layout, &ignore, &selected)
                .into_iter()
                .map(|rel| DataFile {
                    source: layout.resolve(&rel),
                    rel,
                })
                .collect::<Vec<_>>()
        })
        .await;

        match files {
            Ok(files) => {
                log::debug!("Staging {} data files", files.len());
                StagedData::Files(files)
            }
            Err(e) => {
                log::warn!("Failed to list data files, packaging without data: {e}");
                StagedData::default()
            }
        }
    }
}
