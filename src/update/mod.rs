use crate::error::{Result, ShimmyError};
use crate::installer::Installer;
use crate::manifest::{InstalledScript, Manifest};
use crate::registry::RegistryClient;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Check,
    Apply,
}

/// Subset selection applied before resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    All,
    Names(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    Resolution(String),
    Install(String),
    UnknownName,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandidateStatus {
    UpToDate,
    UpdateAvailable,
    Failed(FailureKind),
}

/// Per-script outcome of one update run. Produced fresh per invocation and
/// never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateCandidate {
    pub name: String,
    pub current: Option<String>,
    pub latest: Option<String>,
    pub status: CandidateStatus,
}

/// The update orchestrator.
///
/// Pure over `(manifest, filter, mode)` plus resolver I/O: collaborators are
/// injected, every per-script error becomes a candidate status, and the
/// result order is stable (manifest order, then unknown targets as
/// requested).
pub struct UpdateEngine {
    registry: Arc<dyn RegistryClient>,
    installer: Arc<dyn Installer>,
    stable_only: bool,
    jobs: Option<usize>,
}

impl UpdateEngine {
    pub fn new(registry: Arc<dyn RegistryClient>, installer: Arc<dyn Installer>) -> Self {
        Self {
            registry,
            installer,
            stable_only: true,
            jobs: None,
        }
    }

    pub fn include_unstable(mut self, include: bool) -> Self {
        self.stable_only = !include;
        self
    }

    pub fn jobs(mut self, jobs: Option<usize>) -> Self {
        self.jobs = jobs;
        self
    }

    pub fn run(&self, manifest: &Manifest, filter: &Filter, mode: Mode) -> Vec<UpdateCandidate> {
        let (selected, unknown) = Self::working_set(manifest, filter);

        let resolutions = self.resolve_all(&selected);

        let mut candidates: Vec<UpdateCandidate> = selected
            .iter()
            .zip(resolutions)
            .map(|(script, resolution)| Self::classify(script, resolution))
            .collect();

        if mode == Mode::Apply {
            self.apply(&selected, &mut candidates);
        }

        for name in unknown {
            candidates.push(UpdateCandidate {
                name,
                current: None,
                latest: None,
                status: CandidateStatus::Failed(FailureKind::UnknownName),
            });
        }

        candidates
    }

    /// Matched manifest entries in manifest order, plus requested names the
    /// manifest does not know (deduplicated, in request order).
    fn working_set(manifest: &Manifest, filter: &Filter) -> (Vec<InstalledScript>, Vec<String>) {
        match filter {
            Filter::All => (manifest.scripts().to_vec(), Vec::new()),
            Filter::Names(names) => {
                let mut requested: Vec<&String> = Vec::new();
                let mut seen: HashSet<&str> = HashSet::new();
                for name in names {
                    if seen.insert(name.as_str()) {
                        requested.push(name);
                    }
                }

                let selected: Vec<InstalledScript> = manifest
                    .scripts()
                    .iter()
                    .filter(|script| seen.contains(script.name.as_str()))
                    .cloned()
                    .collect();

                let unknown = requested
                    .into_iter()
                    .filter(|name| !manifest.contains(name))
                    .cloned()
                    .collect();

                (selected, unknown)
            }
        }
    }

    /// Resolve each script's latest version, a bounded batch at a time.
    /// Completion order inside a batch is unordered; results come back in
    /// input order. A worker failure or panic is contained to its script.
    fn resolve_all(&self, scripts: &[InstalledScript]) -> Vec<Result<Option<String>>> {
        if scripts.is_empty() {
            return Vec::new();
        }

        let pb = ProgressBar::new(scripts.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("  [{bar:40}] {pos}/{len} {msg}")
                .unwrap()
                .progress_chars("=>-"),
        );

        let jobs = self.job_count(scripts.len());
        let mut results: Vec<Result<Option<String>>> = Vec::with_capacity(scripts.len());
        let registry = &self.registry;
        let stable_only = self.stable_only;
        let pb_ref = &pb;

        for chunk in scripts.chunks(jobs) {
            thread::scope(|scope| {
                let mut handles = Vec::with_capacity(chunk.len());
                for script in chunk {
                    handles.push(scope.spawn(move || {
                        pb_ref.set_message(format!("Checking {}", script.name));

                        // An unpinned source tracks latest implicitly
                        let outcome = if script.source.pinned_version().is_none() {
                            Ok(None)
                        } else {
                            registry.resolve_latest(&script.source, stable_only)
                        };

                        pb_ref.inc(1);
                        outcome
                    }));
                }

                for handle in handles {
                    results.push(handle.join().unwrap_or_else(|_| {
                        Err(ShimmyError::Resolution(
                            "resolver worker panicked".to_string(),
                        ))
                    }));
                }
            });
        }

        pb.finish_and_clear();
        results
    }

    fn job_count(&self, task_count: usize) -> usize {
        let from_env = std::env::var("SHIMMY_JOBS")
            .ok()
            .and_then(|s| s.trim().parse::<usize>().ok())
            .filter(|n| *n > 0);

        let default = thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);

        from_env
            .or(self.jobs)
            .unwrap_or(default)
            .clamp(1, task_count.max(1))
    }

    fn classify(script: &InstalledScript, resolution: Result<Option<String>>) -> UpdateCandidate {
        let current = script.source.pinned_version().map(String::from);

        match resolution {
            Err(e) => UpdateCandidate {
                name: script.name.clone(),
                current,
                latest: None,
                status: CandidateStatus::Failed(FailureKind::Resolution(e.to_string())),
            },
            Ok(latest) => {
                let status = match (&current, &latest) {
                    (Some(current), Some(latest)) if current != latest => {
                        CandidateStatus::UpdateAvailable
                    }
                    _ => CandidateStatus::UpToDate,
                };

                UpdateCandidate {
                    name: script.name.clone(),
                    current,
                    latest,
                    status,
                }
            }
        }
    }

    /// Reinstall every script with an available update, one at a time so a
    /// failure is attributable to exactly one entry.
    fn apply(&self, scripts: &[InstalledScript], candidates: &mut [UpdateCandidate]) {
        for (script, candidate) in scripts.iter().zip(candidates.iter_mut()) {
            if candidate.status != CandidateStatus::UpdateAvailable {
                continue;
            }

            let Some(latest) = candidate.latest.clone() else {
                continue;
            };

            let outcome = script
                .source
                .with_version(&latest)
                .and_then(|source| self.installer.install(&script.name, &source));

            if let Err(e) = outcome {
                candidate.status = CandidateStatus::Failed(FailureKind::Install(e.to_string()));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SourceRef;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct StubRegistry {
        latest: HashMap<String, String>,
        fail: HashSet<String>,
        calls: Mutex<Vec<String>>,
    }

    impl StubRegistry {
        fn new(latest: &[(&str, &str)]) -> Self {
            Self {
                latest: latest
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
                fail: HashSet::new(),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn failing_for(mut self, module: &str) -> Self {
            self.fail.insert(module.to_string());
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl RegistryClient for StubRegistry {
        fn resolve_latest(
            &self,
            source: &SourceRef,
            _stable_only: bool,
        ) -> Result<Option<String>> {
            let module = source.module().unwrap_or_default().to_string();
            self.calls.lock().unwrap().push(module.clone());

            if self.fail.contains(&module) {
                return Err(ShimmyError::Resolution(format!(
                    "registry unreachable for '{}'",
                    module
                )));
            }

            Ok(self.latest.get(&module).cloned())
        }
    }

    struct RecordingInstaller {
        installs: Mutex<Vec<(String, String)>>,
        fail: HashSet<String>,
    }

    impl RecordingInstaller {
        fn new() -> Self {
            Self {
                installs: Mutex::new(Vec::new()),
                fail: HashSet::new(),
            }
        }

        fn failing_for(mut self, name: &str) -> Self {
            self.fail.insert(name.to_string());
            self
        }

        fn installs(&self) -> Vec<(String, String)> {
            self.installs.lock().unwrap().clone()
        }
    }

    impl Installer for RecordingInstaller {
        fn install(&self, name: &str, source: &SourceRef) -> Result<()> {
            if self.fail.contains(name) {
                return Err(ShimmyError::Install("disk full".to_string()));
            }
            self.installs
                .lock()
                .unwrap()
                .push((name.to_string(), source.as_str().to_string()));
            Ok(())
        }
    }

    fn script(name: &str, url: &str) -> InstalledScript {
        InstalledScript {
            name: name.to_string(),
            source: SourceRef::parse(url).unwrap(),
        }
    }

    fn fixture_manifest() -> Manifest {
        Manifest::from_scripts(vec![
            script("nublar", "https://deno.land/x/nublar/nublar.ts"),
            script("udd", "https://deno.land/x/udd@0.5.0/main.ts"),
        ])
    }

    fn fixture_registry() -> StubRegistry {
        StubRegistry::new(&[("udd", "0.8.2")])
    }

    fn engine(registry: StubRegistry, installer: RecordingInstaller) -> UpdateEngine {
        UpdateEngine::new(Arc::new(registry), Arc::new(installer))
    }

    fn status_of<'a>(candidates: &'a [UpdateCandidate], name: &str) -> &'a CandidateStatus {
        &candidates
            .iter()
            .find(|c| c.name == name)
            .unwrap_or_else(|| panic!("no candidate for '{}'", name))
            .status
    }

    #[test]
    fn check_reports_only_stale_scripts() {
        let registry = Arc::new(fixture_registry());
        let engine = UpdateEngine::new(registry.clone(), Arc::new(RecordingInstaller::new()));

        let candidates = engine.run(&fixture_manifest(), &Filter::All, Mode::Check);

        assert_eq!(status_of(&candidates, "nublar"), &CandidateStatus::UpToDate);
        assert_eq!(
            status_of(&candidates, "udd"),
            &CandidateStatus::UpdateAvailable
        );

        // Unpinned sources are never resolved against the registry
        assert_eq!(registry.calls(), vec!["udd".to_string()]);
    }

    #[test]
    fn pinned_at_latest_is_up_to_date() {
        let registry = StubRegistry::new(&[("udd", "0.5.0")]);
        let engine = engine(registry, RecordingInstaller::new());

        let candidates = engine.run(&fixture_manifest(), &Filter::All, Mode::Check);
        assert_eq!(status_of(&candidates, "udd"), &CandidateStatus::UpToDate);
    }

    #[test]
    fn named_filter_restricts_resolution_and_output() {
        let registry = Arc::new(fixture_registry());
        let engine = UpdateEngine::new(registry.clone(), Arc::new(RecordingInstaller::new()));

        let filter = Filter::Names(vec!["udd".to_string()]);
        let candidates = engine.run(&fixture_manifest(), &filter, Mode::Check);

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].name, "udd");
        assert_eq!(registry.calls(), vec!["udd".to_string()]);
    }

    #[test]
    fn filtering_to_a_current_script_yields_no_update() {
        let engine = engine(fixture_registry(), RecordingInstaller::new());

        let filter = Filter::Names(vec!["nublar".to_string()]);
        let candidates = engine.run(&fixture_manifest(), &filter, Mode::Check);

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].status, CandidateStatus::UpToDate);
    }

    #[test]
    fn unknown_names_become_per_name_failures() {
        let engine = engine(fixture_registry(), RecordingInstaller::new());

        let filter = Filter::Names(vec!["ghost".to_string(), "udd".to_string()]);
        let candidates = engine.run(&fixture_manifest(), &filter, Mode::Check);

        // Matched entries first (manifest order), unknown targets last
        assert_eq!(candidates[0].name, "udd");
        assert_eq!(candidates[0].status, CandidateStatus::UpdateAvailable);
        assert_eq!(candidates[1].name, "ghost");
        assert_eq!(
            candidates[1].status,
            CandidateStatus::Failed(FailureKind::UnknownName)
        );
    }

    #[test]
    fn duplicate_requested_names_collapse() {
        let engine = engine(fixture_registry(), RecordingInstaller::new());

        let filter = Filter::Names(vec!["udd".to_string(), "udd".to_string()]);
        let candidates = engine.run(&fixture_manifest(), &filter, Mode::Check);
        assert_eq!(candidates.len(), 1);
    }

    #[test]
    fn check_mode_is_idempotent_and_installs_nothing() {
        let installer = Arc::new(RecordingInstaller::new());
        let engine = UpdateEngine::new(Arc::new(fixture_registry()), installer.clone());
        let manifest = fixture_manifest();

        let first = engine.run(&manifest, &Filter::All, Mode::Check);
        let second = engine.run(&manifest, &Filter::All, Mode::Check);

        assert_eq!(first, second);
        assert!(installer.installs().is_empty());
    }

    #[test]
    fn apply_reinstalls_at_the_new_pin() {
        let installer = Arc::new(RecordingInstaller::new());
        let engine = UpdateEngine::new(Arc::new(fixture_registry()), installer.clone());

        let candidates = engine.run(&fixture_manifest(), &Filter::All, Mode::Apply);

        assert_eq!(
            status_of(&candidates, "udd"),
            &CandidateStatus::UpdateAvailable
        );
        assert_eq!(
            installer.installs(),
            vec![(
                "udd".to_string(),
                "https://deno.land/x/udd@0.8.2/main.ts".to_string()
            )]
        );
    }

    #[test]
    fn install_failure_is_contained_to_its_script() {
        let manifest = Manifest::from_scripts(vec![
            script("fmt", "https://deno.land/x/fmt@1.0.0/cli.ts"),
            script("udd", "https://deno.land/x/udd@0.5.0/main.ts"),
        ]);
        let registry = StubRegistry::new(&[("udd", "0.8.2"), ("fmt", "1.4.0")]);
        let installer = Arc::new(RecordingInstaller::new().failing_for("fmt"));
        let engine = UpdateEngine::new(Arc::new(registry), installer.clone());

        let candidates = engine.run(&manifest, &Filter::All, Mode::Apply);

        assert!(matches!(
            status_of(&candidates, "fmt"),
            CandidateStatus::Failed(FailureKind::Install(_))
        ));
        assert_eq!(
            status_of(&candidates, "udd"),
            &CandidateStatus::UpdateAvailable
        );
        assert_eq!(installer.installs().len(), 1);
    }

    #[test]
    fn resolver_failure_does_not_abort_the_batch() {
        let manifest = Manifest::from_scripts(vec![
            script("fmt", "https://deno.land/x/fmt@1.0.0/cli.ts"),
            script("udd", "https://deno.land/x/udd@0.5.0/main.ts"),
        ]);
        let registry = StubRegistry::new(&[("udd", "0.8.2")]).failing_for("fmt");
        let engine = engine(registry, RecordingInstaller::new());

        let candidates = engine.run(&manifest, &Filter::All, Mode::Check);

        assert!(matches!(
            status_of(&candidates, "fmt"),
            CandidateStatus::Failed(FailureKind::Resolution(_))
        ));
        assert_eq!(
            status_of(&candidates, "udd"),
            &CandidateStatus::UpdateAvailable
        );
    }

    #[test]
    fn registry_silence_means_up_to_date() {
        let manifest = Manifest::from_scripts(vec![script(
            "udd",
            "https://deno.land/x/udd@0.5.0/main.ts",
        )]);
        let engine = engine(StubRegistry::new(&[]), RecordingInstaller::new());

        let candidates = engine.run(&manifest, &Filter::All, Mode::Check);
        assert_eq!(candidates[0].status, CandidateStatus::UpToDate);
    }

    #[test]
    fn apply_then_check_converges() {
        use crate::installer::ShimInstaller;
        use crate::manifest::ManifestStore;
        use crate::settings::RuntimeSpec;

        let dir = tempfile::tempdir().unwrap();
        let installer = Arc::new(ShimInstaller::new(dir.path(), RuntimeSpec::default()));
        installer
            .install(
                "udd",
                &SourceRef::parse("https://deno.land/x/udd@0.5.0/main.ts").unwrap(),
            )
            .unwrap();

        let engine = UpdateEngine::new(Arc::new(fixture_registry()), installer);
        let store = ManifestStore::new(dir.path());

        let applied = engine.run(&store.load().unwrap(), &Filter::All, Mode::Apply);
        assert_eq!(
            status_of(&applied, "udd"),
            &CandidateStatus::UpdateAvailable
        );

        let rechecked = engine.run(&store.load().unwrap(), &Filter::All, Mode::Check);
        assert_eq!(status_of(&rechecked, "udd"), &CandidateStatus::UpToDate);
    }

    #[test]
    fn results_come_back_in_manifest_order() {
        let manifest = Manifest::from_scripts(vec![
            script("alpha", "https://deno.land/x/alpha@1.0.0/main.ts"),
            script("beta", "https://deno.land/x/beta@1.0.0/main.ts"),
            script("gamma", "https://deno.land/x/gamma@1.0.0/main.ts"),
        ]);
        let registry = StubRegistry::new(&[
            ("alpha", "2.0.0"),
            ("beta", "1.0.0"),
            ("gamma", "3.0.0"),
        ]);
        let engine = engine(registry, RecordingInstaller::new()).jobs(Some(2));

        let names: Vec<String> = engine
            .run(&manifest, &Filter::All, Mode::Check)
            .into_iter()
            .map(|c| c.name)
            .collect();

        assert_eq!(names, vec!["alpha", "beta", "gamma"]);
    }
}
