//! View-model mediating between user actions and the backend.
//!
//! Each user action maps to one method. Methods update the shared
//! [`ViewState`] before and after awaiting the backend; the lock is never
//! held across a backend call, so independent slices load concurrently.

mod state;

use std::sync::Arc;

use forcenpm_domain::{
    CreatedResource, PackageSuggestion, ProvisionedResource, SliceStatus, parse_records,
};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

pub use state::{SessionLinks, ViewState};

use crate::error::{ApplicationError, ApplicationResult};
use crate::ports::{BackendError, BackendResult, ForceNpmBackend};

#[derive(Debug, Default)]
struct Inner {
    view: ViewState,
    versions_generation: u64,
    files_generation: u64,
}

impl Inner {
    /// Logs a failed call and raises `session_expired` on auth failures.
    fn note_failure(&mut self, operation: &str, error: &BackendError) {
        warn!(operation, error = %error, "backend call failed");
        if error.is_unauthorized() {
            self.view.session_expired = true;
        }
    }

    /// Records a failed call and returns the status for its slice.
    fn failure(&mut self, operation: &str, error: &BackendError) -> SliceStatus {
        self.note_failure(operation, error);
        SliceStatus::failed(error.kind(), error.to_string())
    }
}

/// Handle to a create request running in the background.
#[derive(Debug)]
pub struct CreateHandle {
    task: JoinHandle<BackendResult<CreatedResource>>,
}

impl CreateHandle {
    /// Returns true once the create (and the refresh after it) finished.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Waits for the create and the list refresh that follows it.
    ///
    /// # Errors
    ///
    /// Returns the backend error of the create call, or
    /// [`ApplicationError::Task`] if the background task did not complete.
    pub async fn wait(self) -> ApplicationResult<CreatedResource> {
        let result = self
            .task
            .await
            .map_err(|e| ApplicationError::Task(e.to_string()))?;
        Ok(result?)
    }
}

/// State and actions of the force-npm page.
///
/// Cloning is cheap and every clone shares the same state.
pub struct ForceNpmViewModel<B> {
    backend: Arc<B>,
    inner: Arc<RwLock<Inner>>,
}

impl<B> Clone for ForceNpmViewModel<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<B: ForceNpmBackend + 'static> ForceNpmViewModel<B> {
    /// Creates a view-model with empty state.
    pub fn new(backend: Arc<B>) -> Self {
        Self::with_links(backend, SessionLinks::default())
    }

    /// Creates a view-model showing the given session links.
    pub fn with_links(backend: Arc<B>, links: SessionLinks) -> Self {
        let inner = Inner {
            view: ViewState::with_links(links),
            ..Inner::default()
        };
        Self {
            backend,
            inner: Arc::new(RwLock::new(inner)),
        }
    }

    /// Returns a copy of the current state for rendering.
    pub async fn snapshot(&self) -> ViewState {
        self.inner.read().await.view.clone()
    }

    /// Loads user info and the resource list concurrently.
    ///
    /// Each slice is updated as soon as its own response arrives.
    pub async fn initialize(&self) {
        tokio::join!(self.load_user_info(), self.refresh_resources());
    }

    /// Fetches user and organization info, replacing the previous value.
    pub async fn load_user_info(&self) {
        self.inner.write().await.view.user_info_status = SliceStatus::Loading;

        let result = self.backend.fetch_user_info().await;

        let mut inner = self.inner.write().await;
        let status = match result {
            Ok(info) => {
                debug!(org = %info.name, "user info loaded");
                inner.view.user_org_info = info;
                SliceStatus::Loaded
            }
            Err(e) => inner.failure("fetch_user_info", &e),
        };
        inner.view.user_info_status = status;
    }

    /// Re-reads the provisioned resources from the backend.
    ///
    /// On failure the previous list stays in place.
    pub async fn refresh_resources(&self) {
        self.inner.write().await.view.resources_status = SliceStatus::Loading;

        let result = self.backend.list_provisioned_resources().await;

        let mut inner = self.inner.write().await;
        let status = match result {
            Ok(records) => {
                inner.view.resources = parse_records(&records);
                debug!(count = inner.view.resources.len(), "resources loaded");
                SliceStatus::Loaded
            }
            Err(e) => inner.failure("list_provisioned_resources", &e),
        };
        inner.view.resources_status = status;
    }

    /// Handles a package picked from the autocomplete: sets the name input
    /// and loads the versions of that package.
    ///
    /// A response for a package that is no longer the latest pick is
    /// dropped.
    pub async fn on_package_selected(&self, name: impl Into<String>) {
        let name = name.into();
        let generation = {
            let mut inner = self.inner.write().await;
            inner.versions_generation += 1;
            inner.view.package_name = Some(name.clone());
            inner.view.versions_status = SliceStatus::Loading;
            inner.versions_generation
        };

        let result = self.backend.list_package_versions(&name).await;

        let mut inner = self.inner.write().await;
        if inner.versions_generation != generation {
            debug!(package = %name, "dropping stale version list");
            return;
        }
        let status = match result {
            Ok(versions) => {
                inner.view.package_versions = versions;
                SliceStatus::Loaded
            }
            Err(e) => inner.failure("list_package_versions", &e),
        };
        inner.view.versions_status = status;
    }

    /// Sets the package-version input.
    pub async fn set_package_version(&self, version: impl Into<String>) {
        self.inner.write().await.view.package_version = Some(version.into());
    }

    /// Provisions a new resource in the background.
    ///
    /// The name and version inputs are cleared before this returns, without
    /// waiting for the backend. Once the create succeeds the resource list
    /// is re-read; there is no optimistic insert.
    pub async fn on_create_requested(
        &self,
        name: impl Into<String>,
        version: impl Into<String>,
    ) -> CreateHandle {
        let name = name.into();
        let version = version.into();
        self.inner.write().await.view.create_status = SliceStatus::Loading;

        let view_model = self.clone();
        let task = tokio::spawn(async move { view_model.create_and_refresh(name, version).await });

        let mut inner = self.inner.write().await;
        inner.view.package_name = None;
        inner.view.package_version = None;

        CreateHandle { task }
    }

    async fn create_and_refresh(
        &self,
        name: String,
        version: String,
    ) -> BackendResult<CreatedResource> {
        let result = self
            .backend
            .create_provisioned_resource(&name, &version)
            .await;

        {
            let mut inner = self.inner.write().await;
            let status = match &result {
                Ok(_) => {
                    info!(package = %name, %version, "resource created");
                    SliceStatus::Loaded
                }
                Err(e) => inner.failure("create_provisioned_resource", e),
            };
            inner.view.create_status = status;
        }

        if result.is_ok() {
            self.refresh_resources().await;
        }
        result
    }

    /// Selects a resource and loads its file references.
    ///
    /// The file list is cleared before any request is made. A resource
    /// without a name leaves the list empty and makes no request. A response
    /// for a resource that is no longer selected is dropped.
    pub async fn on_resource_selected(&self, resource: ProvisionedResource) {
        let generation = {
            let mut inner = self.inner.write().await;
            inner.files_generation += 1;
            inner.view.selected = Some(resource.clone());
            inner.view.files.clear();
            inner.view.files_status = if resource.has_name() {
                SliceStatus::Loading
            } else {
                SliceStatus::Idle
            };
            inner.files_generation
        };

        let Some(name) = resource.name.as_deref() else {
            debug!("selected resource has no name, skipping file lookup");
            return;
        };

        let result = self
            .backend
            .list_file_references(name, resource.version.as_deref())
            .await;

        let mut inner = self.inner.write().await;
        if inner.files_generation != generation {
            debug!(resource = %resource.label(), "dropping stale file list");
            return;
        }
        let status = match result {
            Ok(files) => {
                inner.view.files = files;
                SliceStatus::Loaded
            }
            Err(e) => inner.failure("list_file_references", &e),
        };
        inner.view.files_status = status;
    }

    /// Looks up package suggestions for the autocomplete widget.
    ///
    /// # Errors
    ///
    /// Returns the backend error unchanged. No slice status changes; an
    /// auth failure only marks the session as expired.
    pub async fn search_packages(&self, query: &str) -> BackendResult<Vec<PackageSuggestion>> {
        let result = self.backend.search_packages(query).await;
        if let Err(e) = &result {
            self.inner.write().await.note_failure("search_packages", e);
        }
        result
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use std::collections::HashMap;
    use std::future::Future;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use forcenpm_domain::{
        CreatedResource, ErrorKind, FileReference, ForceNpmRecord, PackageSuggestion,
        PackageVersionList, ProvisionedResource, SliceStatus, UserOrgInfo,
    };
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tokio::sync::Notify;

    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        UserInfo,
        ListResources,
        Search(String),
        Versions(String),
        Create(String, String),
        Files(String, Option<String>),
    }

    #[derive(Default)]
    struct FakeBackend {
        calls: Mutex<Vec<Call>>,
        user_info: Mutex<Option<BackendResult<UserOrgInfo>>>,
        records: Mutex<Vec<ForceNpmRecord>>,
        resources_error: Mutex<Option<BackendError>>,
        versions: HashMap<String, PackageVersionList>,
        files: HashMap<String, Vec<FileReference>>,
        create_error: Option<BackendError>,
        create_gate: Option<Arc<Notify>>,
        gates: Mutex<HashMap<String, Arc<Notify>>>,
    }

    impl FakeBackend {
        fn new() -> Self {
            let mut versions = HashMap::new();
            versions.insert(
                "lodash".to_string(),
                vec!["4.17.20".to_string(), "4.17.21".to_string()],
            );
            versions.insert("d3".to_string(), vec!["7.9.0".to_string()]);

            let mut files = HashMap::new();
            files.insert(
                "lodash".to_string(),
                vec![FileReference(json!({"name": "lodash.js"}))],
            );
            files.insert(
                "d3".to_string(),
                vec![
                    FileReference(json!({"name": "d3.js"})),
                    FileReference(json!({"name": "d3.min.js"})),
                ],
            );

            Self {
                user_info: Mutex::new(Some(Ok(UserOrgInfo {
                    name: "Acme".to_string(),
                    organization_type: "Developer Edition".to_string(),
                    username: "jo@acme.org".to_string(),
                }))),
                records: Mutex::new(vec![ForceNpmRecord::with_description(
                    "NPM Package: lodash 4.17.21",
                )]),
                versions,
                files,
                ..Self::default()
            }
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: Call) {
            self.calls.lock().unwrap().push(call);
        }

        fn gate(&self, key: &str) -> Arc<Notify> {
            let gate = Arc::new(Notify::new());
            self.gates
                .lock()
                .unwrap()
                .insert(key.to_string(), Arc::clone(&gate));
            gate
        }

        async fn pass_gate(&self, key: &str) {
            let gate = self.gates.lock().unwrap().get(key).cloned();
            if let Some(gate) = gate {
                gate.notified().await;
            }
        }
    }

    impl ForceNpmBackend for FakeBackend {
        fn fetch_user_info(&self) -> impl Future<Output = BackendResult<UserOrgInfo>> + Send {
            async move {
                self.record(Call::UserInfo);
                self.user_info
                    .lock()
                    .unwrap()
                    .clone()
                    .unwrap_or_else(|| Ok(UserOrgInfo::default()))
            }
        }

        fn list_provisioned_resources(
            &self,
        ) -> impl Future<Output = BackendResult<Vec<ForceNpmRecord>>> + Send {
            async move {
                self.record(Call::ListResources);
                if let Some(error) = self.resources_error.lock().unwrap().clone() {
                    return Err(error);
                }
                Ok(self.records.lock().unwrap().clone())
            }
        }

        fn search_packages(
            &self,
            query: &str,
        ) -> impl Future<Output = BackendResult<Vec<PackageSuggestion>>> + Send {
            async move {
                self.record(Call::Search(query.to_string()));
                if query == "expired" {
                    return Err(BackendError::from_status(401, "expired"));
                }
                Ok(self
                    .versions
                    .keys()
                    .filter(|name| name.starts_with(query))
                    .map(|name| PackageSuggestion(json!(name)))
                    .collect())
            }
        }

        fn list_package_versions(
            &self,
            name: &str,
        ) -> impl Future<Output = BackendResult<PackageVersionList>> + Send {
            async move {
                self.record(Call::Versions(name.to_string()));
                self.pass_gate(name).await;
                self.versions
                    .get(name)
                    .cloned()
                    .ok_or_else(|| BackendError::from_status(404, "unknown package"))
            }
        }

        fn create_provisioned_resource(
            &self,
            name: &str,
            version: &str,
        ) -> impl Future<Output = BackendResult<CreatedResource>> + Send {
            async move {
                self.record(Call::Create(name.to_string(), version.to_string()));
                if let Some(gate) = &self.create_gate {
                    gate.notified().await;
                }
                if let Some(error) = &self.create_error {
                    return Err(error.clone());
                }
                self.records
                    .lock()
                    .unwrap()
                    .push(ForceNpmRecord::with_description(format!(
                        "NPM Package: {name} {version}"
                    )));
                Ok(CreatedResource(json!({"id": "081xx", "success": true})))
            }
        }

        fn list_file_references(
            &self,
            name: &str,
            version: Option<&str>,
        ) -> impl Future<Output = BackendResult<Vec<FileReference>>> + Send {
            async move {
                self.record(Call::Files(name.to_string(), version.map(str::to_string)));
                self.pass_gate(name).await;
                Ok(self.files.get(name).cloned().unwrap_or_default())
            }
        }
    }

    fn view_model(backend: FakeBackend) -> (Arc<FakeBackend>, ForceNpmViewModel<FakeBackend>) {
        let backend = Arc::new(backend);
        let view_model = ForceNpmViewModel::new(Arc::clone(&backend));
        (backend, view_model)
    }

    async fn wait_until(backend: &FakeBackend, call: &Call) {
        for _ in 0..200 {
            if backend.calls().contains(call) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("backend never saw {call:?}");
    }

    #[tokio::test]
    async fn test_initialize_loads_both_slices() {
        let (backend, vm) = view_model(FakeBackend::new());

        vm.initialize().await;

        let state = vm.snapshot().await;
        assert_eq!(state.user_org_info.name, "Acme");
        assert_eq!(state.user_info_status, SliceStatus::Loaded);
        assert_eq!(
            state.resources,
            vec![ProvisionedResource::new("lodash", "4.17.21")]
        );
        assert_eq!(state.resources_status, SliceStatus::Loaded);

        let calls = backend.calls();
        assert_eq!(calls.len(), 2);
        assert!(calls.contains(&Call::UserInfo));
        assert!(calls.contains(&Call::ListResources));
    }

    #[tokio::test]
    async fn test_user_info_failure_keeps_resources() {
        let backend = FakeBackend::new();
        *backend.user_info.lock().unwrap() = Some(Err(BackendError::Status {
            status: 500,
            message: "boom".to_string(),
        }));
        let (_backend, vm) = view_model(backend);

        vm.initialize().await;

        let state = vm.snapshot().await;
        assert_eq!(state.user_org_info, UserOrgInfo::default());
        assert_eq!(state.user_info_status.error_kind(), Some(ErrorKind::Server));
        assert_eq!(state.resources.len(), 1);
        assert!(!state.session_expired);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_previous_list() {
        let (backend, vm) = view_model(FakeBackend::new());
        vm.refresh_resources().await;

        *backend.resources_error.lock().unwrap() = Some(BackendError::from_status(401, "expired"));
        vm.refresh_resources().await;

        let state = vm.snapshot().await;
        assert_eq!(
            state.resources,
            vec![ProvisionedResource::new("lodash", "4.17.21")]
        );
        assert_eq!(
            state.resources_status.error_kind(),
            Some(ErrorKind::Unauthorized)
        );
        assert!(state.session_expired);
    }

    #[tokio::test]
    async fn test_unparseable_descriptions() {
        let backend = FakeBackend::new();
        *backend.records.lock().unwrap() = vec![
            ForceNpmRecord::with_description("NPM Package: "),
            ForceNpmRecord::default(),
        ];
        let (_backend, vm) = view_model(backend);

        vm.refresh_resources().await;

        let state = vm.snapshot().await;
        assert_eq!(
            state.resources,
            vec![ProvisionedResource::default(), ProvisionedResource::default()]
        );
    }

    #[tokio::test]
    async fn test_package_selected_loads_versions() {
        let (backend, vm) = view_model(FakeBackend::new());

        vm.on_package_selected("lodash").await;

        let state = vm.snapshot().await;
        assert_eq!(state.package_name.as_deref(), Some("lodash"));
        assert_eq!(state.package_versions, vec!["4.17.20", "4.17.21"]);
        assert_eq!(state.versions_status, SliceStatus::Loaded);
        assert_eq!(backend.calls(), vec![Call::Versions("lodash".to_string())]);

        vm.on_package_selected("d3").await;
        assert_eq!(vm.snapshot().await.package_versions, vec!["7.9.0"]);
    }

    #[tokio::test]
    async fn test_stale_version_list_is_dropped() {
        let backend = FakeBackend::new();
        let gate = backend.gate("lodash");
        let (backend, vm) = view_model(backend);

        let slow = {
            let vm = vm.clone();
            tokio::spawn(async move { vm.on_package_selected("lodash").await })
        };
        wait_until(&backend, &Call::Versions("lodash".to_string())).await;

        vm.on_package_selected("d3").await;
        gate.notify_one();
        slow.await.unwrap();

        let state = vm.snapshot().await;
        assert_eq!(state.package_name.as_deref(), Some("d3"));
        assert_eq!(state.package_versions, vec!["7.9.0"]);
    }

    #[tokio::test]
    async fn test_create_clears_inputs_before_resolving() {
        let gate = Arc::new(Notify::new());
        let backend = FakeBackend {
            create_gate: Some(Arc::clone(&gate)),
            ..FakeBackend::new()
        };
        let (backend, vm) = view_model(backend);
        vm.on_package_selected("left-pad").await;
        vm.set_package_version("1.3.0").await;

        let handle = vm.on_create_requested("left-pad", "1.3.0").await;

        let state = vm.snapshot().await;
        assert_eq!(state.package_name, None);
        assert_eq!(state.package_version, None);
        assert_eq!(state.create_status, SliceStatus::Loading);
        assert!(!handle.is_finished());

        gate.notify_one();
        let created = handle.wait().await.unwrap();
        assert_eq!(created.0["success"], json!(true));

        let state = vm.snapshot().await;
        assert_eq!(state.create_status, SliceStatus::Loaded);
        assert_eq!(
            state.resources,
            vec![
                ProvisionedResource::new("lodash", "4.17.21"),
                ProvisionedResource::new("left-pad", "1.3.0"),
            ]
        );

        let calls = backend.calls();
        let create_at = calls
            .iter()
            .position(|c| *c == Call::Create("left-pad".to_string(), "1.3.0".to_string()))
            .unwrap();
        assert_eq!(calls.get(create_at + 1), Some(&Call::ListResources));
    }

    #[tokio::test]
    async fn test_failed_create_skips_refresh() {
        let backend = FakeBackend {
            create_error: Some(BackendError::from_status(400, "already installed")),
            ..FakeBackend::new()
        };
        let (backend, vm) = view_model(backend);

        let handle = vm.on_create_requested("lodash", "4.17.21").await;
        let result = handle.wait().await;

        assert!(matches!(
            result,
            Err(ApplicationError::Backend(BackendError::Status { status: 400, .. }))
        ));
        let state = vm.snapshot().await;
        assert_eq!(state.create_status.error_kind(), Some(ErrorKind::Server));
        assert_eq!(state.package_name, None);
        assert!(!backend.calls().contains(&Call::ListResources));
    }

    #[tokio::test]
    async fn test_select_named_resource_requests_files_once() {
        let (backend, vm) = view_model(FakeBackend::new());
        let d3 = ProvisionedResource::new("d3", "7.9.0");

        vm.on_resource_selected(d3.clone()).await;

        let state = vm.snapshot().await;
        assert!(state.is_selected(&d3));
        assert_eq!(state.files.len(), 2);
        assert_eq!(state.files_status, SliceStatus::Loaded);
        assert_eq!(
            backend.calls(),
            vec![Call::Files("d3".to_string(), Some("7.9.0".to_string()))]
        );
    }

    #[tokio::test]
    async fn test_select_unnamed_resource_makes_no_request() {
        let (backend, vm) = view_model(FakeBackend::new());
        vm.on_resource_selected(ProvisionedResource::new("lodash", "4.17.21"))
            .await;
        assert_eq!(vm.snapshot().await.files.len(), 1);

        vm.on_resource_selected(ProvisionedResource::default()).await;

        let state = vm.snapshot().await;
        assert!(state.files.is_empty());
        assert_eq!(state.files_status, SliceStatus::Idle);
        assert_eq!(state.selected, Some(ProvisionedResource::default()));
        assert_eq!(backend.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_selection_clears_files_before_fetch_resolves() {
        let backend = FakeBackend::new();
        let gate = backend.gate("d3");
        let (backend, vm) = view_model(backend);
        vm.on_resource_selected(ProvisionedResource::new("lodash", "4.17.21"))
            .await;

        let pending = {
            let vm = vm.clone();
            tokio::spawn(async move {
                vm.on_resource_selected(ProvisionedResource::new("d3", "7.9.0"))
                    .await;
            })
        };
        wait_until(&backend, &Call::Files("d3".to_string(), Some("7.9.0".to_string()))).await;

        let state = vm.snapshot().await;
        assert!(state.files.is_empty());
        assert_eq!(state.files_status, SliceStatus::Loading);

        gate.notify_one();
        pending.await.unwrap();
        assert_eq!(vm.snapshot().await.files.len(), 2);
    }

    #[tokio::test]
    async fn test_stale_file_list_is_dropped() {
        let backend = FakeBackend::new();
        let gate = backend.gate("lodash");
        let (backend, vm) = view_model(backend);

        let slow = {
            let vm = vm.clone();
            tokio::spawn(async move {
                vm.on_resource_selected(ProvisionedResource::new("lodash", "4.17.21"))
                    .await;
            })
        };
        wait_until(
            &backend,
            &Call::Files("lodash".to_string(), Some("4.17.21".to_string())),
        )
        .await;

        let d3 = ProvisionedResource::new("d3", "7.9.0");
        vm.on_resource_selected(d3.clone()).await;
        gate.notify_one();
        slow.await.unwrap();

        let state = vm.snapshot().await;
        assert!(state.is_selected(&d3));
        assert_eq!(
            state.files,
            vec![
                FileReference(json!({"name": "d3.js"})),
                FileReference(json!({"name": "d3.min.js"})),
            ]
        );
    }

    #[tokio::test]
    async fn test_search_passthrough() {
        let (_backend, vm) = view_model(FakeBackend::new());

        let suggestions = vm.search_packages("lod").await.unwrap();
        assert_eq!(suggestions, vec![PackageSuggestion(json!("lodash"))]);
        assert_eq!(vm.snapshot().await.package_name, None);

        let result = vm.search_packages("expired").await;
        assert!(result.unwrap_err().is_unauthorized());
        let state = vm.snapshot().await;
        assert!(state.session_expired);
        assert!(!state.is_busy());
        assert_eq!(state.resources_status, SliceStatus::Idle);
        assert_eq!(state.versions_status, SliceStatus::Idle);
    }

    #[tokio::test]
    async fn test_links_are_kept() {
        let links = SessionLinks {
            instance_url: "https://acme.my.salesforce.com".to_string(),
            logout_url: Some("/logout".to_string()),
            ..SessionLinks::default()
        };
        let vm = ForceNpmViewModel::with_links(Arc::new(FakeBackend::new()), links.clone());

        vm.initialize().await;

        assert_eq!(vm.snapshot().await.links, links);
    }
}
