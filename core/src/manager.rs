//! `ModManager`: the composition root wiring every collaborator crate
//! together with no DI container, the way a single binary's `main` would
//! (§2 end-to-end data flow).

use std::{collections::HashMap, sync::Arc};

use camino::Utf8Path;
use fmm_cache::{CacheConfig, FilesystemCacheBackend};
use fmm_depend::{DependencyGraph, DependencyResolver, DependencyValidator, ModMetadata, ValidationFinding, ValidatorEntry};
use fmm_http::{BaseClient, CacheDecorator, EventBus, ReqwestBaseClient, RetryDecorator};
use fmm_model::{InstalledMod, ModName, Version};
use fmm_portal::{PortalClient, ServiceCredential};
use fmm_registry::{MODListStore, MODRegistry};
use fmm_save::{SaveFileReader, SaveHeader};

use crate::{
    config::ModManagerConfig,
    error::{CoreError, CoreResult},
    metadata::PrefetchedMetadataSource,
};

pub struct ModManager {
    config: ModManagerConfig,
    list: MODListStore,
    portal: PortalClient,
    events: Arc<EventBus>,
}

impl ModManager {
    pub fn new(config: ModManagerConfig) -> CoreResult<Self> {
        let events = Arc::new(EventBus::new());

        let cache: Arc<dyn fmm_cache::CacheBackend> =
            Arc::new(FilesystemCacheBackend::new(config.cache_dir.clone(), CacheConfig::new("portal-api")));
        let base: Arc<dyn BaseClient> = Arc::new(ReqwestBaseClient::new()?);
        let cached = Arc::new(CacheDecorator::new(base, cache.clone(), events.clone()));
        let retried: Arc<dyn BaseClient> = Arc::new(RetryDecorator::new(cached).with_config(config.retry.clone()));

        let mut portal = PortalClient::new(retried, events.clone());
        if let Some(base_url) = &config.portal_base_url {
            portal = portal.with_base_url(base_url.clone());
        }

        // §4.5 invalidation: a changed MOD's cached catalog entries go stale
        // the moment the portal acknowledges the change.
        let invalidation_base_url = portal.base_url().to_string();
        events.subscribe(move |event| {
            if let fmm_http::Event::ModChanged { name } = event {
                let _ = cache.delete(&format!("{invalidation_base_url}/mods/{name}"));
                let _ = cache.delete(&format!("{invalidation_base_url}/mods/{name}/full"));
            }
        });

        let list = MODListStore::load(&config.mod_list_path)?;

        Ok(Self { config, list, portal, events })
    }

    /// Assembles a manager from already-constructed collaborators. The
    /// production path is [`ModManager::new`]; this exists so tests (and
    /// embedders with their own HTTP stack) can substitute a fake
    /// `PortalClient`.
    pub fn with_collaborators(config: ModManagerConfig, list: MODListStore, portal: PortalClient, events: Arc<EventBus>) -> Self {
        Self { config, list, portal, events }
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    /// Scans the MOD and game-data directories for what's actually present
    /// on disk (§4.6). Never consults the portal or the MOD list.
    pub fn installed(&self) -> CoreResult<Vec<InstalledMod>> {
        Ok(MODRegistry::scan(&self.config.mod_dir, &self.config.game_data_dir)?)
    }

    /// Runs every dependency check over the installed set against the
    /// enabled/disabled state in the MOD list (§4.9).
    pub fn validate(&self) -> CoreResult<Vec<ValidationFinding>> {
        let installed = self.installed()?;

        let entries: Vec<ValidatorEntry> = installed
            .iter()
            .map(|m| ValidatorEntry {
                name: m.name.clone(),
                enabled: self.list.enabled(&m.name).unwrap_or(true),
                version: Some(m.version),
            })
            .collect();

        let dependencies: Vec<(ModName, Vec<fmm_model::DependencySpec>)> =
            installed.iter().map(|m| (m.name.clone(), m.info.dependencies.clone())).collect();

        Ok(DependencyValidator::validate(&entries, &dependencies))
    }

    /// Expands `seeds` to the full required-dependency closure, fetching
    /// candidate metadata from the portal as needed (§4.10). `base`,
    /// expansions, and anything already installed at a satisfying version
    /// are skipped rather than resolved through the portal.
    pub async fn resolve(&self, seeds: &[ModName]) -> CoreResult<Vec<ModMetadata>> {
        let installed: HashMap<ModName, Version> =
            self.installed()?.into_iter().map(|m| (m.name, m.version)).collect();

        let catalog = self.prefetch_catalog(seeds, &installed).await?;
        let source = PrefetchedMetadataSource::new(catalog);
        let resolver = DependencyResolver::new(&source);
        Ok(resolver.expand(seeds, &installed)?)
    }

    /// Resolves `seeds`, downloads every selected release in topological
    /// order, verifies each digest, and records the result in the MOD list
    /// (§2, §5 download-order guarantee).
    pub async fn install(&mut self, seeds: &[ModName], credential: &ServiceCredential) -> CoreResult<()> {
        let selected = self.resolve(seeds).await?;

        let mut graph = DependencyGraph::new();
        for meta in &selected {
            graph.add_node(meta.name.clone());
            for dep in meta.dependencies.iter().filter(|d| d.is_required()) {
                graph.add_edge(meta.name.clone(), dep.clone());
            }
        }
        let order = graph.topological_order().map_err(fmm_depend::ResolveError::Circular)?;

        let by_name: HashMap<ModName, &ModMetadata> = selected.iter().map(|m| (m.name.clone(), m)).collect();

        for name in &order {
            let Some(meta) = by_name.get(name) else { continue };
            let release = self
                .portal
                .get_full(name.as_str())
                .await?
                .releases
                .into_iter()
                .find(|r| r.version == meta.version.to_string())
                .ok_or_else(|| CoreError::NotFound(name.to_string()))?;

            let dest = self.config.mod_dir.join(format!("{name}_{}.zip", meta.version));
            self.portal.download(&release.download_url, &dest, &release.sha1, credential).await?;
            self.list.add(name.clone(), true, Some(meta.version));
        }

        self.list.save(&self.config.mod_list_path)?;
        Ok(())
    }

    /// Checks `target` is safe to remove, then deletes its on-disk form and
    /// drops it from the MOD list (§4.10 `plan_uninstall`).
    pub fn uninstall(&mut self, target: &ModName) -> CoreResult<()> {
        let installed = self.installed()?;
        let as_metadata: Vec<ModMetadata> = installed
            .iter()
            .map(|m| ModMetadata { name: m.name.clone(), version: m.version, dependencies: m.info.dependencies.clone() })
            .collect();

        DependencyResolver::plan_uninstall(target, &as_metadata)?;

        if let Some(found) = installed.iter().find(|m| &m.name == target) {
            if found.path.is_dir() {
                std::fs::remove_dir_all(&found.path)?;
            } else {
                std::fs::remove_file(&found.path)?;
            }
        }

        self.list.remove(target)?;
        self.list.save(&self.config.mod_list_path)?;
        Ok(())
    }

    pub fn enable(&mut self, name: &ModName) -> CoreResult<()> {
        self.list.enable(name)?;
        self.list.save(&self.config.mod_list_path)?;
        Ok(())
    }

    pub fn disable(&mut self, name: &ModName) -> CoreResult<()> {
        self.list.disable(name)?;
        self.list.save(&self.config.mod_list_path)?;
        Ok(())
    }

    /// Extracts the MOD manifest and startup settings from a save file
    /// (§4.12). Every MOD it lists is treated as enabled.
    pub fn read_save(&self, path: &Utf8Path) -> CoreResult<SaveHeader> {
        Ok(SaveFileReader::read(path)?)
    }

    /// Walks the portal breadth-first from `seeds`, collecting every
    /// release of every MOD reachable via a `Required` dependency edge in
    /// any release, so the synchronous resolver has a complete catalog to
    /// search.
    async fn prefetch_catalog(
        &self,
        seeds: &[ModName],
        installed: &HashMap<ModName, Version>,
    ) -> CoreResult<HashMap<ModName, Vec<ModMetadata>>> {
        let mut catalog: HashMap<ModName, Vec<ModMetadata>> = HashMap::new();
        let mut frontier: Vec<ModName> = seeds.to_vec();
        let mut visited: std::collections::HashSet<ModName> = std::collections::HashSet::new();

        while let Some(name) = frontier.pop() {
            if !visited.insert(name.clone()) {
                continue;
            }

            let full = self.portal.get_full(name.as_str()).await?;
            let mut metas = Vec::with_capacity(full.releases.len());

            for release in &full.releases {
                let version: Version = release.version.parse().map_err(|_| CoreError::NotFound(name.to_string()))?;
                let dependencies = release
                    .info
                    .dependencies
                    .iter()
                    .map(|expr| fmm_depend::parse(expr))
                    .collect::<Result<Vec<_>, _>>()?;

                for dep in dependencies.iter().filter(|d| d.is_required()) {
                    if dep.target.is_base() || dep.target.is_expansion() {
                        continue;
                    }
                    let satisfied_by_installed = installed
                        .get(&dep.target)
                        .is_some_and(|v| dep.constraint.map_or(true, |c| c.satisfied_by(*v)));
                    if satisfied_by_installed {
                        continue;
                    }
                    if !visited.contains(&dep.target) {
                        frontier.push(dep.target.clone());
                    }
                }

                metas.push(ModMetadata { name: name.clone(), version, dependencies });
            }

            catalog.insert(name, metas);
        }

        Ok(catalog)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap as StdHashMap;

    use async_trait::async_trait;
    use camino::Utf8PathBuf;
    use fmm_http::{HttpError, HttpResponse, HttpResult};
    use sha1::{Digest, Sha1};

    use super::*;

    const BASE_URL: &str = "https://mods.factorio.com/api";
    const DOWNLOAD_BYTES: &[u8] = b"alpha mod archive contents";

    /// Answers `GET` by exact URL for JSON endpoints, and serves
    /// [`DOWNLOAD_BYTES`] for any streamed request (downloads only ever
    /// stream in this stack).
    struct MapClient {
        responses: StdHashMap<String, Vec<u8>>,
    }

    #[async_trait]
    impl BaseClient for MapClient {
        async fn get(&self, url: &str, _headers: &[(String, String)], stream_sink: Option<&Utf8Path>) -> HttpResult<HttpResponse> {
            if let Some(sink) = stream_sink {
                std::fs::write(sink, DOWNLOAD_BYTES).unwrap();
                return Ok(HttpResponse { status: 200, body: None });
            }

            match self.responses.get(url) {
                Some(body) => Ok(HttpResponse { status: 200, body: Some(body.clone()) }),
                None => Err(HttpError::HttpNotFound { body: None }),
            }
        }

        async fn post(&self, _url: &str, _headers: &[(String, String)], _body: Vec<u8>, _content_type: &str) -> HttpResult<HttpResponse> {
            unimplemented!("not exercised by ModManager")
        }

        async fn post_multipart(&self, _url: &str, _headers: &[(String, String)], _parts: Vec<fmm_http::MultipartPart>) -> HttpResult<HttpResponse> {
            unimplemented!("not exercised by ModManager")
        }
    }

    fn mod_full_json(name: &str, version: &str, dependencies: &[&str]) -> Vec<u8> {
        let deps_json: Vec<String> = dependencies.iter().map(|d| format!("\"{d}\"")).collect();
        format!(
            r#"{{
                "name": "{name}",
                "title": "{name}",
                "owner": "someone",
                "description": "",
                "releases": [{{
                    "version": "{version}",
                    "download_url": "https://mods.factorio.com/download/{name}",
                    "sha1": "{sha1}",
                    "factorio_version": "1.1",
                    "info_json": {{ "dependencies": [{deps}] }}
                }}]
            }}"#,
            sha1 = hex::encode(Sha1::digest(DOWNLOAD_BYTES)),
            deps = deps_json.join(", "),
        )
        .into_bytes()
    }

    fn manager_with(dir: &std::path::Path, responses: StdHashMap<String, Vec<u8>>) -> ModManager {
        let root = Utf8PathBuf::from_path_buf(dir.to_path_buf()).unwrap();
        std::fs::create_dir_all(root.join("mods")).unwrap();

        let config = ModManagerConfig::under_root(&root);
        let list = MODListStore::empty();
        let events = Arc::new(EventBus::new());

        let client = MapClient { responses };
        let portal = PortalClient::new(Arc::new(client), events.clone());

        ModManager::with_collaborators(config, list, portal, events)
    }

    fn name(s: &str) -> ModName {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn resolve_discovers_a_transitive_required_dependency() {
        let dir = tempfile::tempdir().unwrap();
        let mut responses = StdHashMap::new();
        responses.insert(format!("{BASE_URL}/mods/alpha/full"), mod_full_json("alpha", "1.0.0", &["beta"]));
        responses.insert(format!("{BASE_URL}/mods/beta/full"), mod_full_json("beta", "2.0.0", &[]));

        let manager = manager_with(dir.path(), responses);
        let resolved = manager.resolve(&[name("alpha")]).await.unwrap();

        let names: Vec<&str> = resolved.iter().map(|m| m.name.as_str()).collect();
        assert!(names.contains(&"alpha"));
        assert!(names.contains(&"beta"));
    }

    #[tokio::test]
    async fn install_downloads_and_records_every_selected_mod() {
        let dir = tempfile::tempdir().unwrap();
        let mut responses = StdHashMap::new();
        responses.insert(format!("{BASE_URL}/mods/alpha/full"), mod_full_json("alpha", "1.0.0", &[]));

        let mut manager = manager_with(dir.path(), responses);
        let credential = ServiceCredential::new("user", "token");
        manager.install(&[name("alpha")], &credential).await.unwrap();

        assert!(manager.list.exists(&name("alpha")));
        assert!(manager.list.enabled(&name("alpha")).unwrap());
        assert!(manager.config.mod_dir.join("alpha_1.0.0.zip").exists());
    }

    #[test]
    fn validate_and_installed_work_over_an_empty_mod_directory() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager_with(dir.path(), StdHashMap::new());

        assert!(manager.installed().unwrap().is_empty());
        assert!(manager.validate().unwrap().is_empty());
    }
}
