//! In-memory gateway and fixtures for engine tests.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::manifest::{fingerprint, Document};
use crate::remote::{CreatedPage, GatewayError, RemoteGateway, RemotePage};

/// A page held by the fake remote store.
#[derive(Debug, Clone)]
pub struct FakePage {
    pub space: String,
    pub title: String,
    pub version: i64,
    pub parent_id: Option<String>,
    pub body: String,
}

#[derive(Default)]
struct State {
    pages: HashMap<String, FakePage>,
    fail_titles: HashSet<String>,
    fail_creates: HashSet<String>,
    fail_ids: HashSet<String>,
    next_id: u64,
    requests: usize,
    writes: usize,
}

/// Gateway backed by a mutex-guarded map, with injectable failures.
pub struct FakeGateway {
    state: Mutex<State>,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
        }
    }

    /// Seeds a page and returns its id.
    pub fn add_page(&self, space: &str, title: &str, version: i64) -> String {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = format!("page-{}", state.next_id);
        state.pages.insert(
            id.clone(),
            FakePage {
                space: space.to_string(),
                title: title.to_string(),
                version,
                parent_id: None,
                body: String::new(),
            },
        );
        id
    }

    /// Simulates an edit made outside the engine.
    pub fn set_version(&self, id: &str, version: i64) {
        let mut state = self.state.lock().unwrap();
        state.pages.get_mut(id).unwrap().version = version;
    }

    /// Any operation naming this title fails with a transport error.
    pub fn fail_title(&self, title: &str) {
        self.state
            .lock()
            .unwrap()
            .fail_titles
            .insert(title.to_string());
    }

    /// Lookups for this title succeed, but creating it fails.
    pub fn fail_create(&self, title: &str) {
        self.state
            .lock()
            .unwrap()
            .fail_creates
            .insert(title.to_string());
    }

    /// Any fetch or update of this id fails with a transport error.
    pub fn fail_id(&self, id: &str) {
        self.state.lock().unwrap().fail_ids.insert(id.to_string());
    }

    pub fn page(&self, id: &str) -> Option<FakePage> {
        self.state.lock().unwrap().pages.get(id).cloned()
    }

    pub fn page_by_title(&self, space: &str, title: &str) -> Option<(String, FakePage)> {
        let state = self.state.lock().unwrap();
        state
            .pages
            .iter()
            .find(|(_, p)| p.space == space && p.title == title)
            .map(|(id, p)| (id.clone(), p.clone()))
    }

    /// Total gateway calls of any kind.
    pub fn request_count(&self) -> usize {
        self.state.lock().unwrap().requests
    }

    /// Creates and updates that reached the store.
    pub fn write_count(&self) -> usize {
        self.state.lock().unwrap().writes
    }
}

impl RemoteGateway for FakeGateway {
    async fn find_by_title(
        &self,
        title: &str,
        space: &str,
    ) -> Result<Option<RemotePage>, GatewayError> {
        let mut state = self.state.lock().unwrap();
        state.requests += 1;

        if state.fail_titles.contains(title) {
            return Err(GatewayError::HttpError("injected failure".to_string()));
        }

        Ok(state
            .pages
            .iter()
            .find(|(_, p)| p.space == space && p.title == title)
            .map(|(id, p)| RemotePage {
                id: id.clone(),
                title: p.title.clone(),
                version: p.version,
                parent_id: p.parent_id.clone(),
            }))
    }

    async fn get_by_id(&self, id: &str) -> Result<RemotePage, GatewayError> {
        let mut state = self.state.lock().unwrap();
        state.requests += 1;

        if state.fail_ids.contains(id) {
            return Err(GatewayError::HttpError("injected failure".to_string()));
        }

        match state.pages.get(id) {
            Some(p) => Ok(RemotePage {
                id: id.to_string(),
                title: p.title.clone(),
                version: p.version,
                parent_id: p.parent_id.clone(),
            }),
            None => Err(GatewayError::NotFound(id.to_string())),
        }
    }

    async fn create(
        &self,
        space: &str,
        title: &str,
        body: &str,
        parent_id: Option<&str>,
    ) -> Result<CreatedPage, GatewayError> {
        let mut state = self.state.lock().unwrap();
        state.requests += 1;

        if state.fail_titles.contains(title) || state.fail_creates.contains(title) {
            return Err(GatewayError::ApiError {
                status: 500,
                message: "injected failure".to_string(),
            });
        }

        state.next_id += 1;
        state.writes += 1;
        let id = format!("page-{}", state.next_id);
        state.pages.insert(
            id.clone(),
            FakePage {
                space: space.to_string(),
                title: title.to_string(),
                version: 1,
                parent_id: parent_id.map(str::to_string),
                body: body.to_string(),
            },
        );

        Ok(CreatedPage { id, version: 1 })
    }

    async fn update(
        &self,
        id: &str,
        title: &str,
        body: &str,
        expected_version: i64,
    ) -> Result<i64, GatewayError> {
        let mut state = self.state.lock().unwrap();
        state.requests += 1;

        if state.fail_ids.contains(id) {
            return Err(GatewayError::HttpError("injected failure".to_string()));
        }

        let page = state
            .pages
            .get_mut(id)
            .ok_or_else(|| GatewayError::NotFound(id.to_string()))?;

        if page.version != expected_version {
            return Err(GatewayError::VersionConflict {
                id: id.to_string(),
                expected_version,
            });
        }

        page.title = title.to_string();
        page.body = body.to_string();
        page.version = expected_version + 1;
        let new_version = page.version;
        state.writes += 1;

        Ok(new_version)
    }
}

/// A manifest document whose body is never read (classification tests).
pub fn document(path: &str, title: &str, group: &str, fingerprint: &str) -> Document {
    Document {
        path: path.to_string(),
        title: title.to_string(),
        group: group.to_string(),
        fingerprint: fingerprint.to_string(),
        body_path: PathBuf::from("/nonexistent").join(path),
    }
}

/// A manifest document with a real body file (execution tests).
pub fn document_on_disk(
    dir: &Path,
    path: &str,
    title: &str,
    group: &str,
    content: &str,
) -> Document {
    let body_path = dir.join(path.replace('/', "_"));
    std::fs::write(&body_path, content).unwrap();
    Document {
        path: path.to_string(),
        title: title.to_string(),
        group: group.to_string(),
        fingerprint: fingerprint(content),
        body_path,
    }
}
