//! Registry held in memory, for tests and local runs.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::client::{ProjectRecord, Registry, WorkspaceRecord};
use crate::error::{RegistryError, Result};

#[derive(Debug, Default)]
pub struct StaticRegistry {
    projects: RwLock<Vec<ProjectRecord>>,
    workspaces: RwLock<Vec<WorkspaceRecord>>,
    unavailable: AtomicBool,
}

impl StaticRegistry {
    pub fn new(projects: Vec<ProjectRecord>, workspaces: Vec<WorkspaceRecord>) -> Self {
        Self {
            projects: RwLock::new(projects),
            workspaces: RwLock::new(workspaces),
            unavailable: AtomicBool::new(false),
        }
    }

    pub fn set_projects(&self, projects: Vec<ProjectRecord>) {
        *self.projects.write() = projects;
    }

    pub fn set_workspaces(&self, workspaces: Vec<WorkspaceRecord>) {
        *self.workspaces.write() = workspaces;
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::Relaxed);
    }

    fn check(&self) -> Result<()> {
        if self.unavailable.load(Ordering::Relaxed) {
            return Err(RegistryError::Unavailable("static registry switched off".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl Registry for StaticRegistry {
    async fn list_projects(&self) -> Result<Vec<ProjectRecord>> {
        self.check()?;
        Ok(self.projects.read().clone())
    }

    async fn list_workspaces(&self) -> Result<Vec<WorkspaceRecord>> {
        self.check()?;
        Ok(self.workspaces.read().clone())
    }

    async fn ping(&self) -> Result<()> {
        self.check()
    }
}
