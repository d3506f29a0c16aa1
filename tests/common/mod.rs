//! Common test utilities shared across integration tests.

#![allow(dead_code)]

use std::cell::Cell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use sk::error::{Result, SkError};
use sk::fetch::{Fetch, FetchedSkill};
use sk::reference::SkillRef;

/// Create a skill directory with a minimal SKILL.md manifest.
pub fn skill_fixture(parent: &Path, name: &str) -> PathBuf {
    let dir = parent.join(name);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(
        dir.join("SKILL.md"),
        format!("---\nname: {name}\ndescription: Fixture skill {name}\n---\n\n# {name}\n"),
    )
    .unwrap();
    dir
}

/// Fetcher serving pre-registered identities from local fixture
/// directories, counting every call. Unregistered identities fail.
pub struct StubFetcher {
    sources: HashMap<String, (PathBuf, Option<String>)>,
    calls: Rc<Cell<usize>>,
}

impl StubFetcher {
    pub fn new() -> Self {
        Self {
            sources: HashMap::new(),
            calls: Rc::new(Cell::new(0)),
        }
    }

    pub fn with_skill(mut self, skill: &SkillRef, path: PathBuf, sha: Option<&str>) -> Self {
        self.sources
            .insert(skill.identity(), (path, sha.map(str::to_string)));
        self
    }

    /// Handle on the call counter, observable after the fetcher moves
    /// into an engine.
    pub fn call_counter(&self) -> Rc<Cell<usize>> {
        Rc::clone(&self.calls)
    }
}

impl Fetch for StubFetcher {
    async fn fetch(&self, skill: &SkillRef) -> Result<FetchedSkill> {
        self.calls.set(self.calls.get() + 1);
        match self.sources.get(&skill.identity()) {
            Some((path, sha)) => Ok(FetchedSkill {
                path: path.clone(),
                commit_sha: sha.clone(),
            }),
            None => Err(SkError::FetchFailure {
                src: skill.source.clone(),
                reason: "stub has no such source".to_string(),
            }),
        }
    }
}
