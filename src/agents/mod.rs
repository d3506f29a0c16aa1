//! Agent target detection.
//!
//! Skills install into per-agent directories inside a project (for
//! example `.claude/skills/`). Detection is presence-based: an agent is
//! a target when its directory already exists in the project, so the
//! router never invents tool config the user has not set up.

use std::path::{Path, PathBuf};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Supported AI coding agents.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    /// Claude Code by Anthropic
    ClaudeCode,
    /// Codex CLI by OpenAI
    Codex,
    /// Gemini CLI by Google
    GeminiCli,
    /// Cursor AI-powered editor
    Cursor,
    /// OpenCode CLI
    OpenCode,
    /// Windsurf IDE
    Windsurf,
}

impl AgentKind {
    /// Get the display name for this agent.
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::ClaudeCode => "Claude Code",
            Self::Codex => "Codex",
            Self::GeminiCli => "Gemini CLI",
            Self::Cursor => "Cursor",
            Self::OpenCode => "OpenCode",
            Self::Windsurf => "Windsurf",
        }
    }

    /// Project-relative directory the agent reads configuration from.
    #[must_use]
    pub const fn agent_dir(&self) -> &'static str {
        match self {
            Self::ClaudeCode => ".claude",
            Self::Codex => ".codex",
            Self::GeminiCli => ".gemini",
            Self::Cursor => ".cursor",
            Self::OpenCode => ".opencode",
            Self::Windsurf => ".windsurf",
        }
    }

    /// Project-relative directory skills install into.
    #[must_use]
    pub fn skills_dir(&self) -> PathBuf {
        Path::new(self.agent_dir()).join("skills")
    }

    /// Stable identifier persisted in state documents.
    #[must_use]
    pub const fn id(&self) -> &'static str {
        match self {
            Self::ClaudeCode => "claude_code",
            Self::Codex => "codex",
            Self::GeminiCli => "gemini_cli",
            Self::Cursor => "cursor",
            Self::OpenCode => "open_code",
            Self::Windsurf => "windsurf",
        }
    }

    /// All supported agents.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::ClaudeCode,
            Self::Codex,
            Self::GeminiCli,
            Self::Cursor,
            Self::OpenCode,
            Self::Windsurf,
        ]
    }
}

impl std::fmt::Display for AgentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// An install destination: the agent plus its absolute skills directory
/// for one project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentTarget {
    pub kind: AgentKind,
    pub path: PathBuf,
}

impl AgentTarget {
    /// Build the target for `kind` under `project_root`.
    #[must_use]
    pub fn for_project(kind: AgentKind, project_root: &Path) -> Self {
        Self {
            kind,
            path: project_root.join(kind.skills_dir()),
        }
    }
}

/// Detect install targets for a project. Explicitly requested agents
/// win; otherwise every agent whose directory exists is a target, with
/// Claude Code as the fallback when nothing is detected.
#[must_use]
pub fn detect_targets(project_root: &Path, requested: &[AgentKind]) -> Vec<AgentTarget> {
    if !requested.is_empty() {
        return requested
            .iter()
            .map(|kind| AgentTarget::for_project(*kind, project_root))
            .collect();
    }

    let detected: Vec<AgentTarget> = AgentKind::all()
        .iter()
        .filter(|kind| project_root.join(kind.agent_dir()).is_dir())
        .map(|kind| AgentTarget::for_project(*kind, project_root))
        .collect();

    if detected.is_empty() {
        return vec![AgentTarget::for_project(
            AgentKind::ClaudeCode,
            project_root,
        )];
    }
    detected
}
