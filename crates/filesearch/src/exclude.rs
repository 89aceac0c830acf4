//! Exclusion rules for the directory walk.
//!
//! Two static name tables (directory names and file names, each tagged with
//! the reason for exclusion) plus the hidden-entry marker convention. All
//! name matching is exact and case-sensitive; hidden matching is a
//! leading-marker test. Many of the tabled names start with the marker and
//! would be caught by the hidden rule anyway; listing them keeps the reason
//! tag attached and keeps the tables meaningful when the marker is changed.

use fnv::FnvHashMap;

/// Why a name is excluded from indexing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExcludeReason {
    /// Version-control internals.
    Vcs,
    /// Editor and IDE state.
    Editor,
    /// Language virtual environments.
    VirtualEnv,
    /// Package-manager caches and vendored dependency trees.
    PackageCache,
    /// Toolchain and SDK installations.
    Toolchain,
    /// Key material and credential stores.
    Secrets,
    /// Application caches and thumbnail stores.
    Cache,
    /// Trash and recycle-bin directories.
    Trash,
    /// Per-user configuration and application data.
    UserConfig,
    /// Shell and REPL history files.
    History,
    /// Operating-system directories.
    SystemDir,
    /// Desktop-manager metadata droppings.
    Metadata,
}

/// Directory names that are never indexed and never descended into.
pub const EXCLUDED_DIR_NAMES: &[(&str, ExcludeReason)] = &[
    (".git", ExcludeReason::Vcs),
    (".vscode", ExcludeReason::Editor),
    (".vscode-oss", ExcludeReason::Editor),
    (".idea", ExcludeReason::Editor),
    (".atom", ExcludeReason::Editor),
    (".vim", ExcludeReason::Editor),
    (".venv", ExcludeReason::VirtualEnv),
    ("venv", ExcludeReason::VirtualEnv),
    (".env", ExcludeReason::VirtualEnv),
    ("node_modules", ExcludeReason::PackageCache),
    ("__pycache__", ExcludeReason::PackageCache),
    (".npm", ExcludeReason::PackageCache),
    (".gradle", ExcludeReason::PackageCache),
    (".m2", ExcludeReason::PackageCache),
    (".bundle", ExcludeReason::PackageCache),
    (".cargo", ExcludeReason::PackageCache),
    (".composer", ExcludeReason::PackageCache),
    (".compose-cache", ExcludeReason::PackageCache),
    (".cpan", ExcludeReason::PackageCache),
    (".nuget", ExcludeReason::PackageCache),
    (".pub-cache", ExcludeReason::PackageCache),
    (".sbt", ExcludeReason::PackageCache),
    (".stack", ExcludeReason::PackageCache),
    (".yarn", ExcludeReason::PackageCache),
    (".rustup", ExcludeReason::Toolchain),
    (".sdkman", ExcludeReason::Toolchain),
    (".nvm", ExcludeReason::Toolchain),
    (".rbenv", ExcludeReason::Toolchain),
    (".fvm", ExcludeReason::Toolchain),
    (".go", ExcludeReason::Toolchain),
    (".dart", ExcludeReason::Toolchain),
    (".java", ExcludeReason::Toolchain),
    (".android", ExcludeReason::Toolchain),
    (".bazel", ExcludeReason::Toolchain),
    (".platformio", ExcludeReason::Toolchain),
    (".texlive", ExcludeReason::Toolchain),
    (".tooling", ExcludeReason::Toolchain),
    (".ssh", ExcludeReason::Secrets),
    (".gnupg", ExcludeReason::Secrets),
    (".pki", ExcludeReason::Secrets),
    (".aws", ExcludeReason::Secrets),
    (".kube", ExcludeReason::Secrets),
    (".cache", ExcludeReason::Cache),
    (".thumbnails", ExcludeReason::Cache),
    (".dbus", ExcludeReason::Cache),
    (".gvfs", ExcludeReason::Cache),
    (".Trash", ExcludeReason::Trash),
    (".trash", ExcludeReason::Trash),
    ("$RECYCLE.BIN", ExcludeReason::Trash),
    (".local", ExcludeReason::UserConfig),
    (".config", ExcludeReason::UserConfig),
    (".docker", ExcludeReason::UserConfig),
    (".ansible", ExcludeReason::UserConfig),
    (".terraform", ExcludeReason::UserConfig),
    (".terraform.d", ExcludeReason::UserConfig),
    (".cypress", ExcludeReason::UserConfig),
    (".ipython", ExcludeReason::UserConfig),
    (".jupyter", ExcludeReason::UserConfig),
    (".condarc", ExcludeReason::UserConfig),
    (".mozilla", ExcludeReason::UserConfig),
    (".thunderbird", ExcludeReason::UserConfig),
    (".history", ExcludeReason::History),
    (".python_history", ExcludeReason::History),
    ("Library", ExcludeReason::SystemDir),
    ("AppData", ExcludeReason::SystemDir),
    ("System Volume Information", ExcludeReason::SystemDir),
    ("Program Files", ExcludeReason::SystemDir),
    ("Program Files (x86)", ExcludeReason::SystemDir),
    ("ProgramData", ExcludeReason::SystemDir),
    ("bin", ExcludeReason::SystemDir),
    ("sbin", ExcludeReason::SystemDir),
    ("lib", ExcludeReason::SystemDir),
    ("usr", ExcludeReason::SystemDir),
    ("opt", ExcludeReason::SystemDir),
    ("dev", ExcludeReason::SystemDir),
    ("sys", ExcludeReason::SystemDir),
    ("proc", ExcludeReason::SystemDir),
    ("run", ExcludeReason::SystemDir),
    ("mnt", ExcludeReason::SystemDir),
    ("srv", ExcludeReason::SystemDir),
    ("var", ExcludeReason::SystemDir),
    ("tmp", ExcludeReason::SystemDir),
    ("boot", ExcludeReason::SystemDir),
    ("etc", ExcludeReason::SystemDir),
    ("media", ExcludeReason::SystemDir),
];

/// File names that are never indexed.
pub const EXCLUDED_FILE_NAMES: &[(&str, ExcludeReason)] = &[
    (".bash_history", ExcludeReason::History),
    (".zsh_history", ExcludeReason::History),
    (".sqlite_history", ExcludeReason::History),
    (".mysql_history", ExcludeReason::History),
    (".psql_history", ExcludeReason::History),
    (".rediscli_history", ExcludeReason::History),
    (".mongosh_history", ExcludeReason::History),
    (".lesshst", ExcludeReason::History),
    (".wget-hsts", ExcludeReason::History),
    (".profile", ExcludeReason::UserConfig),
    (".bashrc", ExcludeReason::UserConfig),
    (".bash_profile", ExcludeReason::UserConfig),
    (".bash_logout", ExcludeReason::UserConfig),
    (".zshrc", ExcludeReason::UserConfig),
    (".inputrc", ExcludeReason::UserConfig),
    (".vimrc", ExcludeReason::UserConfig),
    (".gitconfig", ExcludeReason::UserConfig),
    (".tmux.conf", ExcludeReason::UserConfig),
    (".selected_editor", ExcludeReason::UserConfig),
    (".Xresources", ExcludeReason::UserConfig),
    (".Xauthority", ExcludeReason::Secrets),
    (".ICEauthority", ExcludeReason::Secrets),
    (".rnd", ExcludeReason::Secrets),
    (".DS_Store", ExcludeReason::Metadata),
    ("thumbs.db", ExcludeReason::Metadata),
];

/// Default hidden-entry marker (dotfile convention).
pub const DEFAULT_HIDDEN_MARKER: char = '.';

/// Compiled exclusion rules for one walk.
///
/// Built once from the static tables; lookups are exact-name and
/// case-sensitive.
#[derive(Debug, Clone)]
pub struct ExcludeRules {
    dirs: FnvHashMap<&'static str, ExcludeReason>,
    files: FnvHashMap<&'static str, ExcludeReason>,
    hidden_marker: char,
}

impl ExcludeRules {
    /// Builds the standard rules with the given hidden-entry marker.
    pub fn with_hidden_marker(hidden_marker: char) -> Self {
        Self {
            dirs: EXCLUDED_DIR_NAMES.iter().copied().collect(),
            files: EXCLUDED_FILE_NAMES.iter().copied().collect(),
            hidden_marker,
        }
    }

    /// Reason the directory name is excluded, if it is.
    pub fn dir_reason(&self, name: &str) -> Option<ExcludeReason> {
        self.dirs.get(name).copied()
    }

    /// Reason the file name is excluded, if it is.
    pub fn file_reason(&self, name: &str) -> Option<ExcludeReason> {
        self.files.get(name).copied()
    }

    /// Whether the name starts with the hidden-entry marker.
    pub fn is_hidden(&self, name: &str) -> bool {
        name.starts_with(self.hidden_marker)
    }

    /// Whether a subdirectory with this name is pruned before descent.
    ///
    /// Pruned directories are never read: their contents are never visited,
    /// never scored, never enumerable.
    pub fn prunes_descent(&self, name: &str) -> bool {
        self.dirs.contains_key(name) || self.is_hidden(name)
    }

    /// Whether an entry with this name is kept out of the result set.
    pub fn excludes_entry(&self, name: &str) -> bool {
        self.dirs.contains_key(name) || self.files.contains_key(name) || self.is_hidden(name)
    }
}

impl Default for ExcludeRules {
    fn default() -> Self {
        Self::with_hidden_marker(DEFAULT_HIDDEN_MARKER)
    }
}
