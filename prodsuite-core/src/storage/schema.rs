//! SQLite schema definitions.
//!
//! Ids are UUID text, timestamps RFC 3339 text, nested values JSON text.

pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

pub const CREATE_NOTES_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS notes (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    title TEXT NOT NULL,
    content TEXT NOT NULL,
    tags TEXT NOT NULL DEFAULT '[]',
    reminders TEXT NOT NULL DEFAULT '[]',
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
)
";

pub const CREATE_NOTES_USER_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_notes_user ON notes(user_id, updated_at DESC)
";

/// Folders of every kind share one table, told apart by `kind`.
pub const CREATE_FOLDERS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS folders (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    kind TEXT NOT NULL,
    name TEXT NOT NULL,
    color TEXT,
    icon TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
)
";

pub const CREATE_FOLDERS_USER_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_folders_user ON folders(user_id, kind)
";

pub const CREATE_LISTS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS lists (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    folder_id TEXT,
    title TEXT NOT NULL,
    items TEXT NOT NULL DEFAULT '[]',
    tags TEXT NOT NULL DEFAULT '[]',
    share_id TEXT UNIQUE,
    share_mode TEXT NOT NULL DEFAULT 'none',
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
)
";

pub const CREATE_LISTS_USER_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_lists_user ON lists(user_id, updated_at DESC)
";

pub const CREATE_TRACKERS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS trackers (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    folder_id TEXT,
    name TEXT NOT NULL,
    description TEXT,
    tracker_type TEXT NOT NULL,
    tags TEXT NOT NULL DEFAULT '[]',
    config TEXT NOT NULL DEFAULT '{}',
    is_active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
)
";

pub const CREATE_TRACKERS_USER_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_trackers_user ON trackers(user_id, created_at DESC)
";

pub const CREATE_TRACKER_ENTRIES_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS tracker_entries (
    id TEXT PRIMARY KEY,
    tracker_id TEXT NOT NULL,
    user_id TEXT NOT NULL,
    date TEXT NOT NULL,
    timestamp TEXT NOT NULL,
    entry_values TEXT NOT NULL DEFAULT '{}',
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    UNIQUE (tracker_id, user_id, date)
)
";

pub const CREATE_DRAWINGS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS drawings (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    folder_id TEXT,
    title TEXT NOT NULL,
    scene_data TEXT NOT NULL,
    thumbnail TEXT,
    collaborators TEXT NOT NULL DEFAULT '[]',
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
)
";

pub const CREATE_DRAWINGS_USER_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_drawings_user ON drawings(user_id, updated_at DESC)
";

pub const CREATE_JOURNALS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS journals (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    folder_id TEXT,
    title TEXT NOT NULL,
    subtitle TEXT NOT NULL,
    content TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
)
";

pub const CREATE_JOURNALS_USER_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_journals_user ON journals(user_id, created_at DESC)
";

pub const CREATE_USER_SETTINGS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS user_settings (
    user_id TEXT PRIMARY KEY,
    theme_id TEXT NOT NULL,
    custom_theme TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
)
";

pub const CREATE_USER_PERMISSIONS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS user_permissions (
    user_id TEXT PRIMARY KEY,
    email TEXT,
    name TEXT,
    is_admin INTEGER NOT NULL DEFAULT 0,
    denied_features TEXT NOT NULL DEFAULT '[]',
    use_defaults INTEGER NOT NULL DEFAULT 1,
    granted_by TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
)
";

/// Single row, `id = 1`.
pub const CREATE_DEFAULT_PERMISSIONS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS default_permissions (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    denied_features TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    updated_by TEXT NOT NULL
)
";

pub const CREATE_PUSH_SUBSCRIPTIONS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS push_subscriptions (
    user_id TEXT NOT NULL,
    endpoint TEXT NOT NULL,
    p256dh TEXT NOT NULL,
    auth TEXT NOT NULL,
    created_at TEXT NOT NULL,
    UNIQUE (user_id, endpoint)
)
";

/// All schema creation statements in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    CREATE_METADATA_TABLE,
    CREATE_NOTES_TABLE,
    CREATE_NOTES_USER_INDEX,
    CREATE_FOLDERS_TABLE,
    CREATE_FOLDERS_USER_INDEX,
    CREATE_LISTS_TABLE,
    CREATE_LISTS_USER_INDEX,
    CREATE_TRACKERS_TABLE,
    CREATE_TRACKERS_USER_INDEX,
    CREATE_TRACKER_ENTRIES_TABLE,
    CREATE_DRAWINGS_TABLE,
    CREATE_DRAWINGS_USER_INDEX,
    CREATE_JOURNALS_TABLE,
    CREATE_JOURNALS_USER_INDEX,
    CREATE_USER_SETTINGS_TABLE,
    CREATE_USER_PERMISSIONS_TABLE,
    CREATE_DEFAULT_PERMISSIONS_TABLE,
    CREATE_PUSH_SUBSCRIPTIONS_TABLE,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_statement_is_idempotent() {
        for stmt in SCHEMA_STATEMENTS {
            assert!(stmt.contains("IF NOT EXISTS"), "{stmt}");
        }
    }

    #[test]
    fn entries_are_unique_per_day() {
        assert!(CREATE_TRACKER_ENTRIES_TABLE.contains("UNIQUE (tracker_id, user_id, date)"));
    }
}
