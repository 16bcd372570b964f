use super::{Session, TranscriptError, TranscriptRecord, Turn};
use crate::shared::fs_atomic::{atomic_write_file, ensure_dir};
use crate::shared::ids::RecordId;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// How saved exchanges map onto files in the transcript directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TranscriptLayout {
    /// Every completed exchange writes a full snapshot under a fresh id.
    #[default]
    Snapshot,
    /// One record per session; its id and timestamp are fixed when the
    /// session starts and the file is rewritten with the grown dialogue after
    /// each exchange.
    PerSession,
}

impl TranscriptLayout {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Snapshot => "snapshot",
            Self::PerSession => "per_session",
        }
    }
}

#[derive(Debug)]
pub struct TranscriptStore {
    dir: PathBuf,
    layout: TranscriptLayout,
    session: Session,
    session_record_id: RecordId,
    session_started: NaiveDateTime,
}

impl TranscriptStore {
    pub fn new(dir: impl Into<PathBuf>, layout: TranscriptLayout) -> Self {
        Self {
            dir: dir.into(),
            layout,
            session: Session::new(),
            session_record_id: RecordId::generate(),
            session_started: chrono::Local::now().naive_local(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn layout(&self) -> TranscriptLayout {
        self.layout
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn append(&mut self, turn: Turn) {
        self.session.append(turn);
    }

    pub fn clear(&mut self) {
        self.session.clear();
        self.session_record_id = RecordId::generate();
        self.session_started = chrono::Local::now().naive_local();
    }

    /// Saves the current session. Returns `Ok(None)` without touching the
    /// filesystem when the session is empty.
    pub fn persist(&self) -> Result<Option<PathBuf>, TranscriptError> {
        if self.session.is_empty() {
            return Ok(None);
        }

        let record = match self.layout {
            TranscriptLayout::Snapshot => {
                TranscriptRecord::capture(RecordId::generate(), &self.session)
            }
            TranscriptLayout::PerSession => TranscriptRecord::capture_at(
                self.session_record_id,
                self.session_started,
                &self.session,
            ),
        };
        write_record(&self.dir, &record).map(Some)
    }
}

/// Writes `record` as pretty-printed UTF-8 JSON to `<dir>/<id>.json`.
/// Non-ASCII text is written literally.
pub fn write_record(dir: &Path, record: &TranscriptRecord) -> Result<PathBuf, TranscriptError> {
    ensure_dir(dir).map_err(|source| TranscriptError::CreateDir {
        path: dir.display().to_string(),
        source,
    })?;

    let path = dir.join(record.id.file_name());
    let body = serde_json::to_vec_pretty(record).map_err(|source| TranscriptError::Encode {
        path: path.display().to_string(),
        source,
    })?;
    atomic_write_file(&path, &body).map_err(|source| TranscriptError::Write {
        path: path.display().to_string(),
        source,
    })?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::{TranscriptLayout, TranscriptStore};
    use crate::transcript::{Speaker, TranscriptRecord, Turn};
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    fn read_record(path: &Path) -> TranscriptRecord {
        let raw = fs::read_to_string(path).expect("read record");
        serde_json::from_str(&raw).expect("decode record")
    }

    fn json_files(dir: &Path) -> usize {
        match fs::read_dir(dir) {
            Ok(entries) => entries
                .filter_map(Result::ok)
                .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "json"))
                .count(),
            Err(_) => 0,
        }
    }

    #[test]
    fn persist_on_empty_session_is_a_noop() {
        let dir = tempdir().expect("tempdir");
        let out = dir.path().join("conversations");
        let store = TranscriptStore::new(&out, TranscriptLayout::Snapshot);

        assert_eq!(store.persist().expect("persist"), None);
        assert!(!out.exists(), "empty persist must not create the directory");
    }

    #[test]
    fn persist_writes_full_dialogue_with_alternating_roles() {
        let dir = tempdir().expect("tempdir");
        let mut store = TranscriptStore::new(dir.path(), TranscriptLayout::Snapshot);
        for i in 0..3 {
            store.append(Turn::user(format!("question {i}")));
            store.append(Turn::assistant(format!("réponse {i}")));
        }

        let path = store.persist().expect("persist").expect("path");
        let record = read_record(&path);
        assert_eq!(record.dialogue.len(), 6);
        for (index, entry) in record.dialogue.iter().enumerate() {
            let expected = if index % 2 == 0 {
                Speaker::User
            } else {
                Speaker::Assistant
            };
            assert_eq!(entry.role, expected, "entry {index}");
        }
        assert_eq!(
            path.file_name().and_then(|n| n.to_str()),
            Some(record.id.file_name().as_str())
        );
    }

    #[test]
    fn consecutive_snapshots_create_distinct_files() {
        let dir = tempdir().expect("tempdir");
        let mut store = TranscriptStore::new(dir.path(), TranscriptLayout::Snapshot);
        store.append(Turn::user("bonjour"));

        let first = store.persist().expect("first").expect("first path");
        let second = store.persist().expect("second").expect("second path");

        assert_ne!(first, second);
        assert_ne!(read_record(&first).id, read_record(&second).id);
        assert_eq!(json_files(dir.path()), 2);
    }

    #[test]
    fn clear_then_persist_only_contains_post_clear_turns() {
        let dir = tempdir().expect("tempdir");
        let mut store = TranscriptStore::new(dir.path(), TranscriptLayout::Snapshot);
        store.append(Turn::user("ancienne"));
        store.append(Turn::assistant("réponse ancienne"));
        store.clear();
        assert_eq!(store.persist().expect("noop"), None);

        store.append(Turn::user("nouvelle"));
        let record = read_record(&store.persist().expect("persist").expect("path"));
        assert_eq!(record.dialogue.len(), 1);
        assert_eq!(record.dialogue[0].content, "nouvelle");
    }

    #[test]
    fn arabic_content_is_written_unescaped() {
        let dir = tempdir().expect("tempdir");
        let mut store = TranscriptStore::new(dir.path(), TranscriptLayout::Snapshot);
        store.append(Turn::user("لدي صداع منذ يومين"));
        store.append(Turn::assistant("منذ متى بدأ الصداع بالتحديد؟"));

        let path = store.persist().expect("persist").expect("path");
        let bytes = fs::read(&path).expect("read bytes");
        let raw = String::from_utf8(bytes).expect("utf-8");
        assert!(raw.contains("لدي صداع منذ يومين"));
        assert!(!raw.contains("\\u"), "non-ascii must not be escaped");
        assert!(raw.contains("\n  \"id\""), "two-space indentation");

        let record = read_record(&path);
        assert_eq!(record.dialogue[1].content, "منذ متى بدأ الصداع بالتحديد؟");
    }

    #[test]
    fn per_session_layout_rewrites_one_record_until_cleared() {
        let dir = tempdir().expect("tempdir");
        let mut store = TranscriptStore::new(dir.path(), TranscriptLayout::PerSession);
        store.append(Turn::user("un"));
        store.append(Turn::assistant("deux"));
        let first = store.persist().expect("first").expect("path");

        store.append(Turn::user("trois"));
        store.append(Turn::assistant("quatre"));
        let second = store.persist().expect("second").expect("path");

        assert_eq!(first, second);
        assert_eq!(json_files(dir.path()), 1);
        assert_eq!(read_record(&second).dialogue.len(), 4);

        store.clear();
        store.append(Turn::user("cinq"));
        let third = store.persist().expect("third").expect("path");
        assert_ne!(third, second);
        assert_eq!(json_files(dir.path()), 2);
    }

    #[test]
    fn per_session_rewrites_keep_the_session_start_timestamp() {
        let dir = tempdir().expect("tempdir");
        let mut store = TranscriptStore::new(dir.path(), TranscriptLayout::PerSession);
        store.append(Turn::user("j'ai de la fièvre"));
        let first = read_record(&store.persist().expect("first").expect("path"));

        std::thread::sleep(std::time::Duration::from_millis(20));
        store.append(Turn::assistant("Depuis quand ?"));
        let second = read_record(&store.persist().expect("second").expect("path"));

        assert_eq!(first.id, second.id);
        assert_eq!(first.timestamp, second.timestamp);
        assert_eq!(second.dialogue.len(), 2);
    }

    #[test]
    fn snapshots_are_stamped_at_save_time() {
        let dir = tempdir().expect("tempdir");
        let mut store = TranscriptStore::new(dir.path(), TranscriptLayout::Snapshot);
        store.append(Turn::user("bonjour"));
        let first = read_record(&store.persist().expect("first").expect("path"));

        std::thread::sleep(std::time::Duration::from_millis(20));
        let second = read_record(&store.persist().expect("second").expect("path"));

        assert_ne!(first.timestamp, second.timestamp);
    }

    #[test]
    fn persist_surfaces_filesystem_errors() {
        let dir = tempdir().expect("tempdir");
        let blocker = dir.path().join("conversations");
        fs::write(&blocker, b"not a directory").expect("write blocker");

        let mut store = TranscriptStore::new(&blocker, TranscriptLayout::Snapshot);
        store.append(Turn::user("bonjour"));
        let err = store.persist().expect_err("must fail");
        assert!(err.to_string().contains("conversations"));
    }
}
