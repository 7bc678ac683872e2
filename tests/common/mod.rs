#![allow(dead_code)]

use folio::db::{AdminSeed, BlogStorage};
use std::{
    fs,
    path::PathBuf,
    time::{SystemTime, UNIX_EPOCH},
};

pub const ADMIN_USER: &str = "admin";
pub const ADMIN_PASS: &str = "correct horse battery staple";

pub fn admin_seed() -> AdminSeed {
    AdminSeed {
        username: ADMIN_USER.to_string(),
        password: ADMIN_PASS.to_string(),
    }
}

/// A SQLite file under the system temp dir, removed on drop.
pub struct TempDb {
    pub path: PathBuf,
}

impl TempDb {
    pub fn new(label: &str) -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before UNIX_EPOCH")
            .as_nanos();
        let mut path = std::env::temp_dir();
        path.push(format!(
            "folio-{label}-{}-{}.sqlite",
            std::process::id(),
            nanos
        ));
        Self { path }
    }

    pub fn url(&self) -> String {
        format!("sqlite:{}", self.path.display())
    }

    pub async fn connect(&self) -> BlogStorage {
        BlogStorage::connect(&self.url(), &admin_seed())
            .await
            .expect("failed to open temp blog store")
    }
}

impl Drop for TempDb {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
        for suffix in ["-wal", "-shm"] {
            let mut side = self.path.clone().into_os_string();
            side.push(suffix);
            let _ = fs::remove_file(side);
        }
    }
}

/// Fresh store plus the guard that deletes it.
pub async fn temp_store(label: &str) -> (BlogStorage, TempDb) {
    let db = TempDb::new(label);
    let storage = db.connect().await;
    (storage, db)
}
