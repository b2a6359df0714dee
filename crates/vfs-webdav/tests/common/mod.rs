//! In-memory WebDAV client that records every call.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::io::{Cursor, Read};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use vfs_webdav::webdav::{DavResource, WebdavClient};
use vfs_webdav::{Error, FileName, FileSystemOptions, Result, WebdavFileSystem};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Exists(String),
    List(String, u32),
    Get(String),
    Put(String, Vec<u8>),
    CreateDirectory(String),
    Delete(String),
    SetCustomProps {
        url: String,
        set: Option<BTreeMap<String, String>>,
        remove: Option<Vec<String>>,
    },
}

/// Scripted server state. Unknown URLs do not exist and cannot be listed.
#[derive(Default)]
pub struct FakeDav {
    calls: Mutex<Vec<Call>>,
    existing: Mutex<HashMap<String, bool>>,
    listings: Mutex<HashMap<(String, u32), Vec<DavResource>>>,
    contents: Mutex<HashMap<String, Vec<u8>>>,
    fail_puts: AtomicBool,
}

impl FakeDav {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_exists(&self, url: &str, exists: bool) {
        self.existing.lock().unwrap().insert(url.to_string(), exists);
    }

    pub fn set_listing(&self, url: &str, depth: u32, resources: Vec<DavResource>) {
        self.listings
            .lock()
            .unwrap()
            .insert((url.to_string(), depth), resources);
    }

    pub fn set_content(&self, url: &str, content: &[u8]) {
        self.contents
            .lock()
            .unwrap()
            .insert(url.to_string(), content.to_vec());
    }

    pub fn fail_puts(&self) {
        self.fail_puts.store(true, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn puts(&self) -> Vec<(String, Vec<u8>)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Put(url, content) => Some((url, content)),
                _ => None,
            })
            .collect()
    }

    pub fn list_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, Call::List(..)))
            .count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

fn status(method: &str, url: &str, status: u16) -> Error {
    Error::Status {
        method: method.to_string(),
        url: url.to_string(),
        status,
    }
}

impl WebdavClient for FakeDav {
    fn exists(&self, url: &str) -> Result<bool> {
        self.record(Call::Exists(url.to_string()));
        Ok(self
            .existing
            .lock()
            .unwrap()
            .get(url)
            .copied()
            .unwrap_or(false))
    }

    fn list(&self, url: &str, depth: u32) -> Result<Vec<DavResource>> {
        self.record(Call::List(url.to_string(), depth));
        self.listings
            .lock()
            .unwrap()
            .get(&(url.to_string(), depth))
            .cloned()
            .ok_or_else(|| status("PROPFIND", url, 404))
    }

    fn get(&self, url: &str) -> Result<Box<dyn Read + Send>> {
        self.record(Call::Get(url.to_string()));
        let content = self
            .contents
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| status("GET", url, 404))?;
        Ok(Box::new(Cursor::new(content)))
    }

    fn put(&self, url: &str, content: Vec<u8>) -> Result<()> {
        self.record(Call::Put(url.to_string(), content));
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(status("PUT", url, 507));
        }
        Ok(())
    }

    fn create_directory(&self, url: &str) -> Result<()> {
        self.record(Call::CreateDirectory(url.to_string()));
        Ok(())
    }

    fn delete(&self, url: &str) -> Result<()> {
        self.record(Call::Delete(url.to_string()));
        Ok(())
    }

    fn set_custom_props(
        &self,
        url: &str,
        set: Option<&BTreeMap<String, String>>,
        remove: Option<&[String]>,
    ) -> Result<()> {
        self.record(Call::SetCustomProps {
            url: url.to_string(),
            set: set.cloned(),
            remove: remove.map(<[String]>::to_vec),
        });
        Ok(())
    }
}

/// File system rooted at `root` over `fake`.
pub fn mount(root: &str, fake: &Arc<FakeDav>) -> WebdavFileSystem {
    mount_with(root, FileSystemOptions::new(), fake)
}

pub fn mount_with(root: &str, options: FileSystemOptions, fake: &Arc<FakeDav>) -> WebdavFileSystem {
    let client: Arc<dyn WebdavClient> = fake.clone();
    WebdavFileSystem::new(FileName::parse(root).unwrap(), options, client).unwrap()
}
