//! The capability contract every file provider implements, and the file
//! handle that drives it.

use crate::{Error, FileName, FileType, Result};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fmt;
use std::io::{self, Read, Write};

/// A writable sink whose content is committed on `close`.
pub trait OutputStream: Write + Send {
    /// Commit the written content. Calling it again is a no-op.
    fn close(&mut self) -> io::Result<()>;
}

/// Operations a provider implements for one file.
///
/// Every call is synchronous and goes to the backing store; the handle
/// keeps no state between calls.
pub trait FileOperations: Send + Sync {
    /// Name of the file.
    fn name(&self) -> &FileName;

    /// Determine the type of the file.
    fn do_get_type(&self) -> Result<FileType>;

    /// List the children of a folder as provider-specific references.
    ///
    /// Returns `None` when the file is not a folder.
    fn do_list_children(&self) -> Result<Option<Vec<String>>>;

    /// Size of the content in bytes.
    fn do_get_content_size(&self) -> Result<u64>;

    /// Last modification time in milliseconds since the Unix epoch.
    fn do_get_last_modified_time(&self) -> Result<i64>;

    /// Open the content for reading.
    fn do_get_input_stream(&self) -> Result<Box<dyn Read + Send>>;

    /// Open the content for writing.
    fn do_get_output_stream(&self, append: bool) -> Result<Box<dyn OutputStream>>;

    /// Create this file as a folder.
    fn do_create_folder(&self) -> Result<()>;

    /// Delete this file.
    fn do_delete(&self) -> Result<()>;

    /// Whether `other` denotes the same file.
    fn do_is_same_file(&self, other: &FileName) -> Result<bool>;

    /// Read the custom attributes.
    fn do_get_attributes(&self) -> Result<BTreeMap<String, String>>;

    /// Set one custom attribute.
    fn do_set_attribute(&self, name: &str, value: &dyn fmt::Display) -> Result<()>;

    /// Remove one custom attribute.
    fn do_remove_attribute(&self, name: &str) -> Result<()>;
}

/// A file handle checking preconditions before calling into its provider.
#[derive(Debug, Clone)]
pub struct FileObject<O> {
    ops: O,
}

impl<O: FileOperations> FileObject<O> {
    /// Wrap provider operations.
    pub fn new(ops: O) -> Self {
        Self { ops }
    }

    pub fn name(&self) -> &FileName {
        self.ops.name()
    }

    /// Access the provider operations.
    pub fn operations(&self) -> &O {
        &self.ops
    }

    pub fn get_type(&self) -> Result<FileType> {
        self.ops.do_get_type()
    }

    pub fn exists(&self) -> Result<bool> {
        Ok(self.get_type()? != FileType::Imaginary)
    }

    pub fn is_folder(&self) -> Result<bool> {
        Ok(self.get_type()? == FileType::Folder)
    }

    /// References to the children of this folder, in provider order.
    pub fn children_names(&self) -> Result<Vec<String>> {
        if !self.get_type()?.has_children() {
            return Err(Error::NotFolder(self.name().to_string()));
        }
        self.ops
            .do_list_children()?
            .ok_or_else(|| Error::NotFolder(self.name().to_string()))
    }

    pub fn content_size(&self) -> Result<u64> {
        self.require_file()?;
        self.ops.do_get_content_size()
    }

    pub fn last_modified(&self) -> Result<DateTime<Utc>> {
        self.require_exists()?;
        let millis = self.ops.do_get_last_modified_time()?;
        DateTime::<Utc>::from_timestamp_millis(millis).ok_or(Error::InvalidTimestamp(millis))
    }

    pub fn input_stream(&self) -> Result<Box<dyn Read + Send>> {
        self.require_file()?;
        self.ops.do_get_input_stream()
    }

    /// Read the whole content.
    pub fn read_to_end(&self) -> Result<Vec<u8>> {
        let mut content = Vec::new();
        self.input_stream()?.read_to_end(&mut content)?;
        Ok(content)
    }

    pub fn output_stream(&self, append: bool) -> Result<Box<dyn OutputStream>> {
        if self.get_type()? == FileType::Folder {
            return Err(Error::NotFile(self.name().to_string()));
        }
        self.ops.do_get_output_stream(append)
    }

    /// Replace the content with `content` and commit it.
    pub fn write_all(&self, content: &[u8]) -> Result<()> {
        let mut out = self.output_stream(false)?;
        out.write_all(content)?;
        out.close()?;
        Ok(())
    }

    /// Create this file as a folder. Existing folders are left alone.
    pub fn create_folder(&self) -> Result<()> {
        match self.get_type()? {
            FileType::Folder => Ok(()),
            FileType::File => Err(Error::FileExists(self.name().to_string())),
            FileType::Imaginary => self.ops.do_create_folder(),
        }
    }

    /// Delete this file. Returns `false` when there was nothing to delete.
    pub fn delete(&self) -> Result<bool> {
        if !self.exists()? {
            return Ok(false);
        }
        self.ops.do_delete()?;
        Ok(true)
    }

    pub fn is_same_file<P: FileOperations>(&self, other: &FileObject<P>) -> Result<bool> {
        self.ops.do_is_same_file(other.name())
    }

    pub fn attributes(&self) -> Result<BTreeMap<String, String>> {
        self.ops.do_get_attributes()
    }

    pub fn set_attribute(&self, name: &str, value: &dyn fmt::Display) -> Result<()> {
        self.ops.do_set_attribute(name, value)
    }

    pub fn remove_attribute(&self, name: &str) -> Result<()> {
        self.ops.do_remove_attribute(name)
    }

    fn require_file(&self) -> Result<()> {
        match self.get_type()? {
            FileType::File => Ok(()),
            FileType::Folder => Err(Error::NotFile(self.name().to_string())),
            FileType::Imaginary => Err(Error::NotFound(self.name().to_string())),
        }
    }

    fn require_exists(&self) -> Result<()> {
        if self.exists()? {
            Ok(())
        } else {
            Err(Error::NotFound(self.name().to_string()))
        }
    }
}
