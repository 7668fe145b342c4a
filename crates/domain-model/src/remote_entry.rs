use serde::{Deserialize, Serialize};

/// MIME type the Drive API uses for folders.
pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryKind {
    File,
    Folder,
}

impl EntryKind {
    pub fn from_mime_type(mime_type: &str) -> Self {
        if mime_type == FOLDER_MIME_TYPE {
            EntryKind::Folder
        } else {
            EntryKind::File
        }
    }
}

/// One file or folder as returned by the listing API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteEntry {
    pub id: String,
    pub name: String,
    pub kind: EntryKind,
    /// Parent ids in the order the API lists them. Only the first one is used for placement.
    #[serde(default)]
    pub parents: Vec<String>,
    #[serde(default)]
    pub link: Option<String>,
}

impl RemoteEntry {
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: EntryKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            parents: Vec::new(),
            link: None,
        }
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parents.push(parent_id.into());
        self
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }

    /// First listed parent, if any.
    pub fn parent_id(&self) -> Option<&str> {
        self.parents.first().map(String::as_str)
    }

    pub fn is_folder(&self) -> bool {
        self.kind == EntryKind::Folder
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_mime_type() {
        assert_eq!(EntryKind::from_mime_type(FOLDER_MIME_TYPE), EntryKind::Folder);
        assert_eq!(EntryKind::from_mime_type("application/pdf"), EntryKind::File);
        assert_eq!(
            EntryKind::from_mime_type("application/vnd.google-apps.document"),
            EntryKind::File
        );
    }

    #[test]
    fn test_parent_id_is_first_parent() {
        let entry = RemoteEntry::new("x", "x.txt", EntryKind::File)
            .with_parent("p1")
            .with_parent("p2");
        assert_eq!(entry.parent_id(), Some("p1"));
        assert_eq!(RemoteEntry::new("y", "y", EntryKind::Folder).parent_id(), None);
    }
}
