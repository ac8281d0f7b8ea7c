//! Extraction of file-like leaves from a value tree.
//!
//! The walk is generic over [`Tree`], so it only knows about scalars,
//! sequences and mappings. Files are found depth-first in pre-order,
//! sequences by index and mappings in key order; the position of a file in
//! the returned list becomes its multipart field name.

use crate::graphql::PathSegment;

/// A mutable view of one node's children.
pub enum NodeMut<'a, N> {
    /// A leaf without children.
    Scalar,
    /// An ordered sequence.
    Sequence(Vec<&'a mut N>),
    /// A key/value mapping, in iteration order.
    Mapping(Vec<(&'a str, &'a mut N)>),
}

/// A tree that can be searched for files.
pub trait Tree: Sized {
    /// The file type held in leaves.
    type File;

    /// Expose this node's children.
    fn node_mut(&mut self) -> NodeMut<'_, Self>;

    /// If this node is a file, move it out and leave a null placeholder.
    fn take_file(&mut self) -> Option<Self::File>;
}

/// A file removed from a tree, with the path it was found at.
#[derive(Debug)]
pub struct ExtractedFile<F> {
    /// Location of the file in the original tree.
    pub path: Vec<PathSegment>,
    /// The file itself, untouched.
    pub file: F,
}

/// Remove every file from `tree`, replacing each with null.
///
/// Returns the files in traversal order. A tree without files is left as
/// it was and yields an empty list.
pub fn extract_files<T: Tree>(tree: &mut T) -> Vec<ExtractedFile<T::File>> {
    let mut files = Vec::new();
    let mut path = Vec::new();
    walk(tree, &mut path, &mut files);
    files
}

fn walk<T: Tree>(
    node: &mut T,
    path: &mut Vec<PathSegment>,
    files: &mut Vec<ExtractedFile<T::File>>,
) {
    if let Some(file) = node.take_file() {
        files.push(ExtractedFile {
            path: path.clone(),
            file,
        });
        return;
    }

    match node.node_mut() {
        NodeMut::Scalar => {}
        NodeMut::Sequence(items) => {
            for (idx, item) in items.into_iter().enumerate() {
                path.push(PathSegment::Index(idx));
                walk(item, path, files);
                path.pop();
            }
        }
        NodeMut::Mapping(entries) => {
            for (key, value) in entries {
                path.push(PathSegment::Field(key.to_string()));
                walk(value, path, files);
                path.pop();
            }
        }
    }
}
