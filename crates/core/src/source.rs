//! The document source: raw pages, raw objects and lazily-analysed layouts.
//!
//! Parsing PDF bytes and running layout analysis is the job of an external
//! engine. Extraction only needs the narrow view described by [`PdfSource`].
//! [`MemoryDocument`] implements it for documents held in memory, such as
//! layout dumps loaded from JSON.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{AnnotError, Result};
use crate::geometry::BBox;
use crate::layout::LTPage;
use crate::pdftypes::{PDFObject, PDFObjRef, Resolve};

/// Depth limit for name-tree descent.
const MAX_NAME_TREE_DEPTH: usize = 32;

/// A page as seen before layout analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPage {
    /// Indirect reference identifying the page object.
    pub pageid: PDFObjRef,
    pub mediabox: BBox,
    /// Entries of the page's `/Annots` array (usually references).
    #[serde(default)]
    pub annots: Vec<PDFObject>,
}

/// Everything extraction needs from a parsed document.
pub trait PdfSource: Resolve {
    /// The document catalog dictionary.
    fn catalog(&self) -> &HashMap<String, PDFObject>;

    fn page_count(&self) -> usize;

    /// The raw page at a zero-based index.
    fn page(&self, index: usize) -> Result<RawPage>;

    /// Runs (or fetches) layout analysis for a page.
    ///
    /// Only called for pages with annotations or outlines.
    fn layout(&self, index: usize) -> Result<LTPage>;

    /// Resolve a named destination.
    ///
    /// Looks up the name in the document's Names/Dests tree or catalog Dests dict.
    fn get_dest(&self, name: &[u8]) -> Result<PDFObject> {
        let catalog = self.catalog();

        // First try Names/Dests tree (PDF 1.2+)
        if let Some(names) = self.resolve_key(catalog, "Names")?
            && let Ok(names_dict) = names.as_dict()
            && let Some(dests) = self.resolve_key(names_dict, "Dests")?
            && let Some(result) = lookup_name_tree(self, &dests, name, 0)?
        {
            return Ok(result);
        }

        // Try catalog Dests dict (PDF 1.1)
        if let Some(dests) = self.resolve_key(catalog, "Dests")?
            && let Ok(dests_dict) = dests.as_dict()
        {
            let name_str = String::from_utf8_lossy(name);
            if let Some(dest) = dests_dict.get(name_str.as_ref()) {
                return self.resolve1(dest);
            }
        }

        Err(AnnotError::DestinationNotFound(
            String::from_utf8_lossy(name).to_string(),
        ))
    }
}

/// Look up a name in a name tree.
fn lookup_name_tree<S: PdfSource + ?Sized>(
    src: &S,
    tree: &PDFObject,
    name: &[u8],
    depth: usize,
) -> Result<Option<PDFObject>> {
    let dict = match tree.as_dict() {
        Ok(d) => d,
        Err(_) => return Ok(None),
    };
    if depth > MAX_NAME_TREE_DEPTH {
        tracing::warn!("name tree deeper than {MAX_NAME_TREE_DEPTH} levels; giving up");
        return Ok(None);
    }

    // Names array (leaf node) is pairs: [name1, value1, name2, value2, ...]
    if let Some(names) = src.resolve_key(dict, "Names")?
        && let Ok(arr) = names.as_array()
    {
        for pair in arr.chunks_exact(2) {
            if let Ok(key) = src.resolve1(&pair[0])
                && key.as_string().is_ok_and(|k| k == name)
            {
                return Ok(Some(src.resolve1(&pair[1])?));
            }
        }
    }

    // Kids array (intermediate node)
    if let Some(kids) = src.resolve_key(dict, "Kids")?
        && let Ok(kids_arr) = kids.as_array()
    {
        for kid in kids_arr {
            let Ok(kid_obj) = src.resolve1(kid) else {
                continue;
            };
            // Check Limits to prune the search
            if let Ok(kid_dict) = kid_obj.as_dict()
                && let Some(limits) = kid_dict.get("Limits")
                && let Ok(limits_arr) = limits.as_array()
                && limits_arr.len() >= 2
            {
                let min = limits_arr[0].as_string().unwrap_or(&[]);
                let max = limits_arr[1].as_string().unwrap_or(&[]);
                if name < min || name > max {
                    continue;
                }
            }
            if let Some(result) = lookup_name_tree(src, &kid_obj, name, depth + 1)? {
                return Ok(Some(result));
            }
        }
    }

    Ok(None)
}

/// A page held in memory together with its analysed layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryPage {
    #[serde(flatten)]
    pub raw: RawPage,
    pub layout: LTPage,
}

/// A fully in-memory document: object table, catalog and analysed pages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryDocument {
    #[serde(default)]
    pub objects: HashMap<u32, PDFObject>,
    #[serde(default)]
    pub catalog: HashMap<String, PDFObject>,
    #[serde(default)]
    pub pages: Vec<MemoryPage>,
}

impl MemoryDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores an object and returns a reference to it.
    pub fn add_object(&mut self, objid: u32, obj: PDFObject) -> PDFObjRef {
        self.objects.insert(objid, obj);
        PDFObjRef::new(objid, 0)
    }

    pub fn push_page(&mut self, raw: RawPage, layout: LTPage) {
        self.pages.push(MemoryPage { raw, layout });
    }

    fn memory_page(&self, index: usize) -> Result<&MemoryPage> {
        self.pages
            .get(index)
            .ok_or_else(|| AnnotError::Source(format!("no page at index {index}")))
    }
}

impl Resolve for MemoryDocument {
    fn getobj(&self, objid: u32) -> Result<PDFObject> {
        self.objects
            .get(&objid)
            .cloned()
            .ok_or(AnnotError::ObjectNotFound(objid))
    }
}

impl PdfSource for MemoryDocument {
    fn catalog(&self) -> &HashMap<String, PDFObject> {
        &self.catalog
    }

    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page(&self, index: usize) -> Result<RawPage> {
        Ok(self.memory_page(index)?.raw.clone())
    }

    fn layout(&self, index: usize) -> Result<LTPage> {
        Ok(self.memory_page(index)?.layout.clone())
    }
}
